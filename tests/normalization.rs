use pretty_assertions::assert_eq;
use proptest::prelude::*;
use url_detector::url::host::HostNormalizer;
use url_detector::{NormalizedUrl, Url};

fn normalized(text: &str) -> NormalizedUrl {
    NormalizedUrl::create(text).unwrap_or_else(|e| panic!("{text:?}: {e}"))
}

#[test]
fn host_and_path() {
    let cases = [
        ("http://www.google.com/", "www.google.com", "/"),
        ("teeee.com", "teeee.com", "/"),
        ("[::1]", "[::1]", "/"),
        ("yahoo.com/@1234", "yahoo.com", "/@1234"),
        ("http://[::0xfe.07.23.33]/%25%32%35", "[::fe07:1721]", "/%25"),
        ("http://host.com/%2525252525252525", "host.com", "/%25"),
        ("343324381/", "20.118.182.221", "/"),
    ];
    for (text, host, path) in cases {
        let url = normalized(text);
        assert_eq!(url.host(), host, "{text}");
        assert_eq!(url.path(), path, "{text}");
    }
}

#[test]
fn full_url_without_fragment() {
    let cases = [
        (
            "http://%31%36%38%2e%31%38%38%2e%39%39%2e%32%36/%2E%73%65%63%75%72%65/%77%77%77%2E%65%62%61%79%2E%63%6F%6D/",
            "http://168.188.99.26/.secure/www.ebay.com/",
        ),
        ("http://3279880203/blah", "http://195.127.0.11/blah"),
        ("http://www.google.com/blah/..", "http://www.google.com/"),
        ("www.google.com", "http://www.google.com/"),
        ("http://www.google.com/foo\tbar\rbaz\n2", "http://www.google.com/foobarbaz2"),
        ("http://www.google.com/q?", "http://www.google.com/q?"),
        ("http://evil.com/foo#bar#baz", "http://evil.com/foo"),
        ("http://evil.com/foo;", "http://evil.com/foo;"),
        ("http://\\x01\\x80.com/", "http://%01%80.com/"),
        ("http://notrailingslash.com", "http://notrailingslash.com/"),
        ("http://www.gotaport.com:1234/", "http://www.gotaport.com:1234/"),
        ("  http://www.google.com/  ", "http://www.google.com/"),
        ("http:// leadingspace.com/", "http://%20leadingspace.com/"),
        ("%20leadingspace.com/", "http://%20leadingspace.com/"),
        ("https://www.securesite.com/", "https://www.securesite.com/"),
        ("http://host.com/ab%23cd", "http://host.com/ab%23cd"),
        ("http://host.com//twoslashes?more//slashes", "http://host.com/twoslashes?more//slashes"),
        ("http://go.co/a/b/../c", "http://go.co/a/c"),
        ("http://big.big.boss@0xb02067cd/", "http://big.big.boss@176.32.103.205/"),
        ("http://www.0xb02067cd/", "http://www.0xb02067cd/"),
        ("http://012.0xb02067cd/", "http://012.0xb02067cd/"),
    ];
    for (text, expected) in cases {
        assert_eq!(normalized(text).full_url_without_fragment(), expected, "{text}");
    }
}

#[test]
fn ipv4_hosts_expose_mapped_bytes() {
    let url = normalized("http://192.168.1.1/");
    assert_eq!(
        url.host_bytes(),
        Some(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 192, 168, 1, 1][..])
    );
    assert_eq!(normalized("http://www.google.com/").host_bytes(), None);
}

#[test]
fn raw_url_is_kept_alongside() {
    let raw = Url::create("HTTP://WWW.Google.com/a/./b").expect("one url");
    let url = raw.normalize();
    assert_eq!(url.original_url(), "HTTP://WWW.Google.com/a/./b");
    assert_eq!(url.host(), "www.google.com");
    assert_eq!(url.path(), "/a/b");
    assert_eq!(url.into_inner(), raw);
}

proptest! {
    #[test]
    fn host_normalization_is_idempotent(host in "[a-z0-9.-]{1,30}") {
        let once = HostNormalizer::normalize(&host).host;
        let twice = HostNormalizer::normalize(&once).host;
        prop_assert_eq!(once, twice);
    }
}
