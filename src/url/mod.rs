//! Detected URLs and their part accessors.

pub mod host;
pub mod marker;
pub mod normalized;
pub mod path;

use crate::detection::{DetectorConfig, DetectorOptions, UrlDetector};
use crate::error::UrlError;
use crate::utils::chars::is_scheme_char;
use crate::utils::percent::remove_special_spaces;
use marker::{UrlMarker, UrlPart};
use normalized::NormalizedUrl;

pub const DEFAULT_SCHEME: &str = "http";

/// Well-known port of a scheme.
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        "ftp" => Some(21),
        _ => None,
    }
}

/// 去掉协议后缀 `://` 或 `%3a//`，并丢弃协议名之前的杂质
fn desuffix_scheme(raw: &str) -> &str {
    let lowered = raw.to_ascii_lowercase();
    let name = if lowered.ends_with("%3a//") {
        &raw[..raw.len() - 5]
    } else if lowered.ends_with("://") {
        &raw[..raw.len() - 3]
    } else {
        raw
    };
    let start = name
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_scheme_char(*c))
        .last()
        .map_or(name.len(), |(i, _)| i);
    &name[start..]
}

/// One detected URL: the matched text plus the offsets of its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    original: String,
    marker: UrlMarker,
}

impl Url {
    pub(crate) fn new(original: String, marker: UrlMarker) -> Self {
        Self { original, marker }
    }

    /// Parses text that must contain exactly one URL.
    ///
    /// Surrounding whitespace is trimmed, inner spaces become `%20` and
    /// tabs and line breaks are dropped before detection. Single-level
    /// hosts such as `localhost` are accepted.
    pub fn create(text: &str) -> Result<Url, UrlError> {
        let formatted = remove_special_spaces(&text.trim().replace(' ', "%20"));
        let config = DetectorConfig::new(DetectorOptions::ALLOW_SINGLE_LEVEL_DOMAIN);
        let mut urls = UrlDetector::new(config).detect(&formatted);
        match urls.len() {
            1 => Ok(urls.remove(0)),
            0 => Err(UrlError::NoUrlFound(text.to_string())),
            count => Err(UrlError::MultipleUrlsFound {
                count,
                input: text.to_string(),
            }),
        }
    }

    pub fn normalize(&self) -> NormalizedUrl {
        NormalizedUrl::new(self.clone())
    }

    pub fn marker(&self) -> &UrlMarker {
        &self.marker
    }

    pub fn original_url(&self) -> &str {
        &self.original
    }

    fn exists(&self, part: UrlPart) -> bool {
        self.marker.index_of(part).is_some()
    }

    /// Text of `part`, up to the next part that is present.
    pub fn part(&self, part: UrlPart) -> Option<&str> {
        let len = self.original.len();
        let begin = self.marker.index_of(part)?.min(len);
        let end = self
            .marker
            .next_present(part)
            .map_or(len, |(_, idx)| idx.clamp(begin, len));
        self.original.get(begin..end)
    }

    pub fn scheme(&self) -> &str {
        match self.part(UrlPart::Scheme) {
            Some(raw) => desuffix_scheme(raw),
            None if self.original.starts_with("//") => "",
            None => DEFAULT_SCHEME,
        }
    }

    fn user_info(&self) -> Option<(&str, Option<&str>)> {
        let raw = self.part(UrlPart::UsernamePassword)?;
        let raw = raw.strip_suffix('@').unwrap_or(raw);
        Some(match raw.split_once(':') {
            Some((user, pass)) => (user, Some(pass)),
            None => (raw, None),
        })
    }

    pub fn username(&self) -> &str {
        self.user_info().map_or("", |(user, _)| user)
    }

    pub fn password(&self) -> &str {
        self.user_info().and_then(|(_, pass)| pass).unwrap_or("")
    }

    pub fn host(&self) -> &str {
        let host = self.part(UrlPart::Host).unwrap_or("");
        if self.exists(UrlPart::Port) {
            host.strip_suffix(':').unwrap_or(host)
        } else {
            host
        }
    }

    /// Explicit port, else the scheme's well-known port. An explicit port
    /// that does not fit in `u16` yields `None`; see [`Url::port_text`].
    pub fn port(&self) -> Option<u16> {
        match self.port_text() {
            Some(text) => text.parse().ok(),
            None => default_port(self.scheme()),
        }
    }

    /// 原始端口数字（未写端口时为 `None`）
    pub fn port_text(&self) -> Option<&str> {
        self.part(UrlPart::Port).filter(|text| !text.is_empty())
    }

    pub fn path(&self) -> &str {
        self.part(UrlPart::Path).unwrap_or("/")
    }

    pub fn query(&self) -> &str {
        self.part(UrlPart::Query).unwrap_or("")
    }

    pub fn fragment(&self) -> &str {
        self.part(UrlPart::Fragment).unwrap_or("")
    }

    /// Raw URLs carry no address bytes; see [`NormalizedUrl::host_bytes`].
    pub fn host_bytes(&self) -> Option<&[u8]> {
        None
    }

    pub fn full_url(&self) -> String {
        self.render(self.host(), self.path(), true)
    }

    pub fn full_url_without_fragment(&self) -> String {
        self.render(self.host(), self.path(), false)
    }

    /// `[scheme:]//[user[:pass]@]host[:port]path[query][fragment]`
    pub(crate) fn render(&self, host: &str, path: &str, with_fragment: bool) -> String {
        let scheme = self.scheme();
        let mut url = String::with_capacity(self.original.len() + 16);
        if !scheme.is_empty() {
            url.push_str(scheme);
            url.push(':');
        }
        url.push_str("//");

        let username = self.username();
        if !username.is_empty() {
            url.push_str(username);
            let password = self.password();
            if !password.is_empty() {
                url.push(':');
                url.push_str(password);
            }
            url.push('@');
        }

        url.push_str(host);
        match self.port() {
            Some(port) if port > 0 && Some(port) != default_port(scheme) => {
                url.push(':');
                url.push_str(&port.to_string());
            }
            Some(_) => {}
            // out of u16 range: keep the digits as written
            None => {
                if let Some(raw) = self.port_text() {
                    url.push(':');
                    url.push_str(raw);
                }
            }
        }

        url.push_str(path);
        url.push_str(self.query());
        if with_fragment {
            url.push_str(self.fragment());
        }
        url
    }
}

impl std::fmt::Display for Url {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.original)
    }
}
