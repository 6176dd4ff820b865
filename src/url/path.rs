//! Path normalization: decode, resolve dot segments, collapse slashes, re-encode.

use crate::utils::percent::{decode, encode};

pub struct PathNormalizer;

impl PathNormalizer {
    /// Empty paths are returned unchanged.
    pub fn normalize(path: &str) -> String {
        if path.is_empty() {
            return String::new();
        }
        let decoded = decode(path);
        let sanitized = sanitize_dots_and_slashes(&decoded);
        encode(sanitized.as_bytes())
    }
}

/// 处理 `/./`、`/../`、`//`；结果为空时返回 "/"
///
/// A `..` that would climb above the root is dropped. Segments such as
/// `..c` or `a.` are left alone.
fn sanitize_dots_and_slashes(path: &str) -> String {
    let mut chars: Vec<char> = path.chars().collect();
    let mut slashes: Vec<isize> = Vec::new();
    let mut index: isize = 0;

    while index + 1 < chars.len() as isize {
        let i = index as usize;
        let len = chars.len();
        if chars[i] == '/' {
            slashes.push(index);
            if chars[i + 1] == '.' {
                if i + 2 < len && chars[i + 2] == '.' {
                    // "/../" 或以 "/.." 结尾
                    let end_of_path = i + 3 == len;
                    if end_of_path || (i + 3 < len && chars[i + 3] == '/') {
                        slashes.pop();
                        let end = i + 3;
                        // step back to the previous slash so it is examined again
                        index = slashes.pop().map_or(-1, |s| s - 1);
                        let start = if end_of_path { index + 1 } else { index };
                        chars.drain((start + 1) as usize..end);
                    }
                } else if i + 2 == len || chars[i + 2] == '/' {
                    // "/./" -> "/"
                    let end_of_path = i + 2 == len;
                    slashes.pop();
                    let start = if end_of_path { i + 1 } else { i };
                    chars.drain(start..i + 2);
                    index -= 1;
                }
            } else if chars[i + 1] == '/' {
                slashes.pop();
                chars.remove(i);
                index -= 1;
            }
        }
        index += 1;
    }

    if chars.is_empty() {
        return "/".to_string();
    }
    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escapes_are_decoded_once_and_reencoded() {
        let cases = [
            ("/%25%32%35", "/%25"),
            ("/%2%2%2", "/%252%252%252"),
            ("/%2%%335", "/%25"),
            ("/%25%32%35%25%32%35", "/%25%25"),
            ("/%2525252525252525", "/%25"),
            ("/asdf%25%32%35asd", "/asdf%25asd"),
            ("/%%%25%32%35asd%%", "/%25%25%25asd%25%25"),
            (
                "/%2E%73%65%63%75%72%65/%77%77%77%2E%65%62%61%79%2E%63%6F%6D/",
                "/.secure/www.ebay.com/",
            ),
            (
                "/%257Ea%2521b%2540c%2523d%2524e%25f%255E00%252611%252A22%252833%252944_55%252B",
                "/~a!b@c%23d$e%25f^00&11*22(33)44_55+",
            ),
            (
                "/uploads/%20%20%20%20/.verify/.eBaysecure=updateuserdataxplimnbqmn-xplmvalidateinfoswqpcmlx=hgplmcx/",
                "/uploads/%20%20%20%20/.verify/.eBaysecure=updateuserdataxplimnbqmn-xplmvalidateinfoswqpcmlx=hgplmcx/",
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(PathNormalizer::normalize(input), expected, "{input}");
        }
    }

    #[test]
    fn dot_segments_and_slashes() {
        let cases = [
            ("/lala/.././../..../", "/..../"),
            ("//asdfasdf/awef/sadf/sdf//", "/asdfasdf/awef/sadf/sdf/"),
            ("/", "/"),
            ("/a/../b/c", "/b/c"),
            ("/blah/..", "/"),
            ("../", "../"),
            ("/asdf/.", "/asdf/"),
            ("/a/b/./././././../c/d", "/a/c/d"),
            ("/a/b//////.///././././../c/d", "/a/c/d"),
            ("//../a/c/..///sdf", "/a/sdf"),
            ("/../asdf", "/asdf"),
            ("/../asdf/", "/asdf/"),
            ("/a/b/..c", "/a/b/..c"),
            ("/a/b/.././", "/a/"),
            ("/a/b/./", "/a/b/"),
            ("/a/b/../..", "/"),
            ("/a/b/../../../../../../", "/"),
            ("/a/b/../../../../../..", "/"),
            ("/a/b/../../../../../../c/d", "/c/d"),
            ("/a/b/../../../../../../c/d/", "/c/d/"),
            ("/a/b/../.", "/a/"),
            ("/a/b/..", "/a/"),
            ("/1.html", "/1.html"),
            ("/1/2.html?param=1", "/1/2.html?param=1"),
            ("/a./b.", "/a./b."),
            ("/a./b./", "/a./b./"),
        ];
        for (input, expected) in cases {
            assert_eq!(PathNormalizer::normalize(input), expected, "{input}");
        }
    }

    #[test]
    fn empty_path_stays_empty() {
        assert_eq!(PathNormalizer::normalize(""), "");
    }
}
