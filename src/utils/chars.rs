//! Character classification shared by the detector and the normalizers.

use super::cursor::Cursor;
use smallvec::SmallVec;

/// Characters at or above this code point count as label characters
/// (internationalized host names).
pub const INTERNATIONAL_CHAR_START: char = '\u{c0}';

#[inline(always)]
pub fn is_hex(c: char) -> bool {
    c.is_ascii_hexdigit()
}

#[inline(always)]
pub fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic()
}

#[inline(always)]
pub fn is_numeric(c: char) -> bool {
    c.is_ascii_digit()
}

#[inline(always)]
pub fn is_alphanumeric(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// RFC 3986 unreserved set
#[inline(always)]
pub fn is_unreserved(c: char) -> bool {
    is_alphanumeric(c) || matches!(c, '-' | '.' | '_' | '~')
}

/// ASCII 点号，以及全角/表意文字中的三种句点变体
#[inline(always)]
pub fn is_dot(c: char) -> bool {
    matches!(c, '.' | '\u{3002}' | '\u{ff0e}' | '\u{ff61}')
}

#[inline(always)]
pub fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\t' | '\r')
}

/// Characters that may appear inside a scheme name.
#[inline(always)]
pub fn is_scheme_char(c: char) -> bool {
    is_alphanumeric(c) || matches!(c, '+' | '-' | '.')
}

/// Splits `text` on every dot variant and on the percent-encoded dot `%2e`
/// (either case). The empty string yields one empty section, and a
/// trailing separator yields a trailing empty section.
pub fn split_by_dot(text: &str) -> SmallVec<[&str; 4]> {
    let input: Vec<char> = text.chars().collect();
    let mut cursor = Cursor::new(&input);
    let mut sections = SmallVec::new();
    let (mut start, mut end) = (0, 0);

    // `start..end` are byte offsets into `text`
    while let Some(c) = cursor.peek_at(0) {
        if cursor.peek_matches("%2e") {
            sections.push(&text[start..end]);
            end += 3;
            start = end;
            cursor.seek(cursor.position() + 3);
            continue;
        }
        cursor.seek(cursor.position() + 1);
        end += c.len_utf8();
        if is_dot(c) {
            sections.push(&text[start..end - c.len_utf8()]);
            start = end;
        }
    }
    sections.push(&text[start..]);
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_variants() {
        for c in ['.', '\u{3002}', '\u{ff0e}', '\u{ff61}'] {
            assert!(is_dot(c), "{c:?}");
        }
        assert!(!is_dot(','));
        assert!(!is_dot('%'));
    }

    #[test]
    fn unreserved_and_hex() {
        assert!(is_unreserved('~'));
        assert!(is_unreserved('Z'));
        assert!(!is_unreserved('%'));
        assert!(is_hex('F'));
        assert!(!is_hex('g'));
        assert!(!is_numeric('a'));
        assert!(is_alpha('q'));
        assert!(!is_alpha('\u{43f}'));
    }

    #[test]
    fn split_handles_mixed_separators() {
        let parts = split_by_dot("a\u{3002}b%2Ec.d");
        assert_eq!(parts.as_slice(), &["a", "b", "c", "d"]);
    }

    #[test]
    fn split_keeps_incomplete_escape() {
        let parts = split_by_dot("ksjdfh.asdfkj.we%2");
        assert_eq!(parts.as_slice(), &["ksjdfh", "asdfkj", "we%2"]);
    }

    #[test]
    fn split_agrees_with_regex() {
        let re = regex::Regex::new("(?i)[.\u{3002}\u{ff0e}\u{ff61}]|%2e").expect("valid pattern");
        for text in [
            "www.google.com",
            ".leading",
            "trailing%2E",
            "a%2e%2eb",
            "\u{4e94}\u{7926}\u{3002}\u{4e2d}\u{570b}.",
            "%%2e%2",
            "no separators",
        ] {
            let expected: Vec<&str> = re.split(text).collect();
            assert_eq!(split_by_dot(text).as_slice(), expected.as_slice(), "{text}");
        }
    }

    #[test]
    fn split_keeps_byte_offsets_across_wide_characters() {
        let parts = split_by_dot("\u{4f8b}\u{3002}b\u{ff0e}\u{4e2d}%2E\u{570b}\u{ff61}");
        assert_eq!(parts.as_slice(), &["\u{4f8b}", "b", "\u{4e2d}", "\u{570b}", ""]);
    }

    #[test]
    fn split_of_empty_string_is_one_empty_section() {
        assert_eq!(split_by_dot("").as_slice(), &[""]);
        assert_eq!(split_by_dot("..").as_slice(), &["", "", ""]);
    }
}
