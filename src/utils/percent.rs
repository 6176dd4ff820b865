//! Percent decoding/encoding and the small text clean-ups used around it.

use super::chars::is_whitespace;
use smallvec::SmallVec;

#[inline(always)]
fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[inline(always)]
fn is_hex(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

/// 反复百分号解码，直到不再有可解码的 `%XX`
///
/// Decoding is applied until a fixed point, including escapes that only
/// appear after an earlier decode: `%%32%35` becomes `%25` and then `%`.
/// A `%` that is not followed by two hex digits is left alone and
/// remembered, so that a later decode completing it can step back and
/// retry from there.
pub fn decode_bytes(input: &[u8]) -> Vec<u8> {
    // 没有 '%' 时直接返回，绝大多数 host/path 走这条路
    if memchr::memchr(b'%', input).is_none() {
        return input.to_vec();
    }

    let mut buf = input.to_vec();
    let mut pending: SmallVec<[usize; 8]> = SmallVec::new();
    let mut i = 0;

    while i + 2 < buf.len() {
        if buf[i] == b'%' {
            if let (Some(hi), Some(lo)) = (hex_value(buf[i + 1]), hex_value(buf[i + 2])) {
                let decoded = hi * 16 + lo;
                buf.splice(i..i + 3, [decoded]);

                if decoded == b'%' {
                    // the new '%' may start another escape
                    continue;
                }
                if let Some(&top) = pending.last() {
                    let completes_pending = is_hex(decoded) && is_hex(buf[i - 1]) && i - top == 2;
                    if completes_pending || i + 2 == buf.len() {
                        pending.pop();
                        i = top;
                        continue;
                    }
                }
            } else {
                pending.push(i);
            }
        }
        i += 1;
    }
    buf
}

/// [`decode_bytes`] over UTF-8 text; invalid sequences produced by the
/// decode become U+FFFD.
pub fn decode(input: &str) -> String {
    let decoded = decode_bytes(input.as_bytes());
    match String::from_utf8(decoded) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// 编码：控制字符、空格、非 ASCII 字节以及 `#`、`%` 编码为大写 `%XX`
pub fn encode(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input {
        if b <= 0x20 || b >= 0x7f || b == b'#' || b == b'%' {
            out.push('%');
            out.push(char::from(HEX_UPPER[usize::from(b >> 4)]));
            out.push(char::from(HEX_UPPER[usize::from(b & 0x0f)]));
        } else {
            out.push(char::from(b));
        }
    }
    out
}

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Collapses runs of dots to one and drops a single leading and a single
/// trailing dot.
pub fn remove_extra_dots(host: &str) -> String {
    let mut out = String::with_capacity(host.len());
    let mut prev_dot = false;
    for c in host.chars() {
        let c = if is_whitespace(c) { ' ' } else { c };
        if c == '.' && prev_dot {
            continue;
        }
        prev_dot = c == '.';
        out.push(c);
    }
    if out.ends_with('.') {
        out.pop();
    }
    if out.starts_with('.') {
        out.remove(0);
    }
    out
}

/// Strips tab, carriage return and line feed characters.
pub fn remove_special_spaces(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '\t' | '\r' | '\n')).collect()
}
