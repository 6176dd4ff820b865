//! Host normalization: case, percent escapes, numeric IP forms and dots.

use crate::utils::chars::{is_dot, is_hex, split_by_dot};
use crate::utils::percent::{decode, encode, remove_extra_dots};
use smallvec::SmallVec;
use std::fmt::Write;
use std::net::Ipv6Addr;

const MAX_NUMERIC_DOMAIN_VALUE: u64 = 4_294_967_295;
const MAX_IPV4_PART: u64 = 255;
const MAX_IPV6_PART: u32 = 0xffff;
const IPV4_MAPPED_IPV6_START_OFFSET: usize = 12;

/// 规范化结果：文本形式 + 若为 IP 地址则附带 16 字节地址
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedHost {
    pub host: String,
    /// IPv4 addresses are stored IPv4-mapped (`::ffff:a.b.c.d`).
    pub bytes: Option<[u8; 16]>,
}

pub struct HostNormalizer;

impl HostNormalizer {
    /// Canonical host text plus address bytes when the host is an IP in
    /// any of the accepted numeric spellings.
    pub fn normalize(host: &str) -> NormalizedHost {
        if host.is_empty() {
            return NormalizedHost::default();
        }

        let host = escape_non_ascii(host).to_ascii_lowercase();
        let mut host = decode(&host);

        let bytes = decode_host_to_ip(&host);
        if let Some(bytes) = bytes {
            host = format_ip(bytes);
        }

        let host = remove_extra_dots(&host);
        NormalizedHost {
            host: encode(host.as_bytes()).replace("\\x", "%"),
            bytes,
        }
    }
}

/// Non-ASCII dots become `.`; every other non-ASCII character becomes one
/// `\uXXXX` escape per UTF-16 unit.
fn escape_non_ascii(host: &str) -> String {
    let mut out = String::with_capacity(host.len());
    let mut units = [0u16; 2];
    for c in host.chars() {
        if c.is_ascii() {
            out.push(c);
        } else if is_dot(c) {
            out.push('.');
        } else {
            for unit in c.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{:04x}", unit);
            }
        }
    }
    out
}

fn decode_host_to_ip(host: &str) -> Option<[u8; 16]> {
    if host.starts_with('[') && host.ends_with(']') && host.len() >= 2 {
        decode_ipv6(&host[1..host.len() - 1])
    } else {
        decode_ipv4(host)
    }
}

fn parse_number(part: &str) -> Option<u64> {
    let (digits, radix) = if let Some(hex) = part.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(oct) = part.strip_prefix('0') {
        // 看起来不像八进制时按十进制解析，例如 "09"
        if oct.chars().all(|c| c.is_digit(8)) {
            (oct, 8)
        } else {
            (oct, 10)
        }
    } else {
        (part, 10)
    };
    if digits.is_empty() {
        return Some(0);
    }
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

/// One 32-bit number or four dotted bytes, stored IPv4-mapped.
fn decode_ipv4(host: &str) -> Option<[u8; 16]> {
    let parts = split_by_dot(host);
    let mut bytes = [0u8; 16];
    bytes[10] = 0xff;
    bytes[11] = 0xff;

    match parts.len() {
        1 => {
            let value = parse_number(parts[0])?;
            if value > MAX_NUMERIC_DOMAIN_VALUE {
                return None;
            }
            let value = u32::try_from(value).ok()?;
            bytes[IPV4_MAPPED_IPV6_START_OFFSET..].copy_from_slice(&value.to_be_bytes());
        }
        4 => {
            for (i, part) in parts.iter().enumerate() {
                let value = parse_number(part)?;
                if value > MAX_IPV4_PART {
                    return None;
                }
                bytes[IPV4_MAPPED_IPV6_START_OFFSET + i] = u8::try_from(value).ok()?;
            }
        }
        _ => return None,
    }
    Some(bytes)
}

fn decode_ipv6(inner: &str) -> Option<[u8; 16]> {
    let parts: SmallVec<[&str; 8]> = inner.split(':').collect();
    if parts.len() < 3 {
        return None;
    }

    let last = parts[parts.len() - 1];
    let last_without_zone = last.rfind('%').map_or(last, |idx| &last[..idx]);
    let ipv4 = if last_without_zone.chars().all(is_hex) {
        None
    } else {
        Some(decode_ipv4(last_without_zone)?)
    };

    let total_size: usize = if ipv4.is_some() { 6 } else { 8 };
    let size = if ipv4.is_some() { parts.len() - 1 } else { parts.len() };
    if size > total_size {
        return None;
    }

    let mut bytes = [0u8; 16];
    let mut filled_zeroes = 0;
    for (i, part) in parts.iter().take(size).enumerate() {
        // "::" 展开为若干个零段
        if part.is_empty() && i != 0 && i != parts.len() - 1 {
            filled_zeroes = total_size - size;
        }
        let section = if part.is_empty() {
            0
        } else {
            if !part.chars().all(is_hex) {
                return None;
            }
            u32::from_str_radix(part, 16).ok()?
        };
        if section > MAX_IPV6_PART {
            return None;
        }
        let offset = (filled_zeroes + i) * 2;
        let slot = bytes.get_mut(offset..offset + 2)?;
        slot.copy_from_slice(&(section as u16).to_be_bytes());
    }

    if let Some(v4) = ipv4 {
        bytes[IPV4_MAPPED_IPV6_START_OFFSET..].copy_from_slice(&v4[IPV4_MAPPED_IPV6_START_OFFSET..]);
    }
    Some(bytes)
}

/// Address bytes rendered the way [`HostNormalizer`] renders them.
pub fn format_ip(bytes: [u8; 16]) -> String {
    let addr = Ipv6Addr::from(bytes);
    match addr.to_ipv4_mapped() {
        Some(v4) => v4.to_string(),
        None => format!("[{addr}]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ip_hosts() {
        let cases = [
            ("[fefe::]", "[fefe::]"),
            ("[::ffff]", "[::ffff]"),
            ("[::255.255.255.255]", "[::ffff:ffff]"),
            ("[::]", "[::]"),
            ("[::1]", "[::1]"),
            ("[aAaA::56.7.7.5]", "[aaaa::3807:705]"),
            ("[BBBB:ab:f78F:f:DDDD:bab:56.7.7.5]", "[bbbb:ab:f78f:f:dddd:bab:3807:705]"),
            ("[Aaaa::1]", "[aaaa::1]"),
            ("[::192.167.2.2]", "[::c0a7:202]"),
            ("[0:ffff::077.0x22.222.11]", "[0:ffff::3f22:de0b]"),
            ("[0::ffff:077.0x22.222.11]", "63.34.222.11"),
            ("192.168.1.1", "192.168.1.1"),
            ("0x92.168.1.1", "146.168.1.1"),
            ("3279880203", "195.127.0.11"),
        ];
        for (input, expected) in cases {
            let normalized = HostNormalizer::normalize(input);
            assert_eq!(normalized.host, expected, "{input}");
            let bytes = normalized.bytes.expect("ip host has bytes");
            assert_eq!(format_ip(bytes), expected);
        }
    }

    #[test]
    fn ipv4_bytes_are_mapped() {
        let bytes = HostNormalizer::normalize("192.168.1.1").bytes;
        let mut expected = [0u8; 16];
        expected[10] = 0xff;
        expected[11] = 0xff;
        expected[12..].copy_from_slice(&[192, 168, 1, 1]);
        assert_eq!(bytes, Some(expected));
    }

    #[test]
    fn plain_hosts_are_lowercased_only() {
        for host in ["sALes.com", "33r.nEt", "173839.com", "192.168.-3.1", "[::-34:50]", "[-34::192.168.34.-3]"] {
            let normalized = HostNormalizer::normalize(host);
            assert_eq!(normalized.host, host.to_ascii_lowercase());
            assert_eq!(normalized.bytes, None, "{host}");
        }
    }

    #[test]
    fn dots_and_escapes() {
        assert_eq!(HostNormalizer::normalize(".s..ales.....com").host, "s.ales.com");
        assert_eq!(HostNormalizer::normalize("%20leadingspace.com").host, "%20leadingspace.com");
        assert_eq!(HostNormalizer::normalize("\\x01\\x80.com").host, "%01%80.com");
        assert_eq!(HostNormalizer::normalize("www\u{3002}google\u{ff0e}com").host, "www.google.com");
        assert_eq!(HostNormalizer::normalize("пр.com").host, "\\u043f\\u0440.com");
    }

    #[test]
    fn empty_host() {
        assert_eq!(HostNormalizer::normalize(""), NormalizedHost::default());
    }
}
