//! Host reader: consumes a host name, IPv4 or bracketed IPv6 literal and
//! decides which URL part comes next.

use super::options::DetectorOptions;
use crate::utils::chars::{
    is_alpha, is_alphanumeric, is_dot, is_hex, is_numeric, is_unreserved, split_by_dot,
    INTERNATIONAL_CHAR_START,
};
use crate::utils::cursor::Cursor;

const MIN_TOP_LEVEL_DOMAIN: usize = 2;
const MAX_TOP_LEVEL_DOMAIN: usize = 22;
/// Smallest single-number IPv4 accepted (`1.1.1.0`), to keep plain numbers out.
const MIN_NUMERIC_DOMAIN_VALUE: u64 = 16_843_008;
const MAX_NUMERIC_DOMAIN_VALUE: u64 = 4_294_967_295;
const MAX_IP_PART: u32 = 255;
/// Labels must be shorter than this.
const MAX_LABEL_LENGTH: usize = 64;
const MAX_NUMBER_LABELS: usize = 127;
const MAX_DOMAIN_LENGTH: usize = 255;

/// 读完主机名之后状态机的下一步
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainState {
    Valid,
    Path,
    Port,
    Query,
    Fragment,
    /// The host text turned out to be userinfo (an `@` follows).
    UserInfo,
    Invalid,
}

pub struct DomainNameReader<'r, 'a, F: FnMut(char)> {
    cursor: &'r mut Cursor<'a>,
    buffer: &'r mut String,
    /// Byte offset in `buffer` where already-buffered host text begins.
    current: Option<usize>,
    options: DetectorOptions,
    on_char: F,

    start_domain_name: usize,
    dots: usize,
    current_label_length: usize,
    top_level_length: usize,
    numeric: bool,
    seen_bracket: bool,
    seen_complete_bracket_set: bool,
    zone_index: bool,
    restarted: bool,
}

impl<'r, 'a, F: FnMut(char)> DomainNameReader<'r, 'a, F> {
    /// `current` is the offset of host text that is already in the buffer
    /// (possibly empty), or `None` when the host starts at the cursor.
    /// `on_char` receives the delimiter character that ends the host.
    pub fn new(
        cursor: &'r mut Cursor<'a>,
        buffer: &'r mut String,
        current: Option<usize>,
        options: DetectorOptions,
        on_char: F,
    ) -> Self {
        Self {
            cursor,
            buffer,
            current,
            options,
            on_char,
            start_domain_name: 0,
            dots: 0,
            current_label_length: 0,
            top_level_length: 0,
            numeric: false,
            seen_bracket: false,
            seen_complete_bracket_set: false,
            zone_index: false,
            restarted: false,
        }
    }

    /// True when the buffered text was cut down to start after an invalid
    /// character, so the host now starts at buffer offset 0.
    pub fn restarted(&self) -> bool {
        self.restarted
    }

    fn single_level_allowed(&self) -> bool {
        self.options.contains(DetectorOptions::ALLOW_SINGLE_LEVEL_DOMAIN)
    }

    /// Scans the host text that is already buffered.
    fn read_current(&mut self) -> bool {
        let Some(offset) = self.current else {
            self.start_domain_name = self.buffer.len();
            return true;
        };
        let offset = offset.min(self.buffer.len());
        let current: Vec<char> = self.buffer[offset..].chars().collect();

        // ".hello" 或 "%2ehello"
        if current.len() == 1 && is_dot(current[0]) {
            return false;
        }
        if current.len() == 3
            && current[0] == '%'
            && current[1] == '2'
            && current[2].eq_ignore_ascii_case(&'e')
        {
            return false;
        }

        self.start_domain_name = offset;
        self.numeric = true;

        let length = current.len();
        let mut is_all_hex = length > 2 && current[0] == '0' && matches!(current[1], 'x' | 'X');
        let mut index = if is_all_hex { 2 } else { 0 };
        let mut new_start = 0;

        while index < length {
            let c = current[index];

            if is_dot(c) {
                self.dots += 1;
                self.current_label_length = 0;
                index += 1;
                continue;
            }

            self.current_label_length += 1;
            self.top_level_length = self.current_label_length;
            if self.current_label_length >= MAX_LABEL_LENGTH {
                return false;
            }

            if c == '[' {
                self.seen_bracket = true;
                self.numeric = false;
            } else if c == '%'
                && index + 2 < length
                && is_hex(current[index + 1])
                && is_hex(current[index + 2])
            {
                if current[index + 1] == '2' && current[index + 2] == 'e' {
                    self.dots += 1;
                    self.current_label_length = 0;
                } else {
                    self.numeric = false;
                }
                index += 2;
            } else {
                if is_all_hex && !is_hex(c) {
                    self.numeric = false;
                    is_all_hex = false;
                }
                if !is_all_hex {
                    if is_alpha(c) || c == '-' || c >= INTERNATIONAL_CHAR_START {
                        self.numeric = false;
                    } else if !is_numeric(c) && !self.single_level_allowed() {
                        // invalid character: the host can only start after it
                        new_start = index + 1;
                        self.current_label_length = 0;
                        self.top_level_length = 0;
                        self.numeric = true;
                        self.dots = 0;
                    }
                }
            }
            index += 1;
        }

        if new_start > 0 {
            if new_start < length {
                let rest: String = current[new_start..].iter().collect();
                self.buffer.clear();
                self.buffer.push_str(&rest);
                self.start_domain_name = 0;
                self.restarted = true;
            }
            if new_start >= length || self.buffer.as_str() == "." {
                return false;
            }
        }
        true
    }

    pub fn read_domain_name(&mut self) -> DomainState {
        let current_is_empty = match self.current {
            None => true,
            Some(offset) => offset >= self.buffer.len(),
        };
        if !self.read_current() {
            return DomainState::Invalid;
        }

        // 第一段可能是十六进制 IP：0x...
        let is_all_hex = current_is_empty && self.cursor.can_read(3) && self.cursor.peek_matches("0x");
        if is_all_hex {
            for _ in 0..2 {
                if let Some(c) = self.cursor.read() {
                    self.buffer.push(c);
                }
            }
            self.current_label_length += 2;
            self.top_level_length = self.current_label_length;
        }

        while let Some(c) = self.cursor.read() {
            match c {
                '/' => return self.check_domain_name_valid(DomainState::Path, Some(c)),
                ':' if !self.seen_bracket || self.seen_complete_bracket_set => {
                    return self.check_domain_name_valid(DomainState::Port, Some(c));
                }
                '?' => return self.check_domain_name_valid(DomainState::Query, Some(c)),
                '#' => return self.check_domain_name_valid(DomainState::Fragment, Some(c)),
                '@' => {
                    self.cursor.go_back();
                    return DomainState::UserInfo;
                }
                _ => {}
            }

            let encoded_dot = c == '%' && self.cursor.peek_matches("2e");
            if is_dot(c) || encoded_dot {
                // "hello.."
                if self.current_label_length < 1 {
                    break;
                }
                if self.current_label_length >= MAX_LABEL_LENGTH {
                    return DomainState::Invalid;
                }
                self.buffer.push(c);
                if encoded_dot {
                    for _ in 0..2 {
                        if let Some(next) = self.cursor.read() {
                            self.buffer.push(next);
                        }
                    }
                }
                // dots inside a zone index do not separate labels
                if !self.zone_index {
                    self.dots += 1;
                    self.current_label_length = 0;
                }
            } else if self.seen_bracket
                && !self.seen_complete_bracket_set
                && (is_hex(c) || matches!(c, ':' | '[' | ']' | '%'))
            {
                match c {
                    ':' => self.current_label_length = 0,
                    '[' => {
                        // restart from this bracket
                        self.cursor.go_back();
                        return DomainState::Invalid;
                    }
                    ']' => {
                        self.seen_complete_bracket_set = true;
                        self.zone_index = false;
                    }
                    '%' => self.zone_index = true,
                    _ => self.current_label_length += 1,
                }
                self.numeric = false;
                self.buffer.push(c);
            } else if is_alphanumeric(c) || c == '-' || c >= INTERNATIONAL_CHAR_START {
                if self.seen_complete_bracket_set {
                    // [fe80::]www.google.com
                    self.cursor.go_back();
                    break;
                }
                if is_all_hex && !is_hex(c) {
                    self.numeric = false;
                }
                if !is_all_hex && !is_numeric(c) {
                    self.numeric = false;
                }
                self.buffer.push(c);
                self.current_label_length += 1;
                self.top_level_length = self.current_label_length;
            } else if c == '[' && !self.seen_bracket {
                self.seen_bracket = true;
                self.numeric = false;
                self.buffer.push(c);
            } else if c == '[' && self.seen_complete_bracket_set {
                self.cursor.go_back();
                break;
            } else if c == '%'
                && self.cursor.peek(2).map_or(false, |p| is_hex(p[0]) && is_hex(p[1]))
            {
                self.buffer.push(c);
                for _ in 0..2 {
                    if let Some(next) = self.cursor.read() {
                        self.buffer.push(next);
                    }
                }
                self.current_label_length += 3;
                self.top_level_length = self.current_label_length;
            } else {
                (self.on_char)(c);
                break;
            }
        }

        self.check_domain_name_valid(DomainState::Valid, None)
    }

    /// Validates what was read; on success appends `last_char` and returns
    /// `valid_state`, otherwise steps the cursor back one character.
    fn check_domain_name_valid(&mut self, valid_state: DomainState, last_char: Option<char>) -> DomainState {
        let start = self.start_domain_name.min(self.buffer.len());
        let domain = &self.buffer[start..];

        let ends_with_encoded_dot = self.buffer.len() > 3
            && self
                .buffer
                .get(self.buffer.len() - 3..)
                .map_or(false, |tail| tail.eq_ignore_ascii_case("%2e"));
        let last_dot_length = if ends_with_encoded_dot { 3 } else { 1 };
        let has_open_label = self.current_label_length > 0;
        let domain_length = domain.chars().count() + if has_open_label { last_dot_length } else { 0 };
        let dot_count = self.dots + usize::from(has_open_label);

        let valid = if domain_length >= MAX_DOMAIN_LENGTH
            || dot_count > MAX_NUMBER_LABELS
            || self.current_label_length >= MAX_LABEL_LENGTH
        {
            false
        } else if self.numeric {
            is_valid_ipv4(&domain.to_lowercase())
        } else if self.seen_bracket {
            is_valid_ipv6(&domain.to_lowercase())
        } else if (has_open_label && self.dots >= 1)
            || (self.dots >= 2 && !has_open_label)
            || (self.single_level_allowed() && self.dots == 0)
        {
            let total = self.buffer.chars().count();
            let trailing_dot = usize::from(!has_open_label);
            let top_start = total.saturating_sub(self.top_level_length + trailing_dot);
            let top_prefix: String = self.buffer.chars().skip(top_start).take(4).collect();
            top_prefix.eq_ignore_ascii_case("xn--")
                || (MIN_TOP_LEVEL_DOMAIN..=MAX_TOP_LEVEL_DOMAIN).contains(&self.top_level_length)
        } else {
            false
        };

        if valid {
            if let Some(c) = last_char {
                self.buffer.push(c);
            }
            return valid_state;
        }

        // "00:41.<br />" 否则会被识别成 41.br
        self.cursor.go_back();
        DomainState::Invalid
    }
}

/// Parses an IPv4 component written in hex (`0x..`), octal (leading `0`)
/// or decimal. Empty digits after a prefix count as zero.
fn parse_ip_number(part: &str) -> Option<u64> {
    let (digits, radix) = if part.len() > 2 && part.starts_with("0x") {
        (&part[2..], 16)
    } else if let Some(rest) = part.strip_prefix('0') {
        (rest, 8)
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

/// Accepts a single 32-bit number or four dotted components, each in hex,
/// octal or decimal.
pub(crate) fn is_valid_ipv4(domain: &str) -> bool {
    if domain.is_empty() {
        return false;
    }
    let parts = split_by_dot(domain);
    match parts.len() {
        1 => {
            parse_ip_number(domain).map_or(false, |value| {
                (MIN_NUMERIC_DOMAIN_VALUE..=MAX_NUMERIC_DOMAIN_VALUE).contains(&value)
            })
        }
        4 => parts.iter().all(|part| {
            !part.is_empty()
                && parse_ip_number(part).map_or(false, |value| value <= u64::from(MAX_IP_PART))
        }),
        _ => false,
    }
}

/// Checks a bracketed IPv6 literal, including compressed notation, an
/// embedded IPv4 tail and a zone index.
pub(crate) fn is_valid_ipv6(domain: &str) -> bool {
    let chars: Vec<char> = domain.chars().collect();
    let n = chars.len();
    // [....]，拒绝 "[]" 以及 "[:8000:...]"（只允许 "[::8000:...]"）
    if n < 3 || chars[0] != '[' || chars[n - 1] != ']' || (chars[1] == ':' && chars[2] != ':') {
        return false;
    }

    let mut num_sections = 1;
    let mut hex_digits = 0;
    let mut prev_char = '\0';
    let mut last_section = String::new();
    let mut hex_section = true;
    let mut zone_mode = false;
    let mut double_colon = false;

    let mut index = 0;
    while index < n {
        let c = chars[index];
        match c {
            '[' => {}
            '%' | ']' => {
                let mut encoded_dot = false;
                if c == '%' {
                    if chars.get(index + 1) == Some(&'2') && chars.get(index + 2) == Some(&'e') {
                        last_section.push_str("%2e");
                        index += 2;
                        hex_section = false;
                        encoded_dot = true;
                    } else {
                        zone_mode = true;
                    }
                }
                if !encoded_dot && !hex_section && (!zone_mode || c == '%') {
                    if !is_valid_ipv4(&last_section) {
                        return false;
                    }
                    // IPv4 尾部占两段
                    num_sections += 1;
                }
            }
            ':' => {
                if prev_char == ':' {
                    if double_colon {
                        return false;
                    }
                    double_colon = true;
                }
                if !hex_section {
                    return false;
                }
                hex_section = true;
                hex_digits = 0;
                num_sections += 1;
                last_section.clear();
            }
            _ => {
                if zone_mode {
                    if !is_unreserved(c) {
                        return false;
                    }
                } else {
                    last_section.push(c);
                    if hex_section && is_hex(c) {
                        hex_digits += 1;
                    } else {
                        hex_section = false;
                    }
                }
            }
        }

        if hex_digits > 4 || num_sections > 8 {
            return false;
        }
        prev_char = chars[index];
        index += 1;
    }

    num_sections != 1 && (num_sections >= 8 || double_colon)
}
