//! Top-level detection state machine.
//!
//! The scanner reads the input once, buffering characters that may belong
//! to a URL. Boundary characters (`:`, `.`, `/`, `@`, `[`, `%XX`) hand the
//! buffered text to the host reader, whose verdict decides whether to keep
//! reading a port, path, query or fragment, or to drop the candidate and
//! roll the cursor back.

use super::domain::{DomainNameReader, DomainState};
use super::options::{DetectorConfig, DetectorOptions};
use crate::url::marker::{UrlMarker, UrlPart};
use crate::url::Url;
use crate::utils::chars::{is_alpha, is_dot, is_hex, is_numeric};
use crate::utils::cursor::Cursor;
use ahash::AHashMap;
use tracing::{debug, trace};

/// 分隔符匹配结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharacterMatch {
    NotMatched,
    /// Closes a delimited region: the current candidate ends here.
    Stop,
    /// Opens a region, or a stray closer that re-arms matching.
    Start,
}

/// Occurrence counts of quote and bracket characters over a whole run.
#[derive(Debug, Default)]
pub(crate) struct CharacterMatcher {
    counts: AHashMap<char, usize>,
    quote_start: bool,
    single_quote_start: bool,
}

impl CharacterMatcher {
    #[inline(always)]
    fn count(&self, c: char) -> usize {
        self.counts.get(&c).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn bump(&mut self, c: char) -> usize {
        let count = self.counts.entry(c).or_insert(0);
        *count += 1;
        *count
    }

    pub(crate) fn check(&mut self, c: char, options: DetectorOptions) -> CharacterMatch {
        let quote = (c == '"' && options.contains(DetectorOptions::QUOTE_MATCH))
            || (c == '\'' && options.contains(DetectorOptions::SINGLE_QUOTE_MATCH));
        if quote {
            let flag = if c == '"' {
                &mut self.quote_start
            } else {
                &mut self.single_quote_start
            };
            let started = std::mem::replace(flag, true);
            let count = self.bump(c);
            return if started || count % 2 == 0 {
                CharacterMatch::Stop
            } else {
                CharacterMatch::Start
            };
        }

        let brackets = options.contains(DetectorOptions::BRACKET_MATCH);
        let xml = options.contains(DetectorOptions::XML);
        if (brackets && matches!(c, '[' | '{' | '(')) || (xml && c == '<') {
            self.bump(c);
            return CharacterMatch::Start;
        }

        let opener = match c {
            ']' if brackets => '[',
            '}' if brackets => '{',
            ')' if brackets => '(',
            '>' if xml => '<',
            _ => return CharacterMatch::NotMatched,
        };
        let closed = self.bump(c);
        if self.count(opener) > closed {
            CharacterMatch::Stop
        } else {
            CharacterMatch::Start
        }
    }

    fn reset_quotes(&mut self) {
        self.quote_start = false;
        self.single_quote_start = false;
    }
}

/// Per-candidate state; cleared by [`Scanner::read_end`].
#[derive(Debug, Default)]
struct RunState {
    buffer: String,
    marker: UrlMarker,
    has_scheme: bool,
    /// A `[` failed to open an IPv6 literal; treat brackets as delimiters.
    dont_match_ipv6: bool,
    /// Lives for the whole run.
    matcher: CharacterMatcher,
}

impl RunState {
    #[inline(always)]
    fn is_clean(&self) -> bool {
        self.buffer.is_empty() && !self.has_scheme
    }
}

struct Scanner<'c, 'a> {
    config: &'c DetectorConfig,
    cursor: Cursor<'a>,
    state: RunState,
    urls: Vec<Url>,
}

impl<'c, 'a> Scanner<'c, 'a> {
    fn new(config: &'c DetectorConfig, input: &'a [char]) -> Self {
        Self {
            config,
            cursor: Cursor::new(input),
            state: RunState::default(),
            urls: Vec::new(),
        }
    }

    #[inline(always)]
    fn single_level(&self) -> bool {
        self.config.has(DetectorOptions::ALLOW_SINGLE_LEVEL_DOMAIN)
    }

    #[inline(always)]
    fn check_matching(&mut self, c: char) -> CharacterMatch {
        self.state.matcher.check(c, self.config.options)
    }

    #[inline(always)]
    fn push(&mut self, c: char) {
        self.state.buffer.push(c);
    }

    /// Moves `n` characters from the cursor into the buffer.
    fn push_next(&mut self, n: usize) {
        for _ in 0..n {
            if let Some(c) = self.cursor.read() {
                self.state.buffer.push(c);
            }
        }
    }

    /// A clean iteration must start past the previous clean start.
    fn guard_progress(&mut self, floor: &mut Option<usize>) {
        if !self.state.is_clean() {
            return;
        }
        let pos = self.cursor.position();
        match *floor {
            Some(last) if pos <= last => {
                debug!(position = pos, resume = last + 1, "no progress since last candidate, skipping ahead");
                self.cursor.seek(last + 1);
                *floor = Some(last + 1);
            }
            _ => *floor = Some(pos),
        }
    }

    fn read_default(&mut self) {
        // 当前候选中尚未归属的那段文本在 buffer 中的起点（字节偏移）
        let mut length = 0usize;
        let mut floor = None;

        while !self.cursor.at_end() {
            self.guard_progress(&mut floor);
            let Some(curr) = self.cursor.read() else {
                break;
            };

            match curr {
                ' ' => {
                    // 单级域名：空格前可能是 "http://localhost"
                    if self.single_level() && !self.state.buffer.is_empty() && self.state.has_scheme {
                        self.cursor.go_back();
                        if !self.read_domain_name(Some(length)) {
                            self.read_end(false);
                        }
                    }
                    self.push(curr);
                    self.read_end(false);
                    length = 0;
                }
                '%' => {
                    if self.cursor.can_read(2) {
                        if self.cursor.peek_matches("3a") {
                            self.push(curr);
                            self.push_next(2);
                            length = self.process_colon(length);
                        } else if self.cursor.peek_at(0).map_or(false, is_hex)
                            && self.cursor.peek_at(1).map_or(false, is_hex)
                        {
                            self.push(curr);
                            self.push_next(2);
                            if !self.read_domain_name(Some(length)) {
                                self.read_end(false);
                            }
                            length = 0;
                        }
                    }
                }
                c if is_dot(c) => {
                    self.push(c);
                    if !self.read_domain_name(Some(length)) {
                        self.read_end(false);
                    }
                    length = 0;
                }
                '@' => {
                    if !self.state.buffer.is_empty() {
                        self.state.marker.set(UrlPart::UsernamePassword, length);
                        self.push(curr);
                        if !self.read_domain_name(None) {
                            self.read_end(false);
                        }
                        length = 0;
                    }
                }
                '[' => {
                    if self.state.dont_match_ipv6 && self.check_matching(curr) != CharacterMatch::NotMatched {
                        self.read_end(false);
                        length = 0;
                    }

                    let beginning = self.cursor.position();
                    if !self.state.has_scheme {
                        self.state.buffer.clear();
                        length = 0;
                    }
                    self.push(curr);

                    if !self.read_domain_name(Some(length)) {
                        // not an IPv6 literal: look for URLs inside the brackets instead
                        self.read_end(false);
                        self.cursor.seek(beginning);
                        self.state.dont_match_ipv6 = true;
                    }
                    length = 0;
                }
                '/' => {
                    let long_buffer = self.state.buffer.chars().nth(1).is_some();
                    if self.state.has_scheme || (self.single_level() && long_buffer) {
                        // http://123123123/ 或单级域名 go/
                        self.cursor.go_back();
                        if !self.read_domain_name(Some(length)) {
                            self.read_end(false);
                        }
                        length = 0;
                    } else {
                        self.read_end(false);
                        self.push(curr);
                        self.state.has_scheme = self.read_html5_root();
                        length = self.state.buffer.len();
                    }
                }
                ':' => {
                    self.push(curr);
                    length = self.process_colon(length);
                }
                _ => {
                    if self.check_matching(curr) != CharacterMatch::NotMatched {
                        self.read_end(false);
                        length = 0;
                    } else {
                        self.push(curr);
                    }
                }
            }
        }

        if self.single_level() && !self.state.buffer.is_empty() && self.state.has_scheme {
            if !self.read_domain_name(Some(length)) {
                self.read_end(false);
            }
        }
    }

    /// A `:` (or `%3a`) was buffered. Returns the new start of unassigned
    /// text in the buffer.
    fn process_colon(&mut self, mut length: usize) -> usize {
        if self.state.has_scheme {
            if !self.read_user_pass(length) {
                // let the host reader see the ':' as a port separator
                self.cursor.go_back();
                if self.state.buffer.pop().is_none() {
                    length = 0;
                }

                let pending = self.state.buffer.get(length..).map_or(0, |s| s.chars().count());
                let backtrack = self.cursor.position().saturating_sub(pending);
                if !self.read_domain_name(Some(length)) {
                    self.cursor.seek(backtrack);
                    self.read_end(false);
                }
            }
            0
        } else if self.read_scheme() && !self.state.buffer.is_empty() {
            self.state.has_scheme = true;
            self.state.buffer.len()
        } else if !self.state.buffer.is_empty() && self.single_level() && self.cursor.can_read(1) {
            // "localhost:9000"
            self.cursor.go_back();
            self.state.buffer.pop();
            if !self.read_domain_name(Some(0)) {
                self.read_end(false);
            }
            0
        } else {
            self.read_end(false);
            0
        }
    }

    /// Accepts the buffered text when it ends with an allowed
    /// `scheme://` or `scheme%3a//`.
    fn read_scheme(&mut self) -> bool {
        let original_length = self.state.buffer.len();
        let mut num_slashes = 0;

        while let Some(curr) = self.cursor.read() {
            if curr == '/' {
                self.push(curr);
                if num_slashes == 1 {
                    let Some(start) = self.config.schemes.find_suffix(&self.state.buffer) else {
                        return false;
                    };
                    if start > 0 {
                        // "url(https://" 只保留协议部分
                        self.state.buffer.drain(..start);
                        self.state.marker = UrlMarker::new();
                    }
                    self.state.marker.set(UrlPart::Scheme, 0);
                    return true;
                }
                num_slashes += 1;
            } else if curr == ' ' || self.check_matching(curr) != CharacterMatch::NotMatched {
                self.push(curr);
                return false;
            } else if curr == '[' {
                self.cursor.go_back();
                return false;
            } else if original_length > 0 || num_slashes > 0 || !is_alpha(curr) {
                // not a scheme: maybe "user:pass@"
                self.cursor.go_back();
                return self.read_user_pass(0);
            }
        }
        false
    }

    /// Reads `user:pass@`. On success the host reader takes over; on a
    /// dot, `[`, `#`, space, `/` or delimiter the read text is rolled back.
    fn read_user_pass(&mut self, beginning_of_username: usize) -> bool {
        let start = self.state.buffer.len();
        let mut done = false;
        let mut rollback = false;

        while !done {
            let Some(curr) = self.cursor.read() else {
                break;
            };

            if curr == '@' {
                self.push(curr);
                self.state.marker.set(UrlPart::UsernamePassword, beginning_of_username);
                return self.read_domain_name(Some(self.state.buffer.len()));
            }

            if is_dot(curr) || curr == '[' {
                // 可能其实是域名，记下以便回滚
                self.push(curr);
                rollback = true;
            } else if matches!(curr, '#' | ' ' | '/')
                || self.check_matching(curr) != CharacterMatch::NotMatched
            {
                rollback = true;
                done = true;
            } else {
                self.push(curr);
            }
        }

        if rollback {
            let distance = self.state.buffer.get(start..).map_or(0, |s| s.chars().count());
            self.state.buffer.truncate(start);
            let back = distance + usize::from(done);
            self.cursor.seek(self.cursor.position().saturating_sub(back));
            return false;
        }

        self.read_end(false)
    }

    /// Runs the host reader over `buffer[current..]` plus whatever follows
    /// at the cursor, then continues with the part it points to.
    fn read_domain_name(&mut self, current: Option<usize>) -> bool {
        let buffer_len = self.state.buffer.len();
        let current = current.map(|offset| {
            if self.state.buffer.is_char_boundary(offset) {
                offset
            } else {
                buffer_len
            }
        });
        self.state.marker.set(UrlPart::Host, current.unwrap_or(buffer_len));

        let options = self.config.options;
        let (next, restarted) = {
            let RunState { buffer, matcher, .. } = &mut self.state;
            let mut reader = DomainNameReader::new(&mut self.cursor, buffer, current, options, |c| {
                matcher.check(c, options);
            });
            let next = reader.read_domain_name();
            (next, reader.restarted())
        };

        if restarted {
            self.state.marker = UrlMarker::new();
            self.state.marker.set(UrlPart::Host, 0);
        }

        match next {
            DomainState::Valid => self.read_end(true),
            DomainState::Fragment => self.read_fragment(),
            DomainState::Path => self.read_path(),
            DomainState::Port => self.read_port(),
            DomainState::Query => self.read_query_string(),
            DomainState::UserInfo => {
                let host = self.state.marker.index_of(UrlPart::Host).unwrap_or(0);
                self.state.marker.unset(UrlPart::Host);
                self.read_user_pass(host)
            }
            DomainState::Invalid => false,
        }
    }

    /// `//host/path`: the first `/` is buffered, look for the second.
    fn read_html5_root(&mut self) -> bool {
        let Some(curr) = self.cursor.read() else {
            return false;
        };
        if curr == '/' {
            self.push(curr);
            return true;
        }
        self.cursor.go_back();
        self.read_end(false);
        false
    }

    fn read_fragment(&mut self) -> bool {
        self.mark_last(UrlPart::Fragment);
        while let Some(curr) = self.cursor.read() {
            if curr == ' ' || self.check_matching(curr) != CharacterMatch::NotMatched {
                return self.read_end(true);
            }
            self.push(curr);
        }
        self.read_end(true)
    }

    fn read_query_string(&mut self) -> bool {
        self.mark_last(UrlPart::Query);
        while let Some(curr) = self.cursor.read() {
            if curr == '#' {
                self.push(curr);
                return self.read_fragment();
            }
            if curr == ' ' || self.check_matching(curr) != CharacterMatch::NotMatched {
                return self.read_end(true);
            }
            self.push(curr);
        }
        self.read_end(true)
    }

    /// Digits after `:`. A non-digit ends the URL; a lone `:` is dropped.
    fn read_port(&mut self) -> bool {
        self.state.marker.set(UrlPart::Port, self.state.buffer.len());
        let mut port_len = 0;

        while let Some(curr) = self.cursor.read() {
            port_len += 1;
            match curr {
                '/' => {
                    self.push(curr);
                    return self.read_path();
                }
                '?' => {
                    self.push(curr);
                    return self.read_query_string();
                }
                '#' => {
                    self.push(curr);
                    return self.read_fragment();
                }
                _ => {}
            }

            if self.check_matching(curr) == CharacterMatch::Stop || !is_numeric(curr) {
                self.cursor.go_back();
                // google.com:hello.world
                if port_len == 1 {
                    self.state.buffer.pop();
                    self.state.marker.unset(UrlPart::Port);
                }
                return self.read_end(true);
            }
            self.push(curr);
        }
        self.read_end(true)
    }

    fn read_path(&mut self) -> bool {
        self.mark_last(UrlPart::Path);
        while let Some(curr) = self.cursor.read() {
            if curr == ' ' || self.check_matching(curr) != CharacterMatch::NotMatched {
                return self.read_end(true);
            }
            self.push(curr);
            match curr {
                '?' => return self.read_query_string(),
                '#' => return self.read_fragment(),
                _ => {}
            }
        }
        self.read_end(true)
    }

    /// Marks `part` at the character just buffered (`/`, `?` or `#`).
    #[inline(always)]
    fn mark_last(&mut self, part: UrlPart) {
        let index = self.state.buffer.len().saturating_sub(1);
        self.state.marker.set(part, index);
    }

    /// Emits the candidate when `valid`, then resets per-candidate state.
    fn read_end(&mut self, valid: bool) -> bool {
        if valid && !self.state.buffer.is_empty() {
            if self.state.matcher.quote_start && self.state.buffer.ends_with('"') {
                self.state.buffer.pop();
            }
            if !self.state.buffer.is_empty() {
                let marker = std::mem::take(&mut self.state.marker);
                let original = std::mem::take(&mut self.state.buffer);
                trace!(url = %original, len = original.len(), "url detected");
                self.urls.push(marker.create_url(original));
            }
        }

        self.state.buffer.clear();
        self.state.matcher.reset_quotes();
        self.state.has_scheme = false;
        self.state.dont_match_ipv6 = false;
        self.state.marker = UrlMarker::new();
        valid
    }
}

/// Finds URLs in free text.
///
/// A detector only holds configuration; every call to [`UrlDetector::detect`]
/// starts from a fresh state, so one value can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct UrlDetector {
    config: DetectorConfig,
}

impl UrlDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// 使用默认协议集合
    pub fn with_options(options: DetectorOptions) -> Self {
        Self::new(DetectorConfig::new(options))
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Every URL in `text`, in order of appearance.
    pub fn detect(&self, text: &str) -> Vec<Url> {
        let input: Vec<char> = text.chars().collect();
        let mut scanner = Scanner::new(&self.config, &input);
        scanner.read_default();
        debug!(input_len = text.len(), matches = scanner.urls.len(), "detection finished");
        scanner.urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn found(text: &str, options: DetectorOptions) -> Vec<String> {
        UrlDetector::with_options(options)
            .detect(text)
            .iter()
            .map(|u| u.original_url().to_string())
            .collect()
    }

    #[test]
    fn quotes_alternate_between_start_and_stop() {
        let mut matcher = CharacterMatcher::default();
        let opts = DetectorOptions::QUOTE_MATCH;
        assert_eq!(matcher.check('"', opts), CharacterMatch::Start);
        assert_eq!(matcher.check('"', opts), CharacterMatch::Stop);
        matcher.reset_quotes();
        assert_eq!(matcher.check('"', opts), CharacterMatch::Start);
        assert_eq!(matcher.check('\'', opts), CharacterMatch::NotMatched);
    }

    #[test]
    fn closers_stop_only_with_an_open_bracket() {
        let mut matcher = CharacterMatcher::default();
        let opts = DetectorOptions::BRACKET_MATCH;
        assert_eq!(matcher.check(')', opts), CharacterMatch::Start);
        assert_eq!(matcher.check('(', opts), CharacterMatch::Start);
        assert_eq!(matcher.check('(', opts), CharacterMatch::Start);
        assert_eq!(matcher.check(')', opts), CharacterMatch::Stop);
        assert_eq!(matcher.check('<', opts), CharacterMatch::NotMatched);
        assert_eq!(matcher.check('<', DetectorOptions::XML), CharacterMatch::Start);
    }

    #[test]
    fn plain_hosts() {
        assert_eq!(found("hello www.google.com world", DetectorOptions::empty()), ["www.google.com"]);
        assert_eq!(found("nothing here", DetectorOptions::empty()), Vec::<String>::new());
    }

    #[test]
    fn scheme_path_query_fragment() {
        let urls = UrlDetector::default().detect("see https://www.a.com:8080/p?q=1#top now");
        assert_eq!(urls.len(), 1);
        let url = &urls[0];
        assert_eq!(url.original_url(), "https://www.a.com:8080/p?q=1#top");
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host(), "www.a.com");
        assert_eq!(url.port(), Some(8080));
        assert_eq!(url.path(), "/p");
        assert_eq!(url.query(), "?q=1");
        assert_eq!(url.fragment(), "#top");
    }

    #[test]
    fn dirty_scheme_prefix_is_dropped() {
        let urls = UrlDetector::default().detect(" l:url(https://mytest.com/test ");
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].original_url(), "https://mytest.com/test");
        assert_eq!(urls[0].scheme(), "https");
        assert_eq!(urls[0].host(), "mytest.com");
    }

    #[test]
    fn single_level_hosts_follow_the_config() {
        let config = DetectorConfig::new(DetectorOptions::ALLOW_SINGLE_LEVEL_DOMAIN | DetectorOptions::QUOTE_MATCH);
        let urls = UrlDetector::new(config).detect("localhost:9000/lalala hehe");
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].original_url(), "localhost:9000/lalala");
        assert_eq!(found("localhost:9000/lalala hehe", DetectorOptions::QUOTE_MATCH), Vec::<String>::new());
    }

    #[test]
    fn stalled_scan_terminates() {
        assert_eq!(found(" :u ", DetectorOptions::ALLOW_SINGLE_LEVEL_DOMAIN), Vec::<String>::new());
    }
}
