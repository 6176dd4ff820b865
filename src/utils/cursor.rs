use super::chars::is_whitespace;

/// 字符游标：在已解码的字符序列上前进、回退、预读。
///
/// Positions count characters, not bytes. Every whitespace character the
/// scanner cares about (space, `\n`, `\t`, `\r`) is handed out as a plain
/// space by [`Cursor::read`], so callers only ever test for `' '`.
pub struct Cursor<'a> {
    input: &'a [char],
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[inline(always)]
    pub fn new(input: &'a [char]) -> Self {
        Self { input, pos: 0 }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.input.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// True when at least `n` more characters are available.
    #[inline(always)]
    pub fn can_read(&self, n: usize) -> bool {
        self.input.len() >= self.pos + n
    }

    /// 读取一个字符并前进；空白统一折叠为空格
    #[inline(always)]
    pub fn read(&mut self) -> Option<char> {
        let c = *self.input.get(self.pos)?;
        self.pos += 1;
        Some(if is_whitespace(c) { ' ' } else { c })
    }

    /// The next `n` raw characters, without moving.
    #[inline(always)]
    pub fn peek(&self, n: usize) -> Option<&'a [char]> {
        if self.can_read(n) {
            Some(&self.input[self.pos..self.pos + n])
        } else {
            None
        }
    }

    #[inline(always)]
    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    /// 预读并做 ASCII 大小写无关比较（用于 `%2e`、`%3a`、`0x` 这类短标记）
    pub fn peek_matches(&self, pattern: &str) -> bool {
        let n = pattern.chars().count();
        match self.peek(n) {
            Some(window) => window
                .iter()
                .zip(pattern.chars())
                .all(|(a, b)| a.eq_ignore_ascii_case(&b)),
            None => false,
        }
    }

    /// Moves to `pos`, clamped to the input length.
    #[inline(always)]
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    /// Steps back one character; a no-op at the start of input.
    #[inline(always)]
    pub fn go_back(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn read_folds_whitespace() {
        let input = chars("a\tb\nc\r");
        let mut cursor = Cursor::new(&input);
        let read: String = std::iter::from_fn(|| cursor.read()).collect();
        assert_eq!(read, "a b c ");
        assert!(cursor.at_end());
        assert_eq!(cursor.read(), None);
    }

    #[test]
    fn peek_does_not_move() {
        let input = chars("%2Ehost");
        let cursor = Cursor::new(&input);
        assert!(cursor.peek_matches("%2e"));
        assert_eq!(cursor.peek(2), Some(&input[..2]));
        assert_eq!(cursor.peek_at(3), Some('h'));
        assert_eq!(cursor.peek(8), None);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn can_read_counts_remaining() {
        let input = chars("abc");
        let mut cursor = Cursor::new(&input);
        assert!(cursor.can_read(3));
        assert!(!cursor.can_read(4));
        cursor.read();
        assert!(cursor.can_read(2));
        assert!(!cursor.can_read(3));
    }

    #[test]
    fn seek_and_go_back_stay_in_bounds() {
        let input = chars("ab");
        let mut cursor = Cursor::new(&input);
        cursor.go_back();
        assert_eq!(cursor.position(), 0);
        cursor.seek(10);
        assert_eq!(cursor.position(), 2);
        cursor.go_back();
        assert_eq!(cursor.read(), Some('b'));
    }

    #[test]
    fn multibyte_characters_are_single_positions() {
        let input = chars("五礦.中國");
        let mut cursor = Cursor::new(&input);
        cursor.seek(2);
        assert_eq!(cursor.read(), Some('.'));
        assert_eq!(cursor.len(), 5);
    }
}
