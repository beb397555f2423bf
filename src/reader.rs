use std::collections::VecDeque;
use std::fmt::Display;
use std::io::{self, Read};

use crate::error::{DjsonError, Result};

const BUFFER_SIZE: usize = 8 * 1024;

/// A forward character cursor over a source of text, tracking positional
/// data as it advances.
///
/// The reader always holds one character of implicit lookahead: after any
/// operation, [`current`](Self::current) is the next unconsumed character,
/// or `None` at end of text. `index` is the zero-based character index of
/// `current`, `line` is one-based, and `column` is zero-based.
///
/// A capture records the exact run of characters consumed between
/// [`start_capture`](Self::start_capture) and
/// [`end_capture`](Self::end_capture), even when the underlying source is
/// a byte stream whose buffer rotates in the meantime.
pub struct PositionReader {
    source: Source,
    pub current: Option<char>,
    pub index: usize,
    pub line: usize,
    pub column: usize,
    pub lines_skipped: usize,
    capture: Option<String>,
}

enum Source {
    Text { chars: Vec<char>, pos: usize },
    Stream { inner: Box<dyn Read>, queue: VecDeque<char>, carry: Vec<u8>, done: bool },
}

impl PositionReader {
    /// Creates a reader over in-memory text.
    pub fn from_text(text: &str) -> Self {
        let mut reader = Self::empty(Source::Text { chars: text.chars().collect(), pos: 0 });
        reader.current = reader.next_char().expect("text source cannot fail");
        reader
    }

    /// Creates a reader over a byte stream, decoding UTF-8 incrementally
    /// with bounded buffering.
    pub fn from_reader<R: Read + 'static>(inner: R) -> Result<Self> {
        let mut reader = Self::empty(Source::Stream {
            inner: Box::new(inner),
            queue: VecDeque::new(),
            carry: Vec::new(),
            done: false,
        });
        reader.current = reader.next_char()?;
        Ok(reader)
    }

    fn empty(source: Source) -> Self {
        Self {
            source,
            current: None,
            index: 0,
            line: 1,
            column: 0,
            lines_skipped: 0,
            capture: None,
        }
    }

    /// Releases the underlying source. Idempotent; the reader reports end
    /// of text afterwards.
    pub fn close(&mut self) {
        self.current = None;
        self.source = Source::Text { chars: Vec::new(), pos: 0 };
    }

    /// Consumes the current character and advances all positional data.
    pub fn read(&mut self) -> Result<()> {
        if let Some(c) = self.current {
            if let Some(capture) = &mut self.capture {
                capture.push(c);
            }
            self.index += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
            self.current = self.next_char()?;
        }
        Ok(())
    }

    fn next_char(&mut self) -> Result<Option<char>> {
        match &mut self.source {
            Source::Text { chars, pos } => {
                let c = chars.get(*pos).copied();
                if c.is_some() {
                    *pos += 1;
                }
                Ok(c)
            }
            Source::Stream { inner, queue, carry, done } => {
                while queue.is_empty() && !*done {
                    let mut buffer = [0u8; BUFFER_SIZE];
                    let count = inner.read(&mut buffer)?;
                    if count == 0 {
                        *done = true;
                        if !carry.is_empty() {
                            return Err(invalid_utf8());
                        }
                        break;
                    }
                    carry.extend_from_slice(&buffer[..count]);
                    let valid_to = match std::str::from_utf8(carry) {
                        Ok(s) => {
                            queue.extend(s.chars());
                            carry.len()
                        }
                        Err(e) => {
                            if e.error_len().is_some() {
                                return Err(invalid_utf8());
                            }
                            let valid = e.valid_up_to();
                            let s = std::str::from_utf8(&carry[..valid]).expect("validated prefix");
                            queue.extend(s.chars());
                            valid
                        }
                    };
                    carry.drain(..valid_to);
                }
                Ok(queue.pop_front())
            }
        }
    }

    pub fn is_end_of_text(&self) -> bool {
        self.current.is_none()
    }

    pub fn is_digit(&self) -> bool {
        matches!(self.current, Some(c) if c.is_ascii_digit())
    }

    /// Consumes a single digit, if one is present.
    pub fn read_digit(&mut self) -> Result<bool> {
        if self.is_digit() {
            self.read()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Consumes an entire run of digits.
    pub fn read_all_digits(&mut self) -> Result<()> {
        while self.is_digit() {
            self.read()?;
        }
        Ok(())
    }

    /// Consumes the given character, if it is current.
    pub fn read_if(&mut self, c: char) -> Result<bool> {
        if self.current == Some(c) {
            self.read()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Consumes the given character or fails with a syntax error.
    pub fn expect(&mut self, c: char) -> Result<()> {
        if !self.read_if(c)? {
            return Err(self.expected(format_args!("'{}'", c)));
        }
        Ok(())
    }

    /// Consumes spaces, tabs, carriage returns, and newlines, counting
    /// newlines into [`lines_skipped`](Self::lines_skipped). The flag
    /// controls whether the counter is reset before skipping.
    pub fn skip_whitespace(&mut self, reset_lines_skipped: bool) -> Result<()> {
        if reset_lines_skipped {
            self.lines_skipped = 0;
        }
        while let Some(c) = self.current {
            match c {
                ' ' | '\t' | '\r' => self.read()?,
                '\n' => {
                    self.lines_skipped += 1;
                    self.read()?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Consumes only non-newline whitespace.
    pub fn skip_line_whitespace(&mut self) -> Result<()> {
        while matches!(self.current, Some(' ' | '\t' | '\r')) {
            self.read()?;
        }
        Ok(())
    }

    /// Begins recording consumed characters.
    pub fn start_capture(&mut self) {
        self.capture = Some(String::new());
    }

    /// Ends the capture, returning everything consumed since
    /// [`start_capture`](Self::start_capture).
    pub fn end_capture(&mut self) -> String {
        self.capture.take().unwrap_or_default()
    }

    /// Discards the active capture.
    pub fn invalidate_capture(&mut self) {
        self.capture = None;
    }

    /// Consumes a quoted string, interpreting JSON-style escapes. The
    /// opening quote must be current.
    pub fn read_quoted(&mut self, quote: char) -> Result<String> {
        self.read()?;
        let mut parsed = String::new();
        loop {
            match self.current {
                None => return Err(self.expected(format_args!("'{}'", quote))),
                Some('\n') => return Err(self.expected(format_args!("'{}'", quote))),
                Some(c) if c == quote => {
                    self.read()?;
                    return Ok(parsed);
                }
                Some('\\') => {
                    self.read()?;
                    parsed.push(self.read_escape()?);
                }
                Some(c) => {
                    parsed.push(c);
                    self.read()?;
                }
            }
        }
    }

    fn read_escape(&mut self) -> Result<char> {
        let c = match self.current {
            None => return Err(self.expected("escape sequence")),
            Some(c) => c,
        };
        self.read()?;
        Ok(match c {
            '"' => '"',
            '\'' => '\'',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => self.read_unicode_escape()?,
            _ => return Err(self.unexpected(format_args!("escape sequence '\\{}'", c))),
        })
    }

    fn read_unicode_escape(&mut self) -> Result<char> {
        let first = self.read_hex4()?;
        if (0xD800..=0xDBFF).contains(&first) {
            // high surrogate: requires a paired \uXXXX low surrogate
            self.expect('\\')?;
            self.expect('u')?;
            let second = self.read_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&second) {
                return Err(self.unexpected("unpaired surrogate escape"));
            }
            let combined = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
            return char::from_u32(combined).ok_or_else(|| self.unexpected("surrogate escape"));
        }
        char::from_u32(first).ok_or_else(|| self.unexpected("unpaired surrogate escape"))
    }

    fn read_hex4(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let digit = match self.current.and_then(|c| c.to_digit(16)) {
                Some(d) => d,
                None => return Err(self.expected("hexadecimal digit")),
            };
            value = value * 16 + digit;
            self.read()?;
        }
        Ok(value)
    }

    /// Consumes the body of a triple-quoted multiline string. The opening
    /// `'''` must already be consumed. The minimum leading-whitespace
    /// prefix of the non-blank interior lines is stripped from every line,
    /// and a single trailing newline before the closer is trimmed.
    pub fn read_multi(&mut self) -> Result<String> {
        let mut raw = String::new();
        loop {
            match self.current {
                None => return Err(self.expected("closing '''")),
                Some('\'') => {
                    self.read()?;
                    if !self.read_if('\'')? {
                        raw.push('\'');
                        continue;
                    }
                    if self.read_if('\'')? {
                        return Ok(strip_indentation(&raw));
                    }
                    raw.push_str("''");
                }
                Some(c) => {
                    raw.push(c);
                    self.read()?;
                }
            }
        }
    }

    /// Consumes the remainder of a `//` comment. The markers must already
    /// be consumed; the terminating newline is left in place.
    pub fn read_line_comment(&mut self) -> Result<String> {
        self.read_to_line_end()
    }

    /// Consumes the remainder of a `#` comment.
    pub fn read_hash_comment(&mut self) -> Result<String> {
        self.read_to_line_end()
    }

    fn read_to_line_end(&mut self) -> Result<String> {
        let mut raw = String::new();
        while let Some(c) = self.current {
            if c == '\n' {
                break;
            }
            raw.push(c);
            self.read()?;
        }
        Ok(raw.trim().to_string())
    }

    /// Consumes the remainder of a `/* */` comment. The opening markers
    /// must already be consumed. A consistent leading `*` rail and common
    /// indentation are stripped from the parsed text.
    pub fn read_block_comment(&mut self) -> Result<String> {
        let mut raw = String::new();
        loop {
            match self.current {
                None => return Err(self.expected("'*/'")),
                Some('*') => {
                    self.read()?;
                    if self.read_if('/')? {
                        return Ok(strip_block_text(&raw));
                    }
                    raw.push('*');
                }
                Some(c) => {
                    raw.push(c);
                    self.read()?;
                }
            }
        }
    }

    /// Consumes a number in the strict JSON grammar and parses it as an
    /// IEEE 754 double.
    pub fn read_number(&mut self) -> Result<f64> {
        self.start_capture();
        self.read_if('-')?;
        if !self.read_if('0')? {
            if !self.read_digit()? {
                self.invalidate_capture();
                return Err(self.expected("digit"));
            }
            self.read_all_digits()?;
        }
        if self.read_if('.')? {
            if !self.read_digit()? {
                self.invalidate_capture();
                return Err(self.expected("digit"));
            }
            self.read_all_digits()?;
        }
        if self.read_if('e')? || self.read_if('E')? {
            if !self.read_if('+')? {
                self.read_if('-')?;
            }
            if !self.read_digit()? {
                self.invalidate_capture();
                return Err(self.expected("digit"));
            }
            self.read_all_digits()?;
        }
        let capture = self.end_capture();
        capture
            .parse::<f64>()
            .map_err(|_| self.unexpected(format_args!("malformed number '{}'", capture)))
    }

    /// Consumes the literal `infinity`, if it begins at the current
    /// position. A partial match is a syntax error.
    pub fn read_infinity(&mut self) -> Result<bool> {
        if self.current != Some('i') {
            return Ok(false);
        }
        for c in "infinity".chars() {
            self.expect(c)?;
        }
        Ok(true)
    }

    /// Builds a syntax error describing unexpected content at the current
    /// position.
    pub fn unexpected(&self, what: impl Display) -> DjsonError {
        DjsonError::unexpected(what, self.line, self.column)
    }

    /// Builds a syntax error describing expected content at the current
    /// position.
    pub fn expected(&self, what: impl Display) -> DjsonError {
        DjsonError::expected(what, self.line, self.column)
    }
}

fn invalid_utf8() -> DjsonError {
    DjsonError::Io(io::Error::new(io::ErrorKind::InvalidData, "stream is not valid UTF-8"))
}

fn strip_indentation(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let mut lines: Vec<&str> = raw.split('\n').collect();
    if lines.len() > 1 && lines[0].trim().is_empty() {
        lines.remove(0);
    }
    if lines.len() > 1 && lines[lines.len() - 1].trim().is_empty() {
        lines.pop();
    }
    strip_common_prefix(&lines)
}

fn strip_block_text(raw: &str) -> String {
    if !raw.contains('\n') {
        return raw.trim().to_string();
    }
    let mut lines: Vec<&str> = raw.split('\n').collect();
    if lines.len() > 1 && lines[0].trim().is_empty() {
        lines.remove(0);
    }
    if lines.len() > 1 && lines[lines.len() - 1].trim().is_empty() {
        lines.pop();
    }
    let railed = lines.iter().all(|l| l.trim_start().starts_with('*') || l.trim().is_empty());
    if railed {
        return lines
            .iter()
            .map(|l| {
                let stripped = l.trim_start();
                let stripped = stripped.strip_prefix('*').unwrap_or(stripped);
                stripped.strip_prefix(' ').unwrap_or(stripped)
            })
            .collect::<Vec<_>>()
            .join("\n");
    }
    strip_common_prefix(&lines)
}

fn strip_common_prefix(lines: &[&str]) -> String {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            let ws = l.len() - l.trim_start().len();
            &l[ws.min(indent)..]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_index_line_and_column() {
        let mut reader = PositionReader::from_text("ab\ncd");
        assert_eq!(Some('a'), reader.current);
        assert_eq!((0, 1, 0), (reader.index, reader.line, reader.column));

        reader.read().unwrap();
        reader.read().unwrap();
        assert_eq!(Some('\n'), reader.current);
        assert_eq!((2, 1, 2), (reader.index, reader.line, reader.column));

        reader.read().unwrap();
        assert_eq!(Some('c'), reader.current);
        assert_eq!((3, 2, 0), (reader.index, reader.line, reader.column));
    }

    #[test]
    fn capture_records_consumed_slice() {
        let mut reader = PositionReader::from_text("hello world");
        reader.start_capture();
        for _ in 0..5 {
            reader.read().unwrap();
        }
        assert_eq!("hello", reader.end_capture());
    }

    #[test]
    fn capture_survives_buffer_rotation() {
        let text = "x".repeat(BUFFER_SIZE * 2 + 17);
        let mut reader = PositionReader::from_reader(io::Cursor::new(text.clone())).unwrap();
        reader.start_capture();
        while !reader.is_end_of_text() {
            reader.read().unwrap();
        }
        assert_eq!(text, reader.end_capture());
    }

    #[test]
    fn skip_whitespace_counts_lines() {
        let mut reader = PositionReader::from_text(" \t\n\r\n x");
        reader.skip_whitespace(true).unwrap();
        assert_eq!(2, reader.lines_skipped);
        assert_eq!(Some('x'), reader.current);
    }

    #[test]
    fn skip_line_whitespace_stops_at_newline() {
        let mut reader = PositionReader::from_text("  \t\nx");
        reader.skip_line_whitespace().unwrap();
        assert_eq!(Some('\n'), reader.current);
    }

    #[test]
    fn read_quoted_interprets_escapes() {
        let mut reader = PositionReader::from_text(r#""a\n\t\"\\é""#);
        assert_eq!("a\n\t\"\\\u{00e9}", reader.read_quoted('"').unwrap());
    }

    #[test]
    fn read_quoted_combines_surrogate_pairs() {
        let mut reader = PositionReader::from_text(r#""😀""#);
        assert_eq!("\u{1F600}", reader.read_quoted('"').unwrap());
    }

    #[test]
    fn read_quoted_fails_at_end_of_text() {
        let mut reader = PositionReader::from_text("'hello");
        assert!(reader.read_quoted('\'').is_err());
    }

    #[test]
    fn read_multi_strips_relative_indentation() {
        let mut reader = PositionReader::from_text("\n  0\n   1\n    2\n  '''");
        assert_eq!("0\n 1\n  2", reader.read_multi().unwrap());
    }

    #[test]
    fn read_multi_trims_single_trailing_newline() {
        let mut reader = PositionReader::from_text("test\n'''");
        assert_eq!("test", reader.read_multi().unwrap());
    }

    #[test]
    fn read_multi_tolerates_interior_quotes() {
        let mut reader = PositionReader::from_text("it's ''fine''\n'''");
        assert_eq!("it's ''fine''", reader.read_multi().unwrap());
    }

    #[test]
    fn read_block_comment_strips_star_rail() {
        let mut reader = PositionReader::from_text("\n * one\n * two\n */");
        assert_eq!("one\ntwo", reader.read_block_comment().unwrap());
    }

    #[test]
    fn read_block_comment_requires_terminator() {
        let mut reader = PositionReader::from_text("dangling");
        assert!(reader.read_block_comment().is_err());
    }

    #[test]
    fn read_number_accepts_json_grammar() {
        for (text, expected) in [
            ("0", 0.0),
            ("-12", -12.0),
            ("3.5", 3.5),
            ("1e3", 1000.0),
            ("1.25E-2", 0.0125),
        ] {
            let mut reader = PositionReader::from_text(text);
            assert_eq!(expected, reader.read_number().unwrap(), "{}", text);
        }
    }

    #[test]
    fn read_number_rejects_bare_sign() {
        let mut reader = PositionReader::from_text("-x");
        assert!(reader.read_number().is_err());
    }

    #[test]
    fn read_infinity_consumes_the_literal() {
        let mut reader = PositionReader::from_text("infinity!");
        assert!(reader.read_infinity().unwrap());
        assert_eq!(Some('!'), reader.current);
    }

    #[test]
    fn stream_reader_decodes_utf8_across_chunks() {
        let text = format!("{}é∂", "a".repeat(BUFFER_SIZE - 1));
        let mut reader = PositionReader::from_reader(io::Cursor::new(text.into_bytes())).unwrap();
        let mut decoded = String::new();
        while let Some(c) = reader.current {
            decoded.push(c);
            reader.read().unwrap();
        }
        assert!(decoded.ends_with("é∂"));
    }
}
