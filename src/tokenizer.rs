use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;

use crate::error::Result;
use crate::reader::PositionReader;
use crate::stream::TokenStream;
use crate::token::{CommentStyle, Span, StringStyle, Token, TokenType};

/// Streams DJS tokens out of a [`PositionReader`].
///
/// The tokenizer produces one scalar token per call. When configured as
/// containerized and driven through a [`TokenStream`], each `(`, `{`, or
/// `[` symbol it produces is wrapped into a nested stream sharing this
/// tokenizer.
///
/// Note: numbers with incomplete exponents (`1234e+`) are not split back
/// into multiple tokens and are instead returned as a single word. This
/// deviates from the rule that `-` and `+` always surface as symbol
/// tokens; the behavior is kept deliberately, since splitting would
/// require either arbitrary pushback or span surgery.
pub struct DjsTokenizer {
    reader: PositionReader,
    containerized: bool,
    start_index: usize,
    start_line: usize,
    start_column: usize,
}

impl DjsTokenizer {
    /// Begins parsing tokens from any reader.
    pub fn new(reader: PositionReader, containerized: bool) -> Self {
        Self { reader, containerized, start_index: 0, start_line: 1, start_column: 0 }
    }

    /// Begins parsing tokens from in-memory text.
    pub fn from_text(text: &str, containerized: bool) -> Self {
        Self::new(PositionReader::from_text(text), containerized)
    }

    /// Generates a lazily-evaluated, non-containerized stream of tokens
    /// over the given text.
    pub fn stream(text: &str) -> TokenStream {
        Self::from_text(text, false).into_stream()
    }

    /// Generates a lazily-evaluated stream which containerizes bracketed
    /// groups into nested streams on the fly.
    pub fn containerize(text: &str) -> TokenStream {
        Self::from_text(text, true).into_stream()
    }

    /// Generates a non-containerized stream over a byte source.
    pub fn stream_from_reader<R: Read + 'static>(source: R) -> Result<TokenStream> {
        Ok(Self::new(PositionReader::from_reader(source)?, false).into_stream())
    }

    /// Generates a containerized stream over a byte source.
    pub fn containerize_from_reader<R: Read + 'static>(source: R) -> Result<TokenStream> {
        Ok(Self::new(PositionReader::from_reader(source)?, true).into_stream())
    }

    /// Wraps this tokenizer in a root [`TokenStream`].
    pub fn into_stream(self) -> TokenStream {
        TokenStream::root(Rc::new(RefCell::new(self)), TokenType::Open)
    }

    pub(crate) fn is_containerized(&self) -> bool {
        self.containerized
    }

    pub(crate) fn position(&self) -> (usize, usize) {
        (self.reader.line, self.reader.column)
    }

    pub(crate) fn start_span(&self) -> Span {
        Span::new(
            self.reader.index,
            self.reader.index,
            self.reader.line,
            self.reader.line,
            self.reader.column,
        )
    }

    /// Releases the underlying reader. Idempotent.
    pub fn close(&mut self) {
        self.reader.close();
    }

    /// Reads the next scalar token, or `None` once the input is
    /// exhausted.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.reader.skip_line_whitespace()?;
        let c = match self.reader.current {
            Some(c) => c,
            None => return Ok(None),
        };
        self.start_reading();
        let token = match c {
            '-' | '+' | '.' | '0'..='9' => self.number()?,
            '/' | '#' => self.comment(c)?,
            '\'' | '"' => self.quote(c)?,
            '\n' => self.newline()?,
            _ => self.word()?,
        };
        Ok(Some(token))
    }

    fn start_reading(&mut self) {
        self.start_index = self.reader.index;
        self.start_line = self.reader.line;
        self.start_column = self.reader.column;
    }

    fn number(&mut self) -> Result<Token> {
        self.reader.start_capture();
        if self.reader.current == Some('0') {
            self.reader.read()?;
            if self.reader.is_digit() {
                // disallow octal format: the whole run reads as a word
                return self.word_run();
            }
            if self.reader.current == Some('.') {
                self.reader.read()?;
                if !self.reader.is_digit() {
                    let capture = self.reader.end_capture();
                    return Ok(self.new_number(0.0, capture));
                }
            } else {
                let capture = self.reader.end_capture();
                return Ok(self.new_number(0.0, capture));
            }
        } else if let Some(sign @ ('-' | '+' | '.')) = self.reader.current {
            self.reader.read()?;
            if !self.reader.is_digit() {
                if sign == '-' && self.reader.read_infinity()? {
                    let capture = self.reader.end_capture();
                    return Ok(self.new_word(capture));
                }
                self.reader.invalidate_capture();
                return Ok(self.new_symbol(sign));
            }
        }
        self.reader.read_all_digits()?;
        if self.reader.read_if('.')? {
            if !self.reader.is_digit() {
                let capture = self.reader.end_capture();
                return self.parse_number(capture);
            }
            self.reader.read_all_digits()?;
        }
        if self.reader.read_if('e')? || self.reader.read_if('E')? {
            if !self.reader.read_if('+')? {
                self.reader.read_if('-')?;
            }
            if !self.reader.read_digit()? {
                let capture = self.reader.end_capture();
                return Ok(self.new_word(capture));
            }
            self.reader.read_all_digits()?;
        }
        let capture = self.reader.end_capture();
        self.parse_number(capture)
    }

    fn word(&mut self) -> Result<Token> {
        if let Some(c) = self.reader.current {
            if !is_word_char(c) {
                self.reader.read()?;
                return Ok(self.new_symbol(c));
            }
        }
        self.reader.start_capture();
        self.word_run()
    }

    fn word_run(&mut self) -> Result<Token> {
        while matches!(self.reader.current, Some(c) if is_word_char(c)) {
            self.reader.read()?;
        }
        let capture = self.reader.end_capture();
        Ok(self.new_word(capture))
    }

    fn quote(&mut self, quote: char) -> Result<Token> {
        let parsed = self.reader.read_quoted(quote)?;
        if parsed.is_empty() && quote == '\'' && self.reader.read_if('\'')? {
            let multi = self.reader.read_multi()?;
            return Ok(self.new_string(multi, StringStyle::Multi));
        }
        let style = if quote == '\'' { StringStyle::Single } else { StringStyle::Double };
        Ok(self.new_string(parsed, style))
    }

    fn comment(&mut self, c: char) -> Result<Token> {
        if c == '#' {
            self.reader.read()?;
            let parsed = self.reader.read_hash_comment()?;
            return Ok(self.new_comment(parsed, CommentStyle::Hash));
        }
        self.reader.read()?;
        match self.reader.current {
            Some('/') => {
                self.reader.read()?;
                let parsed = self.reader.read_line_comment()?;
                Ok(self.new_comment(parsed, CommentStyle::Line))
            }
            Some('*') => {
                self.reader.read()?;
                let parsed = self.reader.read_block_comment()?;
                Ok(self.new_comment(parsed, CommentStyle::Block))
            }
            _ => Ok(self.new_symbol('/')),
        }
    }

    fn newline(&mut self) -> Result<Token> {
        self.reader.read()?;
        Ok(Token::Break { span: self.line_span() })
    }

    fn parse_number(&mut self, capture: String) -> Result<Token> {
        let value = match capture.parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                return Err(self.reader.unexpected(format_args!("malformed number '{}'", capture)))
            }
        };
        Ok(self.new_number(value, capture))
    }

    fn new_number(&self, value: f64, source: String) -> Token {
        Token::Number { span: self.line_span(), value, source: Some(source) }
    }

    fn new_word(&self, text: String) -> Token {
        Token::Word { span: self.line_span(), text }
    }

    fn new_symbol(&self, symbol: char) -> Token {
        Token::Symbol { span: self.line_span(), symbol }
    }

    fn new_string(&self, parsed: String, style: StringStyle) -> Token {
        Token::Str { span: self.multiline_span(), style, parsed }
    }

    fn new_comment(&self, parsed: String, style: CommentStyle) -> Token {
        Token::Comment { span: self.multiline_span(), style, parsed }
    }

    fn line_span(&self) -> Span {
        Span::on_line(self.start_index, self.reader.index, self.start_line, self.start_column)
    }

    fn multiline_span(&self) -> Span {
        Span::new(
            self.start_index,
            self.reader.index,
            self.start_line,
            self.reader.line,
            self.start_column,
        )
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
