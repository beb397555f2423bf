use std::fmt::Display;
use std::io::Read;

use crate::comments::{CommentData, CommentType};
use crate::error::{DjsonError, Result};
use crate::reader::PositionReader;
use crate::stream::{StreamCursor, TokenStream};
use crate::token::{CommentStyle, Token, TokenType};
use crate::tokenizer::DjsTokenizer;
use crate::value::{JsonArray, JsonObject, JsonValue, Metadata};

/// Parses strict JSON directly off a [`PositionReader`].
///
/// The grammar is unforgiving: `"`-quoted strings and keys only, no
/// comments, no trailing commas, and the literal words spelled exactly.
/// Blank-line structure is still captured into the formatting metadata so
/// a strict document can be re-emitted without losing its shape.
pub struct JsonParser {
    reader: PositionReader,
}

impl JsonParser {
    pub fn new(text: &str) -> Self {
        Self { reader: PositionReader::from_text(text) }
    }

    pub fn from_reader<R: Read + 'static>(source: R) -> Result<Self> {
        Ok(Self { reader: PositionReader::from_reader(source)? })
    }

    pub fn parse(&mut self) -> Result<JsonValue> {
        self.reader.skip_whitespace(true)?;
        let lines_above = self.reader.lines_skipped as i32;
        let mut result = self.read_value()?;
        result.set_lines_above(lines_above);
        self.reader.skip_whitespace(true)?;
        if !self.reader.is_end_of_text() {
            return Err(self.reader.unexpected("content after the document"));
        }
        Ok(result)
    }

    /// Releases the underlying reader.
    pub fn close(&mut self) {
        self.reader.close();
    }

    fn read_value(&mut self) -> Result<JsonValue> {
        match self.reader.current {
            Some('n') => self.read_keyword("null", JsonValue::null()),
            Some('t') => self.read_keyword("true", JsonValue::bool(true)),
            Some('f') => self.read_keyword("false", JsonValue::bool(false)),
            Some('"') => Ok(JsonValue::string(self.reader.read_quoted('"')?)),
            Some('[') => self.read_array(),
            Some('{') => self.read_object(),
            Some('-' | '0'..='9') => Ok(JsonValue::number(self.reader.read_number()?)),
            _ => Err(self.reader.expected("value")),
        }
    }

    fn read_keyword(&mut self, keyword: &str, value: JsonValue) -> Result<JsonValue> {
        for c in keyword.chars() {
            self.reader.expect(c)?;
        }
        Ok(value)
    }

    fn read_array(&mut self) -> Result<JsonValue> {
        self.reader.read()?;
        let mut array = JsonArray::new();
        self.reader.skip_whitespace(true)?;
        if self.reader.read_if(']')? {
            return Ok(array.into());
        }
        loop {
            self.reader.skip_whitespace(false)?;
            let lines_above = self.reader.lines_skipped as i32;
            let mut value = self.read_value()?;
            value.set_lines_above(lines_above);
            array.add(value);
            self.reader.skip_whitespace(true)?;
            if !self.reader.read_if(',')? {
                break;
            }
        }
        if !self.reader.read_if(']')? {
            return Err(self.reader.expected("',' or ']'"));
        }
        let mut value: JsonValue = array.into();
        value.set_lines_trailing(self.reader.lines_skipped as i32);
        Ok(value)
    }

    fn read_object(&mut self) -> Result<JsonValue> {
        self.reader.read()?;
        let mut object = JsonObject::new();
        self.reader.skip_whitespace(true)?;
        if self.reader.read_if('}')? {
            return Ok(object.into());
        }
        loop {
            self.reader.skip_whitespace(false)?;
            let lines_above = self.reader.lines_skipped as i32;
            let key = self.read_key()?;
            self.reader.skip_whitespace(true)?;
            self.reader.expect(':')?;
            self.reader.skip_whitespace(true)?;
            let lines_between = self.reader.lines_skipped as i32;
            let mut value = self.read_value()?;
            value.set_lines_above(lines_above).set_lines_between(lines_between);
            object.add(key, value);
            self.reader.skip_whitespace(true)?;
            if !self.reader.read_if(',')? {
                break;
            }
        }
        if !self.reader.read_if('}')? {
            return Err(self.reader.expected("',' or '}'"));
        }
        let mut value: JsonValue = object.into();
        value.set_lines_trailing(self.reader.lines_skipped as i32);
        Ok(value)
    }

    fn read_key(&mut self) -> Result<String> {
        if self.reader.current != Some('"') {
            return Err(self.reader.expected("key"));
        }
        self.reader.read_quoted('"')
    }
}

/// Parses DJS off a non-containerized [`TokenStream`], attaching
/// formatting metadata and comments to the values it produces.
///
/// A scratch [`Metadata`] accumulates blank-line counts and pending
/// comments for the value currently being read; on every value boundary
/// the scratch is transferred onto the finished value. One scratch frame
/// is stacked per open container.
pub struct DjsParser {
    root: TokenStream,
    cursor: StreamCursor,
    stack: Vec<Metadata>,
    scratch: Metadata,
    current: Option<Token>,
    lines_skipped: i32,
    comment_buffer: CommentData,
    newlines_after_comment: usize,
    end_position: (usize, usize),
}

impl DjsParser {
    pub fn new(text: &str) -> Self {
        Self::from_stream(DjsTokenizer::stream(text))
    }

    pub fn from_reader<R: Read + 'static>(source: R) -> Result<Self> {
        Ok(Self::from_stream(DjsTokenizer::stream_from_reader(source)?))
    }

    pub fn from_stream(root: TokenStream) -> Self {
        let cursor = root.cursor();
        Self {
            root,
            cursor,
            stack: Vec::new(),
            scratch: Metadata::default(),
            current: None,
            lines_skipped: 0,
            comment_buffer: CommentData::new(),
            newlines_after_comment: 0,
            end_position: (1, 0),
        }
    }

    /// Releases the stream and its tokenizer.
    pub fn close(&self) {
        self.root.close();
    }

    pub fn parse(&mut self) -> Result<JsonValue> {
        self.read()?;
        self.read_whitespace(true)?;
        if self.is_end_of_container() || self.is_open_root()? {
            self.read_open_root()
        } else {
            self.read_closed_root()
        }
    }

    fn is_open_root(&mut self) -> Result<bool> {
        let current = match &self.current {
            Some(t) => t,
            None => return Ok(false),
        };
        if current.token_type() == TokenType::Symbol {
            return Ok(false);
        }
        match self.peek_past_whitespace()? {
            Some(peek) => Ok(peek.is_symbol(':')),
            None => Ok(false),
        }
    }

    fn peek_past_whitespace(&mut self) -> Result<Option<Token>> {
        let mut amount = 1;
        loop {
            match self.cursor.peek(amount)? {
                None => return Ok(None),
                Some(t) if t.is_break() || t.is_comment() => amount += 1,
                Some(t) => return Ok(Some(t)),
            }
        }
    }

    fn read_open_root(&mut self) -> Result<JsonValue> {
        let mut object = JsonObject::new();
        let mut root_meta = Metadata::default();
        self.split_open_root_header(&mut root_meta);
        loop {
            self.read_whitespace(false)?;
            if self.is_end_of_container() {
                break;
            }
            self.read_next_member(&mut object)?;
        }
        // a member flush at the top of the file re-applies writer defaults
        if let Some(top) = object.first_mut() {
            if top.lines_above() == 0 {
                top.set_lines_above(-1);
            }
        }
        self.read_bottom()?;
        let mut meta = std::mem::take(&mut self.scratch);
        root_meta.apply_defaults(&mut meta);
        let mut value: JsonValue = object.into();
        value.meta = root_meta;
        Ok(value)
    }

    /// Decides how much of the comment block at the top of the file is
    /// the file header and how much belongs to the first member. A run of
    /// comments with no blank gap sits flush against the member and is
    /// its header; otherwise the header extends through the last gap of
    /// two or more blank lines, and everything after that gap attaches to
    /// the member.
    fn split_open_root_header(&mut self, root_meta: &mut Metadata) {
        root_meta.lines_above = self.take_lines_skipped();
        let buffer = self.take_comment_buffer();
        if buffer.is_empty() {
            return;
        }
        let has_gap =
            buffer.parts().iter().any(|p| matches!(p, crate::comments::CommentPart::Blank(_)));
        if !has_gap {
            self.comment_buffer = buffer;
            return;
        }
        let split_at = buffer
            .parts()
            .iter()
            .rposition(|p| matches!(p, crate::comments::CommentPart::Blank(n) if *n >= 2));
        let i = match split_at {
            None => {
                root_meta.comments.set_data(CommentType::Header, buffer);
                return;
            }
            Some(i) => i,
        };
        let mut header = CommentData::new();
        let mut member = CommentData::new();
        let mut separator = 0usize;
        for (index, part) in buffer.parts().iter().enumerate() {
            match part {
                crate::comments::CommentPart::Blank(n) => {
                    if index < i {
                        header.push_blank(*n);
                    } else if index == i {
                        separator = *n;
                    } else {
                        member.push_blank(*n);
                    }
                }
                crate::comments::CommentPart::Comment(c) => {
                    let target = if index < i { &mut header } else { &mut member };
                    target.push_comment(c.style, c.text.clone());
                }
            }
        }
        root_meta.comments.set_data(CommentType::Header, header);
        self.comment_buffer = member;
        self.lines_skipped = separator as i32;
    }

    fn read_closed_root(&mut self) -> Result<JsonValue> {
        self.read_above()?;
        let mut value = self.read_value()?;
        self.read_after()?;
        self.read_bottom()?;
        self.take_formatting(&mut value);
        Ok(value)
    }

    fn read_value(&mut self) -> Result<JsonValue> {
        if self.current_is_symbol('{') {
            return self.read_object();
        }
        if self.current_is_symbol('[') {
            return self.read_array();
        }
        let value = self.read_single()?;
        self.read()?;
        Ok(value)
    }

    fn read_single(&mut self) -> Result<JsonValue> {
        let t = match &self.current {
            Some(t) => t,
            None => return Err(self.end_of_container_in_value()),
        };
        match t {
            Token::Number { value, .. } => Ok(JsonValue::number(*value)),
            Token::Str { parsed, style, .. } => Ok(JsonValue::styled_string(parsed.clone(), *style)),
            Token::Word { text, .. } => match text.as_str() {
                "true" => Ok(JsonValue::bool(true)),
                "false" => Ok(JsonValue::bool(false)),
                "null" => Ok(JsonValue::null()),
                "infinity" => Ok(JsonValue::number(f64::INFINITY)),
                "-infinity" => Ok(JsonValue::number(f64::NEG_INFINITY)),
                "" => Err(self.expected_here("tokens")),
                _ => Err(self.illegal_token_here(text.clone())),
            },
            Token::Symbol { symbol: ',', .. } => Err(self.leading_delimiter()),
            Token::Symbol { symbol, .. } => Err(self.punctuation_in_value(*symbol)),
            other => Err(self.unexpected_here(other.token_type())),
        }
    }

    fn read_object(&mut self) -> Result<JsonValue> {
        let mut object = JsonObject::new();
        if !self.open('{', '}')? {
            return self.close_container(object.into(), '}');
        }
        loop {
            self.read_whitespace(false)?;
            if self.current_is_symbol('}') {
                return self.close_container(object.into(), '}');
            }
            if !self.read_next_member(&mut object)? {
                return self.close_container(object.into(), '}');
            }
        }
    }

    fn read_array(&mut self) -> Result<JsonValue> {
        let mut array = JsonArray::new();
        if !self.open('[', ']')? {
            return self.close_container(array.into(), ']');
        }
        loop {
            self.read_whitespace(false)?;
            if self.current_is_symbol(']') {
                return self.close_container(array.into(), ']');
            }
            if !self.read_next_element(&mut array)? {
                return self.close_container(array.into(), ']');
            }
        }
    }

    fn read_next_member(&mut self, object: &mut JsonObject) -> Result<bool> {
        self.set_above();
        let key = self.read_key()?;
        self.read_between()?;
        let mut value = self.read_value()?;
        let delimiter = self.read_delimiter()?;
        self.take_formatting(&mut value);
        object.add(key, value);
        Ok(delimiter)
    }

    fn read_next_element(&mut self, array: &mut JsonArray) -> Result<bool> {
        self.set_above();
        let mut value = self.read_value()?;
        let delimiter = self.read_delimiter()?;
        self.take_formatting(&mut value);
        array.add(value);
        Ok(delimiter)
    }

    fn read_key(&mut self) -> Result<String> {
        let t = match self.current.clone() {
            Some(t) => t,
            None => return Err(self.expected_here("key")),
        };
        if is_legal_key_type(&t) {
            if let Some(peek) = self.peek_past_whitespace()? {
                if is_legal_key_type(&peek) {
                    // hjson-style inputs make this worth a tailored error
                    return Err(self.whitespace_in_key());
                }
            }
            self.read()?;
            return Ok(key_text(&t));
        }
        if t.is_symbol(':') {
            return Err(self.empty_key());
        }
        if t.has_text() {
            return Err(self.illegal_token_here(t.parsed_text().unwrap_or_default().to_string()));
        }
        if let Token::Symbol { symbol, .. } = t {
            return Err(self.punctuation_in_key(symbol));
        }
        Err(self.illegal_token_here(t.token_type().to_string()))
    }

    fn read_between(&mut self) -> Result<()> {
        self.read_whitespace(true)?;
        self.expect_symbol(':')?;
        self.read_whitespace(true)?;
        self.set_between();
        Ok(())
    }

    fn read_delimiter(&mut self) -> Result<bool> {
        self.read_line_whitespace()?;
        self.set_comment(CommentType::Eol);
        if self.read_if_symbol(',')? {
            self.read_line_whitespace()?;
            self.set_comment(CommentType::Eol);
            self.read_nl()?;
            return Ok(true);
        }
        if self.read_nl()? {
            self.read_whitespace(false)?;
            self.read_if_symbol(',')?;
            return Ok(true);
        }
        Ok(false)
    }

    fn open(&mut self, opener: char, closer: char) -> Result<bool> {
        self.expect_symbol(opener)?;
        self.stack.push(std::mem::take(&mut self.scratch));
        self.read_whitespace(true)?;
        Ok(!self.current_is_symbol(closer) && self.current.is_some())
    }

    fn close_container(&mut self, mut value: JsonValue, closer: char) -> Result<JsonValue> {
        self.set_trailing();
        let buffer = self.take_comment_buffer();
        if !buffer.is_empty() {
            let position = if container_is_empty(&value) {
                CommentType::Interior
            } else {
                CommentType::Footer
            };
            self.scratch.comments.get_or_create(position).append(buffer);
        }
        self.take_formatting(&mut value);
        if !self.current_is_symbol(closer) {
            if self.current.is_none() {
                return Err(self.expected_here(format_args!("'{}'", closer)));
            }
            return Err(self.tokens_in_container());
        }
        if let Some(outer) = self.stack.pop() {
            self.scratch = outer;
        }
        self.read()?;
        Ok(value)
    }

    fn read_above(&mut self) -> Result<()> {
        self.read_whitespace(false)?;
        self.set_above();
        Ok(())
    }

    fn read_after(&mut self) -> Result<()> {
        self.read_line_whitespace()?;
        self.set_comment(CommentType::Eol);
        Ok(())
    }

    fn read_bottom(&mut self) -> Result<()> {
        self.read_whitespace(false)?;
        self.set_trailing();
        self.set_comment(CommentType::Footer);
        self.expect_end_of_text()
    }

    fn read(&mut self) -> Result<()> {
        if let Some(t) = &self.current {
            self.end_position = (t.last_line(), t.offset());
        }
        self.current = self.cursor.next()?;
        Ok(())
    }

    fn read_whitespace(&mut self, reset_lines_skipped: bool) -> Result<()> {
        if reset_lines_skipped {
            self.lines_skipped = 0;
        }
        loop {
            match self.current.clone() {
                Some(t) if t.is_break() => {
                    self.read()?;
                    self.flag_line_skipped();
                }
                Some(Token::Comment { style, parsed, .. }) => {
                    self.read()?;
                    self.append_comment(style, parsed);
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_line_whitespace(&mut self) -> Result<()> {
        while let Some(Token::Comment { style, parsed, .. }) = self.current.clone() {
            self.read()?;
            self.append_comment(style, parsed);
        }
        Ok(())
    }

    fn read_nl(&mut self) -> Result<bool> {
        if matches!(&self.current, Some(t) if t.is_break()) {
            self.read()?;
            self.flag_line_skipped();
            return Ok(true);
        }
        Ok(false)
    }

    fn flag_line_skipped(&mut self) {
        if self.comment_buffer.is_empty() && self.newlines_after_comment == 0 {
            self.lines_skipped += 1;
        } else {
            self.newlines_after_comment += 1;
        }
    }

    fn append_comment(&mut self, style: CommentStyle, text: String) {
        self.flush_comment_newlines();
        self.comment_buffer.push_comment(style, text);
    }

    fn flush_comment_newlines(&mut self) {
        // the first newline after a comment terminates its line; any
        // further newlines are blank lines within the data
        if self.newlines_after_comment > 1 {
            self.comment_buffer.push_blank(self.newlines_after_comment - 1);
        }
        self.newlines_after_comment = 0;
    }

    fn take_comment_buffer(&mut self) -> CommentData {
        self.flush_comment_newlines();
        std::mem::take(&mut self.comment_buffer)
    }

    fn take_lines_skipped(&mut self) -> i32 {
        let skipped = self.lines_skipped;
        self.lines_skipped = 0;
        skipped
    }

    fn set_above(&mut self) {
        self.set_comment(CommentType::Header);
        self.scratch.lines_above = self.take_lines_skipped();
    }

    fn set_between(&mut self) {
        self.set_comment(CommentType::Value);
        self.scratch.lines_between = self.take_lines_skipped();
    }

    fn set_trailing(&mut self) {
        self.scratch.lines_trailing = self.take_lines_skipped();
    }

    fn set_comment(&mut self, position: CommentType) {
        let data = self.take_comment_buffer();
        if !data.is_empty() {
            self.scratch.comments.get_or_create(position).append(data);
        }
    }

    fn take_formatting(&mut self, value: &mut JsonValue) {
        value.meta.apply_defaults(&mut self.scratch);
        self.scratch = Metadata::default();
    }

    fn is_end_of_container(&self) -> bool {
        self.current.is_none()
    }

    fn is_end_of_text(&self) -> bool {
        self.stack.is_empty() && self.current.is_none()
    }

    fn expect_end_of_text(&mut self) -> Result<()> {
        if !self.is_end_of_text() {
            let described = match &self.current {
                Some(t) => t.token_type().to_string(),
                None => "end of container".to_string(),
            };
            return Err(self.unexpected_here(format_args!("{} before end of file", described)));
        }
        Ok(())
    }

    fn current_is_symbol(&self, symbol: char) -> bool {
        matches!(&self.current, Some(t) if t.is_symbol(symbol))
    }

    fn read_if_symbol(&mut self, symbol: char) -> Result<bool> {
        if self.current_is_symbol(symbol) {
            self.read()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<()> {
        if !self.read_if_symbol(symbol)? {
            return Err(self.expected_here(format_args!("'{}'", symbol)));
        }
        Ok(())
    }

    fn position(&self) -> (usize, usize) {
        match &self.current {
            Some(t) => (t.line(), t.offset()),
            None => self.end_position,
        }
    }

    fn expected_here(&self, what: impl Display) -> DjsonError {
        let (line, column) = self.position();
        DjsonError::expected(what, line, column)
    }

    fn unexpected_here(&self, what: impl Display) -> DjsonError {
        let (line, column) = self.position();
        DjsonError::unexpected(what, line, column)
    }

    fn illegal_token_here(&self, text: impl Display) -> DjsonError {
        let (line, column) = self.position();
        DjsonError::illegal_token(text, line, column)
    }

    fn empty_key(&self) -> DjsonError {
        self.expected_here("key (for an empty key name use quotes)")
    }

    fn whitespace_in_key(&self) -> DjsonError {
        self.unexpected_here("whitespace in key (use quotes to include)")
    }

    fn punctuation_in_key(&self, c: char) -> DjsonError {
        self.unexpected_here(format_args!("punctuation ('{}') in key (use quotes to include)", c))
    }

    fn leading_delimiter(&self) -> DjsonError {
        self.unexpected_here("leading delimiter (use quotes to include): ','")
    }

    fn punctuation_in_value(&self, c: char) -> DjsonError {
        self.unexpected_here(format_args!("punctuation ('{}') in value (use quotes to include)", c))
    }

    fn end_of_container_in_value(&self) -> DjsonError {
        self.unexpected_here(
            "end of container when expecting a value (use empty double quotes for empty string)",
        )
    }

    fn tokens_in_container(&self) -> DjsonError {
        let described = match &self.current {
            Some(t) => t.token_type().to_string(),
            None => "end of input".to_string(),
        };
        self.unexpected_here(format_args!(
            "{} before end of container (missing delimiter?)",
            described
        ))
    }
}

fn is_legal_key_type(token: &Token) -> bool {
    matches!(
        token.token_type(),
        TokenType::String | TokenType::Word | TokenType::Number
    )
}

fn key_text(token: &Token) -> String {
    match token {
        Token::Number { value, source, .. } => {
            source.clone().unwrap_or_else(|| format!("{}", value))
        }
        other => other.parsed_text().unwrap_or_default().to_string(),
    }
}

fn container_is_empty(value: &JsonValue) -> bool {
    match (value.as_object(), value.as_array()) {
        (Some(o), _) => o.is_empty(),
        (_, Some(a)) => a.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_parser_reads_nested_values() {
        let mut parser = JsonParser::new(r#"{"a": [1, true, null], "b": "x"}"#);
        let value = parser.parse().unwrap();
        let expected: JsonValue = JsonObject::new()
            .with("a", JsonArray::new().with(1).with(true).with(JsonValue::null()))
            .with("b", "x")
            .into();
        assert!(value.matches(&expected));
    }

    #[test]
    fn json_parser_rejects_trailing_commas() {
        let err = JsonParser::new("[1,2,3,]").parse().unwrap_err();
        assert!(err.to_string().contains("Expected value"), "{}", err);
    }

    #[test]
    fn json_parser_rejects_unquoted_keys() {
        assert!(JsonParser::new("{a: 1}").parse().is_err());
    }

    #[test]
    fn json_parser_rejects_comments() {
        assert!(JsonParser::new("// nope\n{}").parse().is_err());
    }

    #[test]
    fn json_parser_rejects_infinity() {
        assert!(JsonParser::new("infinity").parse().is_err());
    }

    #[test]
    fn json_parser_records_blank_line_structure() {
        let value = JsonParser::new("{\n\n\"a\": 1,\n\"b\":\n\n2\n}").parse().unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(2, object.get("a").unwrap().lines_above());
        assert_eq!(1, object.get("b").unwrap().lines_above());
        assert_eq!(2, object.get("b").unwrap().lines_between());
        assert_eq!(1, value.lines_trailing());
    }

    #[test]
    fn djs_parser_reads_open_root() {
        let value = DjsParser::new("a:1,b:2").parse().unwrap();
        let expected: JsonValue = JsonObject::new().with("a", 1).with("b", 2).into();
        assert!(value.matches(&expected));
    }

    #[test]
    fn djs_parser_flags_flush_top_member_as_auto() {
        let value = DjsParser::new("a:1").parse().unwrap();
        assert_eq!(-1, value.as_object().unwrap().get("a").unwrap().lines_above());
    }

    #[test]
    fn empty_file_is_implicitly_an_object() {
        assert!(DjsParser::new("").parse().unwrap().is_object());
    }
}
