use std::io::Write;

use crate::comments::{CommentData, CommentPart, CommentType};
use crate::error::{DjsonError, Result};
use crate::options::{JsonFormat, WriterOptions};
use crate::token::{CommentStyle, StringStyle};
use crate::value::{JsonArray, JsonData, JsonObject, JsonValue};

/// Serializes a value in the requested format, returning the text.
pub fn stringify(value: &JsonValue, format: JsonFormat, options: &WriterOptions) -> Result<String> {
    let mut out = Vec::new();
    write_into(&mut out, value, format, options)?;
    String::from_utf8(out).map_err(|_| {
        DjsonError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, "invalid output"))
    })
}

/// Serializes a value in the requested format into any sink.
pub fn write_into<W: Write + ?Sized>(
    out: &mut W,
    value: &JsonValue,
    format: JsonFormat,
    options: &WriterOptions,
) -> Result<()> {
    match format {
        JsonFormat::Json => JsonWriter::new(out, options.clone(), false).write(value),
        JsonFormat::JsonFormatted => JsonWriter::new(out, options.clone(), true).write(value),
        JsonFormat::Djs => DjsWriter::new(out, options.clone(), false).write(value),
        JsonFormat::DjsFormatted => DjsWriter::new(out, options.clone(), true).write(value),
    }
}

/// The state and policy engine shared by both writers: spacing
/// resolution, indentation, and primitive emission.
struct BaseWriter<'a, W: Write + ?Sized> {
    out: &'a mut W,
    options: WriterOptions,
    format: bool,
}

impl<'a, W: Write + ?Sized> BaseWriter<'a, W> {
    fn new(out: &'a mut W, options: WriterOptions, format: bool) -> Self {
        Self { out, options, format }
    }

    fn put(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }

    fn put_char(&mut self, c: char) -> Result<()> {
        let mut buffer = [0u8; 4];
        self.out.write_all(c.encode_utf8(&mut buffer).as_bytes())?;
        Ok(())
    }

    fn newlines(&mut self, count: i32) -> Result<()> {
        for _ in 0..count.max(0) {
            let eol = self.options.eol.clone();
            self.put(&eol)?;
        }
        Ok(())
    }

    fn indent(&mut self, level: i32) -> Result<()> {
        for _ in 0..level.max(0) {
            let indent = self.options.indent.clone();
            self.put(&indent)?;
        }
        Ok(())
    }

    /// Resolves the number of newlines to emit above a value. Explicit
    /// counts are clamped to the configured window; auto (`-1`) falls
    /// back to the default spacing, with containers widened under smart
    /// spacing. A count of zero condenses the value onto the previous
    /// line when allowed.
    fn lines_above(&self, value: &JsonValue, is_first: bool, at_root: bool) -> i32 {
        if !self.format {
            return 0;
        }
        let declared = value.lines_above();
        if declared < 0 {
            if at_root {
                return 0;
            }
            if is_first {
                return 1;
            }
            let mut auto = self.options.default_spacing.max(1);
            if self.options.smart_spacing && value.is_container() {
                auto = auto.max(2);
            }
            return auto;
        }
        let capped = declared.min(self.options.max_spacing);
        if capped == 0 {
            if is_first || self.options.allow_condense {
                0
            } else {
                1
            }
        } else {
            capped.max(self.options.min_spacing)
        }
    }

    fn lines_between(&self, value: &JsonValue) -> i32 {
        if !self.format {
            return 0;
        }
        value.lines_between().max(0).min(self.options.max_spacing)
    }

    fn lines_trailing(&self, value: &JsonValue, is_empty: bool) -> i32 {
        if !self.format {
            return 0;
        }
        let declared = value.lines_trailing();
        if declared < 0 {
            return if is_empty { 0 } else { 1 };
        }
        declared.min(self.options.max_spacing)
    }

    fn condenses(&self, peek: &JsonValue) -> bool {
        self.options.allow_condense && self.lines_above(peek, false, false) == 0
    }

    fn put_number(&mut self, number: f64, djs: bool) -> Result<()> {
        if number.is_nan() {
            return self.put("null");
        }
        if number.is_infinite() {
            return if !djs {
                self.put("null")
            } else if number > 0.0 {
                self.put("infinity")
            } else {
                self.put("-infinity")
            };
        }
        if number == number.trunc() && number.abs() < 1.0e15 {
            let text = format!("{}", number as i64);
            return self.put(&text);
        }
        let text = format!("{}", number);
        self.put(&text)
    }

    fn put_quoted(&mut self, text: &str, quote: char) -> Result<()> {
        self.put_char(quote)?;
        for c in text.chars() {
            match c {
                '\\' => self.put("\\\\")?,
                '\n' => self.put("\\n")?,
                '\r' => self.put("\\r")?,
                '\t' => self.put("\\t")?,
                '\u{0008}' => self.put("\\b")?,
                '\u{000C}' => self.put("\\f")?,
                c if c == quote => {
                    self.put_char('\\')?;
                    self.put_char(c)?;
                }
                c if (c as u32) < 0x20 => {
                    let escape = format!("\\u{:04x}", c as u32);
                    self.put(&escape)?;
                }
                c => self.put_char(c)?,
            }
        }
        self.put_char(quote)
    }
}

/// Writes strict JSON: always `"…"` strings, always braces and commas.
/// Comments are dropped; blank-line metadata is honored in formatted
/// mode. Non-finite numbers print as `null`.
pub struct JsonWriter<'a, W: Write + ?Sized> {
    base: BaseWriter<'a, W>,
}

impl<'a, W: Write + ?Sized> JsonWriter<'a, W> {
    pub fn new(out: &'a mut W, options: WriterOptions, format: bool) -> Self {
        Self { base: BaseWriter::new(out, options, format) }
    }

    pub fn write(&mut self, value: &JsonValue) -> Result<()> {
        let above = self.base.lines_above(value, true, true);
        self.base.newlines(above)?;
        self.write_value(value, 0)?;
        if self.base.format && !value.is_container() {
            let declared = value.lines_trailing();
            if declared > 0 {
                self.base.newlines(declared.min(self.base.options.max_spacing))?;
            }
        }
        Ok(())
    }

    fn write_value(&mut self, value: &JsonValue, level: i32) -> Result<()> {
        match value.data() {
            JsonData::Null => self.base.put("null"),
            JsonData::Bool(true) => self.base.put("true"),
            JsonData::Bool(false) => self.base.put("false"),
            JsonData::Number(n) => self.base.put_number(*n, false),
            JsonData::String { value: text, .. } => self.base.put_quoted(text, '"'),
            JsonData::Array(array) => self.write_array(value, array, level),
            JsonData::Object(object) => self.write_object(value, object, level),
        }
    }

    fn write_object(&mut self, value: &JsonValue, object: &JsonObject, level: i32) -> Result<()> {
        self.base.put("{")?;
        let members = object.members();
        for (i, (key, member)) in members.iter().enumerate() {
            self.write_above(member, i == 0, level + 1)?;
            self.base.put_quoted(key, '"')?;
            self.base.put(":")?;
            self.write_between(member, level + 1)?;
            self.write_value(member, level + 1)?;
            self.delimit(members.get(i + 1).map(|(_, v)| v))?;
        }
        self.write_close(value, object.is_empty(), level)?;
        self.base.put("}")
    }

    fn write_array(&mut self, value: &JsonValue, array: &JsonArray, level: i32) -> Result<()> {
        self.base.put("[")?;
        let elements = array.elements();
        for (i, element) in elements.iter().enumerate() {
            self.write_above(element, i == 0, level + 1)?;
            self.write_value(element, level + 1)?;
            self.delimit(elements.get(i + 1))?;
        }
        self.write_close(value, array.is_empty(), level)?;
        self.base.put("]")
    }

    fn write_above(&mut self, value: &JsonValue, is_first: bool, level: i32) -> Result<()> {
        let lines = self.base.lines_above(value, is_first, false);
        if lines > 0 {
            self.base.newlines(lines)?;
            self.base.indent(level)?;
        }
        Ok(())
    }

    fn write_between(&mut self, value: &JsonValue, member_level: i32) -> Result<()> {
        if !self.base.format {
            return Ok(());
        }
        let lines = self.base.lines_between(value);
        if lines == 0 {
            return self.base.put(" ");
        }
        self.base.newlines(lines)?;
        self.base.indent(member_level + 1)
    }

    fn delimit(&mut self, peek: Option<&JsonValue>) -> Result<()> {
        if let Some(peek) = peek {
            self.base.put(",")?;
            if self.base.format && self.base.condenses(peek) {
                self.base.put(" ")?;
            }
        }
        Ok(())
    }

    fn write_close(&mut self, value: &JsonValue, is_empty: bool, level: i32) -> Result<()> {
        let lines = self.base.lines_trailing(value, is_empty);
        if lines > 0 {
            self.base.newlines(lines)?;
            self.base.indent(level)?;
        }
        Ok(())
    }
}

/// Writes DJS, honoring the preserved formatting metadata: blank lines,
/// comments at every attachment point, string styles, and optionally an
/// open root.
pub struct DjsWriter<'a, W: Write + ?Sized> {
    base: BaseWriter<'a, W>,
}

impl<'a, W: Write + ?Sized> DjsWriter<'a, W> {
    pub fn new(out: &'a mut W, options: WriterOptions, format: bool) -> Self {
        Self { base: BaseWriter::new(out, options, format) }
    }

    pub fn write(&mut self, value: &JsonValue) -> Result<()> {
        let open_root = self.base.options.omit_root_braces
            && value.as_object().is_some_and(|o| !o.is_empty());
        if open_root {
            self.write_open_root(value)
        } else {
            self.write_closed_root(value)
        }
    }

    fn write_open_root(&mut self, value: &JsonValue) -> Result<()> {
        let object = match value.as_object() {
            Some(o) => o,
            None => return self.write_closed_root(value),
        };
        self.write_root_above(value)?;
        let members = object.members();
        for (i, (key, member)) in members.iter().enumerate() {
            self.write_next_member(key, member, i == 0, i == 0, members.get(i + 1), -1)?;
        }
        self.write_footer(value, true)
    }

    fn write_closed_root(&mut self, value: &JsonValue) -> Result<()> {
        self.write_root_above(value)?;
        self.write_value(value, 0, true)?;
        self.write_after(value)?;
        self.write_footer(value, !value.is_container())
    }

    fn write_root_above(&mut self, value: &JsonValue) -> Result<()> {
        let lines = self.base.lines_above(value, true, true);
        self.base.newlines(lines)?;
        if self.base.format {
            if let Some(header) = value.comments().get(CommentType::Header) {
                self.write_comment_block(&header.clone(), 0)?;
            }
        }
        Ok(())
    }

    fn write_value(&mut self, value: &JsonValue, level: i32, is_root: bool) -> Result<()> {
        match value.data() {
            JsonData::Null => self.base.put("null"),
            JsonData::Bool(true) => self.base.put("true"),
            JsonData::Bool(false) => self.base.put("false"),
            JsonData::Number(n) => self.base.put_number(*n, true),
            JsonData::String { value: text, style } => {
                self.write_string(text, *style, level)
            }
            JsonData::Array(array) => self.write_array(value, array, level, is_root),
            JsonData::Object(object) => self.write_object(value, object, level, is_root),
        }
    }

    fn write_object(
        &mut self,
        value: &JsonValue,
        object: &JsonObject,
        level: i32,
        is_root: bool,
    ) -> Result<()> {
        self.base.put("{")?;
        let members = object.members();
        for (i, (key, member)) in members.iter().enumerate() {
            self.write_next_member(key, member, i == 0, false, members.get(i + 1), level)?;
        }
        self.write_container_close(value, object.is_empty(), level, is_root)?;
        self.base.put("}")
    }

    fn write_array(
        &mut self,
        value: &JsonValue,
        array: &JsonArray,
        level: i32,
        is_root: bool,
    ) -> Result<()> {
        self.base.put("[")?;
        let elements = array.elements();
        for (i, element) in elements.iter().enumerate() {
            self.write_above(element, i == 0, false, level + 1)?;
            self.write_value(element, level + 1, false)?;
            self.delimit(elements.get(i + 1))?;
            self.write_after(element)?;
        }
        self.write_container_close(value, array.is_empty(), level, is_root)?;
        self.base.put("]")
    }

    fn write_next_member(
        &mut self,
        key: &str,
        value: &JsonValue,
        is_first: bool,
        at_top: bool,
        peek: Option<&(String, JsonValue)>,
        level: i32,
    ) -> Result<()> {
        self.write_above(value, is_first, at_top, level + 1)?;
        self.write_key(key)?;
        self.base.put(":")?;
        self.write_between(value, level + 1)?;
        self.write_value(value, level + 1, false)?;
        self.delimit(peek.map(|(_, v)| v))?;
        self.write_after(value)
    }

    fn write_above(
        &mut self,
        value: &JsonValue,
        is_first: bool,
        at_top: bool,
        level: i32,
    ) -> Result<()> {
        let lines = self.base.lines_above(value, is_first, at_top);
        self.base.newlines(lines)?;
        let header = if self.base.format {
            value.comments().get(CommentType::Header).cloned()
        } else {
            None
        };
        match header {
            Some(header) if !header.is_empty() => {
                self.write_comment_block(&header, level)?;
                self.base.indent(level)
            }
            _ if lines > 0 => self.base.indent(level),
            _ => Ok(()),
        }
    }

    fn write_between(&mut self, value: &JsonValue, member_level: i32) -> Result<()> {
        if !self.base.format {
            return Ok(());
        }
        let lines = self.base.lines_between(value);
        let comments = value.comments().get(CommentType::Value).cloned();
        match comments {
            Some(data) if !data.is_empty() => {
                if lines == 0 {
                    self.base.put(" ")?;
                    self.write_comment_inline(&data)?;
                    self.base.put(" ")
                } else {
                    self.base.newlines(lines)?;
                    self.write_comment_block(&data, member_level + 1)?;
                    self.base.indent(member_level + 1)
                }
            }
            _ => {
                if lines == 0 {
                    self.base.put(" ")
                } else {
                    self.base.newlines(lines)?;
                    self.base.indent(member_level + 1)
                }
            }
        }
    }

    fn delimit(&mut self, peek: Option<&JsonValue>) -> Result<()> {
        if let Some(peek) = peek {
            if !self.base.format {
                self.base.put(",")?;
            } else if self.base.condenses(peek) {
                self.base.put(", ")?;
            }
        }
        Ok(())
    }

    fn write_after(&mut self, value: &JsonValue) -> Result<()> {
        if !self.base.format {
            return Ok(());
        }
        if let Some(data) = value.comments().get(CommentType::Eol).cloned() {
            for part in data.parts() {
                if let CommentPart::Comment(comment) = part {
                    self.base.put(" ")?;
                    self.write_comment_text(comment.style, &comment.text, 0)?;
                }
            }
        }
        Ok(())
    }

    fn write_container_close(
        &mut self,
        value: &JsonValue,
        is_empty: bool,
        level: i32,
        is_root: bool,
    ) -> Result<()> {
        let position = if is_empty { CommentType::Interior } else { CommentType::Footer };
        let comments = if self.base.format && !(is_root && position == CommentType::Footer) {
            value.comments().get(position).cloned().filter(|d| !d.is_empty())
        } else {
            None
        };
        match comments {
            Some(data) => {
                let lines = self.base.lines_trailing(value, is_empty).max(1);
                self.base.newlines(lines)?;
                self.write_comment_block(&data, level + 1)?;
                self.base.indent(level)
            }
            None => {
                let lines = self.base.lines_trailing(value, is_empty);
                if lines > 0 {
                    self.base.newlines(lines)?;
                    self.base.indent(level)?;
                }
                Ok(())
            }
        }
    }

    fn write_footer(&mut self, value: &JsonValue, use_trailing: bool) -> Result<()> {
        if !self.base.format {
            return Ok(());
        }
        let footer = value.comments().get(CommentType::Footer).cloned().filter(|d| !d.is_empty());
        if use_trailing {
            let declared = value.lines_trailing();
            if declared > 0 {
                self.base.newlines(declared.min(self.base.options.max_spacing))?;
            } else if footer.is_some() {
                self.base.newlines(1)?;
            }
        } else if footer.is_some() {
            self.base.newlines(1)?;
        }
        if let Some(footer) = footer {
            self.write_comment_block(&footer, 0)?;
        }
        Ok(())
    }

    fn write_key(&mut self, key: &str) -> Result<()> {
        let style = if self.base.options.omit_quotes {
            StringStyle::select_key(key)
        } else {
            StringStyle::select_value(key)
        };
        match style {
            StringStyle::Implicit => self.base.put(key),
            StringStyle::Double | StringStyle::Multi => self.base.put_quoted(key, '"'),
            _ => self.base.put_quoted(key, '\''),
        }
    }

    fn write_string(&mut self, text: &str, stored: StringStyle, level: i32) -> Result<()> {
        match select_writable_style(stored, text) {
            StringStyle::Double => self.base.put_quoted(text, '"'),
            StringStyle::Multi => self.write_multi(text, level),
            _ => self.base.put_quoted(text, '\''),
        }
    }

    fn write_multi(&mut self, text: &str, level: i32) -> Result<()> {
        if !text.contains('\n') {
            self.base.put("'''")?;
            self.base.put(text)?;
            return self.base.put("'''");
        }
        self.base.put("'''")?;
        let continuation = if self.base.format { level + 1 } else { 0 };
        for line in text.split('\n') {
            let eol = self.base.options.eol.clone();
            self.base.put(&eol)?;
            if !line.is_empty() {
                self.base.indent(continuation)?;
                self.base.put(line)?;
            }
        }
        let eol = self.base.options.eol.clone();
        self.base.put(&eol)?;
        self.base.indent(continuation)?;
        self.base.put("'''")
    }

    fn write_comment_block(&mut self, data: &CommentData, level: i32) -> Result<()> {
        for part in data.parts() {
            match part {
                CommentPart::Blank(n) => self.base.newlines(*n as i32)?,
                CommentPart::Comment(comment) => {
                    self.base.indent(level)?;
                    self.write_comment_text(comment.style, &comment.text, level)?;
                    let eol = self.base.options.eol.clone();
                    self.base.put(&eol)?;
                }
            }
        }
        Ok(())
    }

    fn write_comment_inline(&mut self, data: &CommentData) -> Result<()> {
        let mut first = true;
        for part in data.parts() {
            if let CommentPart::Comment(comment) = part {
                if !first {
                    self.base.put(" ")?;
                }
                self.write_comment_text(comment.style, &comment.text, 0)?;
                first = false;
            }
        }
        Ok(())
    }

    fn write_comment_text(&mut self, style: CommentStyle, text: &str, level: i32) -> Result<()> {
        match style {
            CommentStyle::Line => self.write_marked_lines("//", text, level),
            CommentStyle::Hash => self.write_marked_lines("#", text, level),
            CommentStyle::Block => {
                if text.contains('\n') {
                    self.base.put("/*")?;
                    for line in text.split('\n') {
                        let eol = self.base.options.eol.clone();
                        self.base.put(&eol)?;
                        if !line.is_empty() {
                            self.base.indent(level)?;
                            self.base.put(line)?;
                        }
                    }
                    let eol = self.base.options.eol.clone();
                    self.base.put(&eol)?;
                    self.base.indent(level)?;
                    self.base.put("*/")
                } else if text.is_empty() {
                    self.base.put("/* */")
                } else {
                    self.base.put("/* ")?;
                    self.base.put(text)?;
                    self.base.put(" */")
                }
            }
        }
    }

    fn write_marked_lines(&mut self, marker: &str, text: &str, level: i32) -> Result<()> {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                let eol = self.base.options.eol.clone();
                self.base.put(&eol)?;
                self.base.indent(level)?;
            }
            self.base.put(marker)?;
            if !line.is_empty() {
                self.base.put(" ")?;
                self.base.put(line)?;
            }
        }
        Ok(())
    }
}

fn select_writable_style(stored: StringStyle, text: &str) -> StringStyle {
    let legal = match stored {
        StringStyle::Double | StringStyle::Single => true,
        StringStyle::Multi => multi_is_stable(text),
        _ => false,
    };
    if legal {
        return stored;
    }
    match StringStyle::select_value(text) {
        StringStyle::Multi if !multi_is_stable(text) => {
            if text.contains('\'') {
                StringStyle::Double
            } else {
                StringStyle::Single
            }
        }
        style => style,
    }
}

/// Whether the text survives the indentation strip applied when a
/// triple-quoted string is re-read: no common leading whitespace across
/// its lines and no whitespace-only lines.
fn multi_is_stable(text: &str) -> bool {
    let mut min = usize::MAX;
    for line in text.split('\n') {
        if line.is_empty() {
            continue;
        }
        if line.trim().is_empty() {
            return false;
        }
        min = min.min(line.len() - line.trim_start().len());
    }
    min == 0 || min == usize::MAX
}
