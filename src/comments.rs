use std::collections::HashMap;

use crate::token::CommentStyle;

/// The attachment point of a comment relative to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentType {
    /// Above the value (or at the top of the file, for the root).
    Header,
    /// On the same line, after the value.
    Eol,
    /// Between a key and its value.
    Value,
    /// Alone inside an otherwise empty container.
    Interior,
    /// Between the last child and the closing delimiter, or at the end of
    /// the file, for the root.
    Footer,
}

impl CommentType {
    pub const ALL: [CommentType; 5] = [
        CommentType::Header,
        CommentType::Eol,
        CommentType::Value,
        CommentType::Interior,
        CommentType::Footer,
    ];
}

/// A single comment with its surface style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub style: CommentStyle,
    pub text: String,
}

impl Comment {
    pub fn new(style: CommentStyle, text: impl Into<String>) -> Self {
        Self { style, text: text.into() }
    }
}

/// One element of comment data: either a comment or a run of blank lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentPart {
    Comment(Comment),
    /// A run of `n >= 1` blank lines between or after comments.
    Blank(usize),
}

/// The ordered comments at a single attachment point, interleaved with
/// blank-line runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentData {
    parts: Vec<CommentPart>,
}

impl CommentData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn parts(&self) -> &[CommentPart] {
        &self.parts
    }

    /// Appends a comment after the existing content.
    pub fn push_comment(&mut self, style: CommentStyle, text: impl Into<String>) {
        self.parts.push(CommentPart::Comment(Comment::new(style, text)));
    }

    /// Appends blank lines, coalescing with a trailing blank run.
    pub fn push_blank(&mut self, lines: usize) {
        if lines == 0 {
            return;
        }
        if let Some(CommentPart::Blank(n)) = self.parts.last_mut() {
            *n += lines;
            return;
        }
        self.parts.push(CommentPart::Blank(lines));
    }

    /// Prepends a comment before the existing content.
    pub fn prepend_comment(&mut self, style: CommentStyle, text: impl Into<String>) {
        self.parts.insert(0, CommentPart::Comment(Comment::new(style, text)));
    }

    /// Appends all parts of another data block.
    pub fn append(&mut self, other: CommentData) {
        for part in other.parts {
            match part {
                CommentPart::Blank(n) => self.push_blank(n),
                part => self.parts.push(part),
            }
        }
    }

    /// Forces the number of blank lines trailing the final comment.
    pub fn set_lines_after(&mut self, lines: usize) {
        if let Some(CommentPart::Blank(_)) = self.parts.last() {
            self.parts.pop();
        }
        self.push_blank(lines);
    }

    /// The number of blank lines trailing the final comment.
    pub fn lines_after(&self) -> usize {
        match self.parts.last() {
            Some(CommentPart::Blank(n)) => *n,
            _ => 0,
        }
    }

    /// Renders the messages of this data block: adjacent comments are
    /// separated by one newline, an interior run of `n` blank lines by
    /// `n + 1`, and a trailing run contributes `n` newlines.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let mut first = true;
        let mut blanks = 0usize;
        for part in &self.parts {
            match part {
                CommentPart::Blank(n) => blanks += n,
                CommentPart::Comment(comment) => {
                    if !first {
                        for _ in 0..=blanks {
                            out.push('\n');
                        }
                    }
                    blanks = 0;
                    out.push_str(&comment.text);
                    first = false;
                }
            }
        }
        for _ in 0..blanks {
            out.push('\n');
        }
        out
    }
}

/// Houses the comments paired with a single JSON value, keyed by their
/// attachment point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommentHolder {
    map: HashMap<CommentType, CommentData>,
}

impl CommentHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any comment is present at any position.
    pub fn has_any(&self) -> bool {
        self.map.values().any(|data| !data.is_empty())
    }

    pub fn has(&self, position: CommentType) -> bool {
        self.map.get(&position).is_some_and(|data| !data.is_empty())
    }

    pub fn get(&self, position: CommentType) -> Option<&CommentData> {
        self.map.get(&position)
    }

    pub fn get_or_create(&mut self, position: CommentType) -> &mut CommentData {
        self.map.entry(position).or_default()
    }

    /// The rendered message at the given position, or `""`.
    pub fn text(&self, position: CommentType) -> String {
        self.map.get(&position).map(CommentData::to_text).unwrap_or_default()
    }

    /// Replaces the data at a position with a single comment.
    pub fn set(&mut self, position: CommentType, style: CommentStyle, text: impl Into<String>) {
        let mut data = CommentData::new();
        data.push_comment(style, text);
        self.set_data(position, data);
    }

    /// Appends a comment after the existing content at a position.
    pub fn append(&mut self, position: CommentType, style: CommentStyle, text: impl Into<String>) {
        self.get_or_create(position).push_comment(style, text);
    }

    /// Appends the data of every position in another holder.
    pub fn append_all(&mut self, other: CommentHolder) {
        for (position, data) in other.map {
            self.get_or_create(position).append(data);
        }
    }

    pub fn set_data(&mut self, position: CommentType, data: CommentData) {
        self.map.insert(position, data);
    }

    /// Removes and returns the data at a position.
    pub fn take(&mut self, position: CommentType) -> Option<CommentData> {
        self.map.remove(&position)
    }

    pub fn set_lines_after(&mut self, position: CommentType, lines: usize) {
        self.get_or_create(position).set_lines_after(lines);
    }

    pub fn is_empty(&self) -> bool {
        !self.has_any()
    }
}
