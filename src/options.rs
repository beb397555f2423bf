/// The output profile of a writer: whether the document is pretty-printed
/// and whether formatting metadata is honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFormat {
    /// Unformatted, regular JSON with no whitespace. No formatting
    /// metadata is preserved.
    Json,
    /// Pretty-printed regular JSON. Blank-line metadata is preserved;
    /// comments are not representable and are dropped.
    JsonFormatted,
    /// Unformatted DJS with minimal whitespace.
    Djs,
    /// Pretty-printed DJS preserving blank lines and comments.
    DjsFormatted,
}

impl JsonFormat {
    pub fn is_formatted(&self) -> bool {
        matches!(self, JsonFormat::JsonFormatted | JsonFormat::DjsFormatted)
    }

    pub fn is_djs(&self) -> bool {
        matches!(self, JsonFormat::Djs | JsonFormat::DjsFormatted)
    }
}

/// Configuration options shared by the JSON and DJS writers.
///
/// Use [`Default::default()`] to get sensible defaults, then modify
/// individual fields as needed.
///
/// # Example
///
/// ```rust
/// use djson::WriterOptions;
///
/// let mut options = WriterOptions::default();
/// options.indent = "    ".to_string();
/// options.max_spacing = 3;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WriterOptions {
    /// The indentation emitted per nesting level. Default: two spaces.
    pub indent: String,

    /// The newline sequence. Default: `"\n"`.
    pub eol: String,

    /// Minimum number of newlines between siblings when not condensed.
    /// Default: 0.
    pub min_spacing: i32,

    /// Cap applied to preserved blank-line counts. Default: 5.
    pub max_spacing: i32,

    /// Newlines applied where a value's `lines_above` is auto (`-1`).
    /// Default: 1.
    pub default_spacing: i32,

    /// Keep siblings whose `lines_above` is 0 on a single line,
    /// separated by `", "`. Default: true.
    pub allow_condense: bool,

    /// Write a non-empty root object without its outer braces. DJS only.
    /// Default: true.
    pub omit_root_braces: bool,

    /// Write identifier-shaped keys without quotes. DJS only.
    /// Default: true.
    pub omit_quotes: bool,

    /// Give container values an extra blank line when their spacing is
    /// auto, visually separating large blocks. Default: false.
    pub smart_spacing: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            eol: "\n".to_string(),
            min_spacing: 0,
            max_spacing: 5,
            default_spacing: 1,
            allow_condense: true,
            omit_root_braces: true,
            omit_quotes: true,
            smart_spacing: false,
        }
    }
}

impl WriterOptions {
    /// Creates options with recommended settings. Currently identical to
    /// [`Default::default()`], but may diverge without breaking
    /// compatibility.
    pub fn recommended() -> Self {
        Self::default()
    }
}
