use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::options::{JsonFormat, WriterOptions};
use crate::parser::{DjsParser, JsonParser};
use crate::value::JsonValue;
use crate::writer;

/// A procedure for parsing a complete document from text.
pub type ParseFn = Box<dyn Fn(&str) -> Result<JsonValue> + Send + Sync>;

/// A procedure for serializing a value into a sink.
pub type WriteFn = Box<dyn Fn(&mut dyn Write, &JsonValue, &WriterOptions) -> Result<()> + Send + Sync>;

/// Dispatches parsers and writers by file extension.
///
/// Extensions are lowercased and run through an alias map before lookup.
/// The built-ins cover `json` (strict) and `djs`, with `xjs` registered
/// as an alias of `djs`; unknown extensions fall back to DJS. Callers may
/// register additional formats:
///
/// ```rust
/// use djson::{FormatRegistry, JsonValue};
///
/// let mut registry = FormatRegistry::new();
/// registry.register_parser("conf", Box::new(|s| djson::parse_djs(s)));
/// registry.register_alias("cfg", "conf");
/// let value = registry.parse("cfg", "a: 1").unwrap();
/// assert!(value.is_object());
/// ```
pub struct FormatRegistry {
    parsers: HashMap<String, ParseFn>,
    writers: HashMap<String, WriteFn>,
    aliases: HashMap<String, String>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            parsers: HashMap::new(),
            writers: HashMap::new(),
            aliases: HashMap::new(),
        };
        registry.register_parser("json", Box::new(|s| JsonParser::new(s).parse()));
        registry.register_parser("djs", Box::new(|s| DjsParser::new(s).parse()));
        registry.register_writer(
            "json",
            Box::new(|w, v, o| writer::write_into(w, v, JsonFormat::JsonFormatted, o)),
        );
        registry.register_writer(
            "djs",
            Box::new(|w, v, o| writer::write_into(w, v, JsonFormat::DjsFormatted, o)),
        );
        registry.register_alias("xjs", "djs");
        registry
    }

    /// Adds or replaces the parser for a format. To reuse a parser for
    /// several extensions, prefer [`register_alias`](Self::register_alias).
    pub fn register_parser(&mut self, format: &str, parser: ParseFn) {
        self.parsers.insert(format.to_lowercase(), parser);
    }

    /// Adds or replaces the writer for a format.
    pub fn register_writer(&mut self, format: &str, writer: WriteFn) {
        self.writers.insert(format.to_lowercase(), writer);
    }

    /// Registers an alias for some other format, e.g. `yml` for `yaml`.
    pub fn register_alias(&mut self, alias: &str, format: &str) {
        self.aliases.insert(alias.to_lowercase(), format.to_lowercase());
    }

    /// Whether the extension resolves to a registered format.
    pub fn is_known_format(&self, extension: &str) -> bool {
        self.parsers.contains_key(&self.resolve(extension))
    }

    /// Parses a document, dispatching by extension. Unknown extensions
    /// default to DJS.
    pub fn parse(&self, extension: &str, source: &str) -> Result<JsonValue> {
        match self.parsers.get(&self.resolve(extension)) {
            Some(parser) => parser(source),
            None => DjsParser::new(source).parse(),
        }
    }

    /// Writes a value into a sink, dispatching by extension. Unknown
    /// extensions default to DJS.
    pub fn write(
        &self,
        extension: &str,
        sink: &mut dyn Write,
        value: &JsonValue,
        options: &WriterOptions,
    ) -> Result<()> {
        match self.writers.get(&self.resolve(extension)) {
            Some(writer) => writer(sink, value, options),
            None => writer::write_into(sink, value, JsonFormat::DjsFormatted, options),
        }
    }

    /// Serializes a value to text, dispatching by extension.
    pub fn stringify(
        &self,
        extension: &str,
        value: &JsonValue,
        options: &WriterOptions,
    ) -> Result<String> {
        let mut out = Vec::new();
        self.write(extension, &mut out, value, options)?;
        String::from_utf8(out).map_err(|_| {
            crate::error::DjsonError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "invalid output",
            ))
        })
    }

    /// Parses a file automatically based on its extension.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<JsonValue> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        self.parse(&file_extension(path), &source)
    }

    /// Writes a file automatically based on its extension.
    pub fn write_file(
        &self,
        path: impl AsRef<Path>,
        value: &JsonValue,
        options: &WriterOptions,
    ) -> Result<()> {
        let path = path.as_ref();
        let text = self.stringify(&file_extension(path), value, options)?;
        fs::write(path, text)?;
        Ok(())
    }

    fn resolve(&self, extension: &str) -> String {
        let lower = extension.to_lowercase();
        self.aliases.get(&lower).cloned().unwrap_or(lower)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The lowercased extension of a path, defaulting to `djs`.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "djs".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_json_strictly() {
        let registry = FormatRegistry::new();
        assert!(registry.parse("json", "{\"a\": 1}").is_ok());
        assert!(registry.parse("json", "{a: 1}").is_err());
    }

    #[test]
    fn xjs_aliases_djs() {
        let registry = FormatRegistry::new();
        let value = registry.parse("XJS", "a: 1").unwrap();
        assert!(value.is_object());
        assert!(registry.is_known_format("xjs"));
    }

    #[test]
    fn unknown_extensions_default_to_djs() {
        let registry = FormatRegistry::new();
        assert!(registry.parse("cfg", "k: 'v' // comment").is_ok());
        assert!(!registry.is_known_format("cfg"));
    }

    #[test]
    fn writes_by_extension() {
        let registry = FormatRegistry::new();
        let value = registry.parse("djs", "a: 1").unwrap();
        let json = registry.stringify("json", &value, &WriterOptions::default()).unwrap();
        assert!(json.contains("\"a\""));
        let djs = registry.stringify("djs", &value, &WriterOptions::default()).unwrap();
        assert!(djs.contains("a: 1"));
    }
}
