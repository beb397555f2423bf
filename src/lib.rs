//! # djson
//!
//! A library for reading, representing, and writing JSON and DJS (a JSON
//! superset) with full-fidelity preservation of whitespace, blank lines,
//! and comments across a parse/rewrite cycle.
//!
//! Applications that modify a configuration file should not disturb the
//! author's formatting. djson parses a document into a DOM of values that
//! each carry their blank-line structure and attached comments, so the
//! document can be edited and re-emitted looking the way its author left
//! it.
//!
//! ## DJS at a glance
//!
//! DJS extends JSON with unquoted keys, single- and triple-quoted
//! strings, comments, soft delimiters, and an optional open root:
//!
//! ```text
//! // server configuration
//! host: 'localhost'
//! port: 8080
//!
//! # retry policy
//! retries: {
//!   max: 3, backoff: 1.5
//! }
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use djson::{parse_djs, stringify, JsonFormat, WriterOptions};
//!
//! let value = parse_djs("a: 1\nb: 2\n").unwrap();
//!
//! // re-emit as DJS, preserving the author's shape
//! let djs = stringify(&value, JsonFormat::DjsFormatted, &WriterOptions::default()).unwrap();
//! assert_eq!("a: 1\nb: 2\n", djs);
//!
//! // or convert to strict, pretty-printed JSON
//! let json = stringify(&value, JsonFormat::JsonFormatted, &WriterOptions::default()).unwrap();
//! assert_eq!("{\n  \"a\": 1,\n  \"b\": 2\n}", json);
//! ```
//!
//! ## Comments survive the round trip
//!
//! ```rust
//! use djson::{parse_djs, CommentType};
//!
//! let value = parse_djs("// the answer\nanswer: 42").unwrap();
//! let member = value.as_object().unwrap().get("answer").unwrap();
//! assert_eq!("the answer", member.comment_text(CommentType::Header));
//! ```
//!
//! ## Format dispatch by extension
//!
//! ```rust
//! use djson::FormatRegistry;
//!
//! let registry = FormatRegistry::new();
//! let value = registry.parse("json", r#"{"a": 1}"#).unwrap();
//! assert!(registry.parse("json", "{a: 1}").is_err()); // strict
//! assert!(registry.parse("djs", "{a: 1}").is_ok());
//! ```
//!
//! ## Serializing Rust types
//!
//! Any type implementing [`serde::Serialize`] converts into a DOM via
//! [`from_serialize`], after which it can be written in either format.
//!
//! ## Command-line tool
//!
//! The crate ships a `djson` binary that converts between JSON and DJS
//! from the terminal:
//!
//! ```sh
//! echo 'a: 1' | djson --to json
//! djson config.djs -o config.json
//! ```

mod comments;
mod convert;
mod error;
mod options;
mod parser;
mod reader;
mod registry;
mod stream;
mod token;
mod tokenizer;
mod value;
mod writer;

pub use crate::comments::{Comment, CommentData, CommentHolder, CommentPart, CommentType};
pub use crate::convert::{from_serde_value, from_serialize, to_serde_value};
pub use crate::error::{DjsonError, Result};
pub use crate::options::{JsonFormat, WriterOptions};
pub use crate::parser::{DjsParser, JsonParser};
pub use crate::reader::PositionReader;
pub use crate::registry::{file_extension, FormatRegistry, ParseFn, WriteFn};
pub use crate::stream::{Lookup, StreamCursor, TokenStream};
pub use crate::token::{CommentStyle, Span, StringStyle, Token, TokenType};
pub use crate::tokenizer::DjsTokenizer;
pub use crate::value::{JsonArray, JsonData, JsonObject, JsonReference, JsonValue, Metadata};
pub use crate::writer::{stringify, write_into, DjsWriter, JsonWriter};

/// Parses a strict JSON document.
pub fn parse_json(text: &str) -> Result<JsonValue> {
    JsonParser::new(text).parse()
}

/// Parses a DJS document.
pub fn parse_djs(text: &str) -> Result<JsonValue> {
    DjsParser::new(text).parse()
}
