use std::fmt;

use crate::stream::TokenStream;

/// The span of a token over the logical character sequence.
///
/// `start` and `end` are zero-based character indices forming a half-open
/// range. `line` is the one-based line of the first character, `last_line`
/// the one-based line of the final character, and `offset` the zero-based
/// column of the first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub last_line: usize,
    pub offset: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, last_line: usize, offset: usize) -> Self {
        Self { start, end, line, last_line, offset }
    }

    /// A span confined to a single line.
    pub fn on_line(start: usize, end: usize, line: usize, offset: usize) -> Self {
        Self::new(start, end, line, line, offset)
    }

    /// Whether `other` lies entirely within this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start
            && other.end <= self.end
            && self.line <= other.line
            && other.last_line <= self.last_line
    }
}

/// Discriminates every kind of token the tokenizer can produce.
///
/// The container types (`Open`, `Braces`, `Brackets`, `Parentheses`) are
/// only produced when containerizing; see [`TokenStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Word,
    Number,
    String,
    Comment,
    Symbol,
    Break,
    Open,
    Braces,
    Brackets,
    Parentheses,
}

impl TokenType {
    /// The container type produced by an opening symbol, if any.
    pub fn for_opener(symbol: char) -> Option<TokenType> {
        match symbol {
            '(' => Some(TokenType::Parentheses),
            '{' => Some(TokenType::Braces),
            '[' => Some(TokenType::Brackets),
            _ => None,
        }
    }

    /// The closing symbol terminating this container type, if any.
    pub fn closer(&self) -> Option<char> {
        match self {
            TokenType::Parentheses => Some(')'),
            TokenType::Braces => Some('}'),
            TokenType::Brackets => Some(']'),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            TokenType::Open | TokenType::Braces | TokenType::Brackets | TokenType::Parentheses
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Word => "WORD",
            TokenType::Number => "NUMBER",
            TokenType::String => "STRING",
            TokenType::Comment => "COMMENT",
            TokenType::Symbol => "SYMBOL",
            TokenType::Break => "BREAK",
            TokenType::Open => "OPEN",
            TokenType::Braces => "BRACES",
            TokenType::Brackets => "BRACKETS",
            TokenType::Parentheses => "PARENTHESES",
        };
        f.write_str(name)
    }
}

/// The formatting used when a string value was written.
///
/// Specifying a style on a value does not guarantee it will be reprinted in
/// that style; the DJS writer verifies that the style is legal for the text
/// before using it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringStyle {
    /// `'single quoted'`
    Single,
    /// `"double quoted"`
    Double,
    /// `'''indentation-stripped multiline'''`
    Multi,
    /// `` `backtick` `` (not produced by the DJS tokenizer; reserved)
    Backtick,
    /// Bare text in raw space, e.g. an unquoted key.
    Implicit,
    /// Style unknown or intentionally not preserved (e.g. strict JSON).
    None,
}

impl StringStyle {
    /// Selects a best-fit style for regular textual data.
    pub fn select_value(text: &str) -> StringStyle {
        for c in text.chars() {
            match c {
                '\n' => return StringStyle::Multi,
                '\'' => return StringStyle::Double,
                _ => {}
            }
        }
        StringStyle::Single
    }

    /// Selects a best-fit style for a key, preferring implicit when the
    /// text is a legal identifier (`[letter digit _ $]+`). A key with a
    /// leading digit would lex as a number, so it stays quoted.
    pub fn select_key(text: &str) -> StringStyle {
        if text.is_empty() || text.starts_with(|c: char| c.is_ascii_digit()) {
            return Self::select_value(text);
        }
        for c in text.chars() {
            if !c.is_alphanumeric() && c != '_' && c != '$' {
                return Self::select_value(text);
            }
        }
        StringStyle::Implicit
    }
}

/// The surface syntax of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentStyle {
    /// `// comment`
    Line,
    /// `# comment`
    Hash,
    /// `/* comment */`
    Block,
}

/// A single lexical unit of DJS text.
///
/// Payloads are parsed content: strings are unescaped, multiline strings
/// are indentation-stripped, and comments have their markers removed.
/// Number tokens additionally carry the exact source slice, which is
/// needed when the token may turn out to be an open-root key.
#[derive(Debug, Clone)]
pub enum Token {
    Word { span: Span, text: String },
    Number { span: Span, value: f64, source: Option<String> },
    Str { span: Span, style: StringStyle, parsed: String },
    Comment { span: Span, style: CommentStyle, parsed: String },
    Symbol { span: Span, symbol: char },
    Break { span: Span },
    Stream(TokenStream),
}

impl Token {
    /// The span of this token. For containers, the span reported expands
    /// as children are materialized.
    pub fn span(&self) -> Span {
        match self {
            Token::Word { span, .. }
            | Token::Number { span, .. }
            | Token::Str { span, .. }
            | Token::Comment { span, .. }
            | Token::Symbol { span, .. }
            | Token::Break { span } => *span,
            Token::Stream(stream) => stream.span(),
        }
    }

    pub fn start(&self) -> usize {
        self.span().start
    }

    pub fn end(&self) -> usize {
        self.span().end
    }

    pub fn line(&self) -> usize {
        self.span().line
    }

    pub fn last_line(&self) -> usize {
        self.span().last_line
    }

    pub fn offset(&self) -> usize {
        self.span().offset
    }

    pub fn token_type(&self) -> TokenType {
        match self {
            Token::Word { .. } => TokenType::Word,
            Token::Number { .. } => TokenType::Number,
            Token::Str { .. } => TokenType::String,
            Token::Comment { .. } => TokenType::Comment,
            Token::Symbol { .. } => TokenType::Symbol,
            Token::Break { .. } => TokenType::Break,
            Token::Stream(stream) => stream.container_type(),
        }
    }

    /// Whether this token is the given symbol character.
    pub fn is_symbol(&self, c: char) -> bool {
        matches!(self, Token::Symbol { symbol, .. } if *symbol == c)
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Token::Break { .. })
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Token::Comment { .. })
    }

    /// Whether this token carries textual content.
    pub fn has_text(&self) -> bool {
        matches!(
            self,
            Token::Word { .. } | Token::Str { .. } | Token::Comment { .. }
        ) || matches!(self, Token::Number { source: Some(_), .. })
    }

    /// The parsed textual content of this token, if it has any. Numbers
    /// yield their source-formatted slice when one was captured.
    pub fn parsed_text(&self) -> Option<&str> {
        match self {
            Token::Word { text, .. } => Some(text),
            Token::Str { parsed, .. } => Some(parsed),
            Token::Comment { parsed, .. } => Some(parsed),
            Token::Number { source, .. } => source.as_deref(),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&TokenStream> {
        match self {
            Token::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Word { span: a, text: ta }, Token::Word { span: b, text: tb }) => {
                a == b && ta == tb
            }
            (Token::Number { span: a, value: va, .. }, Token::Number { span: b, value: vb, .. }) => {
                a == b && va == vb
            }
            (
                Token::Str { span: a, style: sa, parsed: pa },
                Token::Str { span: b, style: sb, parsed: pb },
            ) => a == b && sa == sb && pa == pb,
            (
                Token::Comment { span: a, style: sa, parsed: pa },
                Token::Comment { span: b, style: sb, parsed: pb },
            ) => a == b && sa == sb && pa == pb,
            (Token::Symbol { span: a, symbol: sa }, Token::Symbol { span: b, symbol: sb }) => {
                a == b && sa == sb
            }
            (Token::Break { span: a }, Token::Break { span: b }) => a == b,
            (Token::Stream(a), Token::Stream(b)) => a == b,
            _ => false,
        }
    }
}
