use thiserror::Error;

/// Error type returned by all parsing and writing operations.
///
/// Exactly two things can go wrong while serializing a document: the
/// underlying source or sink can fail, or the text can be syntactically
/// invalid. Syntax errors always carry the one-based line and zero-based
/// column at which the violation was first detected.
///
/// # Example
///
/// ```rust
/// use djson::parse_djs;
///
/// match parse_djs("[1, 2,, 3]") {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, Error)]
pub enum DjsonError {
    /// The input violated the grammar of the format being read.
    #[error("{msg} at line {line}, column {column}")]
    Syntax {
        /// A description of the violation, e.g. `Expected ':'`.
        msg: String,
        /// One-based line of the offending position.
        line: usize,
        /// Zero-based column of the offending position.
        column: usize,
    },

    /// The underlying reader or writer failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DjsonError {
    /// Indicates that specific content was expected at this position.
    pub fn expected(what: impl std::fmt::Display, line: usize, column: usize) -> Self {
        Self::Syntax { msg: format!("Expected {}", what), line, column }
    }

    /// Indicates that the given content is not allowed at this position.
    pub fn unexpected(what: impl std::fmt::Display, line: usize, column: usize) -> Self {
        Self::Syntax { msg: format!("Unexpected {}", what), line, column }
    }

    /// Indicates that a token is not valid in the current format.
    pub fn illegal_token(text: impl std::fmt::Display, line: usize, column: usize) -> Self {
        Self::Syntax { msg: format!("Illegal token '{}'", text), line, column }
    }

    /// The line carried by a syntax error, if this is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { line, .. } => Some(*line),
            Self::Io(_) => None,
        }
    }

    /// The column carried by a syntax error, if this is one.
    pub fn column(&self) -> Option<usize> {
        match self {
            Self::Syntax { column, .. } => Some(*column),
            Self::Io(_) => None,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, DjsonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_carry_position() {
        let e = DjsonError::expected(':', 3, 14);
        assert_eq!("Expected : at line 3, column 14", e.to_string());
        assert_eq!(Some(3), e.line());
        assert_eq!(Some(14), e.column());
    }

    #[test]
    fn illegal_token_quotes_text() {
        let e = DjsonError::illegal_token("bananas", 1, 0);
        assert!(e.to_string().starts_with("Illegal token 'bananas'"));
    }
}
