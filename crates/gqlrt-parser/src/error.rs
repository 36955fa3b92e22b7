use crate::Location;

/// A lexical or syntactical error, located where it was detected.
///
/// Parsing stops at the first one:
///
/// ```rust
/// use gqlrt_parser::{Location, Parser};
///
/// let err = Parser::new().parse_query("query { a: }").unwrap_err();
/// assert_eq!(err.message(), r#"unexpected "}", expecting Name"#);
/// assert_eq!(err.location(), Location::new(1, 12));
/// assert_eq!(err.to_string(), r#"syntax error: unexpected "}", expecting Name"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error: {message}")]
pub struct SyntaxError {
    pub(crate) message: String,
    pub(crate) location: Location,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }

    /// The error message, without the `syntax error:` prefix.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Location {
        self.location
    }
}
