use crate::Location;
use std::fmt;

/// A token produced by the [`Lexer`][crate::Lexer].
///
/// `data` holds the source text of the token, except for string tokens
/// where it holds the value with escape sequences already resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) data: String,
    pub(crate) location: Location,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, data: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            data: data.into(),
            location,
        }
    }

    /// Get a reference to the token's kind.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Get a reference to the token's data.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Where the token starts.
    pub fn location(&self) -> Location {
        self.location
    }

    pub(crate) fn is_name(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Name && self.data == keyword
    }
}

/// Describes the token the way syntax errors quote it.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("<EOF>"),
            TokenKind::StringValue | TokenKind::BlockStringValue => {
                write!(f, "{} {:?}", self.kind, self.data)
            }
            _ => write!(f, "{:?}", self.data),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Name,
    Int,
    Float,
    StringValue,
    BlockStringValue,

    Bang,     // !
    Dollar,   // $
    Amp,      // &
    Spread,   // ...
    LParen,   // (
    RParen,   // )
    Colon,    // :
    Eq,       // =
    At,       // @
    LBracket, // [
    RBracket, // ]
    LCurly,   // {
    Pipe,     // |
    RCurly,   // }
    Eof,
}

impl TokenKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Name => "Name",
            TokenKind::Int => "Int",
            TokenKind::Float => "Float",
            TokenKind::StringValue => "String",
            TokenKind::BlockStringValue => "BlockString",
            TokenKind::Bang => "!",
            TokenKind::Dollar => "$",
            TokenKind::Amp => "&",
            TokenKind::Spread => "...",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Colon => ":",
            TokenKind::Eq => "=",
            TokenKind::At => "@",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LCurly => "{",
            TokenKind::Pipe => "|",
            TokenKind::RCurly => "}",
            TokenKind::Eof => "<EOF>",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
