pub(crate) mod grammar;

use crate::ast;
use crate::Lexer;
use crate::LimitTracker;
use crate::Location;
use crate::Name;
use crate::SyntaxError;
use crate::Token;
use crate::TokenKind;

/// Configuration for parsing an input string as GraphQL syntax.
///
/// The parser is strict: it stops at the first lexical or syntactical error
/// and returns it with its location.
///
/// ```rust
/// use gqlrt_parser::Parser;
///
/// let schema = Parser::new()
///     .parse_schema("type Query { hero: Character } interface Character { name: String }")
///     .unwrap();
/// assert_eq!(schema.definitions.len(), 2);
///
/// let query = Parser::new().parse_query("query Hero { hero { name } }").unwrap();
/// assert_eq!(query.operations[0].name.as_deref(), Some("Hero"));
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    recursion_limit: usize,
}

/// Default maximum nesting of selection sets, list and object values, and list types.
const DEFAULT_RECURSION_LIMIT: usize = 500;

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Configure the recursion limit to use while parsing.
    pub fn recursion_limit(mut self, value: usize) -> Self {
        self.recursion_limit = value;
        self
    }

    /// Parse a document of type system definitions.
    pub fn parse_schema(&self, input: &str) -> Result<ast::SchemaDocument, SyntaxError> {
        let mut p = ParseContext::new(input, self.recursion_limit);
        grammar::document::schema_document(&mut p)
    }

    /// Parse a document of operations and fragments.
    pub fn parse_query(&self, input: &str) -> Result<ast::QueryDocument, SyntaxError> {
        let mut p = ParseContext::new(input, self.recursion_limit);
        grammar::document::query_document(&mut p)
    }

    /// Parse a standalone constant value, such as a default value literal.
    pub fn parse_value(&self, input: &str) -> Result<ast::Value, SyntaxError> {
        let mut p = ParseContext::new(input, self.recursion_limit);
        let value = grammar::value::value(&mut p, grammar::value::Constness::Const)?;
        p.expect(TokenKind::Eof)?;
        Ok(value)
    }

    /// Parse a standalone type reference, such as `[String!]!`.
    pub fn parse_type(&self, input: &str) -> Result<ast::Type, SyntaxError> {
        let mut p = ParseContext::new(input, self.recursion_limit);
        let ty = grammar::ty::ty(&mut p)?;
        p.expect(TokenKind::Eof)?;
        Ok(ty)
    }
}

/// State shared by the grammar functions while parsing one input.
pub(crate) struct ParseContext<'input> {
    lexer: Lexer<'input>,
    recursion: LimitTracker,
}

impl<'input> ParseContext<'input> {
    fn new(input: &'input str, recursion_limit: usize) -> Self {
        Self {
            lexer: Lexer::new(input),
            recursion: LimitTracker::new(recursion_limit),
        }
    }

    pub(crate) fn peek(&mut self) -> Result<&Token, SyntaxError> {
        self.lexer.peek()
    }

    pub(crate) fn peek_kind(&mut self) -> Result<TokenKind, SyntaxError> {
        Ok(self.lexer.peek()?.kind())
    }

    /// Location of the next token.
    pub(crate) fn location(&mut self) -> Result<Location, SyntaxError> {
        Ok(self.lexer.peek()?.location())
    }

    pub(crate) fn at(&mut self, kind: TokenKind) -> Result<bool, SyntaxError> {
        Ok(self.peek_kind()? == kind)
    }

    pub(crate) fn at_keyword(&mut self, keyword: &str) -> Result<bool, SyntaxError> {
        Ok(self.lexer.peek()?.is_name(keyword))
    }

    pub(crate) fn bump(&mut self) -> Result<Token, SyntaxError> {
        self.lexer.consume()
    }

    /// Consume the next token if it is of the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> Result<bool, SyntaxError> {
        if self.at(kind)? {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> Result<bool, SyntaxError> {
        if self.at_keyword(keyword)? {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        if self.at(kind)? {
            self.bump()
        } else {
            Err(self.unexpected(kind.as_str()))
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> Result<(), SyntaxError> {
        if self.eat_keyword(keyword)? {
            Ok(())
        } else {
            Err(self.unexpected(&format!("{keyword:?}")))
        }
    }

    /// An error for the next token, which is not what the grammar expects.
    pub(crate) fn unexpected(&mut self, expected: &str) -> SyntaxError {
        match self.lexer.peek() {
            Ok(token) => {
                let message = format!("unexpected {token}, expecting {expected}");
                SyntaxError::new(message, token.location())
            }
            Err(err) => err,
        }
    }

    pub(crate) fn err(&self, message: impl Into<String>) -> SyntaxError {
        self.lexer.syntax_error(message)
    }

    /// Parse a name, interning it.
    pub(crate) fn name(&mut self) -> Result<Name, SyntaxError> {
        let token = self.expect(TokenKind::Name)?;
        Ok(Name::new(token.data()))
    }

    /// Run `f` one nesting level deeper, failing once the recursion limit is reached.
    pub(crate) fn recurse<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.recursion.check_and_increment() {
            // Point at the token that opened the nested level
            let location = self.location()?;
            return Err(SyntaxError::new("parser recursion limit reached", location));
        }
        let result = f(self);
        self.recursion.decrement();
        result
    }
}
