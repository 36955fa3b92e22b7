mod cursor;
mod lookup;
mod token;

use crate::lexer::cursor::Cursor;
use crate::lexer::lookup::is_name_continue;
use crate::lexer::lookup::is_name_start;
use crate::lexer::lookup::punctuation_kind;
use crate::Location;
use crate::SyntaxError;

pub use token::Token;
pub use token::TokenKind;

/// Reads GraphQL source text one token at a time.
///
/// Whitespace, commas, comments and a leading byte order mark are skipped.
/// The parser drives the lexer through [`peek`][Lexer::peek] and
/// [`consume`][Lexer::consume]; it can also be used as an iterator that
/// ends after the `Eof` token or the first error:
///
/// ```rust
/// use gqlrt_parser::{Lexer, TokenKind};
///
/// let query = "
/// {
///     animal
///     ...snackSelection
///     ... on Pet {
///       playmates(first: 10) {
///         count
///       }
///     }
/// }
/// ";
/// let tokens = Lexer::new(query).collect::<Result<Vec<_>, _>>().unwrap();
/// assert_eq!(tokens.len(), 20);
/// assert_eq!(tokens.last().unwrap().kind(), TokenKind::Eof);
/// ```
#[derive(Clone, Debug)]
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    peeked: Option<Token>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer for a GraphQL source text.
    pub fn new(input: &'a str) -> Self {
        Self {
            cursor: Cursor::new(input),
            peeked: None,
            finished: false,
        }
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Result<&Token, SyntaxError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.cursor.advance()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Returns the next token and moves past it.
    pub fn consume(&mut self) -> Result<Token, SyntaxError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.cursor.advance(),
        }
    }

    /// Location of the next token, or of the next unread character when
    /// nothing has been peeked yet.
    pub fn location(&self) -> Location {
        match &self.peeked {
            Some(token) => token.location,
            None => self.cursor.location(),
        }
    }

    /// Create an error located at the next token.
    pub fn syntax_error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.location())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.consume();
        if matches!(&item, Err(_) | Ok(Token { kind: TokenKind::Eof, .. })) {
            self.finished = true;
        }
        Some(item)
    }
}

impl Cursor<'_> {
    fn advance(&mut self) -> Result<Token, SyntaxError> {
        self.skip_ignored();

        let start = self.location();
        let Some(c) = self.bump() else {
            return Ok(Token::new(TokenKind::Eof, "", start));
        };

        if let Some(kind) = punctuation_kind(c) {
            return Ok(Token::new(kind, c, start));
        }
        match c {
            '"' => self.string_value(start),
            '.' => self.spread_operator(start),
            c if is_name_start(c) => Ok(self.name(c, start)),
            c @ ('-' | '0'..='9') => self.number(c, start),
            c => Err(self.error_at(format!("unexpected character {c:?}"), start)),
        }
    }

    /// Skips whitespace, line terminators, commas and comments.
    ///
    /// <https://spec.graphql.org/October2021/#sec-Language.Source-Text.Ignored-Tokens>
    fn skip_ignored(&mut self) {
        loop {
            match self.first() {
                ' ' | '\t' | '\n' | '\r' | ',' | '\u{FEFF}' if !self.is_eof() => {
                    self.bump();
                }
                '#' => {
                    while !self.is_eof() && !is_line_terminator(self.first()) {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn name(&mut self, first: char, start: Location) -> Token {
        let mut buf = String::from(first);
        while is_name_continue(self.first()) {
            buf.push(self.first());
            self.bump();
        }
        Token::new(TokenKind::Name, buf, start)
    }

    fn spread_operator(&mut self, start: Location) -> Result<Token, SyntaxError> {
        if self.eat('.') && self.eat('.') {
            Ok(Token::new(TokenKind::Spread, "...", start))
        } else {
            Err(self.error_at("unterminated spread operator", start))
        }
    }

    /// <https://spec.graphql.org/October2021/#sec-Int-Value>
    /// <https://spec.graphql.org/October2021/#sec-Float-Value>
    fn number(&mut self, first: char, start: Location) -> Result<Token, SyntaxError> {
        let mut buf = String::from(first);
        let mut lead = first;
        if first == '-' {
            lead = self.first();
            if !lead.is_ascii_digit() {
                return Err(self.error(format!(
                    "invalid number, expected digit but got {}",
                    describe_char(self)
                )));
            }
            buf.push(lead);
            self.bump();
        }

        if lead == '0' {
            match self.first() {
                c if c.is_ascii_digit() => {
                    return Err(self.error(format!("invalid number, unexpected digit after 0: {c:?}")))
                }
                'x' | 'o' | 'b' | 'X' | 'O' | 'B' => {
                    return Err(self.error("invalid number, radix prefixes are not supported"))
                }
                _ => {}
            }
        } else {
            self.digits(&mut buf);
        }

        let mut is_float = false;
        if self.first() == '.' {
            is_float = true;
            buf.push('.');
            self.bump();
            self.required_digits(&mut buf)?;
        }
        if matches!(self.first(), 'e' | 'E') {
            is_float = true;
            buf.push(self.first());
            self.bump();
            if matches!(self.first(), '+' | '-') {
                buf.push(self.first());
                self.bump();
            }
            self.required_digits(&mut buf)?;
        }

        let next = self.first();
        if next == '.' || is_name_start(next) {
            return Err(self.error(format!("invalid number, unexpected {next:?}")));
        }

        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        Ok(Token::new(kind, buf, start))
    }

    fn digits(&mut self, buf: &mut String) {
        while self.first().is_ascii_digit() && !self.is_eof() {
            buf.push(self.first());
            self.bump();
        }
    }

    fn required_digits(&mut self, buf: &mut String) -> Result<(), SyntaxError> {
        if !self.first().is_ascii_digit() || self.is_eof() {
            return Err(self.error(format!(
                "invalid number, expected digit but got {}",
                describe_char(self)
            )));
        }
        self.digits(buf);
        Ok(())
    }

    /// <https://spec.graphql.org/October2021/#StringValue>
    fn string_value(&mut self, start: Location) -> Result<Token, SyntaxError> {
        if self.first() == '"' && self.second() == '"' {
            self.bump();
            self.bump();
            return self.block_string_value(start);
        }

        let mut buf = String::new();
        loop {
            let location = self.location();
            match self.bump() {
                None => return Err(self.error_at("unterminated string", start)),
                Some('"') => break,
                Some(c) if is_line_terminator(c) => {
                    return Err(self.error_at("unexpected line terminator in string", location))
                }
                Some('\\') => buf.push(self.escape_sequence(location)?),
                Some(c) => buf.push(c),
            }
        }
        Ok(Token::new(TokenKind::StringValue, buf, start))
    }

    fn escape_sequence(&mut self, location: Location) -> Result<char, SyntaxError> {
        let c = match self.bump() {
            Some('"') => '"',
            Some('\\') => '\\',
            Some('/') => '/',
            Some('b') => '\u{0008}',
            Some('f') => '\u{000C}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => return self.unicode_escape(location),
            Some(c) => return Err(self.error_at(format!("invalid escape sequence \"\\{c}\""), location)),
            None => return Err(self.error_at("unterminated string", location)),
        };
        Ok(c)
    }

    fn unicode_escape(&mut self, location: Location) -> Result<char, SyntaxError> {
        let high = self.hex4(location)?;
        if let Some(c) = char::from_u32(high) {
            return Ok(c);
        }
        // A leading surrogate must be followed by an escaped trailing one.
        if (0xD800..0xDC00).contains(&high) && self.eat('\\') && self.eat('u') {
            let low = self.hex4(location)?;
            if (0xDC00..0xE000).contains(&low) {
                let code_point = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                if let Some(c) = char::from_u32(code_point) {
                    return Ok(c);
                }
            }
        }
        Err(self.error_at("invalid unicode escape sequence", location))
    }

    fn hex4(&mut self, location: Location) -> Result<u32, SyntaxError> {
        let mut value = 0;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error_at("invalid unicode escape sequence", location))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    /// Block strings keep their content verbatim; only `\"""` is unescaped.
    fn block_string_value(&mut self, start: Location) -> Result<Token, SyntaxError> {
        let mut buf = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error_at("unterminated block string", start)),
                Some('"') if self.first() == '"' && self.second() == '"' => {
                    self.bump();
                    self.bump();
                    break;
                }
                Some('\\') if self.first() == '"' && self.second() == '"' => {
                    let mut lookahead = self.clone();
                    lookahead.bump();
                    lookahead.bump();
                    if lookahead.first() == '"' {
                        *self = lookahead;
                        self.bump();
                        buf.push_str("\"\"\"");
                    } else {
                        buf.push('\\');
                    }
                }
                Some(c) => buf.push(c),
            }
        }
        Ok(Token::new(TokenKind::BlockStringValue, buf, start))
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r')
}

fn describe_char(cursor: &Cursor<'_>) -> String {
    if cursor.is_eof() {
        String::from("<EOF>")
    } else {
        format!("{:?}", cursor.first())
    }
}
