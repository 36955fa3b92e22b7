use std::str::Chars;

use crate::Location;
use crate::SyntaxError;

/// Peekable iterator over a char sequence that tracks the current line and
/// column.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    chars: Chars<'a>,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str) -> Cursor<'a> {
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
        Cursor {
            chars: input.chars(),
            line: 1,
            column: 1,
        }
    }

    /// Location of the next character.
    pub(crate) fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    /// Peeks the next character without consuming it. Returns `'\0'` at
    /// the end of input.
    pub(crate) fn first(&self) -> char {
        self.chars.clone().next().unwrap_or('\0')
    }

    pub(crate) fn second(&self) -> char {
        let mut chars = self.chars.clone();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    /// Moves to the next character.
    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        match c {
            '\n' => self.new_line(),
            // \r\n counts as a single line terminator
            '\r' if self.first() != '\n' => self.new_line(),
            _ => self.column += 1,
        }
        Some(c)
    }

    /// Consumes `c` if it is the next character.
    pub(crate) fn eat(&mut self, c: char) -> bool {
        if self.first() == c && !self.is_eof() {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn error_at(&self, message: impl Into<String>, location: Location) -> SyntaxError {
        SyntaxError::new(message, location)
    }

    /// An error located at the next character.
    pub(crate) fn error(&self, message: impl Into<String>) -> SyntaxError {
        self.error_at(message, self.location())
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.column = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let mut cursor = Cursor::new("a\r\nb\rc\nd");
        let mut seen = vec![];
        while let Some(c) = cursor.bump() {
            if c.is_alphabetic() {
                seen.push((c, cursor.location()));
            }
        }
        assert_eq!(
            seen,
            [
                ('a', Location::new(1, 2)),
                ('b', Location::new(2, 2)),
                ('c', Location::new(3, 2)),
                ('d', Location::new(4, 2)),
            ]
        );
    }

    #[test]
    fn skips_byte_order_mark() {
        let cursor = Cursor::new("\u{FEFF}{");
        assert_eq!(cursor.first(), '{');
        assert_eq!(cursor.location(), Location::new(1, 1));
    }
}
