//! A strict GraphQL lexer and recursive-descent parser.
//!
//! Two entry points share one lexer:
//!
//! * [`Parser::parse_schema`] reads type system definitions (SDL) into a
//!   [`SchemaDocument`][ast::SchemaDocument],
//! * [`Parser::parse_query`] reads executable definitions into a
//!   [`QueryDocument`][ast::QueryDocument].
//!
//! Parsing stops at the first syntax error, which is returned with the line
//! and column where it was found:
//!
//! ```rust
//! use gqlrt_parser::Parser;
//!
//! let err = Parser::new().parse_query("{ hero { name }").unwrap_err();
//! assert_eq!(err.location().line, 1);
//! ```
//!
//! Every AST node implements [`Display`][std::fmt::Display], printing GraphQL
//! syntax that parses back to an equal tree.

mod error;
mod lexer;
mod limit;
mod name;
mod node;
mod parser;

pub mod ast;

pub use crate::error::SyntaxError;
pub use crate::lexer::Lexer;
pub use crate::lexer::Token;
pub use crate::lexer::TokenKind;
pub use crate::limit::LimitTracker;
pub use crate::name::InvalidNameError;
pub use crate::name::Name;
pub use crate::node::Location;
pub use crate::node::Node;
pub use crate::parser::Parser;
