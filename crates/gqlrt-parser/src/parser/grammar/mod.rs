//! One module per area of the [GraphQL grammar](https://spec.graphql.org/October2021/#sec-Appendix-Grammar-Summary).
//!
//! Every function takes the parse context as `p`, consumes exactly the
//! tokens of its production, and returns the AST node it built.

pub(crate) mod directive;
pub(crate) mod document;
pub(crate) mod fragment;
pub(crate) mod operation;
pub(crate) mod schema;
pub(crate) mod selection;
pub(crate) mod ty;
pub(crate) mod value;
