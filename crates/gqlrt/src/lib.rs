//! A GraphQL execution engine.
//!
//! * [`Schema`] is built once from SDL (see [`schema::SchemaBuilder`])
//!   and shared read-only between requests.
//! * [`validation::validate`] checks a query document against it.
//! * [`Engine`] runs requests: it parses, validates, coerces variables, then
//!   drives a [resolver pipeline](resolvers) over a root value and writes the
//!   JSON response in document order.
//!
//! ```rust
//! use gqlrt::resolvers::Value;
//! use gqlrt::{Engine, Request, Schema};
//! use serde_json_bytes::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let schema = Schema::parse("type Query { hello: String }").unwrap();
//! let engine = Engine::builder(schema)
//!     .root_value(Value::Json(json!({"hello": "world"})))
//!     .build();
//! let response = engine.execute(Request::new("{ hello }")).await;
//! assert_eq!(response.data.unwrap().get(), r#"{"hello":"world"}"#);
//! # }
//! ```

pub mod engine;
pub mod execution;
pub mod introspection;
pub mod request;
pub mod resolvers;
pub mod response;
pub mod schema;
pub mod validation;
pub mod values;

pub use self::engine::Engine;
pub use self::engine::EngineBuilder;
pub use self::engine::EngineConfig;
pub use self::engine::ResponseStream;
pub use self::request::Request;
pub use self::request::Variables;
pub use self::response::GraphQLError;
pub use self::response::Response;
pub use self::schema::Schema;
pub use gqlrt_parser::ast;
pub use gqlrt_parser::Location;
pub use gqlrt_parser::Name;
pub use gqlrt_parser::Node;
pub use gqlrt_parser::Parser;
pub use gqlrt_parser::SyntaxError;
