//! The resolver pipeline: how the executor obtains a value for each field.
//!
//! Values flowing through execution are [`Value`]s. Host objects implement
//! [`ObjectValue`]. For every field the executor asks its [`Resolver`] for a
//! [`Resolution`], a boxed future that yields the field's value. A resolver
//! that does not know the field returns the `next` resolution it was given,
//! so strategies compose into a [`ResolverList`] where the first match wins.
//!
//! [`dynamic()`] is the default pipeline:
//!
//! 1. [`MetadataResolver`]: `__typename`, `__schema` and `__type`
//! 2. [`MethodResolver`]: [`ObjectValue::call_method`] with the lower-cased field name
//! 3. [`FieldResolver`]: [`ObjectValue::field_value`]
//! 4. [`MapResolver`]: entries of [`Value::Map`] and JSON objects
//!
//! ```rust
//! use gqlrt::resolvers::{self, MethodCall, ObjectValue, Resolution, Value};
//! use serde_json_bytes::json;
//! use std::sync::Arc;
//!
//! struct Droid;
//!
//! impl ObjectValue for Droid {
//!     fn type_name(&self) -> &str {
//!         "Droid"
//!     }
//!
//!     fn call_method(self: Arc<Self>, name: &str, call: MethodCall) -> Option<Resolution> {
//!         match name {
//!             "name" => Some(resolvers::resolved(Value::json("R2-D2"))),
//!             "greeting" => {
//!                 let ctx = call.ctx.clone();
//!                 Some(ctx.run_async(async move {
//!                     #[derive(serde::Deserialize)]
//!                     struct Args {
//!                         to: String,
//!                     }
//!                     let args: Args = call.args()?;
//!                     Ok(Value::Json(json!(format!("Beep {}", args.to))))
//!                 }))
//!             }
//!             _ => None,
//!         }
//!     }
//! }
//! ```

use crate::ast;
use crate::execution::ExecutionContext;
use crate::response::GraphQLError;
use crate::response::JsonMap;
use crate::response::JsonValue;
use crate::response::ResponseDataPathSegment;
use crate::schema::FieldDefinition;
use crate::Location;
use crate::Name;
use crate::Node;
use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod strategies;

pub use self::strategies::DirectiveResolver;
pub use self::strategies::FieldResolver;
pub use self::strategies::FuncResolver;
pub use self::strategies::MapResolver;
pub use self::strategies::MetadataResolver;
pub use self::strategies::MethodResolver;
pub use self::strategies::ResolverList;
pub use self::strategies::TypeAndFieldResolver;

/// The eventual value of one field
pub type Resolution = BoxFuture<'static, Result<Value, FieldError>>;

/// A dynamically-typed value produced by resolvers.
///
/// * [`Value::Null`] and JSON `null` are GraphQL null
/// * Leaf fields serialize the JSON as-is, except that enum values are rendered as strings
/// * Composite fields accept [`Value::Object`], [`Value::Map`] and JSON objects
/// * List fields accept [`Value::List`] and JSON arrays
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Json(JsonValue),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Object(Arc<dyn ObjectValue>),
}

/// A host object whose fields are resolved by the [`MethodResolver`]
/// or [`FieldResolver`] strategies.
pub trait ObjectValue: Send + Sync + 'static {
    /// Name of the concrete object type, used to resolve interfaces and unions
    fn type_name(&self) -> &str;

    /// Resolves the field whose lower-cased name is `name`.
    ///
    /// Returns `None` for fields this object does not provide as methods.
    fn call_method(self: Arc<Self>, _name: &str, _call: MethodCall) -> Option<Resolution> {
        None
    }

    /// Returns a plain value stored on this object.
    ///
    /// Called with the field name as written in the schema, then lower-cased.
    fn field_value(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Views this object as a value of another object type, if it can be one.
    ///
    /// Used when a fragment's type condition names an object type other than
    /// [`type_name`][Self::type_name], and to find the concrete type of an
    /// interface or union value.
    fn try_cast(self: Arc<Self>, _type_name: &str) -> Option<Value> {
        None
    }
}

/// What a [method](ObjectValue::call_method) gets to work with
pub struct MethodCall {
    /// Cancelled when the request is
    pub cancel: CancellationToken,
    pub ctx: ExecutionContext,
    /// Coerced argument values, in declaration order
    pub args: JsonMap,
    /// The selection being resolved
    pub field: Node<ast::Field>,
}

/// An error returned by a resolver.
///
/// The executor records it in the response with the path of the field.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct FieldError {
    pub message: String,
    pub extensions: JsonMap,
    cause: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

/// Everything a [`Resolver`] knows about the field being resolved
#[derive(Clone)]
pub struct ResolveRequest {
    pub ctx: ExecutionContext,
    /// The concrete object type the field is selected on
    pub parent_type: Name,
    pub parent_value: Value,
    /// The field definition in the schema
    pub field: Node<FieldDefinition>,
    /// Coerced argument values, in declaration order
    pub args: JsonMap,
    /// The selection in the query document
    pub selection: Node<ast::Field>,
}

/// A strategy for resolving fields.
///
/// `next` is the resolution found by the strategies before this one.
/// Returning it unchanged declines the field.
pub trait Resolver: Send + Sync {
    fn resolve(&self, request: &ResolveRequest, next: Option<Resolution>) -> Option<Resolution>;
}

impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    fn resolve(&self, request: &ResolveRequest, next: Option<Resolution>) -> Option<Resolution> {
        (**self).resolve(request, next)
    }
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn resolve(&self, request: &ResolveRequest, next: Option<Resolution>) -> Option<Resolution> {
        (**self).resolve(request, next)
    }
}

/// The default pipeline: metadata, then methods, then fields, then maps.
pub fn dynamic() -> ResolverList {
    let strategies: Vec<Box<dyn Resolver>> = vec![
        Box::new(MetadataResolver),
        Box::new(MethodResolver),
        Box::new(FieldResolver),
        Box::new(MapResolver),
    ];
    ResolverList::new(strategies)
}

/// A resolution that is already complete
pub fn resolved(value: Value) -> Resolution {
    futures::future::ready(Ok(value)).boxed()
}

/// A resolution that already failed
pub fn failed(error: FieldError) -> Resolution {
    futures::future::ready(Err(error)).boxed()
}

impl Value {
    pub fn json(value: impl Into<JsonValue>) -> Self {
        Self::Json(value.into())
    }

    pub fn object(object: impl ObjectValue) -> Self {
        Self::Object(Arc::new(object))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(items.into_iter().collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Json(JsonValue::Null))
    }

    /// Converts to plain JSON, or `None` if an [`ObjectValue`] is found.
    pub fn to_json(&self) -> Option<JsonValue> {
        Some(match self {
            Self::Null => JsonValue::Null,
            Self::Json(json) => json.clone(),
            Self::List(items) => JsonValue::Array(
                items
                    .iter()
                    .map(Self::to_json)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Self::Map(map) => {
                let mut object = JsonMap::with_capacity(map.len());
                for (key, value) in map {
                    object.insert(key.as_str(), value.to_json()?);
                }
                JsonValue::Object(object)
            }
            Self::Object(_) => return None,
        })
    }

    /// Looks up a key of a [`Value::Map`] or JSON object.
    ///
    /// Returns `None` for other kinds of values, and null for missing keys.
    pub fn map_entry(&self, key: &str) -> Option<Value> {
        match self {
            Self::Map(map) => Some(map.get(key).cloned().unwrap_or_default()),
            Self::Json(JsonValue::Object(object)) => Some(
                object
                    .get(key)
                    .map(|json| Self::Json(json.clone()))
                    .unwrap_or_default(),
            ),
            _ => None,
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Self::Json(json)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self::Map(map)
    }
}

impl<T: ObjectValue> From<Arc<T>> for Value {
    fn from(object: Arc<T>) -> Self {
        Self::Object(object)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Json(json) => f.debug_tuple("Json").field(json).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Self::Object(object) => write!(f, "Object({})", object.type_name()),
        }
    }
}

impl MethodCall {
    /// Deserializes the arguments into a typed struct.
    pub fn args<T: DeserializeOwned>(&self) -> Result<T, FieldError> {
        let json = serde_json::to_value(&self.args).map_err(FieldError::from_error)?;
        serde_json::from_value(json).map_err(FieldError::from_error)
    }
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extensions: JsonMap::new(),
            cause: None,
        }
    }

    /// Wraps another error, keeping it as the [cause](GraphQLError::cause) of the response error.
    pub fn from_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: error.to_string(),
            extensions: JsonMap::new(),
            cause: Some(Arc::new(error)),
        }
    }

    pub fn with_extension(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.extensions.insert(key, value.into());
        self
    }

    pub(crate) fn panic(message: &str) -> Self {
        Self::new(format!("graphql: panic occurred: {message}"))
    }

    pub(crate) fn into_graphql_error(
        self,
        path: &[ResponseDataPathSegment],
        location: Option<Location>,
    ) -> GraphQLError {
        let Self {
            message,
            extensions,
            cause,
        } = self;
        let mut error = GraphQLError::field_error(message, path, location);
        error.extensions = extensions;
        match cause {
            Some(cause) => error.with_cause(cause),
            None => error,
        }
    }
}
