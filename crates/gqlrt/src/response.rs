//! GraphQL [responses](https://spec.graphql.org/draft/#sec-Response) and errors

use crate::Location;
use crate::Name;
use serde::Deserialize;
use serde::Serialize;
use serde_json::value::RawValue;
/// Re-export of the version of the `serde_json_bytes` crate used for [`JsonValue`] and [`JsonMap`]
pub use serde_json_bytes;
use std::fmt;
use std::sync::Arc;

/// A JSON-compatible dynamically-typed value.
///
/// Note: [`serde_json_bytes::Value`] is similar
/// to [`serde_json::Value`][serde_json_bytes::serde_json::Value]
/// but uses its reference-counted [`ByteString`][serde_json_bytes::ByteString]
/// for string values and map keys.
pub type JsonValue = serde_json_bytes::Value;

/// A JSON-compatible object/map with string keys and dynamically-typed values.
pub type JsonMap = serde_json_bytes::Map<serde_json_bytes::ByteString, JsonValue>;

/// A [response](https://spec.graphql.org/October2021/#sec-Response-Format)
/// to a GraphQL request.
///
/// `data` is the JSON text written by the executor. It is absent when the
/// request failed before execution started: syntax, validation, or
/// request errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Box<RawValue>>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<GraphQLError>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub extensions: Option<JsonMap>,
}

impl Response {
    /// A response without `data`, for a request that was not executed.
    pub fn from_errors(errors: Vec<GraphQLError>) -> Self {
        Self {
            data: None,
            errors,
            extensions: None,
        }
    }

    /// Parses `data` into a dynamically-typed value.
    pub fn data_value(&self) -> Option<JsonValue> {
        let data = self.data.as_ref()?;
        serde_json::from_str(data.get()).ok()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A serializable [error](https://spec.graphql.org/October2021/#sec-Errors.Error-result-format),
/// as found in a GraphQL response.
#[derive(Clone, Serialize, Deserialize)]
pub struct GraphQLError {
    /// The error message.
    pub message: String,

    /// Locations in relevant to the error, if any.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub locations: Vec<LineColumn>,

    /// If non-empty, the error is a [field error]
    /// for the particular field found at this path in [`Response::data`].
    ///
    /// [field error]: https://spec.graphql.org/October2021/#sec-Errors.Field-errors
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub path: Vec<ResponseDataPathSegment>,

    /// Name of the validation rule that produced this error.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rule: Option<String>,

    /// Reserved for any additional information
    #[serde(skip_serializing_if = "JsonMap::is_empty", default)]
    pub extensions: JsonMap,

    /// The underlying error, if any. Not serialized.
    #[serde(skip)]
    pub cause: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

/// A line and column in a GraphQL document, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineColumn {
    pub line: u32,
    pub column: u32,
}

impl From<Location> for LineColumn {
    fn from(location: Location) -> Self {
        Self {
            line: location.line,
            column: location.column,
        }
    }
}

/// A `Vec<ResponseDataPathSegment>` like in [`GraphQLError::path`]
/// represents a [path](https://spec.graphql.org/draft/#sec-Errors.Error-Result-Format)
/// into [`Response::data`],
/// starting at the root and indexing into increasingly nested JSON objects or arrays.
///
/// # Example
///
/// In a GraphQL response like this:
///
/// ```json
/// {
///   "data": {
///     "players": [
///       {"name": "Alice"},
///       {"name": "Bob"}
///     ]
///   },
///   "errors": [
///     {
///       "message": "Something went wrong",
///       "path": ["players", 1, "name"]
///     }
///   ]
/// }
/// ```
///
/// The error path would have a Rust representation like
/// `vec![Field("players"), ListIndex(1), Field("name")]`
/// and designate the value `"name": "Bob"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PathSegmentRepr", into = "PathSegmentRepr")]
pub enum ResponseDataPathSegment {
    /// The response key (alias or field name) in an object value
    Field(Name),

    /// The index of the relevant item in a list value
    ListIndex(usize),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PathSegmentRepr {
    Field(String),
    ListIndex(usize),
}

impl From<PathSegmentRepr> for ResponseDataPathSegment {
    fn from(repr: PathSegmentRepr) -> Self {
        match repr {
            PathSegmentRepr::Field(key) => Self::Field(Name::new(&key)),
            PathSegmentRepr::ListIndex(index) => Self::ListIndex(index),
        }
    }
}

impl From<ResponseDataPathSegment> for PathSegmentRepr {
    fn from(segment: ResponseDataPathSegment) -> Self {
        match segment {
            ResponseDataPathSegment::Field(key) => Self::Field(key.as_str().to_owned()),
            ResponseDataPathSegment::ListIndex(index) => Self::ListIndex(index),
        }
    }
}

impl fmt::Display for ResponseDataPathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(key) => key.fmt(f),
            Self::ListIndex(index) => index.fmt(f),
        }
    }
}

impl GraphQLError {
    pub fn new(message: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            message: message.into(),
            locations: location.into_iter().map(LineColumn::from).collect(),
            path: Vec::new(),
            rule: None,
            extensions: JsonMap::new(),
            cause: None,
        }
    }

    /// A [field error](https://spec.graphql.org/October2021/#sec-Errors.Field-errors)
    /// at the given path into the response data.
    pub fn field_error(
        message: impl Into<String>,
        path: &[ResponseDataPathSegment],
        location: Option<Location>,
    ) -> Self {
        let mut err = Self::new(message, location);
        err.path = path.to_vec();
        err
    }

    pub fn with_cause(mut self, cause: Arc<dyn std::error::Error + Send + Sync>) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }
}

impl PartialEq for GraphQLError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
            && self.locations == other.locations
            && self.path == other.path
            && self.rule == other.rule
            && self.extensions == other.extensions
    }
}

impl Eq for GraphQLError {}

impl fmt::Debug for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQLError")
            .field("message", &self.message)
            .field("locations", &self.locations)
            .field("path", &self.path)
            .field("rule", &self.rule)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

/// `graphql: <message> (line:column)`, with the path if there is one.
impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graphql: {}", self.message)?;
        if let Some(location) = self.locations.first() {
            write!(f, " ({}:{})", location.line, location.column)?;
        }
        if !self.path.is_empty() {
            f.write_str(" at ")?;
            for (i, segment) in self.path.iter().enumerate() {
                if i > 0 {
                    f.write_str(".")?;
                }
                segment.fmt(f)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for GraphQLError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Several errors, serialized as `{"errors": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorList {
    pub errors: Vec<GraphQLError>,
}

impl ErrorList {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn push(&mut self, error: GraphQLError) {
        self.errors.push(error)
    }
}

impl From<Vec<GraphQLError>> for ErrorList {
    fn from(errors: Vec<GraphQLError>) -> Self {
        Self { errors }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            error.fmt(f)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorList {}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn error_serialization_skips_empty_fields() {
        let mut located = GraphQLError::field_error(
            "boom",
            &[
                ResponseDataPathSegment::Field(Name::new("hero")),
                ResponseDataPathSegment::ListIndex(1),
                ResponseDataPathSegment::Field(Name::new("name")),
            ],
            Some(Location::new(2, 5)),
        );
        located.cause = Some(Arc::new(std::fmt::Error));
        let list = ErrorList {
            errors: vec![
                located,
                GraphQLError::new("Unknown field", None).with_rule("FieldsOnCorrectType"),
            ],
        };
        expect![[r#"{"errors":[{"message":"boom","locations":[{"line":2,"column":5}],"path":["hero",1,"name"]},{"message":"Unknown field","rule":"FieldsOnCorrectType"}]}"#]]
            .assert_eq(&serde_json::to_string(&list).unwrap());
        expect![[r#"
            graphql: boom (2:5) at hero.1.name
            graphql: Unknown field"#]]
        .assert_eq(&list.to_string());
    }

    #[test]
    fn path_round_trips_through_json() {
        let error: GraphQLError =
            serde_json::from_str(r#"{"message":"m","path":["a",0,"b"]}"#).unwrap();
        assert_eq!(
            error.path,
            [
                ResponseDataPathSegment::Field(Name::new("a")),
                ResponseDataPathSegment::ListIndex(0),
                ResponseDataPathSegment::Field(Name::new("b")),
            ]
        );
    }

    #[test]
    fn response_omits_missing_data() {
        let response = Response::from_errors(vec![GraphQLError::new("bad", None)]);
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"errors":[{"message":"bad"}]}"#
        );
        let response = Response {
            data: RawValue::from_string(r#"{"a":1}"#.to_owned()).ok(),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"data":{"a":1}}"#);
    }
}
