//! GraphQL [requests](https://spec.graphql.org/draft/#request)

use crate::ast;
use crate::ast::OperationDefinition;
use crate::ast::Type;
use crate::response::GraphQLError;
use crate::response::JsonMap;
use crate::response::JsonValue;
use crate::schema::ExtendedType;
use crate::values::evaluate;
use crate::Location;
use crate::Node;
use crate::Schema;
use serde::Deserialize;
use serde::Deserializer;
use serde_json::value::RawValue;
use tokio_util::sync::CancellationToken;

/// A request to execute one operation of a query document.
///
/// Deserializes from the usual JSON body of a GraphQL POST request:
///
/// ```rust
/// let request: gqlrt::Request = serde_json::from_str(
///     r#"{"query": "query Hero($ep: Episode) { hero(episode: $ep) { name } }",
///         "operationName": "Hero",
///         "variables": {"ep": "JEDI"}}"#,
/// )
/// .unwrap();
/// assert_eq!(request.operation_name.as_deref(), Some("Hero"));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Cancelling this token aborts execution: pending resolvers are dropped
    /// and subscription streams end.
    #[serde(skip)]
    pub context: CancellationToken,

    pub query: String,

    #[serde(default)]
    pub operation_name: Option<String>,

    #[serde(default)]
    pub variables: Variables,
}

/// Values of the request's variables
#[derive(Debug, Clone)]
pub enum Variables {
    Map(JsonMap),
    /// JSON text of an object, parsed when the request is executed
    Raw(Box<RawValue>),
}

impl Default for Variables {
    fn default() -> Self {
        Self::Map(JsonMap::new())
    }
}

impl<'de> Deserialize<'de> for Variables {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // `"variables": null` is the same as no variables
        Ok(Self::Map(Option::<JsonMap>::deserialize(deserializer)?.unwrap_or_default()))
    }
}

impl From<JsonMap> for Variables {
    fn from(map: JsonMap) -> Self {
        Self::Map(map)
    }
}

impl Variables {
    /// Returns the variables as a map, parsing them if needed.
    pub fn to_map(&self) -> Result<JsonMap, RequestError> {
        match self {
            Self::Map(map) => Ok(map.clone()),
            Self::Raw(raw) => serde_json::from_str::<Option<JsonMap>>(raw.get())
                .map(Option::unwrap_or_default)
                .map_err(|err| RequestError::InvalidVariables(err.to_string())),
        }
    }
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn variables(mut self, variables: impl Into<Variables>) -> Self {
        self.variables = variables.into();
        self
    }

    /// Use a caller-owned cancellation token.
    pub fn context(mut self, token: CancellationToken) -> Self {
        self.context = token;
        self
    }
}

/// A [request error](https://spec.graphql.org/draft/#sec-Errors.Request-Errors) is an error
/// raised before execution starts, to indicate that the request as a whole is faulty.
///
/// A response for a request error has no `data` key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("no operations in query document")]
    NoOperation,

    #[error("operation name is required when the document contains multiple operations")]
    AmbiguousOperation,

    #[error(r#"unknown operation named "{0}""#)]
    UnknownOperation(String),

    #[error(r#"schema does not support operation type "{0}""#)]
    UnsupportedOperation(&'static str),

    #[error("variables must be a JSON object: {0}")]
    InvalidVariables(String),

    #[error("{message}")]
    Variable {
        message: String,
        location: Option<Location>,
    },
}

impl RequestError {
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::Variable { location, .. } => *location,
            _ => None,
        }
    }

    pub fn to_graphql_error(&self) -> GraphQLError {
        GraphQLError::new(self.to_string(), self.location())
    }
}

macro_rules! variable_error {
    ($location: expr, $($arg: tt)+) => {
        return Err(RequestError::Variable {
            message: format!($($arg)+),
            location: $location,
        })
    };
}

/// Picks the operation to execute.
///
/// Without a name, the document must contain exactly one operation.
pub fn get_operation<'doc>(
    document: &'doc ast::QueryDocument,
    operation_name: Option<&str>,
) -> Result<&'doc Node<OperationDefinition>, RequestError> {
    match operation_name {
        Some(name) => document
            .operation(Some(name))
            .ok_or_else(|| RequestError::UnknownOperation(name.to_owned())),
        None => match document.operations.as_slice() {
            [] => Err(RequestError::NoOperation),
            [single] => Ok(single),
            _ => Err(RequestError::AmbiguousOperation),
        },
    }
}

/// Coerce the values of [variables](https://spec.graphql.org/draft/#sec-Language.Variables)
/// from a GraphQL request to the types expected by the operation.
///
/// This is [_CoerceVariableValues()_](https://spec.graphql.org/October2021/#CoerceVariableValues())
/// in the GraphQL specification. Variables missing from `values` take their
/// declared default.
pub fn coerce_variable_values(
    schema: &Schema,
    operation: &OperationDefinition,
    values: &JsonMap,
) -> Result<JsonMap, RequestError> {
    let mut coerced_values = JsonMap::new();
    for variable_def in &operation.variables {
        let name = variable_def.name.as_str();
        let location = variable_def.location();
        match values.get_key_value(name) {
            Some((_, value)) if value.is_null() && variable_def.ty.is_non_null() => {
                variable_error!(
                    location,
                    r#"Variable "${name}" of required type "{}" was not provided."#,
                    variable_def.ty
                )
            }
            Some((key, value)) => {
                let value =
                    coerce_variable_value(schema, location, name, &variable_def.ty, value)?;
                coerced_values.insert(key.clone(), value);
            }
            None => {
                if let Some(default) = &variable_def.default_value {
                    coerced_values.insert(name, evaluate(default, &JsonMap::new()));
                } else if variable_def.ty.is_non_null() {
                    variable_error!(
                        location,
                        r#"Variable "${name}" of required type "{}" was not provided."#,
                        variable_def.ty
                    )
                }
            }
        }
    }
    Ok(coerced_values)
}

fn coerce_variable_value(
    schema: &Schema,
    location: Option<Location>,
    name: &str,
    ty: &Type,
    value: &JsonValue,
) -> Result<JsonValue, RequestError> {
    if value.is_null() {
        if ty.is_non_null() {
            variable_error!(location, r#"Variable "${name}" got null for non-null type "{ty}"."#)
        }
        return Ok(JsonValue::Null);
    }
    if let Some(item_type) = ty.item_type() {
        // https://spec.graphql.org/October2021/#sec-List.Input-Coercion
        return value
            .as_array()
            .map(Vec::as_slice)
            // If not an array, treat the value as an array of size one:
            .unwrap_or(std::slice::from_ref(value))
            .iter()
            .map(|item| coerce_variable_value(schema, location, name, item_type, item))
            .collect();
    }
    let ty_name = ty.inner_named_type();
    let Some(ty_def) = schema.types.get(ty_name) else {
        variable_error!(location, r#"Variable "${name}" has unknown type "{ty_name}"."#)
    };
    let accepted = match ty_def {
        ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_) => {
            variable_error!(
                location,
                r#"Variable "${name}" cannot be of non-input type "{ty_name}"."#
            )
        }
        ExtendedType::Scalar(_) => match ty_name.as_str() {
            "Int" => value
                .as_i64()
                .is_some_and(|value| i32::try_from(value).is_ok()),
            "Float" => value.is_number(),
            "String" => value.is_string(),
            "Boolean" => value.is_boolean(),
            "ID" => value.is_string() || value.is_i64(),
            // Custom scalars pass through as-is
            _ => true,
        },
        ExtendedType::Enum(ty_def) => value
            .as_str()
            .is_some_and(|str| ty_def.values.contains_key(str)),
        ExtendedType::InputObject(ty_def) => {
            let Some(object) = value.as_object() else {
                variable_error!(
                    location,
                    r#"Variable "${name}" expected an object for type "{ty_name}"."#
                )
            };
            if let Some(key) = object
                .keys()
                .find(|key| !ty_def.fields.contains_key(key.as_str()))
            {
                variable_error!(
                    location,
                    r#"Variable "${name}" has field "{}" not defined by type "{ty_name}"."#,
                    key.as_str()
                )
            }
            let mut object = object.clone();
            for (field_name, field_def) in &ty_def.fields {
                if let Some(field_value) = object.get_mut(field_name.as_str()) {
                    *field_value =
                        coerce_variable_value(schema, location, name, &field_def.ty, field_value)?
                } else if let Some(default) = &field_def.default_value {
                    object.insert(field_name.as_str(), evaluate(default, &JsonMap::new()));
                } else if field_def.ty.is_non_null() {
                    variable_error!(
                        location,
                        r#"Variable "${name}" is missing required field "{ty_name}.{field_name}"."#
                    )
                }
            }
            return Ok(object.into());
        }
    };
    if !accepted {
        variable_error!(
            location,
            r#"Variable "${name}" got invalid value {value}; expected type "{ty_name}"."#
        )
    }
    Ok(value.clone())
}
