//! Evaluation of GraphQL literals into JSON, and coercion of field arguments.

use crate::ast;
use crate::ast::Value;
use crate::response::JsonMap;
use crate::response::JsonValue;
use crate::schema::FieldDefinition;
use crate::Location;
use crate::Node;

/// Evaluates a literal against the request's variables.
///
/// A variable missing from `variables` evaluates to `null`.
/// Enum values become JSON strings.
pub fn evaluate(value: &Value, variables: &JsonMap) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Variable(name) => variables
            .get(name.as_str())
            .cloned()
            .unwrap_or(JsonValue::Null),
        Value::Enum(value) => value.as_str().into(),
        Value::String(value) => value.as_str().into(),
        Value::Boolean(value) => (*value).into(),
        // Rely on `serde_json::Number`’s own parser to use whatever precision it supports
        Value::Int(value) | Value::Float(value) => value
            .parse()
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::List(items) => items
            .iter()
            .map(|item| evaluate(item, variables))
            .collect(),
        Value::Object(fields) => JsonValue::Object(
            fields
                .iter()
                .map(|(key, value)| (key.as_str().into(), evaluate(value, variables)))
                .collect(),
        ),
    }
}

/// An argument could not be coerced to its declared type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ArgumentError {
    pub message: String,
    pub location: Option<Location>,
}

/// Builds the argument map a resolver sees for `field`.
///
/// Arguments are listed in declaration order. An argument that is absent,
/// or given as a variable the request did not provide, takes its default.
/// Without a default it is left out, unless its type is non-null.
pub(crate) fn coerce_argument_values(
    field_def: &FieldDefinition,
    field: &Node<ast::Field>,
    variables: &JsonMap,
) -> Result<JsonMap, ArgumentError> {
    let mut coerced = JsonMap::with_capacity(field_def.arguments.len());
    for arg_def in &field_def.arguments {
        let name = arg_def.name.as_str();
        let supplied = field.argument_by_name(name).filter(|value| {
            value
                .as_variable()
                .map_or(true, |var| variables.contains_key(var.as_str()))
        });
        let value = match (supplied, &arg_def.default_value) {
            (Some(value), _) => {
                let value_location = value.location();
                let json = evaluate(value, variables);
                if json.is_null() && arg_def.ty.is_non_null() {
                    return Err(ArgumentError {
                        message: format!(
                            r#"Argument "{name}" of non-null type "{}" must not be null."#,
                            arg_def.ty
                        ),
                        location: value_location,
                    });
                }
                json
            }
            (None, Some(default)) => evaluate(default, &JsonMap::new()),
            (None, None) if arg_def.ty.is_non_null() => {
                return Err(ArgumentError {
                    message: format!(
                        r#"Argument "{name}" of required type "{}" was not provided."#,
                        arg_def.ty
                    ),
                    location: field.location(),
                })
            }
            (None, None) => continue,
        };
        coerced.insert(name, value);
    }
    Ok(coerced)
}

/// Evaluates the `if` argument of `@skip` or `@include`, if that directive is present.
pub(crate) fn eval_if_arg(
    directives: &ast::DirectiveList,
    directive_name: &str,
    variables: &JsonMap,
) -> Option<bool> {
    match directives.get(directive_name)?.argument_by_name("if")?.as_ref() {
        Value::Boolean(value) => Some(*value),
        Value::Variable(var) => variables.get(var.as_str())?.as_bool(),
        _ => None,
    }
}

/// Returns whether `@skip` or `@include` exclude a selection.
pub(crate) fn is_excluded(directives: &ast::DirectiveList, variables: &JsonMap) -> bool {
    eval_if_arg(directives, "skip", variables).unwrap_or(false)
        || !eval_if_arg(directives, "include", variables).unwrap_or(true)
}
