use crate::ast;
use crate::ast::Type;
use crate::ast::Value;
use crate::schema::ExtendedType;
use crate::validation::Rule;
use crate::validation::ValidationContext;
use crate::Name;
use crate::Node;
use crate::Schema;
use std::collections::HashMap;

/// Whose arguments are being validated, for error messages
#[derive(Clone, Copy)]
pub(crate) enum ArgumentsOf<'a> {
    Field { name: &'a Name, parent_type: &'a str },
    Directive(&'a Name),
}

pub(crate) fn validate_arguments(
    ctx: &mut ValidationContext<'_>,
    arguments: &[Node<ast::Argument>],
    definitions: &[Node<ast::InputValueDefinition>],
    owner: ArgumentsOf<'_>,
    location: Option<crate::Location>,
) {
    let mut seen: HashMap<&Name, &Node<ast::Argument>> = HashMap::new();
    for argument in arguments {
        if let Some(original) = seen.get(&argument.name) {
            ctx.report(
                Rule::UniqueArgumentNames,
                format!(r#"There can be only one argument named "{}"."#, argument.name),
                [original.location(), argument.location()],
            );
            continue;
        }
        seen.insert(&argument.name, argument);

        validate_unique_input_fields(ctx, &argument.value);
        let Some(definition) = definitions.iter().find(|def| def.name == argument.name) else {
            let message = match owner {
                ArgumentsOf::Field { name, parent_type } => format!(
                    r#"Unknown argument "{}" on field "{name}" of type "{parent_type}"."#,
                    argument.name
                ),
                ArgumentsOf::Directive(name) => {
                    format!(r#"Unknown argument "{}" on directive "@{name}"."#, argument.name)
                }
            };
            ctx.report(Rule::KnownArgumentNames, message, [argument.location()]);
            continue;
        };
        if !is_valid_literal(ctx.schema, &argument.value, &definition.ty) {
            ctx.report(
                Rule::ArgumentsOfCorrectType,
                format!(
                    "Argument \"{}\" has invalid value {}.\nExpected type \"{}\", found {}.",
                    argument.name, argument.value, definition.ty, argument.value
                ),
                [argument.value.location()],
            );
        }
    }

    for definition in definitions {
        let required = definition.ty.is_non_null() && definition.default_value.is_none();
        if required && !seen.contains_key(&definition.name) {
            let message = match owner {
                ArgumentsOf::Field { name, .. } => format!(
                    r#"Field "{name}" argument "{}" of type "{}" is required but not provided."#,
                    definition.name, definition.ty
                ),
                ArgumentsOf::Directive(name) => format!(
                    r#"Directive "@{name}" argument "{}" of type "{}" is required but not provided."#,
                    definition.name, definition.ty
                ),
            };
            ctx.report(Rule::ProvidedNonNullArguments, message, [location]);
        }
    }
}

/// Object literals must not repeat a field name, at any nesting level.
pub(crate) fn validate_unique_input_fields(ctx: &mut ValidationContext<'_>, value: &Node<Value>) {
    match value.as_ref() {
        Value::List(items) => {
            for item in items {
                validate_unique_input_fields(ctx, item)
            }
        }
        Value::Object(fields) => {
            let mut seen: HashMap<&Name, &Node<Value>> = HashMap::new();
            for (name, field_value) in fields {
                if let Some(original) = seen.insert(name, field_value) {
                    ctx.report(
                        Rule::UniqueInputFieldNames,
                        format!(r#"There can be only one input field named "{name}"."#),
                        [original.location(), field_value.location()],
                    );
                }
                validate_unique_input_fields(ctx, field_value);
            }
        }
        _ => {}
    }
}

/// Returns whether a literal can be coerced to `ty`.
///
/// Variables are accepted here: their types are checked against the
/// position they are used in by `VariablesInAllowedPosition`.
pub(crate) fn is_valid_literal(schema: &Schema, value: &Value, ty: &Type) -> bool {
    if let Value::Variable(_) = value {
        return true;
    }
    match ty {
        Type::NonNull(inner) => !value.is_null() && is_valid_literal(schema, value, inner),
        _ if value.is_null() => true,
        Type::List(item_type) => match value {
            Value::List(items) => items
                .iter()
                .all(|item| is_valid_literal(schema, item, item_type)),
            // A single value is coerced to a list of one
            _ => is_valid_literal(schema, value, item_type),
        },
        Type::Named(name) => match schema.types.get(name) {
            Some(ExtendedType::Scalar(_)) => match name.as_str() {
                "Int" => value.to_i32().is_some(),
                "Float" => matches!(value, Value::Int(_) | Value::Float(_)),
                "String" => matches!(value, Value::String(_)),
                "Boolean" => matches!(value, Value::Boolean(_)),
                "ID" => matches!(value, Value::String(_) | Value::Int(_)),
                // Custom scalars accept any literal
                _ => true,
            },
            Some(ExtendedType::Enum(def)) => value
                .as_enum()
                .is_some_and(|value| def.values.contains_key(value)),
            Some(ExtendedType::InputObject(def)) => {
                let Value::Object(fields) = value else {
                    return false;
                };
                let all_known = fields.iter().all(|(name, field_value)| {
                    def.fields
                        .get(name)
                        .is_some_and(|field_def| is_valid_literal(schema, field_value, &field_def.ty))
                });
                let required_present = def.fields.values().all(|field_def| {
                    !field_def.ty.is_non_null()
                        || field_def.default_value.is_some()
                        || fields.iter().any(|(name, _)| *name == field_def.name)
                });
                all_known && required_present
            }
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::validation::test_helpers::*;
    use crate::validation::Rule;

    #[test]
    fn argument_rules() {
        assert_eq!(
            errors(r#"{ human(id: "1", id: "2") { name } }"#),
            [(
                Rule::UniqueArgumentNames,
                r#"There can be only one argument named "id"."#.to_owned()
            )]
        );
        assert_eq!(
            errors(r#"{ hero(season: 1) { name } }"#),
            [(
                Rule::KnownArgumentNames,
                r#"Unknown argument "season" on field "hero" of type "Query"."#.to_owned()
            )]
        );
        assert_eq!(
            errors(r#"{ human { name } }"#),
            [(
                Rule::ProvidedNonNullArguments,
                r#"Field "human" argument "id" of type "ID!" is required but not provided."#
                    .to_owned()
            )]
        );
        assert_eq!(
            errors(r#"{ hero(episode: "JEDI") { name } }"#),
            [(
                Rule::ArgumentsOfCorrectType,
                "Argument \"episode\" has invalid value \"JEDI\".\nExpected type \"Episode\", found \"JEDI\"."
                    .to_owned()
            )]
        );
    }

    #[test]
    fn input_object_literals() {
        assert_eq!(
            rules(
                r#"mutation { createReview(episode: JEDI, review: {stars: 5, commentary: "ok"}) { stars } }"#
            ),
            []
        );
        assert_eq!(
            rules(r#"mutation { createReview(episode: JEDI, review: {commentary: "ok"}) { stars } }"#),
            [Rule::ArgumentsOfCorrectType]
        );
        assert_eq!(
            rules(r#"mutation { createReview(episode: JEDI, review: {stars: 5, stars: 4}) { stars } }"#),
            [Rule::UniqueInputFieldNames]
        );
    }

    #[test]
    fn list_coercion_and_nulls() {
        assert_eq!(rules(r#"{ reviews(episode: JEDI, first: null) { stars } }"#), []);
        assert_eq!(
            rules(r#"{ reviews(episode: null) { stars } }"#),
            [Rule::ArgumentsOfCorrectType]
        );
        assert_eq!(
            rules(r#"{ reviews(episode: JEDI, first: 3000000000) { stars } }"#),
            [Rule::ArgumentsOfCorrectType]
        );
    }
}
