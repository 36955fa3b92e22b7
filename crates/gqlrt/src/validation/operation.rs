use crate::ast;
use crate::ast::DirectiveLocation;
use crate::validation::directive::validate_directives;
use crate::validation::field::validate_selection_set;
use crate::validation::Rule;
use crate::validation::ValidationContext;
use crate::Name;
use crate::Node;
use std::collections::HashMap;
use std::collections::HashSet;

pub(crate) fn validate_operations(ctx: &mut ValidationContext<'_>) {
    let document = ctx.document;
    let anonymous_allowed = document.operations.len() <= 1;
    let mut seen: HashMap<&Name, &Node<ast::OperationDefinition>> = HashMap::new();
    for operation in &document.operations {
        match &operation.name {
            None if !anonymous_allowed => ctx.report(
                Rule::LoneAnonymousOperation,
                "This anonymous operation must be the only defined operation.",
                [operation.location()],
            ),
            None => {}
            Some(name) => {
                if let Some(original) = seen.get(name) {
                    ctx.report(
                        Rule::UniqueOperationNames,
                        format!(r#"There can be only one operation named "{name}"."#),
                        [original.location(), operation.location()],
                    );
                } else {
                    seen.insert(name, operation);
                }
            }
        }
        validate_operation(ctx, operation);
    }
}

fn validate_operation(ctx: &mut ValidationContext<'_>, operation: &ast::OperationDefinition) {
    validate_directives(
        ctx,
        &operation.directives,
        DirectiveLocation::from(operation.operation_type),
    );
    let schema = ctx.schema;
    let Some(root_type) = schema.root_operation(operation.operation_type) else {
        ctx.report(
            Rule::KnownOperationTypes,
            format!(
                r#"Schema does not support operation type "{}"."#,
                operation.operation_type.name()
            ),
            [operation
                .selection_set
                .first()
                .and_then(ast::Selection::location)],
        );
        return;
    };
    if operation.operation_type.is_subscription() {
        let mut keys = HashSet::new();
        let mut visited = HashSet::new();
        collect_response_keys(ctx, &operation.selection_set, &mut visited, &mut keys);
        if keys.len() > 1 {
            let message = match &operation.name {
                Some(name) => {
                    format!(r#"Subscription "{name}" must select only one top level field."#)
                }
                None => "Anonymous Subscription must select only one top level field.".to_owned(),
            };
            ctx.report(
                Rule::SingleFieldSubscriptions,
                message,
                [operation.selection_set.get(1).and_then(ast::Selection::location)],
            );
        }
    }
    validate_selection_set(ctx, root_type, &operation.selection_set);
}

fn collect_response_keys<'a>(
    ctx: &ValidationContext<'a>,
    selections: &'a [ast::Selection],
    visited_fragments: &mut HashSet<&'a Name>,
    keys: &mut HashSet<&'a Name>,
) {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => {
                keys.insert(field.response_key());
            }
            ast::Selection::InlineFragment(inline) => {
                collect_response_keys(ctx, &inline.selection_set, visited_fragments, keys)
            }
            ast::Selection::FragmentSpread(spread) => {
                if visited_fragments.insert(&spread.fragment_name) {
                    if let Some(fragment) = ctx.fragment(&spread.fragment_name) {
                        collect_response_keys(ctx, &fragment.selection_set, visited_fragments, keys)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::validation::test_helpers::*;
    use crate::validation::Rule;

    #[test]
    fn lone_anonymous_operation() {
        assert_eq!(
            errors("{ hero { name } } query Named { hero { name } }"),
            [(
                Rule::LoneAnonymousOperation,
                "This anonymous operation must be the only defined operation.".to_owned()
            )]
        );
    }

    #[test]
    fn unique_operation_names() {
        assert_eq!(
            errors("query A { hero { name } } query A { hero { id } }"),
            [(
                Rule::UniqueOperationNames,
                r#"There can be only one operation named "A"."#.to_owned()
            )]
        );
    }

    #[test]
    fn single_field_subscriptions() {
        assert_eq!(errors("subscription { reviewAdded { stars } }"), []);
        assert_eq!(
            errors("subscription S { reviewAdded { stars } __typename }"),
            [(
                Rule::SingleFieldSubscriptions,
                r#"Subscription "S" must select only one top level field."#.to_owned()
            )]
        );
    }

    #[test]
    fn known_operation_types() {
        let schema = crate::Schema::parse("type Query { a: Int }").unwrap();
        let document = crate::ast::QueryDocument::parse("mutation { a }").unwrap();
        let errors = crate::validation::validate(&schema, &document, 0);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, Rule::KnownOperationTypes);
        assert_eq!(
            errors[0].message,
            r#"Schema does not support operation type "mutation"."#
        );
    }
}
