use crate::ast;
use crate::ast::DirectiveLocation;
use crate::schema::ExtendedType;
use crate::validation::directive::validate_directives;
use crate::validation::overlap::validate_overlapping_fields;
use crate::validation::value::validate_arguments;
use crate::validation::value::ArgumentsOf;
use crate::validation::Rule;
use crate::validation::ValidationContext;
use crate::Location;
use crate::Name;

/// Validates a selection set whose parent is the composite type `parent_type`.
pub(crate) fn validate_selection_set(
    ctx: &mut ValidationContext<'_>,
    parent_type: &Name,
    selections: &[ast::Selection],
) {
    validate_overlapping_fields(ctx, parent_type, selections);
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => {
                validate_directives(ctx, &field.directives, DirectiveLocation::Field);
                validate_field(ctx, parent_type, field, field.location());
            }
            ast::Selection::FragmentSpread(spread) => {
                validate_directives(ctx, &spread.directives, DirectiveLocation::FragmentSpread);
                let Some(fragment) = ctx.fragment(&spread.fragment_name) else {
                    ctx.report(
                        Rule::KnownFragmentNames,
                        format!(r#"Unknown fragment "{}"."#, spread.fragment_name),
                        [spread.location()],
                    );
                    continue;
                };
                if !can_spread(ctx, parent_type, &fragment.type_condition) {
                    ctx.report(
                        Rule::PossibleFragmentSpreads,
                        format!(
                            r#"Fragment "{}" cannot be spread here as objects of type "{parent_type}" can never be of type "{}"."#,
                            spread.fragment_name, fragment.type_condition
                        ),
                        [spread.location()],
                    );
                }
            }
            ast::Selection::InlineFragment(inline) => {
                validate_directives(ctx, &inline.directives, DirectiveLocation::InlineFragment);
                let type_condition = inline.type_condition.as_ref().unwrap_or(parent_type);
                if !check_type_condition(ctx, type_condition, None, inline.location()) {
                    continue;
                }
                if !can_spread(ctx, parent_type, type_condition) {
                    ctx.report(
                        Rule::PossibleFragmentSpreads,
                        format!(
                            r#"Fragment cannot be spread here as objects of type "{parent_type}" can never be of type "{type_condition}"."#
                        ),
                        [inline.location()],
                    );
                }
                validate_selection_set(ctx, type_condition, &inline.selection_set);
            }
        }
    }
}

fn validate_field(
    ctx: &mut ValidationContext<'_>,
    parent_type: &Name,
    field: &ast::Field,
    location: Option<Location>,
) {
    let schema = ctx.schema;
    let Ok(definition) = schema.type_field(parent_type, &field.name) else {
        ctx.report(
            Rule::FieldsOnCorrectType,
            format!(
                r#"Cannot query field "{}" on type "{parent_type}"."#,
                field.name
            ),
            [location],
        );
        return;
    };
    validate_arguments(
        ctx,
        &field.arguments,
        &definition.arguments,
        ArgumentsOf::Field {
            name: &field.name,
            parent_type,
        },
        location,
    );

    let type_name = definition.ty.inner_named_type();
    let Some(type_def) = schema.types.get(type_name) else {
        return;
    };
    if type_def.is_leaf() {
        if !field.selection_set.is_empty() {
            ctx.report(
                Rule::ScalarLeafs,
                format!(
                    r#"Field "{}" must not have a selection since type "{}" has no subfields."#,
                    field.name, definition.ty
                ),
                [location],
            );
        }
    } else if field.selection_set.is_empty() {
        ctx.report(
            Rule::ScalarLeafs,
            format!(
                r#"Field "{name}" of type "{}" must have a selection of subfields. Did you mean "{name} {{ ... }}"?"#,
                definition.ty,
                name = field.name,
            ),
            [location],
        );
    } else {
        validate_selection_set(ctx, type_name, &field.selection_set);
    }
}

/// Checks that a type condition names a composite type.
///
/// `fragment_name` is `None` for inline fragments.
pub(crate) fn check_type_condition(
    ctx: &mut ValidationContext<'_>,
    type_condition: &Name,
    fragment_name: Option<&Name>,
    location: Option<Location>,
) -> bool {
    let schema = ctx.schema;
    match schema.types.get(type_condition) {
        None => {
            ctx.report(
                Rule::KnownTypeNames,
                format!(r#"Unknown type "{type_condition}"."#),
                [location],
            );
            false
        }
        Some(type_def) if !type_def.is_composite() => {
            let message = match fragment_name {
                Some(name) => format!(
                    r#"Fragment "{name}" cannot condition on non composite type "{type_condition}"."#
                ),
                None => format!(
                    r#"Fragment cannot condition on non composite type "{type_condition}"."#
                ),
            };
            ctx.report(Rule::FragmentsOnCompositeTypes, message, [location]);
            false
        }
        Some(_) => true,
    }
}

/// Whether some object type is possible both for `parent_type` and `fragment_type`.
///
/// Unknown or non-composite fragment types are reported elsewhere and accepted here.
fn can_spread(ctx: &ValidationContext<'_>, parent_type: &str, fragment_type: &str) -> bool {
    let schema = ctx.schema;
    if !schema
        .types
        .get(fragment_type)
        .is_some_and(ExtendedType::is_composite)
    {
        return true;
    }
    let fragment_possible = schema.possible_types(fragment_type);
    schema
        .possible_types(parent_type)
        .iter()
        .any(|name| fragment_possible.contains(name))
}

#[cfg(test)]
mod tests {
    use crate::validation::test_helpers::*;
    use crate::validation::Rule;

    #[test]
    fn fields_on_correct_type() {
        assert_eq!(
            errors("{ hero { name primaryFunction } }"),
            [(
                Rule::FieldsOnCorrectType,
                r#"Cannot query field "primaryFunction" on type "Character"."#.to_owned()
            )]
        );
        assert_eq!(errors("{ hero { ... on Droid { primaryFunction } } }"), []);
        assert_eq!(errors("{ search { __typename } }"), []);
        assert_eq!(
            rules("{ search { name } }"),
            [Rule::FieldsOnCorrectType]
        );
    }

    #[test]
    fn scalar_leafs() {
        assert_eq!(
            errors("{ hero }"),
            [(
                Rule::ScalarLeafs,
                r#"Field "hero" of type "Character" must have a selection of subfields. Did you mean "hero { ... }"?"#
                    .to_owned()
            )]
        );
        assert_eq!(
            errors("{ hero { name { first } } }"),
            [(
                Rule::ScalarLeafs,
                r#"Field "name" must not have a selection since type "String!" has no subfields."#
                    .to_owned()
            )]
        );
    }

    #[test]
    fn inline_fragments() {
        assert_eq!(
            errors("{ hero { ... on Review { stars } } }"),
            [(
                Rule::PossibleFragmentSpreads,
                r#"Fragment cannot be spread here as objects of type "Character" can never be of type "Review"."#
                    .to_owned()
            )]
        );
        assert_eq!(
            errors("{ hero { ... on Episode { name } } }"),
            [(
                Rule::FragmentsOnCompositeTypes,
                r#"Fragment cannot condition on non composite type "Episode"."#.to_owned()
            )]
        );
        assert_eq!(
            rules("{ hero { ... on Wookiee { name } } }"),
            [Rule::KnownTypeNames]
        );
        assert_eq!(errors("{ hero { ... { name } } }"), []);
    }

    #[test]
    fn fragment_spreads() {
        assert_eq!(
            errors("{ hero { ...Missing } }"),
            [(Rule::KnownFragmentNames, r#"Unknown fragment "Missing"."#.to_owned())]
        );
        assert_eq!(
            errors("{ hero { ...R } } fragment R on Review { stars }"),
            [(
                Rule::PossibleFragmentSpreads,
                r#"Fragment "R" cannot be spread here as objects of type "Character" can never be of type "Review"."#
                    .to_owned()
            )]
        );
        assert_eq!(
            errors("{ search { ...C } } fragment C on Character { name }"),
            []
        );
    }
}
