use crate::ast;
use crate::ast::DirectiveLocation;
use crate::ast::Type;
use crate::ast::Value;
use crate::schema::ExtendedType;
use crate::validation::directive::validate_directives;
use crate::validation::value::is_valid_literal;
use crate::validation::value::validate_unique_input_fields;
use crate::validation::Rule;
use crate::validation::ValidationContext;
use crate::Location;
use crate::Name;
use crate::Node;
use std::collections::HashMap;
use std::collections::HashSet;

/// A variable referenced somewhere in an operation or the fragments it spreads
struct VariableUsage<'a> {
    name: &'a Name,
    /// Type of the position, when the position is known to the schema
    expected: Option<&'a Type>,
    /// The position has its own default, so a nullable variable may fill a non-null slot
    has_location_default: bool,
    location: Option<Location>,
}

pub(crate) fn validate_variables(
    ctx: &mut ValidationContext<'_>,
    operation: &Node<ast::OperationDefinition>,
) {
    let schema = ctx.schema;
    let mut defined: HashMap<&Name, &Node<ast::VariableDefinition>> = HashMap::new();
    for variable in &operation.variables {
        validate_directives(ctx, &variable.directives, DirectiveLocation::VariableDefinition);
        if let Some(original) = defined.get(&variable.name) {
            ctx.report(
                Rule::UniqueVariableNames,
                format!(r#"There can be only one variable named "${}"."#, variable.name),
                [original.location(), variable.location()],
            );
            continue;
        }
        defined.insert(&variable.name, variable);

        let type_name = variable.ty.inner_named_type();
        if !schema.types.contains_key(type_name) {
            ctx.report(
                Rule::KnownTypeNames,
                format!(r#"Unknown type "{type_name}"."#),
                [variable.ty.location()],
            );
            continue;
        }
        if !schema.is_input_type(&variable.ty) {
            ctx.report(
                Rule::VariablesAreInputTypes,
                format!(
                    r#"Variable "${}" cannot be non-input type "{}"."#,
                    variable.name, variable.ty
                ),
                [variable.ty.location()],
            );
            continue;
        }
        if let Some(default) = &variable.default_value {
            validate_unique_input_fields(ctx, default);
            if !is_valid_literal(schema, default, &variable.ty) {
                ctx.report(
                    Rule::DefaultValuesOfCorrectType,
                    format!(
                        "Variable \"${name}\" of type \"{ty}\" has invalid default value {default}.\nExpected type \"{ty}\", found {default}.",
                        name = variable.name,
                        ty = variable.ty,
                        default = default,
                    ),
                    [default.location()],
                );
            }
        }
    }

    let mut usages = Vec::new();
    let root_type = schema.root_operation(operation.operation_type);
    collect_in_directives(ctx, &operation.directives, &mut usages);
    collect_usages(
        ctx,
        root_type,
        &operation.selection_set,
        &mut HashSet::new(),
        &mut usages,
    );

    let mut used = HashSet::new();
    for usage in &usages {
        used.insert(usage.name);
        let Some(definition) = defined.get(usage.name) else {
            let message = match &operation.name {
                Some(op) => format!(
                    r#"Variable "${}" is not defined by operation "{op}"."#,
                    usage.name
                ),
                None => format!(r#"Variable "${}" is not defined."#, usage.name),
            };
            ctx.report(
                Rule::NoUndefinedVariables,
                message,
                [usage.location, operation.location()],
            );
            continue;
        };
        let Some(expected) = usage.expected else {
            continue;
        };
        if !allowed_in_position(definition, usage, expected) {
            ctx.report(
                Rule::VariablesInAllowedPosition,
                format!(
                    r#"Variable "${}" of type "{}" used in position expecting type "{expected}"."#,
                    usage.name, definition.ty
                ),
                [definition.location(), usage.location],
            );
        }
    }

    for variable in &operation.variables {
        if used.contains(&variable.name) {
            continue;
        }
        let message = match &operation.name {
            Some(op) => format!(
                r#"Variable "${}" is never used in operation "{op}"."#,
                variable.name
            ),
            None => format!(r#"Variable "${}" is never used."#, variable.name),
        };
        ctx.report(Rule::NoUnusedVariables, message, [variable.location()]);
    }
}

fn allowed_in_position(
    definition: &ast::VariableDefinition,
    usage: &VariableUsage<'_>,
    expected: &Type,
) -> bool {
    let has_default = definition
        .default_value
        .as_ref()
        .is_some_and(|value| !value.is_null());
    if expected.is_non_null() && !definition.ty.is_non_null() {
        if !(has_default || usage.has_location_default) {
            return false;
        }
        return definition.ty.is_assignable_to(expected.nullable());
    }
    definition.ty.is_assignable_to(expected)
}

fn collect_usages<'a>(
    ctx: &ValidationContext<'a>,
    parent_type: Option<&'a Name>,
    selections: &'a [ast::Selection],
    visited_fragments: &mut HashSet<&'a Name>,
    usages: &mut Vec<VariableUsage<'a>>,
) {
    let schema = ctx.schema;
    for selection in selections {
        collect_in_directives(ctx, selection.directives(), usages);
        match selection {
            ast::Selection::Field(field) => {
                let definition =
                    parent_type.and_then(|parent| schema.type_field(parent, &field.name).ok());
                for argument in &field.arguments {
                    let arg_def = definition.and_then(|def| {
                        def.arguments.iter().find(|arg| arg.name == argument.name)
                    });
                    collect_in_value(
                        ctx,
                        &argument.value,
                        arg_def.map(|def| &*def.ty),
                        arg_def.is_some_and(|def| def.default_value.is_some()),
                        usages,
                    );
                }
                let field_type = definition.map(|def| def.ty.inner_named_type());
                collect_usages(ctx, field_type, &field.selection_set, visited_fragments, usages);
            }
            ast::Selection::InlineFragment(inline) => {
                let type_condition = inline.type_condition.as_ref().or(parent_type);
                collect_usages(
                    ctx,
                    type_condition,
                    &inline.selection_set,
                    visited_fragments,
                    usages,
                );
            }
            ast::Selection::FragmentSpread(spread) => {
                if !visited_fragments.insert(&spread.fragment_name) {
                    continue;
                }
                if let Some(fragment) = ctx.fragment(&spread.fragment_name) {
                    collect_in_directives(ctx, &fragment.directives, usages);
                    collect_usages(
                        ctx,
                        Some(&fragment.type_condition),
                        &fragment.selection_set,
                        visited_fragments,
                        usages,
                    );
                }
            }
        }
    }
}

fn collect_in_directives<'a>(
    ctx: &ValidationContext<'a>,
    directives: &'a ast::DirectiveList,
    usages: &mut Vec<VariableUsage<'a>>,
) {
    for directive in directives {
        let definition = ctx.schema.directive_definitions.get(&directive.name);
        for argument in &directive.arguments {
            let arg_def = definition
                .and_then(|def| def.arguments.iter().find(|arg| arg.name == argument.name));
            collect_in_value(
                ctx,
                &argument.value,
                arg_def.map(|def| &*def.ty),
                arg_def.is_some_and(|def| def.default_value.is_some()),
                usages,
            );
        }
    }
}

fn collect_in_value<'a>(
    ctx: &ValidationContext<'a>,
    value: &'a Node<Value>,
    expected: Option<&'a Type>,
    has_location_default: bool,
    usages: &mut Vec<VariableUsage<'a>>,
) {
    match &**value {
        Value::Variable(name) => usages.push(VariableUsage {
            name,
            expected,
            has_location_default,
            location: value.location(),
        }),
        Value::List(items) => {
            let item_type = expected.map(|ty| match ty.nullable() {
                Type::List(item) => &**item,
                // A single value coerced to a list of one
                other => other,
            });
            for item in items {
                collect_in_value(ctx, item, item_type, false, usages);
            }
        }
        Value::Object(fields) => {
            let input_object = expected.and_then(|ty| {
                match ctx.schema.types.get(ty.inner_named_type()) {
                    Some(ExtendedType::InputObject(def)) => Some(def),
                    _ => None,
                }
            });
            for (name, field_value) in fields {
                let field_def = input_object.and_then(|def| def.fields.get(name));
                collect_in_value(
                    ctx,
                    field_value,
                    field_def.map(|def| &*def.ty),
                    field_def.is_some_and(|def| def.default_value.is_some()),
                    usages,
                );
            }
        }
        _ => {}
    }
}
