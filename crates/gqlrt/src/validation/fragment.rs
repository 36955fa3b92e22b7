use crate::ast;
use crate::ast::DirectiveLocation;
use crate::validation::directive::validate_directives;
use crate::validation::field::check_type_condition;
use crate::validation::field::validate_selection_set;
use crate::validation::fragment_spreads;
use crate::validation::Rule;
use crate::validation::ValidationContext;
use crate::Name;
use crate::Node;
use std::collections::HashMap;
use std::collections::HashSet;

pub(crate) fn validate_fragment_definitions(ctx: &mut ValidationContext<'_>) {
    let document = ctx.document;
    let mut seen: HashMap<&Name, &Node<ast::FragmentDefinition>> = HashMap::new();
    for fragment in &document.fragments {
        if let Some(original) = seen.get(&fragment.name) {
            ctx.report(
                Rule::UniqueFragmentNames,
                format!(r#"There can be only one fragment named "{}"."#, fragment.name),
                [original.location(), fragment.location()],
            );
        } else {
            seen.insert(&fragment.name, fragment);
        }
        validate_directives(ctx, &fragment.directives, DirectiveLocation::FragmentDefinition);
        if check_type_condition(
            ctx,
            &fragment.type_condition,
            Some(&fragment.name),
            fragment.location(),
        ) {
            validate_selection_set(ctx, &fragment.type_condition, &fragment.selection_set);
        }
    }
    validate_unused_fragments(ctx);
    validate_fragment_cycles(ctx);
}

/// Every fragment must be reachable from some operation.
fn validate_unused_fragments(ctx: &mut ValidationContext<'_>) {
    let document = ctx.document;
    let mut used = HashSet::new();
    let mut stack = Vec::new();
    for operation in &document.operations {
        fragment_spreads(&operation.selection_set, &mut stack);
    }
    while let Some(spread) = stack.pop() {
        if used.insert(&spread.fragment_name) {
            if let Some(fragment) = ctx.fragment(&spread.fragment_name) {
                fragment_spreads(&fragment.selection_set, &mut stack);
            }
        }
    }
    for fragment in &document.fragments {
        if !used.contains(&fragment.name) {
            ctx.report(
                Rule::NoUnusedFragments,
                format!(r#"Fragment "{}" is never used."#, fragment.name),
                [fragment.location()],
            );
        }
    }
}

/// Depth-first search for spreads leading back to a fragment on the current path.
fn validate_fragment_cycles(ctx: &mut ValidationContext<'_>) {
    let document = ctx.document;
    let mut visited = HashSet::new();
    for fragment in &document.fragments {
        if visited.contains(&fragment.name) {
            continue;
        }
        let mut path = Vec::new();
        let mut path_index = HashMap::new();
        detect_cycles(ctx, fragment, &mut visited, &mut path, &mut path_index);
    }
}

fn detect_cycles<'a>(
    ctx: &mut ValidationContext<'a>,
    fragment: &'a Node<ast::FragmentDefinition>,
    visited: &mut HashSet<&'a Name>,
    path: &mut Vec<&'a Node<ast::FragmentSpread>>,
    path_index: &mut HashMap<&'a Name, usize>,
) {
    if !visited.insert(&fragment.name) {
        return;
    }
    let mut spreads = Vec::new();
    fragment_spreads(&fragment.selection_set, &mut spreads);
    if spreads.is_empty() {
        return;
    }
    path_index.insert(&fragment.name, path.len());
    for spread in spreads {
        match path_index.get(&spread.fragment_name) {
            None => {
                path.push(spread);
                if let Some(target) = ctx.fragment(&spread.fragment_name) {
                    detect_cycles(ctx, target, visited, path, path_index);
                }
                path.pop();
            }
            Some(&start) => {
                let cycle = &path[start..];
                let via = cycle
                    .iter()
                    .map(|spread| format!(r#""{}""#, spread.fragment_name))
                    .collect::<Vec<_>>()
                    .join(", ");
                let message = if via.is_empty() {
                    format!(
                        r#"Cannot spread fragment "{}" within itself."#,
                        spread.fragment_name
                    )
                } else {
                    format!(
                        r#"Cannot spread fragment "{}" within itself via {via}."#,
                        spread.fragment_name
                    )
                };
                let locations = cycle
                    .iter()
                    .map(|spread| spread.location())
                    .chain([spread.location()])
                    .collect::<Vec<_>>();
                ctx.report(Rule::NoFragmentCycles, message, locations);
            }
        }
    }
    path_index.remove(&fragment.name);
}

#[cfg(test)]
mod tests {
    use crate::validation::test_helpers::*;
    use crate::validation::Rule;

    #[test]
    fn unique_fragment_names() {
        assert_eq!(
            rules("{ hero { ...F } } fragment F on Character { name } fragment F on Character { id }"),
            [Rule::UniqueFragmentNames]
        );
    }

    #[test]
    fn unused_fragments() {
        assert_eq!(
            errors("{ hero { ...A } } fragment A on Character { ...B } fragment B on Character { name } fragment C on Droid { name }"),
            [(Rule::NoUnusedFragments, r#"Fragment "C" is never used."#.to_owned())]
        );
    }

    #[test]
    fn fragment_cycles() {
        assert_eq!(
            errors("{ hero { ...A } } fragment A on Character { ...A }"),
            [(
                Rule::NoFragmentCycles,
                r#"Cannot spread fragment "A" within itself."#.to_owned()
            )]
        );
        assert_eq!(
            errors(
                "{ hero { ...A } } fragment A on Character { friends { ...B } } fragment B on Character { ...C } fragment C on Character { ...A }"
            ),
            [(
                Rule::NoFragmentCycles,
                r#"Cannot spread fragment "A" within itself via "B", "C"."#.to_owned()
            )]
        );
    }

    #[test]
    fn fragment_on_scalar() {
        assert_eq!(
            errors("{ hero { name } } fragment F on Episode { name }"),
            [
                (
                    Rule::FragmentsOnCompositeTypes,
                    r#"Fragment "F" cannot condition on non composite type "Episode"."#.to_owned()
                ),
                (Rule::NoUnusedFragments, r#"Fragment "F" is never used."#.to_owned()),
            ]
        );
    }
}
