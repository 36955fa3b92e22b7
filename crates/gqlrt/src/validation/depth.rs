use crate::ast;
use crate::validation::Rule;
use crate::validation::ValidationContext;
use crate::Name;
use std::collections::HashSet;

/// Reports fields nested more than `max_depth` levels below an operation root.
///
/// Root fields are at depth 1. Fragments do not add a level of their own.
pub(crate) fn validate_max_depth(ctx: &mut ValidationContext<'_>, max_depth: usize) {
    let document = ctx.document;
    for operation in &document.operations {
        let mut visited = HashSet::new();
        check_depth(ctx, &operation.selection_set, 1, max_depth, &mut visited);
    }
}

fn check_depth<'a>(
    ctx: &mut ValidationContext<'a>,
    selections: &'a [ast::Selection],
    depth: usize,
    max_depth: usize,
    visited_fragments: &mut HashSet<&'a Name>,
) {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => {
                if depth > max_depth {
                    ctx.report(
                        Rule::MaxDepthExceeded,
                        format!(
                            r#"Field "{}" has depth {depth} that exceeds max depth {max_depth}"#,
                            field.name
                        ),
                        [field.location()],
                    );
                    continue;
                }
                check_depth(
                    ctx,
                    &field.selection_set,
                    depth + 1,
                    max_depth,
                    visited_fragments,
                );
            }
            ast::Selection::InlineFragment(inline) => check_depth(
                ctx,
                &inline.selection_set,
                depth,
                max_depth,
                visited_fragments,
            ),
            ast::Selection::FragmentSpread(spread) => {
                if !visited_fragments.insert(&spread.fragment_name) {
                    continue;
                }
                if let Some(fragment) = ctx.fragment(&spread.fragment_name) {
                    check_depth(
                        ctx,
                        &fragment.selection_set,
                        depth,
                        max_depth,
                        visited_fragments,
                    );
                }
                visited_fragments.remove(&spread.fragment_name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::validation::test_helpers::*;
    use crate::validation::Rule;

    #[test]
    fn within_limit() {
        assert_eq!(errors_with_depth("{ hero { friends { name } } }", 3), []);
    }

    #[test]
    fn exceeding_limit_stops_other_rules() {
        assert_eq!(
            errors_with_depth("{ hero { friends { friends { name } } } unknown }", 3),
            [(
                Rule::MaxDepthExceeded,
                r#"Field "name" has depth 4 that exceeds max depth 3"#.to_owned()
            )]
        );
    }

    #[test]
    fn fragments_do_not_add_depth() {
        assert_eq!(
            errors_with_depth(
                "{ hero { ...F } } fragment F on Character { ... on Human { friends { name } } }",
                3
            ),
            []
        );
        assert_eq!(
            rules_with_depth(
                "{ hero { ...F } } fragment F on Character { friends { friends { name } } }",
                3
            ),
            [Rule::MaxDepthExceeded]
        );
    }

    #[test]
    fn cyclic_fragments_terminate() {
        assert_eq!(
            errors_with_depth("{ hero { ...A } } fragment A on Character { ...A }", 10),
            [(
                Rule::NoFragmentCycles,
                r#"Cannot spread fragment "A" within itself."#.to_owned()
            )]
        );
    }

    fn rules_with_depth(query: &str, max_depth: usize) -> Vec<Rule> {
        errors_with_depth(query, max_depth)
            .into_iter()
            .map(|(rule, _)| rule)
            .collect()
    }
}
