use crate::ast;
use crate::ast::DirectiveLocation;
use crate::validation::value::validate_arguments;
use crate::validation::value::ArgumentsOf;
use crate::validation::Rule;
use crate::validation::ValidationContext;
use crate::Name;
use crate::Node;
use std::collections::HashMap;

pub(crate) fn validate_directives(
    ctx: &mut ValidationContext<'_>,
    directives: &ast::DirectiveList,
    location: DirectiveLocation,
) {
    let mut seen: HashMap<&Name, &Node<ast::Directive>> = HashMap::new();
    for directive in directives {
        let Some(definition) = ctx.schema.directive_definitions.get(&directive.name) else {
            ctx.report(
                Rule::KnownDirectives,
                format!(r#"Unknown directive "{}"."#, directive.name),
                [directive.location()],
            );
            continue;
        };
        if !definition.locations.contains(&location) {
            ctx.report(
                Rule::KnownDirectives,
                format!(
                    r#"Directive "{}" may not be used on {}."#,
                    directive.name,
                    location.name()
                ),
                [directive.location()],
            );
        }
        if !definition.repeatable {
            if let Some(original) = seen.insert(&directive.name, directive) {
                ctx.report(
                    Rule::UniqueDirectivesPerLocation,
                    format!(
                        r#"The directive "{}" can only be used once at this location."#,
                        directive.name
                    ),
                    [original.location(), directive.location()],
                );
            }
        }
        validate_arguments(
            ctx,
            &directive.arguments,
            &definition.arguments,
            ArgumentsOf::Directive(&directive.name),
            directive.location(),
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::validation::test_helpers::*;
    use crate::validation::Rule;

    #[test]
    fn known_directives() {
        assert_eq!(
            errors("{ hero @unknown { name } }"),
            [(Rule::KnownDirectives, r#"Unknown directive "unknown"."#.to_owned())]
        );
        assert_eq!(
            errors("query @skip(if: true) { hero { name } }"),
            [(
                Rule::KnownDirectives,
                r#"Directive "skip" may not be used on QUERY."#.to_owned()
            )]
        );
    }

    #[test]
    fn directive_arguments() {
        assert_eq!(
            errors("{ hero @skip { name } }"),
            [(
                Rule::ProvidedNonNullArguments,
                r#"Directive "@skip" argument "if" of type "Boolean!" is required but not provided."#
                    .to_owned()
            )]
        );
        assert_eq!(
            rules("{ hero @include(if: true, unless: false) { name } }"),
            [Rule::KnownArgumentNames]
        );
    }

    #[test]
    fn unique_directives() {
        assert_eq!(
            rules("{ hero @skip(if: false) @skip(if: false) { name } }"),
            [Rule::UniqueDirectivesPerLocation]
        );
    }
}
