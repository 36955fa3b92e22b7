use crate::ast::Field;
use crate::ast::Selection;
use crate::parser::grammar::directive;
use crate::parser::grammar::fragment;
use crate::parser::grammar::value::Constness;
use crate::parser::ParseContext;
use crate::Node;
use crate::SyntaxError;
use crate::TokenKind;

/// See: https://spec.graphql.org/October2021/#SelectionSet
///
/// *SelectionSet*:
///     **{** Selection+ **}**
pub(crate) fn selection_set(p: &mut ParseContext) -> Result<Vec<Selection>, SyntaxError> {
    p.recurse(|p| {
        p.expect(TokenKind::LCurly)?;
        let mut selections = vec![selection(p)?];
        while !p.eat(TokenKind::RCurly)? {
            selections.push(selection(p)?);
        }
        Ok(selections)
    })
}

/// See: https://spec.graphql.org/October2021/#Selection
///
/// *Selection*:
///     Field
///     FragmentSpread
///     InlineFragment
fn selection(p: &mut ParseContext) -> Result<Selection, SyntaxError> {
    match p.peek_kind()? {
        TokenKind::Spread => fragment::spread_or_inline_fragment(p),
        TokenKind::Name => Ok(Selection::Field(field(p)?)),
        _ => Err(p.unexpected("Name")),
    }
}

/// See: https://spec.graphql.org/October2021/#Field
///
/// *Field*:
///     Alias? Name Arguments? Directives? SelectionSet?
fn field(p: &mut ParseContext) -> Result<Node<Field>, SyntaxError> {
    let location = p.location()?;
    let mut name = p.name()?;
    let mut alias = None;
    if p.eat(TokenKind::Colon)? {
        alias = Some(name);
        name = p.name()?;
    }
    let arguments = directive::arguments(p, Constness::NotConst)?;
    let directives = directive::directives(p, Constness::NotConst)?;
    let selection_set = if p.at(TokenKind::LCurly)? {
        selection_set(p)?
    } else {
        Vec::new()
    };
    Ok(Node::new_parsed(
        Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
        },
        location,
    ))
}

#[cfg(test)]
mod tests {
    use crate::ast::Selection;
    use crate::Location;
    use crate::Parser;

    #[test]
    fn empty_selection_set() {
        let err = Parser::new().parse_query("{ hero { } }").unwrap_err();
        assert_eq!(err.message(), r#"unexpected "}", expecting Name"#);
        assert_eq!(err.location(), Location::new(1, 10));
    }

    #[test]
    fn field_locations() {
        let doc = Parser::new()
            .parse_query("{\n  hero {\n    friend: name\n  }\n}")
            .unwrap();
        let Selection::Field(hero) = &doc.operations[0].selection_set[0] else {
            panic!("expected a field")
        };
        assert_eq!(hero.location(), Some(Location::new(2, 3)));
        let Selection::Field(name) = &hero.selection_set[0] else {
            panic!("expected a field")
        };
        assert_eq!(name.alias.as_deref(), Some("friend"));
        assert_eq!(name.name, "name");
        assert_eq!(name.location(), Some(Location::new(3, 5)));
    }

    #[test]
    fn deep_selection_sets_hit_the_recursion_limit() {
        let depth = 40;
        let query = format!("{}{}", "{ a ".repeat(depth), "}".repeat(depth));
        assert!(Parser::new().parse_query(&query).is_ok());
        let err = Parser::new().recursion_limit(10).parse_query(&query).unwrap_err();
        assert_eq!(err.message(), "parser recursion limit reached");
    }
}
