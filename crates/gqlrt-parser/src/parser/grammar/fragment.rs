use crate::ast::FragmentDefinition;
use crate::ast::FragmentSpread;
use crate::ast::InlineFragment;
use crate::ast::Selection;
use crate::parser::grammar::directive;
use crate::parser::grammar::selection;
use crate::parser::grammar::value::Constness;
use crate::parser::ParseContext;
use crate::Node;
use crate::SyntaxError;
use crate::TokenKind;

/// See: https://spec.graphql.org/October2021/#FragmentDefinition
///
/// *FragmentDefinition*:
///     **fragment** FragmentName TypeCondition Directives? SelectionSet
pub(crate) fn fragment_definition(
    p: &mut ParseContext,
) -> Result<Node<FragmentDefinition>, SyntaxError> {
    let location = p.location()?;
    p.expect_keyword("fragment")?;
    let name = fragment_name(p)?;
    p.expect_keyword("on")?;
    let type_condition = p.name()?;
    let directives = directive::directives(p, Constness::NotConst)?;
    let selection_set = selection::selection_set(p)?;
    Ok(Node::new_parsed(
        FragmentDefinition {
            name,
            type_condition,
            directives,
            selection_set,
        },
        location,
    ))
}

/// See: https://spec.graphql.org/October2021/#FragmentName
///
/// *FragmentName*:
///     Name *but not* **on**
fn fragment_name(p: &mut ParseContext) -> Result<crate::Name, SyntaxError> {
    if p.at_keyword("on")? {
        return Err(p.unexpected("fragment name"));
    }
    p.name()
}

/// See: https://spec.graphql.org/October2021/#FragmentSpread
/// and https://spec.graphql.org/October2021/#InlineFragment
///
/// *FragmentSpread*:
///     **...** FragmentName Directives?
///
/// *InlineFragment*:
///     **...** TypeCondition? Directives? SelectionSet
pub(crate) fn spread_or_inline_fragment(p: &mut ParseContext) -> Result<Selection, SyntaxError> {
    let location = p.location()?;
    p.expect(TokenKind::Spread)?;

    if p.at(TokenKind::Name)? && !p.at_keyword("on")? {
        let fragment_name = p.name()?;
        let directives = directive::directives(p, Constness::NotConst)?;
        let spread = FragmentSpread {
            fragment_name,
            directives,
        };
        return Ok(Selection::FragmentSpread(Node::new_parsed(spread, location)));
    }

    let type_condition = if p.eat_keyword("on")? {
        Some(p.name()?)
    } else {
        None
    };
    let directives = directive::directives(p, Constness::NotConst)?;
    let selection_set = selection::selection_set(p)?;
    let inline = InlineFragment {
        type_condition,
        directives,
        selection_set,
    };
    Ok(Selection::InlineFragment(Node::new_parsed(inline, location)))
}
