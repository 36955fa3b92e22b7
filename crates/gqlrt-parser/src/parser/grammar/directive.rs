use crate::ast::Argument;
use crate::ast::Directive;
use crate::ast::DirectiveList;
use crate::parser::grammar::value;
use crate::parser::grammar::value::Constness;
use crate::parser::ParseContext;
use crate::Node;
use crate::SyntaxError;
use crate::TokenKind;

/// See: https://spec.graphql.org/October2021/#Directives
///
/// *Directives[Const]*:
///     Directive[?Const]*
pub(crate) fn directives(
    p: &mut ParseContext,
    constness: Constness,
) -> Result<DirectiveList, SyntaxError> {
    let mut list = DirectiveList::new();
    while p.at(TokenKind::At)? {
        list.push(directive(p, constness)?);
    }
    Ok(list)
}

/// See: https://spec.graphql.org/October2021/#Directive
///
/// *Directive[Const]*:
///     **@** Name Arguments[?Const]?
fn directive(p: &mut ParseContext, constness: Constness) -> Result<Node<Directive>, SyntaxError> {
    let location = p.location()?;
    p.expect(TokenKind::At)?;
    let name = p.name()?;
    let arguments = arguments(p, constness)?;
    Ok(Node::new_parsed(Directive { name, arguments }, location))
}

/// See: https://spec.graphql.org/October2021/#Arguments
///
/// *Arguments[Const]*:
///     **(** Argument[?Const]+ **)**
///
/// *Argument[Const]*:
///     Name **:** Value[?Const]
pub(crate) fn arguments(
    p: &mut ParseContext,
    constness: Constness,
) -> Result<Vec<Node<Argument>>, SyntaxError> {
    let mut arguments = Vec::new();
    if !p.eat(TokenKind::LParen)? {
        return Ok(arguments);
    }
    loop {
        let location = p.location()?;
        let name = p.name()?;
        p.expect(TokenKind::Colon)?;
        let value = value::value_node(p, constness)?;
        arguments.push(Node::new_parsed(Argument { name, value }, location));
        if p.eat(TokenKind::RParen)? {
            return Ok(arguments);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Parser;

    #[test]
    fn empty_arguments_are_rejected() {
        let err = Parser::new().parse_query("{ hero @include() }").unwrap_err();
        assert_eq!(err.message(), r#"unexpected ")", expecting Name"#);
    }

    #[test]
    fn schema_directives_are_constant() {
        let err = Parser::new()
            .parse_schema("type Query @cost(weight: $w) { a: Int }")
            .unwrap_err();
        assert_eq!(err.message(), "unexpected variable in constant value");
        assert_eq!(err.location().column, 26);
    }
}
