use crate::ast::DirectiveList;
use crate::ast::OperationDefinition;
use crate::ast::OperationType;
use crate::ast::VariableDefinition;
use crate::parser::grammar::directive;
use crate::parser::grammar::selection;
use crate::parser::grammar::ty;
use crate::parser::grammar::value;
use crate::parser::grammar::value::Constness;
use crate::parser::ParseContext;
use crate::Node;
use crate::SyntaxError;
use crate::TokenKind;

/// See: https://spec.graphql.org/October2021/#OperationDefinition
///
/// *OperationDefinition*:
///     OperationType Name? VariableDefinitions? Directives? SelectionSet
///     SelectionSet
pub(crate) fn operation_definition(
    p: &mut ParseContext,
) -> Result<Node<OperationDefinition>, SyntaxError> {
    let location = p.location()?;
    if p.at(TokenKind::LCurly)? {
        let selection_set = selection::selection_set(p)?;
        return Ok(Node::new_parsed(
            OperationDefinition {
                operation_type: OperationType::Query,
                name: None,
                variables: Vec::new(),
                directives: DirectiveList::new(),
                selection_set,
            },
            location,
        ));
    }

    let operation_type = operation_type(p)?;
    let name = if p.at(TokenKind::Name)? {
        Some(p.name()?)
    } else {
        None
    };
    let variables = variable_definitions(p)?;
    let directives = directive::directives(p, Constness::NotConst)?;
    let selection_set = selection::selection_set(p)?;
    Ok(Node::new_parsed(
        OperationDefinition {
            operation_type,
            name,
            variables,
            directives,
            selection_set,
        },
        location,
    ))
}

/// See: https://spec.graphql.org/October2021/#OperationType
///
/// *OperationType*: one of
///     **query**    **mutation**    **subscription**
pub(crate) fn operation_type(p: &mut ParseContext) -> Result<OperationType, SyntaxError> {
    let token = p.peek()?;
    let operation_type = match (token.kind(), token.data()) {
        (TokenKind::Name, "query") => Some(OperationType::Query),
        (TokenKind::Name, "mutation") => Some(OperationType::Mutation),
        (TokenKind::Name, "subscription") => Some(OperationType::Subscription),
        _ => None,
    };
    let Some(operation_type) = operation_type else {
        return Err(p.unexpected("operation type"));
    };
    p.bump()?;
    Ok(operation_type)
}

/// See: https://spec.graphql.org/October2021/#VariableDefinitions
///
/// *VariableDefinitions*:
///     **(** VariableDefinition+ **)**
///
/// *VariableDefinition*:
///     Variable **:** Type DefaultValue? Directives[Const]?
fn variable_definitions(
    p: &mut ParseContext,
) -> Result<Vec<Node<VariableDefinition>>, SyntaxError> {
    let mut variables = Vec::new();
    if !p.eat(TokenKind::LParen)? {
        return Ok(variables);
    }
    loop {
        let location = p.location()?;
        p.expect(TokenKind::Dollar)?;
        let name = p.name()?;
        p.expect(TokenKind::Colon)?;
        let ty_location = p.location()?;
        let ty = Node::new_parsed(ty::ty(p)?, ty_location);
        let default_value = if p.eat(TokenKind::Eq)? {
            Some(value::value_node(p, Constness::Const)?)
        } else {
            None
        };
        let directives = directive::directives(p, Constness::Const)?;
        variables.push(Node::new_parsed(
            VariableDefinition {
                name,
                ty,
                default_value,
                directives,
            },
            location,
        ));
        if p.eat(TokenKind::RParen)? {
            return Ok(variables);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::OperationType;
    use crate::ast::Value;
    use crate::Parser;

    #[test]
    fn variable_definitions() {
        let doc = Parser::new()
            .parse_query("query Q($id: ID!, $first: Int = 10 @deprecated) { node(id: $id) }")
            .unwrap();
        let op = &doc.operations[0];
        assert_eq!(op.operation_type, OperationType::Query);
        assert_eq!(op.variables.len(), 2);
        assert_eq!(op.variables[0].ty.to_string(), "ID!");
        assert_eq!(
            op.variables[1].default_value.as_deref(),
            Some(&Value::Int("10".into()))
        );
        assert!(op.variables[1].directives.has("deprecated"));
    }

    #[test]
    fn default_values_are_constant() {
        let err = Parser::new()
            .parse_query("query Q($a: Int = $b) { a }")
            .unwrap_err();
        assert_eq!(err.message(), "unexpected variable in constant value");
    }

    #[test]
    fn unknown_operation_type() {
        let err = Parser::new().parse_query("fetch { a }").unwrap_err();
        assert_eq!(
            err.message(),
            r#"unexpected "fetch", expecting operation type, "fragment" or "{""#
        );
    }
}
