use crate::ast::Type;
use crate::parser::ParseContext;
use crate::SyntaxError;
use crate::TokenKind;

/// See: https://spec.graphql.org/October2021/#Type
///
/// *Type*:
///     NamedType
///     ListType
///         **[** Type **]**
///     NonNullType
///         NamedType **!**
///         ListType **!**
pub(crate) fn ty(p: &mut ParseContext) -> Result<Type, SyntaxError> {
    let ty = match p.peek_kind()? {
        TokenKind::LBracket => {
            p.bump()?;
            let item = p.recurse(ty)?;
            p.expect(TokenKind::RBracket)?;
            Type::List(Box::new(item))
        }
        TokenKind::Name => Type::Named(p.name()?),
        _ => return Err(p.unexpected("Type")),
    };
    if p.eat(TokenKind::Bang)? {
        Ok(Type::NonNull(Box::new(ty)))
    } else {
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use crate::Parser;

    #[test]
    fn wrapped_types() {
        let parser = Parser::new();
        for source in ["String", "String!", "[String]", "[[Int!]]!"] {
            assert_eq!(parser.parse_type(source).unwrap().to_string(), source);
        }
    }

    #[test]
    fn unclosed_list_type() {
        let err = Parser::new().parse_type("[String").unwrap_err();
        assert_eq!(err.message(), r#"unexpected <EOF>, expecting ]"#);
    }

    #[test]
    fn double_bang() {
        let err = Parser::new().parse_type("Int!!").unwrap_err();
        assert_eq!(err.message(), r#"unexpected "!", expecting <EOF>"#);
    }
}
