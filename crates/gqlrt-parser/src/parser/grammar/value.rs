use crate::ast::Value;
use crate::parser::ParseContext;
use crate::Node;
use crate::SyntaxError;
use crate::TokenKind;

/// Whether variables may appear in a value.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constness {
    Const,
    NotConst,
}

/// See: https://spec.graphql.org/October2021/#Value
///
/// *Value[Const]*:
///     [if not Const] Variable
///     IntValue
///     FloatValue
///     StringValue
///     BooleanValue
///     NullValue
///     EnumValue
///     ListValue[?Const]
///     ObjectValue[?Const]
pub(crate) fn value(p: &mut ParseContext, constness: Constness) -> Result<Value, SyntaxError> {
    let value = match p.peek_kind()? {
        TokenKind::Dollar if constness == Constness::NotConst => {
            p.bump()?;
            Value::Variable(p.name()?)
        }
        TokenKind::Dollar => return Err(p.err("unexpected variable in constant value")),
        TokenKind::Int => Value::Int(p.bump()?.data),
        TokenKind::Float => Value::Float(p.bump()?.data),
        TokenKind::StringValue | TokenKind::BlockStringValue => Value::String(p.bump()?.data),
        TokenKind::Name => {
            let token = p.bump()?;
            match token.data() {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                "null" => Value::Null,
                name => Value::Enum(name.into()),
            }
        }
        TokenKind::LBracket => p.recurse(|p| list_value(p, constness))?,
        TokenKind::LCurly => p.recurse(|p| object_value(p, constness))?,
        _ => return Err(p.unexpected("Value")),
    };
    Ok(value)
}

/// Parse a value wrapped in a node located where it starts.
pub(crate) fn value_node(
    p: &mut ParseContext,
    constness: Constness,
) -> Result<Node<Value>, SyntaxError> {
    let location = p.location()?;
    Ok(Node::new_parsed(value(p, constness)?, location))
}

/// See: https://spec.graphql.org/October2021/#ListValue
///
/// *ListValue[Const]*:
///     **[** **]**
///     **[** Value[?Const]* **]**
fn list_value(p: &mut ParseContext, constness: Constness) -> Result<Value, SyntaxError> {
    p.expect(TokenKind::LBracket)?;
    let mut items = Vec::new();
    while !p.eat(TokenKind::RBracket)? {
        items.push(value_node(p, constness)?);
    }
    Ok(Value::List(items))
}

/// See: https://spec.graphql.org/October2021/#ObjectValue
///
/// *ObjectValue[Const]*:
///     **{** **}**
///     **{** ObjectField[?Const]* **}**
///
/// *ObjectField[Const]*:
///     Name **:** Value[?Const]
fn object_value(p: &mut ParseContext, constness: Constness) -> Result<Value, SyntaxError> {
    p.expect(TokenKind::LCurly)?;
    let mut fields = Vec::new();
    while !p.eat(TokenKind::RCurly)? {
        let name = p.name()?;
        p.expect(TokenKind::Colon)?;
        fields.push((name, value_node(p, constness)?));
    }
    Ok(Value::Object(fields))
}

#[cfg(test)]
mod tests {
    use crate::ast::Value;
    use crate::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn constant_values() {
        let value = Parser::new()
            .parse_value(r#"{ a: [1, 2.5, "x"], b: null, c: RED, d: true }"#)
            .unwrap();
        assert_eq!(value.to_string(), r#"{a: [1, 2.5, "x"], b: null, c: RED, d: true}"#);
        let Value::Object(fields) = value else {
            panic!("expected an object")
        };
        assert_eq!(*fields[0].1, Value::List(vec![
            Value::Int("1".into()).into(),
            Value::Float("2.5".into()).into(),
            Value::String("x".into()).into(),
        ]));
    }

    #[test]
    fn variables_are_not_constant() {
        let err = Parser::new().parse_value("[$id]").unwrap_err();
        assert_eq!(err.message(), "unexpected variable in constant value");
    }

    #[test]
    fn nested_lists_hit_the_recursion_limit() {
        let parser = Parser::new().recursion_limit(3);
        assert!(parser.parse_value("[[[1]]]").is_ok());
        let err = parser.parse_value("[[[[1]]]]").unwrap_err();
        assert_eq!(err.message(), "parser recursion limit reached");
    }
}
