use crate::ast::*;
use crate::parser::grammar::directive;
use crate::parser::grammar::operation;
use crate::parser::grammar::ty;
use crate::parser::grammar::value;
use crate::parser::grammar::value::Constness;
use crate::parser::ParseContext;
use crate::Location;
use crate::Name;
use crate::Node;
use crate::SyntaxError;
use crate::TokenKind;

/// See: https://spec.graphql.org/October2021/#TypeSystemDefinition
///
/// *TypeSystemDefinition*:
///     SchemaDefinition
///     TypeDefinition
///     DirectiveDefinition
///
/// Type extensions are only supported for object types.
pub(crate) fn definition(p: &mut ParseContext) -> Result<Definition, SyntaxError> {
    let location = p.location()?;
    let description = description(p)?;

    let keyword = {
        let token = p.peek()?;
        (token.kind() == TokenKind::Name).then(|| token.data().to_owned())
    };
    let definition = match keyword.as_deref() {
        Some("schema") => {
            Definition::SchemaDefinition(schema_definition(p, description, location)?)
        }
        Some("scalar") => {
            Definition::ScalarTypeDefinition(scalar_definition(p, description, location)?)
        }
        Some("type") => {
            p.bump()?;
            Definition::ObjectTypeDefinition(object_definition(p, description, false, location)?)
        }
        Some("interface") => {
            Definition::InterfaceTypeDefinition(interface_definition(p, description, location)?)
        }
        Some("union") => Definition::UnionTypeDefinition(union_definition(p, description, location)?),
        Some("enum") => Definition::EnumTypeDefinition(enum_definition(p, description, location)?),
        Some("input") => {
            Definition::InputObjectTypeDefinition(input_definition(p, description, location)?)
        }
        Some("directive") => {
            Definition::DirectiveDefinition(directive_definition(p, description, location)?)
        }
        Some("extend") if description.is_none() => {
            p.bump()?;
            p.expect_keyword("type")?;
            Definition::ObjectTypeDefinition(object_definition(p, None, true, location)?)
        }
        Some("extend") => return Err(p.err("extensions cannot have a description")),
        _ => return Err(p.unexpected("a type system definition")),
    };
    Ok(definition)
}

/// See: https://spec.graphql.org/October2021/#Description
///
/// *Description*:
///     StringValue
pub(crate) fn description(p: &mut ParseContext) -> Result<Option<String>, SyntaxError> {
    match p.peek_kind()? {
        TokenKind::StringValue | TokenKind::BlockStringValue => Ok(Some(p.bump()?.data)),
        _ => Ok(None),
    }
}

/// See: https://spec.graphql.org/October2021/#SchemaDefinition
///
/// *SchemaDefinition*:
///     Description? **schema** Directives[Const]? **{** RootOperationTypeDefinition+ **}**
fn schema_definition(
    p: &mut ParseContext,
    description: Option<String>,
    location: Location,
) -> Result<Node<SchemaDefinition>, SyntaxError> {
    p.expect_keyword("schema")?;
    let directives = directive::directives(p, Constness::Const)?;
    p.expect(TokenKind::LCurly)?;
    let mut root_operations = Vec::new();
    loop {
        let location = p.location()?;
        let operation_type = operation::operation_type(p)?;
        p.expect(TokenKind::Colon)?;
        let type_name = p.name()?;
        root_operations.push(Node::new_parsed((operation_type, type_name), location));
        if p.eat(TokenKind::RCurly)? {
            break;
        }
    }
    Ok(Node::new_parsed(
        SchemaDefinition {
            description,
            directives,
            root_operations,
        },
        location,
    ))
}

/// See: https://spec.graphql.org/October2021/#ScalarTypeDefinition
///
/// *ScalarTypeDefinition*:
///     Description? **scalar** Name Directives[Const]?
fn scalar_definition(
    p: &mut ParseContext,
    description: Option<String>,
    location: Location,
) -> Result<Node<ScalarTypeDefinition>, SyntaxError> {
    p.expect_keyword("scalar")?;
    let name = p.name()?;
    let directives = directive::directives(p, Constness::Const)?;
    Ok(Node::new_parsed(
        ScalarTypeDefinition {
            description,
            name,
            directives,
        },
        location,
    ))
}

/// See: https://spec.graphql.org/October2021/#ObjectTypeDefinition
///
/// *ObjectTypeDefinition*:
///     Description? **type** Name ImplementsInterfaces? Directives[Const]? FieldsDefinition?
///
/// *ObjectTypeExtension*:
///     **extend** **type** Name ImplementsInterfaces? Directives[Const]? FieldsDefinition?
///
/// The `type` keyword has already been consumed.
fn object_definition(
    p: &mut ParseContext,
    description: Option<String>,
    extend: bool,
    location: Location,
) -> Result<Node<ObjectTypeDefinition>, SyntaxError> {
    let name = p.name()?;
    let implements_interfaces = implements_interfaces(p)?;
    let directives = directive::directives(p, Constness::Const)?;
    let fields = fields_definition(p)?;
    Ok(Node::new_parsed(
        ObjectTypeDefinition {
            description,
            name,
            implements_interfaces,
            directives,
            fields,
            extend,
        },
        location,
    ))
}

/// See: https://spec.graphql.org/October2021/#InterfaceTypeDefinition
///
/// *InterfaceTypeDefinition*:
///     Description? **interface** Name ImplementsInterfaces? Directives[Const]? FieldsDefinition?
fn interface_definition(
    p: &mut ParseContext,
    description: Option<String>,
    location: Location,
) -> Result<Node<InterfaceTypeDefinition>, SyntaxError> {
    p.expect_keyword("interface")?;
    let name = p.name()?;
    let implements_interfaces = implements_interfaces(p)?;
    let directives = directive::directives(p, Constness::Const)?;
    let fields = fields_definition(p)?;
    Ok(Node::new_parsed(
        InterfaceTypeDefinition {
            description,
            name,
            implements_interfaces,
            directives,
            fields,
        },
        location,
    ))
}

/// See: https://spec.graphql.org/October2021/#ImplementsInterfaces
///
/// *ImplementsInterfaces*:
///     ImplementsInterfaces **&** NamedType
///     **implements** **&**? NamedType
fn implements_interfaces(p: &mut ParseContext) -> Result<Vec<Name>, SyntaxError> {
    let mut interfaces = Vec::new();
    if p.eat_keyword("implements")? {
        p.eat(TokenKind::Amp)?;
        interfaces.push(p.name()?);
        while p.eat(TokenKind::Amp)? {
            interfaces.push(p.name()?);
        }
    }
    Ok(interfaces)
}

/// See: https://spec.graphql.org/October2021/#FieldsDefinition
///
/// *FieldsDefinition*:
///     **{** FieldDefinition+ **}**
fn fields_definition(p: &mut ParseContext) -> Result<Vec<Node<FieldDefinition>>, SyntaxError> {
    let mut fields = Vec::new();
    if !p.eat(TokenKind::LCurly)? {
        return Ok(fields);
    }
    loop {
        fields.push(field_definition(p)?);
        if p.eat(TokenKind::RCurly)? {
            return Ok(fields);
        }
    }
}

/// See: https://spec.graphql.org/October2021/#FieldDefinition
///
/// *FieldDefinition*:
///     Description? Name ArgumentsDefinition? **:** Type Directives[Const]?
fn field_definition(p: &mut ParseContext) -> Result<Node<FieldDefinition>, SyntaxError> {
    let location = p.location()?;
    let description = description(p)?;
    let name = p.name()?;
    let arguments = arguments_definition(p)?;
    p.expect(TokenKind::Colon)?;
    let ty = ty::ty(p)?;
    let directives = directive::directives(p, Constness::Const)?;
    Ok(Node::new_parsed(
        FieldDefinition {
            description,
            name,
            arguments,
            ty,
            directives,
        },
        location,
    ))
}

/// See: https://spec.graphql.org/October2021/#ArgumentsDefinition
///
/// *ArgumentsDefinition*:
///     **(** InputValueDefinition+ **)**
fn arguments_definition(
    p: &mut ParseContext,
) -> Result<Vec<Node<InputValueDefinition>>, SyntaxError> {
    let mut arguments = Vec::new();
    if !p.eat(TokenKind::LParen)? {
        return Ok(arguments);
    }
    loop {
        arguments.push(input_value_definition(p)?);
        if p.eat(TokenKind::RParen)? {
            return Ok(arguments);
        }
    }
}

/// See: https://spec.graphql.org/October2021/#InputValueDefinition
///
/// *InputValueDefinition*:
///     Description? Name **:** Type DefaultValue? Directives[Const]?
fn input_value_definition(
    p: &mut ParseContext,
) -> Result<Node<InputValueDefinition>, SyntaxError> {
    let location = p.location()?;
    let description = description(p)?;
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
    Ok(Node::new_parsed(
        InputValueDefinition {
            description,
            name,
            ty,
            default_value,
            directives,
        },
        location,
    ))
}

/// See: https://spec.graphql.org/October2021/#UnionTypeDefinition
///
/// *UnionTypeDefinition*:
///     Description? **union** Name Directives[Const]? UnionMemberTypes?
///
/// *UnionMemberTypes*:
///     UnionMemberTypes **|** NamedType
///     **=** **|**? NamedType
fn union_definition(
    p: &mut ParseContext,
    description: Option<String>,
    location: Location,
) -> Result<Node<UnionTypeDefinition>, SyntaxError> {
    p.expect_keyword("union")?;
    let name = p.name()?;
    let directives = directive::directives(p, Constness::Const)?;
    let mut members = Vec::new();
    if p.eat(TokenKind::Eq)? {
        p.eat(TokenKind::Pipe)?;
        members.push(p.name()?);
        while p.eat(TokenKind::Pipe)? {
            members.push(p.name()?);
        }
    }
    Ok(Node::new_parsed(
        UnionTypeDefinition {
            description,
            name,
            directives,
            members,
        },
        location,
    ))
}

/// See: https://spec.graphql.org/October2021/#EnumTypeDefinition
///
/// *EnumTypeDefinition*:
///     Description? **enum** Name Directives[Const]? EnumValuesDefinition?
///
/// *EnumValuesDefinition*:
///     **{** EnumValueDefinition+ **}**
fn enum_definition(
    p: &mut ParseContext,
    description: Option<String>,
    location: Location,
) -> Result<Node<EnumTypeDefinition>, SyntaxError> {
    p.expect_keyword("enum")?;
    let name = p.name()?;
    let directives = directive::directives(p, Constness::Const)?;
    let mut values = Vec::new();
    if p.eat(TokenKind::LCurly)? {
        loop {
            values.push(enum_value_definition(p)?);
            if p.eat(TokenKind::RCurly)? {
                break;
            }
        }
    }
    Ok(Node::new_parsed(
        EnumTypeDefinition {
            description,
            name,
            directives,
            values,
        },
        location,
    ))
}

/// See: https://spec.graphql.org/October2021/#EnumValueDefinition
///
/// *EnumValueDefinition*:
///     Description? EnumValue Directives[Const]?
///
/// *EnumValue*:
///     Name *but not* **true** *or* **false** *or* **null**
fn enum_value_definition(p: &mut ParseContext) -> Result<Node<EnumValueDefinition>, SyntaxError> {
    let location = p.location()?;
    let description = description(p)?;
    if p.at_keyword("true")? || p.at_keyword("false")? || p.at_keyword("null")? {
        return Err(p.unexpected("enum value"));
    }
    let value = p.name()?;
    let directives = directive::directives(p, Constness::Const)?;
    Ok(Node::new_parsed(
        EnumValueDefinition {
            description,
            value,
            directives,
        },
        location,
    ))
}

/// See: https://spec.graphql.org/October2021/#InputObjectTypeDefinition
///
/// *InputObjectTypeDefinition*:
///     Description? **input** Name Directives[Const]? InputFieldsDefinition?
///
/// *InputFieldsDefinition*:
///     **{** InputValueDefinition+ **}**
fn input_definition(
    p: &mut ParseContext,
    description: Option<String>,
    location: Location,
) -> Result<Node<InputObjectTypeDefinition>, SyntaxError> {
    p.expect_keyword("input")?;
    let name = p.name()?;
    let directives = directive::directives(p, Constness::Const)?;
    let mut fields = Vec::new();
    if p.eat(TokenKind::LCurly)? {
        loop {
            fields.push(input_value_definition(p)?);
            if p.eat(TokenKind::RCurly)? {
                break;
            }
        }
    }
    Ok(Node::new_parsed(
        InputObjectTypeDefinition {
            description,
            name,
            directives,
            fields,
        },
        location,
    ))
}

/// See: https://spec.graphql.org/October2021/#DirectiveDefinition
///
/// *DirectiveDefinition*:
///     Description? **directive @** Name ArgumentsDefinition? **repeatable**? **on** DirectiveLocations
///
/// *DirectiveLocations*:
///     DirectiveLocations **|** DirectiveLocation
///     **|**? DirectiveLocation
fn directive_definition(
    p: &mut ParseContext,
    description: Option<String>,
    location: Location,
) -> Result<Node<DirectiveDefinition>, SyntaxError> {
    p.expect_keyword("directive")?;
    p.expect(TokenKind::At)?;
    let name = p.name()?;
    let arguments = arguments_definition(p)?;
    let repeatable = p.eat_keyword("repeatable")?;
    p.expect_keyword("on")?;
    p.eat(TokenKind::Pipe)?;
    let mut locations = vec![directive_location(p)?];
    while p.eat(TokenKind::Pipe)? {
        locations.push(directive_location(p)?);
    }
    Ok(Node::new_parsed(
        DirectiveDefinition {
            description,
            name,
            arguments,
            repeatable,
            locations,
        },
        location,
    ))
}

/// See: https://spec.graphql.org/October2021/#DirectiveLocation
fn directive_location(p: &mut ParseContext) -> Result<DirectiveLocation, SyntaxError> {
    let found = {
        let token = p.peek()?;
        if token.kind() == TokenKind::Name {
            DirectiveLocation::from_name(token.data())
        } else {
            None
        }
    };
    match found {
        Some(location) => {
            p.bump()?;
            Ok(location)
        }
        None => Err(p.unexpected("directive location")),
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Definition;
    use crate::ast::DirectiveLocation;
    use crate::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn object_with_graphql_directive() {
        let doc = Parser::new()
            .parse_schema(
                r#"
                type Query @graphql(alter: "add") {
                  "the hero"
                  hero(episode: Episode = JEDI): Character
                }
                "#,
            )
            .unwrap();
        let Definition::ObjectTypeDefinition(query) = &doc.definitions[0] else {
            panic!("expected an object type")
        };
        assert_eq!(query.name, "Query");
        assert!(!query.extend);
        let graphql = query.directives.get("graphql").unwrap();
        assert_eq!(graphql.argument_by_name("alter").unwrap().as_str(), Some("add"));
        assert_eq!(query.fields[0].description.as_deref(), Some("the hero"));
        assert_eq!(query.fields[0].arguments[0].ty.to_string(), "Episode");
    }

    #[test]
    fn extend_type() {
        let doc = Parser::new()
            .parse_schema("extend type Query implements & Node & Entity { id: ID! }")
            .unwrap();
        let Definition::ObjectTypeDefinition(query) = &doc.definitions[0] else {
            panic!("expected an object type")
        };
        assert!(query.extend);
        assert_eq!(query.implements_interfaces, ["Node", "Entity"]);
    }

    #[test]
    fn directive_definition() {
        let doc = Parser::new()
            .parse_schema(
                "directive @cacheControl(maxAge: Int) repeatable on | FIELD_DEFINITION | OBJECT",
            )
            .unwrap();
        let Definition::DirectiveDefinition(def) = &doc.definitions[0] else {
            panic!("expected a directive definition")
        };
        assert!(def.repeatable);
        assert_eq!(
            def.locations,
            [DirectiveLocation::FieldDefinition, DirectiveLocation::Object]
        );
    }

    #[test]
    fn unknown_directive_location() {
        let err = Parser::new()
            .parse_schema("directive @a on FIELD | NOWHERE")
            .unwrap_err();
        assert_eq!(
            err.message(),
            r#"unexpected "NOWHERE", expecting directive location"#
        );
    }

    #[test]
    fn reserved_enum_values() {
        let err = Parser::new()
            .parse_schema("enum Answer { YES null }")
            .unwrap_err();
        assert_eq!(err.message(), r#"unexpected "null", expecting enum value"#);
    }

    #[test]
    fn unknown_keyword() {
        let err = Parser::new().parse_schema("typo Query { a: Int }").unwrap_err();
        assert_eq!(
            err.message(),
            r#"unexpected "typo", expecting a type system definition"#
        );
    }
}
