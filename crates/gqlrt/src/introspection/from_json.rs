use crate::ast;
use crate::ast::DirectiveLocation;
use crate::ast::OperationType;
use crate::ast::Type;
use crate::response::JsonValue;
use crate::schema::SchemaBuilder;
use crate::schema::SchemaError;
use crate::Name;
use crate::Node;
use crate::Parser;
use crate::Schema;
use crate::SyntaxError;
use serde::Deserialize;

/// An introspection result that could not be turned into a [`Schema`].
#[derive(Debug, thiserror::Error)]
pub enum IntrospectionError {
    #[error("introspection result has no `__schema` key")]
    MissingSchema,

    #[error("invalid introspection result: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid type reference in introspection result: {0}")]
    InvalidTypeRef(String),

    #[error("unknown directive location \"{0}\"")]
    UnknownDirectiveLocation(String),

    #[error("invalid default value for \"{name}\": {source}")]
    DefaultValue { name: String, source: SyntaxError },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectionSchema {
    description: Option<String>,
    query_type: Option<TypeName>,
    mutation_type: Option<TypeName>,
    subscription_type: Option<TypeName>,
    types: Vec<FullType>,
    #[serde(default)]
    directives: Vec<IntrospectionDirective>,
}

#[derive(Deserialize)]
struct TypeName {
    name: String,
}

#[derive(Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullType {
    kind: TypeKind,
    name: String,
    description: Option<String>,
    fields: Option<Vec<IntrospectionField>>,
    input_fields: Option<Vec<IntrospectionInputValue>>,
    interfaces: Option<Vec<TypeRef>>,
    possible_types: Option<Vec<TypeRef>>,
    enum_values: Option<Vec<IntrospectionEnumValue>>,
    #[serde(rename = "specifiedByURL", alias = "specifiedByUrl")]
    specified_by_url: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TypeRef {
    kind: TypeKind,
    name: Option<String>,
    of_type: Option<Box<TypeRef>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectionField {
    name: String,
    description: Option<String>,
    #[serde(default)]
    args: Vec<IntrospectionInputValue>,
    #[serde(rename = "type")]
    ty: TypeRef,
    #[serde(default)]
    is_deprecated: bool,
    deprecation_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectionInputValue {
    name: String,
    description: Option<String>,
    #[serde(rename = "type")]
    ty: TypeRef,
    default_value: Option<String>,
    #[serde(default)]
    is_deprecated: bool,
    deprecation_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectionEnumValue {
    name: String,
    description: Option<String>,
    #[serde(default)]
    is_deprecated: bool,
    deprecation_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectionDirective {
    name: String,
    description: Option<String>,
    #[serde(default)]
    locations: Vec<String>,
    #[serde(default)]
    args: Vec<IntrospectionInputValue>,
    #[serde(default)]
    is_repeatable: bool,
}

impl Schema {
    /// Rebuilds a schema from the result of an introspection query.
    ///
    /// Accepts `{"__schema": …}` as well as a whole response,
    /// `{"data": {"__schema": …}}`. Built-in scalars, directives and
    /// introspection types in the result are skipped: the new schema
    /// gets its own.
    ///
    /// ```rust
    /// use gqlrt::Schema;
    /// use serde_json_bytes::json;
    ///
    /// let schema = Schema::from_introspection(&json!({"__schema": {
    ///     "queryType": {"name": "Query"},
    ///     "types": [{
    ///         "kind": "OBJECT",
    ///         "name": "Query",
    ///         "fields": [{
    ///             "name": "hello",
    ///             "args": [],
    ///             "type": {"kind": "SCALAR", "name": "String", "ofType": null}
    ///         }]
    ///     }]
    /// }}))
    /// .unwrap();
    /// assert!(schema.type_field("Query", "hello").is_ok());
    /// ```
    pub fn from_introspection(result: &JsonValue) -> Result<Self, IntrospectionError> {
        let schema = result
            .get("__schema")
            .or_else(|| result.get("data")?.get("__schema"))
            .ok_or(IntrospectionError::MissingSchema)?;
        let introspection: IntrospectionSchema = serde_json_bytes::from_value(schema.clone())?;
        let document = to_document(introspection)?;
        let mut builder = SchemaBuilder::new();
        builder.add_document(&document)?;
        Ok(builder.build()?)
    }
}

fn to_document(introspection: IntrospectionSchema) -> Result<ast::SchemaDocument, IntrospectionError> {
    let mut definitions = Vec::new();
    let root_operations: Vec<_> = [
        (OperationType::Query, introspection.query_type),
        (OperationType::Mutation, introspection.mutation_type),
        (OperationType::Subscription, introspection.subscription_type),
    ]
    .into_iter()
    .filter_map(|(operation_type, root)| {
        root.map(|root| Node::new((operation_type, Name::new(&root.name))))
    })
    .collect();
    if !root_operations.is_empty() {
        definitions.push(ast::Definition::SchemaDefinition(Node::new(
            ast::SchemaDefinition {
                description: introspection.description,
                directives: ast::DirectiveList::default(),
                root_operations,
            },
        )));
    }

    for ty in introspection.types {
        if ty.name.starts_with("__") || is_built_in_scalar(&ty.name) {
            continue;
        }
        definitions.push(type_definition(ty)?);
    }
    for directive in introspection.directives {
        if Schema::is_built_in_directive(&directive.name) {
            continue;
        }
        let locations = directive
            .locations
            .iter()
            .map(|location| {
                DirectiveLocation::from_name(location)
                    .ok_or_else(|| IntrospectionError::UnknownDirectiveLocation(location.clone()))
            })
            .collect::<Result<_, _>>()?;
        definitions.push(ast::Definition::DirectiveDefinition(Node::new(
            ast::DirectiveDefinition {
                description: directive.description,
                name: Name::new(&directive.name),
                arguments: input_values(directive.args)?,
                repeatable: directive.is_repeatable,
                locations,
            },
        )));
    }
    Ok(ast::SchemaDocument { definitions })
}

fn is_built_in_scalar(name: &str) -> bool {
    matches!(name, "Int" | "Float" | "String" | "Boolean" | "ID")
}

fn type_definition(ty: FullType) -> Result<ast::Definition, IntrospectionError> {
    let name = Name::new(&ty.name);
    let description = ty.description;
    let names = |refs: Option<Vec<TypeRef>>| -> Result<Vec<Name>, IntrospectionError> {
        refs.unwrap_or_default()
            .into_iter()
            .map(|named| match (named.kind, &named.name) {
                (TypeKind::List | TypeKind::NonNull, _) | (_, None) => {
                    Err(IntrospectionError::InvalidTypeRef(format!("{named:?}")))
                }
                (_, Some(name)) => Ok(Name::new(name)),
            })
            .collect()
    };
    Ok(match ty.kind {
        TypeKind::Scalar => {
            let mut directives = ast::DirectiveList::default();
            if let Some(url) = ty.specified_by_url {
                directives.0.push(directive("specifiedBy", "url", url));
            }
            ast::Definition::ScalarTypeDefinition(Node::new(ast::ScalarTypeDefinition {
                description,
                name,
                directives,
            }))
        }
        TypeKind::Object => ast::Definition::ObjectTypeDefinition(Node::new(
            ast::ObjectTypeDefinition {
                description,
                name,
                implements_interfaces: names(ty.interfaces)?,
                directives: ast::DirectiveList::default(),
                fields: fields(ty.fields)?,
                extend: false,
            },
        )),
        TypeKind::Interface => ast::Definition::InterfaceTypeDefinition(Node::new(
            ast::InterfaceTypeDefinition {
                description,
                name,
                implements_interfaces: names(ty.interfaces)?,
                directives: ast::DirectiveList::default(),
                fields: fields(ty.fields)?,
            },
        )),
        TypeKind::Union => {
            ast::Definition::UnionTypeDefinition(Node::new(ast::UnionTypeDefinition {
                description,
                name,
                directives: ast::DirectiveList::default(),
                members: names(ty.possible_types)?,
            }))
        }
        TypeKind::Enum => ast::Definition::EnumTypeDefinition(Node::new(ast::EnumTypeDefinition {
            description,
            name,
            directives: ast::DirectiveList::default(),
            values: ty
                .enum_values
                .unwrap_or_default()
                .into_iter()
                .map(|value| {
                    Node::new(ast::EnumValueDefinition {
                        description: value.description,
                        value: Name::new(&value.name),
                        directives: deprecation(value.is_deprecated, value.deprecation_reason),
                    })
                })
                .collect(),
        })),
        TypeKind::InputObject => ast::Definition::InputObjectTypeDefinition(Node::new(
            ast::InputObjectTypeDefinition {
                description,
                name,
                directives: ast::DirectiveList::default(),
                fields: input_values(ty.input_fields.unwrap_or_default())?,
            },
        )),
        TypeKind::List | TypeKind::NonNull => {
            return Err(IntrospectionError::InvalidTypeRef(format!(
                "{:?} type named \"{}\"",
                ty.kind, ty.name
            )))
        }
    })
}

fn fields(
    fields: Option<Vec<IntrospectionField>>,
) -> Result<Vec<Node<ast::FieldDefinition>>, IntrospectionError> {
    fields
        .unwrap_or_default()
        .into_iter()
        .map(|field| {
            Ok(Node::new(ast::FieldDefinition {
                description: field.description,
                name: Name::new(&field.name),
                arguments: input_values(field.args)?,
                ty: type_ref(field.ty)?,
                directives: deprecation(field.is_deprecated, field.deprecation_reason),
            }))
        })
        .collect()
}

fn input_values(
    values: Vec<IntrospectionInputValue>,
) -> Result<Vec<Node<ast::InputValueDefinition>>, IntrospectionError> {
    values
        .into_iter()
        .map(|value| {
            let default_value = match value.default_value {
                Some(text) => Some(Node::new(Parser::new().parse_value(&text).map_err(
                    |source| IntrospectionError::DefaultValue {
                        name: value.name.clone(),
                        source,
                    },
                )?)),
                None => None,
            };
            Ok(Node::new(ast::InputValueDefinition {
                description: value.description,
                name: Name::new(&value.name),
                ty: Node::new(type_ref(value.ty)?),
                default_value,
                directives: deprecation(value.is_deprecated, value.deprecation_reason),
            }))
        })
        .collect()
}

/// Maps an `ofType` chain to a type reference
fn type_ref(reference: TypeRef) -> Result<Type, IntrospectionError> {
    match reference.kind {
        TypeKind::NonNull | TypeKind::List => {
            let Some(inner) = reference.of_type else {
                return Err(IntrospectionError::InvalidTypeRef(format!(
                    "{:?} without ofType",
                    reference.kind
                )));
            };
            let inner = type_ref(*inner)?;
            Ok(if reference.kind == TypeKind::List {
                inner.list()
            } else {
                inner.non_null()
            })
        }
        _ => match reference.name {
            Some(name) => Ok(Type::named(Name::new(&name))),
            None => Err(IntrospectionError::InvalidTypeRef(format!(
                "{:?} without a name",
                reference.kind
            ))),
        },
    }
}

fn deprecation(is_deprecated: bool, reason: Option<String>) -> ast::DirectiveList {
    let mut directives = ast::DirectiveList::default();
    if is_deprecated {
        directives.0.push(match reason {
            Some(reason) => directive("deprecated", "reason", reason),
            None => Node::new(ast::Directive {
                name: Name::new("deprecated"),
                arguments: Vec::new(),
            }),
        });
    }
    directives
}

fn directive(name: &str, argument: &str, value: String) -> Node<ast::Directive> {
    Node::new(ast::Directive {
        name: Name::new(name),
        arguments: vec![Node::new(ast::Argument {
            name: Name::new(argument),
            value: Node::new(ast::Value::String(value)),
        })],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json_bytes::json;

    #[test]
    fn type_refs() {
        let ty: TypeRef = serde_json::from_value(serde_json::json!({
            "kind": "NON_NULL",
            "name": null,
            "ofType": {"kind": "LIST", "name": null, "ofType": {
                "kind": "NON_NULL", "name": null, "ofType": {"kind": "SCALAR", "name": "Int", "ofType": null}
            }}
        }))
        .unwrap();
        assert_eq!(type_ref(ty).unwrap().to_string(), "[Int!]!");
    }

    #[test]
    fn missing_schema_key() {
        let error = Schema::from_introspection(&json!({"data": {}})).unwrap_err();
        assert!(matches!(error, IntrospectionError::MissingSchema));
    }

    #[test]
    fn deprecations_and_defaults() {
        let schema = Schema::from_introspection(&json!({"data": {"__schema": {
            "queryType": {"name": "Query"},
            "types": [
                {"kind": "SCALAR", "name": "String", "description": "built in"},
                {"kind": "OBJECT", "name": "Query", "interfaces": [], "fields": [
                    {
                        "name": "old",
                        "args": [{
                            "name": "limit",
                            "type": {"kind": "SCALAR", "name": "Int", "ofType": null},
                            "defaultValue": "10"
                        }],
                        "type": {"kind": "SCALAR", "name": "String", "ofType": null},
                        "isDeprecated": true,
                        "deprecationReason": "use new"
                    }
                ]}
            ],
            "directives": [
                {"name": "skip", "locations": ["FIELD"], "args": []},
                {"name": "cached", "locations": ["FIELD_DEFINITION"], "args": [], "isRepeatable": true}
            ]
        }}}))
        .unwrap();
        let field = schema.type_field("Query", "old").unwrap();
        let reason = field.directives.get("deprecated").unwrap().argument_by_name("reason");
        assert_eq!(reason.and_then(|reason| reason.as_str()), Some("use new"));
        let limit = &field.arguments[0];
        assert_eq!(limit.default_value.as_ref().unwrap().to_string(), "10");
        assert!(schema.types["String"].description().unwrap().starts_with("The `String`"));
        assert!(schema.directive_definitions["cached"].repeatable);
    }
}
