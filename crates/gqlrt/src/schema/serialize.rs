use super::*;
use crate::ast::OperationType;
use std::fmt;

/// Prints the user-defined part of the schema as SDL.
///
/// Built-in scalars, introspection types, and built-in directives are left
/// out, so the output can be fed back to [`Schema::parse`].
impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let document = ast::SchemaDocument {
            definitions: self.to_ast().collect(),
        };
        fmt::Display::fmt(&document, f)
    }
}

impl Schema {
    /// Converts back to type system definitions, skipping built-in ones.
    pub fn to_ast(&self) -> impl Iterator<Item = ast::Definition> + '_ {
        self.schema_definition
            .to_ast(&self.types)
            .into_iter()
            .chain(
                self.directive_definitions
                    .values()
                    .filter(|def| !Schema::is_built_in_directive(&def.name))
                    .map(|def| ast::Definition::DirectiveDefinition(def.clone())),
            )
            .chain(
                self.types
                    .values()
                    .filter(|def| !def.is_built_in())
                    .map(ExtendedType::to_ast),
            )
    }
}

impl SchemaDefinition {
    /// Returns `None` when the `schema` definition can be left implicit.
    fn to_ast(&self, types: &IndexMap<Name, ExtendedType>) -> Option<ast::Definition> {
        let implicit = self.description.is_none()
            && self.directives.is_empty()
            && [
                (&self.query, OperationType::Query),
                (&self.mutation, OperationType::Mutation),
                (&self.subscription, OperationType::Subscription),
            ]
            .into_iter()
            .all(|(root_operation, operation_type)| {
                // What implicit root operation would we get for this operation type?
                let default_type_name = operation_type.default_type_name();
                let implicit_root_operation: Option<&str> = types
                    .get(default_type_name)
                    .filter(|ty_def| ty_def.is_object())
                    .map(|_ty_def| default_type_name);
                root_operation.as_deref() == implicit_root_operation
            });
        if implicit {
            return None;
        }
        Some(ast::Definition::SchemaDefinition(Node::new(
            ast::SchemaDefinition {
                description: self.description.clone(),
                directives: self.directives.clone(),
                root_operations: self
                    .iter_root_operations()
                    .map(|(operation_type, name)| Node::new((operation_type, name.clone())))
                    .collect(),
            },
        )))
    }
}

impl ExtendedType {
    pub fn to_ast(&self) -> ast::Definition {
        match self {
            Self::Scalar(def) => ast::Definition::ScalarTypeDefinition(def.same_location(
                ast::ScalarTypeDefinition {
                    description: def.description.clone(),
                    name: def.name.clone(),
                    directives: def.directives.clone(),
                },
            )),
            Self::Object(def) => ast::Definition::ObjectTypeDefinition(def.same_location(
                ast::ObjectTypeDefinition {
                    description: def.description.clone(),
                    name: def.name.clone(),
                    implements_interfaces: def.implements_interfaces.iter().cloned().collect(),
                    directives: def.directives.clone(),
                    fields: def.fields.values().cloned().collect(),
                    extend: false,
                },
            )),
            Self::Interface(def) => ast::Definition::InterfaceTypeDefinition(def.same_location(
                ast::InterfaceTypeDefinition {
                    description: def.description.clone(),
                    name: def.name.clone(),
                    implements_interfaces: def.implements_interfaces.iter().cloned().collect(),
                    directives: def.directives.clone(),
                    fields: def.fields.values().cloned().collect(),
                },
            )),
            Self::Union(def) => ast::Definition::UnionTypeDefinition(def.same_location(
                ast::UnionTypeDefinition {
                    description: def.description.clone(),
                    name: def.name.clone(),
                    directives: def.directives.clone(),
                    members: def.members.iter().cloned().collect(),
                },
            )),
            Self::Enum(def) => ast::Definition::EnumTypeDefinition(def.same_location(
                ast::EnumTypeDefinition {
                    description: def.description.clone(),
                    name: def.name.clone(),
                    directives: def.directives.clone(),
                    values: def.values.values().cloned().collect(),
                },
            )),
            Self::InputObject(def) => ast::Definition::InputObjectTypeDefinition(
                def.same_location(ast::InputObjectTypeDefinition {
                    description: def.description.clone(),
                    name: def.name.clone(),
                    directives: def.directives.clone(),
                    fields: def.fields.values().cloned().collect(),
                }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn prints_user_definitions_only() {
        let schema = Schema::parse(
            r#"
            schema { query: Root }
            "The entry point"
            type Root { hero(episode: Episode = JEDI): Character @deprecated }
            interface Character { name: String! }
            type Droid implements Character { name: String! }
            extend type Droid { primaryFunction: String }
            enum Episode { NEWHOPE EMPIRE JEDI }
            "#,
        )
        .unwrap();
        expect![[r#"
            schema {
              query: Root
            }

            """The entry point"""
            type Root {
              hero(episode: Episode = JEDI): Character @deprecated(reason: "No longer supported")
            }

            interface Character {
              name: String!
            }

            type Droid implements Character {
              name: String!
              primaryFunction: String
            }

            enum Episode {
              NEWHOPE
              EMPIRE
              JEDI
            }
        "#]]
        .assert_eq(&schema.to_string());
    }

    #[test]
    fn printed_schema_builds_again() {
        let schema = Schema::parse(
            "type Query { a(x: [Int!] = [1, 2]): U } union U = A | B type A { a: Int } type B { b: Int }",
        )
        .unwrap();
        let reparsed = Schema::parse(&schema.to_string()).unwrap();
        assert_eq!(reparsed, schema);
    }
}
