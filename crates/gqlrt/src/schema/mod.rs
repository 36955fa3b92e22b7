//! High-level representation of a GraphQL schema
//!
//! A [`Schema`] is built once from SDL with a [`SchemaBuilder`], then shared
//! read-only (typically in an `Arc`) by every request executed against it.
//!
//! ```rust
//! use gqlrt::Schema;
//!
//! let schema = Schema::parse(
//!     r#"
//!     type Query { hero: Character }
//!     interface Character { name: String! }
//!     type Droid implements Character { name: String! primaryFunction: String }
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(schema.root_operation(gqlrt::ast::OperationType::Query).unwrap(), "Query");
//! assert!(schema.is_possible_type("Character", "Droid"));
//! ```

use crate::ast;
use indexmap::IndexMap;
use indexmap::IndexSet;
use std::sync::OnceLock;

mod from_ast;
mod serialize;

pub use self::from_ast::SchemaBuilder;
pub use self::from_ast::SchemaError;
pub use crate::ast::Directive;
pub use crate::ast::DirectiveDefinition;
pub use crate::ast::DirectiveList;
pub use crate::ast::DirectiveLocation;
pub use crate::ast::EnumValueDefinition;
pub use crate::ast::FieldDefinition;
pub use crate::ast::InputValueDefinition;
pub use crate::ast::NamedType;
pub use crate::ast::Type;
pub use crate::ast::Value;
pub use crate::Name;
use crate::Node;

/// High-level representation of a GraphQL schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// The `schema` definition, defining root operations
    pub schema_definition: SchemaDefinition,

    /// Built-in and explicit directive definitions
    pub directive_definitions: IndexMap<Name, Node<DirectiveDefinition>>,

    /// Built-in scalars, introspection types, and explicit types
    pub types: IndexMap<NamedType, ExtendedType>,
}

/// The `schema` definition, defining root operations (entry points)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaDefinition {
    pub description: Option<String>,
    pub directives: DirectiveList,

    /// Name of the object type for the `query` root operation
    pub query: Option<NamedType>,

    /// Name of the object type for the `mutation` root operation
    pub mutation: Option<NamedType>,

    /// Name of the object type for the `subscription` root operation
    pub subscription: Option<NamedType>,
}

/// The definition of a named type, with all re-declarations folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendedType {
    Scalar(Node<ScalarType>),
    Object(Node<ObjectType>),
    Interface(Node<InterfaceType>),
    Union(Node<UnionType>),
    Enum(Node<EnumType>),
    InputObject(Node<InputObjectType>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarType {
    pub description: Option<String>,
    pub name: Name,
    pub directives: DirectiveList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    pub description: Option<String>,
    pub name: Name,
    pub implements_interfaces: IndexSet<Name>,
    pub directives: DirectiveList,

    /// Explicit field definitions, in declaration order.
    ///
    /// When looking up a definition,
    /// consider using [`Schema::type_field`] instead to include meta-fields.
    pub fields: IndexMap<Name, Node<FieldDefinition>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceType {
    pub description: Option<String>,
    pub name: Name,
    pub implements_interfaces: IndexSet<Name>,
    pub directives: DirectiveList,

    /// Explicit field definitions, in declaration order.
    pub fields: IndexMap<Name, Node<FieldDefinition>>,

    /// Object types implementing this interface.
    ///
    /// Filled by [`SchemaBuilder::build`] once every object type is known.
    pub possible_types: IndexSet<Name>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionType {
    pub description: Option<String>,
    pub name: Name,
    pub directives: DirectiveList,

    /// Names of the member object types
    pub members: IndexSet<NamedType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub description: Option<String>,
    pub name: Name,
    pub directives: DirectiveList,
    pub values: IndexMap<Name, Node<EnumValueDefinition>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputObjectType {
    pub description: Option<String>,
    pub name: Name,
    pub directives: DirectiveList,
    pub fields: IndexMap<Name, Node<InputValueDefinition>>,
}

/// Could not find the requested field definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLookupError<'schema> {
    NoSuchType,
    NoSuchField(&'schema NamedType, &'schema ExtendedType),
}

const BUILT_IN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

const BUILT_IN_DIRECTIVES: [&str; 5] = ["skip", "include", "deprecated", "specifiedBy", "graphql"];

impl Schema {
    /// Returns a schema holding only the meta-schema: built-in scalars,
    /// directives, and introspection types.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        SchemaBuilder::new().schema
    }

    /// Parse and build a schema from a single SDL source.
    ///
    /// Use [`builder()`][Self::builder] to build a schema from multiple sources.
    pub fn parse(source_text: &str) -> Result<Self, SchemaError> {
        let mut builder = Self::builder();
        builder.parse(source_text)?;
        builder.build()
    }

    /// Returns a new builder for creating a Schema from SDL documents,
    /// initialized with the meta-schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Returns the type with the given name, if it is a scalar type
    pub fn get_scalar(&self, name: &str) -> Option<&Node<ScalarType>> {
        if let Some(ExtendedType::Scalar(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    /// Returns the type with the given name, if it is a object type
    pub fn get_object(&self, name: &str) -> Option<&Node<ObjectType>> {
        if let Some(ExtendedType::Object(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    /// Returns the type with the given name, if it is a interface type
    pub fn get_interface(&self, name: &str) -> Option<&Node<InterfaceType>> {
        if let Some(ExtendedType::Interface(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    /// Returns the type with the given name, if it is a union type
    pub fn get_union(&self, name: &str) -> Option<&Node<UnionType>> {
        if let Some(ExtendedType::Union(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    /// Returns the type with the given name, if it is a enum type
    pub fn get_enum(&self, name: &str) -> Option<&Node<EnumType>> {
        if let Some(ExtendedType::Enum(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    /// Returns the type with the given name, if it is a input object type
    pub fn get_input_object(&self, name: &str) -> Option<&Node<InputObjectType>> {
        if let Some(ExtendedType::InputObject(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    /// Returns the name of the object type for the root operation with the given operation kind
    pub fn root_operation(&self, operation_type: ast::OperationType) -> Option<&NamedType> {
        match operation_type {
            ast::OperationType::Query => &self.schema_definition.query,
            ast::OperationType::Mutation => &self.schema_definition.mutation,
            ast::OperationType::Subscription => &self.schema_definition.subscription,
        }
        .as_ref()
    }

    /// Returns the definition of a type’s explicit field or meta-field.
    pub fn type_field(
        &self,
        type_name: &str,
        field_name: &str,
    ) -> Result<&Node<FieldDefinition>, FieldLookupError<'_>> {
        use ExtendedType::*;
        let (ty_def_name, ty_def) = self
            .types
            .get_key_value(type_name)
            .ok_or(FieldLookupError::NoSuchType)?;
        let explicit_field = match ty_def {
            Object(ty) => ty.fields.get(field_name),
            Interface(ty) => ty.fields.get(field_name),
            Scalar(_) | Union(_) | Enum(_) | InputObject(_) => None,
        };
        if let Some(def) = explicit_field {
            return Ok(def);
        }
        let meta = MetaFieldDefinitions::get();
        if field_name == "__typename" && matches!(ty_def, Object(_) | Interface(_) | Union(_)) {
            return Ok(&meta.__typename);
        }
        if self
            .schema_definition
            .query
            .as_ref()
            .is_some_and(|query_type| query_type == type_name)
        {
            match field_name {
                "__schema" => return Ok(&meta.__schema),
                "__type" => return Ok(&meta.__type),
                _ => {}
            }
        }
        Err(FieldLookupError::NoSuchField(ty_def_name, ty_def))
    }

    /// Returns the object types a value of the given abstract type may be at runtime.
    ///
    /// For an object type, that is the type itself.
    pub fn possible_types(&self, type_name: &str) -> Vec<&NamedType> {
        match self.types.get_key_value(type_name) {
            Some((_, ExtendedType::Interface(def))) => def.possible_types.iter().collect(),
            Some((_, ExtendedType::Union(def))) => def.members.iter().collect(),
            Some((name, ExtendedType::Object(_))) => vec![name],
            _ => Vec::new(),
        }
    }

    /// Returns whether `object_type` is `abstract_type` itself, one of its
    /// members, or one of its implementations.
    pub fn is_possible_type(&self, abstract_type: &str, object_type: &str) -> bool {
        match self.types.get(abstract_type) {
            Some(ExtendedType::Interface(def)) => def.possible_types.contains(object_type),
            Some(ExtendedType::Union(def)) => def.members.contains(object_type),
            Some(ExtendedType::Object(def)) => def.name == object_type,
            _ => false,
        }
    }

    /// Returns whether `maybe_subtype` is a subtype of `abstract_type`, which means either:
    ///
    /// * `maybe_subtype` implements the interface `abstract_type`
    /// * `maybe_subtype` is a member of the union type `abstract_type`
    pub fn is_subtype(&self, abstract_type: &str, maybe_subtype: &str) -> bool {
        self.types.get(abstract_type).is_some_and(|ty| match ty {
            ExtendedType::Interface(_) => self.types.get(maybe_subtype).is_some_and(|ty2| {
                match ty2 {
                    ExtendedType::Object(def) => &def.implements_interfaces,
                    ExtendedType::Interface(def) => &def.implements_interfaces,
                    ExtendedType::Scalar(_)
                    | ExtendedType::Union(_)
                    | ExtendedType::Enum(_)
                    | ExtendedType::InputObject(_) => return false,
                }
                .contains(abstract_type)
            }),
            ExtendedType::Union(def) => def.members.contains(maybe_subtype),
            ExtendedType::Scalar(_)
            | ExtendedType::Object(_)
            | ExtendedType::Enum(_)
            | ExtendedType::InputObject(_) => false,
        })
    }

    /// Returns whether the type `ty` is defined as is an input type
    ///
    /// <https://spec.graphql.org/October2021/#sec-Input-and-Output-Types>
    pub fn is_input_type(&self, ty: &Type) -> bool {
        self.types
            .get(ty.inner_named_type())
            .is_some_and(ExtendedType::is_input_type)
    }

    /// Returns whether the type `ty` is defined as is an output type
    ///
    /// <https://spec.graphql.org/October2021/#sec-Input-and-Output-Types>
    pub fn is_output_type(&self, ty: &Type) -> bool {
        self.types
            .get(ty.inner_named_type())
            .is_some_and(ExtendedType::is_output_type)
    }

    /// Returns whether a directive is one of those preloaded from the meta-schema.
    pub fn is_built_in_directive(name: &str) -> bool {
        BUILT_IN_DIRECTIVES.contains(&name)
    }
}

impl SchemaDefinition {
    pub fn iter_root_operations(&self) -> impl Iterator<Item = (ast::OperationType, &NamedType)> {
        [
            (ast::OperationType::Query, &self.query),
            (ast::OperationType::Mutation, &self.mutation),
            (ast::OperationType::Subscription, &self.subscription),
        ]
        .into_iter()
        .filter_map(|(ty, maybe_op)| maybe_op.as_ref().map(|op| (ty, op)))
    }
}

impl ExtendedType {
    pub fn name(&self) -> &Name {
        match self {
            Self::Scalar(def) => &def.name,
            Self::Object(def) => &def.name,
            Self::Interface(def) => &def.name,
            Self::Union(def) => &def.name,
            Self::Enum(def) => &def.name,
            Self::InputObject(def) => &def.name,
        }
    }

    /// Return the source location of the type's first declaration.
    pub fn location(&self) -> Option<crate::Location> {
        match self {
            Self::Scalar(ty) => ty.location(),
            Self::Object(ty) => ty.location(),
            Self::Interface(ty) => ty.location(),
            Self::Union(ty) => ty.location(),
            Self::Enum(ty) => ty.location(),
            Self::InputObject(ty) => ty.location(),
        }
    }

    /// The `__TypeKind` of this type, as reported by introspection.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "SCALAR",
            Self::Object(_) => "OBJECT",
            Self::Interface(_) => "INTERFACE",
            Self::Union(_) => "UNION",
            Self::Enum(_) => "ENUM",
            Self::InputObject(_) => "INPUT_OBJECT",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn is_interface(&self) -> bool {
        matches!(self, Self::Interface(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Self::Union(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, Self::Enum(_))
    }

    pub fn is_input_object(&self) -> bool {
        matches!(self, Self::InputObject(_))
    }

    /// Returns wether this type is a leaf type: scalar or enum.
    ///
    /// Field selections must have sub-selections if and only if
    /// their inner named type is *not* a leaf field.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    /// Returns whether this is an object, interface, or union type.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Interface(_) | Self::Union(_))
    }

    /// Returns whether this is an interface or union type.
    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(_) | Self::Union(_))
    }

    /// Returns true if a value of this type can be used as an input value.
    pub fn is_input_type(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_))
    }

    /// Returns true if a value of this type can be used as an output value.
    pub fn is_output_type(&self) -> bool {
        matches!(
            self,
            Self::Scalar(_) | Self::Enum(_) | Self::Object(_) | Self::Interface(_) | Self::Union(_)
        )
    }

    /// Returns whether this is a built-in scalar or introspection type
    pub fn is_built_in(&self) -> bool {
        let name = self.name();
        name.starts_with("__") || BUILT_IN_SCALARS.contains(&name.as_str())
    }

    pub fn directives(&self) -> &DirectiveList {
        match self {
            Self::Scalar(ty) => &ty.directives,
            Self::Object(ty) => &ty.directives,
            Self::Interface(ty) => &ty.directives,
            Self::Union(ty) => &ty.directives,
            Self::Enum(ty) => &ty.directives,
            Self::InputObject(ty) => &ty.directives,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Scalar(ty) => ty.description.as_deref(),
            Self::Object(ty) => ty.description.as_deref(),
            Self::Interface(ty) => ty.description.as_deref(),
            Self::Union(ty) => ty.description.as_deref(),
            Self::Enum(ty) => ty.description.as_deref(),
            Self::InputObject(ty) => ty.description.as_deref(),
        }
    }

    /// Explicit fields of an object or interface type.
    pub fn fields(&self) -> Option<&IndexMap<Name, Node<FieldDefinition>>> {
        match self {
            Self::Object(ty) => Some(&ty.fields),
            Self::Interface(ty) => Some(&ty.fields),
            _ => None,
        }
    }
}

struct MetaFieldDefinitions {
    __typename: Node<FieldDefinition>,
    __schema: Node<FieldDefinition>,
    __type: Node<FieldDefinition>,
}

impl MetaFieldDefinitions {
    fn get() -> &'static Self {
        static DEFS: OnceLock<MetaFieldDefinitions> = OnceLock::new();
        DEFS.get_or_init(|| {
            let field = |name: &str, ty: Type, arguments| {
                Node::new(FieldDefinition {
                    description: None,
                    name: Name::new(name),
                    arguments,
                    ty,
                    directives: DirectiveList::new(),
                })
            };
            Self {
                // __typename: String!
                __typename: field("__typename", Type::named("String").non_null(), Vec::new()),
                // __schema: __Schema!
                __schema: field("__schema", Type::named("__Schema").non_null(), Vec::new()),
                // __type(name: String!): __Type
                __type: field(
                    "__type",
                    Type::named("__Type"),
                    vec![Node::new(InputValueDefinition {
                        description: None,
                        name: Name::new("name"),
                        ty: Node::new(Type::named("String").non_null()),
                        default_value: None,
                        directives: DirectiveList::new(),
                    })],
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDL: &str = r#"
        type Query { hero: Character search: [SearchResult] }
        interface Character { name: String! }
        interface Node { id: ID! }
        type Human implements Character & Node { id: ID! name: String! }
        type Droid implements Character { name: String! }
        type Starship { name: String! }
        union SearchResult = Human | Starship
    "#;

    #[test]
    fn type_field_includes_meta_fields() {
        let schema = Schema::parse(SDL).unwrap();
        assert_eq!(schema.type_field("Query", "hero").unwrap().name, "hero");
        assert_eq!(
            schema.type_field("Human", "__typename").unwrap().ty,
            Type::named("String").non_null()
        );
        assert!(schema.type_field("Query", "__schema").is_ok());
        assert!(schema.type_field("Human", "__schema").is_err());
        assert_eq!(
            schema.type_field("Nope", "a").unwrap_err(),
            FieldLookupError::NoSuchType
        );
    }

    #[test]
    fn abstract_types() {
        let schema = Schema::parse(SDL).unwrap();
        let character: Vec<&str> = schema
            .possible_types("Character")
            .into_iter()
            .map(|name| name.as_str())
            .collect();
        assert_eq!(character, ["Human", "Droid"]);
        assert!(schema.is_possible_type("SearchResult", "Starship"));
        assert!(!schema.is_possible_type("SearchResult", "Droid"));
        assert!(schema.is_subtype("Node", "Human"));
        assert!(!schema.is_subtype("Node", "Droid"));
        assert!(schema.types["Starship"].is_object());
        assert!(schema.types["__Type"].is_built_in());
        assert!(!schema.types["Starship"].is_built_in());
    }
}
