//! *Abstract Syntax Tree* for GraphQL documents.
//!
//! Two document kinds exist, matching the two parser entry points:
//! [`SchemaDocument`] holds type system definitions and [`QueryDocument`]
//! holds operations and fragments. Neither is validated here.
//!
//! ## Structural sharing
//!
//! Nodes are wrapped in [`Node`], a reference-counted smart pointer that also
//! records where the node was parsed. Cloning a document or a subtree is
//! cheap, and equality ignores locations.
//!
//! ## Serialization
//!
//! Documents and their nodes implement [`Display`][std::fmt::Display] by
//! printing GraphQL syntax. Parsing the printed text yields an equal tree.

use crate::Name;
use crate::Node;

pub(crate) mod impls;
pub(crate) mod serialize;

/// Refers to the name of a GraphQL type defined elsewhere
pub type NamedType = Name;

/// Type system definitions, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SchemaDocument {
    pub definitions: Vec<Definition>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Definition {
    SchemaDefinition(Node<SchemaDefinition>),
    ScalarTypeDefinition(Node<ScalarTypeDefinition>),
    ObjectTypeDefinition(Node<ObjectTypeDefinition>),
    InterfaceTypeDefinition(Node<InterfaceTypeDefinition>),
    UnionTypeDefinition(Node<UnionTypeDefinition>),
    EnumTypeDefinition(Node<EnumTypeDefinition>),
    InputObjectTypeDefinition(Node<InputObjectTypeDefinition>),
    DirectiveDefinition(Node<DirectiveDefinition>),
}

/// Executable definitions. Operations and fragments keep their relative
/// source order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct QueryDocument {
    pub operations: Vec<Node<OperationDefinition>>,
    pub fragments: Vec<Node<FragmentDefinition>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SchemaDefinition {
    pub description: Option<String>,
    pub directives: DirectiveList,
    pub root_operations: Vec<Node<(OperationType, NamedType)>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScalarTypeDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub directives: DirectiveList,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectTypeDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub implements_interfaces: Vec<Name>,
    pub directives: DirectiveList,
    pub fields: Vec<Node<FieldDefinition>>,
    /// Declared with `extend type`.
    pub extend: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InterfaceTypeDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub implements_interfaces: Vec<Name>,
    pub directives: DirectiveList,
    pub fields: Vec<Node<FieldDefinition>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnionTypeDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub directives: DirectiveList,
    pub members: Vec<NamedType>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumTypeDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub directives: DirectiveList,
    pub values: Vec<Node<EnumValueDefinition>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InputObjectTypeDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub directives: DirectiveList,
    pub fields: Vec<Node<InputValueDefinition>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DirectiveDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub arguments: Vec<Node<InputValueDefinition>>,
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub arguments: Vec<Node<InputValueDefinition>>,
    pub ty: Type,
    pub directives: DirectiveList,
}

/// An argument definition, or a field of an input object type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InputValueDefinition {
    pub description: Option<String>,
    pub name: Name,
    pub ty: Node<Type>,
    pub default_value: Option<Node<Value>>,
    pub directives: DirectiveList,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumValueDefinition {
    pub description: Option<String>,
    pub value: Name,
    pub directives: DirectiveList,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OperationDefinition {
    pub operation_type: OperationType,
    pub name: Option<Name>,
    pub variables: Vec<Node<VariableDefinition>>,
    pub directives: DirectiveList,
    pub selection_set: Vec<Selection>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FragmentDefinition {
    pub name: Name,
    pub type_condition: NamedType,
    pub directives: DirectiveList,
    pub selection_set: Vec<Selection>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariableDefinition {
    pub name: Name,
    pub ty: Node<Type>,
    pub default_value: Option<Node<Value>>,
    pub directives: DirectiveList,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selection {
    Field(Node<Field>),
    FragmentSpread(Node<FragmentSpread>),
    InlineFragment(Node<InlineFragment>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub alias: Option<Name>,
    pub name: Name,
    pub arguments: Vec<Node<Argument>>,
    pub directives: DirectiveList,
    pub selection_set: Vec<Selection>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FragmentSpread {
    pub fragment_name: Name,
    pub directives: DirectiveList,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InlineFragment {
    pub type_condition: Option<NamedType>,
    pub directives: DirectiveList,
    pub selection_set: Vec<Selection>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Argument {
    pub name: Name,
    pub value: Node<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DirectiveList(pub Vec<Node<Directive>>);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Directive {
    pub name: Name,
    pub arguments: Vec<Node<Argument>>,
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

/// A type reference: a named type wrapped in any number of list and
/// non-null modifiers.
///
/// `NonNull` never directly wraps another `NonNull`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Named(NamedType),
    List(Box<Type>),
    NonNull(Box<Type>),
}

/// A literal value, as written in a query or schema document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Null,
    Enum(Name),
    Variable(Name),
    String(
        /// The value after escape sequences are resolved
        String,
    ),
    /// Source text of the number
    Float(String),
    /// Source text of the number
    Int(String),
    Boolean(bool),
    List(Vec<Node<Value>>),
    Object(Vec<(Name, Node<Value>)>),
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<SchemaDocument>();
    assert_sync::<SchemaDocument>();
    assert_send::<QueryDocument>();
    assert_sync::<QueryDocument>();
};
