use super::*;
use crate::Parser;
use crate::SyntaxError;
use std::ops::Deref;

impl SchemaDocument {
    /// Parse `input` with the default configuration
    pub fn parse(input: &str) -> Result<Self, SyntaxError> {
        Parser::new().parse_schema(input)
    }
}

impl QueryDocument {
    /// Parse `input` with the default configuration
    pub fn parse(input: &str) -> Result<Self, SyntaxError> {
        Parser::new().parse_query(input)
    }

    /// Find an operation by name, or the anonymous operation when `name` is `None`.
    pub fn operation(&self, name: Option<&str>) -> Option<&Node<OperationDefinition>> {
        self.operations
            .iter()
            .find(|op| op.name.as_deref() == name)
    }

    pub fn fragment(&self, name: &str) -> Option<&Node<FragmentDefinition>> {
        self.fragments.iter().find(|fragment| fragment.name == name)
    }
}

impl Definition {
    pub fn name(&self) -> Option<&Name> {
        match self {
            Self::SchemaDefinition(_) => None,
            Self::ScalarTypeDefinition(def) => Some(&def.name),
            Self::ObjectTypeDefinition(def) => Some(&def.name),
            Self::InterfaceTypeDefinition(def) => Some(&def.name),
            Self::UnionTypeDefinition(def) => Some(&def.name),
            Self::EnumTypeDefinition(def) => Some(&def.name),
            Self::InputObjectTypeDefinition(def) => Some(&def.name),
            Self::DirectiveDefinition(def) => Some(&def.name),
        }
    }

    pub fn location(&self) -> Option<crate::Location> {
        match self {
            Self::SchemaDefinition(def) => def.location(),
            Self::ScalarTypeDefinition(def) => def.location(),
            Self::ObjectTypeDefinition(def) => def.location(),
            Self::InterfaceTypeDefinition(def) => def.location(),
            Self::UnionTypeDefinition(def) => def.location(),
            Self::EnumTypeDefinition(def) => def.location(),
            Self::InputObjectTypeDefinition(def) => def.location(),
            Self::DirectiveDefinition(def) => def.location(),
        }
    }
}

impl DirectiveList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns an iterator of directives with the given name.
    ///
    /// This method is best for repeatable directives.
    /// See also [`get`][Self::get] for non-repeatable directives.
    pub fn get_all<'def: 'name, 'name>(
        &'def self,
        name: &'name str,
    ) -> impl Iterator<Item = &'def Node<Directive>> + 'name {
        self.0.iter().filter(move |dir| dir.name == name)
    }

    /// Returns the first directive with the given name, if any.
    pub fn get(&self, name: &str) -> Option<&Node<Directive>> {
        self.get_all(name).next()
    }

    /// Returns whether there is a directive with the given name
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl Deref for DirectiveList {
    type Target = Vec<Node<Directive>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for DirectiveList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'a> IntoIterator for &'a DirectiveList {
    type Item = &'a Node<Directive>;
    type IntoIter = std::slice::Iter<'a, Node<Directive>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Node<Directive>> for DirectiveList {
    fn from_iter<T: IntoIterator<Item = Node<Directive>>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Directive {
    pub fn argument_by_name(&self, name: &str) -> Option<&Node<Value>> {
        self.arguments
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }
}

impl Field {
    /// The key of this field in the response: its alias, or its name
    pub fn response_key(&self) -> &Name {
        self.alias.as_ref().unwrap_or(&self.name)
    }

    pub fn argument_by_name(&self, name: &str) -> Option<&Node<Value>> {
        self.arguments
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }
}

impl Selection {
    pub fn directives(&self) -> &DirectiveList {
        match self {
            Self::Field(sel) => &sel.directives,
            Self::FragmentSpread(sel) => &sel.directives,
            Self::InlineFragment(sel) => &sel.directives,
        }
    }

    pub fn location(&self) -> Option<crate::Location> {
        match self {
            Self::Field(sel) => sel.location(),
            Self::FragmentSpread(sel) => sel.location(),
            Self::InlineFragment(sel) => sel.location(),
        }
    }
}

impl OperationType {
    /// Get the name of this operation type as it would appear in GraphQL source code.
    pub fn name(self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        }
    }

    /// Get the default name of the object type for this operation type
    pub const fn default_type_name(self) -> &'static str {
        match self {
            OperationType::Query => "Query",
            OperationType::Mutation => "Mutation",
            OperationType::Subscription => "Subscription",
        }
    }

    pub fn is_query(self) -> bool {
        matches!(self, Self::Query)
    }

    pub fn is_mutation(self) -> bool {
        matches!(self, Self::Mutation)
    }

    pub fn is_subscription(self) -> bool {
        matches!(self, Self::Subscription)
    }
}

impl DirectiveLocation {
    /// Get the name of this directive location as it would appear in GraphQL source code.
    pub fn name(self) -> &'static str {
        match self {
            DirectiveLocation::Query => "QUERY",
            DirectiveLocation::Mutation => "MUTATION",
            DirectiveLocation::Subscription => "SUBSCRIPTION",
            DirectiveLocation::Field => "FIELD",
            DirectiveLocation::FragmentDefinition => "FRAGMENT_DEFINITION",
            DirectiveLocation::FragmentSpread => "FRAGMENT_SPREAD",
            DirectiveLocation::InlineFragment => "INLINE_FRAGMENT",
            DirectiveLocation::VariableDefinition => "VARIABLE_DEFINITION",
            DirectiveLocation::Schema => "SCHEMA",
            DirectiveLocation::Scalar => "SCALAR",
            DirectiveLocation::Object => "OBJECT",
            DirectiveLocation::FieldDefinition => "FIELD_DEFINITION",
            DirectiveLocation::ArgumentDefinition => "ARGUMENT_DEFINITION",
            DirectiveLocation::Interface => "INTERFACE",
            DirectiveLocation::Union => "UNION",
            DirectiveLocation::Enum => "ENUM",
            DirectiveLocation::EnumValue => "ENUM_VALUE",
            DirectiveLocation::InputObject => "INPUT_OBJECT",
            DirectiveLocation::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "QUERY" => DirectiveLocation::Query,
            "MUTATION" => DirectiveLocation::Mutation,
            "SUBSCRIPTION" => DirectiveLocation::Subscription,
            "FIELD" => DirectiveLocation::Field,
            "FRAGMENT_DEFINITION" => DirectiveLocation::FragmentDefinition,
            "FRAGMENT_SPREAD" => DirectiveLocation::FragmentSpread,
            "INLINE_FRAGMENT" => DirectiveLocation::InlineFragment,
            "VARIABLE_DEFINITION" => DirectiveLocation::VariableDefinition,
            "SCHEMA" => DirectiveLocation::Schema,
            "SCALAR" => DirectiveLocation::Scalar,
            "OBJECT" => DirectiveLocation::Object,
            "FIELD_DEFINITION" => DirectiveLocation::FieldDefinition,
            "ARGUMENT_DEFINITION" => DirectiveLocation::ArgumentDefinition,
            "INTERFACE" => DirectiveLocation::Interface,
            "UNION" => DirectiveLocation::Union,
            "ENUM" => DirectiveLocation::Enum,
            "ENUM_VALUE" => DirectiveLocation::EnumValue,
            "INPUT_OBJECT" => DirectiveLocation::InputObject,
            "INPUT_FIELD_DEFINITION" => DirectiveLocation::InputFieldDefinition,
            _ => return None,
        })
    }
}

impl From<OperationType> for DirectiveLocation {
    fn from(operation_type: OperationType) -> Self {
        match operation_type {
            OperationType::Query => DirectiveLocation::Query,
            OperationType::Mutation => DirectiveLocation::Mutation,
            OperationType::Subscription => DirectiveLocation::Subscription,
        }
    }
}

impl Type {
    pub fn named(name: impl Into<Name>) -> Self {
        Type::Named(name.into())
    }

    /// Returns this type made non-null, if it isn't already.
    pub fn non_null(self) -> Self {
        match self {
            Type::NonNull(_) => self,
            ty => Type::NonNull(Box::new(ty)),
        }
    }

    /// Returns a list type whose items are this type.
    pub fn list(self) -> Self {
        Type::List(Box::new(self))
    }

    /// Returns this type without its outer non-null modifier.
    pub fn nullable(&self) -> &Type {
        match self {
            Type::NonNull(inner) => inner,
            ty => ty,
        }
    }

    /// Returns the inner named type, after unwrapping all non-null and list markers.
    pub fn inner_named_type(&self) -> &NamedType {
        match self {
            Type::Named(name) => name,
            Type::List(inner) | Type::NonNull(inner) => inner.inner_named_type(),
        }
    }

    /// If the type is a list type (nullable or not), returns the inner item type.
    pub fn item_type(&self) -> Option<&Type> {
        match self.nullable() {
            Type::List(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Type::NonNull(_))
    }

    pub fn is_list(&self) -> bool {
        self.item_type().is_some()
    }

    pub fn is_named(&self) -> bool {
        matches!(self.nullable(), Type::Named(_))
    }

    /// Can a value of type `self` be used where `target` is expected?
    ///
    /// A non-null type is assignable to its nullable counterpart, and list
    /// types are compared item by item.
    pub fn is_assignable_to(&self, target: &Self) -> bool {
        match (target, self) {
            (Type::NonNull(target), Type::NonNull(this)) => this.is_assignable_to(target),
            (Type::NonNull(_), _) => false,
            (target, Type::NonNull(this)) => this.is_assignable_to(target),
            (Type::List(target), Type::List(this)) => this.is_assignable_to(target),
            (Type::Named(target), Type::Named(this)) => target == this,
            _ => false,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn to_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Name> {
        match self {
            Value::Enum(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Name> {
        match self {
            Value::Variable(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the value as an `i32` if it is an integer literal in range.
    pub fn to_i32(&self) -> Option<i32> {
        match self {
            Value::Int(text) => text.parse().ok(),
            _ => None,
        }
    }

    /// Returns the value as an `f64` if it is a numeric literal.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Int(text) | Value::Float(text) => text.parse().ok(),
            _ => None,
        }
    }

    /// Calls `f` with every variable referenced by this value, including
    /// those nested in lists and objects.
    pub fn for_each_variable<'a>(&'a self, f: &mut impl FnMut(&'a Name)) {
        match self {
            Value::Variable(name) => f(name),
            Value::List(items) => items.iter().for_each(|item| item.for_each_variable(f)),
            Value::Object(fields) => fields
                .iter()
                .for_each(|(_, value)| value.for_each_variable(f)),
            _ => {}
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.to_string())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_wrappers() {
        let ty = Type::named("Droid").non_null().list().non_null();
        assert_eq!(ty.to_string(), "[Droid!]!");
        assert_eq!(ty.inner_named_type(), "Droid");
        assert_eq!(ty.item_type().map(ToString::to_string).as_deref(), Some("Droid!"));
        assert!(ty.is_non_null());
        assert!(ty.is_list());
        assert!(!ty.is_named());
    }

    #[test]
    fn assignability() {
        let int = Type::named("Int");
        let non_null_int = Type::named("Int").non_null();
        assert!(non_null_int.is_assignable_to(&int));
        assert!(!int.is_assignable_to(&non_null_int));
        assert!(non_null_int.clone().list().is_assignable_to(&int.clone().list()));
        assert!(!int.clone().list().is_assignable_to(&int));
        assert!(!Type::named("Float").is_assignable_to(&int));
    }

    #[test]
    fn response_key_prefers_alias() {
        let doc = QueryDocument::parse("{ a: hero b: hero hero }").unwrap();
        let keys: Vec<_> = doc.operations[0]
            .selection_set
            .iter()
            .map(|sel| match sel {
                Selection::Field(field) => field.response_key().to_string(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(keys, ["a", "b", "hero"]);
    }
}
