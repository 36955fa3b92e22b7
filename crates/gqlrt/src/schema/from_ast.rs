use super::*;
use crate::ast::OperationType;
use crate::Parser;
use crate::SyntaxError;

/// Builds a [`Schema`] from one or more SDL documents.
///
/// Documents are added in order. An object type may be declared again
/// further down (or in a later document) to change an earlier declaration:
///
/// * `extend type X { … }` or `type X @graphql(alter: "add") { … }` merges
///   fields, interfaces, and directives into `X`. A field declared again
///   replaces the earlier definition.
/// * `type X @graphql(alter: "drop") { … }` removes the named fields,
///   interfaces, and directives from `X`.
/// * `type X @graphql(if: "missing") { … }` declares `X` only if it is not
///   defined yet.
///
/// Cross-references are checked by [`build`][Self::build], so types may be
/// used before they are declared.
#[derive(Debug)]
pub struct SchemaBuilder {
    pub(crate) schema: Schema,
    schema_definition_found: bool,
    strict: bool,
}

/// A schema document that could not be turned into a [`Schema`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("must not have multiple `schema` definitions")]
    SchemaDefinitionCollision,

    #[error("duplicate definitions for the `{0}` root operation type")]
    DuplicateRootOperation(&'static str),

    #[error("Root operation type \"{0}\" is not an object type")]
    RootOperationNotObject(Name),

    #[error("Type \"{0}\" defined more than once")]
    TypeDefinitionCollision(Name),

    #[error("Directive \"@{0}\" defined more than once")]
    DirectiveDefinitionCollision(Name),

    #[error("Type \"{0}\" extended before it is defined")]
    OrphanTypeExtension(Name),

    #[error("Field \"{field}\" defined more than once in type \"{type_name}\"")]
    DuplicateField { type_name: Name, field: Name },

    #[error("@graphql on type \"{0}\" needs an `alter` or `if` argument")]
    MissingAlterArgument(Name),

    #[error("Invalid @graphql({argument}: {value:?}) on type \"{type_name}\"")]
    InvalidAlterArgument {
        type_name: Name,
        argument: &'static str,
        value: String,
    },

    #[error("Unknown type \"{0}\"")]
    UnknownType(Name),

    #[error("Unknown interface \"{0}\"")]
    UnknownInterface(Name),

    #[error("Union \"{union}\" can only include object types, but \"{member}\" is not one")]
    InvalidUnionMember { union: Name, member: Name },

    #[error("Unknown directive \"@{0}\"")]
    UnknownDirective(Name),

    #[error("Unknown argument \"{argument}\" on directive \"@{directive}\"")]
    UnknownDirectiveArgument { directive: Name, argument: Name },
}

/// How a re-declaration of an object type changes the existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alter {
    Add,
    Drop,
    IfMissing,
}

const META_DIRECTIVE: &str = "graphql";

fn meta_document() -> &'static ast::SchemaDocument {
    static META_SCHEMA: OnceLock<ast::SchemaDocument> = OnceLock::new();
    META_SCHEMA.get_or_init(|| {
        let result = Parser::new().parse_schema(include_str!("meta.graphql"));
        debug_assert!(result.is_ok(), "{result:?}");
        result.unwrap_or_default()
    })
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    /// Returns a new schema builder initialized with built-in directives, built-in scalars,
    /// and introspection types
    pub fn new() -> Self {
        let mut builder = SchemaBuilder {
            schema: Schema {
                schema_definition: SchemaDefinition::default(),
                directive_definitions: IndexMap::new(),
                types: IndexMap::new(),
            },
            schema_definition_found: false,
            strict: false,
        };
        let result = builder.add_document(meta_document());
        debug_assert!(result.is_ok(), "{result:?}");
        builder
    }

    /// In strict mode, a field declared twice in the same type declaration
    /// is an error. Otherwise the last declaration wins and a warning is logged.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse SDL source text and add its definitions.
    pub fn parse(&mut self, source_text: &str) -> Result<&mut Self, SchemaError> {
        let document = Parser::new().parse_schema(source_text)?;
        self.add_document(&document)?;
        Ok(self)
    }

    /// Add the definitions of a parsed SDL document to the schema being built
    pub fn add_document(&mut self, document: &ast::SchemaDocument) -> Result<(), SchemaError> {
        for definition in &document.definitions {
            match definition {
                ast::Definition::SchemaDefinition(def) => self.set_schema_definition(def)?,
                ast::Definition::DirectiveDefinition(def) => {
                    if self.schema.directive_definitions.contains_key(&def.name) {
                        return Err(SchemaError::DirectiveDefinitionCollision(def.name.clone()));
                    }
                    self.schema
                        .directive_definitions
                        .insert(def.name.clone(), def.clone());
                }
                ast::Definition::ObjectTypeDefinition(def) => self.add_object(def)?,
                ast::Definition::ScalarTypeDefinition(def) => {
                    self.insert_type(&def.name, ExtendedType::Scalar(ScalarType::from_ast(def)))?
                }
                ast::Definition::InterfaceTypeDefinition(def) => {
                    let ty = InterfaceType::from_ast(def, self.strict)?;
                    self.insert_type(&def.name, ExtendedType::Interface(ty))?
                }
                ast::Definition::UnionTypeDefinition(def) => {
                    self.insert_type(&def.name, ExtendedType::Union(UnionType::from_ast(def)))?
                }
                ast::Definition::EnumTypeDefinition(def) => {
                    self.insert_type(&def.name, ExtendedType::Enum(EnumType::from_ast(def)))?
                }
                ast::Definition::InputObjectTypeDefinition(def) => {
                    let ty = InputObjectType::from_ast(def, self.strict)?;
                    self.insert_type(&def.name, ExtendedType::InputObject(ty))?
                }
            }
        }
        Ok(())
    }

    fn insert_type(&mut self, name: &Name, ty: ExtendedType) -> Result<(), SchemaError> {
        if self.schema.types.contains_key(name) {
            return Err(SchemaError::TypeDefinitionCollision(name.clone()));
        }
        self.schema.types.insert(name.clone(), ty);
        Ok(())
    }

    fn set_schema_definition(
        &mut self,
        definition: &Node<ast::SchemaDefinition>,
    ) -> Result<(), SchemaError> {
        if self.schema_definition_found {
            return Err(SchemaError::SchemaDefinitionCollision);
        }
        self.schema_definition_found = true;
        let schema_def = &mut self.schema.schema_definition;
        schema_def.description = definition.description.clone();
        schema_def.directives = definition.directives.clone();
        for root in &definition.root_operations {
            let (operation_type, object_type_name) = &**root;
            let slot = match operation_type {
                OperationType::Query => &mut schema_def.query,
                OperationType::Mutation => &mut schema_def.mutation,
                OperationType::Subscription => &mut schema_def.subscription,
            };
            if slot.is_some() {
                return Err(SchemaError::DuplicateRootOperation(operation_type.name()));
            }
            *slot = Some(object_type_name.clone());
        }
        Ok(())
    }

    fn add_object(&mut self, definition: &Node<ast::ObjectTypeDefinition>) -> Result<(), SchemaError> {
        let name = &definition.name;
        let alter = if definition.extend {
            Some(Alter::Add)
        } else {
            alter_argument(definition)?
        };
        let declared = ObjectType::from_ast(definition, self.strict)?;
        let Some(existing) = self.schema.types.get_mut(name) else {
            return match alter {
                Some(Alter::Drop) => Err(SchemaError::OrphanTypeExtension(name.clone())),
                Some(Alter::Add) if definition.extend => {
                    Err(SchemaError::OrphanTypeExtension(name.clone()))
                }
                _ => {
                    self.schema
                        .types
                        .insert(name.clone(), ExtendedType::Object(declared));
                    Ok(())
                }
            };
        };
        if let Some(Alter::IfMissing) = alter {
            tracing::debug!(type_name = %name, "type already defined, skipping declaration");
            return Ok(());
        }
        let ExtendedType::Object(existing) = existing else {
            return Err(SchemaError::TypeDefinitionCollision(name.clone()));
        };
        match alter {
            None | Some(Alter::IfMissing) => {
                Err(SchemaError::TypeDefinitionCollision(name.clone()))
            }
            Some(Alter::Add) => {
                existing.make_mut().merge(&declared);
                Ok(())
            }
            Some(Alter::Drop) => {
                existing.make_mut().subtract(&declared);
                Ok(())
            }
        }
    }

    /// Returns the schema built from all added documents, after checking that
    /// every name it references is defined.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let Self {
            mut schema,
            schema_definition_found,
            strict: _,
        } = self;

        check_type_references(&schema)?;
        link_interfaces(&mut schema)?;
        check_union_members(&schema)?;
        check_directive_applications(&mut schema)?;

        if !schema_definition_found {
            // Implicit `schema`, from types named after the operation kinds
            let if_has_object_type = |ty: OperationType| {
                let name = ty.default_type_name();
                schema
                    .types
                    .get(name)?
                    .is_object()
                    .then(|| Name::new(name))
            };
            let query = if_has_object_type(OperationType::Query);
            let mutation = if_has_object_type(OperationType::Mutation);
            let subscription = if_has_object_type(OperationType::Subscription);
            schema.schema_definition.query = query;
            schema.schema_definition.mutation = mutation;
            schema.schema_definition.subscription = subscription;
        }
        for (_, root) in schema.schema_definition.iter_root_operations() {
            if schema.get_object(root).is_none() {
                return Err(SchemaError::RootOperationNotObject(root.clone()));
            }
        }
        tracing::debug!(
            types = schema.types.len(),
            directives = schema.directive_definitions.len(),
            "schema built"
        );
        Ok(schema)
    }
}

/// Reads `@graphql(alter:, if:)` on an object type declaration.
fn alter_argument(definition: &ast::ObjectTypeDefinition) -> Result<Option<Alter>, SchemaError> {
    let Some(directive) = definition.directives.get(META_DIRECTIVE) else {
        return Ok(None);
    };
    let string_arg = |argument: &'static str| -> Result<Option<String>, SchemaError> {
        match directive.argument_by_name(argument).map(|value| &**value) {
            None | Some(ast::Value::Null) => Ok(None),
            Some(ast::Value::String(value)) => Ok(Some(value.clone())),
            Some(value) => Err(SchemaError::InvalidAlterArgument {
                type_name: definition.name.clone(),
                argument,
                value: value.to_string(),
            }),
        }
    };
    let invalid = |argument, value: String| SchemaError::InvalidAlterArgument {
        type_name: definition.name.clone(),
        argument,
        value,
    };
    if let Some(condition) = string_arg("if")? {
        return match condition.as_str() {
            "missing" => Ok(Some(Alter::IfMissing)),
            _ => Err(invalid("if", condition)),
        };
    }
    match string_arg("alter")? {
        Some(alter) => match alter.as_str() {
            "add" => Ok(Some(Alter::Add)),
            "drop" => Ok(Some(Alter::Drop)),
            _ => Err(invalid("alter", alter)),
        },
        None => Err(SchemaError::MissingAlterArgument(definition.name.clone())),
    }
}

/// Collects fields keyed by name. A repeated name replaces the earlier
/// definition, keeping its position.
fn collect_fields<T>(
    type_name: &Name,
    fields: impl IntoIterator<Item = (Name, Node<T>)>,
    strict: bool,
) -> Result<IndexMap<Name, Node<T>>, SchemaError> {
    let mut map = IndexMap::new();
    for (name, field) in fields {
        if map.insert(name.clone(), field).is_some() {
            if strict {
                return Err(SchemaError::DuplicateField {
                    type_name: type_name.clone(),
                    field: name,
                });
            }
            tracing::warn!(
                type_name = %type_name,
                field = %name,
                "field defined more than once in the same declaration, the last one wins"
            );
        }
    }
    Ok(map)
}

fn without_meta_directive(directives: &DirectiveList) -> DirectiveList {
    directives
        .iter()
        .filter(|directive| directive.name != META_DIRECTIVE)
        .cloned()
        .collect()
}

impl ScalarType {
    fn from_ast(definition: &Node<ast::ScalarTypeDefinition>) -> Node<Self> {
        definition.same_location(Self {
            description: definition.description.clone(),
            name: definition.name.clone(),
            directives: definition.directives.clone(),
        })
    }
}

impl ObjectType {
    fn from_ast(
        definition: &Node<ast::ObjectTypeDefinition>,
        strict: bool,
    ) -> Result<Node<Self>, SchemaError> {
        Ok(definition.same_location(Self {
            description: definition.description.clone(),
            name: definition.name.clone(),
            implements_interfaces: definition.implements_interfaces.iter().cloned().collect(),
            directives: without_meta_directive(&definition.directives),
            fields: collect_fields(
                &definition.name,
                definition
                    .fields
                    .iter()
                    .map(|field| (field.name.clone(), field.clone())),
                strict,
            )?,
        }))
    }

    fn merge(&mut self, other: &Self) {
        if other.description.is_some() {
            self.description = other.description.clone();
        }
        self.implements_interfaces
            .extend(other.implements_interfaces.iter().cloned());
        for directive in &other.directives {
            match self
                .directives
                .iter_mut()
                .find(|existing| existing.name == directive.name)
            {
                Some(existing) => *existing = directive.clone(),
                None => self.directives.push(directive.clone()),
            }
        }
        for (name, field) in &other.fields {
            self.fields.insert(name.clone(), field.clone());
        }
    }

    fn subtract(&mut self, other: &Self) {
        for name in &other.implements_interfaces {
            self.implements_interfaces.shift_remove(name);
        }
        self.directives
            .retain(|directive| other.directives.get(&directive.name).is_none());
        for name in other.fields.keys() {
            self.fields.shift_remove(name);
        }
    }
}

impl InterfaceType {
    fn from_ast(
        definition: &Node<ast::InterfaceTypeDefinition>,
        strict: bool,
    ) -> Result<Node<Self>, SchemaError> {
        Ok(definition.same_location(Self {
            description: definition.description.clone(),
            name: definition.name.clone(),
            implements_interfaces: definition.implements_interfaces.iter().cloned().collect(),
            directives: definition.directives.clone(),
            fields: collect_fields(
                &definition.name,
                definition
                    .fields
                    .iter()
                    .map(|field| (field.name.clone(), field.clone())),
                strict,
            )?,
            possible_types: IndexSet::new(),
        }))
    }
}

impl UnionType {
    fn from_ast(definition: &Node<ast::UnionTypeDefinition>) -> Node<Self> {
        definition.same_location(Self {
            description: definition.description.clone(),
            name: definition.name.clone(),
            directives: definition.directives.clone(),
            members: definition.members.iter().cloned().collect(),
        })
    }
}

impl EnumType {
    fn from_ast(definition: &Node<ast::EnumTypeDefinition>) -> Node<Self> {
        definition.same_location(Self {
            description: definition.description.clone(),
            name: definition.name.clone(),
            directives: definition.directives.clone(),
            values: definition
                .values
                .iter()
                .map(|value| (value.value.clone(), value.clone()))
                .collect(),
        })
    }
}

impl InputObjectType {
    fn from_ast(
        definition: &Node<ast::InputObjectTypeDefinition>,
        strict: bool,
    ) -> Result<Node<Self>, SchemaError> {
        Ok(definition.same_location(Self {
            description: definition.description.clone(),
            name: definition.name.clone(),
            directives: definition.directives.clone(),
            fields: collect_fields(
                &definition.name,
                definition
                    .fields
                    .iter()
                    .map(|field| (field.name.clone(), field.clone())),
                strict,
            )?,
        }))
    }
}

fn check_type_reference(schema: &Schema, ty: &Type) -> Result<(), SchemaError> {
    let name = ty.inner_named_type();
    if schema.types.contains_key(name) {
        Ok(())
    } else {
        Err(SchemaError::UnknownType(name.clone()))
    }
}

fn check_arguments(
    schema: &Schema,
    arguments: &[Node<InputValueDefinition>],
) -> Result<(), SchemaError> {
    arguments
        .iter()
        .try_for_each(|argument| check_type_reference(schema, &argument.ty))
}

fn check_type_references(schema: &Schema) -> Result<(), SchemaError> {
    for ty in schema.types.values() {
        match ty {
            ExtendedType::Object(_) | ExtendedType::Interface(_) => {
                for field in ty.fields().into_iter().flat_map(|fields| fields.values()) {
                    check_type_reference(schema, &field.ty)?;
                    check_arguments(schema, &field.arguments)?;
                }
            }
            ExtendedType::InputObject(def) => {
                for field in def.fields.values() {
                    check_type_reference(schema, &field.ty)?;
                }
            }
            ExtendedType::Scalar(_) | ExtendedType::Union(_) | ExtendedType::Enum(_) => {}
        }
    }
    for directive in schema.directive_definitions.values() {
        check_arguments(schema, &directive.arguments)?;
    }
    Ok(())
}

/// Checks `implements` clauses and fills interface `possible_types`.
fn link_interfaces(schema: &mut Schema) -> Result<(), SchemaError> {
    let mut implementations = Vec::new();
    for ty in schema.types.values() {
        let (implements_interfaces, is_object) = match ty {
            ExtendedType::Object(def) => (&def.implements_interfaces, true),
            ExtendedType::Interface(def) => (&def.implements_interfaces, false),
            _ => continue,
        };
        for interface in implements_interfaces {
            if schema.get_interface(interface).is_none() {
                return Err(SchemaError::UnknownInterface(interface.clone()));
            }
            if is_object {
                implementations.push((interface.clone(), ty.name().clone()));
            }
        }
    }
    for ty in schema.types.values_mut() {
        if let ExtendedType::Interface(def) = ty {
            if !def.possible_types.is_empty() {
                def.make_mut().possible_types.clear();
            }
        }
    }
    for (interface, object) in implementations {
        if let Some(ExtendedType::Interface(def)) = schema.types.get_mut(&interface) {
            def.make_mut().possible_types.insert(object);
        }
    }
    Ok(())
}

fn check_union_members(schema: &Schema) -> Result<(), SchemaError> {
    for ty in schema.types.values() {
        let ExtendedType::Union(def) = ty else {
            continue;
        };
        for member in &def.members {
            match schema.types.get(member) {
                None => return Err(SchemaError::UnknownType(member.clone())),
                Some(ExtendedType::Object(_)) => {}
                Some(_) => {
                    return Err(SchemaError::InvalidUnionMember {
                        union: def.name.clone(),
                        member: member.clone(),
                    })
                }
            }
        }
    }
    Ok(())
}

/// Checks every directive application against its definition, and appends
/// arguments that were left out but have a default value.
fn complete_directives(
    definitions: &IndexMap<Name, Node<DirectiveDefinition>>,
    directives: &mut DirectiveList,
) -> Result<(), SchemaError> {
    for directive in directives.iter_mut() {
        let Some(definition) = definitions.get(&directive.name) else {
            return Err(SchemaError::UnknownDirective(directive.name.clone()));
        };
        if let Some(unknown) = directive.arguments.iter().find(|argument| {
            !definition
                .arguments
                .iter()
                .any(|def| def.name == argument.name)
        }) {
            return Err(SchemaError::UnknownDirectiveArgument {
                directive: directive.name.clone(),
                argument: unknown.name.clone(),
            });
        }
        let defaults: Vec<_> = definition
            .arguments
            .iter()
            .filter(|def| directive.argument_by_name(&def.name).is_none())
            .filter_map(|def| {
                let value = def.default_value.clone()?;
                Some(Node::new(ast::Argument {
                    name: def.name.clone(),
                    value,
                }))
            })
            .collect();
        if !defaults.is_empty() {
            directive.make_mut().arguments.extend(defaults);
        }
    }
    Ok(())
}

fn complete_input_values(
    definitions: &IndexMap<Name, Node<DirectiveDefinition>>,
    values: &mut [Node<InputValueDefinition>],
) -> Result<(), SchemaError> {
    for value in values {
        if !value.directives.is_empty() {
            complete_directives(definitions, &mut value.make_mut().directives)?;
        }
    }
    Ok(())
}

fn complete_fields(
    definitions: &IndexMap<Name, Node<DirectiveDefinition>>,
    fields: &mut IndexMap<Name, Node<FieldDefinition>>,
) -> Result<(), SchemaError> {
    for field in fields.values_mut() {
        let needs_completion = !field.directives.is_empty()
            || field
                .arguments
                .iter()
                .any(|argument| !argument.directives.is_empty());
        if needs_completion {
            let field = field.make_mut();
            complete_directives(definitions, &mut field.directives)?;
            complete_input_values(definitions, &mut field.arguments)?;
        }
    }
    Ok(())
}

fn check_directive_applications(schema: &mut Schema) -> Result<(), SchemaError> {
    let definitions = &schema.directive_definitions;
    complete_directives(definitions, &mut schema.schema_definition.directives)?;
    for ty in schema.types.values_mut() {
        match ty {
            ExtendedType::Scalar(def) => {
                if !def.directives.is_empty() {
                    complete_directives(definitions, &mut def.make_mut().directives)?
                }
            }
            ExtendedType::Object(def) => {
                let def = def.make_mut();
                complete_directives(definitions, &mut def.directives)?;
                complete_fields(definitions, &mut def.fields)?;
            }
            ExtendedType::Interface(def) => {
                let def = def.make_mut();
                complete_directives(definitions, &mut def.directives)?;
                complete_fields(definitions, &mut def.fields)?;
            }
            ExtendedType::Union(def) => {
                if !def.directives.is_empty() {
                    complete_directives(definitions, &mut def.make_mut().directives)?
                }
            }
            ExtendedType::Enum(def) => {
                let needs_completion = !def.directives.is_empty()
                    || def.values.values().any(|value| !value.directives.is_empty());
                if needs_completion {
                    let def = def.make_mut();
                    complete_directives(definitions, &mut def.directives)?;
                    for value in def.values.values_mut() {
                        if !value.directives.is_empty() {
                            complete_directives(definitions, &mut value.make_mut().directives)?;
                        }
                    }
                }
            }
            ExtendedType::InputObject(def) => {
                let def = def.make_mut();
                complete_directives(definitions, &mut def.directives)?;
                for field in def.fields.values_mut() {
                    if !field.directives.is_empty() {
                        complete_directives(definitions, &mut field.make_mut().directives)?;
                    }
                }
            }
        }
    }
    Ok(())
}
