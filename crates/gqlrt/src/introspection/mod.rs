//! [Schema introspection](https://spec.graphql.org/October2021/#sec-Schema-Introspection)
//!
//! The `__schema` and `__type` meta-fields resolve to the object values of
//! this module, which read the [`Schema`] through [`ObjectValue`] methods.
//! [`Schema::from_introspection`] goes the other way, rebuilding a schema
//! from the JSON result of an introspection query.

use crate::ast;
use crate::ast::Type;
use crate::resolvers::resolved;
use crate::resolvers::MethodCall;
use crate::resolvers::ObjectValue;
use crate::resolvers::Resolution;
use crate::resolvers::Value;
use crate::response::JsonMap;
use crate::response::JsonValue;
use crate::schema::DirectiveDefinition;
use crate::schema::EnumValueDefinition;
use crate::schema::ExtendedType;
use crate::schema::FieldDefinition;
use crate::schema::InputValueDefinition;
use crate::Name;
use crate::Node;
use crate::Schema;
use std::sync::Arc;

mod from_json;

pub use self::from_json::IntrospectionError;

/// The value of `__schema`
pub struct SchemaIntrospection {
    schema: Arc<Schema>,
}

/// A `__Type`: a named type, or a list or non-null wrapper around one
struct TypeIntrospection {
    schema: Arc<Schema>,
    ty: Type,
}

struct FieldIntrospection {
    schema: Arc<Schema>,
    def: Node<FieldDefinition>,
}

struct InputValueIntrospection {
    schema: Arc<Schema>,
    def: Node<InputValueDefinition>,
}

struct EnumValueIntrospection {
    def: Node<EnumValueDefinition>,
}

struct DirectiveIntrospection {
    schema: Arc<Schema>,
    def: Node<DirectiveDefinition>,
}

impl SchemaIntrospection {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }
}

/// The value of `__type(name:)`: null for an unknown name.
pub fn type_by_name(schema: &Arc<Schema>, name: &str) -> Value {
    match schema.types.get_key_value(name) {
        Some((name, _)) => type_value(schema, Type::Named(name.clone())),
        None => Value::Null,
    }
}

fn type_value(schema: &Arc<Schema>, ty: Type) -> Value {
    Value::object(TypeIntrospection {
        schema: schema.clone(),
        ty,
    })
}

fn named_type_value(schema: &Arc<Schema>, name: Option<&Name>) -> Value {
    name.map_or(Value::Null, |name| type_by_name(schema, name))
}

fn type_list<'a>(schema: &Arc<Schema>, names: impl Iterator<Item = &'a Name>) -> Value {
    Value::list(names.map(|name| type_value(schema, Type::Named(name.clone()))))
}

fn string(value: Option<&str>) -> Value {
    value.map_or(Value::Null, Value::json)
}

/// `includeDeprecated: Boolean = false` is nullable
fn include_deprecated(args: &JsonMap) -> bool {
    args.get("includeDeprecated")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false)
}

fn is_deprecated(directives: &ast::DirectiveList) -> bool {
    directives.has("deprecated")
}

fn deprecation_reason(directives: &ast::DirectiveList) -> Value {
    match directives.get("deprecated") {
        Some(directive) => Value::json(
            directive
                .argument_by_name("reason")
                .and_then(|reason| reason.as_str())
                .unwrap_or("No longer supported"),
        ),
        None => Value::Null,
    }
}

fn input_values<'a>(
    schema: &Arc<Schema>,
    defs: impl Iterator<Item = &'a Node<InputValueDefinition>>,
    args: &JsonMap,
) -> Value {
    let include_deprecated = include_deprecated(args);
    Value::list(
        defs.filter(|def| include_deprecated || !is_deprecated(&def.directives))
            .map(|def| {
                Value::object(InputValueIntrospection {
                    schema: schema.clone(),
                    def: def.clone(),
                })
            }),
    )
}

impl ObjectValue for SchemaIntrospection {
    fn type_name(&self) -> &str {
        "__Schema"
    }

    fn call_method(self: Arc<Self>, name: &str, _call: MethodCall) -> Option<Resolution> {
        let schema = &self.schema;
        let schema_def = &schema.schema_definition;
        let value = match name {
            "description" => string(schema_def.description.as_deref()),
            "types" => Value::list(
                schema
                    .types
                    .keys()
                    .map(|name| type_value(schema, Type::Named(name.clone()))),
            ),
            "querytype" => named_type_value(schema, schema_def.query.as_ref()),
            "mutationtype" => named_type_value(schema, schema_def.mutation.as_ref()),
            "subscriptiontype" => named_type_value(schema, schema_def.subscription.as_ref()),
            "directives" => Value::list(schema.directive_definitions.values().map(|def| {
                Value::object(DirectiveIntrospection {
                    schema: schema.clone(),
                    def: def.clone(),
                })
            })),
            _ => return None,
        };
        Some(resolved(value))
    }
}

impl ObjectValue for TypeIntrospection {
    fn type_name(&self) -> &str {
        "__Type"
    }

    fn call_method(self: Arc<Self>, name: &str, call: MethodCall) -> Option<Resolution> {
        let value = match &self.ty {
            Type::Named(type_name) => self.named_type_field(type_name, name, &call.args)?,
            Type::List(inner) => match name {
                "kind" => Value::json("LIST"),
                "oftype" => type_value(&self.schema, (**inner).clone()),
                _ => self.wrapper_field(name)?,
            },
            Type::NonNull(inner) => match name {
                "kind" => Value::json("NON_NULL"),
                "oftype" => type_value(&self.schema, (**inner).clone()),
                _ => self.wrapper_field(name)?,
            },
        };
        Some(resolved(value))
    }
}

impl TypeIntrospection {
    /// Every field other than `kind` and `ofType` is null on list and non-null types
    fn wrapper_field(&self, name: &str) -> Option<Value> {
        match name {
            "name" | "description" | "fields" | "interfaces" | "possibletypes" | "enumvalues"
            | "inputfields" | "specifiedbyurl" => Some(Value::Null),
            _ => None,
        }
    }

    fn named_type_field(&self, type_name: &Name, name: &str, args: &JsonMap) -> Option<Value> {
        let schema = &self.schema;
        let def = schema.types.get(type_name)?;
        Some(match name {
            "kind" => Value::json(def.kind()),
            "name" => Value::json(def.name().as_str()),
            "description" => string(def.description()),
            "fields" => {
                let Some(fields) = def.fields() else {
                    return Some(Value::Null);
                };
                let include_deprecated = include_deprecated(args);
                Value::list(
                    fields
                        .values()
                        .filter(|def| include_deprecated || !is_deprecated(&def.directives))
                        .map(|def| {
                            Value::object(FieldIntrospection {
                                schema: schema.clone(),
                                def: def.clone(),
                            })
                        }),
                )
            }
            "interfaces" => match def {
                ExtendedType::Object(def) => type_list(schema, def.implements_interfaces.iter()),
                ExtendedType::Interface(def) => type_list(schema, def.implements_interfaces.iter()),
                _ => Value::Null,
            },
            "possibletypes" => match def {
                ExtendedType::Interface(def) => type_list(schema, def.possible_types.iter()),
                ExtendedType::Union(def) => type_list(schema, def.members.iter()),
                _ => Value::Null,
            },
            "enumvalues" => {
                let ExtendedType::Enum(def) = def else {
                    return Some(Value::Null);
                };
                let include_deprecated = include_deprecated(args);
                Value::list(
                    def.values
                        .values()
                        .filter(|def| include_deprecated || !is_deprecated(&def.directives))
                        .map(|def| Value::object(EnumValueIntrospection { def: def.clone() })),
                )
            }
            "inputfields" => {
                let ExtendedType::InputObject(def) = def else {
                    return Some(Value::Null);
                };
                input_values(schema, def.fields.values(), args)
            }
            "oftype" => Value::Null,
            "specifiedbyurl" => {
                let ExtendedType::Scalar(def) = def else {
                    return Some(Value::Null);
                };
                string(
                    def.directives
                        .get("specifiedBy")
                        .and_then(|directive| directive.argument_by_name("url"))
                        .and_then(|url| url.as_str()),
                )
            }
            _ => return None,
        })
    }
}

impl ObjectValue for FieldIntrospection {
    fn type_name(&self) -> &str {
        "__Field"
    }

    fn call_method(self: Arc<Self>, name: &str, call: MethodCall) -> Option<Resolution> {
        let value = match name {
            "name" => Value::json(self.def.name.as_str()),
            "description" => string(self.def.description.as_deref()),
            "args" => input_values(&self.schema, self.def.arguments.iter(), &call.args),
            "type" => type_value(&self.schema, self.def.ty.clone()),
            "isdeprecated" => Value::json(is_deprecated(&self.def.directives)),
            "deprecationreason" => deprecation_reason(&self.def.directives),
            _ => return None,
        };
        Some(resolved(value))
    }
}

impl ObjectValue for InputValueIntrospection {
    fn type_name(&self) -> &str {
        "__InputValue"
    }

    fn call_method(self: Arc<Self>, name: &str, _call: MethodCall) -> Option<Resolution> {
        let value = match name {
            "name" => Value::json(self.def.name.as_str()),
            "description" => string(self.def.description.as_deref()),
            "type" => type_value(&self.schema, (*self.def.ty).clone()),
            "defaultvalue" => match &self.def.default_value {
                Some(value) => Value::json(value.to_string()),
                None => Value::Null,
            },
            "isdeprecated" => Value::json(is_deprecated(&self.def.directives)),
            "deprecationreason" => deprecation_reason(&self.def.directives),
            _ => return None,
        };
        Some(resolved(value))
    }
}

impl ObjectValue for EnumValueIntrospection {
    fn type_name(&self) -> &str {
        "__EnumValue"
    }

    fn call_method(self: Arc<Self>, name: &str, _call: MethodCall) -> Option<Resolution> {
        let value = match name {
            "name" => Value::json(self.def.value.as_str()),
            "description" => string(self.def.description.as_deref()),
            "isdeprecated" => Value::json(is_deprecated(&self.def.directives)),
            "deprecationreason" => deprecation_reason(&self.def.directives),
            _ => return None,
        };
        Some(resolved(value))
    }
}

impl ObjectValue for DirectiveIntrospection {
    fn type_name(&self) -> &str {
        "__Directive"
    }

    fn call_method(self: Arc<Self>, name: &str, call: MethodCall) -> Option<Resolution> {
        let value = match name {
            "name" => Value::json(self.def.name.as_str()),
            "description" => string(self.def.description.as_deref()),
            "args" => input_values(&self.schema, self.def.arguments.iter(), &call.args),
            "locations" => Value::list(
                self.def
                    .locations
                    .iter()
                    .map(|location| Value::json(location.name())),
            ),
            "isrepeatable" => Value::json(self.def.repeatable),
            _ => return None,
        };
        Some(resolved(value))
    }
}
