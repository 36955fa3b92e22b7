use super::panic_message;
use super::ExecutionContext;
use crate::ast;
use crate::ast::Type;
use crate::resolvers::FieldError;
use crate::resolvers::ResolveRequest;
use crate::resolvers::Resolution;
use crate::resolvers::Resolver;
use crate::resolvers::Value;
use crate::response::JsonMap;
use crate::response::JsonValue;
use crate::response::ResponseDataPathSegment;
use crate::schema::ExtendedType;
use crate::schema::FieldDefinition;
use crate::values::coerce_argument_values;
use crate::values::is_excluded;
use crate::Location;
use crate::Name;
use crate::Node;
use crate::Schema;
use futures::FutureExt;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;

/// <https://spec.graphql.org/October2021/#sec-Normal-and-Serial-Execution>
#[derive(Debug, Copy, Clone)]
pub(crate) enum ExecutionMode {
    /// Every field is resolved before the first one is written
    Normal,
    /// Top-level fields of a mutation are resolved and written one at a time
    Sequential,
}

/// Returned in `Err` when a field error occurred at some non-nullable place
///
/// <https://spec.graphql.org/October2021/#sec-Handling-Field-Errors>
pub(crate) struct PropagateNull;

/// The fields sharing one response key, and the object they are selected on
#[derive(Clone)]
pub(crate) struct CollectedField<'a> {
    pub(crate) parent_type: &'a Name,
    pub(crate) parent_value: Value,
    pub(crate) fields: Vec<&'a Node<ast::Field>>,
}

pub(crate) type GroupedFields<'a> = IndexMap<&'a Name, CollectedField<'a>>;

/// A field whose resolution was requested but not awaited yet
pub(crate) struct PreparedField<'a> {
    pub(crate) key: &'a Name,
    pub(crate) definition: &'a Node<FieldDefinition>,
    pub(crate) fields: Vec<&'a Node<ast::Field>>,
    pub(crate) resolution: Result<Resolution, FieldError>,
}

/// Depth-first writer of the `data` JSON text.
pub(crate) struct Walker<'a> {
    pub(crate) ctx: ExecutionContext,
    pub(crate) schema: &'a Schema,
    pub(crate) document: &'a ast::QueryDocument,
    pub(crate) resolver: &'a dyn Resolver,
    pub(crate) variables: &'a JsonMap,
    pub(crate) out: String,
    pub(crate) path: Vec<ResponseDataPathSegment>,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(
        ctx: ExecutionContext,
        schema: &'a Schema,
        document: &'a ast::QueryDocument,
        resolver: &'a dyn Resolver,
        variables: &'a JsonMap,
    ) -> Self {
        Self {
            ctx,
            schema,
            document,
            resolver,
            variables,
            out: String::new(),
            path: Vec::new(),
        }
    }

    /// Executes a query or mutation, returning the `data` JSON text.
    pub(crate) async fn execute_operation(
        &mut self,
        operation: &'a ast::OperationDefinition,
        root_type: &'a Name,
        root_value: Value,
    ) -> String {
        let _slot = self.ctx.acquire_slot().await;
        let mode = if operation.operation_type.is_mutation() {
            ExecutionMode::Sequential
        } else {
            ExecutionMode::Normal
        };
        let grouped = self.collect_fields(root_type, &root_value, &operation.selection_set);
        self.out.clear();
        if self.write_object(mode, grouped).await.is_err() {
            self.out.clear();
            self.out.push_str("null");
        }
        std::mem::take(&mut self.out)
    }

    /// <https://spec.graphql.org/October2021/#CollectFields()>
    pub(crate) fn collect_fields(
        &self,
        parent_type: &'a Name,
        parent_value: &Value,
        selections: &'a [ast::Selection],
    ) -> GroupedFields<'a> {
        let mut grouped = IndexMap::new();
        self.collect_into(
            parent_type,
            parent_value,
            selections,
            &mut HashSet::new(),
            &mut grouped,
        );
        grouped
    }

    fn collect_into(
        &self,
        parent_type: &'a Name,
        parent_value: &Value,
        selections: &'a [ast::Selection],
        visited_fragments: &mut HashSet<&'a Name>,
        grouped: &mut GroupedFields<'a>,
    ) {
        for selection in selections {
            if is_excluded(selection.directives(), self.variables) {
                continue;
            }
            match selection {
                ast::Selection::Field(field) => grouped
                    .entry(field.response_key())
                    .or_insert_with(|| CollectedField {
                        parent_type,
                        parent_value: parent_value.clone(),
                        fields: Vec::new(),
                    })
                    .fields
                    .push(field),
                ast::Selection::InlineFragment(inline) => self.collect_fragment(
                    parent_type,
                    parent_value,
                    inline.type_condition.as_ref(),
                    &inline.selection_set,
                    visited_fragments,
                    grouped,
                ),
                ast::Selection::FragmentSpread(spread) => {
                    if !visited_fragments.insert(&spread.fragment_name) {
                        continue;
                    }
                    let Some(fragment) = self.document.fragment(&spread.fragment_name) else {
                        continue;
                    };
                    self.collect_fragment(
                        parent_type,
                        parent_value,
                        Some(&fragment.type_condition),
                        &fragment.selection_set,
                        visited_fragments,
                        grouped,
                    )
                }
            }
        }
    }

    fn collect_fragment(
        &self,
        parent_type: &'a Name,
        parent_value: &Value,
        type_condition: Option<&'a Name>,
        selections: &'a [ast::Selection],
        visited_fragments: &mut HashSet<&'a Name>,
        grouped: &mut GroupedFields<'a>,
    ) {
        let Some(condition) = type_condition else {
            return self.collect_into(
                parent_type,
                parent_value,
                selections,
                visited_fragments,
                grouped,
            );
        };
        if condition == parent_type || self.schema.is_possible_type(condition, parent_type) {
            return self.collect_into(
                parent_type,
                parent_value,
                selections,
                visited_fragments,
                grouped,
            );
        }
        // A host object may be viewable as another object type
        let Value::Object(object) = parent_value else {
            return;
        };
        if self.schema.get_object(condition).is_none() {
            return;
        }
        if let Some(cast) = object.clone().try_cast(condition) {
            self.collect_into(condition, &cast, selections, visited_fragments, grouped)
        }
    }

    /// Asks the resolver pipeline for the field's resolution.
    ///
    /// Returns `None` for a field the schema does not define on the parent type.
    pub(crate) fn prepare_field(
        &self,
        key: &'a Name,
        collected: CollectedField<'a>,
    ) -> Option<PreparedField<'a>> {
        let selection = *collected.fields.first()?;
        let definition = match self
            .schema
            .type_field(collected.parent_type, &selection.name)
        {
            Ok(definition) => definition,
            Err(_) => {
                tracing::warn!(
                    type_name = %collected.parent_type,
                    field = %selection.name,
                    "graphql: field not defined in schema, skipping"
                );
                return None;
            }
        };
        let resolution = match coerce_argument_values(definition, selection, self.variables) {
            Ok(args) => {
                let request = ResolveRequest {
                    ctx: self.ctx.for_resolver(),
                    parent_type: collected.parent_type.clone(),
                    parent_value: collected.parent_value,
                    field: definition.clone(),
                    args,
                    selection: selection.clone(),
                };
                let resolver = self.resolver;
                match std::panic::catch_unwind(AssertUnwindSafe(|| {
                    resolver.resolve(&request, None)
                })) {
                    Ok(Some(resolution)) => Ok(resolution),
                    Ok(None) => Err(FieldError::new(format!(
                        r#"no resolver found for field "{}" on type "{}""#,
                        selection.name, collected.parent_type
                    ))),
                    Err(payload) => {
                        let message = panic_message(&*payload);
                        self.ctx.log_panic(&message);
                        Err(FieldError::panic(&message))
                    }
                }
            }
            Err(error) => Err(FieldError::new(error.message)),
        };
        Some(PreparedField {
            key,
            definition,
            fields: collected.fields,
            resolution,
        })
    }

    /// Writes an object's fields in order.
    pub(crate) async fn write_object(
        &mut self,
        mode: ExecutionMode,
        grouped: GroupedFields<'a>,
    ) -> Result<(), PropagateNull> {
        self.out.push('{');
        let mut first = true;
        match mode {
            ExecutionMode::Normal => {
                let prepared: Vec<_> = grouped
                    .into_iter()
                    .filter_map(|(key, collected)| self.prepare_field(key, collected))
                    .collect();
                for field in prepared {
                    self.write_field(&mut first, field).await?;
                }
            }
            ExecutionMode::Sequential => {
                for (key, collected) in grouped {
                    if let Some(field) = self.prepare_field(key, collected) {
                        self.write_field(&mut first, field).await?;
                    }
                }
            }
        }
        self.out.push('}');
        Ok(())
    }

    /// Writes `"key":value`.
    ///
    /// A field whose own resolver fails is left out of the object entirely.
    /// `"key":null` is only written when a non-null value further down could
    /// not be completed and the null stopped at this field.
    pub(crate) async fn write_field(
        &mut self,
        first: &mut bool,
        prepared: PreparedField<'a>,
    ) -> Result<(), PropagateNull> {
        let entry_start = self.out.len();
        let was_first = *first;
        if !std::mem::replace(first, false) {
            self.out.push(',');
        }
        write_json_string(&mut self.out, prepared.key);
        self.out.push(':');
        let start = self.out.len();
        self.path
            .push(ResponseDataPathSegment::Field(prepared.key.clone()));

        let definition: &'a Node<FieldDefinition> = prepared.definition;
        let ty: &'a Type = &definition.ty;
        let location = field_location(&prepared.fields);
        let completed = match self.await_resolution(prepared.resolution).await {
            Ok(value) => complete_value(self, ty, value, &prepared.fields).await,
            Err(error) => {
                self.record(error, location);
                self.path.pop();
                if ty.is_non_null() {
                    return Err(PropagateNull);
                }
                self.out.truncate(entry_start);
                *first = was_first;
                return Ok(());
            }
        };
        let result = match completed {
            Ok(()) => Ok(()),
            Err(PropagateNull) => self.nullify(start, ty),
        };
        self.path.pop();
        result
    }

    pub(crate) async fn await_resolution(
        &self,
        resolution: Result<Resolution, FieldError>,
    ) -> Result<Value, FieldError> {
        match AssertUnwindSafe(resolution?).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(&*payload);
                self.ctx.log_panic(&message);
                Err(FieldError::panic(&message))
            }
        }
    }

    /// Rolls the output back to `start` and writes `null` there, if `ty` allows it.
    pub(crate) fn nullify(&mut self, start: usize, ty: &Type) -> Result<(), PropagateNull> {
        if ty.is_non_null() {
            return Err(PropagateNull);
        }
        self.out.truncate(start);
        self.out.push_str("null");
        Ok(())
    }

    pub(crate) fn record(&self, error: FieldError, location: Option<Location>) {
        self.ctx
            .add_error(error.into_graphql_error(&self.path, location));
    }

    async fn complete_named(
        &mut self,
        type_name: &'a Name,
        value: Value,
        fields: &[&'a Node<ast::Field>],
    ) -> Result<(), PropagateNull> {
        let schema = self.schema;
        let location = field_location(fields);
        let Some(type_def) = schema.types.get(type_name) else {
            self.record(
                FieldError::new(format!(r#"Undefined type "{type_name}""#)),
                location,
            );
            return Err(PropagateNull);
        };
        match type_def {
            ExtendedType::Scalar(_) => {
                let Some(json) = value.to_json() else {
                    self.record(
                        FieldError::new(format!(
                            r#"Scalar "{type_name}" cannot represent an object value"#
                        )),
                        location,
                    );
                    return Err(PropagateNull);
                };
                match serde_json::to_string(&json) {
                    Ok(text) => {
                        self.out.push_str(&text);
                        Ok(())
                    }
                    Err(error) => {
                        self.record(FieldError::from_error(error), location);
                        Err(PropagateNull)
                    }
                }
            }
            ExtendedType::Enum(def) => {
                let json = value.to_json();
                let Some(name) = json.as_ref().and_then(JsonValue::as_str) else {
                    self.record(
                        FieldError::new(format!(
                            r#"Enum "{type_name}" cannot represent non-string value: {value:?}"#
                        )),
                        location,
                    );
                    return Err(PropagateNull);
                };
                if !def.values.contains_key(name) {
                    self.record(
                        FieldError::new(format!(
                            r#"Enum "{type_name}" cannot represent value: "{name}""#
                        )),
                        location,
                    );
                    return Err(PropagateNull);
                }
                write_json_string(&mut self.out, name);
                Ok(())
            }
            ExtendedType::InputObject(_) => {
                self.record(
                    FieldError::new(format!(
                        r#"Input object "{type_name}" cannot be used as an output type"#
                    )),
                    location,
                );
                Err(PropagateNull)
            }
            ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_) => {
                let (object_type, object_value) = match self.concrete_type(type_name, value) {
                    Ok(concrete) => concrete,
                    Err(error) => {
                        self.record(error, location);
                        return Err(PropagateNull);
                    }
                };
                let mut grouped = IndexMap::new();
                let mut visited_fragments = HashSet::new();
                for field in fields {
                    self.collect_into(
                        object_type,
                        &object_value,
                        &field.selection_set,
                        &mut visited_fragments,
                        &mut grouped,
                    );
                }
                self.write_object(ExecutionMode::Normal, grouped).await
            }
        }
    }

    /// Finds the object type a composite value has at runtime.
    fn concrete_type(
        &self,
        type_name: &'a Name,
        value: Value,
    ) -> Result<(&'a Name, Value), FieldError> {
        let schema = self.schema;
        if schema.get_object(type_name).is_some() {
            return Ok((type_name, value));
        }
        let runtime_name = match &value {
            Value::Object(object) => Some(object.type_name().to_owned()),
            Value::Map(_) | Value::Json(JsonValue::Object(_)) => value
                .map_entry("__typename")
                .and_then(|typename| typename.to_json())
                .and_then(|typename| typename.as_str().map(str::to_owned)),
            _ => {
                return Err(FieldError::new(format!(
                    r#"Expected an object value for type "{type_name}", found {value:?}"#
                )))
            }
        };
        if let Some(runtime_name) = runtime_name.as_deref() {
            if let Some((name, ExtendedType::Object(_))) = schema.types.get_key_value(runtime_name)
            {
                if schema.is_possible_type(type_name, name) {
                    return Ok((name, value));
                }
            }
        }
        if let Value::Object(object) = &value {
            for candidate in schema.possible_types(type_name) {
                if let Some(cast) = object.clone().try_cast(candidate) {
                    return Ok((candidate, cast));
                }
            }
        }
        Err(FieldError::new(format!(
            r#"Abstract type "{type_name}" must resolve to an object type at runtime, got "{}""#,
            runtime_name.unwrap_or_default()
        )))
    }
}

/// <https://spec.graphql.org/October2021/#CompleteValue()>
#[async_recursion::async_recursion]
pub(crate) async fn complete_value<'a>(
    walker: &mut Walker<'a>,
    ty: &'a Type,
    value: Value,
    fields: &[&'a Node<ast::Field>],
) -> Result<(), PropagateNull> {
    if value.is_null() {
        if ty.is_non_null() {
            walker.record(
                FieldError::new("ResolverFactory produced a nil value for a Non Null type"),
                field_location(fields),
            );
            return Err(PropagateNull);
        }
        walker.out.push_str("null");
        return Ok(());
    }
    match ty {
        Type::NonNull(inner) => complete_value(walker, inner, value, fields).await,
        Type::List(item_type) => {
            let items: Vec<Value> = match value {
                Value::List(items) => items,
                Value::Json(JsonValue::Array(items)) => {
                    items.into_iter().map(Value::Json).collect()
                }
                other => {
                    walker.record(
                        FieldError::new(format!(
                            r#"Expected a list for type "{ty}", found {other:?}"#
                        )),
                        field_location(fields),
                    );
                    return Err(PropagateNull);
                }
            };
            walker.out.push('[');
            for (index, item) in items.into_iter().enumerate() {
                if index > 0 {
                    walker.out.push(',');
                }
                let start = walker.out.len();
                walker.path.push(ResponseDataPathSegment::ListIndex(index));
                let result = match complete_value(walker, item_type, item, fields).await {
                    Ok(()) => Ok(()),
                    Err(PropagateNull) => walker.nullify(start, item_type),
                };
                walker.path.pop();
                result?;
            }
            walker.out.push(']');
            Ok(())
        }
        Type::Named(name) => walker.complete_named(name, value, fields).await,
    }
}

fn field_location(fields: &[&Node<ast::Field>]) -> Option<Location> {
    fields.first().and_then(|field| field.location())
}

fn write_json_string(out: &mut String, value: &str) {
    match serde_json::to_string(value) {
        Ok(json) => out.push_str(&json),
        // Serializing a `&str` to a `String` cannot fail
        Err(_) => out.push_str("null"),
    }
}
