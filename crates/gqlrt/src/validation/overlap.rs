//! OverlappingFieldsCanBeMerged
//!
//! <https://spec.graphql.org/October2021/#sec-Field-Selection-Merging>

use crate::ast;
use crate::ast::Type;
use crate::response::JsonMap;
use crate::response::JsonValue;
use crate::schema::ExtendedType;
use crate::schema::FieldDefinition;
use crate::validation::Rule;
use crate::validation::ValidationContext;
use crate::values::evaluate;
use crate::Name;
use crate::Node;
use crate::Schema;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::collections::HashSet;

/// Results of comparing two field selections, keyed by node identity.
///
/// The flag records whether the parents were known to be mutually exclusive.
pub(crate) type PairCache = HashMap<(usize, usize, bool), Option<Conflict>>;

/// Why two fields with the same response key cannot be merged
#[derive(Clone, Debug)]
pub(crate) enum Conflict {
    DifferentFields(Name, Name),
    DifferentArguments,
    DifferentTypes(Type, Type),
    Subfields(Vec<(Name, Conflict)>),
}

impl Conflict {
    fn reason(&self) -> String {
        match self {
            Self::DifferentFields(a, b) => format!("{a} and {b} are different fields"),
            Self::DifferentArguments => "they have differing arguments".to_owned(),
            Self::DifferentTypes(a, b) => {
                format!(r#"they return conflicting types "{a}" and "{b}""#)
            }
            Self::Subfields(conflicts) => conflicts
                .iter()
                .map(|(key, conflict)| {
                    format!(r#"subfields "{key}" conflict because {}"#, conflict.reason())
                })
                .collect::<Vec<_>>()
                .join(" and "),
        }
    }
}

/// A field selection together with the type it was selected on
#[derive(Clone, Copy)]
struct FieldAndParent<'a> {
    field: &'a Node<ast::Field>,
    parent_type: &'a Name,
    definition: Option<&'a Node<FieldDefinition>>,
}

type FieldsByKey<'a> = IndexMap<&'a Name, Vec<FieldAndParent<'a>>>;

type Fragments<'a> = HashMap<&'a str, &'a Node<ast::FragmentDefinition>>;

pub(crate) fn validate_overlapping_fields(
    ctx: &mut ValidationContext<'_>,
    parent_type: &Name,
    selections: &[ast::Selection],
) {
    let schema = ctx.schema;
    let mut by_key = FieldsByKey::new();
    collect_fields(
        schema,
        &ctx.fragments,
        parent_type,
        selections,
        &mut HashSet::new(),
        &mut by_key,
    );
    for (key, fields) in &by_key {
        for (i, a) in fields.iter().enumerate() {
            for b in &fields[i + 1..] {
                let conflict = find_conflict(
                    schema,
                    &ctx.fragments,
                    &mut ctx.overlap_cache,
                    false,
                    *a,
                    *b,
                );
                if let Some(conflict) = conflict {
                    ctx.report(
                        Rule::OverlappingFieldsCanBeMerged,
                        format!(
                            r#"Fields "{key}" conflict because {}. Use different aliases on the fields to fetch both if this was intentional."#,
                            conflict.reason()
                        ),
                        [a.field.location(), b.field.location()],
                    );
                }
            }
        }
    }
}

fn collect_fields<'a>(
    schema: &'a Schema,
    fragments: &Fragments<'a>,
    parent_type: &'a Name,
    selections: &'a [ast::Selection],
    visited_fragments: &mut HashSet<&'a Name>,
    by_key: &mut FieldsByKey<'a>,
) {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => {
                by_key
                    .entry(field.response_key())
                    .or_default()
                    .push(FieldAndParent {
                        field,
                        parent_type,
                        definition: schema.type_field(parent_type, &field.name).ok(),
                    })
            }
            ast::Selection::InlineFragment(inline) => collect_fields(
                schema,
                fragments,
                inline.type_condition.as_ref().unwrap_or(parent_type),
                &inline.selection_set,
                visited_fragments,
                by_key,
            ),
            ast::Selection::FragmentSpread(spread) => {
                if !visited_fragments.insert(&spread.fragment_name) {
                    continue;
                }
                if let Some(def) = fragments.get(spread.fragment_name.as_str()).copied() {
                    collect_fields(
                        schema,
                        fragments,
                        &def.type_condition,
                        &def.selection_set,
                        visited_fragments,
                        by_key,
                    )
                }
            }
        }
    }
}

fn find_conflict<'a>(
    schema: &'a Schema,
    fragments: &Fragments<'a>,
    cache: &mut PairCache,
    parents_exclusive: bool,
    a: FieldAndParent<'a>,
    b: FieldAndParent<'a>,
) -> Option<Conflict> {
    let (pa, pb) = (a.field.as_ptr() as usize, b.field.as_ptr() as usize);
    let cache_key = (pa.min(pb), pa.max(pb), parents_exclusive);
    if let Some(cached) = cache.get(&cache_key) {
        return cached.clone();
    }
    // Guards against cycles through fragment spreads
    cache.insert(cache_key, None);
    let conflict = compare_fields(schema, fragments, cache, parents_exclusive, a, b);
    cache.insert(cache_key, conflict.clone());
    conflict
}

fn compare_fields<'a>(
    schema: &'a Schema,
    fragments: &Fragments<'a>,
    cache: &mut PairCache,
    parents_exclusive: bool,
    a: FieldAndParent<'a>,
    b: FieldAndParent<'a>,
) -> Option<Conflict> {
    // Fields on two different object types can never be selected together
    let exclusive = parents_exclusive
        || (a.parent_type != b.parent_type
            && schema.get_object(a.parent_type).is_some()
            && schema.get_object(b.parent_type).is_some());
    if !exclusive {
        if a.field.name != b.field.name {
            return Some(Conflict::DifferentFields(
                a.field.name.clone(),
                b.field.name.clone(),
            ));
        }
        if !same_arguments(&a.field.arguments, &b.field.arguments) {
            return Some(Conflict::DifferentArguments);
        }
    }
    let (Some(def_a), Some(def_b)) = (a.definition, b.definition) else {
        return None;
    };
    if types_conflict(schema, &def_a.ty, &def_b.ty) {
        return Some(Conflict::DifferentTypes(def_a.ty.clone(), def_b.ty.clone()));
    }
    if a.field.selection_set.is_empty() || b.field.selection_set.is_empty() {
        return None;
    }

    let mut sub_a = FieldsByKey::new();
    collect_fields(
        schema,
        fragments,
        def_a.ty.inner_named_type(),
        &a.field.selection_set,
        &mut HashSet::new(),
        &mut sub_a,
    );
    let mut sub_b = FieldsByKey::new();
    collect_fields(
        schema,
        fragments,
        def_b.ty.inner_named_type(),
        &b.field.selection_set,
        &mut HashSet::new(),
        &mut sub_b,
    );
    let mut conflicts = Vec::new();
    for (key, fields_a) in &sub_a {
        let Some(fields_b) = sub_b.get(key) else {
            continue;
        };
        'pairs: for field_a in fields_a {
            for field_b in fields_b {
                if let Some(conflict) =
                    find_conflict(schema, fragments, cache, exclusive, *field_a, *field_b)
                {
                    conflicts.push(((*key).clone(), conflict));
                    break 'pairs;
                }
            }
        }
    }
    if conflicts.is_empty() {
        None
    } else {
        Some(Conflict::Subfields(conflicts))
    }
}

fn same_arguments(a: &[Node<ast::Argument>], b: &[Node<ast::Argument>]) -> bool {
    a.len() == b.len()
        && a.iter().all(|arg_a| {
            b.iter()
                .any(|arg_b| arg_a.name == arg_b.name && same_value(&arg_a.value, &arg_b.value))
        })
}

/// Compares argument values by what they evaluate to.
///
/// Object fields may come in any order and numbers compare by value.
/// Variables are equal only to the same variable.
fn same_value(a: &ast::Value, b: &ast::Value) -> bool {
    match (a, b) {
        (ast::Value::Variable(a), ast::Value::Variable(b)) => a == b,
        (ast::Value::Variable(_), _) | (_, ast::Value::Variable(_)) => false,
        (ast::Value::List(a), ast::Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| same_value(a, b))
        }
        (ast::Value::Object(a), ast::Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(name, value_a)| {
                    b.iter()
                        .find(|(other, _)| other == name)
                        .is_some_and(|(_, value_b)| same_value(value_a, value_b))
                })
        }
        _ => {
            let no_variables = JsonMap::new();
            match (evaluate(a, &no_variables), evaluate(b, &no_variables)) {
                (JsonValue::Number(a), JsonValue::Number(b)) => a == b || a.as_f64() == b.as_f64(),
                (a, b) => a == b,
            }
        }
    }
}

/// Two types conflict when their list and non-null shapes differ,
/// or when they end in different leaf types.
fn types_conflict(schema: &Schema, a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::NonNull(a), Type::NonNull(b)) => types_conflict(schema, a, b),
        (Type::NonNull(_), _) | (_, Type::NonNull(_)) => true,
        (Type::List(a), Type::List(b)) => types_conflict(schema, a, b),
        (Type::List(_), _) | (_, Type::List(_)) => true,
        (Type::Named(a), Type::Named(b)) => {
            let is_leaf = |name: &Name| schema.types.get(name).is_some_and(ExtendedType::is_leaf);
            (is_leaf(a) || is_leaf(b)) && a != b
        }
    }
}
