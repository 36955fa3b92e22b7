use crate::starwars;
use gqlrt::ast::OperationType;
use gqlrt::schema::SchemaError;
use gqlrt::Schema;
use pretty_assertions::assert_eq;

fn field_names(schema: &Schema, type_name: &str) -> Vec<String> {
    schema.types[type_name]
        .fields()
        .unwrap()
        .keys()
        .map(|name| name.to_string())
        .collect()
}

#[test]
fn documents_are_merged_in_order() {
    let mut builder = Schema::builder();
    builder
        .parse("type Query { hero: Character } interface Character { name: String }")
        .unwrap()
        .parse("type Droid implements Character { name: String }")
        .unwrap()
        .parse(r#"type Query @graphql(alter: "add") { droid: Droid }"#)
        .unwrap();
    let schema = builder.build().unwrap();

    assert_eq!(field_names(&schema, "Query"), ["hero", "droid"]);
    let possible: Vec<&str> = schema
        .possible_types("Character")
        .into_iter()
        .map(|name| name.as_str())
        .collect();
    assert_eq!(possible, ["Droid"]);
    assert!(schema.is_possible_type("Character", "Droid"));
    assert_eq!(
        schema.root_operation(OperationType::Query).map(|name| name.as_str()),
        Some("Query")
    );
    assert_eq!(schema.root_operation(OperationType::Mutation), None);
}

#[test]
fn meta_schema_is_always_present() {
    let schema = Schema::parse("type Query { a: Int }").unwrap();
    for name in ["__Schema", "__Type", "__TypeKind", "String", "Boolean", "ID"] {
        assert!(schema.types.contains_key(name), "missing {name}");
        assert!(schema.types[name].is_built_in());
    }
    for name in ["skip", "include", "deprecated", "specifiedBy"] {
        assert!(schema.directive_definitions.contains_key(name), "missing @{name}");
    }
}

#[test]
fn redeclared_types_are_rejected() {
    let err = Schema::parse("type Query { a: Int } type Query { b: Int }").unwrap_err();
    assert!(matches!(err, SchemaError::TypeDefinitionCollision(ref name) if name == "Query"));
    assert_eq!(err.to_string(), r#"Type "Query" defined more than once"#);
}

#[test]
fn strict_mode_rejects_duplicate_fields() {
    let sdl = "type Query { a: Int a: String }";
    let schema = Schema::parse(sdl).unwrap();
    assert_eq!(field_names(&schema, "Query"), ["a"]);
    assert_eq!(schema.types["Query"].fields().unwrap()["a"].ty.to_string(), "String");

    let mut builder = Schema::builder().strict(true);
    let parsed = builder.parse(sdl).map(drop);
    let err = match parsed {
        Ok(()) => builder.build().map(drop).unwrap_err(),
        Err(err) => err,
    };
    assert!(matches!(err, SchemaError::DuplicateField { .. }));
}

#[test]
fn printed_schema_parses_back() {
    let schema = Schema::parse(starwars::SCHEMA).unwrap();
    let printed = schema.to_string();
    let reparsed = Schema::parse(&printed).unwrap();
    let names = |schema: &Schema| -> Vec<String> {
        schema.types.keys().map(|name| name.to_string()).collect()
    };
    assert_eq!(names(&reparsed), names(&schema));
    for type_name in ["Character", "Human", "Droid", "Query"] {
        assert_eq!(field_names(&reparsed, type_name), field_names(&schema, type_name));
    }
    assert_eq!(reparsed.to_string(), printed);
}
