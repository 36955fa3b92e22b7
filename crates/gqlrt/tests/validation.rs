use crate::starwars;
use expect_test::expect;
use gqlrt::ast::QueryDocument;
use gqlrt::validation::validate;
use gqlrt::validation::Rule;
use gqlrt::Schema;
use unindent::unindent;

fn format_errors(query: &str, max_depth: usize) -> String {
    let schema = Schema::parse(starwars::SCHEMA).unwrap();
    let document = QueryDocument::parse(&unindent(query)).unwrap();
    validate(&schema, &document, max_depth)
        .iter()
        .map(|error| {
            let locations: Vec<String> = error
                .locations
                .iter()
                .map(|location| format!("{}:{}", location.line, location.column))
                .collect();
            format!("{} at [{}]: {}\n", error.rule, locations.join(", "), error.message)
        })
        .collect()
}

#[test]
fn errors_are_in_document_order() {
    let query = r#"
        {
          hero { villain }
          ...Missing
        }
        fragment Unused on Query { hero { name } }
    "#;
    expect![[r#"
        FieldsOnCorrectType at [2:10]: Cannot query field "villain" on type "Character".
        KnownFragmentNames at [3:3]: Unknown fragment "Missing".
        NoUnusedFragments at [5:1]: Fragment "Unused" is never used.
    "#]]
    .assert_eq(&format_errors(query, 0));
}

#[test]
fn valid_documents_have_no_errors() {
    let query = r#"
        query Hero($episode: Episode = JEDI, $withFriends: Boolean!) {
          hero(episode: $episode) {
            __typename
            name
            ... on Droid { primaryFunction }
            friends @include(if: $withFriends) { ...Named }
          }
        }
        fragment Named on Character { name }
    "#;
    assert_eq!(format_errors(query, 0), "");
}

#[test]
fn depth_errors_replace_other_rules() {
    let query = r#"
        {
          hero { friends { friends { villain } } }
        }
    "#;
    let schema = Schema::parse(starwars::SCHEMA).unwrap();
    let document = QueryDocument::parse(&unindent(query)).unwrap();

    let rules: Vec<Rule> = validate(&schema, &document, 2)
        .into_iter()
        .map(|error| error.rule)
        .collect();
    assert!(!rules.is_empty());
    assert!(rules.iter().all(|rule| *rule == Rule::MaxDepthExceeded));

    let rules: Vec<Rule> = validate(&schema, &document, 0)
        .into_iter()
        .map(|error| error.rule)
        .collect();
    assert_eq!(rules, [Rule::FieldsOnCorrectType]);
}

#[test]
fn errors_convert_to_response_errors() {
    let schema = Schema::parse(starwars::SCHEMA).unwrap();
    let document = QueryDocument::parse("{ hero { villain } }").unwrap();
    let errors = validate(&schema, &document, 0);
    let error = errors[0].to_graphql_error();
    assert_eq!(
        serde_json::to_string(&error).unwrap(),
        r#"{"message":"Cannot query field \"villain\" on type \"Character\".","locations":[{"line":1,"column":10}],"rule":"FieldsOnCorrectType"}"#
    );
}
