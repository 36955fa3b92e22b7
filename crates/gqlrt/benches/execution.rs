use criterion::*;
use gqlrt::ast::QueryDocument;
use gqlrt::resolvers::Value;
use gqlrt::validation::validate;
use gqlrt::Engine;
use gqlrt::Request;
use gqlrt::Schema;
use serde_json_bytes::json;

const SCHEMA: &str = r#"
    enum Episode { NEWHOPE EMPIRE JEDI }
    interface Character { id: ID! name: String! friends: [Character] appearsIn: [Episode]! }
    type Human implements Character {
        id: ID! name: String! friends: [Character] appearsIn: [Episode]! homePlanet: String
    }
    type Droid implements Character {
        id: ID! name: String! friends: [Character] appearsIn: [Episode]! primaryFunction: String
    }
    type Query { hero(episode: Episode): Character characters: [Character] }
"#;

const QUERY: &str = r#"
    query Heroes {
        hero { ...Details friends { ...Details friends { name } } }
        characters { __typename ...Details }
    }
    fragment Details on Character {
        id
        name
        appearsIn
        ... on Human { homePlanet }
        ... on Droid { primaryFunction }
    }
"#;

fn character(id: usize) -> serde_json_bytes::Value {
    let friends: Vec<_> = (1..=3)
        .map(|offset| {
            json!({
                "__typename": "Human",
                "id": format!("{}", id + offset),
                "name": format!("Friend {}", id + offset),
                "appearsIn": ["JEDI"],
                "friends": [],
            })
        })
        .collect();
    let typename = if id % 2 == 0 { "Human" } else { "Droid" };
    json!({
        "__typename": typename,
        "id": id.to_string(),
        "name": format!("Character {id}"),
        "appearsIn": ["NEWHOPE", "EMPIRE", "JEDI"],
        "homePlanet": "Tatooine",
        "primaryFunction": "Astromech",
        "friends": friends,
    })
}

fn root() -> Value {
    let characters: Vec<_> = (0..100).map(character).collect();
    Value::Json(json!({
        "hero": character(2001),
        "characters": characters,
    }))
}

fn bench_validation(c: &mut Criterion) {
    let schema = Schema::parse(SCHEMA).unwrap();
    let document = QueryDocument::parse(QUERY).unwrap();

    c.bench_function("validate_query", move |b| {
        b.iter(|| black_box(validate(&schema, &document, 50)))
    });
}

fn bench_execution(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let engine = Engine::builder(Schema::parse(SCHEMA).unwrap())
        .root_value(root())
        .build();

    c.bench_function("execute_query", move |b| {
        b.iter(|| {
            let response = runtime.block_on(engine.execute(Request::new(QUERY)));
            black_box(response)
        })
    });
}

criterion_group!(benches, bench_validation, bench_execution);
criterion_main!(benches);
