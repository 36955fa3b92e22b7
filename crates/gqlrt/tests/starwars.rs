use gqlrt::resolvers::resolved;
use gqlrt::resolvers::MethodCall;
use gqlrt::resolvers::ObjectValue;
use gqlrt::resolvers::Resolution;
use gqlrt::resolvers::Value;
use gqlrt::response::JsonValue;
use gqlrt::Engine;
use gqlrt::Request;
use gqlrt::Schema;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json_bytes::json;
use std::sync::Arc;

pub const SCHEMA: &str = r#"
    enum Episode { NEWHOPE EMPIRE JEDI }

    interface Character {
        id: ID!
        name: String!
        friends: [Character]
        appearsIn: [Episode]!
    }

    type Human implements Character {
        id: ID!
        name: String!
        friends: [Character]
        appearsIn: [Episode]!
        homePlanet: String
    }

    type Droid implements Character {
        id: ID!
        name: String!
        friends: [Character]
        appearsIn: [Episode]!
        primaryFunction: String
    }

    type Query {
        hero(episode: Episode): Character
        human(id: ID!): Human
        droid(id: ID!): Droid
    }
"#;

struct Character {
    id: &'static str,
    name: &'static str,
    droid: bool,
    friends: &'static [&'static str],
    extra: &'static str,
}

const CHARACTERS: &[Character] = &[
    Character {
        id: "1000",
        name: "Luke Skywalker",
        droid: false,
        friends: &["1002", "1003", "2001"],
        extra: "Tatooine",
    },
    Character {
        id: "1002",
        name: "Han Solo",
        droid: false,
        friends: &["1000", "1003", "2001"],
        extra: "Corellia",
    },
    Character {
        id: "1003",
        name: "Leia Organa",
        droid: false,
        friends: &["1000", "1002", "2001"],
        extra: "Alderaan",
    },
    Character {
        id: "2001",
        name: "R2-D2",
        droid: true,
        friends: &["1000", "1002", "1003"],
        extra: "Astromech",
    },
];

fn lookup(id: &str) -> Option<Value> {
    let character = CHARACTERS.iter().find(|character| character.id == id)?;
    Some(Value::object(CharacterRef(character)))
}

struct CharacterRef(&'static Character);

impl ObjectValue for CharacterRef {
    fn type_name(&self) -> &str {
        if self.0.droid {
            "Droid"
        } else {
            "Human"
        }
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        let character = self.0;
        Some(match name {
            "id" => Value::json(character.id),
            "name" => Value::json(character.name),
            "friends" => Value::list(character.friends.iter().filter_map(|id| lookup(id))),
            "appearsIn" => Value::Json(json!(["NEWHOPE", "EMPIRE", "JEDI"])),
            "homePlanet" if !character.droid => Value::json(character.extra),
            "primaryFunction" if character.droid => Value::json(character.extra),
            _ => return None,
        })
    }
}

pub struct StarWars;

impl ObjectValue for StarWars {
    fn type_name(&self) -> &str {
        "Query"
    }

    fn call_method(self: Arc<Self>, name: &str, call: MethodCall) -> Option<Resolution> {
        let id = call.args.get("id").and_then(JsonValue::as_str);
        let value = match name {
            "hero" => match call.args.get("episode").and_then(JsonValue::as_str) {
                Some("EMPIRE") => lookup("1000"),
                _ => lookup("2001"),
            },
            "human" | "droid" => id.and_then(lookup),
            _ => return None,
        };
        Some(resolved(value.unwrap_or_default()))
    }
}

pub fn engine() -> Engine {
    Engine::builder(Schema::parse(SCHEMA).unwrap())
        .root_value(Value::object(StarWars))
        .build()
}

pub fn to_json(response: &gqlrt::Response) -> String {
    serde_json::to_string(response).unwrap()
}

#[tokio::test]
async fn hero_name() {
    let response = engine().execute(Request::new("query { hero { name } }")).await;
    assert_eq!(to_json(&response), r#"{"data":{"hero":{"name":"R2-D2"}}}"#);
}

#[tokio::test]
async fn aliases_in_document_order() {
    let request = Request::new(
        "query($e:Episode){ a: hero(episode:EMPIRE){name}  b: hero(episode:$e){name} }",
    )
    .variables(json!({"e": "JEDI"}).as_object().unwrap().clone());
    let response = engine().execute(request).await;
    assert_eq!(
        to_json(&response),
        r#"{"data":{"a":{"name":"Luke Skywalker"},"b":{"name":"R2-D2"}}}"#
    );
}

#[tokio::test]
async fn fragments_on_interfaces() {
    let query = r#"
        query {
            luke: human(id: "1000") { ...Names }
            hero {
                __typename
                ... on Droid { primaryFunction }
                ... on Human { homePlanet }
            }
        }
        fragment Names on Character { name friends { name } }
    "#;
    let response = engine().execute(Request::new(query)).await;
    let expected = json!({
        "luke": {
            "name": "Luke Skywalker",
            "friends": [{"name": "Han Solo"}, {"name": "Leia Organa"}, {"name": "R2-D2"}],
        },
        "hero": {"__typename": "Droid", "primaryFunction": "Astromech"},
    });
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(response.data_value().unwrap(), expected);
}

#[tokio::test]
async fn skip_drops_the_field() {
    let request = Request::new("query($w:Boolean!){ hero { name friends @skip(if:$w) { name } } }")
        .variables(json!({"w": true}).as_object().unwrap().clone());
    let response = engine().execute(request).await;
    assert_eq!(to_json(&response), r#"{"data":{"hero":{"name":"R2-D2"}}}"#);

    let request =
        Request::new("query($w:Boolean!){ hero { name friends @include(if:$w) { name } } }")
            .variables(json!({"w": false}).as_object().unwrap().clone());
    let response = engine().execute(request).await;
    assert_eq!(to_json(&response), r#"{"data":{"hero":{"name":"R2-D2"}}}"#);
}

#[tokio::test]
async fn unknown_field_is_a_validation_error() {
    let response = engine()
        .execute(Request::new("query { hero { unknownField } }"))
        .await;
    assert!(response.data.is_none());
    assert_eq!(response.errors.len(), 1);
    let error = &response.errors[0];
    assert_eq!(error.rule.as_deref(), Some("FieldsOnCorrectType"));
    assert_eq!(error.locations.len(), 1);
    assert_eq!(error.locations[0].line, 1);
    assert_eq!(error.locations[0].column, 16);
}

#[tokio::test]
async fn max_depth_stops_execution() {
    let engine = Engine::builder(Schema::parse(SCHEMA).unwrap())
        .root_value(Value::object(StarWars))
        .max_depth(2)
        .build();
    let response = engine
        .execute(Request::new("query { hero { friends { friends { name } } } }"))
        .await;
    assert!(response.data.is_none());
    assert!(!response.errors.is_empty());
    assert!(response
        .errors
        .iter()
        .all(|error| error.rule.as_deref() == Some("MaxDepthExceeded")));
}

struct Greeter {
    name: Mutex<Option<String>>,
}

impl ObjectValue for Greeter {
    fn type_name(&self) -> &str {
        "M"
    }

    fn call_method(self: Arc<Self>, name: &str, call: MethodCall) -> Option<Resolution> {
        match name {
            "setname" => {
                let name = call.args.get("name").and_then(JsonValue::as_str)?.to_owned();
                let greeting = format!("Hi {name}");
                *self.name.lock() = Some(name);
                Some(resolved(Value::json(greeting)))
            }
            "name" => {
                let name = self.name.lock().clone();
                Some(resolved(name.map_or(Value::Null, Value::json)))
            }
            _ => None,
        }
    }
}

#[tokio::test]
async fn mutation_arguments_and_side_effect() {
    let schema = Schema::parse(
        r#"
        schema { query: Q mutation: M }
        type Q { name: String }
        type M { setName(name: String!): String }
        "#,
    )
    .unwrap();
    let root = Arc::new(Greeter {
        name: Mutex::new(None),
    });
    let engine = Engine::builder(schema).root_value(Value::from(root.clone())).build();

    let response = engine
        .execute(Request::new(r#"mutation{ setName(name:"Hiram") }"#))
        .await;
    assert_eq!(to_json(&response), r#"{"data":{"setName":"Hi Hiram"}}"#);
    assert_eq!(root.name.lock().as_deref(), Some("Hiram"));

    let response = engine.execute(Request::new("{ name }")).await;
    assert_eq!(to_json(&response), r#"{"data":{"name":"Hiram"}}"#);
}
