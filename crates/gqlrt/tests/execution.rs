use crate::starwars;
use futures::FutureExt;
use gqlrt::execution::Logger;
use gqlrt::resolvers;
use gqlrt::resolvers::resolved;
use gqlrt::resolvers::DirectiveResolver;
use gqlrt::resolvers::FieldError;
use gqlrt::resolvers::MethodCall;
use gqlrt::resolvers::ObjectValue;
use gqlrt::resolvers::Resolution;
use gqlrt::resolvers::TypeAndFieldResolver;
use gqlrt::resolvers::Value;
use gqlrt::response::JsonValue;
use gqlrt::Engine;
use gqlrt::Request;
use gqlrt::Schema;
use pretty_assertions::assert_eq;
use serde_json_bytes::json;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn json_engine(schema: &str, root: JsonValue) -> Engine {
    Engine::builder(Schema::parse(schema).unwrap())
        .root_value(Value::Json(root))
        .build()
}

#[tokio::test]
async fn non_null_error_nulls_the_parent() {
    let engine = json_engine(
        "type Query { person: Person } type Person { name: String! age: Int }",
        json!({"person": {"name": null, "age": 3}}),
    );
    let response = engine.execute(Request::new("{ person { name age } }")).await;
    assert_eq!(
        starwars::to_json(&response),
        r#"{"data":{"person":null},"errors":[{"message":"ResolverFactory produced a nil value for a Non Null type","locations":[{"line":1,"column":12}],"path":["person","name"]}]}"#
    );
}

#[tokio::test]
async fn non_null_root_field_nulls_data() {
    let engine = json_engine("type Query { id: ID! }", json!({}));
    let response = engine.execute(Request::new("{ id }")).await;
    assert_eq!(response.data.unwrap().get(), "null");
    assert_eq!(response.errors.len(), 1);
}

struct Failing;

impl ObjectValue for Failing {
    fn type_name(&self) -> &str {
        "Query"
    }

    fn call_method(self: Arc<Self>, name: &str, call: MethodCall) -> Option<Resolution> {
        match name {
            "broken" => Some(resolvers::failed(
                FieldError::new("boom").with_extension("code", "E_BOOM"),
            )),
            "panicky" => {
                let ctx = call.ctx.clone();
                Some(ctx.run_async(async move {
                    if call.args.is_empty() {
                        panic!("kaboom");
                    }
                    Ok(Value::Null)
                }))
            }
            "fine" => Some(resolved(Value::json(1))),
            _ => None,
        }
    }
}

#[derive(Clone, Default)]
struct CountingLogger(Arc<AtomicUsize>);

impl Logger for CountingLogger {
    fn log_panic(&self, _message: &str) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn resolver_errors_are_field_errors() {
    let logger = CountingLogger::default();
    let engine = Engine::builder(
        Schema::parse("type Query { broken: Int panicky: Int fine: Int }").unwrap(),
    )
    .root_value(Value::object(Failing))
    .logger(logger.clone())
    .build();
    let response = engine
        .execute(Request::new("{ broken panicky fine }"))
        .await;
    assert_eq!(
        response.data.as_ref().unwrap().get(),
        r#"{"fine":1}"#
    );
    let errors: Vec<_> = response
        .errors
        .iter()
        .map(|error| (error.message.as_str(), error.path[0].to_string()))
        .collect();
    assert_eq!(
        errors,
        [
            ("boom", "broken".to_owned()),
            ("graphql: panic occurred: kaboom", "panicky".to_owned()),
        ]
    );
    assert_eq!(
        response.errors[0].extensions.get("code"),
        Some(&JsonValue::from("E_BOOM"))
    );
    assert_eq!(logger.0.load(Ordering::SeqCst), 1);
}

struct Slow {
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ObjectValue for Slow {
    fn type_name(&self) -> &str {
        "Item"
    }

    fn call_method(self: Arc<Self>, name: &str, call: MethodCall) -> Option<Resolution> {
        if name != "value" {
            return None;
        }
        Some(call.ctx.run_async(async move {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(Value::json(now as u64))
        }))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallelism_is_bounded() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let items = (0..8).map(|_| {
        Value::object(Slow {
            running: running.clone(),
            peak: peak.clone(),
        })
    });
    let mut root = indexmap::IndexMap::new();
    root.insert("items".to_owned(), Value::list(items));
    let engine = Engine::builder(
        Schema::parse("type Query { items: [Item] } type Item { value: Int }").unwrap(),
    )
    .root_value(Value::Map(root))
    .max_parallelism(3)
    .build();

    let response = engine.execute(Request::new("{ items { value } }")).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data_value().unwrap();
    assert_eq!(data["items"].as_array().unwrap().len(), 8);
    let peak = peak.load(Ordering::SeqCst);
    assert!((1..=3).contains(&peak), "peak concurrency {peak}");
}

#[tokio::test]
async fn custom_resolver_pipeline() {
    let schema = Schema::parse(
        r#"
        directive @upper on FIELD_DEFINITION
        type Query { loud: String @upper greeting: String version: Int }
        "#,
    )
    .unwrap();
    let mut pipeline = resolvers::dynamic();
    pipeline
        .push(TypeAndFieldResolver::new("Query", "version", |_| {
            resolved(Value::json(2))
        }))
        .push(DirectiveResolver::new("upper", |_, _, next| {
            let next = next?;
            Some(
                async move {
                    let value = next.await?;
                    let text = value
                        .to_json()
                        .and_then(|json| json.as_str().map(str::to_uppercase))
                        .unwrap_or_default();
                    Ok::<_, FieldError>(Value::json(text))
                }
                .boxed(),
            )
        }));
    let engine = Engine::builder(schema)
        .root_value(Value::Json(json!({"loud": "hello", "greeting": "hello"})))
        .resolver(pipeline)
        .build();
    let response = engine
        .execute(Request::new("{ loud greeting version }"))
        .await;
    assert_eq!(
        response.data.unwrap().get(),
        r#"{"loud":"HELLO","greeting":"hello","version":2}"#
    );
}

#[tokio::test]
async fn operation_selection() {
    let engine = starwars::engine();
    let query = "query A { hero { name } } query B { human(id: \"1002\") { name } }";

    let response = engine
        .execute(Request::new(query).operation_name("B"))
        .await;
    assert_eq!(response.data.unwrap().get(), r#"{"human":{"name":"Han Solo"}}"#);

    let response = engine.execute(Request::new(query)).await;
    assert!(response.data.is_none());
    assert_eq!(
        response.errors[0].message,
        "operation name is required when the document contains multiple operations"
    );

    let response = engine
        .execute(Request::new(query).operation_name("C"))
        .await;
    assert_eq!(response.errors[0].message, r#"unknown operation named "C""#);
}

#[tokio::test]
async fn variables_are_coerced() {
    let engine = starwars::engine();
    let query = "query($id: ID!) { droid(id: $id) { name } }";

    let request: Request = serde_json::from_str(
        r#"{"query": "query($id: ID!) { droid(id: $id) { name } }", "variables": {"id": "2001"}}"#,
    )
    .unwrap();
    let response = engine.execute(request).await;
    assert_eq!(response.data.unwrap().get(), r#"{"droid":{"name":"R2-D2"}}"#);

    let response = engine.execute(Request::new(query)).await;
    assert!(response.data.is_none());
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].message.contains("$id"));
}

#[tokio::test]
async fn syntax_errors_are_reported() {
    let response = starwars::engine().execute(Request::new("{ hero { ")).await;
    assert!(response.data.is_none());
    assert_eq!(response.errors.len(), 1);
    assert!(!response.errors[0].locations.is_empty());
}

struct Hang;

impl ObjectValue for Hang {
    fn type_name(&self) -> &str {
        "Query"
    }

    fn call_method(self: Arc<Self>, name: &str, call: MethodCall) -> Option<Resolution> {
        (name == "wait").then(|| {
            call.ctx.run_async(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Value::Null)
            })
        })
    }
}

#[tokio::test]
async fn cancellation_interrupts_resolvers() {
    let engine = Engine::builder(Schema::parse("type Query { wait: Int }").unwrap())
        .root_value(Value::object(Hang))
        .build();
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });
    let response = engine
        .execute(Request::new("{ wait }").context(token))
        .await;
    assert!(response.data.is_none());
    assert_eq!(response.errors[0].message, "request cancelled");
}

#[tokio::test]
async fn queries_stream_a_single_response() {
    let mut stream = starwars::engine().execute_stream(Request::new("{ hero { name } }"));
    assert!(!stream.is_subscription());
    let response = stream.next().await.unwrap();
    assert_eq!(response.data.unwrap().get(), r#"{"hero":{"name":"R2-D2"}}"#);
    assert!(stream.next().await.is_none());
}
