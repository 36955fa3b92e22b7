use gqlrt::resolvers::MethodCall;
use gqlrt::resolvers::ObjectValue;
use gqlrt::resolvers::Resolution;
use gqlrt::resolvers::Value;
use gqlrt::Engine;
use gqlrt::Request;
use gqlrt::Schema;
use std::sync::Arc;
use std::time::Duration;

async fn async_resolvers_example() {
    let sdl = "
      type Query {
        field1: String
        field2: [Int]
      }
    ";

    struct Query;

    impl ObjectValue for Query {
        fn type_name(&self) -> &str {
            "Query"
        }

        fn call_method(self: Arc<Self>, name: &str, call: MethodCall) -> Option<Resolution> {
            match name {
                "field1" => Some(call.ctx.run_async(async move {
                    Ok(Value::json(self.resolve_field1().await))
                })),
                "field2" => Some(call.ctx.run_async(async move {
                    Ok(Value::list(self.resolve_field2().await.map(Value::json)))
                })),
                _ => None,
            }
        }
    }

    impl Query {
        async fn resolve_field1(&self) -> String {
            // totally doing asynchronous I/O here
            tokio::time::sleep(Duration::from_millis(10)).await;
            "string".into()
        }

        async fn resolve_field2(&self) -> [i64; 4] {
            // very await
            tokio::time::sleep(Duration::from_millis(10)).await;
            [7, 42, 0, 0]
        }
    }

    let query = "
        query($skp: Boolean!) {
            field1 @skip(if: $skp)
            field2
        }
    ";
    let variables = serde_json_bytes::json!({
        "skp": false,
    });

    let schema = Schema::parse(sdl).unwrap();
    let engine = Engine::builder(schema)
        .root_value(Value::object(Query))
        .build();
    let request = Request::new(query).variables(variables.as_object().unwrap().clone());
    let response = engine.execute(request).await;
    let response = serde_json::to_string_pretty(&response).unwrap();
    expect_test::expect![[r#"
        {
          "data": {
            "field1": "string",
            "field2": [
              7,
              42,
              0,
              0
            ]
          }
        }"#]]
    .assert_eq(&response);
}

#[tokio::main]
async fn main() {
    async_resolvers_example().await
}
