use gqlrt::Engine;
use gqlrt::Request;
use gqlrt::Schema;

/// To use, do:
/// cargo run --example introspect path/to/schema.graphql introspection_query.graphql
///
/// You can also provide simple queries inline:
/// cargo run --example introspect path/to/schema.graphql '{ __schema { types { name } } }'
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let Some(filename) = args.next() else {
        return Err("Provide a schema".into());
    };
    let schema = Schema::parse(&std::fs::read_to_string(&filename)?)?;

    let Some(filename) = args.next() else {
        return Err("Provide a query to execute".into());
    };
    let query = if filename.starts_with('{') {
        filename
    } else {
        std::fs::read_to_string(&filename)?
    };

    let response = Engine::builder(schema)
        .build()
        .execute(Request::new(query))
        .await;
    serde_json::to_writer_pretty(std::io::stdout().lock(), &response)?;

    Ok(())
}
