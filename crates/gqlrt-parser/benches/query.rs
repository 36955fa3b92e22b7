use criterion::*;
use gqlrt_parser::ast;
use gqlrt_parser::Lexer;
use gqlrt_parser::Parser;

const QUERY: &str = "query ExampleQuery($topProductsFirst: Int) {\n  me { \n    id\n  }\n  topProducts(first:  $topProductsFirst) {\n    name\n    price\n    inStock\n weight\n test test test test test test test test test test test test }\n}";

fn parse_query(query: &str) {
    let document = Parser::new()
        .parse_query(query)
        .unwrap_or_else(|err| panic!("error parsing query: {err}"));

    for operation in &document.operations {
        for selection in &operation.selection_set {
            if let ast::Selection::Field(field) = selection {
                black_box(&field.selection_set);
            }
        }
    }
}

fn bench_query_parser(c: &mut Criterion) {
    c.bench_function("query_parser", move |b| b.iter(|| parse_query(QUERY)));
}

fn bench_query_lexer(c: &mut Criterion) {
    c.bench_function("query_lexer", move |b| {
        b.iter(|| {
            for token in Lexer::new(QUERY) {
                let _ = black_box(token);
            }
        })
    });
}

fn bench_parser_many_aliases(c: &mut Criterion) {
    let query = format!(
        "query {{ {} }}",
        (0..2000)
            .map(|i| format!("alias{i}: hero {{ name }}"))
            .collect::<Vec<_>>()
            .join(" ")
    );

    c.bench_function("many_aliases", move |b| b.iter(|| parse_query(&query)));
}

fn bench_schema_parser(c: &mut Criterion) {
    let schema = "
        schema { query: Query }
        type Query { hero(episode: Episode): Character droid(id: ID!): Droid }
        enum Episode { NEWHOPE EMPIRE JEDI }
        interface Character { id: ID! name: String friends: [Character] }
        type Droid implements Character { id: ID! name: String friends: [Character] primaryFunction: String }
    ";

    c.bench_function("schema_parser", move |b| {
        b.iter(|| Parser::new().parse_schema(schema).map(black_box))
    });
}

criterion_group!(
    benches,
    bench_parser_many_aliases,
    bench_query_lexer,
    bench_query_parser,
    bench_schema_parser
);
criterion_main!(benches);
