use super::resolved;
use super::MethodCall;
use super::ResolveRequest;
use super::Resolution;
use super::Resolver;
use super::Value;
use crate::ast;
use crate::introspection;
use crate::Name;
use crate::Node;

/// Resolves `__typename`, `__schema` and `__type`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataResolver;

/// Calls [`ObjectValue::call_method`](super::ObjectValue::call_method)
/// with the lower-cased field name.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodResolver;

/// Reads [`ObjectValue::field_value`](super::ObjectValue::field_value),
/// first with the field name as declared, then lower-cased.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldResolver;

/// Reads the entry named like the field from a [`Value::Map`] or JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapResolver;

/// Runs strategies in order, each seeing what the previous ones produced.
#[derive(Default)]
pub struct ResolverList {
    strategies: Vec<Box<dyn Resolver>>,
}

/// Wraps the resolution of every field whose definition carries `@directive`.
///
/// `wrap` receives the request, the directive as written in the schema,
/// and the resolution found by the strategies before this one.
pub struct DirectiveResolver<F> {
    directive: Name,
    wrap: F,
}

/// Resolves a single field of a single type with a function.
///
/// An exact match replaces whatever the strategies before it produced.
pub struct TypeAndFieldResolver<F> {
    type_name: Name,
    field_name: Name,
    func: F,
}

/// Adapts a closure into a [`Resolver`].
pub struct FuncResolver<F>(pub F);

impl Resolver for MetadataResolver {
    fn resolve(&self, request: &ResolveRequest, next: Option<Resolution>) -> Option<Resolution> {
        if next.is_some() {
            return next;
        }
        let value = match request.field.name.as_str() {
            "__typename" => Value::json(request.parent_type.as_str()),
            "__schema" => Value::object(introspection::SchemaIntrospection::new(
                request.ctx.schema().clone(),
            )),
            "__type" => {
                let name = request
                    .args
                    .get("name")
                    .and_then(|name| name.as_str())
                    .unwrap_or_default();
                introspection::type_by_name(request.ctx.schema(), name)
            }
            _ => return None,
        };
        Some(resolved(value))
    }
}

impl Resolver for MethodResolver {
    fn resolve(&self, request: &ResolveRequest, next: Option<Resolution>) -> Option<Resolution> {
        if next.is_some() {
            return next;
        }
        let Value::Object(object) = &request.parent_value else {
            return None;
        };
        let call = MethodCall {
            cancel: request.ctx.cancellation_token().clone(),
            ctx: request.ctx.clone(),
            args: request.args.clone(),
            field: request.selection.clone(),
        };
        object
            .clone()
            .call_method(&request.field.name.to_lowercase(), call)
    }
}

impl Resolver for FieldResolver {
    fn resolve(&self, request: &ResolveRequest, next: Option<Resolution>) -> Option<Resolution> {
        if next.is_some() {
            return next;
        }
        let Value::Object(object) = &request.parent_value else {
            return None;
        };
        let name = request.field.name.as_str();
        object
            .field_value(name)
            .or_else(|| object.field_value(&name.to_lowercase()))
            .map(resolved)
    }
}

impl Resolver for MapResolver {
    fn resolve(&self, request: &ResolveRequest, next: Option<Resolution>) -> Option<Resolution> {
        if next.is_some() {
            return next;
        }
        request
            .parent_value
            .map_entry(&request.field.name)
            .map(resolved)
    }
}

impl ResolverList {
    pub fn new(strategies: Vec<Box<dyn Resolver>>) -> Self {
        Self { strategies }
    }

    /// Appends a strategy, run after the existing ones.
    pub fn push(&mut self, strategy: impl Resolver + 'static) -> &mut Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Resolver for ResolverList {
    fn resolve(&self, request: &ResolveRequest, next: Option<Resolution>) -> Option<Resolution> {
        self.strategies
            .iter()
            .fold(next, |next, strategy| strategy.resolve(request, next))
    }
}

impl<F> DirectiveResolver<F>
where
    F: Fn(&ResolveRequest, &Node<ast::Directive>, Option<Resolution>) -> Option<Resolution>
        + Send
        + Sync,
{
    pub fn new(directive: impl Into<Name>, wrap: F) -> Self {
        Self {
            directive: directive.into(),
            wrap,
        }
    }
}

impl<F> Resolver for DirectiveResolver<F>
where
    F: Fn(&ResolveRequest, &Node<ast::Directive>, Option<Resolution>) -> Option<Resolution>
        + Send
        + Sync,
{
    fn resolve(&self, request: &ResolveRequest, next: Option<Resolution>) -> Option<Resolution> {
        match request.field.directives.get(&self.directive) {
            Some(directive) => (self.wrap)(request, directive, next),
            None => next,
        }
    }
}

impl<F> TypeAndFieldResolver<F>
where
    F: Fn(&ResolveRequest) -> Resolution + Send + Sync,
{
    pub fn new(type_name: impl Into<Name>, field_name: impl Into<Name>, func: F) -> Self {
        Self {
            type_name: type_name.into(),
            field_name: field_name.into(),
            func,
        }
    }
}

impl<F> Resolver for TypeAndFieldResolver<F>
where
    F: Fn(&ResolveRequest) -> Resolution + Send + Sync,
{
    fn resolve(&self, request: &ResolveRequest, next: Option<Resolution>) -> Option<Resolution> {
        if request.parent_type == self.type_name && request.field.name == self.field_name {
            Some((self.func)(request))
        } else {
            next
        }
    }
}

impl<F> Resolver for FuncResolver<F>
where
    F: Fn(&ResolveRequest, Option<Resolution>) -> Option<Resolution> + Send + Sync,
{
    fn resolve(&self, request: &ResolveRequest, next: Option<Resolution>) -> Option<Resolution> {
        (self.0)(request, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::DefaultLogger;
    use crate::execution::ExecutionContext;
    use crate::resolvers::dynamic;
    use crate::resolvers::failed;
    use crate::resolvers::FieldError;
    use crate::resolvers::ObjectValue;
    use crate::response::JsonMap;
    use crate::Schema;
    use futures::FutureExt;
    use serde_json_bytes::json;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    const SCHEMA: &str = r#"
        directive @upper on FIELD_DEFINITION
        type Query {
            name: String
            greeting(to: String!): String
            shout: String @upper
            map: String
        }
    "#;

    struct Robot;

    impl ObjectValue for Robot {
        fn type_name(&self) -> &str {
            "Query"
        }

        fn call_method(self: Arc<Self>, name: &str, call: MethodCall) -> Option<Resolution> {
            match name {
                "greeting" => {
                    let to = call.args.get("to")?.as_str()?.to_owned();
                    Some(resolved(Value::json(format!("Beep {to}"))))
                }
                _ => None,
            }
        }

        fn field_value(&self, name: &str) -> Option<Value> {
            match name {
                "name" => Some(Value::json("R2")),
                "shout" => Some(Value::json("hey")),
                _ => None,
            }
        }
    }

    fn request(schema: &Arc<Schema>, field: &str, parent_value: Value, args: JsonMap) -> ResolveRequest {
        let ctx = ExecutionContext::new(
            schema.clone(),
            CancellationToken::new(),
            1,
            Arc::new(DefaultLogger),
            None,
        );
        let document = crate::Parser::new()
            .parse_query(&format!("{{ {field} }}"))
            .unwrap();
        let ast::Selection::Field(selection) = &document.operations[0].selection_set[0] else {
            unreachable!()
        };
        ResolveRequest {
            ctx,
            parent_type: Name::new("Query"),
            parent_value,
            field: schema.type_field("Query", field).unwrap().clone(),
            args,
            selection: selection.clone(),
        }
    }

    async fn run(resolver: &dyn Resolver, request: &ResolveRequest) -> Option<Value> {
        Some(resolver.resolve(request, None)?.await.unwrap())
    }

    fn json_of(value: Option<Value>) -> Option<serde_json_bytes::Value> {
        value.and_then(|value| value.to_json())
    }

    #[tokio::test]
    async fn dynamic_pipeline() {
        let schema = Arc::new(Schema::parse(SCHEMA).unwrap());
        let resolver = dynamic();
        let robot = Value::object(Robot);

        let req = request(&schema, "name", robot.clone(), JsonMap::new());
        assert_eq!(json_of(run(&resolver, &req).await), Some(json!("R2")));

        let mut args = JsonMap::new();
        args.insert("to", json!("Luke"));
        let req = request(&schema, "greeting", robot.clone(), args);
        assert_eq!(json_of(run(&resolver, &req).await), Some(json!("Beep Luke")));

        let req = request(&schema, "__typename", robot.clone(), JsonMap::new());
        assert_eq!(json_of(run(&resolver, &req).await), Some(json!("Query")));

        let req = request(&schema, "map", Value::Json(json!({"map": "m"})), JsonMap::new());
        assert_eq!(json_of(run(&resolver, &req).await), Some(json!("m")));

        let req = request(&schema, "map", robot, JsonMap::new());
        assert!(resolver.resolve(&req, None).is_none());
    }

    #[tokio::test]
    async fn first_match_wins() {
        let schema = Arc::new(Schema::parse(SCHEMA).unwrap());
        let mut resolver = ResolverList::default();
        resolver
            .push(TypeAndFieldResolver::new("Query", "name", |_: &ResolveRequest| {
                resolved(Value::json("first"))
            }))
            .push(FieldResolver);
        let req = request(&schema, "name", Value::object(Robot), JsonMap::new());
        assert_eq!(json_of(run(&resolver, &req).await), Some(json!("first")));
        assert_eq!(resolver.len(), 2);
    }

    #[tokio::test]
    async fn type_and_field_replaces_earlier_strategies() {
        let schema = Arc::new(Schema::parse(SCHEMA).unwrap());
        let mut resolver = dynamic();
        resolver.push(TypeAndFieldResolver::new("Query", "map", |_: &ResolveRequest| {
            resolved(Value::json("custom"))
        }));

        let req = request(&schema, "map", Value::Json(json!({"map": "m"})), JsonMap::new());
        assert_eq!(json_of(run(&resolver, &req).await), Some(json!("custom")));

        let req = request(&schema, "map", Value::Json(json!({})), JsonMap::new());
        assert_eq!(json_of(run(&resolver, &req).await), Some(json!("custom")));

        let req = request(&schema, "name", Value::Json(json!({"name": "n"})), JsonMap::new());
        assert_eq!(json_of(run(&resolver, &req).await), Some(json!("n")));
    }

    #[tokio::test]
    async fn directive_wraps_previous_resolution() {
        let schema = Arc::new(Schema::parse(SCHEMA).unwrap());
        let mut resolver = dynamic();
        resolver.push(DirectiveResolver::new(
            "upper",
            |_: &ResolveRequest, _: &Node<ast::Directive>, next: Option<Resolution>| {
                let next = next?;
                Some(
                    async move {
                        let value = next.await?;
                        match value.to_json() {
                            Some(serde_json_bytes::Value::String(s)) => {
                                Ok(Value::json(s.as_str().to_uppercase()))
                            }
                            _ => Err(FieldError::new("not a string")),
                        }
                    }
                    .boxed(),
                )
            },
        ));
        let req = request(&schema, "shout", Value::object(Robot), JsonMap::new());
        assert_eq!(json_of(run(&resolver, &req).await), Some(json!("HEY")));
        let req = request(&schema, "name", Value::object(Robot), JsonMap::new());
        assert_eq!(json_of(run(&resolver, &req).await), Some(json!("R2")));
    }

    #[tokio::test]
    async fn func_resolver_sees_next() {
        let schema = Arc::new(Schema::parse(SCHEMA).unwrap());
        let resolver = FuncResolver(|_: &ResolveRequest, next: Option<Resolution>| {
            Some(next.unwrap_or_else(|| failed(FieldError::new("nothing"))))
        });
        let req = request(&schema, "name", Value::Null, JsonMap::new());
        let error = resolver.resolve(&req, None).unwrap().await.unwrap_err();
        assert_eq!(error.message, "nothing");
    }
}
