//! The request entry point.

use crate::ast;
use crate::execution::make_response;
use crate::execution::DefaultLogger;
use crate::execution::DefaultTracer;
use crate::execution::ExecutionContext;
use crate::execution::Logger;
use crate::execution::Tracer;
use crate::execution::Walker;
use crate::request::coerce_variable_values;
use crate::request::get_operation;
use crate::request::RequestError;
use crate::resolvers;
use crate::resolvers::Resolver;
use crate::resolvers::Value;
use crate::response::GraphQLError;
use crate::response::JsonMap;
use crate::response::Response;
use crate::validation::validate;
use crate::Name;
use crate::Node;
use crate::Parser;
use crate::Request;
use crate::Schema;
use serde::Deserialize;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Responses buffered by a [`ResponseStream`] before producers wait
const RESPONSE_BUFFER: usize = 16;

/// Executes requests against one schema.
///
/// Cheap to clone: clones share the schema, root value, and resolver pipeline.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    schema: Arc<Schema>,
    root_value: Value,
    resolver: Arc<dyn Resolver>,
    tracer: Arc<dyn Tracer>,
    logger: Arc<dyn Logger>,
    config: EngineConfig,
}

/// Tunables of an [`Engine`].
///
/// Deserializes with defaults for missing keys:
///
/// ```rust
/// let config: gqlrt::EngineConfig = serde_json::from_str(r#"{"maxDepth": 10}"#).unwrap();
/// assert_eq!(config.max_depth, 10);
/// assert_eq!(config.max_parallelism, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Deepest field nesting accepted by validation. 0 disables the check.
    pub max_depth: usize,
    /// Resolver bodies allowed to run at once, including the walker itself.
    /// 1 or less runs bodies inline.
    pub max_parallelism: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 50,
            max_parallelism: 10,
        }
    }
}

pub struct EngineBuilder {
    schema: Arc<Schema>,
    root_value: Value,
    resolver: Option<Arc<dyn Resolver>>,
    tracer: Arc<dyn Tracer>,
    logger: Arc<dyn Logger>,
    config: EngineConfig,
}

/// Responses of one request.
///
/// A query or mutation yields exactly one response. A subscription yields one
/// per event until it ends, the request is cancelled, or the stream is closed.
/// Dropping the stream cancels the request.
pub struct ResponseStream {
    receiver: mpsc::Receiver<Response>,
    cancel: CancellationToken,
    is_subscription: bool,
}

/// A request that passed parsing, validation and variable coercion
struct PreparedRequest {
    document: ast::QueryDocument,
    operation: Node<ast::OperationDefinition>,
    root_type: Name,
    variables: JsonMap,
}

impl Engine {
    pub fn builder(schema: impl Into<Arc<Schema>>) -> EngineBuilder {
        EngineBuilder {
            schema: schema.into(),
            root_value: Value::Null,
            resolver: None,
            tracer: Arc::new(DefaultTracer),
            logger: Arc::new(DefaultLogger),
            config: EngineConfig::default(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.inner.schema
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Executes a request and returns its first response.
    ///
    /// For a subscription, that is the response to the first event,
    /// after which the subscription is cancelled.
    pub async fn execute(&self, request: Request) -> Response {
        let mut stream = self.execute_stream(request);
        match stream.next().await {
            Some(response) => response,
            None => Response::from_errors(vec![GraphQLError::new(
                "execution ended without a response",
                None,
            )]),
        }
    }

    /// Executes a request in a Tokio task, streaming its responses.
    ///
    /// Parsing, validation, and variable coercion happen before this returns.
    /// Their errors are sent as the only response of the stream.
    pub fn execute_stream(&self, request: Request) -> ResponseStream {
        let span = self
            .inner
            .tracer
            .trace_query(&request.query, request.operation_name.as_deref());
        let cancel = request.context.child_token();
        let (sender, receiver) = mpsc::channel(RESPONSE_BUFFER);

        let prepared = match span.in_scope(|| self.prepare(&request)) {
            Ok(prepared) => prepared,
            Err(errors) => {
                // The channel is empty, so this does not fail
                let _ = sender.try_send(Response::from_errors(errors));
                return ResponseStream {
                    receiver,
                    cancel,
                    is_subscription: false,
                };
            }
        };
        let is_subscription = prepared.operation.operation_type.is_subscription();
        let engine = self.clone();
        let task_cancel = cancel.clone();
        tokio::spawn(
            async move { engine.run(prepared, task_cancel, sender).await }.instrument(span),
        );
        ResponseStream {
            receiver,
            cancel,
            is_subscription,
        }
    }

    fn prepare(&self, request: &Request) -> Result<PreparedRequest, Vec<GraphQLError>> {
        let schema = &*self.inner.schema;
        let document = Parser::new().parse_query(&request.query).map_err(|error| {
            tracing::debug!(%error, "graphql: query does not parse");
            vec![GraphQLError::new(error.to_string(), Some(error.location()))]
        })?;

        let errors = self
            .inner
            .tracer
            .trace_validation()
            .in_scope(|| validate(schema, &document, self.inner.config.max_depth));
        if !errors.is_empty() {
            tracing::debug!(count = errors.len(), "graphql: query is invalid");
            return Err(errors.iter().map(|error| error.to_graphql_error()).collect());
        }

        let request_error = |error: RequestError| {
            tracing::debug!(%error, "graphql: request error");
            vec![error.to_graphql_error()]
        };
        let operation = get_operation(&document, request.operation_name.as_deref())
            .map_err(request_error)?
            .clone();
        let variables = request
            .variables
            .to_map()
            .and_then(|values| coerce_variable_values(schema, &operation, &values))
            .map_err(request_error)?;
        let root_type = schema
            .root_operation(operation.operation_type)
            .cloned()
            .ok_or_else(|| {
                request_error(RequestError::UnsupportedOperation(
                    operation.operation_type.name(),
                ))
            })?;
        Ok(PreparedRequest {
            document,
            operation,
            root_type,
            variables,
        })
    }

    async fn run(
        &self,
        prepared: PreparedRequest,
        cancel: CancellationToken,
        sender: mpsc::Sender<Response>,
    ) {
        let PreparedRequest {
            document,
            operation,
            root_type,
            variables,
        } = prepared;
        let inner = &*self.inner;
        let subscription = operation
            .operation_type
            .is_subscription()
            .then(mpsc::unbounded_channel);
        let ctx = ExecutionContext::new(
            inner.schema.clone(),
            cancel.clone(),
            inner.config.max_parallelism,
            inner.logger.clone(),
            subscription.as_ref().map(|(events, _)| events.downgrade()),
        );
        let mut walker = Walker::new(
            ctx.clone(),
            &inner.schema,
            &document,
            inner.resolver.as_ref(),
            &variables,
        );
        tracing::debug!(
            operation_type = operation.operation_type.name(),
            root_type = %root_type,
            "graphql: executing"
        );
        let root_value = inner.root_value.clone();
        match subscription {
            Some((events, mut receiver)) => {
                walker
                    .execute_subscription(
                        &operation,
                        &root_type,
                        root_value,
                        (events, &mut receiver),
                        &sender,
                    )
                    .await
            }
            None => {
                let data = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    data = walker.execute_operation(&operation, &root_type, root_value) => Some(data),
                };
                let response = match data {
                    Some(data) => make_response(data, ctx.take_errors()),
                    None => Response::from_errors(vec![GraphQLError::new("request cancelled", None)]),
                };
                let _ = sender.send(response).await;
            }
        }
        // Stops producers and resolver tasks still running
        cancel.cancel();
        tracing::debug!("graphql: execution finished");
    }
}

impl EngineBuilder {
    /// The value the root operation type's fields are resolved on
    pub fn root_value(mut self, value: Value) -> Self {
        self.root_value = value;
        self
    }

    /// Replaces the [`dynamic`](resolvers::dynamic) resolver pipeline.
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn tracer(mut self, tracer: impl Tracer + 'static) -> Self {
        self.tracer = Arc::new(tracer);
        self
    }

    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    pub fn max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.config.max_parallelism = max_parallelism;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Engine {
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(resolvers::dynamic()));
        Engine {
            inner: Arc::new(EngineInner {
                schema: self.schema,
                root_value: self.root_value,
                resolver,
                tracer: self.tracer,
                logger: self.logger,
                config: self.config,
            }),
        }
    }
}

impl ResponseStream {
    /// Waits for the next response, or `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Response> {
        self.receiver.recv().await
    }

    /// Cancels the request. Responses already produced can still be received.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.receiver.close();
    }

    pub fn is_subscription(&self) -> bool {
        self.is_subscription
    }
}

impl futures::Stream for ResponseStream {
    type Item = Response;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Response>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for ResponseStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json_bytes::json;

    fn engine() -> Engine {
        let schema = Schema::parse("type Query { a: Int, b: String }").unwrap();
        Engine::builder(schema)
            .root_value(Value::Json(json!({"a": 1, "b": "two"})))
            .build()
    }

    #[test]
    fn config_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        let config: EngineConfig = serde_json::from_str(r#"{"maxParallelism": 1}"#).unwrap();
        assert_eq!(config.max_parallelism, 1);
        assert_eq!(config.max_depth, 50);
    }

    #[tokio::test]
    async fn syntax_errors_have_no_data() {
        let response = engine().execute(Request::new("{ a ")).await;
        assert!(response.data.is_none());
        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].message.starts_with("syntax error:"));
    }

    #[tokio::test]
    async fn unsupported_operation_type() {
        let response = engine().execute(Request::new("mutation { a }")).await;
        assert!(response.data.is_none());
        assert!(response.has_errors());
    }

    #[tokio::test]
    async fn single_response_stream() {
        let mut stream = engine().execute_stream(Request::new("{ b a }"));
        assert!(!stream.is_subscription());
        let response = stream.next().await.unwrap();
        assert_eq!(response.data.unwrap().get(), r#"{"b":"two","a":1}"#);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn cancelled_request() {
        let token = CancellationToken::new();
        token.cancel();
        let response = engine()
            .execute(Request::new("{ a }").context(token))
            .await;
        assert!(response.data.is_none());
        assert_eq!(response.errors[0].message, "request cancelled");
    }
}
