//! Execution of a validated operation.
//!
//! The walker resolves every field of a selection set through the
//! [resolver pipeline](crate::resolvers) before writing any of them, then
//! awaits the resolutions in document order while writing JSON text. A field
//! whose resolver fails is rolled back out of the output and left out of its
//! object. When a non-null value cannot be completed, the null moves up to the
//! nearest nullable field or list item, which is written as `null`.
//!
//! Resolver bodies that want to run concurrently go through
//! [`ExecutionContext::run_async`], which bounds them with a semaphore of
//! `max_parallelism` permits. The walker itself holds one of those permits.

use crate::resolvers::FieldError;
use crate::resolvers::Resolution;
use crate::resolvers::Value;
use crate::response::GraphQLError;
use crate::response::Response;
use crate::Schema;
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::value::RawValue;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::OwnedSemaphorePermit;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

mod subscription;
mod walker;

pub(crate) use self::walker::Walker;

/// Hooks around the phases of a request.
///
/// The default implementation opens [`tracing`] spans.
pub trait Tracer: Send + Sync {
    /// Span covering a whole request, from parsing to the last response
    fn trace_query(&self, query: &str, operation_name: Option<&str>) -> tracing::Span {
        tracing::debug_span!(
            "graphql.query",
            operation_name = operation_name.unwrap_or_default(),
            query_len = query.len()
        )
    }

    /// Span covering validation of the query document
    fn trace_validation(&self) -> tracing::Span {
        tracing::debug_span!("graphql.validation")
    }
}

/// Where recovered panics are reported
pub trait Logger: Send + Sync {
    fn log_panic(&self, message: &str) {
        tracing::error!(panic = message, "graphql: panic occurred in resolver");
    }
}

/// [`Tracer`] with the default `tracing` spans
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTracer;

impl Tracer for DefaultTracer {}

/// [`Logger`] reporting through `tracing::error!`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLogger;

impl Logger for DefaultLogger {}

/// State shared by every resolver of one execution.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
    /// Set on the contexts handed to resolvers of a subscription. The event
    /// stream stays open while any of them is alive.
    events: Option<mpsc::UnboundedSender<SubscriptionEvent>>,
}

struct ContextInner {
    schema: Arc<Schema>,
    cancel: CancellationToken,
    limiter: Arc<Semaphore>,
    max_parallelism: usize,
    logger: Arc<dyn Logger>,
    errors: Mutex<Vec<GraphQLError>>,
    events: Option<mpsc::WeakUnboundedSender<SubscriptionEvent>>,
}

pub(crate) enum SubscriptionEvent {
    Next(Value),
    End,
}

impl ExecutionContext {
    pub(crate) fn new(
        schema: Arc<Schema>,
        cancel: CancellationToken,
        max_parallelism: usize,
        logger: Arc<dyn Logger>,
        events: Option<mpsc::WeakUnboundedSender<SubscriptionEvent>>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                schema,
                cancel,
                limiter: Arc::new(Semaphore::new(max_parallelism.max(1))),
                max_parallelism,
                logger,
                errors: Mutex::new(Vec::new()),
                events,
            }),
            events: None,
        }
    }

    /// The context a resolver sees. For a subscription it holds the event
    /// stream open until the resolver and its producers drop it.
    pub(crate) fn for_resolver(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            events: self.event_sender(),
        }
    }

    fn event_sender(&self) -> Option<mpsc::UnboundedSender<SubscriptionEvent>> {
        self.events
            .clone()
            .or_else(|| self.inner.events.as_ref()?.upgrade())
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.inner.schema
    }

    /// Cancelled when the request is cancelled or its response stream is closed
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Adds an error to the response being built.
    pub fn add_error(&self, error: GraphQLError) {
        self.inner.errors.lock().push(error);
    }

    pub(crate) fn take_errors(&self) -> Vec<GraphQLError> {
        std::mem::take(&mut *self.inner.errors.lock())
    }

    pub(crate) fn log_panic(&self, message: &str) {
        self.inner.logger.log_panic(message)
    }

    /// Takes the permit the walker holds for the whole execution.
    ///
    /// Returns `None` when bodies run inline.
    pub(crate) async fn acquire_slot(&self) -> Option<OwnedSemaphorePermit> {
        if self.inner.max_parallelism <= 1 {
            return None;
        }
        self.inner.limiter.clone().acquire_owned().await.ok()
    }

    /// Runs `future` as a Tokio task once a slot of the limiter is free.
    ///
    /// With a `max_parallelism` of 1 or less, the body instead runs inline
    /// when the walker awaits the returned resolution. A panic in the body
    /// becomes a field error.
    pub fn run_async<F>(&self, future: F) -> Resolution
    where
        F: Future<Output = Result<Value, FieldError>> + Send + 'static,
    {
        let ctx = self.clone();
        let guarded = async move {
            match AssertUnwindSafe(future).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(&*payload);
                    ctx.log_panic(&message);
                    Err(FieldError::panic(&message))
                }
            }
        };
        if self.inner.max_parallelism <= 1 {
            return guarded.boxed();
        }
        let limiter = self.inner.limiter.clone();
        let cancel = self.inner.cancel.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(FieldError::new("request cancelled")),
                result = async move {
                    let _permit = limiter
                        .acquire_owned()
                        .await
                        .map_err(|_| FieldError::new("execution limiter closed"))?;
                    guarded.await
                } => result,
            }
        });
        async move {
            task.await.unwrap_or_else(|error| {
                Err(FieldError::new(format!("resolver task failed: {error}")))
            })
        }
        .boxed()
    }

    /// Whether the current operation is a subscription
    pub fn is_subscription(&self) -> bool {
        self.inner.events.is_some()
    }

    /// Queues a subscription event: the root field is rendered again with `value`.
    ///
    /// Returns `false` if this is not a subscription or its stream has ended.
    /// The stream ends on its own once the root field has resolved and every
    /// context handed to a resolver has been dropped.
    pub fn fire_subscription_event(&self, value: Value) -> bool {
        self.event_sender()
            .is_some_and(|events| events.send(SubscriptionEvent::Next(value)).is_ok())
    }

    /// Ends the subscription stream after the events already queued.
    pub fn end_subscription(&self) {
        if let Some(events) = self.event_sender() {
            // The stream may already be gone
            let _ = events.send(SubscriptionEvent::End);
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

/// Wraps the JSON text written by the walker into a response.
pub(crate) fn make_response(data: String, errors: Vec<GraphQLError>) -> Response {
    match RawValue::from_string(data) {
        Ok(data) => Response {
            data: Some(data),
            errors,
            extensions: None,
        },
        Err(error) => {
            tracing::error!(%error, "graphql: executor produced invalid JSON");
            let mut errors = errors;
            errors.push(GraphQLError::new(
                format!("invalid response data: {error}"),
                None,
            ));
            Response::from_errors(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json_bytes::json;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn context(max_parallelism: usize) -> ExecutionContext {
        ExecutionContext::new(
            Arc::new(Schema::new()),
            CancellationToken::new(),
            max_parallelism,
            Arc::new(DefaultLogger),
            None,
        )
    }

    #[tokio::test]
    async fn panics_become_field_errors() {
        for max_parallelism in [1, 4] {
            let ctx = context(max_parallelism);
            let result = ctx
                .run_async(async {
                    if true {
                        panic!("boom");
                    }
                    Ok(Value::Null)
                })
                .await;
            assert_eq!(
                result.unwrap_err().message,
                "graphql: panic occurred: boom"
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn limiter_bounds_concurrency() {
        let ctx = context(3);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let resolutions: Vec<_> = (0..12)
            .map(|i| {
                let running = running.clone();
                let peak = peak.clone();
                ctx.run_async(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(Value::Json(json!(i)))
                })
            })
            .collect();
        for (i, resolution) in resolutions.into_iter().enumerate() {
            let value = resolution.await.unwrap();
            assert!(matches!(value, Value::Json(json) if json == json!(i)));
        }
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn cancelled_bodies_do_not_run() {
        let ctx = context(4);
        ctx.cancellation_token().cancel();
        let result = ctx.run_async(async { Ok(Value::Null) }).await;
        assert_eq!(result.unwrap_err().message, "request cancelled");
    }

    #[test]
    fn subscription_events_need_a_subscription() {
        let ctx = context(1);
        assert!(!ctx.is_subscription());
        assert!(!ctx.fire_subscription_event(Value::Null));
    }
}
