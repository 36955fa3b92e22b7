use super::make_response;
use super::walker::PreparedField;
use super::SubscriptionEvent;
use super::Walker;
use crate::ast;
use crate::resolvers::resolved;
use crate::resolvers::Value;
use crate::response::ResponseDataPathSegment;
use crate::response::Response;
use crate::Name;
use tokio::sync::mpsc;

impl<'a> Walker<'a> {
    /// Runs a subscription until it ends, sending one response per event.
    ///
    /// The root field is resolved once. Its resolver is expected to start
    /// producers that call
    /// [`fire_subscription_event`](super::ExecutionContext::fire_subscription_event).
    /// Each event value then becomes the root field's value for one response.
    ///
    /// `sender` keeps the event channel open until the root field has
    /// resolved. After that only the contexts held by resolvers do.
    pub(crate) async fn execute_subscription(
        &mut self,
        operation: &'a ast::OperationDefinition,
        root_type: &'a Name,
        root_value: Value,
        (sender, events): (
            mpsc::UnboundedSender<SubscriptionEvent>,
            &mut mpsc::UnboundedReceiver<SubscriptionEvent>,
        ),
        sink: &mpsc::Sender<Response>,
    ) {
        let _slot = self.ctx.acquire_slot().await;
        let grouped = self.collect_fields(root_type, &root_value, &operation.selection_set);
        let prepared = grouped
            .into_iter()
            .next()
            .and_then(|(key, collected)| self.prepare_field(key, collected));
        let Some(PreparedField {
            key,
            definition,
            fields,
            resolution,
        }) = prepared
        else {
            let _ = sink
                .send(make_response("{}".to_owned(), self.ctx.take_errors()))
                .await;
            return;
        };

        let resolution = self.await_resolution(resolution).await;
        drop(sender);
        if let Err(error) = resolution {
            tracing::debug!(field = %key, "graphql: subscription root field failed");
            self.path.push(ResponseDataPathSegment::Field(key.clone()));
            self.record(error, fields.first().and_then(|field| field.location()));
            self.path.pop();
            let data = if definition.ty.is_non_null() {
                "null"
            } else {
                "{}"
            };
            let _ = sink
                .send(make_response(data.to_owned(), self.ctx.take_errors()))
                .await;
            return;
        }

        let cancel = self.ctx.cancellation_token().clone();
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = events.recv() => event,
            };
            let value = match event {
                Some(SubscriptionEvent::Next(value)) => value,
                Some(SubscriptionEvent::End) | None => break,
            };
            self.out.clear();
            self.out.push('{');
            let mut first = true;
            let field = PreparedField {
                key,
                definition,
                fields: fields.clone(),
                resolution: Ok(resolved(value)),
            };
            let data = match self.write_field(&mut first, field).await {
                Ok(()) => {
                    self.out.push('}');
                    std::mem::take(&mut self.out)
                }
                Err(_) => "null".to_owned(),
            };
            if sink
                .send(make_response(data, self.ctx.take_errors()))
                .await
                .is_err()
            {
                tracing::debug!("graphql: subscription stream closed by receiver");
                break;
            }
        }
    }
}
