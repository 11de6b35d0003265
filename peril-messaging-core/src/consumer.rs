// peril-messaging-core/src/consumer.rs
use std::pin::pin;

use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::ack::{apply_decision, AckDecision, Acknowledger};
use crate::types::decode_payload;
use crate::{Codec, MessageHandler, MessagingError};

/// A raw message handed over by a transport, together with the handle used
/// to settle it.
#[derive(Debug)]
pub struct InboundDelivery<A> {
    pub delivery_tag: u64,
    pub routing_key: String,
    pub redelivered: bool,
    pub content_type: Option<String>,
    pub message_id: Option<String>,
    pub data: Vec<u8>,
    pub acker: A,
}

/// Per-subscription counters, returned when the delivery stream closes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConsumeReport {
    pub delivered: u64,
    pub acked: u64,
    pub requeued: u64,
    pub discarded: u64,
    /// Payloads that could not be decoded and were discarded; also counted
    /// in `discarded`. A failed discard is counted in `ack_failed` only.
    pub malformed: u64,
    pub ack_failed: u64,
}

impl ConsumeReport {
    fn record(&mut self, decision: AckDecision) {
        match decision {
            AckDecision::Ack => self.acked += 1,
            AckDecision::NackRequeue => self.requeued += 1,
            AckDecision::NackDiscard => self.discarded += 1,
        }
    }
}

/// Drains `deliveries` in arrival order: decode, hand to `handler`, settle.
///
/// Payloads that fail to decode are discarded (nack without requeue) and the
/// loop moves on. Returns when the stream ends, or with
/// [`MessagingError::Delivery`] when the transport yields an error.
pub async fn consume<T, A, S, C, H>(
    queue: &str,
    deliveries: S,
    codec: C,
    handler: H,
) -> Result<ConsumeReport, MessagingError>
where
    T: DeserializeOwned + Send + 'static,
    A: Acknowledger,
    S: Stream<Item = Result<InboundDelivery<A>, MessagingError>>,
    C: Codec,
    H: MessageHandler<T>,
{
    let mut deliveries = pin!(deliveries);
    let mut report = ConsumeReport::default();

    while let Some(next) = deliveries.next().await {
        let delivery = match next {
            Ok(d) => d,
            Err(e) => {
                error!(queue, "delivery stream failed: {e}");
                return Err(e);
            }
        };
        report.delivered += 1;

        let decoded: Result<T, _> =
            decode_payload(&codec, delivery.content_type.as_deref(), &delivery.data);
        let malformed = decoded.is_err();
        let decision = match decoded {
            Ok(message) => handler.handle(message).await,
            Err(e) => {
                warn!(
                    queue,
                    routing_key = %delivery.routing_key,
                    delivery_tag = delivery.delivery_tag,
                    "discarding undecodable message: {e}"
                );
                AckDecision::NackDiscard
            }
        };

        match apply_decision(&delivery.acker, decision).await {
            Ok(()) => {
                report.record(decision);
                if malformed {
                    report.malformed += 1;
                }
                debug!(
                    queue,
                    delivery_tag = delivery.delivery_tag,
                    ?decision,
                    "message settled"
                );
            }
            Err(e) => {
                report.ack_failed += 1;
                warn!(
                    queue,
                    delivery_tag = delivery.delivery_tag,
                    ?decision,
                    "failed to settle message: {e}"
                );
            }
        }
    }

    info!(queue, ?report, "delivery stream closed");
    Ok(report)
}

/// A running subscription. The processing task stops only when its delivery
/// stream closes; `join` reports how it ended.
#[derive(Debug)]
pub struct Subscription {
    queue: String,
    handle: JoinHandle<Result<ConsumeReport, MessagingError>>,
}

impl Subscription {
    /// Spawns [`consume`] on the current tokio runtime.
    pub fn spawn<T, A, S, C, H>(
        queue: impl Into<String>,
        deliveries: S,
        codec: C,
        handler: H,
    ) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        A: Acknowledger + 'static,
        S: Stream<Item = Result<InboundDelivery<A>, MessagingError>> + Send + 'static,
        C: Codec,
        H: MessageHandler<T>,
    {
        let queue = queue.into();
        let task_queue = queue.clone();
        let handle = tokio::spawn(async move {
            consume::<T, A, S, C, H>(&task_queue, deliveries, codec, handler).await
        });
        Self { queue, handle }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(self) -> Result<ConsumeReport, MessagingError> {
        self.handle
            .await
            .map_err(|e| MessagingError::Task(format!("queue {}: {e}", self.queue)))?
    }
}
