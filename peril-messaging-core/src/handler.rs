// peril-messaging-core/src/handler.rs
use std::future::Future;

use async_trait::async_trait;

use crate::AckDecision;

/// Processes one decoded message and decides how it is settled. Handlers
/// never talk to the broker themselves.
///
/// Plain closures run on tokio's blocking pool, so they may block freely.
/// Async handlers built with [`handler_fn`] run on the subscription task and
/// must not block.
#[async_trait]
pub trait MessageHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle(&self, message: T) -> AckDecision;
}

#[async_trait]
impl<T, F> MessageHandler<T> for F
where
    T: Send + 'static,
    F: Fn(T) -> AckDecision + Clone + Send + Sync + 'static,
{
    async fn handle(&self, message: T) -> AckDecision {
        let f = self.clone();
        match tokio::task::spawn_blocking(move || f(message)).await {
            Ok(decision) => decision,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            // Runtime shutting down: hand the message back to the broker.
            Err(_) => AckDecision::NackRequeue,
        }
    }
}

/// Adapter for handlers that need to await.
pub struct HandlerFn<F>(F);

pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn(f)
}

#[async_trait]
impl<T, F, Fut> MessageHandler<T> for HandlerFn<F>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AckDecision> + Send + 'static,
{
    async fn handle(&self, message: T) -> AckDecision {
        (self.0)(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run<H: MessageHandler<u32>>(handler: &H, value: u32) -> AckDecision {
        handler.handle(value).await
    }

    #[tokio::test]
    async fn plain_closures_are_handlers() {
        let handler = |n: u32| {
            if n % 2 == 0 {
                AckDecision::Ack
            } else {
                AckDecision::NackDiscard
            }
        };
        assert_eq!(run(&handler, 2).await, AckDecision::Ack);
        assert_eq!(run(&handler, 3).await, AckDecision::NackDiscard);
    }

    #[tokio::test]
    async fn async_closures_are_handlers() {
        let handler = handler_fn(|n: u32| async move {
            tokio::task::yield_now().await;
            if n == 0 {
                AckDecision::NackRequeue
            } else {
                AckDecision::Ack
            }
        });
        assert_eq!(run(&handler, 0).await, AckDecision::NackRequeue);
        assert_eq!(run(&handler, 1).await, AckDecision::Ack);
    }
}
