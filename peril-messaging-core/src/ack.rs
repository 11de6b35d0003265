// peril-messaging-core/src/ack.rs
use async_trait::async_trait;

use crate::MessagingError;

/// What a handler wants done with the message it just processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AckDecision {
    /// Remove the message for good.
    Ack,
    /// Remove the message; it is dead-lettered when the queue has a DLX.
    NackDiscard,
    /// Return the message to the queue for redelivery.
    NackRequeue,
}

/// The broker call a decision translates to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckAction {
    Ack,
    Nack { requeue: bool },
}

impl AckDecision {
    pub const fn action(self) -> AckAction {
        match self {
            Self::Ack => AckAction::Ack,
            Self::NackDiscard => AckAction::Nack { requeue: false },
            Self::NackRequeue => AckAction::Nack { requeue: true },
        }
    }
}

/// Settles a single delivery with the broker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Acknowledger: Send + Sync {
    async fn ack(&self) -> Result<(), MessagingError>;

    async fn nack(&self, requeue: bool) -> Result<(), MessagingError>;
}

/// Applies `decision` with exactly one call on `acker`.
pub async fn apply_decision<A>(acker: &A, decision: AckDecision) -> Result<(), MessagingError>
where
    A: Acknowledger + ?Sized,
{
    match decision.action() {
        AckAction::Ack => acker.ack().await,
        AckAction::Nack { requeue } => acker.nack(requeue).await,
    }
}
