// peril-messaging-core/src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("channel error: {0}")]
    Channel(String),

    #[error("declare error: {0}")]
    Declare(String),

    #[error("bind error: {0}")]
    Bind(String),

    #[error("consume error: {0}")]
    Consume(String),

    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("deserialize error: {0}")]
    Deserialize(String),

    #[error("publish error: {0}")]
    Publish(String),

    #[error("ack error: {0}")]
    Ack(String),

    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("subscription task error: {0}")]
    Task(String),
}

impl MessagingError {
    /// Errors raised while setting up connections and topology. The caller is
    /// expected to abort its startup sequence.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Connection(_)
                | Self::Channel(_)
                | Self::Declare(_)
                | Self::Bind(_)
                | Self::Consume(_)
        )
    }

    /// Errors scoped to a single message; they never stop a processing loop.
    pub fn is_per_message(&self) -> bool {
        matches!(self, Self::Serialize(_) | Self::Deserialize(_) | Self::Ack(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_setup_and_per_message_errors() {
        assert!(MessagingError::Declare("406".into()).is_setup());
        assert!(MessagingError::Bind("404".into()).is_setup());
        assert!(!MessagingError::Publish("closed".into()).is_setup());

        assert!(MessagingError::Deserialize("eof".into()).is_per_message());
        assert!(!MessagingError::Delivery("reset".into()).is_per_message());
    }

    #[test]
    fn display_includes_kind_and_cause() {
        let err = MessagingError::Declare("PRECONDITION_FAILED".into());
        assert_eq!(err.to_string(), "declare error: PRECONDITION_FAILED");
    }
}
