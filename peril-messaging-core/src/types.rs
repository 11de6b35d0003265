// peril-messaging-core/src/types.rs
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::routing::topic_matches;
use crate::{Codec, MessagingError};

/// Exchange routing kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExchangeKind {
    /// Exact routing-key match.
    Direct,
    /// `*` / `#` wildcard pattern match.
    Topic,
}

/// How long a queue lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueDurability {
    /// Survives broker restarts, shared between consumers.
    Durable,
    /// Deleted once its only consumer goes away.
    Transient,
}

impl QueueDurability {
    pub const fn flags(self) -> QueueFlags {
        match self {
            Self::Durable => QueueFlags {
                durable: true,
                auto_delete: false,
                exclusive: false,
            },
            Self::Transient => QueueFlags {
                durable: false,
                auto_delete: true,
                exclusive: true,
            },
        }
    }
}

/// Raw queue declaration flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFlags {
    pub durable: bool,
    pub auto_delete: bool,
    pub exclusive: bool,
}

impl QueueFlags {
    /// Classifies a flag combination. Only the two combinations produced by
    /// [`QueueDurability::flags`] are accepted.
    pub fn durability(self) -> Result<QueueDurability, MessagingError> {
        match (self.durable, self.auto_delete, self.exclusive) {
            (true, false, false) => Ok(QueueDurability::Durable),
            (false, true, true) => Ok(QueueDurability::Transient),
            _ => Err(MessagingError::Declare(format!(
                "inconsistent queue flags: durable={} auto_delete={} exclusive={}",
                self.durable, self.auto_delete, self.exclusive
            ))),
        }
    }
}

/// A (queue, exchange, routing key) triple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub queue: String,
    pub exchange: String,
    pub routing_key: String,
}

impl Binding {
    pub fn new(
        queue: impl Into<String>,
        exchange: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> Self {
        Self {
            queue: queue.into(),
            exchange: exchange.into(),
            routing_key: routing_key.into(),
        }
    }

    /// Whether a message published with `key` on an exchange of `kind`
    /// reaches this binding.
    pub fn matches(&self, kind: ExchangeKind, key: &str) -> bool {
        match kind {
            ExchangeKind::Direct => self.routing_key == key,
            ExchangeKind::Topic => topic_matches(&self.routing_key, key),
        }
    }
}

/// Encoded message ready to go on the wire. Never mutated once sealed.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub message_id: Uuid,
    pub content_type: String,
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl Envelope {
    pub fn seal<T, C>(codec: &C, value: &T) -> Result<Self, MessagingError>
    where
        T: Serialize,
        C: Codec,
    {
        Ok(Self {
            message_id: Uuid::new_v4(),
            content_type: codec.content_type().to_string(),
            payload: codec.encode(value)?,
            created_at: Utc::now(),
        })
    }

    pub fn open<T, C>(&self, codec: &C) -> Result<T, MessagingError>
    where
        T: DeserializeOwned,
        C: Codec,
    {
        decode_payload(codec, Some(&self.content_type), &self.payload)
    }
}

/// Decodes a payload, rejecting it when a declared content type does not
/// belong to `codec`. Publishers that omit the content type are trusted.
pub fn decode_payload<T, C>(
    codec: &C,
    content_type: Option<&str>,
    payload: &[u8],
) -> Result<T, MessagingError>
where
    T: DeserializeOwned,
    C: Codec,
{
    if let Some(ct) = content_type {
        if ct != codec.content_type() {
            return Err(MessagingError::Deserialize(format!(
                "content type {ct} does not match codec {}",
                codec.content_type()
            )));
        }
    }
    codec.decode(payload)
}
