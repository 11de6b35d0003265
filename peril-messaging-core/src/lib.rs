pub mod ack;
pub mod codec;
pub mod consumer;
pub mod error;
pub mod handler;
pub mod routing;
pub mod types;

pub use ack::{apply_decision, AckAction, AckDecision, Acknowledger};
pub use codec::{CborCodec, Codec, JsonCodec, CONTENT_TYPE_CBOR, CONTENT_TYPE_JSON};
pub use consumer::{consume, ConsumeReport, InboundDelivery, Subscription};
pub use error::MessagingError;
pub use handler::{handler_fn, HandlerFn, MessageHandler};
pub use types::{
    decode_payload, Binding, Envelope, ExchangeKind, QueueDurability, QueueFlags,
};
