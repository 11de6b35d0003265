mod delivery;
mod options;
mod publisher;
mod rabbit_pubsub;
mod topology;

pub use delivery::LapinAcker;
pub use options::{RabbitMqOptions, DEFAULT_PREFETCH, DEFAULT_SERVICE, DEFAULT_URI};
pub use publisher::{publish, publish_cbor, publish_envelope, publish_json};
pub use rabbit_pubsub::RabbitPubSub;
pub use topology::{declare_and_bind, declare_exchange, DEAD_LETTER_EXCHANGE_ARG};
