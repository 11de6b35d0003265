use lapin::{options::BasicPublishOptions, BasicProperties, Channel};
use serde::Serialize;
use tracing::debug;

use peril_messaging_core::{CborCodec, Codec, Envelope, JsonCodec, MessagingError};

/// Encodes `value` with `codec` and sends it to `exchange` under
/// `routing_key`. No retry and no buffering: a failure is returned as is.
///
/// Publishes on one channel must be serialized by the caller.
pub async fn publish<T, C>(
    ch: &Channel,
    exchange: &str,
    routing_key: &str,
    value: &T,
    codec: &C,
) -> Result<(), MessagingError>
where
    T: Serialize,
    C: Codec,
{
    let envelope = Envelope::seal(codec, value)?;
    publish_envelope(ch, exchange, routing_key, &envelope).await
}

pub async fn publish_json<T: Serialize>(
    ch: &Channel,
    exchange: &str,
    routing_key: &str,
    value: &T,
) -> Result<(), MessagingError> {
    publish(ch, exchange, routing_key, value, &JsonCodec).await
}

pub async fn publish_cbor<T: Serialize>(
    ch: &Channel,
    exchange: &str,
    routing_key: &str,
    value: &T,
) -> Result<(), MessagingError> {
    publish(ch, exchange, routing_key, value, &CborCodec).await
}

pub async fn publish_envelope(
    ch: &Channel,
    exchange: &str,
    routing_key: &str,
    envelope: &Envelope,
) -> Result<(), MessagingError> {
    let confirm = ch
        .basic_publish(
            exchange,
            routing_key,
            BasicPublishOptions {
                mandatory: false,
                immediate: false,
            },
            &envelope.payload,
            properties_for(envelope),
        )
        .await
        .map_err(|e| MessagingError::Publish(e.to_string()))?
        .await
        .map_err(|e| MessagingError::Publish(e.to_string()))?;

    if confirm.is_nack() {
        return Err(MessagingError::Publish(format!(
            "broker rejected message {} to {exchange}/{routing_key}",
            envelope.message_id
        )));
    }

    debug!(
        exchange,
        routing_key,
        message_id = %envelope.message_id,
        "message published"
    );
    Ok(())
}

fn properties_for(envelope: &Envelope) -> BasicProperties {
    BasicProperties::default()
        .with_content_type(envelope.content_type.clone().into())
        .with_message_id(envelope.message_id.to_string().into())
        .with_timestamp(envelope.created_at.timestamp().max(0) as u64)
}
