use async_trait::async_trait;
use lapin::{
    acker::Acker,
    message::Delivery,
    options::{BasicAckOptions, BasicNackOptions},
};

use peril_messaging_core::{Acknowledger, InboundDelivery, MessagingError};

/// Settles a lapin delivery on the channel it arrived on.
pub struct LapinAcker(Acker);

#[async_trait]
impl Acknowledger for LapinAcker {
    async fn ack(&self) -> Result<(), MessagingError> {
        self.0
            .ack(BasicAckOptions { multiple: false })
            .await
            .map_err(|e| MessagingError::Ack(e.to_string()))?;
        Ok(())
    }

    async fn nack(&self, requeue: bool) -> Result<(), MessagingError> {
        self.0
            .nack(BasicNackOptions {
                multiple: false,
                requeue,
            })
            .await
            .map_err(|e| MessagingError::Ack(e.to_string()))?;
        Ok(())
    }
}

pub(crate) fn into_inbound(d: Delivery) -> InboundDelivery<LapinAcker> {
    InboundDelivery {
        delivery_tag: d.delivery_tag,
        routing_key: d.routing_key.to_string(),
        redelivered: d.redelivered,
        content_type: d.properties.content_type().as_ref().map(|s| s.to_string()),
        message_id: d.properties.message_id().as_ref().map(|s| s.to_string()),
        data: d.data,
        acker: LapinAcker(d.acker),
    }
}
