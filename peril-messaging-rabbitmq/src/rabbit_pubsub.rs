use futures_util::{stream, StreamExt};
use lapin::{
    options::{BasicConsumeOptions, BasicQosOptions, ConfirmSelectOptions},
    types::FieldTable,
    Channel, Connection, ConnectionProperties, Queue,
};
use serde::de::DeserializeOwned;
use tracing::info;

use peril_messaging_core::routing::{
    DEAD_LETTER_QUEUE, EXCHANGE_PERIL_DIRECT, EXCHANGE_PERIL_TOPIC,
};
use peril_messaging_core::{
    CborCodec, Codec, ExchangeKind, JsonCodec, MessageHandler, MessagingError, QueueDurability,
    Subscription,
};

use crate::delivery::into_inbound;
use crate::options::RabbitMqOptions;
use crate::topology::{declare_and_bind, declare_exchange};

/// A broker connection plus the options every declaration and subscription
/// made through it share.
pub struct RabbitPubSub {
    opts: RabbitMqOptions,
    conn: Connection,
}

impl RabbitPubSub {
    pub async fn connect(opts: RabbitMqOptions) -> Result<Self, MessagingError> {
        let conn = Connection::connect(&opts.uri, ConnectionProperties::default())
            .await
            .map_err(|e| MessagingError::Connection(e.to_string()))?;

        info!(service = %opts.service, "RabbitMQ connected");
        Ok(Self { opts, conn })
    }

    pub fn options(&self) -> &RabbitMqOptions {
        &self.opts
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Opens a channel for publishing, with publisher confirms when enabled.
    pub async fn open_channel(&self) -> Result<Channel, MessagingError> {
        let ch = self
            .conn
            .create_channel()
            .await
            .map_err(|e| MessagingError::Channel(e.to_string()))?;

        if self.opts.confirms {
            ch.confirm_select(ConfirmSelectOptions { nowait: false })
                .await
                .map_err(|e| MessagingError::Channel(e.to_string()))?;
        }
        Ok(ch)
    }

    /// Declares the game's direct and topic exchanges, and the dead-letter
    /// exchange with its catch-all queue when one is configured.
    pub async fn declare_game_topology(&self) -> Result<(), MessagingError> {
        let ch = self.open_channel().await?;
        declare_exchange(&ch, EXCHANGE_PERIL_DIRECT, ExchangeKind::Direct).await?;
        declare_exchange(&ch, EXCHANGE_PERIL_TOPIC, ExchangeKind::Topic).await?;

        if let Some(dlx) = self.opts.dead_letter_exchange.as_deref() {
            declare_exchange(&ch, dlx, ExchangeKind::Topic).await?;
            // The dead-letter queue itself must not dead-letter.
            declare_and_bind(
                &self.conn,
                dlx,
                DEAD_LETTER_QUEUE,
                "#",
                QueueDurability::Durable,
                None,
            )
            .await?;
        }
        Ok(())
    }

    pub async fn declare_and_bind(
        &self,
        exchange: &str,
        queue_name: &str,
        routing_key: &str,
        durability: QueueDurability,
    ) -> Result<(Channel, Queue), MessagingError> {
        declare_and_bind(
            &self.conn,
            exchange,
            queue_name,
            routing_key,
            durability,
            self.opts.dead_letter_exchange.as_deref(),
        )
        .await
    }

    /// Declares and binds `queue_name`, then spawns the task that feeds its
    /// deliveries through `codec` into `handler` in arrival order.
    ///
    /// Setup failures are returned here. Once running, the task ends only when
    /// its channel or connection closes; see [`Subscription::join`].
    pub async fn subscribe<T, C, H>(
        &self,
        exchange: &str,
        queue_name: &str,
        routing_key: &str,
        durability: QueueDurability,
        codec: C,
        handler: H,
    ) -> Result<Subscription, MessagingError>
    where
        T: DeserializeOwned + Send + 'static,
        C: Codec,
        H: MessageHandler<T>,
    {
        let (ch, _queue) = self
            .declare_and_bind(exchange, queue_name, routing_key, durability)
            .await?;

        ch.basic_qos(self.opts.prefetch, BasicQosOptions { global: false })
            .await
            .map_err(|e| MessagingError::Channel(e.to_string()))?;

        let consumer = ch
            .basic_consume(
                queue_name,
                &format!("{}.{}", self.opts.service, queue_name),
                BasicConsumeOptions {
                    no_ack: false,
                    exclusive: false,
                    nowait: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| MessagingError::Consume(format!("queue {queue_name}: {e}")))?;

        // The channel travels with the stream so it stays open for as long
        // as the task consumes.
        let deliveries = stream::unfold((ch, consumer), |(ch, mut consumer)| async move {
            let next = consumer.next().await?;
            Some((next, (ch, consumer)))
        })
        .map(|next| {
            next.map(into_inbound)
                .map_err(|e| MessagingError::Delivery(e.to_string()))
        });

        info!(
            queue = queue_name,
            exchange,
            routing_key,
            prefetch = self.opts.prefetch,
            content_type = codec.content_type(),
            "consuming"
        );
        Ok(Subscription::spawn::<T, _, _, _, _>(
            queue_name, deliveries, codec, handler,
        ))
    }

    pub async fn subscribe_json<T, H>(
        &self,
        exchange: &str,
        queue_name: &str,
        routing_key: &str,
        durability: QueueDurability,
        handler: H,
    ) -> Result<Subscription, MessagingError>
    where
        T: DeserializeOwned + Send + 'static,
        H: MessageHandler<T>,
    {
        self.subscribe::<T, _, H>(exchange, queue_name, routing_key, durability, JsonCodec, handler)
            .await
    }

    pub async fn subscribe_cbor<T, H>(
        &self,
        exchange: &str,
        queue_name: &str,
        routing_key: &str,
        durability: QueueDurability,
        handler: H,
    ) -> Result<Subscription, MessagingError>
    where
        T: DeserializeOwned + Send + 'static,
        H: MessageHandler<T>,
    {
        self.subscribe::<T, _, H>(exchange, queue_name, routing_key, durability, CborCodec, handler)
            .await
    }

    /// Closes the connection, which ends every subscription made through it.
    pub async fn close(&self) -> Result<(), MessagingError> {
        self.conn
            .close(200, "closing")
            .await
            .map_err(|e| MessagingError::Connection(e.to_string()))
    }
}
