use lapin::{
    options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions},
    types::{AMQPValue, FieldTable},
    Channel, Connection, Queue,
};
use tracing::{debug, info};

use peril_messaging_core::{ExchangeKind, MessagingError, QueueDurability};

pub const DEAD_LETTER_EXCHANGE_ARG: &str = "x-dead-letter-exchange";

/// Opens a channel for this call, declares `queue_name` with flags derived
/// from `durability`, and binds it to `exchange` under `routing_key`.
///
/// Redeclaring an identical queue is a no-op on the broker. Redeclaring it
/// with different flags fails with [`MessagingError::Declare`].
pub async fn declare_and_bind(
    conn: &Connection,
    exchange: &str,
    queue_name: &str,
    routing_key: &str,
    durability: QueueDurability,
    dead_letter_exchange: Option<&str>,
) -> Result<(Channel, Queue), MessagingError> {
    let ch = conn
        .create_channel()
        .await
        .map_err(|e| MessagingError::Channel(e.to_string()))?;

    let queue = ch
        .queue_declare(
            queue_name,
            queue_declare_options(durability)?,
            queue_arguments(dead_letter_exchange),
        )
        .await
        .map_err(|e| MessagingError::Declare(format!("queue {queue_name}: {e}")))?;

    ch.queue_bind(
        queue_name,
        exchange,
        routing_key,
        QueueBindOptions { nowait: false },
        FieldTable::default(),
    )
    .await
    .map_err(|e| {
        MessagingError::Bind(format!(
            "queue {queue_name} to exchange {exchange} with key {routing_key}: {e}"
        ))
    })?;

    debug!(
        queue = queue_name,
        exchange, routing_key, ?durability, "queue declared and bound"
    );
    Ok((ch, queue))
}

/// Declares a durable exchange. Idempotent for an identical kind.
pub async fn declare_exchange(
    ch: &Channel,
    name: &str,
    kind: ExchangeKind,
) -> Result<(), MessagingError> {
    ch.exchange_declare(
        name,
        amqp_exchange_kind(kind),
        ExchangeDeclareOptions {
            durable: true,
            auto_delete: false,
            internal: false,
            nowait: false,
            passive: false,
        },
        FieldTable::default(),
    )
    .await
    .map_err(|e| MessagingError::Declare(format!("exchange {name}: {e}")))?;

    info!(exchange = name, ?kind, "exchange declared");
    Ok(())
}

pub(crate) fn queue_declare_options(
    durability: QueueDurability,
) -> Result<QueueDeclareOptions, MessagingError> {
    let flags = durability.flags();
    flags.durability()?;
    Ok(QueueDeclareOptions {
        durable: flags.durable,
        auto_delete: flags.auto_delete,
        exclusive: flags.exclusive,
        nowait: false,
        passive: false,
    })
}

pub(crate) fn queue_arguments(dead_letter_exchange: Option<&str>) -> FieldTable {
    let mut args = FieldTable::default();
    if let Some(dlx) = dead_letter_exchange {
        args.insert(
            DEAD_LETTER_EXCHANGE_ARG.into(),
            AMQPValue::LongString(dlx.to_string().into()),
        );
    }
    args
}

fn amqp_exchange_kind(kind: ExchangeKind) -> lapin::ExchangeKind {
    match kind {
        ExchangeKind::Direct => lapin::ExchangeKind::Direct,
        ExchangeKind::Topic => lapin::ExchangeKind::Topic,
    }
}
