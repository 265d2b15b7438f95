//! AMQP broker implementation using `lapin`.
//!
//! This module provides an implementation of the domain-level `Broker`,
//! `Connection`, and `Channel` traits backed by a real AMQP 0-9-1 server.
//!
//! ## Object resolution
//!
//! The client never declares broker objects. The output exchange and the
//! reply queue belong to the API operator and are looked up with *passive*
//! declarations, which fail with `NOT_FOUND` if they do not exist.
//!
//! ## Publishing
//!
//! Every channel is put in publisher-confirm mode, so `publish()` returns
//! only after the broker has acked the message. A nack is a connection
//! failure.
//!
//! ## Consuming replies
//!
//! The channel is switched to a prefetch of one so the broker never pushes
//! more than a single unacknowledged reply. The first `consume_one()` on a
//! queue starts a consumer for it; later calls read from the same consumer.
//! Each delivery is acknowledged before its body is handed back.
//!
//! ## Error mapping
//!
//! Every `lapin` error is mapped to
//! [`Error::ConnectionFailure`](crate::Error) with an `amqp:` prefix.

use bytes::Bytes;
use futures_lite::stream::StreamExt;
use lapin::{
    //
    options::{
        //
        BasicAckOptions,
        BasicConsumeOptions,
        BasicPublishOptions,
        BasicQosOptions,
        ConfirmSelectOptions,
        ExchangeDeclareOptions,
        QueueDeclareOptions,
        QueuePurgeOptions,
    },
    publisher_confirm::Confirmation,
    types::FieldTable,
    BasicProperties,
    Consumer,
    ExchangeKind,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    //
    log_debug,
    log_error,
    log_info,
    Broker,
    BrokerPtr,
    Channel,
    ChannelPtr,
    Connection,
    ConnectionLink,
    ConnectionPtr,
    Error,
    Result,
};

/// AMQP broker backed by `lapin`.
///
/// Holds no state of its own; every [`connect`](Broker::connect) opens a
/// fresh AMQP connection.
#[derive(Clone, Copy, Debug, Default)]
pub struct AmqpBroker;

#[async_trait::async_trait]
impl Broker for AmqpBroker {
    async fn connect(&self, link: &ConnectionLink) -> Result<ConnectionPtr> {
        // ---
        log_info!("Connecting to AMQP broker: {link}");

        let connection = lapin::Connection::connect(link.expose(), lapin::ConnectionProperties::default())
            .await
            .map_err(|e| {
                let msg = format!("amqp: connection failed: {e}");
                log_error!("{msg}");
                Error::ConnectionFailure(msg)
            })?;

        log_info!("Connected to AMQP broker");

        Ok(Arc::new(AmqpConnection { connection }))
    }
}

struct AmqpConnection {
    connection: lapin::Connection,
}

#[async_trait::async_trait]
impl Connection for AmqpConnection {
    async fn open_channel(&self) -> Result<ChannelPtr> {
        // ---
        let channel = self.connection.create_channel().await.map_err(|e| {
            let msg = format!("amqp: channel creation failed: {e}");
            log_error!("{msg}");
            Error::ConnectionFailure(msg)
        })?;

        channel
            .basic_qos(1, BasicQosOptions::default())
            .await
            .map_err(|e| Error::ConnectionFailure(format!("amqp: qos failed: {e}")))?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| Error::ConnectionFailure(format!("amqp: confirm mode failed: {e}")))?;

        log_info!("Created AMQP channel");

        Ok(Arc::new(AmqpChannel {
            channel,
            consumers: Mutex::new(HashMap::new()),
        }))
    }

    async fn close(&self) -> Result<()> {
        // ---
        self.connection
            .close(200, "Normal shutdown".into())
            .await
            .map_err(|e| Error::ConnectionFailure(format!("amqp: connection close failed: {e}")))
    }
}

struct AmqpChannel {
    channel: lapin::Channel,
    // One consumer per queue, started on first use.
    consumers: Mutex<HashMap<String, Consumer>>,
}

#[async_trait::async_trait]
impl Channel for AmqpChannel {
    async fn resolve_exchange(&self, name: &str) -> Result<()> {
        // ---
        let opts = ExchangeDeclareOptions {
            passive: true,
            ..ExchangeDeclareOptions::default()
        };

        self.channel
            .exchange_declare(name.into(), ExchangeKind::Direct, opts, FieldTable::default())
            .await
            .map_err(|e| Error::ConnectionFailure(format!("amqp: exchange '{name}' lookup failed: {e}")))
    }

    async fn resolve_queue(&self, name: &str) -> Result<()> {
        // ---
        let opts = QueueDeclareOptions {
            passive: true,
            ..QueueDeclareOptions::default()
        };

        self.channel
            .queue_declare(name.into(), opts, FieldTable::default())
            .await
            .map(|_| ())
            .map_err(|e| Error::ConnectionFailure(format!("amqp: queue '{name}' lookup failed: {e}")))
    }

    async fn purge(&self, queue: &str) -> Result<u32> {
        // ---
        let count = self
            .channel
            .queue_purge(queue.into(), QueuePurgeOptions::default())
            .await
            .map_err(|e| Error::ConnectionFailure(format!("amqp: purge failed: {e}")))?;

        log_debug!("Purged {count} stale message(s) from {queue}");
        Ok(count)
    }

    async fn publish(&self, exchange: &str, routing_key: &str, payload: Bytes) -> Result<()> {
        // ---
        let confirmation = self
            .channel
            .basic_publish(
                exchange.into(),
                routing_key.into(),
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default(),
            )
            .await
            .map_err(|e| Error::ConnectionFailure(format!("amqp: publish failed: {e}")))?
            .await
            .map_err(|e| Error::ConnectionFailure(format!("amqp: publish confirm failed: {e}")))?;

        confirmed(confirmation, exchange)?;

        log_debug!("Published to {exchange} with routing key {routing_key}");
        Ok(())
    }

    async fn consume_one(&self, queue: &str) -> Result<Bytes> {
        // ---
        let mut consumers = self.consumers.lock().await;

        if !consumers.contains_key(queue) {
            let consumer = self
                .channel
                .basic_consume(
                    queue.into(),
                    &format!("{queue}-consumer"),
                    BasicConsumeOptions::default(),
                    FieldTable::default(),
                )
                .await
                .map_err(|e| Error::ConnectionFailure(format!("amqp: consume failed: {e}")))?;

            log_info!("Started consuming queue: {queue}");
            consumers.insert(queue.to_string(), consumer);
        }

        let consumer = consumers
            .get_mut(queue)
            .ok_or_else(|| Error::ConnectionFailure(format!("amqp: no consumer for {queue}")))?;

        let delivery = match consumer.next().await {
            Some(Ok(delivery)) => delivery,
            Some(Err(e)) => {
                let msg = format!("amqp: consumer error on {queue}: {e}");
                log_error!("{msg}");
                return Err(Error::ConnectionFailure(msg));
            }
            None => {
                return Err(Error::ConnectionFailure(format!(
                    "amqp: consumer for {queue} was cancelled"
                )))
            }
        };

        delivery
            .ack(BasicAckOptions::default())
            .await
            .map_err(|e| Error::ConnectionFailure(format!("amqp: ack failed: {e}")))?;

        log_debug!("Received message on queue: {queue}");
        Ok(Bytes::from(delivery.data))
    }

    async fn close(&self) -> Result<()> {
        // ---
        self.consumers.lock().await.clear();

        self.channel
            .close(200, "Normal shutdown".into())
            .await
            .map_err(|e| Error::ConnectionFailure(format!("amqp: channel close failed: {e}")))
    }
}

/// Turn the broker's answer to a publish into a result.
///
/// Only an ack counts. `NotRequested` means the channel left confirm mode,
/// so nothing was actually confirmed.
fn confirmed(confirmation: Confirmation, exchange: &str) -> Result<()> {
    // ---
    let problem = match confirmation {
        Confirmation::Ack(_) => return Ok(()),
        Confirmation::Nack(_) => "nacked by broker",
        Confirmation::NotRequested => "not confirmed, channel is not in confirm mode",
    };

    let msg = format!("amqp: publish to {exchange} {problem}");
    log_error!("{msg}");
    Err(Error::ConnectionFailure(msg))
}

/// Creates a lapin-based AMQP broker.
///
/// No connection is made until the client connects.
pub fn create_broker() -> BrokerPtr {
    Arc::new(AmqpBroker)
}
