//! Connection lifecycle and the publish/consume-one cycle.
//!
//! The engine owns the broker connection and knows how to run one exchange:
//! publish a request to the output exchange, then take exactly one message off
//! the reply queue. It does not serialize callers; the client wraps every
//! exchange in its in-flight call guard.
//!
//! ## No correlation identifiers
//!
//! A reply is never matched against the request it answers. The next message
//! on the reply queue *is* the answer. That holds only while:
//!
//! 1. the remote side produces exactly one reply per request, in order;
//! 2. nothing but that remote side writes to the reply queue, which rules out
//!    two clients sharing one instance name;
//! 3. calls from one client never overlap (the call guard);
//! 4. the reply queue starts empty (purged by [`Engine::connect`]).
//!
//! Breaking any of these misattributes replies silently rather than raising
//! an error.

use bytes::Bytes;

use crate::{
    //
    log_debug,
    log_info,
    log_warn,
    BrokerPtr,
    ChannelPtr,
    ConnectionLink,
    ConnectionPtr,
    Error,
    Result,
    Topology,
};

/// An open connection and the one channel used on it.
struct ConnectionHandle {
    connection: ConnectionPtr,
    channel: ChannelPtr,
}

pub(crate) struct Engine {
    broker: BrokerPtr,
    link: ConnectionLink,
    topology: Topology,
    handle: Option<ConnectionHandle>,
}

impl Engine {
    pub(crate) fn new(broker: BrokerPtr, link: ConnectionLink, topology: Topology) -> Self {
        // ---
        Self {
            broker,
            link,
            topology,
            handle: None,
        }
    }

    pub(crate) fn link(&self) -> &ConnectionLink {
        &self.link
    }

    pub(crate) fn topology(&self) -> &Topology {
        &self.topology
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Open the connection and channel, resolve the exchange and reply queue,
    /// and purge replies left over from an earlier session.
    ///
    /// On failure the engine stays disconnected; anything opened along the
    /// way is closed again on a best-effort basis.
    pub(crate) async fn connect(&mut self) -> Result<()> {
        // ---
        if self.is_connected() {
            log_debug!("connect() on connected client {} ignored", self.topology.input_queue());
            return Ok(());
        }

        let connection = self.broker.connect(&self.link).await?;

        match self.open(&connection).await {
            Ok(channel) => {
                log_info!("connected, replies on {}", self.topology.input_queue());
                self.handle = Some(ConnectionHandle { connection, channel });
                Ok(())
            }
            Err(e) => {
                if let Err(_close_err) = connection.close().await {
                    log_warn!("closing half-open connection failed: {_close_err}");
                }
                Err(e)
            }
        }
    }

    async fn open(&self, connection: &ConnectionPtr) -> Result<ChannelPtr> {
        // ---
        let channel = connection.open_channel().await?;

        channel.resolve_exchange(self.topology.output_exchange()).await?;
        channel.resolve_queue(self.topology.input_queue()).await?;

        let stale = channel.purge(self.topology.input_queue()).await?;
        if stale > 0 {
            log_debug!("discarded {stale} stale repl(ies) from {}", self.topology.input_queue());
        }

        Ok(channel)
    }

    /// Close the channel, then the connection.
    ///
    /// The handle is released even when closing fails, so the engine always
    /// ends up disconnected.
    pub(crate) async fn disconnect(&mut self) -> Result<()> {
        // ---
        let handle = self.handle.take().ok_or(Error::NotConnected)?;

        let channel_closed = handle.channel.close().await;
        let connection_closed = handle.connection.close().await;

        log_info!("disconnected from {}", self.topology.output_exchange());

        channel_closed.and(connection_closed)
    }

    /// Drop the connection without waiting for it to close.
    ///
    /// For callers that cannot await, such as a dropped future. The engine is
    /// disconnected on return. Inside a tokio runtime the channel and then the
    /// connection are closed on a spawned task; outside one the handle is
    /// simply released. Does nothing when already disconnected.
    pub(crate) fn abandon(&mut self) {
        // ---
        let Some(handle) = self.handle.take() else {
            return;
        };

        log_warn!("abandoning connection to {}", self.topology.output_exchange());

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                if let Err(_e) = handle.channel.close().await {
                    log_warn!("closing abandoned channel failed: {_e}");
                }
                if let Err(_e) = handle.connection.close().await {
                    log_warn!("closing abandoned connection failed: {_e}");
                }
            });
        }
    }

    /// Publish `payload` and return the next reply.
    ///
    /// Callers must hold the in-flight call guard for the whole call.
    pub(crate) async fn exchange(&self, payload: Bytes) -> Result<Bytes> {
        // ---
        let handle = self.handle.as_ref().ok_or(Error::NotConnected)?;

        handle
            .channel
            .publish(
                self.topology.output_exchange(),
                self.topology.routing_key(),
                payload,
            )
            .await?;

        handle.channel.consume_one(self.topology.input_queue()).await
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::{BrokerEvent, Identity, MemoryBroker, Server, ServerProfile};
    use std::sync::Arc;
    use std::time::Duration;

    fn engine(broker: &MemoryBroker, instance: &str) -> Engine {
        // ---
        let identity = Identity::new(instance, "pw").unwrap();
        let server = Server::Classic(ServerProfile::new("amqp", "localhost", 5672).unwrap());
        Engine::new(
            Arc::new(broker.clone()),
            server.build_address(&identity),
            Topology::resolve(instance),
        )
    }

    #[tokio::test]
    async fn test_connect_purges_before_first_exchange() {
        // ---
        let broker = MemoryBroker::new();
        broker.serve_instance("bot1", |body| Bytes::copy_from_slice(body));
        broker.inject("bot1_i", "left over");
        broker.inject("bot1_i", "also left over");

        let mut engine = engine(&broker, "bot1");
        engine.connect().await.unwrap();
        assert_eq!(broker.queue_len("bot1_i"), 0);

        let reply = engine.exchange(Bytes::from_static(b"ping")).await.unwrap();
        assert_eq!(reply, Bytes::from_static(b"ping"));

        assert!(broker.events().contains(&BrokerEvent::Purged {
            queue: "bot1_i".into(),
            count: 2
        }));
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_engine_disconnected() {
        // ---
        let broker = MemoryBroker::new();
        // Exchange exists, reply queue does not.
        broker.declare_exchange("bot1_ex");

        let mut engine = engine(&broker, "bot1");
        let result = engine.connect().await;

        assert!(matches!(result, Err(Error::ConnectionFailure(_))));
        assert!(!engine.is_connected());
        assert_eq!(broker.events().last(), Some(&BrokerEvent::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_disconnect_closes_channel_then_connection() {
        // ---
        let broker = MemoryBroker::new();
        broker.declare_instance("bot1");

        let mut engine = engine(&broker, "bot1");
        engine.connect().await.unwrap();
        engine.disconnect().await.unwrap();

        let events = broker.events();
        let tail = &events[events.len() - 2..];
        assert_eq!(tail, &[BrokerEvent::ChannelClosed, BrokerEvent::ConnectionClosed]);
        assert!(!engine.is_connected());

        assert!(matches!(engine.disconnect().await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_abandon_closes_in_background() {
        // ---
        let broker = MemoryBroker::new();
        broker.declare_instance("bot1");

        let mut engine = engine(&broker, "bot1");
        engine.abandon();
        assert!(broker.events().is_empty());

        engine.connect().await.unwrap();
        engine.abandon();
        assert!(!engine.is_connected());

        tokio::time::sleep(Duration::from_millis(10)).await;

        let events = broker.events();
        let tail = &events[events.len() - 2..];
        assert_eq!(tail, &[BrokerEvent::ChannelClosed, BrokerEvent::ConnectionClosed]);
        assert!(matches!(engine.disconnect().await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_exchange_requires_connection() {
        // ---
        let broker = MemoryBroker::new();
        broker.declare_instance("bot1");

        let engine = engine(&broker, "bot1");
        let result = engine.exchange(Bytes::from_static(b"ping")).await;

        assert!(matches!(result, Err(Error::NotConnected)));
        assert!(broker.events().is_empty());
    }
}
