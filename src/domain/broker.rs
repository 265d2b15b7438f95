// src/domain/broker.rs

//! Broker domain abstractions.
//!
//! These traits describe the small slice of an AMQP broker the client relies
//! on: open a connection, open one channel on it, look up an exchange and a
//! queue by name, purge a queue, publish to an exchange with a routing key,
//! and take exactly one message off a queue.
//!
//! The engine never sees library-specific types. Each implementation maps
//! its own failures to [`Error::ConnectionFailure`](crate::Error) at this
//! boundary.
//!
//! The in-memory broker is the reference implementation of these semantics.

use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{ConnectionLink, Result};

/// Boxed future used by the scoped-connection helpers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Entry point of a broker implementation.
///
/// # Notes
///
/// These traits use `async_trait`; the expanded documentation may show
/// explicit lifetimes and a boxed `Future`. Treat the methods as normal
/// `async fn`s.
#[async_trait::async_trait]
pub trait Broker: Send + Sync {
    /// Open a connection authenticated by the credentials embedded in `link`.
    async fn connect(&self, link: &ConnectionLink) -> Result<ConnectionPtr>;
}

/// An open broker connection.
#[async_trait::async_trait]
pub trait Connection: Send + Sync {
    /// Open a channel on this connection.
    async fn open_channel(&self) -> Result<ChannelPtr>;

    /// Close the connection. Channels opened on it stop working.
    async fn close(&self) -> Result<()>;
}

/// An open channel.
#[async_trait::async_trait]
pub trait Channel: Send + Sync {
    /// Check that an exchange with this name exists.
    async fn resolve_exchange(&self, name: &str) -> Result<()>;

    /// Check that a queue with this name exists.
    async fn resolve_queue(&self, name: &str) -> Result<()>;

    /// Drop every message currently held by `queue`, returning how many were
    /// dropped.
    async fn purge(&self, queue: &str) -> Result<u32>;

    /// Publish `payload` to `exchange` with `routing_key`.
    ///
    /// Returns once the broker has confirmed the publish.
    async fn publish(&self, exchange: &str, routing_key: &str, payload: Bytes) -> Result<()>;

    /// Wait for the next message on `queue`, acknowledge it, and return its
    /// body.
    ///
    /// Waits indefinitely; there is no timeout at this layer.
    async fn consume_one(&self, queue: &str) -> Result<Bytes>;

    /// Close the channel.
    async fn close(&self) -> Result<()>;
}

/// Shared broker pointer.
///
/// Cloning only bumps a reference count; clones share the same broker.
pub type BrokerPtr = Arc<dyn Broker>;

pub type ConnectionPtr = Arc<dyn Connection>;

pub type ChannelPtr = Arc<dyn Channel>;
