// src/client/mod.rs
//! API client.
//!
//! [`ApiClient`] ties together the address builder, the topology, the
//! connection engine, and the request codec. Its execution mode is a type
//! parameter, so a client is either a [`BlockingApiClient`] or an
//! [`AsyncApiClient`] for its whole lifetime:
//!
//! - `connect()` opens the connection and purges stale replies.
//! - `ask()` publishes one request and returns the next reply, holding the
//!   in-flight call guard for the whole exchange.
//! - `disconnect()` closes the channel, then the connection.
//!
//! `connect` and `disconnect` take `&mut self` while `ask` takes `&self`, so
//! the borrow checker already rules out reconnecting underneath a call.
//!
//! # Concurrency
//!
//! Calls on one client never overlap. A second `ask` waits for the guard
//! (blocking the thread or suspending the task, depending on the mode) and
//! only publishes after the first call has consumed its reply. Replies are
//! therefore observed in the order the calls acquired the guard.

mod blocking;
mod suspending;

pub use blocking::ConnectionScope;

use crate::{
    //
    mode::{Blocking, ExecutionMode, ModeKind, Suspending},
    engine::Engine,
    BrokerPtr,
    ConnectionLink,
    Identity,
    Result,
    Server,
    Topology,
};

/// Client for one API instance, bound to execution mode `M`.
pub struct ApiClient<M: ExecutionMode> {
    engine: Engine,
    mode: M,
    server: Server,
    identity: Identity,
}

/// Client whose calls block the calling thread.
pub type BlockingApiClient = ApiClient<Blocking>;

/// Client whose calls suspend the calling task.
pub type AsyncApiClient = ApiClient<Suspending>;

impl<M: ExecutionMode> ApiClient<M> {
    /// Create a client talking to `server` through the lapin AMQP broker.
    ///
    /// No connection is made until [`connect`](ApiClient::connect).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error) if the identity is
    /// malformed.
    #[cfg(feature = "transport_lapin")]
    pub fn new(server: Server, instance_name: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        // ---
        Self::with_broker(server, instance_name, password, crate::create_lapin_broker())
    }

    /// Create a client talking to `server` through `broker`.
    pub fn with_broker(
        server: Server,
        instance_name: impl Into<String>,
        password: impl Into<String>,
        broker: BrokerPtr,
    ) -> Result<Self> {
        // ---
        let identity = Identity::new(instance_name, password)?;
        Self::from_parts(server, identity, broker)
    }

    pub(crate) fn from_parts(server: Server, identity: Identity, broker: BrokerPtr) -> Result<Self> {
        // ---
        let link = server.build_address(&identity);
        let topology = Topology::resolve(identity.instance_name());
        let mode = M::realize()?;

        Ok(Self {
            engine: Engine::new(broker, link, topology),
            mode,
            server,
            identity,
        })
    }

    pub fn instance_name(&self) -> &str {
        self.identity.instance_name()
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Connection URI. Its `Debug` and `Display` output hide the credential.
    pub fn connection_link(&self) -> &ConnectionLink {
        self.engine.link()
    }

    pub fn topology(&self) -> &Topology {
        self.engine.topology()
    }

    pub fn output_exchange_name(&self) -> &str {
        self.topology().output_exchange()
    }

    pub fn input_queue_name(&self) -> &str {
        self.topology().input_queue()
    }

    pub fn routing_key(&self) -> &str {
        self.topology().routing_key()
    }

    pub fn is_connected(&self) -> bool {
        self.engine.is_connected()
    }

    pub fn mode(&self) -> ModeKind {
        M::KIND
    }
}

impl<M: ExecutionMode> std::fmt::Debug for ApiClient<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // ---
        f.debug_struct("ApiClient")
            .field("mode", &M::KIND)
            .field("server", &self.server)
            .field("identity", &self.identity)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// A client of either execution mode, as produced by
/// [`ClientBuilder::build`](crate::ClientBuilder::build).
#[derive(Debug)]
pub enum AnyApiClient {
    Blocking(BlockingApiClient),
    Suspending(AsyncApiClient),
}

impl AnyApiClient {
    pub fn mode(&self) -> ModeKind {
        // ---
        match self {
            AnyApiClient::Blocking(_) => ModeKind::Blocking,
            AnyApiClient::Suspending(_) => ModeKind::Suspending,
        }
    }

    pub fn instance_name(&self) -> &str {
        // ---
        match self {
            AnyApiClient::Blocking(c) => c.instance_name(),
            AnyApiClient::Suspending(c) => c.instance_name(),
        }
    }

    pub fn topology(&self) -> &Topology {
        // ---
        match self {
            AnyApiClient::Blocking(c) => c.topology(),
            AnyApiClient::Suspending(c) => c.topology(),
        }
    }

    pub fn is_connected(&self) -> bool {
        // ---
        match self {
            AnyApiClient::Blocking(c) => c.is_connected(),
            AnyApiClient::Suspending(c) => c.is_connected(),
        }
    }

    pub fn as_blocking(&mut self) -> Option<&mut BlockingApiClient> {
        // ---
        match self {
            AnyApiClient::Blocking(c) => Some(c),
            AnyApiClient::Suspending(_) => None,
        }
    }

    pub fn as_async(&mut self) -> Option<&mut AsyncApiClient> {
        // ---
        match self {
            AnyApiClient::Blocking(_) => None,
            AnyApiClient::Suspending(c) => Some(c),
        }
    }

    pub fn into_blocking(self) -> Option<BlockingApiClient> {
        // ---
        match self {
            AnyApiClient::Blocking(c) => Some(c),
            AnyApiClient::Suspending(_) => None,
        }
    }

    pub fn into_async(self) -> Option<AsyncApiClient> {
        // ---
        match self {
            AnyApiClient::Blocking(_) => None,
            AnyApiClient::Suspending(c) => Some(c),
        }
    }
}

impl From<BlockingApiClient> for AnyApiClient {
    fn from(client: BlockingApiClient) -> Self {
        AnyApiClient::Blocking(client)
    }
}

impl From<AsyncApiClient> for AnyApiClient {
    fn from(client: AsyncApiClient) -> Self {
        AnyApiClient::Suspending(client)
    }
}
