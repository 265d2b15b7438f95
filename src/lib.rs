//! Request/reply client for the ChatWars game-bot API over AMQP.
//!
//! A client publishes each request to its instance's output exchange and
//! takes the next message off its reply queue as the answer. There are no
//! correlation identifiers: calls on one client are serialized by an
//! in-flight call guard and the reply queue is purged on every connect.
//!
//! The same protocol is offered in two execution modes, fixed when the
//! client is built:
//!
//! - [`BlockingApiClient`] for plain threads
//! - [`AsyncApiClient`] for tokio tasks
//!
//! ```no_run
//! use cwapi::{protocol::Request, AsyncApiClient, Server};
//!
//! # async fn example() -> cwapi::Result<()> {
//! let mut client = AsyncApiClient::new(Server::International, "bot1", "secret")?;
//! client.connect().await?;
//!
//! let response = client.ask(&Request::GetBasicInfo { user_id: 42 }).await?;
//! println!("{response:?}");
//!
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```

// Import all sub modules once...
mod address;
mod client;
mod client_builder;
mod client_config;
mod domain;
mod engine;
mod error;
mod macros;
mod mode;
mod topology;
mod transport;

pub mod protocol;
pub mod types;

#[allow(unused_imports)]
pub(crate) use macros::{log_debug, log_error, log_info, log_warn};

// Re-export main types
pub use client::{AnyApiClient, ApiClient, AsyncApiClient, BlockingApiClient, ConnectionScope};
pub use client_builder::ClientBuilder;
pub use client_config::{
    //
    ClientConfig,
    ENV_HOST,
    ENV_INSTANCE,
    ENV_MODE,
    ENV_PASSWORD,
    ENV_PORT,
    ENV_SCHEME,
    ENV_SERVER,
};
pub use mode::{Blocking, ExecutionMode, ModeKind, Suspending};

pub use address::{parse_address, AddressParts, ConnectionLink, Identity, Server, ServerProfile};
pub use error::{Error, Result};
pub use topology::Topology;

pub use transport::{create_memory_broker, BrokerEvent, MemoryBroker};

#[cfg(feature = "transport_lapin")]
pub use transport::{create_lapin_broker, AmqpBroker};

// --- public re-exports
pub use domain::{
    //
    BoxFuture,
    Broker,
    BrokerPtr,
    Channel,
    ChannelPtr,
    Connection,
    ConnectionPtr,
};
