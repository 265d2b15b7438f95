//! Domain layer public interface.
//!
//! This module defines the broker-facing abstractions the connection engine
//! is written against. They are independent of any concrete AMQP client
//! library; implementations live under `src/transport/`.
//!
//! All domain consumers must import symbols via this module, not by
//! referencing individual files directly.

mod broker;

// --- Broker domain re-exports ---

pub use broker::{
    //
    BoxFuture,
    Broker,
    BrokerPtr,
    Channel,
    ChannelPtr,
    Connection,
    ConnectionPtr,
};
