//! Broker implementations.
//!
//! This module provides concrete implementations of the domain-level broker
//! traits. The AMQP broker is hidden behind a feature flag; the in-memory
//! broker is always available.
//!
//! Domain code must not depend on broker-specific types.

mod amqp;
mod memory;

#[cfg(feature = "transport_lapin")]
pub use amqp::{create_lapin_broker, AmqpBroker};

pub use memory::{create_broker as create_memory_broker, BrokerEvent, MemoryBroker};
