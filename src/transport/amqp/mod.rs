//! AMQP protocol brokers.
//!
//! This module contains broker implementations for AMQP-based servers.
//! Currently supports:
//! - lapin - AMQP 0-9-1 (RabbitMQ)

#[cfg(feature = "transport_lapin")]
mod lapin;

#[cfg(feature = "transport_lapin")]
pub use lapin::{create_broker as create_lapin_broker, AmqpBroker};
