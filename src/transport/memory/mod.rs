// src/transport/memory/mod.rs

//! In-memory broker implementation.
//!
//! This module provides a pure in-process implementation of the domain-level
//! broker traits. It is intended primarily for testing, demos, and as a
//! reference for broker semantics.
//!
//! ## Reference Semantics
//!
//! The in-memory broker defines the **reference behavior** for the broker
//! layer:
//!
//! - A message published to an exchange is routed by exact routing-key match.
//! - `consume_one()` waits until a message is available and removes it.
//! - Purging a queue removes every message currently held by it.
//! - Closing or severing a connection fails every pending and later
//!   operation with a connection failure.
//!
//! ## Non-Goals
//!
//! This broker does not attempt to emulate the failure modes, persistence,
//! or delivery guarantees of a real AMQP server. It exists to provide a
//! deterministic baseline against which client behavior can be validated.

mod broker;

pub use broker::{create_broker, BrokerEvent, MemoryBroker};
