// src/client/blocking.rs
//! Blocking realization of the client operations.
//!
//! Broker I/O is driven by the client's private current-thread runtime via
//! `block_on`. The runtime must not be entered from inside another runtime,
//! so a blocking client cannot be used from async code.

use std::ops::Deref;
use std::sync::{Mutex, MutexGuard};

use crate::{
    //
    log_debug,
    log_warn,
    protocol::{decode, encode, Request, Response},
    ApiClient,
    Blocking,
    Error,
    Result,
};

/// Acquire a mutex guard, intentionally ignoring poisoning.
///
/// The guard protects no data, only the order of calls. A caller that
/// panicked mid-call leaves nothing inconsistent behind, so later callers
/// may proceed.
fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // ---
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl ApiClient<Blocking> {
    /// Open the connection and purge stale replies.
    ///
    /// Does nothing if the client is already connected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionFailure`] if the broker is unreachable,
    /// rejects the credentials, or lacks the exchange or reply queue.
    pub fn connect(&mut self) -> Result<()> {
        // ---
        self.mode.runtime.block_on(self.engine.connect())
    }

    /// Close the channel, then the connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if there is nothing to close.
    pub fn disconnect(&mut self) -> Result<()> {
        // ---
        self.mode.runtime.block_on(self.engine.disconnect())
    }

    /// Send `request` and wait for its reply.
    ///
    /// Blocks while another thread's call on this client is in flight, then
    /// for as long as the reply takes. There is no timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] without touching the broker if the client
    ///   is not connected
    /// - [`Error::ConnectionFailure`] if the publish or consume fails
    /// - [`Error::DecodeFailure`] if the reply cannot be decoded
    pub fn ask(&self, request: &Request) -> Result<Response> {
        // ---
        if !self.engine.is_connected() {
            return Err(Error::NotConnected);
        }

        let payload = encode(request)?;

        let _in_flight = lock_ignore_poison(&self.mode.guard);
        log_debug!("{} ask {}", self.instance_name(), request.operation());

        let reply = self.mode.runtime.block_on(self.engine.exchange(payload))?;
        decode(&reply)
    }

    /// Connect and return a scope that disconnects when dropped.
    pub fn connected(&mut self) -> Result<ConnectionScope<'_>> {
        // ---
        self.connect()?;
        Ok(ConnectionScope { client: Some(self) })
    }

    /// Run `body` on a freshly connected client, then disconnect.
    ///
    /// The disconnect runs even if `body` fails or panics. An error from
    /// `body` takes precedence over an error from the disconnect.
    pub fn scoped<T, F>(&mut self, body: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        // ---
        let scope = self.connected()?;
        let outcome = body(&*scope);
        let closed = scope.close();

        let value = outcome?;
        closed?;
        Ok(value)
    }
}

/// A connected blocking client that disconnects when it goes out of scope.
///
/// A failing disconnect on drop is only logged; call
/// [`close`](ConnectionScope::close) to observe it.
pub struct ConnectionScope<'a> {
    client: Option<&'a mut ApiClient<Blocking>>,
}

impl ConnectionScope<'_> {
    /// Disconnect now and report the outcome.
    pub fn close(mut self) -> Result<()> {
        // ---
        match self.client.take() {
            Some(client) => client.disconnect(),
            None => Ok(()),
        }
    }
}

impl Deref for ConnectionScope<'_> {
    type Target = ApiClient<Blocking>;

    fn deref(&self) -> &Self::Target {
        // Only `close` and `drop` take the client, and both consume the scope.
        match &self.client {
            Some(client) => client,
            None => unreachable!("connection scope used after close"),
        }
    }
}

impl Drop for ConnectionScope<'_> {
    fn drop(&mut self) {
        // ---
        if let Some(client) = self.client.take() {
            if let Err(_e) = client.disconnect() {
                log_warn!("disconnect on scope exit failed: {_e}");
            }
        }
    }
}
