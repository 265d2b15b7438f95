// src/client/suspending.rs
//! Suspending realization of the client operations.
//!
//! Runs inside the caller's tokio runtime. Dropping an `ask` future at any
//! suspension point releases the in-flight call guard. The reply to the
//! abandoned request is not consumed, however; it stays on the reply queue
//! and the next `ask` receives it. Reconnect after abandoning a call.

use crate::{
    //
    log_debug,
    protocol::{decode, encode, Request, Response},
    ApiClient,
    BoxFuture,
    Error,
    Result,
    Suspending,
};

impl ApiClient<Suspending> {
    /// Open the connection and purge stale replies.
    ///
    /// Does nothing if the client is already connected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionFailure`] if the broker is unreachable,
    /// rejects the credentials, or lacks the exchange or reply queue.
    pub async fn connect(&mut self) -> Result<()> {
        // ---
        self.engine.connect().await
    }

    /// Close the channel, then the connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if there is nothing to close.
    pub async fn disconnect(&mut self) -> Result<()> {
        // ---
        self.engine.disconnect().await
    }

    /// Send `request` and wait for its reply.
    ///
    /// Suspends while another task's call on this client is in flight, then
    /// for as long as the reply takes. There is no timeout; wrap the call in
    /// `tokio::time::timeout` to bound it.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] without touching the broker if the client
    ///   is not connected
    /// - [`Error::ConnectionFailure`] if the publish or consume fails
    /// - [`Error::DecodeFailure`] if the reply cannot be decoded
    pub async fn ask(&self, request: &Request) -> Result<Response> {
        // ---
        if !self.engine.is_connected() {
            return Err(Error::NotConnected);
        }

        let payload = encode(request)?;

        let _in_flight = self.mode.guard.lock().await;
        log_debug!("{} ask {}", self.instance_name(), request.operation());

        let reply = self.engine.exchange(payload).await?;
        decode(&reply)
    }

    /// Run `body` on a freshly connected client, then disconnect.
    ///
    /// The disconnect runs whether or not `body` succeeds. An error from
    /// `body` takes precedence over an error from the disconnect. If the
    /// returned future is dropped before it finishes, the client is left
    /// disconnected and the close runs on a spawned task.
    ///
    /// ```no_run
    /// # async fn example(client: &mut cwapi::AsyncApiClient) -> cwapi::Result<()> {
    /// use cwapi::protocol::Request;
    ///
    /// let request = Request::GetBasicInfo { user_id: 42 };
    /// let _response = client
    ///     .scoped(move |c| Box::pin(async move { c.ask(&request).await }))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scoped<T, F>(&mut self, body: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c Self) -> BoxFuture<'c, Result<T>>,
    {
        // ---
        self.connect().await?;
        let scope = ScopeExit { client: self };

        let outcome = body(&*scope.client).await;
        let closed = scope.client.disconnect().await;

        let value = outcome?;
        closed?;
        Ok(value)
    }
}

/// Drops the connection of a `scoped` call that never reached its own
/// disconnect.
struct ScopeExit<'a> {
    client: &'a mut ApiClient<Suspending>,
}

impl Drop for ScopeExit<'_> {
    fn drop(&mut self) {
        // ---
        self.client.engine.abandon();
    }
}
