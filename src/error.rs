use thiserror::Error;

/// Errors surfaced by the client.
///
/// Every failure reaches the immediate caller; the client never retries or
/// swallows an error on its own.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed identity, server profile, or configuration.
    ///
    /// Raised at construction time; retrying with the same input fails again.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Broker unreachable, credentials rejected, or the transport failed
    /// while a call was in flight.
    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    /// Operation requires an open connection and the client has none.
    #[error("client not connected")]
    NotConnected,

    /// The reply bytes could not be interpreted as a response.
    #[error("failed to decode response: {0}")]
    DecodeFailure(String),

    /// An execution mode was bound more than once for the same client.
    #[error("duplicate binding: {0}")]
    DuplicateBinding(String),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;
