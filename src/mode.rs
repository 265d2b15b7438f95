//! Execution modes.
//!
//! A client is bound to exactly one execution mode when it is built:
//!
//! - [`Blocking`] runs every operation on the calling thread. The in-flight
//!   call guard is a `std::sync::Mutex`; a second thread calling `ask`
//!   blocks until the first call completes. Broker I/O is driven by a private
//!   current-thread tokio runtime owned by the client, so a blocking client
//!   must not be used from inside an async context.
//! - [`Suspending`] runs inside the caller's tokio runtime. The guard is a
//!   `tokio::sync::Mutex`, so a waiting `ask` suspends its task and leaves the
//!   thread free for unrelated work.
//!
//! Both modes run the same engine code; they differ only in how they wait.
//! The mode is a type parameter of [`ApiClient`](crate::ApiClient), so the
//! two realizations can never be mixed on one instance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use crate::{Error, Result};

/// Runtime tag naming an execution mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Blocking,
    #[default]
    Suspending,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        match self {
            ModeKind::Blocking => f.write_str("blocking"),
            ModeKind::Suspending => f.write_str("suspending"),
        }
    }
}

impl FromStr for ModeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // ---
        match s.to_ascii_lowercase().as_str() {
            "blocking" | "sync" => Ok(ModeKind::Blocking),
            "suspending" | "async" => Ok(ModeKind::Suspending),
            other => Err(Error::InvalidArgument(format!(
                "unknown execution mode: {other}, valid values: blocking, suspending"
            ))),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// One of the two ways a client waits for the broker.
///
/// Sealed: [`Blocking`] and [`Suspending`] are the only realizations.
pub trait ExecutionMode: sealed::Sealed + Send + Sync + Sized + 'static {
    /// Tag of this mode.
    const KIND: ModeKind;

    /// Create the per-client state of this mode.
    fn realize() -> Result<Self>;
}

/// Blocking realization: calls block the calling thread.
pub struct Blocking {
    pub(crate) runtime: tokio::runtime::Runtime,
    pub(crate) guard: Mutex<()>,
}

impl sealed::Sealed for Blocking {}

impl ExecutionMode for Blocking {
    const KIND: ModeKind = ModeKind::Blocking;

    fn realize() -> Result<Self> {
        // ---
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::ConnectionFailure(format!("failed to start I/O runtime: {e}")))?;

        Ok(Self {
            runtime,
            guard: Mutex::new(()),
        })
    }
}

/// Suspending realization: calls suspend the calling task.
pub struct Suspending {
    pub(crate) guard: tokio::sync::Mutex<()>,
}

impl sealed::Sealed for Suspending {}

impl ExecutionMode for Suspending {
    const KIND: ModeKind = ModeKind::Suspending;

    fn realize() -> Result<Self> {
        Ok(Self {
            guard: tokio::sync::Mutex::new(()),
        })
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_mode_kind_parse() {
        // ---
        assert_eq!("blocking".parse::<ModeKind>().unwrap(), ModeKind::Blocking);
        assert_eq!("Suspending".parse::<ModeKind>().unwrap(), ModeKind::Suspending);
        assert_eq!("async".parse::<ModeKind>().unwrap(), ModeKind::Suspending);
        assert!(matches!(
            "threaded".parse::<ModeKind>(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_kinds_match_realizations() {
        // ---
        assert_eq!(Blocking::KIND, ModeKind::Blocking);
        assert_eq!(Suspending::KIND, ModeKind::Suspending);
        assert_eq!(ModeKind::default(), ModeKind::Suspending);
    }
}
