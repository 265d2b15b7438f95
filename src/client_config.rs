//! Client configuration.
//!
//! Everything needed to build a client except the broker implementation:
//! which deployment to talk to, as which instance, and in which execution
//! mode. Loadable from the environment or any serde format.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Identity, ModeKind, Result, Server, ServerProfile};

/// Environment variable naming the deployment.
pub const ENV_SERVER: &str = "CWAPI_SERVER";
pub const ENV_INSTANCE: &str = "CWAPI_INSTANCE";
pub const ENV_PASSWORD: &str = "CWAPI_PASSWORD";
pub const ENV_MODE: &str = "CWAPI_MODE";
pub const ENV_SCHEME: &str = "CWAPI_SCHEME";
pub const ENV_HOST: &str = "CWAPI_HOST";
pub const ENV_PORT: &str = "CWAPI_PORT";

/// Client configuration.
///
/// `Debug` output never shows the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server: Server,

    /// Instance name issued by the API operator.
    ///
    /// Also determines the exchange, queue, and routing key names.
    pub instance_name: String,

    pub password: String,

    /// Execution mode of the built client. Default: suspending.
    #[serde(default)]
    pub mode: ModeKind,
}

impl ClientConfig {
    /// Create a configuration for a suspending client.
    pub fn new(server: Server, instance_name: impl Into<String>, password: impl Into<String>) -> Self {
        // ---
        Self {
            server,
            instance_name: instance_name.into(),
            password: password.into(),
            mode: ModeKind::default(),
        }
    }

    pub fn with_mode(mut self, mode: ModeKind) -> Self {
        self.mode = mode;
        self
    }

    /// Load the configuration from `CWAPI_*` environment variables.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `CWAPI_SERVER` | `International`, `CW3`, or `Classic` |
    /// | `CWAPI_INSTANCE` | instance name |
    /// | `CWAPI_PASSWORD` | credential |
    /// | `CWAPI_MODE` | `blocking` or `suspending` (optional) |
    /// | `CWAPI_SCHEME`, `CWAPI_HOST`, `CWAPI_PORT` | endpoint, `Classic` only |
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a required variable is missing
    /// or a value is malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through `lookup`, which maps a `CWAPI_*`
    /// variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // ---
        let require = |key: &str| lookup(key).ok_or_else(|| Error::InvalidArgument(format!("{key} is not set")));

        let server = match require(ENV_SERVER)?.to_ascii_lowercase().as_str() {
            "international" => Server::International,
            "cw3" => Server::Cw3,
            "classic" => {
                let port = require(ENV_PORT)?;
                let port: u16 = port
                    .parse()
                    .map_err(|_| Error::InvalidArgument(format!("{ENV_PORT} is not a port number: {port}")))?;
                Server::Classic(ServerProfile::new(require(ENV_SCHEME)?, require(ENV_HOST)?, port)?)
            }
            other => {
                return Err(Error::InvalidArgument(format!(
                    "unknown server: {other}, valid values: International, CW3, Classic"
                )))
            }
        };

        let mode = match lookup(ENV_MODE) {
            Some(mode) => mode.parse()?,
            None => ModeKind::default(),
        };

        let config = Self {
            server,
            instance_name: require(ENV_INSTANCE)?,
            password: require(ENV_PASSWORD)?,
            mode,
        };
        config.identity()?;

        Ok(config)
    }

    /// Validate and return the identity this configuration describes.
    pub fn identity(&self) -> Result<Identity> {
        Identity::new(self.instance_name.clone(), self.password.clone())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        f.debug_struct("ClientConfig")
            .field("server", &self.server)
            .field("instance_name", &self.instance_name)
            .field("password", &"<redacted>")
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        // ---
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_named_server_defaults_to_suspending() {
        // ---
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_SERVER, "CW3"),
            (ENV_INSTANCE, "bot1"),
            (ENV_PASSWORD, "secret"),
        ]))
        .unwrap();

        assert_eq!(config.server, Server::Cw3);
        assert_eq!(config.mode, ModeKind::Suspending);
        assert_eq!(config.identity().unwrap().instance_name(), "bot1");
    }

    #[test]
    fn test_classic_server_reads_endpoint() {
        // ---
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_SERVER, "classic"),
            (ENV_SCHEME, "amqp"),
            (ENV_HOST, "localhost"),
            (ENV_PORT, "5672"),
            (ENV_INSTANCE, "bot1"),
            (ENV_PASSWORD, "secret"),
            (ENV_MODE, "blocking"),
        ]))
        .unwrap();

        assert_eq!(
            config.server,
            Server::Classic(ServerProfile::new("amqp", "localhost", 5672).unwrap())
        );
        assert_eq!(config.mode, ModeKind::Blocking);
    }

    #[test]
    fn test_invalid_environment() {
        // ---
        let cases: [&[(&str, &str)]; 4] = [
            &[(ENV_INSTANCE, "bot1"), (ENV_PASSWORD, "secret")],
            &[(ENV_SERVER, "Atlantis"), (ENV_INSTANCE, "bot1"), (ENV_PASSWORD, "secret")],
            &[
                (ENV_SERVER, "Classic"),
                (ENV_SCHEME, "amqp"),
                (ENV_HOST, "localhost"),
                (ENV_PORT, "lots"),
                (ENV_INSTANCE, "bot1"),
                (ENV_PASSWORD, "secret"),
            ],
            &[(ENV_SERVER, "International"), (ENV_INSTANCE, "bot 1"), (ENV_PASSWORD, "secret")],
        ];

        for vars in cases {
            assert!(matches!(
                ClientConfig::from_lookup(lookup(vars)),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_debug_hides_password() {
        // ---
        let config = ClientConfig::new(Server::International, "bot1", "hunter2");
        let printed = format!("{config:?}");

        assert!(printed.contains("bot1"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_serde_round_trip() {
        // ---
        let config = ClientConfig::new(Server::International, "bot1", "secret").with_mode(ModeKind::Blocking);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"blocking\""));

        let back: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
