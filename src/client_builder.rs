//! Client builder.
//!
//! Provides a fluent builder API for constructing clients, with the
//! execution mode chosen exactly once.

use crate::{
    //
    log_debug,
    ApiClient,
    AnyApiClient,
    AsyncApiClient,
    BlockingApiClient,
    BrokerPtr,
    ClientConfig,
    Error,
    ExecutionMode,
    Identity,
    ModeKind,
    Result,
    Server,
};

/// Builder for creating clients.
///
/// # Examples
///
/// ## Mode chosen by the caller
/// ```no_run
/// use cwapi::{ClientBuilder, Server};
///
/// # fn example() -> cwapi::Result<()> {
/// let mut client = ClientBuilder::new()
///     .server(Server::International)
///     .instance_name("bot1")
///     .password("secret")
///     .build_blocking()?;
///
/// client.connect()?;
/// # Ok(())
/// # }
/// ```
///
/// ## Mode chosen by configuration
/// ```no_run
/// use cwapi::{AnyApiClient, ClientBuilder, ClientConfig};
///
/// # async fn example() -> cwapi::Result<()> {
/// let config = ClientConfig::from_env()?;
/// match ClientBuilder::new().from_config(config).build()? {
///     AnyApiClient::Blocking(_client) => { /* drive it from a thread */ }
///     AnyApiClient::Suspending(mut client) => client.connect().await?,
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    server: Option<Server>,
    instance_name: Option<String>,
    password: Option<String>,
    broker: Option<BrokerPtr>,

    // Every mode binding in call order (conflicts detected at build())
    modes: Vec<ModeKind>,
}

impl ClientBuilder {
    /// Create a new client builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deployment to talk to (required).
    pub fn server(mut self, server: Server) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the instance name (required).
    pub fn instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = Some(name.into());
        self
    }

    /// Set the credential (required).
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Use `broker` instead of the lapin AMQP broker.
    pub fn broker(mut self, broker: BrokerPtr) -> Self {
        self.broker = Some(broker);
        self
    }

    /// Bind the blocking execution mode.
    pub fn blocking(self) -> Self {
        self.mode(ModeKind::Blocking)
    }

    /// Bind the suspending execution mode.
    pub fn suspending(self) -> Self {
        self.mode(ModeKind::Suspending)
    }

    /// Bind the execution mode named by `mode`.
    ///
    /// A mode may be bound only once per builder.
    pub fn mode(mut self, mode: ModeKind) -> Self {
        self.modes.push(mode);
        self
    }

    /// Take server, identity, and execution mode from `config`.
    ///
    /// Binds `config.mode`; binding another mode afterwards is a conflict.
    pub fn from_config(self, config: ClientConfig) -> Self {
        // ---
        self.server(config.server)
            .instance_name(config.instance_name)
            .password(config.password)
            .mode(config.mode)
    }

    /// Build a client in the bound mode (suspending if none was bound).
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateBinding`] if more than one mode was bound
    /// - [`Error::InvalidArgument`] if server or identity is missing or
    ///   malformed, or no broker is available
    pub fn build(self) -> Result<AnyApiClient> {
        // ---
        match self.bound_mode()? {
            ModeKind::Blocking => self.finish().map(AnyApiClient::Blocking),
            ModeKind::Suspending => self.finish().map(AnyApiClient::Suspending),
        }
    }

    /// Build a blocking client.
    ///
    /// # Errors
    ///
    /// As [`build`](Self::build), plus [`Error::DuplicateBinding`] if the
    /// suspending mode was bound.
    pub fn build_blocking(self) -> Result<BlockingApiClient> {
        self.build_as()
    }

    /// Build a suspending client.
    ///
    /// # Errors
    ///
    /// As [`build`](Self::build), plus [`Error::DuplicateBinding`] if the
    /// blocking mode was bound.
    pub fn build_async(self) -> Result<AsyncApiClient> {
        self.build_as()
    }

    fn build_as<M: ExecutionMode>(self) -> Result<ApiClient<M>> {
        // ---
        let bound = match self.modes.as_slice() {
            [] => M::KIND,
            _ => self.bound_mode()?,
        };

        if bound != M::KIND {
            return Err(Error::DuplicateBinding(format!(
                "builder is bound to {bound} mode, cannot build a {} client",
                M::KIND
            )));
        }

        self.finish()
    }

    fn bound_mode(&self) -> Result<ModeKind> {
        // ---
        match self.modes.as_slice() {
            [] => Ok(ModeKind::default()),
            [mode] => Ok(*mode),
            modes => Err(Error::DuplicateBinding(format!(
                "execution mode bound {} times ({modes:?}), bind blocking or suspending once",
                modes.len()
            ))),
        }
    }

    fn finish<M: ExecutionMode>(self) -> Result<ApiClient<M>> {
        // ---
        let server = self
            .server
            .ok_or_else(|| Error::InvalidArgument("server is required".into()))?;
        let instance_name = self
            .instance_name
            .ok_or_else(|| Error::InvalidArgument("instance_name is required".into()))?;
        let password = self
            .password
            .ok_or_else(|| Error::InvalidArgument("password is required".into()))?;

        let identity = Identity::new(instance_name, password)?;
        let broker = match self.broker {
            Some(broker) => broker,
            None => default_broker()?,
        };

        log_debug!("building {} client for {}", M::KIND, identity.instance_name());
        ApiClient::from_parts(server, identity, broker)
    }
}

#[cfg(feature = "transport_lapin")]
fn default_broker() -> Result<BrokerPtr> {
    Ok(crate::create_lapin_broker())
}

#[cfg(not(feature = "transport_lapin"))]
fn default_broker() -> Result<BrokerPtr> {
    Err(Error::InvalidArgument(
        "no broker given and the transport_lapin feature is disabled".into(),
    ))
}
