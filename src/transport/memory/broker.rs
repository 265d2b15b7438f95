// src/transport/memory/broker.rs

//! In-memory broker implementation.
//!
//! This file contains the concrete implementation of the domain-level
//! `Broker`, `Connection`, and `Channel` traits using in-process data
//! structures only.
//!
//! The memory broker is the **reference implementation** of broker
//! semantics. The AMQP broker is expected to approximate this behavior as
//! closely as the underlying system allows.

use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

use crate::{
    //
    log_debug,
    parse_address,
    Broker,
    Channel,
    ChannelPtr,
    Connection,
    ConnectionLink,
    ConnectionPtr,
    Error,
    Result,
    Topology,
};

/// Callback standing in for the remote side of an exchange binding.
///
/// Receives the published body and returns the replies to enqueue, in order.
type Responder = Arc<dyn Fn(&[u8]) -> Vec<Bytes> + Send + Sync>;

/// Observable broker activity, recorded in the order it happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrokerEvent {
    Connected { instance_name: String },
    ChannelOpened,
    Purged { queue: String, count: u32 },
    Published { exchange: String, routing_key: String, payload: Bytes },
    Consumed { queue: String, payload: Bytes },
    ChannelClosed,
    ConnectionClosed,
}

enum Route {
    Queue(String),
    Responder { reply_queue: String, respond: Responder },
}

#[derive(Default)]
struct Inner {
    credentials: Option<(String, String)>,
    unreachable: bool,
    exchanges: HashSet<String>,
    queues: HashMap<String, VecDeque<Bytes>>,
    routes: HashMap<(String, String), Route>,
    events: Vec<BrokerEvent>,
    // Bumped by `drop_connections`; links opened under an older value fail.
    generation: u64,
}

#[derive(Default)]
struct State {
    inner: Mutex<Inner>,
    notify: Notify,
}

/// In-memory broker.
///
/// Simulates exchanges, queues, and routing entirely within the process. It
/// is intended for tests and demos, and for validating client behavior
/// without a network, a broker, or timing-related variability.
///
/// ## Semantics
///
/// - Exchanges and queues exist only once declared.
/// - A publish to an unbound routing key is dropped, as AMQP does for
///   unroutable messages without the mandatory flag.
/// - A responder bound with [`respond`](Self::respond) plays the remote
///   side: its replies are enqueued synchronously during the publish.
/// - Every publish and consume yields to the scheduler once, so concurrent
///   callers really interleave.
///
/// ## Non-Goals
///
/// - Persistence or durability
/// - Exact emulation of AMQP exchange types
///
/// Cloning is cheap; clones share state.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    state: Arc<State>,
}

/// Acquire mutex guard, ignoring poisoning
fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_ignore_poison(&self.state.inner)
    }

    /// Only accept connections authenticated as `instance_name`/`password`.
    ///
    /// Without this every well-formed link is accepted.
    pub fn with_credentials(self, instance_name: impl Into<String>, password: impl Into<String>) -> Self {
        // ---
        self.lock().credentials = Some((instance_name.into(), password.into()));
        self
    }

    /// Make subsequent connection attempts fail as if the host were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    pub fn declare_exchange(&self, name: impl Into<String>) {
        self.lock().exchanges.insert(name.into());
    }

    pub fn declare_queue(&self, name: impl Into<String>) {
        self.lock().queues.entry(name.into()).or_default();
    }

    /// Route messages published to `exchange` with `routing_key` into `queue`.
    pub fn bind(&self, exchange: &str, routing_key: &str, queue: &str) {
        // ---
        self.lock().routes.insert(
            (exchange.to_string(), routing_key.to_string()),
            Route::Queue(queue.to_string()),
        );
    }

    /// Answer messages published to `exchange` with `routing_key` by pushing
    /// whatever `respond` returns onto `reply_queue`.
    pub fn respond<F>(&self, exchange: &str, routing_key: &str, reply_queue: &str, respond: F)
    where
        F: Fn(&[u8]) -> Vec<Bytes> + Send + Sync + 'static,
    {
        // ---
        self.lock().routes.insert(
            (exchange.to_string(), routing_key.to_string()),
            Route::Responder {
                reply_queue: reply_queue.to_string(),
                respond: Arc::new(respond),
            },
        );
    }

    /// Declare the exchange and reply queue an instance uses.
    pub fn declare_instance(&self, instance_name: &str) {
        // ---
        let topology = Topology::resolve(instance_name);
        self.declare_exchange(topology.output_exchange());
        self.declare_queue(topology.input_queue());
    }

    /// Declare an instance and answer each of its requests with exactly one
    /// reply produced by `handler`.
    pub fn serve_instance<F>(&self, instance_name: &str, handler: F)
    where
        F: Fn(&[u8]) -> Bytes + Send + Sync + 'static,
    {
        // ---
        let topology = Topology::resolve(instance_name);
        self.declare_instance(instance_name);
        self.respond(
            topology.output_exchange(),
            topology.routing_key(),
            topology.input_queue(),
            move |body| vec![handler(body)],
        );
    }

    /// Put a message straight onto `queue`, bypassing any exchange.
    pub fn inject(&self, queue: &str, payload: impl Into<Bytes>) {
        // ---
        self.lock()
            .queues
            .entry(queue.to_string())
            .or_default()
            .push_back(payload.into());
        self.state.notify.notify_waiters();
    }

    /// Number of messages waiting on `queue`.
    pub fn queue_len(&self, queue: &str) -> usize {
        self.lock().queues.get(queue).map_or(0, VecDeque::len)
    }

    /// Snapshot of everything the broker has seen so far.
    pub fn events(&self) -> Vec<BrokerEvent> {
        self.lock().events.clone()
    }

    /// Sever every open connection. Pending and future operations on them
    /// fail with [`Error::ConnectionFailure`].
    pub fn drop_connections(&self) {
        // ---
        self.lock().generation += 1;
        self.state.notify.notify_waiters();
    }
}

#[async_trait::async_trait]
impl Broker for MemoryBroker {
    async fn connect(&self, link: &ConnectionLink) -> Result<ConnectionPtr> {
        // ---
        let parts = parse_address(link.expose())
            .map_err(|e| Error::ConnectionFailure(format!("memory: {e}")))?;

        let mut inner = self.lock();

        if inner.unreachable {
            return Err(Error::ConnectionFailure(format!(
                "memory: broker {} unreachable",
                parts.profile.host()
            )));
        }

        if let Some((user, password)) = &inner.credentials {
            if user != parts.identity.instance_name() || password != parts.identity.password() {
                return Err(Error::ConnectionFailure(
                    "memory: ACCESS_REFUSED - login was refused".into(),
                ));
            }
        }

        let instance_name = parts.identity.instance_name().to_string();
        log_debug!("memory: {instance_name} connected");
        inner.events.push(BrokerEvent::Connected { instance_name });

        Ok(Arc::new(MemoryConnection {
            link: Arc::new(Link {
                state: Arc::clone(&self.state),
                generation: inner.generation,
                closed: AtomicBool::new(false),
            }),
        }))
    }
}

/// State shared by a connection and its channels.
struct Link {
    state: Arc<State>,
    generation: u64,
    closed: AtomicBool,
}

impl Link {
    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        // ---
        let inner = lock_ignore_poison(&self.state.inner);
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionFailure("memory: connection closed".into()));
        }
        if inner.generation != self.generation {
            return Err(Error::ConnectionFailure("memory: connection reset by broker".into()));
        }
        Ok(inner)
    }
}

struct MemoryConnection {
    link: Arc<Link>,
}

#[async_trait::async_trait]
impl Connection for MemoryConnection {
    async fn open_channel(&self) -> Result<ChannelPtr> {
        // ---
        self.link.lock()?.events.push(BrokerEvent::ChannelOpened);

        Ok(Arc::new(MemoryChannel {
            link: Arc::clone(&self.link),
            closed: AtomicBool::new(false),
        }))
    }

    async fn close(&self) -> Result<()> {
        // ---
        self.link.lock()?.events.push(BrokerEvent::ConnectionClosed);
        self.link.closed.store(true, Ordering::SeqCst);
        self.link.state.notify.notify_waiters();
        Ok(())
    }
}

struct MemoryChannel {
    link: Arc<Link>,
    closed: AtomicBool,
}

impl MemoryChannel {
    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        // ---
        let inner = self.link.lock()?;
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionFailure("memory: channel closed".into()));
        }
        Ok(inner)
    }
}

#[async_trait::async_trait]
impl Channel for MemoryChannel {
    async fn resolve_exchange(&self, name: &str) -> Result<()> {
        // ---
        if self.lock()?.exchanges.contains(name) {
            Ok(())
        } else {
            Err(Error::ConnectionFailure(format!(
                "memory: NOT_FOUND - no exchange '{name}'"
            )))
        }
    }

    async fn resolve_queue(&self, name: &str) -> Result<()> {
        // ---
        if self.lock()?.queues.contains_key(name) {
            Ok(())
        } else {
            Err(Error::ConnectionFailure(format!(
                "memory: NOT_FOUND - no queue '{name}'"
            )))
        }
    }

    async fn purge(&self, queue: &str) -> Result<u32> {
        // ---
        let mut inner = self.lock()?;
        let dropped = match inner.queues.get_mut(queue) {
            Some(messages) => {
                let n = u32::try_from(messages.len()).unwrap_or(u32::MAX);
                messages.clear();
                n
            }
            None => {
                return Err(Error::ConnectionFailure(format!(
                    "memory: NOT_FOUND - no queue '{queue}'"
                )))
            }
        };

        inner.events.push(BrokerEvent::Purged {
            queue: queue.to_string(),
            count: dropped,
        });
        Ok(dropped)
    }

    async fn publish(&self, exchange: &str, routing_key: &str, payload: Bytes) -> Result<()> {
        // ---
        tokio::task::yield_now().await;

        let respond = {
            let mut guard = self.lock()?;
            let inner = &mut *guard;
            if !inner.exchanges.contains(exchange) {
                return Err(Error::ConnectionFailure(format!(
                    "memory: NOT_FOUND - no exchange '{exchange}'"
                )));
            }

            inner.events.push(BrokerEvent::Published {
                exchange: exchange.to_string(),
                routing_key: routing_key.to_string(),
                payload: payload.clone(),
            });

            match inner.routes.get(&(exchange.to_string(), routing_key.to_string())) {
                Some(Route::Queue(queue)) => {
                    inner
                        .queues
                        .entry(queue.clone())
                        .or_default()
                        .push_back(payload.clone());
                    None
                }
                Some(Route::Responder {
                    reply_queue,
                    respond,
                }) => Some((reply_queue.clone(), Arc::clone(respond))),
                None => {
                    log_debug!("memory: unroutable message on {exchange}/{routing_key} dropped");
                    None
                }
            }
        };

        // The responder runs outside the lock so it may call back into the broker.
        if let Some((reply_queue, respond)) = respond {
            let replies = respond(&payload);
            let mut inner = lock_ignore_poison(&self.link.state.inner);
            inner.queues.entry(reply_queue).or_default().extend(replies);
        }

        self.link.state.notify.notify_waiters();
        Ok(())
    }

    async fn consume_one(&self, queue: &str) -> Result<Bytes> {
        // ---
        tokio::task::yield_now().await;

        loop {
            let notified = self.link.state.notify.notified();
            {
                let mut inner = self.lock()?;
                let next = match inner.queues.get_mut(queue) {
                    Some(messages) => messages.pop_front(),
                    None => {
                        return Err(Error::ConnectionFailure(format!(
                            "memory: NOT_FOUND - no queue '{queue}'"
                        )))
                    }
                };

                if let Some(payload) = next {
                    inner.events.push(BrokerEvent::Consumed {
                        queue: queue.to_string(),
                        payload: payload.clone(),
                    });
                    return Ok(payload);
                }
            }
            notified.await;
        }
    }

    async fn close(&self) -> Result<()> {
        // ---
        self.lock()?.events.push(BrokerEvent::ChannelClosed);
        self.closed.store(true, Ordering::SeqCst);
        self.link.state.notify.notify_waiters();
        Ok(())
    }
}

/// Create a new in-memory broker.
///
/// Always available; requires no external resources.
pub fn create_broker() -> MemoryBroker {
    MemoryBroker::new()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::{Identity, Server, ServerProfile};

    fn link(instance: &str, password: &str) -> ConnectionLink {
        let profile = ServerProfile::new("amqp", "localhost", 5672).unwrap();
        Server::Classic(profile).build_address(&Identity::new(instance, password).unwrap())
    }

    #[tokio::test]
    async fn test_rejects_wrong_credentials() {
        // ---
        let broker = MemoryBroker::new().with_credentials("bot1", "right");

        assert!(broker.connect(&link("bot1", "right")).await.is_ok());
        assert!(matches!(
            broker.connect(&link("bot1", "wrong")).await,
            Err(Error::ConnectionFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_bound_queue_receives_publish() {
        // ---
        let broker = MemoryBroker::new();
        broker.declare_exchange("ex");
        broker.declare_queue("q");
        broker.bind("ex", "key", "q");

        let connection = broker.connect(&link("bot1", "pw")).await.unwrap();
        let channel = connection.open_channel().await.unwrap();

        channel.publish("ex", "key", Bytes::from_static(b"hi")).await.unwrap();
        channel.publish("ex", "other", Bytes::from_static(b"lost")).await.unwrap();

        assert_eq!(broker.queue_len("q"), 1);
        assert_eq!(channel.consume_one("q").await.unwrap(), Bytes::from_static(b"hi"));
    }

    #[tokio::test]
    async fn test_consume_fails_when_connection_dropped() {
        // ---
        let broker = MemoryBroker::new();
        broker.declare_queue("q");

        let connection = broker.connect(&link("bot1", "pw")).await.unwrap();
        let channel = connection.open_channel().await.unwrap();

        let waiter = tokio::spawn(async move { channel.consume_one("q").await });
        tokio::task::yield_now().await;
        broker.drop_connections();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(Error::ConnectionFailure(_))));
    }

    #[tokio::test]
    async fn test_purge_counts_dropped_messages() {
        // ---
        let broker = MemoryBroker::new();
        broker.declare_queue("q");
        broker.inject("q", "a");
        broker.inject("q", "b");

        let connection = broker.connect(&link("bot1", "pw")).await.unwrap();
        let channel = connection.open_channel().await.unwrap();

        assert_eq!(channel.purge("q").await.unwrap(), 2);
        assert_eq!(broker.queue_len("q"), 0);
    }
}
