//! Proximity request handling.
//!
//! A [`MessageHandler`] turns broker messages into store operations:
//! position reports become upserts, nearby requests become a reply
//! listing the users in the caller's neighbourhood.
//!
//! Brokers redeliver. [`MessageHandler::handle_once`] makes processing
//! at-most-once per message id across every replica sharing the lease
//! service, by taking the distributed lock on the message's key and
//! consulting its processed marker.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use serde::Deserialize;
use tracing::{debug, warn};
use vicinity_core::format_key;
use vicinity_lock::{DistributedLock, LockError};
use vicinity_store::ReplicaStore;

use crate::config::{ConfigError, HandlerConfig};
use crate::message::{InboundMessage, MessageKind, OutboundMessage};

/// Body of a [`MessageKind::SendLocation`] message.
#[derive(Deserialize)]
struct Position {
    lat: f64,
    long: f64,
}

/// The result of handling one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handled {
    /// Whether the message was consumed and must not be handled again.
    /// `false` leaves it eligible for redelivery.
    pub processed: bool,
    /// The message to publish in response, if any.
    pub reply: Option<OutboundMessage>,
}

impl Handled {
    fn done(reply: Option<OutboundMessage>) -> Self {
        Self {
            processed: true,
            reply,
        }
    }

    fn retry() -> Self {
        Self {
            processed: false,
            reply: None,
        }
    }
}

/// Counters returned when a worker spawned by
/// [`MessageHandler::spawn_worker`] exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Messages taken from the inbox.
    pub received: u64,
    /// Replies sent to the outbox.
    pub replied: u64,
    /// Messages whose lock round trip failed.
    pub failed: u64,
}

/// Applies broker messages to a [`ReplicaStore`].
pub struct MessageHandler {
    store: Arc<ReplicaStore>,
    lock: Arc<DistributedLock>,
    config: HandlerConfig,
}

impl MessageHandler {
    /// Build a handler over `store`, deduplicating through `lock`.
    pub fn new(
        store: Arc<ReplicaStore>,
        lock: Arc<DistributedLock>,
        config: HandlerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            store,
            lock,
            config,
        })
    }

    /// The handler's configuration.
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// The store messages are applied to.
    pub fn store(&self) -> &Arc<ReplicaStore> {
        &self.store
    }

    /// The lock resource guarding message `id`.
    pub fn idempotency_key(&self, id: &str) -> String {
        format_key(&[&self.config.key_prefix, id])
    }

    /// Handle `msg` without any deduplication.
    ///
    /// A position report with an unreadable body or an unencodable
    /// position is left unprocessed. A nearby request always counts as
    /// processed: failures are answered with a [`MessageKind::Error`]
    /// reply carrying the error text. Inbound error messages are ignored.
    pub fn handle(&self, msg: &InboundMessage) -> Handled {
        match msg.kind {
            MessageKind::SendLocation => self.send_location(msg),
            MessageKind::RequestNearby => Handled::done(Some(self.request_nearby(msg))),
            MessageKind::Error => {
                debug!(id = %msg.id, user = %msg.user, "ignoring inbound error message");
                Handled::done(None)
            }
        }
    }

    fn send_location(&self, msg: &InboundMessage) -> Handled {
        let pos: Position = match serde_json::from_str(&msg.body) {
            Ok(p) => p,
            Err(e) => {
                warn!(id = %msg.id, user = %msg.user, error = %e, "unreadable location body");
                return Handled::retry();
            }
        };
        match self.store.upsert(&msg.user, pos.lat, pos.long) {
            Ok(()) => {
                debug!(id = %msg.id, user = %msg.user, lat = pos.lat, long = pos.long, "location stored");
                Handled::done(None)
            }
            Err(e) => {
                warn!(id = %msg.id, user = %msg.user, error = %e, "location rejected");
                Handled::retry()
            }
        }
    }

    fn request_nearby(&self, msg: &InboundMessage) -> OutboundMessage {
        let listed = self
            .store
            .nearby(&msg.user, self.config.radius)
            .map_err(|e| e.to_string())
            .and_then(|users| serde_json::to_string(&users).map_err(|e| e.to_string()));
        match listed {
            Ok(body) => msg.reply(MessageKind::RequestNearby, body),
            Err(reason) => {
                debug!(id = %msg.id, user = %msg.user, %reason, "nearby request failed");
                msg.reply(MessageKind::Error, reason)
            }
        }
    }

    /// Handle `msg` at most once across every handler sharing the lease
    /// service.
    ///
    /// Takes the distributed lock on [`idempotency_key`](Self::idempotency_key),
    /// skips messages already marked processed, and otherwise handles the
    /// message and releases the lock, marking it processed on success.
    /// Returns the reply to publish, `None` for duplicates and replyless
    /// messages.
    pub fn handle_once(&self, msg: &InboundMessage) -> Result<Option<OutboundMessage>, LockError> {
        let key = self.idempotency_key(&msg.id);
        self.lock.lock(&key)?;

        match self.lock.is_processed(&key) {
            Ok(false) => {}
            Ok(true) => {
                debug!(key = %key, "duplicate message skipped");
                self.lock.unlock(&key, false)?;
                return Ok(None);
            }
            Err(e) => {
                if let Err(release) = self.lock.unlock(&key, false) {
                    warn!(key = %key, error = %release, "release after marker check failed");
                }
                return Err(e);
            }
        }

        let handled = self.handle(msg);
        self.lock.unlock(&key, handled.processed)?;
        Ok(handled.reply)
    }

    /// Start a named worker thread feeding `inbox` through
    /// [`handle_once`](Self::handle_once) and sending replies to `outbox`.
    ///
    /// The worker runs until `inbox` is closed (all senders dropped) or
    /// `outbox` has no receiver left.
    pub fn spawn_worker(
        self: Arc<Self>,
        inbox: Receiver<InboundMessage>,
        outbox: Sender<OutboundMessage>,
    ) -> Result<JoinHandle<WorkerReport>, ConfigError> {
        thread::Builder::new()
            .name("vicinity-handler".into())
            .spawn(move || worker_loop(&self, inbox, outbox))
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: e.to_string(),
            })
    }
}

/// Main loop for a handler worker. Each iteration: recv message →
/// handle once → forward the reply.
fn worker_loop(
    handler: &MessageHandler,
    inbox: Receiver<InboundMessage>,
    outbox: Sender<OutboundMessage>,
) -> WorkerReport {
    let mut report = WorkerReport::default();
    while let Ok(msg) = inbox.recv() {
        report.received += 1;
        match handler.handle_once(&msg) {
            Ok(Some(reply)) => {
                if outbox.send(reply).is_err() {
                    debug!("outbox closed, handler worker exiting");
                    break;
                }
                report.replied += 1;
            }
            Ok(None) => {}
            Err(e) => {
                report.failed += 1;
                warn!(id = %msg.id, error = %e, "message handling failed");
            }
        }
    }
    report
}
