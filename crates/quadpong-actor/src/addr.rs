//! Actor identifiers and typed mailbox addresses.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;

use crate::error::AskError;
use crate::system::SystemSignal;

/// Counter for generating unique actor IDs.
static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide count of messages dropped because a mailbox was full.
static DROPPED_MESSAGES: AtomicU64 = AtomicU64::new(0);

/// Returns how many messages have been dropped on full mailboxes since
/// process start.
pub fn dropped_messages() -> u64 {
    DROPPED_MESSAGES.load(Ordering::Relaxed)
}

/// Opaque, comparable identifier for an actor.
///
/// Minted by the runtime at spawn time. Carries no address semantics —
/// sending requires an [`Addr`]. Usable as a map key; game rooms are
/// identified by their actor ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

impl ActorId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}

/// Typed handle for sending messages to one actor.
///
/// Cheap to clone — a pair of channel senders plus the ID. Holding an
/// `Addr` does not keep the actor alive; once the actor has stopped,
/// sends become silent drops.
pub struct Addr<M> {
    id: ActorId,
    tx: mpsc::Sender<M>,
    signal: mpsc::UnboundedSender<SystemSignal>,
}

// Manual Clone: `M` itself does not need to be Clone.
impl<M> Clone for Addr<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            tx: self.tx.clone(),
            signal: self.signal.clone(),
        }
    }
}

impl<M> fmt::Debug for Addr<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Addr").field(&self.id).finish()
    }
}

impl<M: Send + 'static> Addr<M> {
    pub(crate) fn new(
        id: ActorId,
        tx: mpsc::Sender<M>,
        signal: mpsc::UnboundedSender<SystemSignal>,
    ) -> Self {
        Self { id, tx, signal }
    }

    /// The ID of the actor behind this address.
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Sends a message without blocking. Drops on a full or closed
    /// mailbox.
    pub fn send(&self, msg: M) {
        let _ = self.try_send(msg);
    }

    /// Sends a message without blocking, reporting whether it was
    /// actually enqueued.
    ///
    /// A full mailbox counts toward [`dropped_messages`]; a closed one
    /// (the actor stopped or never existed) is a silent drop.
    pub fn try_send(&self, msg: M) -> bool {
        match self.tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                DROPPED_MESSAGES.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(actor = %self.id, "mailbox full, dropping message");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Signals the actor to stop. Non-blocking; the actor finishes its
    /// current message, runs its `stopping` hook, and exits.
    ///
    /// The signal channel is unbounded, so a stop can never be lost to
    /// mailbox backpressure.
    pub fn stop(&self) {
        let _ = self.signal.send(SystemSignal::Stop);
    }

    /// Whether the actor behind this address has stopped.
    pub fn is_stopped(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Request/reply over a oneshot channel, with a bounded wait.
///
/// `make` wraps the reply sender into the actor's message type:
///
/// ```ignore
/// let info = ask(&manager, |tx| ManagerMsg::ListRooms { reply: tx }, TIMEOUT).await?;
/// ```
pub async fn ask<M, R>(
    addr: &Addr<M>,
    make: impl FnOnce(oneshot::Sender<R>) -> M,
    timeout: Duration,
) -> Result<R, AskError>
where
    M: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    addr.send(make(tx));
    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(_)) => Err(AskError::Dropped),
        Err(_) => Err(AskError::Timeout),
    }
}
