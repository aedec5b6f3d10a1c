//! The actor registry: spawn, stop, and supervised shutdown.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::actor::{Actor, Context};
use crate::addr::{ActorId, Addr};

/// Default mailbox capacity for spawned actors.
const DEFAULT_MAILBOX: usize = 64;

/// Lifecycle signals, delivered on a channel separate from the data
/// mailbox so they are always deliverable.
#[derive(Debug)]
pub(crate) enum SystemSignal {
    Stop,
}

struct Entry {
    signal: mpsc::UnboundedSender<SystemSignal>,
    handle: JoinHandle<()>,
}

/// Clonable handle to the process-wide actor registry.
///
/// The registry is the only process-wide structure; it is created at
/// startup and torn down by [`shutdown`](ActorSystem::shutdown). All
/// access goes through `spawn`/`stop`/`shutdown`, which synchronize
/// internally.
#[derive(Clone)]
pub struct ActorSystem {
    actors: Arc<Mutex<HashMap<ActorId, Entry>>>,
}

impl ActorSystem {
    /// Creates an empty actor system.
    pub fn new() -> Self {
        Self {
            actors: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Spawns an actor with the default mailbox capacity and returns its
    /// address.
    pub fn spawn<A: Actor>(&self, actor: A) -> Addr<A::Msg> {
        self.spawn_with_capacity(actor, DEFAULT_MAILBOX)
    }

    /// Spawns an actor with an explicit mailbox capacity.
    pub fn spawn_with_capacity<A: Actor>(&self, actor: A, capacity: usize) -> Addr<A::Msg> {
        let id = ActorId::next();
        let (tx, rx) = mpsc::channel(capacity);
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let addr = Addr::new(id, tx, signal_tx.clone());

        let ctx = Context::new(addr.clone(), self.clone());

        // Register under the lock: if the task finishes instantly on
        // another worker, its deregistration must not be able to run
        // before the entry exists.
        let mut registry = self.actors.lock().expect("actor registry poisoned");
        let handle = tokio::spawn(run_actor(actor, ctx, rx, signal_rx, self.clone()));
        registry.insert(id, Entry { signal: signal_tx, handle });
        addr
    }

    /// Signals an actor to stop by ID. Non-blocking; unknown IDs are
    /// ignored.
    pub fn stop(&self, id: ActorId) {
        let registry = self.actors.lock().expect("actor registry poisoned");
        if let Some(entry) = registry.get(&id) {
            let _ = entry.signal.send(SystemSignal::Stop);
        }
    }

    /// Number of live actors.
    pub fn actor_count(&self) -> usize {
        self.actors.lock().expect("actor registry poisoned").len()
    }

    /// Signals every actor to stop and waits up to `timeout` for them to
    /// exit. Survivors are forcibly aborted and logged by ID.
    pub async fn shutdown(&self, timeout: Duration) {
        let entries: Vec<(ActorId, Entry)> = {
            let mut registry = self.actors.lock().expect("actor registry poisoned");
            registry.drain().collect()
        };

        for (_, entry) in &entries {
            let _ = entry.signal.send(SystemSignal::Stop);
        }

        let deadline = Instant::now() + timeout;
        for (id, entry) in entries {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let abort = entry.handle.abort_handle();
            if tokio::time::timeout(remaining, entry.handle).await.is_err() {
                abort.abort();
                tracing::warn!(actor = %id, "actor did not stop within shutdown timeout, aborting");
            }
        }
    }

    fn deregister(&self, id: ActorId) {
        self.actors
            .lock()
            .expect("actor registry poisoned")
            .remove(&id);
    }
}

impl Default for ActorSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-actor task: lifecycle hooks around a sequential receive loop.
async fn run_actor<A: Actor>(
    mut actor: A,
    mut ctx: Context<A::Msg>,
    mut mailbox: mpsc::Receiver<A::Msg>,
    mut signals: mpsc::UnboundedReceiver<SystemSignal>,
    system: ActorSystem,
) {
    let id = ctx.id();
    tracing::trace!(actor = %id, "actor started");

    let started_ok =
        std::panic::catch_unwind(AssertUnwindSafe(|| actor.started(&mut ctx))).is_ok();
    if !started_ok {
        tracing::error!(actor = %id, "actor panicked in started hook");
    }

    while started_ok && !ctx.stop {
        tokio::select! {
            // Stop signals take priority over pending mail.
            biased;
            signal = signals.recv() => match signal {
                Some(SystemSignal::Stop) | None => break,
            },
            msg = mailbox.recv() => match msg {
                Some(msg) => {
                    let handled = AssertUnwindSafe(actor.handle(&mut ctx, msg))
                        .catch_unwind()
                        .await;
                    if handled.is_err() {
                        tracing::error!(actor = %id, "actor panicked while handling a message, stopping");
                        break;
                    }
                }
                None => break,
            },
        }
    }

    // Refuse further mail, drop whatever is still queued.
    mailbox.close();
    if std::panic::catch_unwind(AssertUnwindSafe(|| actor.stopping(&mut ctx))).is_err() {
        tracing::error!(actor = %id, "actor panicked in stopping hook");
    }
    system.deregister(id);
    tracing::trace!(actor = %id, "actor stopped");
}
