//! Periodic message pump with tick coalescing.
//!
//! A [`Ticker`] delivers tick messages into an actor's mailbox at a fixed
//! period. Two properties matter for game loops:
//!
//! - **No backlog.** The next tick is always scheduled from "now", so a
//!   slow receiver never faces a burst of catch-up ticks; simulated time
//!   is allowed to lag wall time instead.
//! - **Coalescing.** At most one tick message is pending at a time. The
//!   receiver acknowledges each tick through its [`TickGate`] before a
//!   new one can be enqueued.
//!
//! The first tick carries a small random jitter so that rooms created in
//! the same instant do not tick in lockstep.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::addr::Addr;

/// Maximum random delay (µs) added to the first tick.
const START_JITTER_US: u64 = 2_000;

/// Receiver-side handle for acknowledging ticks.
#[derive(Clone)]
pub struct TickGate {
    pending: Arc<AtomicBool>,
}

impl TickGate {
    /// Marks the in-flight tick as processed, allowing the next one to
    /// be enqueued. Call this at the top of the tick handler.
    pub fn acknowledge(&self) {
        self.pending.store(false, Ordering::Release);
    }
}

/// A running periodic tick source bound to one actor mailbox.
///
/// Dropping or [`stop`](Ticker::stop)ping the ticker cancels the pump.
pub struct Ticker {
    pending: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Ticker {
    /// Starts a ticker that sends `make()` to `addr` every `period`.
    pub fn start<M, F>(addr: Addr<M>, period: Duration, make: F) -> Self
    where
        M: Send + 'static,
        F: Fn() -> M + Send + 'static,
    {
        let pending = Arc::new(AtomicBool::new(false));
        let gate = Arc::clone(&pending);

        let task = tokio::spawn(async move {
            let jitter =
                Duration::from_micros(rand::rng().random_range(0..START_JITTER_US));
            let mut next = Instant::now() + period + jitter;
            loop {
                tokio::time::sleep_until(next).await;
                // Schedule from now, not from the missed deadline.
                next = Instant::now() + period;

                if gate
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    // Previous tick not acknowledged yet — coalesce.
                    continue;
                }
                if !addr.try_send(make()) {
                    // Nothing enqueued; release the gate so the ticker
                    // does not deadlock against a full mailbox.
                    gate.store(false, Ordering::Release);
                }
            }
        });

        Self { pending, task }
    }

    /// The acknowledgment gate for the receiving actor.
    pub fn gate(&self) -> TickGate {
        TickGate {
            pending: Arc::clone(&self.pending),
        }
    }

    /// Cancels the pump. No further ticks are delivered.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
