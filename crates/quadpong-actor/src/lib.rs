//! Lightweight actor runtime for quadpong.
//!
//! Every stateful component of the server (room manager, game rooms,
//! paddles, balls, broadcasters) runs as an actor: an isolated Tokio task
//! that owns its state and communicates through a single-reader mailbox.
//! There is no shared mutable state between actors — all state crossings
//! are messages.
//!
//! # Guarantees
//!
//! - Messages from one sender to one recipient arrive in FIFO order,
//!   up to drops.
//! - Sends never block. A full mailbox drops the message and bumps a
//!   process-wide counter; a closed mailbox (stopped actor) drops
//!   silently.
//! - Stop signals travel on a dedicated unbounded channel, so data
//!   backpressure can never swallow a lifecycle message.
//! - A panic inside a message handler is contained to that actor: it is
//!   logged, `stopping` runs best-effort, and the actor is removed from
//!   the registry.

mod actor;
mod addr;
mod error;
mod system;
mod ticker;

pub use actor::{Actor, Context};
pub use addr::{ActorId, Addr, ask, dropped_messages};
pub use error::AskError;
pub use system::ActorSystem;
pub use ticker::{TickGate, Ticker};
