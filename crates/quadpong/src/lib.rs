//! # quadpong
//!
//! Real-time multiplayer game server for a four-player Pong/Breakout
//! hybrid. One paddle per wall, a destructible brick field in the
//! middle, and as many concurrent rooms as players show up for.
//!
//! The server is built from small actor-based crates:
//! `quadpong-actor` (runtime), `quadpong-transport` (WebSocket),
//! `quadpong-protocol` (wire format), and `quadpong-game` (rooms,
//! physics, rules). This crate assembles them into a listener with a
//! per-connection handler.
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), quadpong::QuadpongError> {
//! let server = quadpong::ServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run_until_shutdown().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::QuadpongError;
pub use server::{Server, ServerBuilder};
