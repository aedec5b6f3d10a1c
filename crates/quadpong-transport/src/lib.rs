//! Transport layer for quadpong.
//!
//! The core of the server depends only on the [`Connection`] trait — a
//! minimal capability (`send` bytes, `recv` a message, `close`, `id`) —
//! never on a specific socket type. [`WsListener`] provides the
//! WebSocket implementation used in production; tests substitute
//! channel-backed mocks.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{WsConnection, WsListener};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
///
/// Used by game rooms to correlate join/input/leave events for the same
/// client, and as the broadcaster's membership key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A single client connection that can send and receive framed bytes.
///
/// Handles are `Clone` because several parties hold one: the connection
/// handler (reads), the broadcaster (batch writes), and the room during
/// bootstrap. Implementations must serialize concurrent writers so two
/// frames never interleave.
///
/// The methods return `Send` futures (implement them with plain
/// `async fn`) because rooms and broadcasters drive connections from
/// generic tasks on the multi-threaded runtime.
pub trait Connection: Clone + Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one framed message to the peer.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next message from the peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(&self) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
