//! Wire protocol for quadpong.
//!
//! Defines everything that crosses the client connection:
//!
//! - **Inbound** ([`ClientInput`]) — the single paddle-steering message
//!   clients may send.
//! - **Outbound** ([`ServerMessage`]) — bootstrap snapshots, batched
//!   delta updates ([`Update`]), and the terminal game-over message.
//!   Every outbound message and every delta carries a stable
//!   `messageType` tag.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — how messages become bytes.
//!
//! The protocol layer knows nothing about connections, rooms, or
//! physics; it only fixes the shapes that client SDKs parse.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    BallState, CellKind, CellState, ClientInput, GameOverReason, InputDirection,
    PaddleState, PlayerState, ScoreEntry, ServerMessage, Update, owner_index,
};
