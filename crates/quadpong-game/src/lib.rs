//! Game core for quadpong: rooms, physics, entities, and the room
//! manager.
//!
//! One [`RoomManager`] actor assigns connections to [`GameRoom`] actors;
//! each room owns a brick [`grid`](Grid), up to four player slots, and a
//! map of balls, simulates at a fixed physics rate, and streams delta
//! batches through its [`Broadcaster`]. Paddles and balls are entity
//! actors holding the fields they own.

mod ball;
mod broadcaster;
mod config;
mod grid;
mod manager;
mod paddle;
pub mod physics;
mod room;

pub use ball::{BallActor, BallMsg, BallStateUpdate};
pub use broadcaster::{BroadcastMsg, Broadcaster};
pub use config::{GameConfig, MAX_PLAYERS, SLOT_COLORS};
pub use grid::{Cell, Grid};
pub use manager::{ManagerMsg, RoomInfo, RoomManager, RoomRef};
pub use paddle::{PaddleActor, PaddleDirection, PaddleMsg};
pub use room::{GameRoom, RoomMsg, RoomPhase, RoomSnapshot};
