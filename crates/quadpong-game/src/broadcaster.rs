//! The per-room broadcaster actor.
//!
//! Owns the set of connected clients for one room and fans batches out
//! to them. Each batch is serialized exactly once; the bytes are then
//! written per client. A failed write never mutates membership here —
//! the game room is the single owner of membership, so the broadcaster
//! reports the failure as a `Leave` and waits for the room to call back
//! with `RemoveClient`.

use std::collections::HashMap;

use quadpong_actor::{Actor, Addr, Context};
use quadpong_protocol::{Codec, GameOverReason, JsonCodec, ScoreEntry, ServerMessage, Update};
use quadpong_transport::{Connection, ConnectionId};

use crate::room::RoomMsg;

/// Commands the broadcaster accepts.
pub enum BroadcastMsg<C: Connection> {
    /// Start delivering batches to this client.
    AddClient { conn: C },
    /// Stop delivering to this client (issued by the room after a
    /// leave).
    RemoveClient { conn_id: ConnectionId },
    /// Fan one batch of deltas out to every client.
    Broadcast { updates: Vec<Update> },
    /// Deliver the terminal message best-effort, close every stream,
    /// and stop.
    GameOverAndClose {
        reason: GameOverReason,
        final_scores: Vec<ScoreEntry>,
    },
}

/// The actor. One per room, spawned and stopped by its game room.
pub struct Broadcaster<C: Connection> {
    room: Addr<RoomMsg<C>>,
    clients: HashMap<ConnectionId, C>,
    codec: JsonCodec,
}

impl<C: Connection> Broadcaster<C> {
    pub fn new(room: Addr<RoomMsg<C>>) -> Self {
        Self {
            room,
            clients: HashMap::new(),
            codec: JsonCodec,
        }
    }

    /// Writes pre-encoded bytes to every client, reporting write
    /// failures to the room as leaves.
    async fn fan_out(&self, bytes: &[u8]) {
        for (conn_id, conn) in &self.clients {
            if let Err(e) = conn.send(bytes).await {
                tracing::debug!(%conn_id, error = %e, "write failed, reporting leave");
                self.room.send(RoomMsg::Leave { conn_id: *conn_id });
            }
        }
    }
}

impl<C: Connection> Actor for Broadcaster<C> {
    type Msg = BroadcastMsg<C>;

    async fn handle(&mut self, ctx: &mut Context<Self::Msg>, msg: Self::Msg) {
        match msg {
            BroadcastMsg::AddClient { conn } => {
                self.clients.insert(conn.id(), conn);
            }
            BroadcastMsg::RemoveClient { conn_id } => {
                self.clients.remove(&conn_id);
            }
            BroadcastMsg::Broadcast { updates } => {
                if self.clients.is_empty() {
                    return;
                }
                let message = ServerMessage::GameUpdates { updates };
                let bytes = match self.codec.encode(&message) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to encode batch");
                        return;
                    }
                };
                self.fan_out(&bytes).await;
            }
            BroadcastMsg::GameOverAndClose {
                reason,
                final_scores,
            } => {
                let message = ServerMessage::GameOver {
                    reason,
                    final_scores,
                };
                match self.codec.encode(&message) {
                    Ok(bytes) => self.fan_out(&bytes).await,
                    Err(e) => tracing::error!(error = %e, "failed to encode game over"),
                }
                for (conn_id, conn) in self.clients.drain() {
                    if let Err(e) = conn.close().await {
                        tracing::debug!(%conn_id, error = %e, "close failed");
                    }
                }
                ctx.stop_self();
            }
        }
    }
}
