//! Per-connection handler.
//!
//! Each accepted connection gets its own task running this function. It
//! walks a fixed path: ask the room manager for a room (with a bounded
//! wait), hand the connection to the game actor, then pump client
//! inputs until the stream ends. Teardown — on either read failure or
//! clean close — is a single `Leave`, which the game actor treats
//! idempotently; the handler never needs to know whether the room
//! already evicted the player over a write failure.
//!
//! The handler owns the read side of the connection. The game actor and
//! broadcaster only ever write.

use std::time::Duration;

use quadpong_actor::{Addr, ask};
use quadpong_game::{ManagerMsg, RoomMsg};
use quadpong_protocol::{ClientInput, Codec, JsonCodec};
use quadpong_transport::Connection;

/// How long a fresh connection may wait for a room assignment.
const ROOM_ASSIGN_TIMEOUT: Duration = Duration::from_secs(2);

/// Drives one client connection from assignment to teardown. The
/// returned future completing is the caller's completion signal.
pub(crate) async fn handle_connection<C: Connection>(conn: C, manager: Addr<ManagerMsg<C>>) {
    let conn_id = conn.id();

    // Connecting: obtain a room or give up.
    let assignment = ask(
        &manager,
        |tx| ManagerMsg::FindRoom { reply: tx },
        ROOM_ASSIGN_TIMEOUT,
    )
    .await;
    let room = match assignment {
        Ok(Some(room)) => room,
        Ok(None) => {
            tracing::warn!(%conn_id, "manager declined assignment, closing");
            let _ = conn.close().await;
            return;
        }
        Err(e) => {
            tracing::warn!(%conn_id, error = %e, "room assignment failed, closing");
            let _ = conn.close().await;
            return;
        }
    };
    tracing::debug!(%conn_id, room = %room.id(), "assigned to room");

    // Assigned: the game actor takes over the write side from here.
    room.send(RoomMsg::Join { conn: conn.clone() });

    // Open: forward inputs until the client goes away.
    let codec = JsonCodec;
    loop {
        match conn.recv().await {
            Ok(Some(bytes)) => match codec.decode::<ClientInput>(&bytes) {
                Ok(input) => room.send(RoomMsg::Input {
                    conn_id,
                    direction: input.direction,
                }),
                // Malformed payloads are dropped at this boundary.
                Err(e) => tracing::debug!(%conn_id, error = %e, "ignoring invalid input"),
            },
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "read error");
                break;
            }
        }
    }

    // Closing: exactly one leave, regardless of how we got here.
    let _ = conn.close().await;
    room.send(RoomMsg::Leave { conn_id });
}
