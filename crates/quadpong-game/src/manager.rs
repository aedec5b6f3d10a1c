//! The room manager: assigns incoming players to rooms and reaps empty
//! ones.
//!
//! A singleton actor. All it knows about each room is its address and a
//! player count; the count is bumped optimistically at assignment time
//! (so back-to-back assignments cannot overfill a room) and overwritten
//! by the room's authoritative occupancy reports. The manager never
//! touches a connection and never instructs a room beyond stopping it.

use std::collections::HashMap;

use tokio::sync::oneshot;

use quadpong_actor::{Actor, ActorId, Addr, Context};
use quadpong_transport::Connection;

use crate::config::{GameConfig, MAX_PLAYERS};
use crate::room::{GameRoom, RoomMsg};

/// Address of a game room.
pub type RoomRef<C> = Addr<RoomMsg<C>>;

/// One row of the room-list snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomInfo {
    /// The room's identity — its game actor's ID.
    pub room: ActorId,
    pub occupancy: usize,
}

/// Messages the room manager accepts.
pub enum ManagerMsg<C: Connection> {
    /// Pick (or create) a room with a free slot for a new player.
    FindRoom {
        reply: oneshot::Sender<Option<RoomRef<C>>>,
    },
    /// Authoritative occupancy report from a game room.
    Occupancy { room: ActorId, count: usize },
    /// A game room emptied (or finished); stop and forget it.
    RoomEmpty { room: ActorId },
    /// Snapshot of all rooms and their occupancy.
    ListRooms {
        reply: oneshot::Sender<Vec<RoomInfo>>,
    },
}

struct RoomEntry<C: Connection> {
    addr: RoomRef<C>,
    occupancy: usize,
}

/// The singleton manager actor.
pub struct RoomManager<C: Connection> {
    config: GameConfig,
    rooms: HashMap<ActorId, RoomEntry<C>>,
}

impl<C: Connection> RoomManager<C> {
    /// Creates a manager; the config is validated once here and shared
    /// by every room it spawns.
    pub fn new(config: GameConfig) -> Self {
        Self {
            config: config.validated(),
            rooms: HashMap::new(),
        }
    }

    /// First room with a free slot, in id order.
    fn first_fit(&self) -> Option<ActorId> {
        let mut ids: Vec<ActorId> = self.rooms.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .find(|id| self.rooms[id].occupancy < MAX_PLAYERS)
    }
}

impl<C: Connection> Actor for RoomManager<C> {
    type Msg = ManagerMsg<C>;

    async fn handle(&mut self, ctx: &mut Context<Self::Msg>, msg: Self::Msg) {
        match msg {
            ManagerMsg::FindRoom { reply } => {
                let addr = match self.first_fit() {
                    Some(id) => {
                        let entry = self.rooms.get_mut(&id).expect("first-fit id is present");
                        entry.occupancy += 1;
                        entry.addr.clone()
                    }
                    None => {
                        let room = GameRoom::new(self.config.clone(), ctx.addr());
                        let addr = ctx.system().spawn(room);
                        tracing::info!(room = %addr.id(), "room created");
                        self.rooms.insert(
                            addr.id(),
                            RoomEntry {
                                addr: addr.clone(),
                                occupancy: 1,
                            },
                        );
                        addr
                    }
                };
                let _ = reply.send(Some(addr));
            }
            ManagerMsg::Occupancy { room, count } => {
                if let Some(entry) = self.rooms.get_mut(&room) {
                    entry.occupancy = count;
                }
            }
            ManagerMsg::RoomEmpty { room } => {
                if let Some(entry) = self.rooms.remove(&room) {
                    entry.addr.stop();
                    tracing::info!(%room, rooms = self.rooms.len(), "room reaped");
                }
            }
            ManagerMsg::ListRooms { reply } => {
                let mut rooms: Vec<RoomInfo> = self
                    .rooms
                    .iter()
                    .map(|(id, entry)| RoomInfo {
                        room: *id,
                        occupancy: entry.occupancy,
                    })
                    .collect();
                rooms.sort_unstable_by_key(|info| info.room);
                let _ = reply.send(rooms);
            }
        }
    }

    fn stopping(&mut self, _ctx: &mut Context<Self::Msg>) {
        for entry in self.rooms.values() {
            entry.addr.stop();
        }
    }
}
