//! The per-room game actor.
//!
//! One `GameRoom` owns the authoritative world of a single match: the
//! brick grid, up to four player slots, the ball map, and the pending
//! delta buffer. Two tickers drive it — a physics tick that integrates
//! and resolves collisions, and a broadcast tick that flushes the delta
//! buffer (plus a grid refresh) to the room's broadcaster. Decoupling
//! the two keeps simulation cadence independent of network jitter and
//! caps outbound bandwidth.
//!
//! Entity actors (paddles, balls) own their dynamic fields; the room
//! integrates positions against cached copies and refreshes the cache
//! from entity echoes. The room never awaits network I/O: bootstrap
//! writes happen in a spawned task and batches go through the
//! broadcaster.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::oneshot;
use tokio::time::Instant;

use quadpong_actor::{Actor, ActorSystem, Addr, Context, TickGate, Ticker};
use quadpong_protocol::{
    BallState, CellKind, Codec, GameOverReason, InputDirection, JsonCodec, PaddleState,
    PlayerState, ScoreEntry, ServerMessage, Update,
};
use quadpong_transport::{Connection, ConnectionId};

use crate::ball::{BallActor, BallMsg, BallStateUpdate};
use crate::broadcaster::{BroadcastMsg, Broadcaster};
use crate::config::{GameConfig, MAX_PLAYERS, SLOT_COLORS};
use crate::grid::Grid;
use crate::manager::ManagerMsg;
use crate::paddle::{PaddleActor, PaddleDirection, PaddleMsg};
use crate::physics::{self, Wall};

/// Messages a game room accepts.
pub enum RoomMsg<C: Connection> {
    /// A new player connection, assigned here by the room manager.
    Join { conn: C },
    /// Steering input from a connected player.
    Input {
        conn_id: ConnectionId,
        direction: InputDirection,
    },
    /// The player's connection is gone (read side closed, write failed,
    /// or the handler tore down). Idempotent.
    Leave { conn_id: ConnectionId },
    /// Physics ticker fired.
    PhysicsTick,
    /// Broadcast ticker fired.
    BroadcastTick,
    /// Echo from a paddle actor: its direction actually changed.
    PaddleChanged {
        slot: u8,
        direction: PaddleDirection,
    },
    /// Echo from a ball actor after an applied command.
    BallChanged(BallStateUpdate),
    /// Diagnostic snapshot of the cached world.
    Inspect {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

/// A point-in-time view of the room's cached state.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub players: Vec<PlayerState>,
    pub paddles: Vec<PaddleState>,
    pub balls: Vec<BallState>,
    pub remaining_bricks: usize,
    pub phase: RoomPhase,
}

/// Lifecycle of a room.
///
/// ```text
/// Empty → Active ⇄ Full → Finishing → Finished
/// ```
///
/// Joins are accepted in Empty and Active; leaves can bounce Full back
/// to Active (or Active to Empty, which reaps the room). From Finishing
/// onward no input or tick does anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Empty,
    Active,
    Full,
    Finishing,
    Finished,
}

impl RoomPhase {
    /// Whether new players may still join.
    pub fn accepts_players(self) -> bool {
        matches!(self, RoomPhase::Empty | RoomPhase::Active)
    }

    /// Whether the simulation is running.
    pub fn is_running(self) -> bool {
        matches!(self, RoomPhase::Active | RoomPhase::Full)
    }
}

/// Room-side cache of a paddle.
struct PaddleCache {
    addr: Addr<PaddleMsg>,
    /// Scalar position along the wall axis (top-left corner).
    pos: i32,
    direction: PaddleDirection,
    /// Displacement actually applied this tick; zero when stopped or
    /// pinned at an arena edge.
    last_step: i32,
    collided: bool,
}

/// One occupied player slot.
struct PlayerSlot<C: Connection> {
    conn: C,
    color: String,
    score: i32,
    connected: bool,
    paddle: PaddleCache,
}

/// Room-side cache of a ball.
struct BallCache {
    addr: Addr<BallMsg>,
    x: i32,
    y: i32,
    vx: i32,
    vy: i32,
    radius: i32,
    mass: f64,
    owner: Option<u8>,
    permanent: bool,
    phasing: bool,
    collided: bool,
    /// Set only on temporary (powerup) balls.
    expires_at: Option<Instant>,
}

/// The game actor. Spawned by the room manager; identified by its
/// actor ID.
pub struct GameRoom<C: Connection> {
    config: GameConfig,
    manager: Addr<ManagerMsg<C>>,
    grid: Grid,
    slots: [Option<PlayerSlot<C>>; MAX_PLAYERS],
    balls: HashMap<u64, BallCache>,
    next_ball_id: u64,
    pending: Vec<Update>,
    phase: RoomPhase,
    broadcaster: Option<Addr<BroadcastMsg<C>>>,
    self_addr: Option<Addr<RoomMsg<C>>>,
    system: Option<ActorSystem>,
    physics_ticker: Option<Ticker>,
    broadcast_ticker: Option<Ticker>,
    physics_gate: Option<TickGate>,
    broadcast_gate: Option<TickGate>,
    codec: JsonCodec,
    rng: StdRng,
}

impl<C: Connection> GameRoom<C> {
    /// Creates a room with a freshly generated grid. The config must
    /// already be validated (the manager validates once for all rooms).
    pub fn new(config: GameConfig, manager: Addr<ManagerMsg<C>>) -> Self {
        let mut rng = StdRng::from_os_rng();
        let grid = Grid::generate(&config, &mut rng);
        Self {
            config,
            manager,
            grid,
            slots: [None, None, None, None],
            balls: HashMap::new(),
            next_ball_id: 1,
            pending: Vec::new(),
            phase: RoomPhase::Empty,
            broadcaster: None,
            self_addr: None,
            system: None,
            physics_ticker: None,
            broadcast_ticker: None,
            physics_gate: None,
            broadcast_gate: None,
            codec: JsonCodec,
            rng,
        }
    }

    // ---------------------------------------------------------------
    // Join / leave / input
    // ---------------------------------------------------------------

    fn handle_join(&mut self, conn: C) {
        let (Some(system), Some(self_addr)) = (self.system.clone(), self.self_addr.clone())
        else {
            return;
        };

        let free = (0..MAX_PLAYERS).find(|i| self.slots[*i].is_none());
        let slot_idx = match free {
            Some(i) if self.phase.accepts_players() => i,
            _ => {
                // The manager should never route a player here; refuse
                // by closing the stream.
                tracing::warn!(room = %self_addr.id(), "join refused, room not accepting players");
                tokio::spawn(async move {
                    let _ = conn.close().await;
                });
                return;
            }
        };
        let slot = slot_idx as u8;

        let paddle_addr = system.spawn(PaddleActor::new(slot, self_addr.clone()));
        let player = PlayerSlot {
            conn: conn.clone(),
            color: SLOT_COLORS[slot_idx].to_string(),
            score: self.config.initial_score,
            connected: true,
            paddle: PaddleCache {
                addr: paddle_addr,
                pos: physics::paddle_center_pos(&self.config),
                direction: PaddleDirection::Stopped,
                last_step: 0,
                collided: false,
            },
        };
        self.slots[slot_idx] = Some(player);

        self.pending.push(Update::PlayerJoined {
            player: self.player_state(slot_idx),
        });

        // Every player brings one permanent ball into play.
        let (bx, by) = self.ball_spawn_point(slot);
        let (bvx, bvy) = self.spawn_velocity(Wall::from_slot(slot));
        self.spawn_ball(bx, by, bvx, bvy, Some(slot), true, None);

        // Bootstrap directly on the stream, then hand the connection to
        // the broadcaster. Doing both in one task keeps the snapshot
        // ahead of the first batch without blocking this actor.
        let assignment = ServerMessage::PlayerAssignment { player_index: slot };
        let snapshot = ServerMessage::InitialPlayersAndBallsState {
            players: self.player_states(),
            paddles: self.paddle_states(),
            balls: self.ball_states(),
        };
        match (
            self.codec.encode(&assignment),
            self.codec.encode(&snapshot),
        ) {
            (Ok(assignment_bytes), Ok(snapshot_bytes)) => {
                let broadcaster = self.broadcaster.clone();
                tokio::spawn(async move {
                    if conn.send(&assignment_bytes).await.is_err()
                        || conn.send(&snapshot_bytes).await.is_err()
                    {
                        // The read side will observe the failure and
                        // deliver the leave.
                        tracing::debug!(conn = %conn.id(), "bootstrap write failed");
                    }
                    if let Some(broadcaster) = broadcaster {
                        broadcaster.send(BroadcastMsg::AddClient { conn });
                    }
                });
            }
            _ => tracing::error!("failed to encode bootstrap messages"),
        }

        self.phase = if self.occupied() == MAX_PLAYERS {
            RoomPhase::Full
        } else {
            RoomPhase::Active
        };
        self.notify_occupancy();
        tracing::info!(room = %self_addr.id(), slot, players = self.occupied(), "player joined");
    }

    /// Removes the player owning `conn_id`. Returns `true` when the room
    /// emptied and should stop. Safe to call twice for the same
    /// connection.
    fn handle_leave(&mut self, conn_id: ConnectionId) -> bool {
        let Some(slot_idx) = self.slot_by_conn(conn_id) else {
            return false;
        };
        let mut player = self.slots[slot_idx].take().expect("slot checked occupied");
        player.connected = false;
        player.paddle.addr.stop();
        self.pending.push(Update::PlayerLeft {
            player_index: slot_idx as u8,
        });
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.send(BroadcastMsg::RemoveClient { conn_id });
        }

        let remaining = self.occupied();
        if remaining == 0 {
            // One ball survives an emptied room, permanent and
            // ownerless; the rest go.
            self.retain_survivor_ball();
            self.notify_occupancy();
            if let Some(addr) = &self.self_addr {
                tracing::info!(room = %addr.id(), "room empty, stopping");
                self.manager.send(ManagerMsg::RoomEmpty { room: addr.id() });
            }
            self.teardown();
            self.phase = RoomPhase::Empty;
            return true;
        }

        // Balls owned by the departed slot stay in play, ownerless.
        let orphaned: Vec<u64> = self
            .sorted_ball_ids()
            .into_iter()
            .filter(|id| self.balls[id].owner == Some(slot_idx as u8))
            .collect();
        for id in orphaned {
            self.set_ball_owner(id, None);
        }

        self.phase = RoomPhase::Active;
        self.notify_occupancy();
        tracing::info!(slot = slot_idx, players = remaining, "player left");
        false
    }

    fn handle_input(&mut self, conn_id: ConnectionId, direction: InputDirection) {
        if !self.phase.is_running() {
            return;
        }
        let Some(slot_idx) = self.slot_by_conn(conn_id) else {
            return;
        };
        let player = self.slots[slot_idx].as_ref().expect("slot checked occupied");
        player
            .paddle
            .addr
            .send(PaddleMsg::SetDirection(direction.into()));
    }

    fn handle_paddle_changed(&mut self, slot: u8, direction: PaddleDirection) {
        // The slot may have been vacated while the echo was in flight.
        let Some(player) = self.slots[slot as usize].as_mut() else {
            return;
        };
        player.paddle.direction = direction;
        let pos = player.paddle.pos;
        let collided = player.paddle.collided;
        let rect = physics::paddle_rect(&self.config, Wall::from_slot(slot), pos);
        self.pending.push(Update::PaddlePositionUpdate {
            player_index: slot,
            x: rect.x,
            y: rect.y,
            width: rect.w,
            height: rect.h,
            is_moving: direction.is_moving(),
            collided,
        });
    }

    fn handle_ball_changed(&mut self, update: BallStateUpdate) {
        // The ball may have been removed while the echo was in flight.
        let Some(ball) = self.balls.get_mut(&update.id) else {
            return;
        };
        ball.vx = update.vx;
        ball.vy = update.vy;
        ball.radius = update.radius;
        ball.phasing = update.phasing;
    }

    // ---------------------------------------------------------------
    // Physics
    // ---------------------------------------------------------------

    /// One simulation step. Returns `true` when the last brick fell.
    fn physics_step(&mut self) -> bool {
        // Paddles first: their step feeds ball reflection this tick.
        for player in self.slots.iter_mut().flatten() {
            let delta = player
                .paddle
                .direction
                .delta(self.config.paddle_velocity);
            if delta != 0 {
                let (pos, step) = physics::step_paddle(&self.config, player.paddle.pos, delta);
                player.paddle.pos = pos;
                player.paddle.last_step = step;
            } else {
                player.paddle.last_step = 0;
            }
        }

        // Balls: integrate, then resolve in id order for determinism.
        for id in self.sorted_ball_ids() {
            if let Some(ball) = self.balls.get_mut(&id) {
                ball.x += ball.vx;
                ball.y += ball.vy;
            }
            self.resolve_collisions(id);
        }

        // Temporary balls die of old age on the physics tick.
        let now = Instant::now();
        let expired: Vec<u64> = self
            .sorted_ball_ids()
            .into_iter()
            .filter(|id| self.balls[id].expires_at.is_some_and(|at| at <= now))
            .collect();
        for id in expired {
            self.remove_ball(id);
        }

        self.emit_tick_updates();
        self.grid.remaining_bricks() == 0
    }

    /// Wall, then paddles, then bricks; one collision per ball per tick.
    fn resolve_collisions(&mut self, id: u64) {
        let Some(ball) = self.balls.get(&id) else {
            return;
        };
        let (x, y, radius, phasing) = (ball.x, ball.y, ball.radius, ball.phasing);

        if let Some(wall) = physics::wall_hit(self.config.canvas_size, x, y, radius) {
            self.handle_wall_collision(id, wall);
            return;
        }

        let aabb = physics::ball_aabb(x, y, radius);
        for slot_idx in 0..MAX_PLAYERS {
            if let Some(player) = &self.slots[slot_idx] {
                let wall = Wall::from_slot(slot_idx as u8);
                let rect = physics::paddle_rect(&self.config, wall, player.paddle.pos);
                if aabb.overlap(&rect).is_some() {
                    self.handle_paddle_collision(id, slot_idx as u8);
                    return;
                }
            }
        }

        if !phasing {
            self.handle_brick_collision(id);
        }
    }

    fn handle_wall_collision(&mut self, id: u64, wall: Wall) {
        let conceder = wall.slot();
        let occupied = self.slots[conceder as usize].is_some();
        let (permanent, owner) = {
            let ball = &self.balls[&id];
            (ball.permanent, ball.owner)
        };

        // A temporary ball sails out through an undefended wall.
        if !occupied && !permanent {
            self.remove_ball(id);
            return;
        }

        {
            let ball = self.balls.get_mut(&id).expect("ball checked present");
            let (x, y) = physics::wall_snap(self.config.canvas_size, wall, ball.x, ball.y, ball.radius);
            ball.x = x;
            ball.y = y;
            let (vx, vy) = physics::reflect_off_wall(wall, ball.vx, ball.vy);
            ball.vx = vx;
            ball.vy = vy;
            ball.addr.send(BallMsg::SetVelocity { vx, vy });
        }
        self.start_phasing(id);

        if occupied {
            self.change_score(conceder, -1);
            match owner {
                // Conceding against your own wall costs the point and
                // the ball.
                Some(scorer) if scorer == conceder => self.set_ball_owner(id, None),
                Some(scorer) if self.slots[scorer as usize].is_some() => {
                    self.change_score(scorer, 1);
                }
                _ => {}
            }
        }
    }

    fn handle_paddle_collision(&mut self, id: u64, slot: u8) {
        let wall = Wall::from_slot(slot);
        let (rect, step) = {
            let paddle = &self.slots[slot as usize]
                .as_ref()
                .expect("slot checked occupied")
                .paddle;
            (
                physics::paddle_rect(&self.config, wall, paddle.pos),
                paddle.last_step,
            )
        };
        {
            let ball = self.balls.get_mut(&id).expect("ball checked present");
            let (vx, vy) = physics::paddle_bounce(
                &self.config,
                wall,
                &rect,
                step,
                ball.x,
                ball.y,
                ball.vx,
                ball.vy,
            );
            ball.vx = vx;
            ball.vy = vy;
            ball.addr.send(BallMsg::SetVelocity { vx, vy });
        }
        self.start_phasing(id);
        self.set_ball_owner(id, Some(slot));
        if let Some(player) = self.slots[slot as usize].as_mut() {
            player.paddle.collided = true;
        }
    }

    fn handle_brick_collision(&mut self, id: u64) {
        let (x, y, radius, owner) = {
            let ball = &self.balls[&id];
            (ball.x, ball.y, ball.radius, ball.owner)
        };
        let aabb = physics::ball_aabb(x, y, radius);
        let Some((cols, rows)) = self.grid.cells_in_rect(&aabb) else {
            return;
        };

        // First live cell in row-major order; the reflection axis is the
        // side of smaller penetration.
        let mut hit = None;
        'scan: for row in rows {
            for col in cols.clone() {
                if self.grid.cell(col, row).is_live() {
                    if let Some((ox, oy)) = aabb.overlap(&self.grid.cell_rect(col, row)) {
                        hit = Some((col, row, ox, oy));
                        break 'scan;
                    }
                }
            }
        }
        let Some((col, row, ox, oy)) = hit else {
            return;
        };

        let axis = physics::brick_bounce_axis(ox, oy);
        {
            let ball = self.balls.get_mut(&id).expect("ball checked present");
            let (vx, vy) = physics::reflect_on_axis(axis, ball.vx, ball.vy);
            ball.vx = vx;
            ball.vy = vy;
            ball.addr.send(BallMsg::ReflectOnAxis(axis));
        }
        self.start_phasing(id);

        let broken_level = {
            let cell = self.grid.cell_mut(col, row);
            cell.life -= 1;
            if cell.life == 0 {
                cell.kind = CellKind::Empty;
                Some(cell.level)
            } else {
                None
            }
        };
        if let Some(level) = broken_level {
            if let Some(scorer) = owner {
                if self.slots[scorer as usize].is_some() {
                    self.change_score(scorer, level as i32);
                }
            }
            if self.rng.random_bool(self.config.powerup_chance) {
                let center = self.grid.cell_center(col, row);
                self.apply_powerup(id, center);
            }
        }
    }

    // ---------------------------------------------------------------
    // Powerups
    // ---------------------------------------------------------------

    fn apply_powerup(&mut self, ball_id: u64, (cx, cy): (i32, i32)) {
        match self.rng.random_range(0..3u8) {
            0 => {
                let owner = self.balls.get(&ball_id).and_then(|b| b.owner);
                let (vx, vy) = self.random_velocity();
                let expiry = Instant::now() + self.sample_expiry();
                self.spawn_ball(cx, cy, vx, vy, owner, false, Some(expiry));
            }
            1 => {
                let mass_delta = self.config.mass_add;
                let radius_delta =
                    (self.config.mass_add * self.config.mass_size_factor).round() as i32;
                if let Some(ball) = self.balls.get_mut(&ball_id) {
                    ball.mass += mass_delta;
                    ball.radius = (ball.radius + radius_delta).max(1);
                    ball.addr.send(BallMsg::AdjustMass {
                        mass_delta,
                        radius_delta,
                    });
                }
            }
            _ => {
                let factor = self.config.velocity_scale;
                let (min, max) = (self.config.min_ball_velocity, self.config.max_ball_velocity);
                if let Some(ball) = self.balls.get_mut(&ball_id) {
                    ball.vx =
                        physics::clamp_component((ball.vx as f64 * factor).round() as i32, min, max);
                    ball.vy =
                        physics::clamp_component((ball.vy as f64 * factor).round() as i32, min, max);
                    ball.addr.send(BallMsg::ScaleVelocity(factor));
                }
            }
        }
    }

    /// Exponentially distributed lifetime for a powerup ball, clamped
    /// to `[mean/4, 4·mean]`.
    fn sample_expiry(&mut self) -> std::time::Duration {
        let mean = self.config.powerup_ball_expiry_mean.as_secs_f64();
        let u: f64 = self.rng.random();
        let sample = -mean * (1.0 - u).ln();
        std::time::Duration::from_secs_f64(sample.clamp(mean / 4.0, mean * 4.0))
    }

    // ---------------------------------------------------------------
    // Balls
    // ---------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn spawn_ball(
        &mut self,
        x: i32,
        y: i32,
        vx: i32,
        vy: i32,
        owner: Option<u8>,
        permanent: bool,
        expires_at: Option<Instant>,
    ) -> Option<u64> {
        let (Some(system), Some(self_addr)) = (self.system.as_ref(), self.self_addr.as_ref())
        else {
            return None;
        };
        let id = self.next_ball_id;
        self.next_ball_id += 1;

        let addr = system.spawn(BallActor::new(
            id,
            vx,
            vy,
            self.config.ball_mass,
            self.config.ball_radius,
            self.config.min_ball_velocity,
            self.config.max_ball_velocity,
            self_addr.clone(),
        ));
        let ball = BallCache {
            addr,
            x,
            y,
            vx,
            vy,
            radius: self.config.ball_radius,
            mass: self.config.ball_mass,
            owner,
            permanent,
            phasing: false,
            collided: false,
            expires_at,
        };
        self.pending.push(Update::BallSpawned {
            ball: Self::ball_state(id, &ball),
        });
        self.balls.insert(id, ball);
        Some(id)
    }

    fn remove_ball(&mut self, id: u64) {
        if let Some(ball) = self.balls.remove(&id) {
            ball.addr.stop();
            self.pending.push(Update::BallRemoved { id });
        }
    }

    fn start_phasing(&mut self, id: u64) {
        if let Some(ball) = self.balls.get_mut(&id) {
            ball.collided = true;
            ball.phasing = true;
            ball.addr.send(BallMsg::SetPhasing(self.config.phase_duration));
        }
    }

    fn set_ball_owner(&mut self, id: u64, owner: Option<u8>) {
        if let Some(ball) = self.balls.get_mut(&id) {
            if ball.owner != owner {
                ball.owner = owner;
                self.pending.push(Update::BallOwnershipChange { id, owner });
            }
        }
    }

    /// Keeps exactly one ball — permanent preferred — and removes the
    /// rest. The survivor is forced permanent and ownerless.
    fn retain_survivor_ball(&mut self) {
        let ids = self.sorted_ball_ids();
        let keep = ids
            .iter()
            .copied()
            .find(|id| self.balls[id].permanent)
            .or_else(|| ids.first().copied());
        let Some(keep) = keep else {
            return;
        };
        for id in ids {
            if id != keep {
                self.remove_ball(id);
            }
        }
        if let Some(ball) = self.balls.get_mut(&keep) {
            ball.permanent = true;
        }
        self.set_ball_owner(keep, None);
    }

    fn ball_spawn_point(&self, slot: u8) -> (i32, i32) {
        let canvas = self.config.canvas_size;
        let offset = self.config.paddle_thickness + 4 * self.config.ball_radius;
        let mid = canvas / 2;
        match Wall::from_slot(slot) {
            Wall::Right => (canvas - offset, mid),
            Wall::Left => (offset, mid),
            Wall::Top => (mid, offset),
            Wall::Bottom => (mid, canvas - offset),
        }
    }

    /// Random velocity aimed away from `wall`, into the arena.
    fn spawn_velocity(&mut self, wall: Wall) -> (i32, i32) {
        let (min, max) = (self.config.min_ball_velocity, self.config.max_ball_velocity);
        let inward = self.rng.random_range(min..=max);
        let along = self.rng.random_range(min..=max)
            * if self.rng.random_bool(0.5) { 1 } else { -1 };
        match wall {
            Wall::Right => (-inward, along),
            Wall::Left => (inward, along),
            Wall::Top => (along, inward),
            Wall::Bottom => (along, -inward),
        }
    }

    /// Random velocity with random direction on both axes.
    fn random_velocity(&mut self) -> (i32, i32) {
        let (min, max) = (self.config.min_ball_velocity, self.config.max_ball_velocity);
        let mut component = |rng: &mut StdRng| {
            rng.random_range(min..=max) * if rng.random_bool(0.5) { 1 } else { -1 }
        };
        let vx = component(&mut self.rng);
        let vy = component(&mut self.rng);
        (vx, vy)
    }

    // ---------------------------------------------------------------
    // Scoring, deltas, broadcast
    // ---------------------------------------------------------------

    fn change_score(&mut self, slot: u8, delta: i32) {
        if let Some(player) = self.slots[slot as usize].as_mut() {
            player.score += delta;
            let score = player.score;
            self.pending.push(Update::ScoreUpdate {
                player_index: slot,
                score,
            });
        }
    }

    /// Per-tick paddle and ball deltas. Transient `collided` flags are
    /// cleared once the covering delta is buffered.
    fn emit_tick_updates(&mut self) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let Some(player) = slot else { continue };
            let paddle = &mut player.paddle;
            if paddle.last_step != 0 || paddle.collided {
                let rect =
                    physics::paddle_rect(&self.config, Wall::from_slot(idx as u8), paddle.pos);
                self.pending.push(Update::PaddlePositionUpdate {
                    player_index: idx as u8,
                    x: rect.x,
                    y: rect.y,
                    width: rect.w,
                    height: rect.h,
                    is_moving: paddle.direction.is_moving(),
                    collided: paddle.collided,
                });
                paddle.collided = false;
            }
        }

        for id in self.sorted_ball_ids() {
            let ball = self.balls.get_mut(&id).expect("id just listed");
            self.pending.push(Update::BallPositionUpdate {
                id,
                x: ball.x,
                y: ball.y,
                vx: ball.vx,
                vy: ball.vy,
                radius: ball.radius,
                collided: ball.collided,
                phasing: ball.phasing,
                owner: ball.owner,
            });
            ball.collided = false;
        }
    }

    /// Hands the buffered deltas plus a grid refresh to the broadcaster.
    fn flush_batch(&mut self) {
        let Some(broadcaster) = &self.broadcaster else {
            return;
        };
        let mut updates = std::mem::take(&mut self.pending);
        updates.push(Update::FullGridUpdate {
            cols: self.grid.size(),
            rows: self.grid.size(),
            cells: self.grid.snapshot(),
        });
        broadcaster.send(BroadcastMsg::Broadcast { updates });
    }

    fn finish_game(&mut self) {
        self.phase = RoomPhase::Finishing;
        let final_scores = self.final_scores();
        if let Some(addr) = &self.self_addr {
            tracing::info!(room = %addr.id(), "bricks cleared, game over");
        }
        self.pending.push(Update::GameOver {
            reason: GameOverReason::BricksCleared,
            final_scores: final_scores.clone(),
        });
        self.flush_batch();
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.send(BroadcastMsg::GameOverAndClose {
                reason: GameOverReason::BricksCleared,
                final_scores,
            });
        }
        if let Some(addr) = &self.self_addr {
            self.manager.send(ManagerMsg::RoomEmpty { room: addr.id() });
        }
        // The broadcaster stops itself after delivering the terminal
        // message; children and tickers go now.
        self.teardown();
        self.phase = RoomPhase::Finished;
    }

    /// Stops entity actors and tickers. Does not touch the broadcaster.
    fn teardown(&mut self) {
        for player in self.slots.iter().flatten() {
            player.paddle.addr.stop();
        }
        for ball in self.balls.values() {
            ball.addr.stop();
        }
        self.physics_ticker = None;
        self.broadcast_ticker = None;
    }

    // ---------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------

    fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn slot_by_conn(&self, conn_id: ConnectionId) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|p| p.conn.id() == conn_id))
    }

    fn sorted_ball_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.balls.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn notify_occupancy(&self) {
        if let Some(addr) = &self.self_addr {
            self.manager.send(ManagerMsg::Occupancy {
                room: addr.id(),
                count: self.occupied(),
            });
        }
    }

    fn player_state(&self, slot_idx: usize) -> PlayerState {
        let player = self.slots[slot_idx].as_ref().expect("slot occupied");
        PlayerState {
            index: slot_idx as u8,
            color: player.color.clone(),
            score: player.score,
            connected: player.connected,
        }
    }

    fn player_states(&self) -> Vec<PlayerState> {
        (0..MAX_PLAYERS)
            .filter(|i| self.slots[*i].is_some())
            .map(|i| self.player_state(i))
            .collect()
    }

    fn paddle_states(&self) -> Vec<PaddleState> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                let player = slot.as_ref()?;
                let rect = physics::paddle_rect(
                    &self.config,
                    Wall::from_slot(idx as u8),
                    player.paddle.pos,
                );
                Some(PaddleState {
                    index: idx as u8,
                    x: rect.x,
                    y: rect.y,
                    width: rect.w,
                    height: rect.h,
                    is_moving: player.paddle.direction.is_moving(),
                })
            })
            .collect()
    }

    fn ball_state(id: u64, ball: &BallCache) -> BallState {
        BallState {
            id,
            x: ball.x,
            y: ball.y,
            vx: ball.vx,
            vy: ball.vy,
            radius: ball.radius,
            owner: ball.owner,
            permanent: ball.permanent,
            phasing: ball.phasing,
        }
    }

    fn ball_states(&self) -> Vec<BallState> {
        self.sorted_ball_ids()
            .into_iter()
            .map(|id| Self::ball_state(id, &self.balls[&id]))
            .collect()
    }

    fn final_scores(&self) -> Vec<ScoreEntry> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                slot.as_ref().map(|p| ScoreEntry {
                    player_index: idx as u8,
                    score: p.score,
                })
            })
            .collect()
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            players: self.player_states(),
            paddles: self.paddle_states(),
            balls: self.ball_states(),
            remaining_bricks: self.grid.remaining_bricks(),
            phase: self.phase,
        }
    }
}

impl<C: Connection> Actor for GameRoom<C> {
    type Msg = RoomMsg<C>;

    fn started(&mut self, ctx: &mut Context<Self::Msg>) {
        self.self_addr = Some(ctx.addr());
        self.system = Some(ctx.system().clone());
        self.broadcaster = Some(ctx.system().spawn(Broadcaster::new(ctx.addr())));

        let physics = Ticker::start(ctx.addr(), self.config.physics_tick_period, || {
            RoomMsg::PhysicsTick
        });
        self.physics_gate = Some(physics.gate());
        self.physics_ticker = Some(physics);

        let broadcast = Ticker::start(ctx.addr(), self.config.broadcast_period(), || {
            RoomMsg::BroadcastTick
        });
        self.broadcast_gate = Some(broadcast.gate());
        self.broadcast_ticker = Some(broadcast);

        tracing::info!(
            room = %ctx.id(),
            grid = self.grid.size(),
            bricks = self.grid.remaining_bricks(),
            "room started"
        );
    }

    async fn handle(&mut self, ctx: &mut Context<Self::Msg>, msg: Self::Msg) {
        match msg {
            RoomMsg::Join { conn } => self.handle_join(conn),
            RoomMsg::Input { conn_id, direction } => self.handle_input(conn_id, direction),
            RoomMsg::Leave { conn_id } => {
                if self.handle_leave(conn_id) {
                    ctx.stop_self();
                }
            }
            RoomMsg::PhysicsTick => {
                if let Some(gate) = &self.physics_gate {
                    gate.acknowledge();
                }
                if self.phase.is_running() && self.physics_step() {
                    self.finish_game();
                    ctx.stop_self();
                }
            }
            RoomMsg::BroadcastTick => {
                if let Some(gate) = &self.broadcast_gate {
                    gate.acknowledge();
                }
                if self.phase.is_running() {
                    self.flush_batch();
                }
            }
            RoomMsg::PaddleChanged { slot, direction } => {
                self.handle_paddle_changed(slot, direction);
            }
            RoomMsg::BallChanged(update) => self.handle_ball_changed(update),
            RoomMsg::Inspect { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn stopping(&mut self, _ctx: &mut Context<Self::Msg>) {
        self.teardown();
        // After a finished game the broadcaster still has the terminal
        // message in its mailbox and stops itself once it is delivered;
        // a stop signal here would outrank that delivery.
        if self.phase != RoomPhase::Finished {
            if let Some(broadcaster) = &self.broadcaster {
                broadcaster.stop();
            }
        }
    }
}
