//! Game configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Player slots per room. One per wall; fixed by the game design.
pub const MAX_PLAYERS: usize = 4;

/// Deterministic slot colors, indexed by slot.
pub const SLOT_COLORS: [&str; MAX_PLAYERS] = ["#ff4757", "#1e90ff", "#2ed573", "#ffa502"];

/// Tunable parameters for a game room.
///
/// Every room created by one manager shares one config. Values are
/// repaired by [`validated`](GameConfig::validated) before use, so a
/// room never runs with an inconsistent geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    /// Physics integration period (`T_phys`).
    pub physics_tick_period: Duration,

    /// Broadcast rate in Hz; batches ship every `1/broadcast_hz`.
    pub broadcast_hz: u32,

    /// Arena side length in pixels. Must be divisible by `grid_size`.
    pub canvas_size: i32,

    /// Brick grid side length in cells.
    pub grid_size: usize,

    /// Paddle extent along its wall.
    pub paddle_length: i32,

    /// Paddle extent perpendicular to its wall.
    pub paddle_thickness: i32,

    /// Paddle movement per physics tick.
    pub paddle_velocity: i32,

    /// Per-axis ball speed floor.
    pub min_ball_velocity: i32,

    /// Per-axis ball speed ceiling.
    pub max_ball_velocity: i32,

    pub ball_radius: i32,
    pub ball_mass: f64,

    /// How long a ball ignores bricks after any collision.
    pub phase_duration: Duration,

    /// How strongly paddle movement speeds up / slows down the ball.
    pub paddle_speed_factor: f64,

    /// How strongly an off-center hit deflects the ball.
    pub paddle_angle_factor: f64,

    /// Probability that a quadrant cell becomes a brick.
    pub grid_fill_density: f64,

    /// Brick-free radius around the arena center, in cells.
    pub clear_center_radius: f64,

    /// Brick-free margin along each wall, in cells.
    pub clear_wall_distance: usize,

    pub brick_min_life: u32,
    pub brick_max_life: u32,

    /// Probability that a destroyed brick triggers a powerup.
    pub powerup_chance: f64,

    /// Mean lifetime of powerup-spawned balls (exponentially
    /// distributed, clamped to `[mean/4, 4·mean]`).
    pub powerup_ball_expiry_mean: Duration,

    /// Mass added by the IncreaseMass powerup.
    pub mass_add: f64,

    /// Radius gained per unit of added mass.
    pub mass_size_factor: f64,

    /// Velocity multiplier of the IncreaseVelocity powerup.
    pub velocity_scale: f64,

    /// Starting score for a joining player.
    pub initial_score: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            physics_tick_period: Duration::from_millis(20),
            broadcast_hz: 30,
            canvas_size: 800,
            grid_size: 16,
            paddle_length: 120,
            paddle_thickness: 12,
            paddle_velocity: 6,
            min_ball_velocity: 2,
            max_ball_velocity: 8,
            ball_radius: 10,
            ball_mass: 1.0,
            phase_duration: Duration::from_millis(150),
            paddle_speed_factor: 0.25,
            paddle_angle_factor: 3.0,
            grid_fill_density: 0.6,
            clear_center_radius: 2.0,
            clear_wall_distance: 3,
            brick_min_life: 1,
            brick_max_life: 3,
            powerup_chance: 0.2,
            powerup_ball_expiry_mean: Duration::from_secs(10),
            mass_add: 0.5,
            mass_size_factor: 8.0,
            velocity_scale: 1.3,
            initial_score: 0,
        }
    }
}

impl GameConfig {
    /// Repairs any out-of-range values so the config is safe to use.
    ///
    /// Rules:
    /// - probabilities clamped to `0.0..=1.0`;
    /// - `brick_min_life ≤ brick_max_life`, both ≥ 1;
    /// - `min_ball_velocity ≥ 1` and ≤ `max_ball_velocity`;
    /// - `broadcast_hz` clamped to `1..=120`; tick period ≥ 1 ms;
    /// - `grid_size ≥ 4`; `canvas_size` rounded down to a multiple of
    ///   `grid_size`;
    /// - `paddle_length` capped at half the canvas so two paddles can
    ///   always pass each other's walls.
    pub fn validated(mut self) -> Self {
        self.grid_fill_density = self.grid_fill_density.clamp(0.0, 1.0);
        self.powerup_chance = self.powerup_chance.clamp(0.0, 1.0);

        self.brick_min_life = self.brick_min_life.max(1);
        self.brick_max_life = self.brick_max_life.max(self.brick_min_life);

        self.min_ball_velocity = self.min_ball_velocity.max(1);
        self.max_ball_velocity = self.max_ball_velocity.max(self.min_ball_velocity);

        if self.broadcast_hz == 0 || self.broadcast_hz > 120 {
            tracing::warn!(hz = self.broadcast_hz, "broadcast_hz out of range, clamping");
            self.broadcast_hz = self.broadcast_hz.clamp(1, 120);
        }
        if self.physics_tick_period < Duration::from_millis(1) {
            self.physics_tick_period = Duration::from_millis(1);
        }

        self.grid_size = self.grid_size.max(4);
        let grid = self.grid_size as i32;
        if self.canvas_size < grid {
            self.canvas_size = grid;
        }
        if self.canvas_size % grid != 0 {
            let rounded = self.canvas_size - self.canvas_size % grid;
            tracing::warn!(
                canvas = self.canvas_size,
                rounded,
                "canvas_size not divisible by grid_size, rounding down"
            );
            self.canvas_size = rounded;
        }

        self.paddle_length = self.paddle_length.clamp(1, self.canvas_size / 2);
        self.paddle_thickness = self.paddle_thickness.max(1);
        self.ball_radius = self.ball_radius.max(1);

        self
    }

    /// Side length of one grid cell in pixels.
    pub fn cell_size(&self) -> i32 {
        self.canvas_size / self.grid_size as i32
    }

    /// The broadcast period, `1 / broadcast_hz`.
    pub fn broadcast_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.broadcast_hz as f64)
    }
}
