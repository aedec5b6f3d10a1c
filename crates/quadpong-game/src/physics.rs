//! Pure geometry and collision math.
//!
//! Everything here is a plain function over plain values — no actors, no
//! I/O — so the collision rules can be tested exhaustively without a
//! runtime. The game room drives these functions once per physics tick.

use crate::config::GameConfig;

/// One of the two movement axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// The four arena walls. Each wall is also a player slot:
/// 0 = right, 1 = top, 2 = left, 3 = bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    Right,
    Top,
    Left,
    Bottom,
}

impl Wall {
    /// All walls, in slot order.
    pub const ALL: [Wall; 4] = [Wall::Right, Wall::Top, Wall::Left, Wall::Bottom];

    /// The player slot defending this wall.
    pub fn slot(self) -> u8 {
        match self {
            Wall::Right => 0,
            Wall::Top => 1,
            Wall::Left => 2,
            Wall::Bottom => 3,
        }
    }

    /// The wall defended by `slot`.
    pub fn from_slot(slot: u8) -> Wall {
        Wall::ALL[slot as usize]
    }

    /// The axis perpendicular to this wall — the one a reflection
    /// negates.
    pub fn axis(self) -> Axis {
        match self {
            Wall::Right | Wall::Left => Axis::X,
            Wall::Top | Wall::Bottom => Axis::Y,
        }
    }

    /// Whether the paddle on this wall stands vertically (moves along Y).
    pub fn is_vertical(self) -> bool {
        matches!(self, Wall::Right | Wall::Left)
    }
}

/// Axis-aligned rectangle with integer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn center_x(&self) -> i32 {
        self.x + self.w / 2
    }

    pub fn center_y(&self) -> i32 {
        self.y + self.h / 2
    }

    /// Overlap depths `(ox, oy)` with another rect, or `None` if the
    /// rects only touch or are disjoint.
    pub fn overlap(&self, other: &Rect) -> Option<(i32, i32)> {
        let ox = self.right().min(other.right()) - self.x.max(other.x);
        let oy = self.bottom().min(other.bottom()) - self.y.max(other.y);
        (ox > 0 && oy > 0).then_some((ox, oy))
    }
}

/// The ball's bounding box.
pub fn ball_aabb(x: i32, y: i32, radius: i32) -> Rect {
    Rect::new(x - radius, y - radius, 2 * radius, 2 * radius)
}

/// The rectangle of the paddle on `wall` at scalar position `pos` along
/// its wall axis.
pub fn paddle_rect(config: &GameConfig, wall: Wall, pos: i32) -> Rect {
    let len = config.paddle_length;
    let thick = config.paddle_thickness;
    let canvas = config.canvas_size;
    match wall {
        Wall::Right => Rect::new(canvas - thick, pos, thick, len),
        Wall::Left => Rect::new(0, pos, thick, len),
        Wall::Top => Rect::new(pos, 0, len, thick),
        Wall::Bottom => Rect::new(pos, canvas - thick, len, thick),
    }
}

/// Paddle position centered on its wall.
pub fn paddle_center_pos(config: &GameConfig) -> i32 {
    (config.canvas_size - config.paddle_length) / 2
}

/// Advances a paddle along its wall by one tick of `delta`, clamping to
/// the arena. Returns `(new_pos, applied_step)` — a paddle pinned at an
/// arena edge reports a zero step even while its direction is held.
pub fn step_paddle(config: &GameConfig, pos: i32, delta: i32) -> (i32, i32) {
    let next = (pos + delta).clamp(0, config.canvas_size - config.paddle_length);
    (next, next - pos)
}

/// Which wall, if any, the ball currently crosses. Corner overlaps
/// resolve to the deeper penetration; exact ties keep slot order.
pub fn wall_hit(canvas: i32, x: i32, y: i32, radius: i32) -> Option<Wall> {
    let candidates = [
        (Wall::Right, (x + radius) - canvas),
        (Wall::Top, radius - y),
        (Wall::Left, radius - x),
        (Wall::Bottom, (y + radius) - canvas),
    ];
    let mut hit: Option<(Wall, i32)> = None;
    for (wall, pen) in candidates {
        if pen >= 0 && hit.is_none_or(|(_, best)| pen > best) {
            hit = Some((wall, pen));
        }
    }
    hit.map(|(wall, _)| wall)
}

/// Snaps a ball just inside the given wall (one pixel of clearance).
pub fn wall_snap(canvas: i32, wall: Wall, x: i32, y: i32, radius: i32) -> (i32, i32) {
    match wall {
        Wall::Right => (canvas - radius - 1, y),
        Wall::Left => (radius + 1, y),
        Wall::Top => (x, radius + 1),
        Wall::Bottom => (x, canvas - radius - 1),
    }
}

/// Reflects a velocity so its perpendicular component points away from
/// the wall, into the arena.
pub fn reflect_off_wall(wall: Wall, vx: i32, vy: i32) -> (i32, i32) {
    match wall {
        Wall::Right => (-vx.abs(), vy),
        Wall::Left => (vx.abs(), vy),
        Wall::Top => (vx, vy.abs()),
        Wall::Bottom => (vx, -vy.abs()),
    }
}

/// Clamps one velocity component to `[min, max]` by magnitude, keeping
/// its direction. A zero component is pushed to `+min` so a ball can
/// never go dead on an axis.
pub fn clamp_component(v: i32, min: i32, max: i32) -> i32 {
    let sign = if v < 0 { -1 } else { 1 };
    sign * v.abs().clamp(min, max)
}

/// The reflection axis for a brick hit: the axis of smaller penetration
/// is the side the ball came in through. Ties break toward X.
pub fn brick_bounce_axis(ox: i32, oy: i32) -> Axis {
    if ox <= oy { Axis::X } else { Axis::Y }
}

/// Negates the velocity component on `axis`.
pub fn reflect_on_axis(axis: Axis, vx: i32, vy: i32) -> (i32, i32) {
    match axis {
        Axis::X => (-vx, vy),
        Axis::Y => (vx, -vy),
    }
}

/// Resolves a paddle hit: perpendicular reflection away from the wall,
/// off-center deflection, and paddle-motion speed transfer.
///
/// `paddle_step` is the displacement the paddle actually made this tick
/// (zero when stopped *or* pinned at an arena edge, which is what makes
/// a clamped paddle inert).
pub fn paddle_bounce(
    config: &GameConfig,
    wall: Wall,
    paddle: &Rect,
    paddle_step: i32,
    ball_x: i32,
    ball_y: i32,
    vx: i32,
    vy: i32,
) -> (i32, i32) {
    let (vx, vy) = reflect_off_wall(wall, vx, vy);

    // Offset of the impact point from the paddle center, -1..=1 along
    // the paddle's length.
    let (impact, center, half_len) = if wall.is_vertical() {
        (ball_y, paddle.center_y(), paddle.h / 2)
    } else {
        (ball_x, paddle.center_x(), paddle.w / 2)
    };
    let t = ((impact - center) as f64 / half_len.max(1) as f64).clamp(-1.0, 1.0);
    let deflect = (config.paddle_angle_factor * t).round() as i32;

    let (mut perp, mut tang) = if wall.is_vertical() {
        (vx, vy)
    } else {
        (vy, vx)
    };
    tang += deflect;

    // A paddle moving with the ball's tangential direction speeds the
    // ball up; moving against it slows the ball down.
    let speed_sign = (paddle_step.signum() * tang.signum()) as f64;
    let scaled = (perp.abs() as f64 * (1.0 + config.paddle_speed_factor * speed_sign)).round();
    perp = perp.signum() * scaled as i32;

    let (min, max) = (config.min_ball_velocity, config.max_ball_velocity);
    let perp = clamp_component(perp, min, max);
    let tang = clamp_component(tang, min, max);

    if wall.is_vertical() {
        (perp, tang)
    } else {
        (tang, perp)
    }
}
