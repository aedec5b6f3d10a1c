//! The ball entity actor.
//!
//! A ball actor owns the ball's dynamic fields — velocity, mass, radius,
//! phasing — and applies the commands the game room issues during
//! collision resolution. Every applied command echoes a
//! [`BallStateUpdate`] back to the room, which keeps the room's cache
//! the single source for integration while the actor remains the field
//! owner.
//!
//! Phasing clears itself: `SetPhasing` schedules a delayed
//! `ClearPhasing` carrying a generation number, so a clear scheduled
//! before a re-collision cannot cut the newer phase short.

use std::time::Duration;

use quadpong_actor::{Actor, Addr, Context};
use quadpong_transport::Connection;

use crate::physics::{self, Axis};
use crate::room::RoomMsg;

/// Commands a ball actor accepts.
#[derive(Debug)]
pub enum BallMsg {
    /// Negate the velocity component on the given axis.
    ReflectOnAxis(Axis),
    /// Overwrite the velocity.
    SetVelocity { vx: i32, vy: i32 },
    /// Enter phasing for the given duration.
    SetPhasing(Duration),
    /// Internal: end the phase started with generation `seq`.
    ClearPhasing { seq: u64 },
    /// Grow mass and radius (IncreaseMass powerup).
    AdjustMass { mass_delta: f64, radius_delta: i32 },
    /// Multiply the velocity, clamped (IncreaseVelocity powerup).
    ScaleVelocity(f64),
}

/// State echo sent to the game room after every applied command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallStateUpdate {
    pub id: u64,
    pub vx: i32,
    pub vy: i32,
    pub radius: i32,
    pub phasing: bool,
}

/// The actor. One per ball; stopped on removal or room teardown.
pub struct BallActor<C: Connection> {
    id: u64,
    vx: i32,
    vy: i32,
    mass: f64,
    radius: i32,
    phasing: bool,
    phase_seq: u64,
    min_velocity: i32,
    max_velocity: i32,
    room: Addr<RoomMsg<C>>,
}

impl<C: Connection> BallActor<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        vx: i32,
        vy: i32,
        mass: f64,
        radius: i32,
        min_velocity: i32,
        max_velocity: i32,
        room: Addr<RoomMsg<C>>,
    ) -> Self {
        Self {
            id,
            vx,
            vy,
            mass,
            radius,
            phasing: false,
            phase_seq: 0,
            min_velocity,
            max_velocity,
            room,
        }
    }

    fn echo(&self) {
        self.room.send(RoomMsg::BallChanged(BallStateUpdate {
            id: self.id,
            vx: self.vx,
            vy: self.vy,
            radius: self.radius,
            phasing: self.phasing,
        }));
    }

    fn clamp(&self, v: i32) -> i32 {
        physics::clamp_component(v, self.min_velocity, self.max_velocity)
    }
}

impl<C: Connection> Actor for BallActor<C> {
    type Msg = BallMsg;

    async fn handle(&mut self, ctx: &mut Context<Self::Msg>, msg: Self::Msg) {
        match msg {
            BallMsg::ReflectOnAxis(axis) => {
                let (vx, vy) = physics::reflect_on_axis(axis, self.vx, self.vy);
                self.vx = vx;
                self.vy = vy;
                self.echo();
            }
            BallMsg::SetVelocity { vx, vy } => {
                self.vx = self.clamp(vx);
                self.vy = self.clamp(vy);
                self.echo();
            }
            BallMsg::SetPhasing(duration) => {
                self.phasing = true;
                self.phase_seq += 1;
                let seq = self.phase_seq;
                let me = ctx.addr();
                tokio::spawn(async move {
                    tokio::time::sleep(duration).await;
                    me.send(BallMsg::ClearPhasing { seq });
                });
                self.echo();
            }
            BallMsg::ClearPhasing { seq } => {
                // A stale clear belongs to a phase that was re-armed.
                if seq == self.phase_seq && self.phasing {
                    self.phasing = false;
                    self.echo();
                }
            }
            BallMsg::AdjustMass {
                mass_delta,
                radius_delta,
            } => {
                self.mass += mass_delta;
                self.radius = (self.radius + radius_delta).max(1);
                self.echo();
            }
            BallMsg::ScaleVelocity(factor) => {
                self.vx = self.clamp((self.vx as f64 * factor).round() as i32);
                self.vy = self.clamp((self.vy as f64 * factor).round() as i32);
                self.echo();
            }
        }
    }
}
