//! The paddle entity actor.
//!
//! A paddle actor owns exactly one field: its input-driven direction.
//! Position integration stays in the game room (single writer for all
//! positions); the actor's job is to absorb steering commands and echo
//! actual changes back, so repeated identical inputs cost nothing.

use quadpong_actor::{Actor, Addr, Context};
use quadpong_protocol::InputDirection;
use quadpong_transport::Connection;

use crate::room::RoomMsg;

/// Movement state along the paddle's wall axis. `Left` is up on
/// vertical paddles and left on horizontal ones; `Right` is down/right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddleDirection {
    Left,
    Right,
    #[default]
    Stopped,
}

impl From<InputDirection> for PaddleDirection {
    fn from(input: InputDirection) -> Self {
        match input {
            InputDirection::ArrowLeft => PaddleDirection::Left,
            InputDirection::ArrowRight => PaddleDirection::Right,
            InputDirection::Stop => PaddleDirection::Stopped,
        }
    }
}

impl PaddleDirection {
    /// Signed displacement per tick at the given speed.
    pub fn delta(self, velocity: i32) -> i32 {
        match self {
            PaddleDirection::Left => -velocity,
            PaddleDirection::Right => velocity,
            PaddleDirection::Stopped => 0,
        }
    }

    pub fn is_moving(self) -> bool {
        self != PaddleDirection::Stopped
    }
}

/// Commands a paddle actor accepts.
#[derive(Debug)]
pub enum PaddleMsg {
    SetDirection(PaddleDirection),
}

/// The actor. One per occupied slot, stopped when the player leaves.
pub struct PaddleActor<C: Connection> {
    slot: u8,
    direction: PaddleDirection,
    room: Addr<RoomMsg<C>>,
}

impl<C: Connection> PaddleActor<C> {
    pub fn new(slot: u8, room: Addr<RoomMsg<C>>) -> Self {
        Self {
            slot,
            direction: PaddleDirection::Stopped,
            room,
        }
    }
}

impl<C: Connection> Actor for PaddleActor<C> {
    type Msg = PaddleMsg;

    async fn handle(&mut self, _ctx: &mut Context<Self::Msg>, msg: Self::Msg) {
        match msg {
            PaddleMsg::SetDirection(direction) => {
                // Unchanged direction is not an event.
                if direction == self.direction {
                    return;
                }
                self.direction = direction;
                self.room.send(RoomMsg::PaddleChanged {
                    slot: self.slot,
                    direction,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadpong_actor::ActorSystem;
    use quadpong_transport::ConnectionId;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone)]
    struct NullConn;

    impl Connection for NullConn {
        type Error = std::io::Error;

        async fn send(&self, _data: &[u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
            Ok(None)
        }

        async fn close(&self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn id(&self) -> ConnectionId {
            ConnectionId::new(0)
        }
    }

    /// Collects the direction-change echoes a paddle actor emits.
    struct Probe {
        echoes: Arc<Mutex<Vec<PaddleDirection>>>,
    }

    impl Actor for Probe {
        type Msg = RoomMsg<NullConn>;

        async fn handle(&mut self, _ctx: &mut Context<Self::Msg>, msg: Self::Msg) {
            if let RoomMsg::PaddleChanged { direction, .. } = msg {
                self.echoes.lock().unwrap().push(direction);
            }
        }
    }

    #[tokio::test]
    async fn test_repeated_direction_echoes_once() {
        let system = ActorSystem::new();
        let echoes = Arc::new(Mutex::new(Vec::new()));
        let probe = system.spawn(Probe {
            echoes: Arc::clone(&echoes),
        });
        let paddle = system.spawn(PaddleActor::new(0, probe));

        // The same direction twice is one state change.
        paddle.send(PaddleMsg::SetDirection(PaddleDirection::Right));
        paddle.send(PaddleMsg::SetDirection(PaddleDirection::Right));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*echoes.lock().unwrap(), vec![PaddleDirection::Right]);

        // An actual change echoes again.
        paddle.send(PaddleMsg::SetDirection(PaddleDirection::Stopped));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(
            *echoes.lock().unwrap(),
            vec![PaddleDirection::Right, PaddleDirection::Stopped]
        );
    }

    #[test]
    fn test_direction_from_input() {
        assert_eq!(
            PaddleDirection::from(InputDirection::ArrowLeft),
            PaddleDirection::Left
        );
        assert_eq!(
            PaddleDirection::from(InputDirection::ArrowRight),
            PaddleDirection::Right
        );
        assert_eq!(
            PaddleDirection::from(InputDirection::Stop),
            PaddleDirection::Stopped
        );
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(PaddleDirection::Left.delta(6), -6);
        assert_eq!(PaddleDirection::Right.delta(6), 6);
        assert_eq!(PaddleDirection::Stopped.delta(6), 0);
    }
}
