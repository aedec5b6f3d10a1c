//! Message types for the quadpong wire format.
//!
//! The JSON shapes here are a contract with client code: `messageType`
//! tags select the variant, field names are camelCase, and ball
//! ownership travels as a slot index with `-1` meaning ownerless. The
//! tests at the bottom pin the exact shapes.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Paddle steering intents, exactly as clients send them.
///
/// On a vertical paddle (left/right walls) `ArrowLeft` means up and
/// `ArrowRight` means down; on a horizontal paddle they mean left and
/// right. `Stop` zeroes the paddle velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputDirection {
    ArrowLeft,
    ArrowRight,
    Stop,
}

/// The only message clients send: `{"direction": "ArrowLeft"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInput {
    pub direction: InputDirection,
}

// ---------------------------------------------------------------------------
// Ball ownership wire encoding
// ---------------------------------------------------------------------------

/// Serde adapter: `Option<u8>` ownership ⇄ slot index with `-1` for
/// ownerless, which is what clients expect.
pub mod owner_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(owner: &Option<u8>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_i32(owner.map(i32::from).unwrap_or(-1))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u8>, D::Error> {
        let raw = i32::deserialize(de)?;
        if raw < 0 {
            Ok(None)
        } else {
            Ok(Some(raw as u8))
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One occupied player slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Slot index: 0 = right wall, 1 = top, 2 = left, 3 = bottom.
    pub index: u8,
    pub color: String,
    pub score: i32,
    pub connected: bool,
}

/// One paddle as an axis-aligned rectangle on its wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaddleState {
    pub index: u8,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub is_moving: bool,
}

/// One ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallState {
    pub id: u64,
    pub x: i32,
    pub y: i32,
    pub vx: i32,
    pub vy: i32,
    pub radius: i32,
    #[serde(with = "owner_index")]
    pub owner: Option<u8>,
    pub permanent: bool,
    pub phasing: bool,
}

/// What a grid cell currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Brick,
    Empty,
}

/// One cell of the brick grid, as shipped in `fullGridUpdate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellState {
    pub col: usize,
    pub row: usize,
    #[serde(rename = "type")]
    pub kind: CellKind,
    pub life: u32,
    /// Initial life; determines the score awarded when the brick breaks.
    pub level: u32,
}

/// A (slot, score) pair in `finalScores`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub player_index: u8,
    pub score: i32,
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameOverReason {
    BricksCleared,
}

// ---------------------------------------------------------------------------
// Delta updates
// ---------------------------------------------------------------------------

/// One tagged delta record inside a `gameUpdates` batch.
///
/// The game actor buffers these during physics ticks and the broadcaster
/// ships the buffer at the broadcast rate. Applying the stream of deltas
/// on top of the initial snapshot reconstructs the server's cached world
/// state (modulo the transient `collided` flags).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "messageType", rename_all = "camelCase")]
pub enum Update {
    #[serde(rename_all = "camelCase")]
    PlayerJoined { player: PlayerState },

    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_index: u8 },

    #[serde(rename_all = "camelCase")]
    PaddlePositionUpdate {
        player_index: u8,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        is_moving: bool,
        collided: bool,
    },

    #[serde(rename_all = "camelCase")]
    BallPositionUpdate {
        id: u64,
        x: i32,
        y: i32,
        vx: i32,
        vy: i32,
        radius: i32,
        collided: bool,
        phasing: bool,
        #[serde(with = "owner_index")]
        owner: Option<u8>,
    },

    #[serde(rename_all = "camelCase")]
    BallOwnershipChange {
        id: u64,
        #[serde(with = "owner_index")]
        owner: Option<u8>,
    },

    #[serde(rename_all = "camelCase")]
    BallSpawned { ball: BallState },

    #[serde(rename_all = "camelCase")]
    BallRemoved { id: u64 },

    #[serde(rename_all = "camelCase")]
    ScoreUpdate { player_index: u8, score: i32 },

    /// Authoritative grid refresh. Brick damage is never sent as an
    /// individual delta; clients learn about it here.
    #[serde(rename_all = "camelCase")]
    FullGridUpdate {
        cols: usize,
        rows: usize,
        cells: Vec<CellState>,
    },

    #[serde(rename_all = "camelCase")]
    GameOver {
        reason: GameOverReason,
        final_scores: Vec<ScoreEntry>,
    },
}

// ---------------------------------------------------------------------------
// Outbound envelope
// ---------------------------------------------------------------------------

/// Every server→client message, tagged with `messageType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "messageType", rename_all = "camelCase")]
pub enum ServerMessage {
    /// First message after joining: which slot the client occupies.
    #[serde(rename_all = "camelCase")]
    PlayerAssignment { player_index: u8 },

    /// Second message: full snapshot of who and what is in the room.
    #[serde(rename_all = "camelCase")]
    InitialPlayersAndBallsState {
        players: Vec<PlayerState>,
        paddles: Vec<PaddleState>,
        balls: Vec<BallState>,
    },

    /// One broadcast batch: buffered deltas plus a grid refresh.
    #[serde(rename_all = "camelCase")]
    GameUpdates { updates: Vec<Update> },

    /// Terminal message; the connection is closed after delivery.
    #[serde(rename_all = "camelCase")]
    GameOver {
        reason: GameOverReason,
        final_scores: Vec<ScoreEntry>,
    },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire shapes are a contract with client SDKs; these tests pin
    //! the exact JSON produced by the serde attributes.

    use super::*;

    fn ball(owner: Option<u8>) -> BallState {
        BallState {
            id: 3,
            x: 100,
            y: 200,
            vx: 4,
            vy: -3,
            radius: 10,
            owner,
            permanent: true,
            phasing: false,
        }
    }

    // =====================================================================
    // Inbound
    // =====================================================================

    #[test]
    fn test_client_input_parses_arrow_left() {
        let input: ClientInput = serde_json::from_str(r#"{"direction":"ArrowLeft"}"#).unwrap();
        assert_eq!(input.direction, InputDirection::ArrowLeft);
    }

    #[test]
    fn test_client_input_parses_all_directions() {
        for (raw, expected) in [
            ("ArrowLeft", InputDirection::ArrowLeft),
            ("ArrowRight", InputDirection::ArrowRight),
            ("Stop", InputDirection::Stop),
        ] {
            let json = format!(r#"{{"direction":"{raw}"}}"#);
            let input: ClientInput = serde_json::from_str(&json).unwrap();
            assert_eq!(input.direction, expected);
        }
    }

    #[test]
    fn test_client_input_rejects_unknown_direction() {
        let result: Result<ClientInput, _> =
            serde_json::from_str(r#"{"direction":"ArrowUp"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_input_rejects_garbage() {
        let result: Result<ClientInput, _> = serde_json::from_slice(b"not json");
        assert!(result.is_err());
    }

    // =====================================================================
    // Ownership encoding
    // =====================================================================

    #[test]
    fn test_owned_ball_serializes_owner_as_index() {
        let json: serde_json::Value = serde_json::to_value(ball(Some(2))).unwrap();
        assert_eq!(json["owner"], 2);
    }

    #[test]
    fn test_ownerless_ball_serializes_owner_as_minus_one() {
        let json: serde_json::Value = serde_json::to_value(ball(None)).unwrap();
        assert_eq!(json["owner"], -1);
    }

    #[test]
    fn test_owner_minus_one_deserializes_to_none() {
        let json = serde_json::to_string(&ball(None)).unwrap();
        let decoded: BallState = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.owner, None);
    }

    #[test]
    fn test_ball_state_round_trip() {
        for owner in [None, Some(0), Some(3)] {
            let original = ball(owner);
            let bytes = serde_json::to_vec(&original).unwrap();
            let decoded: BallState = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(original, decoded);
        }
    }

    // =====================================================================
    // Tag shapes
    // =====================================================================

    #[test]
    fn test_player_assignment_json_shape() {
        let msg = ServerMessage::PlayerAssignment { player_index: 0 };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["messageType"], "playerAssignment");
        assert_eq!(json["playerIndex"], 0);
    }

    #[test]
    fn test_initial_state_json_shape() {
        let msg = ServerMessage::InitialPlayersAndBallsState {
            players: vec![PlayerState {
                index: 0,
                color: "#ff4757".into(),
                score: 0,
                connected: true,
            }],
            paddles: vec![PaddleState {
                index: 0,
                x: 788,
                y: 340,
                width: 12,
                height: 120,
                is_moving: false,
            }],
            balls: vec![ball(Some(0))],
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["messageType"], "initialPlayersAndBallsState");
        assert_eq!(json["players"][0]["color"], "#ff4757");
        assert_eq!(json["paddles"][0]["isMoving"], false);
        assert_eq!(json["balls"][0]["owner"], 0);
    }

    #[test]
    fn test_game_updates_json_shape() {
        let msg = ServerMessage::GameUpdates {
            updates: vec![Update::ScoreUpdate {
                player_index: 1,
                score: -2,
            }],
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["messageType"], "gameUpdates");
        assert_eq!(json["updates"][0]["messageType"], "scoreUpdate");
        assert_eq!(json["updates"][0]["score"], -2);
    }

    #[test]
    fn test_game_over_json_shape() {
        let msg = ServerMessage::GameOver {
            reason: GameOverReason::BricksCleared,
            final_scores: vec![ScoreEntry {
                player_index: 0,
                score: 12,
            }],
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["messageType"], "gameOver");
        assert_eq!(json["reason"], "bricksCleared");
        assert_eq!(json["finalScores"][0]["playerIndex"], 0);
    }

    #[test]
    fn test_update_tags_are_stable() {
        let cases: Vec<(Update, &str)> = vec![
            (
                Update::PlayerLeft { player_index: 2 },
                "playerLeft",
            ),
            (
                Update::PaddlePositionUpdate {
                    player_index: 0,
                    x: 788,
                    y: 350,
                    width: 12,
                    height: 120,
                    is_moving: true,
                    collided: false,
                },
                "paddlePositionUpdate",
            ),
            (
                Update::BallPositionUpdate {
                    id: 1,
                    x: 10,
                    y: 20,
                    vx: 3,
                    vy: 4,
                    radius: 10,
                    collided: true,
                    phasing: true,
                    owner: None,
                },
                "ballPositionUpdate",
            ),
            (
                Update::BallOwnershipChange { id: 1, owner: Some(3) },
                "ballOwnershipChange",
            ),
            (Update::BallRemoved { id: 9 }, "ballRemoved"),
        ];
        for (update, tag) in cases {
            let json: serde_json::Value = serde_json::to_value(&update).unwrap();
            assert_eq!(json["messageType"], tag, "tag for {update:?}");
        }
    }

    #[test]
    fn test_full_grid_update_cell_shape() {
        let update = Update::FullGridUpdate {
            cols: 2,
            rows: 1,
            cells: vec![
                CellState {
                    col: 0,
                    row: 0,
                    kind: CellKind::Brick,
                    life: 2,
                    level: 3,
                },
                CellState {
                    col: 1,
                    row: 0,
                    kind: CellKind::Empty,
                    life: 0,
                    level: 1,
                },
            ],
        };
        let json: serde_json::Value = serde_json::to_value(&update).unwrap();
        assert_eq!(json["messageType"], "fullGridUpdate");
        assert_eq!(json["cells"][0]["type"], "brick");
        assert_eq!(json["cells"][1]["type"], "empty");
        assert_eq!(json["cells"][0]["life"], 2);
    }

    #[test]
    fn test_ball_spawned_carries_full_state() {
        let update = Update::BallSpawned { ball: ball(Some(1)) };
        let json: serde_json::Value = serde_json::to_value(&update).unwrap();
        assert_eq!(json["messageType"], "ballSpawned");
        assert_eq!(json["ball"]["permanent"], true);
        assert_eq!(json["ball"]["owner"], 1);
    }

    #[test]
    fn test_server_message_round_trip() {
        let msg = ServerMessage::GameUpdates {
            updates: vec![
                Update::BallRemoved { id: 4 },
                Update::GameOver {
                    reason: GameOverReason::BricksCleared,
                    final_scores: vec![],
                },
            ],
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: ServerMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }
}
