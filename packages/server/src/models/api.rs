use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::character::Alignment;
use super::game::{Game, GamePhase};
use crate::error::GameError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinRequest {
    pub player_id: Option<String>,
    #[serde(default)]
    pub is_npc: bool,
    /// Take the storyteller seat. Fails if one is already assigned.
    #[serde(default)]
    pub storyteller: bool,
}

impl JoinRequest {
    pub fn player(player_id: &str) -> Self {
        Self {
            player_id: Some(player_id.to_string()),
            ..Default::default()
        }
    }

    pub fn storyteller(player_id: &str) -> Self {
        Self {
            player_id: Some(player_id.to_string()),
            storyteller: true,
            ..Default::default()
        }
    }

    pub fn npc() -> Self {
        Self {
            is_npc: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameCreated {
    pub game_id: String,
    pub script_id: String,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseChange {
    pub from: GamePhase,
    pub to: GamePhase,
    pub day: u32,
    pub invariant_violations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatView {
    pub id: String,
    pub player_id: Option<String>,
    pub is_npc: bool,
    pub position: u32,
    pub is_alive: bool,
    pub voting_power: u32,
    pub is_storyteller: bool,
    pub role: Option<String>,
    pub alignment: Option<Alignment>,
}

/// A game as seen by one seat: hidden information is stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameView {
    pub game_id: String,
    pub script_id: String,
    pub phase: GamePhase,
    pub day: u32,
    pub storyteller_seat_id: Option<String>,
    pub seats: Vec<SeatView>,
    pub winner: Option<Alignment>,
}

impl GameView {
    pub fn for_viewer(game: &Game, viewer: Option<&str>) -> Self {
        let sees_all = viewer.map_or(false, |v| game.is_storyteller(v)) || game.winner.is_some();
        let mut seats: Vec<SeatView> = game
            .seats
            .iter()
            .map(|seat| {
                let visible = sees_all || viewer == Some(seat.id.as_str());
                SeatView {
                    id: seat.id.clone(),
                    player_id: seat.player_id.clone(),
                    is_npc: seat.is_npc,
                    position: seat.position,
                    is_alive: seat.is_alive,
                    voting_power: seat.voting_power,
                    is_storyteller: game.is_storyteller(&seat.id),
                    role: if visible { seat.role.clone() } else { None },
                    alignment: if visible { seat.alignment } else { None },
                }
            })
            .collect();
        seats.sort_by_key(|s| s.position);

        GameView {
            game_id: game.id.clone(),
            script_id: game.script_id.clone(),
            phase: game.phase,
            day: game.day,
            storyteller_seat_id: game.storyteller_seat_id.clone(),
            seats,
            winner: game.winner,
        }
    }
}

/// Wire shape of every command result: `{ok:true, data}` or `{ok:false, error, details?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl<T> From<Result<T, GameError>> for CommandResponse<T> {
    fn from(result: Result<T, GameError>) -> Self {
        match result {
            Ok(data) => CommandResponse {
                ok: true,
                data: Some(data),
                error: None,
                details: None,
            },
            Err(e) => CommandResponse {
                ok: false,
                data: None,
                error: Some(e.to_string()),
                details: e.details(),
            },
        }
    }
}
