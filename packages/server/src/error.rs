use serde_json::{json, Value};

use crate::models::game::GamePhase;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Script {0} not found")]
    NotFound(String),
    #[error("Failed to read script {id}: {source}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse script {id}: {source}")]
    Parse {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors returned by the public command surface. None of them leave
/// the game partially mutated.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Game not found")]
    GameNotFound(String),
    #[error("Seat not found")]
    SeatNotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Operation requires phase {expected} but game is in {actual}")]
    WrongPhase { expected: String, actual: GamePhase },
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: GamePhase, to: GamePhase },
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("Unknown characters")]
    UnknownCharacters(Vec<String>),
    #[error("Setup is invalid")]
    InvalidSetup(Vec<String>),
    #[error("Role assignment failed: {0}")]
    RoleAssignment(String),
    #[error("Nomination rejected: {0}")]
    NominationRejected(String),
    #[error("Already voted")]
    AlreadyVoted,
    #[error("Vote rejected: {0}")]
    VoteRejected(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Script unavailable: {0}")]
    Script(#[from] ScriptError),
}

impl GameError {
    pub fn wrong_phase(expected: impl Into<String>, actual: GamePhase) -> Self {
        GameError::WrongPhase {
            expected: expected.into(),
            actual,
        }
    }

    pub fn storyteller_only(operation: &str) -> Self {
        GameError::Unauthorized(format!("only the storyteller may {}", operation))
    }

    /// Structured context for the `details` field of a failed response.
    pub fn details(&self) -> Option<Value> {
        match self {
            GameError::GameNotFound(id) => Some(json!({ "game_id": id })),
            GameError::SeatNotFound(id) => Some(json!({ "seat_id": id })),
            GameError::WrongPhase { expected, actual } => {
                Some(json!({ "expected": expected, "actual": actual }))
            }
            GameError::InvalidTransition { from, to } => Some(json!({ "from": from, "to": to })),
            GameError::UnknownCharacters(ids) => Some(json!({ "unknown": ids })),
            GameError::InvalidSetup(errors) => Some(json!({ "errors": errors })),
            _ => None,
        }
    }
}
