use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    GameCreated,
    PlayerJoined,
    PlayerLeft,
    RoleClaimed,
    SetupStarted,
    CharactersSelected,
    SetupValidated,
    SetupCompleted,
    RolesAssigned,
    PhaseChanged,
    InvariantViolation,
    NominationCreated,
    VoteStarted,
    VoteCast,
    VoteFinished,
    ExecutionOccurred,
    PlayerDied,
    NightChoiceSubmitted,
    AbilityUsed,
    ActionFailed,
    GameEnded,
}

/// Append-only audit record, relayed to clients by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: String,
    pub game_id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub actor_id: Option<String>,
    pub payload: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    game_id: String,
    events: Vec<GameEvent>,
}

impl EventLog {
    pub fn new(game_id: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            events: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        event_type: EventType,
        actor_id: Option<&str>,
        payload: Value,
    ) -> &GameEvent {
        self.events.push(GameEvent {
            id: uuid::Uuid::new_v4().to_string(),
            game_id: self.game_id.clone(),
            event_type,
            timestamp: Utc::now(),
            actor_id: actor_id.map(str::to_string),
            payload,
        });
        &self.events[self.events.len() - 1]
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn of_type(&self, event_type: EventType) -> impl Iterator<Item = &GameEvent> {
        self.events.iter().filter(move |e| e.event_type == event_type)
    }
}
