use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::{EffectDuration, StatusKind};
use super::character::Alignment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub source_seat: Option<String>,
    /// Second seat the effect refers to, e.g. a butler's master.
    pub related_seat: Option<String>,
    pub duration: EffectDuration,
    pub applied_day: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum JournalKind {
    /// Ability information only this seat receives.
    Private,
    /// Storyteller notes kept on the seat.
    Storyteller,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: String,
    pub day: u32,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub kind: JournalKind,
}

impl JournalEntry {
    pub fn new(day: u32, content: String, kind: JournalKind) -> Self {
        JournalEntry {
            entry_id: uuid::Uuid::new_v4().to_string(),
            day,
            content,
            timestamp: Utc::now(),
            kind,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Seat {
    pub id: String,
    pub player_id: Option<String>,
    pub is_npc: bool,
    pub position: u32,
    pub role: Option<String>,
    pub alignment: Option<Alignment>,
    pub is_alive: bool,
    pub voting_power: u32,
    pub status_effects: Vec<StatusEffect>,
    pub journal: Vec<JournalEntry>,
}

impl Seat {
    pub fn new(id: String, player_id: Option<String>, is_npc: bool, position: u32) -> Self {
        Self {
            id,
            player_id,
            is_npc,
            position,
            role: None,
            alignment: None,
            is_alive: true,
            voting_power: 1,
            status_effects: Vec::new(),
            journal: Vec::new(),
        }
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.status_effects.iter().any(|e| e.kind == kind)
    }

    pub fn status(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.status_effects.iter().find(|e| e.kind == kind)
    }

    /// Poisoned or drunk: the seat's ability misfires.
    pub fn is_impaired(&self) -> bool {
        self.status_effects.iter().any(|e| e.kind.impairs())
    }

    pub fn is_evil(&self) -> bool {
        self.alignment == Some(Alignment::Evil)
    }

    pub fn holds(&self, character_id: &str) -> bool {
        self.role.as_deref() == Some(character_id)
    }

    pub fn write_journal(&mut self, day: u32, content: String, kind: JournalKind) {
        self.journal.push(JournalEntry::new(day, content, kind));
    }
}
