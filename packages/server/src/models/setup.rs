use serde::{Deserialize, Serialize};
use std::fmt;

use super::character::Team;

/// Number of characters per pool team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamCounts {
    pub townsfolk: u32,
    pub outsider: u32,
    pub minion: u32,
    pub demon: u32,
}

impl TeamCounts {
    pub fn new(townsfolk: u32, outsider: u32, minion: u32, demon: u32) -> Self {
        Self {
            townsfolk,
            outsider,
            minion,
            demon,
        }
    }

    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Townsfolk => self.townsfolk,
            Team::Outsider => self.outsider,
            Team::Minion => self.minion,
            Team::Demon => self.demon,
            Team::Traveller | Team::Fabled => 0,
        }
    }

    pub fn slot_mut(&mut self, team: Team) -> Option<&mut u32> {
        match team {
            Team::Townsfolk => Some(&mut self.townsfolk),
            Team::Outsider => Some(&mut self.outsider),
            Team::Minion => Some(&mut self.minion),
            Team::Demon => Some(&mut self.demon),
            Team::Traveller | Team::Fabled => None,
        }
    }

    pub fn total(&self) -> u32 {
        self.townsfolk + self.outsider + self.minion + self.demon
    }

    /// Adds a delta per team, saturating at zero.
    pub fn apply(&self, delta: &TeamDelta) -> TeamCounts {
        let shift = |base: u32, by: i32| (base as i64 + by as i64).max(0) as u32;
        TeamCounts {
            townsfolk: shift(self.townsfolk, delta.townsfolk),
            outsider: shift(self.outsider, delta.outsider),
            minion: shift(self.minion, delta.minion),
            demon: shift(self.demon, delta.demon),
        }
    }
}

impl fmt::Display for TeamCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} townsfolk / {} outsider / {} minion / {} demon",
            self.townsfolk, self.outsider, self.minion, self.demon
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDelta {
    pub townsfolk: i32,
    pub outsider: i32,
    pub minion: i32,
    pub demon: i32,
}

impl TeamDelta {
    pub fn sum(deltas: impl IntoIterator<Item = TeamDelta>) -> TeamDelta {
        deltas.into_iter().fold(TeamDelta::default(), |acc, d| TeamDelta {
            townsfolk: acc.townsfolk + d.townsfolk,
            outsider: acc.outsider + d.outsider,
            minion: acc.minion + d.minion,
            demon: acc.demon + d.demon,
        })
    }
}

/// A selected character's effect on the required distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterModification {
    pub character_id: String,
    pub delta: TeamDelta,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderToken {
    pub character_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetupState {
    pub selected_characters: Vec<String>,
    pub character_modifications: Vec<CharacterModification>,
    pub reminder_tokens: Vec<ReminderToken>,
    pub distribution_override: Option<TeamCounts>,
    /// Storyteller-facing notes from composition seeding.
    pub seed_notes: Vec<String>,
    pub is_validated: bool,
    pub character_pool: Vec<String>,
}

impl SetupState {
    pub fn modification_delta(&self) -> TeamDelta {
        TeamDelta::sum(self.character_modifications.iter().map(|m| m.delta))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub required: TeamCounts,
    pub actual: TeamCounts,
    pub player_count: usize,
}
