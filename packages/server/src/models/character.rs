use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::action::{ActionPhase, CharacterAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Townsfolk,
    Outsider,
    Minion,
    Demon,
    Traveller,
    Fabled,
}

impl Team {
    /// Teams that occupy a seat through the character pool.
    pub const POOL_TEAMS: [Team; 4] = [Team::Townsfolk, Team::Outsider, Team::Minion, Team::Demon];

    pub fn alignment(&self) -> Alignment {
        match self {
            Team::Minion | Team::Demon => Alignment::Evil,
            _ => Alignment::Good,
        }
    }

    pub fn is_pool_team(&self) -> bool {
        Self::POOL_TEAMS.contains(self)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Townsfolk => write!(f, "townsfolk"),
            Team::Outsider => write!(f, "outsider"),
            Team::Minion => write!(f, "minion"),
            Team::Demon => write!(f, "demon"),
            Team::Traveller => write!(f, "traveller"),
            Team::Fabled => write!(f, "fabled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Good,
    Evil,
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alignment::Good => write!(f, "good"),
            Alignment::Evil => write!(f, "evil"),
        }
    }
}

/// A playable character as declared by a script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    pub team: Team,
    #[serde(default)]
    pub ability: String,
    /// Precedence on the first night. `0` or absent means the character does not wake.
    #[serde(default)]
    pub first_night: Option<u32>,
    #[serde(default)]
    pub other_night: Option<u32>,
    #[serde(default)]
    pub reminders: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub actions: BTreeMap<ActionPhase, Vec<CharacterAction>>,
}

impl Character {
    pub fn new(id: impl Into<String>, name: impl Into<String>, team: Team) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            team,
            ability: String::new(),
            first_night: None,
            other_night: None,
            reminders: Vec::new(),
            tags: Vec::new(),
            actions: BTreeMap::new(),
        }
    }

    pub fn alignment(&self) -> Alignment {
        self.team.alignment()
    }

    pub fn wakes_first_night(&self) -> bool {
        self.first_night.map_or(false, |n| n > 0)
    }

    pub fn wakes_other_nights(&self) -> bool {
        self.other_night.map_or(false, |n| n > 0)
    }

    pub fn night_precedence(&self, first_night: bool) -> Option<u32> {
        let value = if first_night {
            self.first_night
        } else {
            self.other_night
        };
        value.filter(|n| *n > 0)
    }

    pub fn actions_for(&self, phase: ActionPhase) -> &[CharacterAction] {
        self.actions.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_action(&self, phase: ActionPhase) -> Option<&CharacterAction> {
        self.actions_for(phase).first()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
