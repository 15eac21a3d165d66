use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::action::{ActionType, MetaAction};
use super::character::{Character, Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCountRange {
    pub min: usize,
    pub max: usize,
}

impl Default for PlayerCountRange {
    fn default() -> Self {
        Self { min: 5, max: 15 }
    }
}

impl PlayerCountRange {
    pub fn contains(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

/// A count expression from a composition policy: a literal, `p`, `p-N` or `p+N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountExpr {
    Literal(u32),
    Expr(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamCountExprs {
    pub townsfolk: Option<CountExpr>,
    pub outsider: Option<CountExpr>,
    pub minion: Option<CountExpr>,
    pub demon: Option<CountExpr>,
}

impl TeamCountExprs {
    pub fn get(&self, team: Team) -> Option<&CountExpr> {
        match team {
            Team::Townsfolk => self.townsfolk.as_ref(),
            Team::Outsider => self.outsider.as_ref(),
            Team::Minion => self.minion.as_ref(),
            Team::Demon => self.demon.as_ref(),
            Team::Traveller | Team::Fabled => None,
        }
    }
}

/// Player-count keyed team targets. Keys are exact counts (`"7"`) or ranges (`"7-9"`).
pub type CompositionPolicy = BTreeMap<String, TeamCountExprs>;

/// One step of a night order: either a character id or an inline meta action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NightOrderEntry {
    Character(String),
    Meta(MetaAction),
}

impl NightOrderEntry {
    pub fn label(&self) -> &str {
        match self {
            NightOrderEntry::Character(id) => id,
            NightOrderEntry::Meta(action) => &action.id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptMetadata {
    pub name: String,
    pub author: Option<String>,
    pub player_count: PlayerCountRange,
    pub composition: Option<CompositionPolicy>,
    pub first_night: Vec<NightOrderEntry>,
    pub other_night: Vec<NightOrderEntry>,
}

/// On-disk shape of a script file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptFile {
    pub meta: ScriptMetadata,
    pub characters: Vec<Character>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub id: String,
    pub meta: ScriptMetadata,
    pub characters: Vec<Character>,
}

impl Script {
    pub fn new(id: impl Into<String>, meta: ScriptMetadata, characters: Vec<Character>) -> Self {
        Self {
            id: id.into(),
            meta,
            characters,
        }
    }

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.character(id).is_some()
    }

    pub fn team_of(&self, id: &str) -> Option<Team> {
        self.character(id).map(|c| c.team)
    }

    pub fn characters_of(&self, team: Team) -> impl Iterator<Item = &Character> {
        self.characters.iter().filter(move |c| c.team == team)
    }

    /// Night order for the given night. Falls back to the characters' precedence
    /// numbers when the script does not declare an explicit list.
    pub fn night_order(&self, first_night: bool) -> Vec<NightOrderEntry> {
        let declared = if first_night {
            &self.meta.first_night
        } else {
            &self.meta.other_night
        };
        if !declared.is_empty() {
            return declared.clone();
        }

        let mut waking: Vec<(u32, &Character)> = self
            .characters
            .iter()
            .filter_map(|c| c.night_precedence(first_night).map(|n| (n, c)))
            .collect();
        waking.sort_by_key(|(n, _)| *n);
        waking
            .into_iter()
            .map(|(_, c)| NightOrderEntry::Character(c.id.clone()))
            .collect()
    }

    pub fn has_meta_action(&self, first_night: bool, action_type: &ActionType) -> bool {
        self.night_order(first_night).iter().any(|entry| {
            matches!(entry, NightOrderEntry::Meta(meta) if &meta.action_type == action_type)
        })
    }
}
