use serde::{Deserialize, Serialize};
use std::fmt;

use super::character::Team;

/// Sub-phase an action belongs to, used as the key of a character's `actions` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionPhase {
    Setup,
    FirstNight,
    Night,
    Day,
    Passive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionFamily {
    /// Performed by one acting seat.
    Character,
    /// Script-wide, no acting seat.
    Meta,
}

/// Closed set of action types the registry knows how to resolve.
///
/// Anything else parses into `Unknown` so that scripts with newer content
/// still load; dispatching an unknown type yields a failed `ActionResult`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    EvilNeighborCount,
    EvilPairCount,
    ChoosePlayer,
    DetectDemon,
    ChooseMaster,
    Kill,
    Protect,
    Poison,
    VotingRestriction,
    MinionInfo,
    DemonInfo,
    Unknown(String),
}

impl ActionType {
    pub const KNOWN: [ActionType; 11] = [
        ActionType::EvilNeighborCount,
        ActionType::EvilPairCount,
        ActionType::ChoosePlayer,
        ActionType::DetectDemon,
        ActionType::ChooseMaster,
        ActionType::Kill,
        ActionType::Protect,
        ActionType::Poison,
        ActionType::VotingRestriction,
        ActionType::MinionInfo,
        ActionType::DemonInfo,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ActionType::EvilNeighborCount => "evil_neighbor_count",
            ActionType::EvilPairCount => "evil_pair_count",
            ActionType::ChoosePlayer => "choose_player",
            ActionType::DetectDemon => "detect_demon",
            ActionType::ChooseMaster => "choose_master",
            ActionType::Kill => "kill",
            ActionType::Protect => "protect",
            ActionType::Poison => "poison",
            ActionType::VotingRestriction => "voting_restriction",
            ActionType::MinionInfo => "minion_info",
            ActionType::DemonInfo => "demon_info",
            ActionType::Unknown(raw) => raw.as_str(),
        }
    }

    pub fn family(&self) -> ActionFamily {
        match self {
            ActionType::MinionInfo | ActionType::DemonInfo => ActionFamily::Meta,
            _ => ActionFamily::Character,
        }
    }

    /// Whether a well-formed definition of this type must allow at least one target.
    pub fn requires_targets(&self) -> bool {
        matches!(
            self,
            ActionType::ChoosePlayer
                | ActionType::DetectDemon
                | ActionType::ChooseMaster
                | ActionType::Kill
                | ActionType::Protect
                | ActionType::Poison
                | ActionType::VotingRestriction
        )
    }
}

impl Default for ActionType {
    fn default() -> Self {
        ActionType::Unknown(String::new())
    }
}

impl From<String> for ActionType {
    fn from(raw: String) -> Self {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::KNOWN
            .iter()
            .find(|known| known.as_str() == normalized)
            .cloned()
            .unwrap_or(ActionType::Unknown(raw))
    }
}

impl From<ActionType> for String {
    fn from(value: ActionType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraints on the seats an action may target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetSpec {
    pub min: usize,
    pub max: usize,
    pub allow_self: bool,
    pub allow_dead: bool,
    /// When non-empty, targets must hold a character of one of these teams.
    pub teams: Vec<Team>,
    /// When non-empty, targets must hold a character carrying one of these tags.
    pub tags: Vec<String>,
}

impl TargetSpec {
    pub fn exactly(count: usize) -> Self {
        Self {
            min: count,
            max: count,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Poisoned,
    Drunk,
    Protected,
    /// The carrier's votes are bound to the seat named in `related_seat`.
    Master,
    VoteRestricted,
}

impl StatusKind {
    pub fn impairs(&self) -> bool {
        matches!(self, StatusKind::Poisoned | StatusKind::Drunk)
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusKind::Poisoned => "poisoned",
            StatusKind::Drunk => "drunk",
            StatusKind::Protected => "protected",
            StatusKind::Master => "master",
            StatusKind::VoteRestricted => "vote_restricted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectDuration {
    /// Expires when night turns to day.
    #[default]
    Tonight,
    /// Expires when the next night begins.
    UntilNextNight,
    Permanent,
}

/// Which seat(s) an effect lands on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "role")]
pub enum EffectTarget {
    #[default]
    Targets,
    Actor,
    /// Whoever currently holds this character.
    Role(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectSpec {
    pub status: StatusKind,
    #[serde(default)]
    pub target: EffectTarget,
    #[serde(default)]
    pub duration: EffectDuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Told privately to the acting seat (or each recipient of a meta action).
    Private,
    /// Kept in the grimoire for the storyteller.
    Storyteller,
    Public,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InformationSpec {
    #[serde(default)]
    pub delivery: Option<DeliveryMethod>,
    #[serde(default)]
    pub template: String,
}

impl InformationSpec {
    /// Substitutes `{key}` placeholders. Unmatched placeholders are left as written.
    pub fn render(&self, values: &[(&str, String)]) -> String {
        values
            .iter()
            .fold(self.template.clone(), |text, (key, value)| {
                text.replace(&format!("{{{}}}", key), value)
            })
    }
}

/// A declared action. Character actions live in a character's `actions` map;
/// meta actions appear directly in a script's night order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub action_type: ActionType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub targets: Option<TargetSpec>,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
    #[serde(default)]
    pub information: Option<InformationSpec>,
}

pub type CharacterAction = ActionDefinition;
pub type MetaAction = ActionDefinition;

impl ActionDefinition {
    pub fn new(id: impl Into<String>, action_type: ActionType) -> Self {
        Self {
            id: id.into(),
            action_type,
            description: String::new(),
            targets: None,
            effects: Vec::new(),
            information: None,
        }
    }

    pub fn with_targets(mut self, targets: TargetSpec) -> Self {
        self.targets = Some(targets);
        self
    }

    pub fn with_information(mut self, delivery: DeliveryMethod, template: &str) -> Self {
        self.information = Some(InformationSpec {
            delivery: Some(delivery),
            template: template.to_string(),
        });
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// Information handed to one seat as the outcome of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformationDelivery {
    pub seat_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_id: String,
    pub success: bool,
    pub information: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deliveries: Vec<InformationDelivery>,
    /// Seats killed while resolving the action.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deaths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ActionResult {
    pub fn ok(action_id: &str) -> Self {
        Self {
            action_id: action_id.to_string(),
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(action_id: &str, error: impl Into<String>) -> Self {
        Self {
            action_id: action_id.to_string(),
            success: false,
            errors: vec![error.into()],
            ..Default::default()
        }
    }

    pub fn with_information(mut self, information: impl Into<String>) -> Self {
        self.information = Some(information.into());
        self
    }

    pub fn deliver(mut self, seat_id: &str, message: impl Into<String>) -> Self {
        self.deliveries.push(InformationDelivery {
            seat_id: seat_id.to_string(),
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_type_parses_known_and_unknown() {
        assert_eq!(ActionType::from("Evil-Neighbor-Count".to_string()), ActionType::EvilNeighborCount);
        assert_eq!(ActionType::from("kill".to_string()), ActionType::Kill);
        assert_eq!(
            ActionType::from("summon_dragon".to_string()),
            ActionType::Unknown("summon_dragon".to_string())
        );
        assert_eq!(ActionType::DemonInfo.family(), ActionFamily::Meta);
        assert_eq!(ActionType::Kill.family(), ActionFamily::Character);
    }

    #[test]
    fn definition_parses_with_defaults() {
        let json = r#"{
            "id": "monk_protect",
            "type": "protect",
            "description": "Protect a player from the demon",
            "targets": { "min": 1, "max": 1 },
            "effects": [{ "status": "protected" }]
        }"#;
        let action: ActionDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(action.action_type, ActionType::Protect);
        let targets = action.targets.unwrap();
        assert!(!targets.allow_self);
        assert_eq!(action.effects[0].duration, EffectDuration::Tonight);
        assert_eq!(action.effects[0].target, EffectTarget::Targets);
    }

    #[test]
    fn information_template_substitutes_placeholders() {
        let info = InformationSpec {
            delivery: Some(DeliveryMethod::Private),
            template: "{count} of your neighbours are {alignment}".to_string(),
        };
        let text = info.render(&[("count", "2".to_string())]);
        assert_eq!(text, "2 of your neighbours are {alignment}");
    }
}
