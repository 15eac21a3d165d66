//! Structural checks over a script's character and action metadata.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::models::action::{ActionDefinition, ActionFamily, ActionPhase, ActionType};
use crate::models::character::{Character, Team};
use crate::models::script::{NightOrderEntry, Script};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The engine still runs; the character just does less than written.
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub character_id: Option<String>,
    pub action_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptValidationReport {
    pub script_id: String,
    pub characters_checked: usize,
    pub issues: Vec<ValidationIssue>,
    /// Standard meta actions the night order should contain but does not.
    pub missing_meta_actions: Vec<String>,
}

impl ScriptValidationReport {
    /// True when no issue is an error. Warnings and missing meta actions do not count.
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Script validation: {}", self.script_id);
        let _ = writeln!(
            out,
            "  {} characters checked, {} errors, {} warnings",
            self.characters_checked,
            self.errors().count(),
            self.warnings().count()
        );
        for issue in &self.issues {
            let tag = match issue.severity {
                Severity::Error => "ERROR",
                Severity::Warning => "WARN ",
            };
            let subject = match (&issue.character_id, &issue.action_id) {
                (Some(c), Some(a)) => format!("{}/{}", c, a),
                (Some(c), None) => c.clone(),
                (None, Some(a)) => a.clone(),
                (None, None) => "script".to_string(),
            };
            let _ = writeln!(out, "  [{}] {}: {}", tag, subject, issue.message);
        }
        for missing in &self.missing_meta_actions {
            let _ = writeln!(out, "  [MISSING] meta action {}", missing);
        }
        let verdict = if self.is_valid() { "OK" } else { "FAILED" };
        let _ = write!(out, "  Result: {}", verdict);
        out
    }
}

fn issue(
    severity: Severity,
    character_id: Option<&str>,
    action_id: Option<&str>,
    message: impl Into<String>,
) -> ValidationIssue {
    ValidationIssue {
        severity,
        character_id: character_id.map(str::to_string),
        action_id: action_id.filter(|a| !a.is_empty()).map(str::to_string),
        message: message.into(),
    }
}

fn check_action(
    action: &ActionDefinition,
    character_id: Option<&str>,
    expected: ActionFamily,
    issues: &mut Vec<ValidationIssue>,
) {
    let action_id = Some(action.id.as_str());
    let mut error = |message: String| {
        issues.push(issue(Severity::Error, character_id, action_id, message));
    };

    if action.id.trim().is_empty() {
        error("Action has no id".to_string());
    }
    match &action.action_type {
        ActionType::Unknown(raw) if raw.trim().is_empty() => error("Action has no type".to_string()),
        ActionType::Unknown(raw) => error(format!("Unknown action type {}", raw)),
        known if known.family() != expected => error(format!(
            "{} is not a {} action",
            known,
            match expected {
                ActionFamily::Character => "character",
                ActionFamily::Meta => "meta",
            }
        )),
        _ => {}
    }
    if action.description.trim().is_empty() {
        error("Action has no description".to_string());
    }
    if action.action_type.requires_targets() && action.targets.as_ref().map_or(true, |t| t.max == 0) {
        error("Action needs at least one target".to_string());
    }
    if let Some(targets) = &action.targets {
        if targets.min > targets.max {
            error(format!(
                "Target minimum {} exceeds maximum {}",
                targets.min, targets.max
            ));
        }
    }
    if let Some(info) = &action.information {
        if info.delivery.is_none() {
            error("Information has no delivery method".to_string());
        }
    }
}

fn check_character(character: &Character, issues: &mut Vec<ValidationIssue>) {
    let id = Some(character.id.as_str());
    let triggers = [
        (
            character.wakes_first_night(),
            ActionPhase::FirstNight,
            "first night",
            "firstNight",
        ),
        (
            character.wakes_other_nights(),
            ActionPhase::Night,
            "other nights",
            "night",
        ),
    ];
    for (wakes, phase, label, key) in triggers {
        let has_actions = !character.actions_for(phase).is_empty();
        if wakes && !has_actions {
            issues.push(issue(
                Severity::Warning,
                id,
                None,
                format!("Wakes on {} but has no {} actions", label, key),
            ));
        }
        if has_actions && !wakes {
            issues.push(issue(
                Severity::Warning,
                id,
                None,
                format!("Has {} actions but no {} precedence", key, label),
            ));
        }
    }

    for actions in character.actions.values() {
        for action in actions {
            check_action(action, id, ActionFamily::Character, issues);
        }
    }
}

/// Checks every character of the script, the meta actions in both night
/// orders, and whether the standard team-reveal meta actions are present.
/// `in_play` narrows the meta-action check to the characters actually selected.
pub fn validate_script(script: &Script, in_play: Option<&[String]>) -> ScriptValidationReport {
    let mut issues = Vec::new();
    for character in &script.characters {
        check_character(character, &mut issues);
    }

    for first_night in [true, false] {
        for entry in script.night_order(first_night) {
            match entry {
                NightOrderEntry::Meta(action) => {
                    check_action(&action, None, ActionFamily::Meta, &mut issues)
                }
                NightOrderEntry::Character(id) if !script.contains(&id) => issues.push(issue(
                    Severity::Warning,
                    Some(id.as_str()),
                    None,
                    "Night order names a character that is not on the script",
                )),
                NightOrderEntry::Character(_) => {}
            }
        }
    }

    let present = |team: Team| match in_play {
        Some(ids) => ids.iter().any(|id| script.team_of(id) == Some(team)),
        None => script.characters_of(team).next().is_some(),
    };
    let mut missing_meta_actions = Vec::new();
    if present(Team::Minion) && !script.has_meta_action(true, &ActionType::MinionInfo) {
        missing_meta_actions.push(ActionType::MinionInfo.to_string());
    }
    if present(Team::Demon) && !script.has_meta_action(true, &ActionType::DemonInfo) {
        missing_meta_actions.push(ActionType::DemonInfo.to_string());
    }

    ScriptValidationReport {
        script_id: script.id.clone(),
        characters_checked: script.characters.len(),
        issues,
        missing_meta_actions,
    }
}
