use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::action::TargetSpec;
use crate::models::game::Game;
use crate::models::script::Script;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetValidation {
    pub valid: bool,
    pub reason: Option<String>,
}

impl TargetValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn reject(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Checks chosen targets against a target specification.
/// The first violated constraint is reported.
pub fn validate_targets(
    spec: &TargetSpec,
    game: &Game,
    script: &Script,
    acting_seat: Option<&str>,
    targets: &[String],
) -> TargetValidation {
    if targets.len() < spec.min || targets.len() > spec.max {
        return TargetValidation::reject(format!(
            "Expected {}-{} targets, got {}",
            spec.min,
            spec.max,
            targets.len()
        ));
    }

    let mut seen = HashSet::new();
    for target in targets {
        if !seen.insert(target.as_str()) {
            return TargetValidation::reject(format!("Seat {} targeted twice", target));
        }
        let Some(seat) = game.seat(target) else {
            return TargetValidation::reject(format!("Seat {} does not exist", target));
        };
        if game.is_storyteller(target) {
            return TargetValidation::reject("The storyteller cannot be targeted");
        }
        if !spec.allow_dead && !seat.is_alive {
            return TargetValidation::reject(format!("Seat {} is dead", target));
        }
        if !spec.allow_self && acting_seat == Some(target.as_str()) {
            return TargetValidation::reject("Cannot target yourself");
        }

        let character = seat.role.as_deref().and_then(|id| script.character(id));
        if !spec.teams.is_empty() && !character.map_or(false, |c| spec.teams.contains(&c.team)) {
            return TargetValidation::reject(format!(
                "Seat {} is not on an allowed team",
                target
            ));
        }
        if !spec.tags.is_empty()
            && !character.map_or(false, |c| spec.tags.iter().any(|t| c.has_tag(t)))
        {
            return TargetValidation::reject(format!(
                "Seat {} does not carry an allowed tag",
                target
            ));
        }
    }

    TargetValidation::ok()
}
