//! Team counts required for a player count, and the setup modifiers that shift them.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::models::setup::{CharacterModification, TeamCounts, TeamDelta};

/// Standard distribution for `players` seats (storyteller excluded).
pub fn base_distribution(players: usize) -> TeamCounts {
    let n = players as u32;
    match players {
        5 => TeamCounts::new(3, 0, 1, 1),
        6 => TeamCounts::new(3, 1, 1, 1),
        7..=9 => TeamCounts::new(n - 3, 0, 2, 1),
        10..=12 => TeamCounts::new(n - 4, 1, 2, 1),
        13..=15 => TeamCounts::new(n - 5, 2, 2, 1),
        _ => fallback_distribution(n),
    }
}

fn fallback_distribution(n: u32) -> TeamCounts {
    let past_four = n.saturating_sub(4);
    let minion = (past_four / 3).clamp(1, 2);
    let outsider = (past_four % 3).min(2);
    let townsfolk = n.saturating_sub(minion + outsider + 1).max(2);
    TeamCounts::new(townsfolk, outsider, minion, 1)
}

struct SetupModifier {
    delta: TeamDelta,
    description: &'static str,
}

/// Characters whose presence in the bag changes the required counts.
static SETUP_MODIFIERS: Lazy<HashMap<&'static str, SetupModifier>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        "baron",
        SetupModifier {
            delta: TeamDelta {
                townsfolk: -2,
                outsider: 2,
                ..Default::default()
            },
            description: "+2 outsiders / -2 townsfolk",
        },
    );
    table.insert(
        "godfather",
        SetupModifier {
            delta: TeamDelta {
                townsfolk: -1,
                outsider: 1,
                ..Default::default()
            },
            description: "+1 outsider / -1 townsfolk",
        },
    );
    table.insert(
        "fanggu",
        SetupModifier {
            delta: TeamDelta {
                townsfolk: -1,
                outsider: 1,
                ..Default::default()
            },
            description: "+1 outsider / -1 townsfolk",
        },
    );
    table.insert(
        "vigormortis",
        SetupModifier {
            delta: TeamDelta {
                townsfolk: 1,
                outsider: -1,
                ..Default::default()
            },
            description: "-1 outsider / +1 townsfolk",
        },
    );
    table
});

fn normalize(character_id: &str) -> String {
    character_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

pub fn setup_modification(character_id: &str) -> Option<CharacterModification> {
    SETUP_MODIFIERS
        .get(normalize(character_id).as_str())
        .map(|m| CharacterModification {
            character_id: character_id.to_string(),
            delta: m.delta,
            description: m.description.to_string(),
        })
}

pub fn modifications_for(selected: &[String]) -> Vec<CharacterModification> {
    selected
        .iter()
        .filter_map(|id| setup_modification(id))
        .collect()
}
