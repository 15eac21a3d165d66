//! Seeding a character selection from a script's composition policy.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::distribution::base_distribution;
use crate::models::character::Team;
use crate::models::script::{CompositionPolicy, CountExpr, Script, TeamCountExprs};
use crate::models::setup::TeamCounts;

/// Order in which teams are filled.
const FILL_ORDER: [Team; 4] = [Team::Demon, Team::Minion, Team::Outsider, Team::Townsfolk];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupResolution {
    pub selection: Vec<String>,
    /// Per-team targets computed from the policy.
    pub targets: TeamCounts,
    /// Per-team counts of `selection`.
    pub counts: TeamCounts,
    pub notes: Vec<String>,
}

/// Evaluates `p`, `p-N`, `p+N` or a literal. Anything else is 0.
pub fn evaluate_count(expr: &CountExpr, players: usize) -> u32 {
    let p = players as i64;
    let value = match expr {
        CountExpr::Literal(n) => *n as i64,
        CountExpr::Expr(raw) => {
            let text: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            let parsed = if text == "p" {
                Some(p)
            } else if let Some(rest) = text.strip_prefix("p-") {
                rest.parse::<i64>().ok().map(|n| p - n)
            } else if let Some(rest) = text.strip_prefix("p+") {
                rest.parse::<i64>().ok().map(|n| p + n)
            } else {
                text.parse::<i64>().ok()
            };
            parsed.unwrap_or_else(|| {
                debug!(expression = %raw, "unsupported composition expression, using 0");
                0
            })
        }
    };
    value.max(0) as u32
}

fn parse_key(key: &str) -> Option<(usize, usize)> {
    match key.split_once('-') {
        Some((lo, hi)) => Some((lo.trim().parse().ok()?, hi.trim().parse().ok()?)),
        None => {
            let n = key.trim().parse().ok()?;
            Some((n, n))
        }
    }
}

/// Finds the policy entry for `players`: an exact key wins over a range.
pub fn composition_entry(policy: &CompositionPolicy, players: usize) -> Option<&TeamCountExprs> {
    let mut range_match = None;
    for (key, entry) in policy {
        match parse_key(key) {
            Some((lo, hi)) if lo == hi && lo == players => return Some(entry),
            Some((lo, hi)) if (lo..=hi).contains(&players) && range_match.is_none() => {
                range_match = Some(entry)
            }
            _ => {}
        }
    }
    range_match
}

pub fn composition_targets(policy: &CompositionPolicy, players: usize) -> Option<TeamCounts> {
    let entry = composition_entry(policy, players)?;
    let base = base_distribution(players);
    let mut targets = TeamCounts::default();
    for team in Team::POOL_TEAMS {
        let value = entry
            .get(team)
            .map(|expr| evaluate_count(expr, players))
            .unwrap_or_else(|| base.get(team));
        if let Some(slot) = targets.slot_mut(team) {
            *slot = value;
        }
    }
    Some(targets)
}

pub fn count_by_team(script: &Script, selection: &[String]) -> TeamCounts {
    let mut counts = TeamCounts::default();
    for team in selection.iter().filter_map(|id| script.team_of(id)) {
        if let Some(slot) = counts.slot_mut(team) {
            *slot += 1;
        }
    }
    counts
}

/// Adds unselected script characters, team by team in declaration order, until
/// each team reaches its target. Never removes anything from `selected`.
pub fn resolve_lineup(script: &Script, players: usize, selected: &[String]) -> LineupResolution {
    let mut notes = Vec::new();
    let targets = match script
        .meta
        .composition
        .as_ref()
        .and_then(|policy| composition_targets(policy, players))
    {
        Some(targets) => targets,
        None => {
            notes.push(format!(
                "No composition entry for {} players; using the base distribution",
                players
            ));
            base_distribution(players)
        }
    };

    let mut selection: Vec<String> = selected.to_vec();
    for team in FILL_ORDER {
        let target = targets.get(team);
        let mut have = count_by_team(script, &selection).get(team);
        if have >= target {
            continue;
        }
        let candidates: Vec<String> = script
            .characters_of(team)
            .filter(|c| !selection.contains(&c.id))
            .map(|c| c.id.clone())
            .collect();
        for id in candidates {
            if have >= target {
                break;
            }
            let name = script.character(&id).map_or(id.as_str(), |c| c.name.as_str());
            notes.push(format!(
                "Added {} ({}) toward {} {}",
                name, team, target, team
            ));
            selection.push(id);
            have += 1;
        }
        if have < target {
            notes.push(format!(
                "Only {} of {} {} available on this script",
                have, target, team
            ));
        }
    }

    let counts = count_by_team(script, &selection);
    LineupResolution {
        selection,
        targets,
        counts,
        notes,
    }
}
