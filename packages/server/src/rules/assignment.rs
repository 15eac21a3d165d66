//! Handing characters to seats, either from a finalized setup pool or directly.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use super::distribution::base_distribution;
use crate::error::GameError;
use crate::models::character::{Alignment, Team};
use crate::models::game::{Game, GrimoirePosition};
use crate::models::script::Script;

/// Team fill order for random assignment.
const ASSIGN_ORDER: [Team; 4] = [Team::Demon, Team::Minion, Team::Outsider, Team::Townsfolk];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub seat_id: String,
    pub character_id: String,
    pub alignment: Alignment,
}

fn assignment_error(message: impl Into<String>) -> GameError {
    GameError::RoleAssignment(message.into())
}

/// Writes roles, alignments and grimoire positions. Only called once every
/// assignment has been computed, so failures never leave partial state behind.
fn apply(game: &mut Game, assignments: &[RoleAssignment]) {
    for assignment in assignments {
        if let Some(seat) = game.seat_mut(&assignment.seat_id) {
            seat.role = Some(assignment.character_id.clone());
            seat.alignment = Some(assignment.alignment);
        }
    }
    game.grimoire.positions = game
        .player_seats()
        .iter()
        .filter_map(|seat| {
            Some(GrimoirePosition {
                seat_id: seat.id.clone(),
                position: seat.position,
                character_id: seat.role.clone()?,
            })
        })
        .collect();
    info!(
        game_id = %game.id,
        seats = assignments.len(),
        "roles assigned"
    );
}

/// Shuffles the finalized setup pool and deals it 1:1 to seats in seat order.
pub fn assign_roles_from_setup(
    game: &mut Game,
    script: &Script,
) -> Result<Vec<RoleAssignment>, GameError> {
    let pool = game
        .setup
        .as_ref()
        .map(|s| s.character_pool.clone())
        .unwrap_or_default();
    if pool.is_empty() {
        return Err(assignment_error("character pool is empty"));
    }

    let seat_ids = game.player_seat_ids();
    if pool.len() != seat_ids.len() {
        return Err(assignment_error(format!(
            "character pool has {} entries for {} seats",
            pool.len(),
            seat_ids.len()
        )));
    }

    let mut teams = Vec::with_capacity(pool.len());
    for id in &pool {
        match script.team_of(id) {
            Some(team) => teams.push((id.clone(), team)),
            None => {
                return Err(assignment_error(format!(
                    "character {} is not on script {}",
                    id, script.id
                )))
            }
        }
    }

    let mut rng = game.next_rng();
    teams.shuffle(&mut rng);

    let assignments: Vec<RoleAssignment> = seat_ids
        .into_iter()
        .zip(teams)
        .map(|(seat_id, (character_id, team))| RoleAssignment {
            seat_id,
            character_id,
            alignment: team.alignment(),
        })
        .collect();
    apply(game, &assignments);
    Ok(assignments)
}

/// Direct assignment without a setup pool. Honors lobby claims, then fills the
/// remaining seats demon first, then minion, outsider and townsfolk.
pub fn assign_roles(
    game: &mut Game,
    script: &Script,
    selected: Option<&[String]>,
) -> Result<Vec<RoleAssignment>, GameError> {
    let seat_ids = game.player_seat_ids();
    let players = seat_ids.len();
    let bounds = script.meta.player_count;
    if !bounds.contains(players) {
        return Err(assignment_error(format!(
            "{} players is outside the script's {}-{} range",
            players, bounds.min, bounds.max
        )));
    }

    if let Some(selected) = selected {
        let unknown: Vec<String> = selected
            .iter()
            .filter(|id| !script.contains(id))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(GameError::UnknownCharacters(unknown));
        }
    }
    let allowed = |id: &str| selected.map_or(true, |s| s.iter().any(|x| x == id));

    let mut remaining = base_distribution(players);
    let mut assignments = Vec::with_capacity(players);
    let mut claimed: HashSet<String> = HashSet::new();

    for seat_id in &seat_ids {
        let Some(character_id) = game.role_claims.get(seat_id) else {
            continue;
        };
        let team = script
            .team_of(character_id)
            .ok_or_else(|| GameError::UnknownCharacters(vec![character_id.clone()]))?;
        if !allowed(character_id.as_str()) {
            return Err(assignment_error(format!(
                "claimed character {} is not in the selection",
                character_id
            )));
        }
        if !claimed.insert(character_id.clone()) {
            return Err(assignment_error(format!(
                "character {} is claimed more than once",
                character_id
            )));
        }
        match remaining.slot_mut(team) {
            Some(slot) if *slot > 0 => *slot -= 1,
            _ => {
                return Err(assignment_error(format!(
                    "no {} slot left for claimed character {}",
                    team, character_id
                )))
            }
        }
        assignments.push(RoleAssignment {
            seat_id: seat_id.clone(),
            character_id: character_id.clone(),
            alignment: team.alignment(),
        });
    }

    let mut open_seats: Vec<String> = seat_ids
        .iter()
        .filter(|id| !game.role_claims.contains_key(*id))
        .cloned()
        .collect();
    if open_seats.len() as u32 != remaining.total() {
        return Err(assignment_error(format!(
            "{} unclaimed seats but {} characters to deal",
            open_seats.len(),
            remaining.total()
        )));
    }

    let mut rng = game.next_rng();
    open_seats.shuffle(&mut rng);
    let mut seats = open_seats.into_iter();

    for team in ASSIGN_ORDER {
        let need = remaining.get(team) as usize;
        let mut pool: Vec<&str> = script
            .characters_of(team)
            .map(|c| c.id.as_str())
            .filter(|id| allowed(*id) && !claimed.contains(*id))
            .collect();
        if pool.len() < need {
            return Err(assignment_error(format!(
                "need {} {} but only {} available",
                need,
                team,
                pool.len()
            )));
        }
        pool.shuffle(&mut rng);
        for character_id in pool.into_iter().take(need) {
            let Some(seat_id) = seats.next() else {
                break;
            };
            assignments.push(RoleAssignment {
                seat_id,
                character_id: character_id.to_string(),
                alignment: team.alignment(),
            });
        }
    }

    apply(game, &assignments);
    Ok(assignments)
}
