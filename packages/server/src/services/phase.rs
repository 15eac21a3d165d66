//! The phase graph: preconditions, side effects and the post-transition invariant check.

use serde_json::json;
use tracing::{info, warn};

use super::setup_service::initialize_setup;
use crate::error::GameError;
use crate::models::action::EffectDuration;
use crate::models::api::PhaseChange;
use crate::models::config::EngineConfig;
use crate::models::event::{EventLog, EventType};
use crate::models::game::{Game, GamePhase};
use crate::models::script::Script;
use crate::rules::assignment::{assign_roles_from_setup, RoleAssignment};

/// Rejects a transition whose preconditions do not hold. Never mutates.
pub fn check_preconditions(game: &Game, target: GamePhase) -> Result<(), GameError> {
    if !game.phase.can_transition_to(target) {
        return Err(GameError::InvalidTransition {
            from: game.phase,
            to: target,
        });
    }

    let failed = |reason: &str| -> Result<(), GameError> {
        Err(GameError::PreconditionFailed(reason.to_string()))
    };
    match (game.phase, target) {
        (GamePhase::Lobby, GamePhase::Setup) if game.storyteller_seat_id.is_none() => {
            failed("A storyteller must be assigned before setup")
        }
        (GamePhase::Setup, GamePhase::Night) => {
            let ready = game
                .setup
                .as_ref()
                .map_or(false, |s| s.is_validated && !s.character_pool.is_empty());
            if ready {
                Ok(())
            } else {
                failed("Setup must be validated with a non-empty character pool")
            }
        }
        (GamePhase::Day, GamePhase::Nomination)
            if game.current_vote.as_ref().map_or(false, |v| !v.finished) =>
        {
            failed("A vote is still in progress")
        }
        (GamePhase::Nomination, GamePhase::Vote)
            if !game.current_nomination.as_ref().map_or(false, |n| !n.closed) =>
        {
            failed("An open nomination is required before voting")
        }
        (GamePhase::Vote, GamePhase::Execution)
            if !game.current_vote.as_ref().map_or(false, |v| v.finished) =>
        {
            failed("The current vote must be finished")
        }
        _ => Ok(()),
    }
}

/// Moves `game` to `target`, applying the side effects of that edge and
/// recording `phase_changed` (plus `invariant_violation` when the check fails).
pub fn transition(
    game: &mut Game,
    events: &mut EventLog,
    script: &Script,
    target: GamePhase,
    config: &EngineConfig,
) -> Result<PhaseChange, GameError> {
    check_preconditions(game, target)?;
    let from = game.phase;

    // Role assignment can still fail, so it runs before anything else changes.
    let mut assigned: Vec<RoleAssignment> = Vec::new();
    if from == GamePhase::Setup && target == GamePhase::Night {
        let unassigned = game.player_seats().iter().any(|s| s.role.is_none());
        if unassigned {
            assigned = assign_roles_from_setup(game, script)?;
        }
    }

    match (from, target) {
        (GamePhase::Lobby, GamePhase::Setup) => {
            let setup = initialize_setup(game, script);
            let payload = json!({
                "selected_characters": setup.selected_characters,
                "distribution_override": setup.distribution_override,
                "seed_notes": setup.seed_notes,
            });
            events.record(EventType::SetupStarted, None, payload);
        }
        (GamePhase::Setup, GamePhase::Night) => {
            if !assigned.is_empty() {
                if config.show_player_roles {
                    for a in &assigned {
                        info!(seat_id = %a.seat_id, character = %a.character_id, "role assigned");
                    }
                }
                events.record(
                    EventType::RolesAssigned,
                    None,
                    json!({ "seats": assigned.len() }),
                );
            }
            game.day = game.day.max(1);
            game.grimoire.pending_choices.clear();
        }
        (GamePhase::Night, GamePhase::Day) => {
            game.expire_effects(EffectDuration::Tonight);
            game.grimoire.pending_choices.clear();
        }
        (GamePhase::Execution, GamePhase::Night) => {
            game.day += 1;
            game.executed_today = false;
            game.current_nomination = None;
            game.current_vote = None;
            game.nominations_today.clear();
            game.expire_effects(EffectDuration::UntilNextNight);
            game.grimoire.pending_choices.clear();
        }
        (_, GamePhase::End) => {
            if let Some(nomination) = game.current_nomination.as_mut() {
                nomination.closed = true;
            }
            for nomination in &mut game.nominations_today {
                nomination.closed = true;
            }
        }
        _ => {}
    }

    game.phase = target;
    let invariant_violations = game.check_invariants();
    let change = PhaseChange {
        from,
        to: target,
        day: game.day,
        invariant_violations,
    };

    info!(game_id = %game.id, %from, to = %target, day = game.day, "phase changed");
    events.record(
        EventType::PhaseChanged,
        None,
        json!({
            "from": from,
            "to": target,
            "day": game.day,
            "invariant_violations": change.invariant_violations,
        }),
    );
    if !change.invariant_violations.is_empty() {
        warn!(
            game_id = %game.id,
            violations = ?change.invariant_violations,
            "invariant violations after phase change"
        );
        events.record(
            EventType::InvariantViolation,
            None,
            json!({ "phase": target, "violations": change.invariant_violations }),
        );
    }
    Ok(change)
}
