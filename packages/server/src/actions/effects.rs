//! Applies status effects and kills to seats.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::action::{EffectDuration, EffectSpec, EffectTarget, StatusKind};
use crate::models::game::Game;
use crate::models::seat::StatusEffect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillOutcome {
    Killed,
    Protected,
    AlreadyDead,
    NoSuchSeat,
}

/// Seats an effect lands on.
pub fn resolve_recipients(
    target: &EffectTarget,
    game: &Game,
    acting_seat: Option<&str>,
    targets: &[String],
) -> Vec<String> {
    match target {
        EffectTarget::Targets => targets.to_vec(),
        EffectTarget::Actor => acting_seat.map(|s| vec![s.to_string()]).unwrap_or_default(),
        EffectTarget::Role(character_id) => game
            .player_seats()
            .into_iter()
            .filter(|s| s.holds(character_id))
            .map(|s| s.id.clone())
            .collect(),
    }
}

/// Puts `kind` on a seat, replacing any earlier effect of the same kind.
pub fn apply_status(
    game: &mut Game,
    seat_id: &str,
    kind: StatusKind,
    source_seat: Option<&str>,
    related_seat: Option<&str>,
    duration: EffectDuration,
) -> bool {
    let day = game.day;
    let Some(seat) = game.seat_mut(seat_id) else {
        return false;
    };
    seat.status_effects.retain(|e| e.kind != kind);
    seat.status_effects.push(StatusEffect {
        kind,
        source_seat: source_seat.map(str::to_string),
        related_seat: related_seat.map(str::to_string),
        duration,
        applied_day: day,
    });
    debug!(seat_id, status = %kind, ?duration, "status applied");
    true
}

/// Applies every effect spec and returns the seats that received something.
pub fn apply_effects(
    game: &mut Game,
    effects: &[EffectSpec],
    acting_seat: Option<&str>,
    targets: &[String],
) -> Vec<String> {
    let mut touched = Vec::new();
    for effect in effects {
        let related = match effect.target {
            EffectTarget::Actor => targets.first().map(String::as_str),
            _ => None,
        };
        for seat_id in resolve_recipients(&effect.target, game, acting_seat, targets) {
            if apply_status(game, &seat_id, effect.status, acting_seat, related, effect.duration)
                && !touched.contains(&seat_id)
            {
                touched.push(seat_id);
            }
        }
    }
    touched
}

pub fn kill(game: &mut Game, seat_id: &str) -> KillOutcome {
    let Some(seat) = game.seat_mut(seat_id) else {
        return KillOutcome::NoSuchSeat;
    };
    if !seat.is_alive {
        return KillOutcome::AlreadyDead;
    }
    if seat.has_status(StatusKind::Protected) {
        return KillOutcome::Protected;
    }
    seat.is_alive = false;
    KillOutcome::Killed
}
