use tracing::info;

use crate::actions::context::{seat_label, ActionContext};
use crate::actions::effects::{apply_effects, kill as kill_seat, KillOutcome};
use crate::models::action::{
    ActionDefinition, ActionResult, EffectDuration, EffectSpec, EffectTarget, StatusKind,
};
use crate::models::game::Game;

fn actor_impaired(ctx: &ActionContext<'_>, game: &Game) -> bool {
    ctx.actor()
        .and_then(|id| game.seat(id))
        .map_or(false, |s| s.is_impaired())
}

fn apply_with_default(
    action: &ActionDefinition,
    ctx: &ActionContext<'_>,
    game: &mut Game,
    default: EffectSpec,
) -> ActionResult {
    if actor_impaired(ctx, game) {
        return ActionResult::ok(&action.id).with_information("Actor is impaired; no effect");
    }
    let defaults = [default];
    let effects: &[EffectSpec] = if action.effects.is_empty() {
        &defaults
    } else {
        &action.effects
    };
    let touched = apply_effects(game, effects, ctx.actor(), &ctx.targets);
    let names: Vec<String> = touched.iter().map(|id| seat_label(game, id)).collect();
    ActionResult::ok(&action.id).with_information(format!("Affected: {}", names.join(", ")))
}

pub fn protect(action: &ActionDefinition, ctx: &ActionContext<'_>, game: &mut Game) -> ActionResult {
    apply_with_default(
        action,
        ctx,
        game,
        EffectSpec {
            status: StatusKind::Protected,
            target: EffectTarget::Targets,
            duration: EffectDuration::Tonight,
        },
    )
}

pub fn poison(action: &ActionDefinition, ctx: &ActionContext<'_>, game: &mut Game) -> ActionResult {
    apply_with_default(
        action,
        ctx,
        game,
        EffectSpec {
            status: StatusKind::Poisoned,
            target: EffectTarget::Targets,
            duration: EffectDuration::UntilNextNight,
        },
    )
}

/// Kills every target that is not protected. Declared effects are applied after the kills.
pub fn kill(action: &ActionDefinition, ctx: &ActionContext<'_>, game: &mut Game) -> ActionResult {
    if actor_impaired(ctx, game) {
        return ActionResult::ok(&action.id).with_information("Actor is impaired; no effect");
    }

    let mut result = ActionResult::ok(&action.id);
    let mut notes = Vec::new();
    for target in &ctx.targets {
        let label = seat_label(game, target);
        match kill_seat(game, target) {
            KillOutcome::Killed => {
                info!(game_id = %game.id, seat_id = %target, "seat killed");
                notes.push(format!("{} died", label));
                result.deaths.push(target.clone());
            }
            KillOutcome::Protected => notes.push(format!("{} was protected", label)),
            KillOutcome::AlreadyDead => notes.push(format!("{} was already dead", label)),
            KillOutcome::NoSuchSeat => {
                return ActionResult::failed(&action.id, format!("Seat {} does not exist", target))
            }
        }
    }
    apply_effects(game, &action.effects, ctx.actor(), &ctx.targets);
    result.information = Some(notes.join("; "));
    result
}
