use crate::actions::context::{inform, seat_label, ActionContext};
use crate::actions::effects::apply_effects;
use crate::models::action::{
    ActionDefinition, ActionResult, EffectDuration, EffectSpec, EffectTarget, StatusKind,
};
use crate::models::game::Game;

/// Stops the chosen seats from voting. Lasts until the next night unless declared otherwise.
pub fn voting_restriction(
    action: &ActionDefinition,
    ctx: &ActionContext<'_>,
    game: &mut Game,
) -> ActionResult {
    let default = [EffectSpec {
        status: StatusKind::VoteRestricted,
        target: EffectTarget::Targets,
        duration: EffectDuration::UntilNextNight,
    }];
    let effects: &[EffectSpec] = if action.effects.is_empty() {
        &default
    } else {
        &action.effects
    };
    let touched = apply_effects(game, effects, ctx.actor(), &ctx.targets);
    let names = touched
        .iter()
        .map(|id| seat_label(game, id))
        .collect::<Vec<_>>()
        .join(", ");
    inform(
        action,
        ctx,
        game,
        ActionResult::ok(&action.id),
        &[("targets", names.clone())],
        format!("{} cannot vote tomorrow", names),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::handlers::fixture;
    use crate::models::action::{ActionPhase, ActionType, DeliveryMethod};

    #[test]
    fn restriction_survives_the_day() {
        let script = fixture::script();
        let (mut game, ids) = fixture::game(&script, &["monk", "imp", "chef", "empath", "spy"]);
        let action = ActionDefinition::new("silence", ActionType::VotingRestriction)
            .with_information(DeliveryMethod::Storyteller, "{targets} silenced");
        let ctx = ActionContext::new(&script, ActionPhase::Night)
            .with_actor(ids[4].clone())
            .with_targets(vec![ids[2].clone()]);
        let result = voting_restriction(&action, &ctx, &mut game);
        assert_eq!(result.information.as_deref(), Some("player3 silenced"));

        game.expire_effects(EffectDuration::Tonight);
        assert!(game.seat(&ids[2]).unwrap().has_status(StatusKind::VoteRestricted));
    }
}
