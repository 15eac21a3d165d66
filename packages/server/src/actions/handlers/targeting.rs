use crate::actions::context::{inform, seat_label, ActionContext};
use crate::actions::effects::apply_status;
use crate::models::action::{ActionDefinition, ActionResult, EffectDuration, StatusKind};
use crate::models::character::Team;
use crate::models::game::Game;

fn character_name(ctx: &ActionContext<'_>, game: &Game, seat_id: &str) -> String {
    game.seat(seat_id)
        .and_then(|s| s.role.as_deref())
        .map(|id| {
            ctx.script
                .character(id)
                .map_or_else(|| id.to_string(), |c| c.name.clone())
        })
        .unwrap_or_else(|| "nobody".to_string())
}

/// Reports the character held by the chosen seat.
pub fn choose_player(
    action: &ActionDefinition,
    ctx: &ActionContext<'_>,
    game: &mut Game,
) -> ActionResult {
    let Some(target) = ctx.targets.first() else {
        return ActionResult::failed(&action.id, "No target chosen");
    };
    let label = seat_label(game, target);
    let role = character_name(ctx, game, target);
    inform(
        action,
        ctx,
        game,
        ActionResult::ok(&action.id),
        &[("target", label.clone()), ("role", role.clone())],
        format!("{} is the {}", label, role),
    )
}

/// Yes when any chosen seat holds a demon.
pub fn detect_demon(
    action: &ActionDefinition,
    ctx: &ActionContext<'_>,
    game: &mut Game,
) -> ActionResult {
    if ctx.targets.is_empty() {
        return ActionResult::failed(&action.id, "No target chosen");
    }
    let found = ctx.targets.iter().any(|id| {
        game.seat(id)
            .and_then(|s| s.role.as_deref())
            .and_then(|role| ctx.script.team_of(role))
            == Some(Team::Demon)
    });
    let answer = if found { "Yes" } else { "No" };
    let names = ctx
        .targets
        .iter()
        .map(|id| seat_label(game, id))
        .collect::<Vec<_>>()
        .join(" and ");
    inform(
        action,
        ctx,
        game,
        ActionResult::ok(&action.id),
        &[("result", answer.to_string()), ("targets", names.clone())],
        format!("{}: is one of {} the demon?", answer, names),
    )
}

/// Binds the actor's vote to the chosen seat until the next night.
pub fn choose_master(
    action: &ActionDefinition,
    ctx: &ActionContext<'_>,
    game: &mut Game,
) -> ActionResult {
    let (Some(actor), Some(master)) = (ctx.actor(), ctx.targets.first()) else {
        return ActionResult::failed(&action.id, "Needs an acting seat and a chosen master");
    };
    let duration = action
        .effects
        .iter()
        .find(|e| e.status == StatusKind::Master)
        .map_or(EffectDuration::UntilNextNight, |e| e.duration);
    apply_status(game, actor, StatusKind::Master, Some(actor), Some(master), duration);

    let label = seat_label(game, master);
    inform(
        action,
        ctx,
        game,
        ActionResult::ok(&action.id),
        &[("target", label.clone())],
        format!("Your master is {}", label),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::handlers::fixture;
    use crate::models::action::{ActionPhase, ActionType, DeliveryMethod};

    #[test]
    fn detect_demon_answers_yes_for_imp() {
        let script = fixture::script();
        let (mut game, ids) = fixture::game(&script, &["washerwoman", "imp", "chef", "monk", "spy"]);
        let action = ActionDefinition::new("ft", ActionType::DetectDemon)
            .with_information(DeliveryMethod::Private, "{result}");
        let ctx = ActionContext::new(&script, ActionPhase::Night)
            .with_actor(ids[0].clone())
            .with_targets(vec![ids[1].clone(), ids[2].clone()]);
        assert_eq!(detect_demon(&action, &ctx, &mut game).information.as_deref(), Some("Yes"));

        let ctx = ctx.with_targets(vec![ids[2].clone(), ids[3].clone()]);
        assert_eq!(detect_demon(&action, &ctx, &mut game).information.as_deref(), Some("No"));
    }

    #[test]
    fn choose_master_binds_actor() {
        let script = fixture::script();
        let (mut game, ids) = fixture::game(&script, &["butler", "imp", "chef", "monk", "spy"]);
        let action = ActionDefinition::new("butler_master", ActionType::ChooseMaster);
        let ctx = ActionContext::new(&script, ActionPhase::Night)
            .with_actor(ids[0].clone())
            .with_targets(vec![ids[2].clone()]);
        let result = choose_master(&action, &ctx, &mut game);
        assert!(result.success);
        let status = game.seat(&ids[0]).unwrap().status(StatusKind::Master).unwrap();
        assert_eq!(status.related_seat.as_deref(), Some(ids[2].as_str()));
        assert_eq!(status.duration, EffectDuration::UntilNextNight);
    }

    #[test]
    fn choose_player_names_character() {
        let script = fixture::script();
        let (mut game, ids) = fixture::game(&script, &["washerwoman", "imp", "chef", "monk", "spy"]);
        let action = ActionDefinition::new("look", ActionType::ChoosePlayer)
            .with_information(DeliveryMethod::Storyteller, "{target} is the {role}");
        let ctx = ActionContext::new(&script, ActionPhase::Night)
            .with_actor(ids[0].clone())
            .with_targets(vec![ids[2].clone()]);
        let result = choose_player(&action, &ctx, &mut game);
        assert_eq!(result.information.as_deref(), Some("player3 is the Chef"));
        assert!(result.deliveries.is_empty());
    }
}
