use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::actions::context::{seat_label, ActionContext};
use crate::models::action::{ActionDefinition, ActionResult};
use crate::models::character::Team;
use crate::models::game::Game;

fn seats_on_team(ctx: &ActionContext<'_>, game: &Game, team: Team) -> Vec<String> {
    game.player_seats()
        .into_iter()
        .filter(|s| s.role.as_deref().and_then(|r| ctx.script.team_of(r)) == Some(team))
        .map(|s| s.id.clone())
        .collect()
}

fn labels(game: &Game, ids: &[String]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    ids.iter()
        .map(|id| seat_label(game, id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render(action: &ActionDefinition, values: &[(&str, String)], fallback: String) -> String {
    action
        .information
        .as_ref()
        .filter(|info| !info.template.is_empty())
        .map(|info| info.render(values))
        .unwrap_or(fallback)
}

/// Tells each minion who the demon is and who the other minions are.
pub fn minion_info(
    action: &ActionDefinition,
    ctx: &ActionContext<'_>,
    game: &mut Game,
) -> ActionResult {
    let minions = seats_on_team(ctx, game, Team::Minion);
    let demons = seats_on_team(ctx, game, Team::Demon);
    if minions.is_empty() {
        return ActionResult::ok(&action.id).with_information("No minions in play");
    }

    let demon_names = labels(game, &demons);
    let mut result = ActionResult::ok(&action.id);
    for minion in &minions {
        let others: Vec<String> = minions.iter().filter(|m| *m != minion).cloned().collect();
        let other_names = labels(game, &others);
        let message = render(
            action,
            &[("demon", demon_names.clone()), ("minions", other_names.clone())],
            format!("The demon is {}. Other minions: {}", demon_names, other_names),
        );
        result = result.deliver(minion, message);
    }
    result.with_information(format!(
        "Minions {} shown demon {}",
        labels(game, &minions),
        demon_names
    ))
}

/// Good characters on the script that nobody holds and that are not in the bag.
pub fn bluff_candidates(ctx: &ActionContext<'_>, game: &Game) -> Vec<String> {
    let mut in_play: HashSet<&str> = game
        .seats
        .iter()
        .filter_map(|s| s.role.as_deref())
        .collect();
    if let Some(setup) = &game.setup {
        in_play.extend(setup.character_pool.iter().map(String::as_str));
    }
    ctx.script
        .characters
        .iter()
        .filter(|c| matches!(c.team, Team::Townsfolk | Team::Outsider))
        .filter(|c| !in_play.contains(c.id.as_str()))
        .map(|c| c.id.clone())
        .collect()
}

/// Tells the demon its minions and offers a few not-in-play characters to bluff as.
pub fn demon_info(
    action: &ActionDefinition,
    ctx: &ActionContext<'_>,
    game: &mut Game,
) -> ActionResult {
    let demons = seats_on_team(ctx, game, Team::Demon);
    if demons.is_empty() {
        return ActionResult::ok(&action.id).with_information("No demon in play");
    }
    let minions = seats_on_team(ctx, game, Team::Minion);

    let mut candidates = bluff_candidates(ctx, game);
    let mut rng = game.next_rng();
    candidates.shuffle(&mut rng);
    candidates.truncate(ctx.bluff_count);
    let bluff_names = candidates
        .iter()
        .map(|id| ctx.script.character(id).map_or(id.as_str(), |c| c.name.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    let minion_names = labels(game, &minions);
    let message = render(
        action,
        &[("minions", minion_names.clone()), ("bluffs", bluff_names.clone())],
        format!("Your minions: {}. Bluffs: {}", minion_names, bluff_names),
    );
    let mut result = ActionResult::ok(&action.id);
    for demon in &demons {
        result = result.deliver(demon, message.clone());
    }
    result.with_information(format!("Demon bluffs: {}", bluff_names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::handlers::fixture;
    use crate::models::action::{ActionPhase, ActionType};

    #[test]
    fn minions_learn_demon_and_each_other() {
        let script = fixture::script();
        let (mut game, ids) =
            fixture::game(&script, &["imp", "chef", "poisoner", "monk", "spy", "empath", "saint"]);
        let action = ActionDefinition::new("minion_info", ActionType::MinionInfo);
        let ctx = ActionContext::new(&script, ActionPhase::FirstNight);
        let result = minion_info(&action, &ctx, &mut game);
        assert_eq!(result.deliveries.len(), 2);
        let poisoner = result.deliveries.iter().find(|d| d.seat_id == ids[2]).unwrap();
        assert_eq!(poisoner.message, "The demon is player1. Other minions: player5");
    }

    #[test]
    fn bluffs_are_good_and_not_in_play() {
        let script = fixture::script();
        let (mut game, ids) = fixture::game(&script, &["imp", "chef", "poisoner", "monk", "empath"]);
        let action = ActionDefinition::new("demon_info", ActionType::DemonInfo);
        let ctx = ActionContext::new(&script, ActionPhase::FirstNight).with_bluff_count(3);

        let candidates = bluff_candidates(&ctx, &game);
        let mut sorted = candidates.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["butler", "saint", "washerwoman"]);

        let result = demon_info(&action, &ctx, &mut game);
        assert_eq!(result.deliveries.len(), 1);
        assert_eq!(result.deliveries[0].seat_id, ids[0]);
        for name in ["Butler", "Saint", "Washerwoman"] {
            assert!(result.deliveries[0].message.contains(name));
        }
    }
}
