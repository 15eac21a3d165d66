use crate::actions::context::{inform, ActionContext};
use crate::models::action::{ActionDefinition, ActionResult};
use crate::models::game::Game;

/// Evil seats among the actor's closest alive neighbours.
pub fn evil_neighbor_count(
    action: &ActionDefinition,
    ctx: &ActionContext<'_>,
    game: &mut Game,
) -> ActionResult {
    let Some(actor) = ctx.actor() else {
        return ActionResult::failed(&action.id, "No acting seat");
    };
    let count = game
        .alive_neighbors(actor)
        .iter()
        .filter(|s| s.is_evil())
        .count();
    inform(
        action,
        ctx,
        game,
        ActionResult::ok(&action.id),
        &[("count", count.to_string())],
        format!("{} of your alive neighbours are evil", count),
    )
}

/// Adjacent evil pairs around the whole circle, dead seats included.
pub fn evil_pair_count(
    action: &ActionDefinition,
    ctx: &ActionContext<'_>,
    game: &mut Game,
) -> ActionResult {
    let circle = game.player_seats();
    let n = circle.len();
    let pairs = match n {
        0 | 1 => 0,
        2 => usize::from(circle[0].is_evil() && circle[1].is_evil()),
        _ => (0..n)
            .filter(|&i| circle[i].is_evil() && circle[(i + 1) % n].is_evil())
            .count(),
    };
    inform(
        action,
        ctx,
        game,
        ActionResult::ok(&action.id),
        &[("count", pairs.to_string())],
        format!("There are {} pairs of evil players", pairs),
    )
}
