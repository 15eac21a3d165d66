use std::collections::HashMap;
use tracing::{debug, warn};

use super::context::ActionContext;
use super::handlers::{counting, meta, status, targeting, voting};
use super::targets::validate_targets;
use crate::models::action::{
    ActionDefinition, ActionFamily, ActionResult, ActionType, DeliveryMethod,
};
use crate::models::game::Game;
use crate::models::seat::JournalKind;

pub type ActionHandler = fn(&ActionDefinition, &ActionContext<'_>, &mut Game) -> ActionResult;

/// Immutable table from action type to handler. Built once and shared.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: HashMap<ActionType, ActionHandler>,
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&str> = self.handlers.keys().map(|t| t.as_str()).collect();
        types.sort_unstable();
        f.debug_struct("ActionRegistry").field("types", &types).finish()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, action_type: ActionType, handler: ActionHandler) -> Self {
        self.handlers.insert(action_type, handler);
        self
    }

    pub fn standard() -> Self {
        Self::new()
            .register(ActionType::EvilNeighborCount, counting::evil_neighbor_count)
            .register(ActionType::EvilPairCount, counting::evil_pair_count)
            .register(ActionType::ChoosePlayer, targeting::choose_player)
            .register(ActionType::DetectDemon, targeting::detect_demon)
            .register(ActionType::ChooseMaster, targeting::choose_master)
            .register(ActionType::Kill, status::kill)
            .register(ActionType::Protect, status::protect)
            .register(ActionType::Poison, status::poison)
            .register(ActionType::VotingRestriction, voting::voting_restriction)
            .register(ActionType::MinionInfo, meta::minion_info)
            .register(ActionType::DemonInfo, meta::demon_info)
    }

    pub fn handles(&self, action_type: &ActionType) -> bool {
        self.handlers.contains_key(action_type)
    }

    /// Validates, runs the handler and files deliveries in the recipients'
    /// journals. Storyteller-only information goes to the storyteller seat.
    ///
    /// Never panics on bad input; failures come back as an unsuccessful result.
    pub fn dispatch(
        &self,
        action: &ActionDefinition,
        ctx: &ActionContext<'_>,
        game: &mut Game,
    ) -> ActionResult {
        let Some(handler) = self.handlers.get(&action.action_type) else {
            warn!(action_id = %action.id, action_type = %action.action_type, "no handler registered");
            return ActionResult::failed(
                &action.id,
                format!("Unknown action type: {}", action.action_type),
            );
        };

        match (action.action_type.family(), ctx.actor()) {
            (ActionFamily::Character, None) => {
                return ActionResult::failed(&action.id, "Character action needs an acting seat")
            }
            (ActionFamily::Character, Some(actor)) if game.seat(actor).is_none() => {
                return ActionResult::failed(&action.id, format!("Seat {} does not exist", actor))
            }
            (ActionFamily::Meta, Some(_)) => {
                return ActionResult::failed(&action.id, "Meta action cannot have an acting seat")
            }
            _ => {}
        }

        match &action.targets {
            Some(spec) => {
                let check = validate_targets(spec, game, ctx.script, ctx.actor(), &ctx.targets);
                if !check.valid {
                    let reason = check.reason.unwrap_or_else(|| "Invalid targets".to_string());
                    return ActionResult::failed(&action.id, reason);
                }
            }
            None if !ctx.targets.is_empty() => {
                return ActionResult::failed(&action.id, "Action takes no targets");
            }
            None => {}
        }

        let result = handler(action, ctx, game);
        debug!(
            action_id = %action.id,
            success = result.success,
            deliveries = result.deliveries.len(),
            "action dispatched"
        );

        let day = game.day;
        for delivery in &result.deliveries {
            if let Some(seat) = game.seat_mut(&delivery.seat_id) {
                seat.write_journal(day, delivery.message.clone(), JournalKind::Private);
            }
        }
        let for_storyteller = action
            .information
            .as_ref()
            .and_then(|info| info.delivery)
            == Some(DeliveryMethod::Storyteller);
        if let (true, Some(text), Some(st)) = (
            for_storyteller,
            result.information.as_ref(),
            game.storyteller_seat_id.clone(),
        ) {
            if let Some(seat) = game.seat_mut(&st) {
                seat.write_journal(day, text.clone(), JournalKind::Storyteller);
            }
        }
        result
    }
}
