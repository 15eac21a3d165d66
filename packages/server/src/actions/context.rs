use crate::models::action::{ActionDefinition, ActionPhase, ActionResult, DeliveryMethod};
use crate::models::game::Game;
use crate::models::script::Script;

/// Everything a handler may read besides the game itself.
#[derive(Debug, Clone)]
pub struct ActionContext<'a> {
    pub script: &'a Script,
    pub phase: ActionPhase,
    pub acting_seat: Option<String>,
    pub targets: Vec<String>,
    /// How many bluffs the demon is shown.
    pub bluff_count: usize,
}

impl<'a> ActionContext<'a> {
    pub fn new(script: &'a Script, phase: ActionPhase) -> Self {
        Self {
            script,
            phase,
            acting_seat: None,
            targets: Vec::new(),
            bluff_count: 3,
        }
    }

    pub fn with_actor(mut self, seat_id: impl Into<String>) -> Self {
        self.acting_seat = Some(seat_id.into());
        self
    }

    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_bluff_count(mut self, bluff_count: usize) -> Self {
        self.bluff_count = bluff_count;
        self
    }

    pub fn actor(&self) -> Option<&str> {
        self.acting_seat.as_deref()
    }
}

/// How a seat is named in information text.
pub fn seat_label(game: &Game, seat_id: &str) -> String {
    game.seat(seat_id)
        .and_then(|s| s.player_id.clone())
        .unwrap_or_else(|| match game.seat(seat_id) {
            Some(seat) => format!("Seat {}", seat.position + 1),
            None => seat_id.to_string(),
        })
}

/// Renders the action's information template (or `fallback`) and routes it
/// by the declared delivery method. Private is the default.
pub fn inform(
    action: &ActionDefinition,
    ctx: &ActionContext<'_>,
    game: &Game,
    result: ActionResult,
    values: &[(&str, String)],
    fallback: String,
) -> ActionResult {
    let message = action
        .information
        .as_ref()
        .filter(|info| !info.template.is_empty())
        .map(|info| info.render(values))
        .unwrap_or(fallback);
    let delivery = action
        .information
        .as_ref()
        .and_then(|info| info.delivery)
        .unwrap_or(DeliveryMethod::Private);

    let result = result.with_information(message.clone());
    match delivery {
        DeliveryMethod::Private => match ctx.actor() {
            Some(actor) => result.deliver(actor, message),
            None => result,
        },
        DeliveryMethod::Storyteller => result,
        DeliveryMethod::Public => game
            .player_seats()
            .iter()
            .fold(result, |acc, seat| acc.deliver(&seat.id, message.clone())),
    }
}
