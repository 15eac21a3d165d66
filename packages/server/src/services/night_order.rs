//! Walks a night's order and dispatches each eligible step.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::actions::{ActionContext, ActionRegistry};
use crate::models::action::{ActionDefinition, ActionPhase, ActionResult};
use crate::models::event::{EventLog, EventType};
use crate::models::game::{AbilityRecord, Game};
use crate::models::script::{NightOrderEntry, Script};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotInPlay,
    Dead,
    NoActionConfigured,
}

/// One entry of a night order and whether it would run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightOrderStep {
    pub entry: String,
    pub is_meta: bool,
    pub seat_id: Option<String>,
    pub action_id: Option<String>,
    pub would_execute: bool,
    pub skip_reason: Option<SkipReason>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NightExecution {
    pub first_night: bool,
    pub results: Vec<ActionResult>,
    pub skipped: Vec<NightOrderStep>,
    pub deaths: Vec<String>,
}

enum Plan<'s> {
    Character {
        seat_id: String,
        character_id: String,
        action: &'s ActionDefinition,
    },
    Meta(&'s ActionDefinition),
    Skip {
        seat_id: Option<String>,
        reason: SkipReason,
    },
}

fn sub_phase(first_night: bool) -> ActionPhase {
    if first_night {
        ActionPhase::FirstNight
    } else {
        ActionPhase::Night
    }
}

fn plan<'s>(game: &Game, script: &'s Script, entry: &'s NightOrderEntry, first_night: bool) -> Plan<'s> {
    match entry {
        NightOrderEntry::Meta(action) => Plan::Meta(action),
        NightOrderEntry::Character(character_id) => {
            let Some(seat) = game.seat_holding(character_id) else {
                return Plan::Skip {
                    seat_id: None,
                    reason: SkipReason::NotInPlay,
                };
            };
            if !seat.is_alive {
                return Plan::Skip {
                    seat_id: Some(seat.id.clone()),
                    reason: SkipReason::Dead,
                };
            }
            match script
                .character(character_id)
                .and_then(|c| c.first_action(sub_phase(first_night)))
            {
                Some(action) => Plan::Character {
                    seat_id: seat.id.clone(),
                    character_id: character_id.clone(),
                    action,
                },
                None => Plan::Skip {
                    seat_id: Some(seat.id.clone()),
                    reason: SkipReason::NoActionConfigured,
                },
            }
        }
    }
}

fn step(entry: &NightOrderEntry, planned: &Plan<'_>) -> NightOrderStep {
    let mut step = NightOrderStep {
        entry: entry.label().to_string(),
        is_meta: matches!(entry, NightOrderEntry::Meta(_)),
        seat_id: None,
        action_id: None,
        would_execute: true,
        skip_reason: None,
    };
    match planned {
        Plan::Character { seat_id, action, .. } => {
            step.seat_id = Some(seat_id.clone());
            step.action_id = Some(action.id.clone());
        }
        Plan::Meta(action) => step.action_id = Some(action.id.clone()),
        Plan::Skip { seat_id, reason } => {
            step.seat_id = seat_id.clone();
            step.would_execute = false;
            step.skip_reason = Some(*reason);
        }
    }
    step
}

pub struct NightOrderProcessor {
    registry: Arc<ActionRegistry>,
    bluff_count: usize,
}

impl NightOrderProcessor {
    pub fn new(registry: Arc<ActionRegistry>, bluff_count: usize) -> Self {
        Self {
            registry,
            bluff_count,
        }
    }

    /// What the night would do right now. Never mutates the game.
    pub fn preview(&self, game: &Game, script: &Script, first_night: bool) -> Vec<NightOrderStep> {
        let order = script.night_order(first_night);
        order
            .iter()
            .map(|entry| step(entry, &plan(game, script, entry, first_night)))
            .collect()
    }

    /// Runs every step in order. A failing step is recorded and the night continues.
    pub fn execute(
        &self,
        game: &mut Game,
        events: &mut EventLog,
        script: &Script,
        first_night: bool,
    ) -> NightExecution {
        let phase = sub_phase(first_night);
        let order = script.night_order(first_night);
        let mut execution = NightExecution {
            first_night,
            ..Default::default()
        };

        for entry in &order {
            let planned = plan(game, script, entry, first_night);
            let (action, seat_id, character_id) = match &planned {
                Plan::Skip { .. } => {
                    debug!(game_id = %game.id, entry = entry.label(), "night step skipped");
                    execution.skipped.push(step(entry, &planned));
                    continue;
                }
                Plan::Meta(action) => (*action, None, None),
                Plan::Character {
                    seat_id,
                    character_id,
                    action,
                } => (*action, Some(seat_id.clone()), Some(character_id.clone())),
            };

            let targets = seat_id
                .as_ref()
                .and_then(|id| game.grimoire.pending_choices.remove(id))
                .unwrap_or_default();
            let mut ctx = ActionContext::new(script, phase)
                .with_targets(targets.clone())
                .with_bluff_count(self.bluff_count);
            ctx.acting_seat = seat_id.clone();

            let result = self.registry.dispatch(action, &ctx, game);
            game.abilities.push(AbilityRecord {
                action_id: action.id.clone(),
                seat_id: seat_id.clone(),
                character_id: character_id.clone(),
                phase,
                day: game.day,
                targets,
                success: result.success,
                used_at: Utc::now(),
            });

            if result.success {
                events.record(
                    EventType::AbilityUsed,
                    seat_id.as_deref(),
                    json!({
                        "action_id": action.id,
                        "action_type": action.action_type,
                        "character_id": character_id,
                        "information": result.information,
                    }),
                );
            } else {
                events.record(
                    EventType::ActionFailed,
                    seat_id.as_deref(),
                    json!({
                        "action_id": action.id,
                        "character_id": character_id,
                        "errors": result.errors,
                    }),
                );
            }
            for dead in &result.deaths {
                events.record(
                    EventType::PlayerDied,
                    None,
                    json!({ "seat_id": dead, "cause": "night", "action_id": action.id }),
                );
            }
            execution.deaths.extend(result.deaths.iter().cloned());
            execution.results.push(result);
        }

        info!(
            game_id = %game.id,
            first_night,
            executed = execution.results.len(),
            skipped = execution.skipped.len(),
            "night order executed"
        );
        execution
    }
}
