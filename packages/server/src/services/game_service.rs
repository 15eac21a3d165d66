//! The public command surface. Every command locks one game, checks its
//! preconditions, mutates, and appends events. Failures leave the game untouched.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use super::night_order::{NightExecution, NightOrderStep};
use super::phase;
use super::script_validation::{validate_script, ScriptValidationReport};
use super::setup_service;
use crate::error::GameError;
use crate::models::action::StatusKind;
use crate::models::api::{GameCreated, GameView, JoinRequest, PhaseChange, SeatView};
use crate::models::character::Alignment;
use crate::models::event::{EventType, GameEvent};
use crate::models::game::{Game, GamePhase};
use crate::models::nomination::{Nomination, Tally, VoteOutcome, VoteSession};
use crate::models::script::Script;
use crate::models::setup::{SetupState, SetupValidation};
use crate::rules::assignment::{assign_roles, RoleAssignment};
use crate::rules::distribution::modifications_for;
use crate::state::{AppState, GameHandle, GameSession};

fn require_storyteller(game: &Game, actor_seat: &str, operation: &str) -> Result<(), GameError> {
    if game.is_storyteller(actor_seat) {
        Ok(())
    } else {
        Err(GameError::storyteller_only(operation))
    }
}

fn require_phase(game: &Game, allowed: &[GamePhase]) -> Result<(), GameError> {
    if allowed.contains(&game.phase) {
        return Ok(());
    }
    let expected = allowed
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" or ");
    Err(GameError::wrong_phase(expected, game.phase))
}

async fn game_handle(state: &AppState, game_id: &str) -> Result<GameHandle, GameError> {
    state.game(game_id).await
}

async fn script_for_id(state: &AppState, script_id: &str) -> Result<Arc<Script>, GameError> {
    Ok(state.scripts.get(script_id).await?)
}

async fn script_for(state: &AppState, game: &Game) -> Result<Arc<Script>, GameError> {
    script_for_id(state, &game.script_id).await
}

pub async fn create_game(
    state: AppState,
    script_id: Option<&str>,
    seed: Option<u64>,
) -> Result<GameCreated, GameError> {
    let script_id = script_id
        .unwrap_or(state.config.default_script.as_str())
        .to_string();
    // Fails early when the script cannot be loaded.
    script_for_id(&state, &script_id).await?;

    let seed = seed
        .or(state.config.fixed_seed)
        .unwrap_or_else(rand::random);
    let game = Game::new(script_id.clone(), seed);
    let mut session = GameSession::new(game);
    session.events.record(
        EventType::GameCreated,
        None,
        json!({ "script_id": script_id, "seed": seed }),
    );
    let created = GameCreated {
        game_id: session.game.id.clone(),
        script_id,
        seed,
    };
    state.insert_game(session).await;
    info!(game_id = %created.game_id, script_id = %created.script_id, "game created");
    Ok(created)
}

pub async fn add_player(
    state: AppState,
    game_id: &str,
    request: JoinRequest,
) -> Result<SeatView, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    let GameSession { game, events } = &mut *session;
    require_phase(game, &[GamePhase::Lobby])?;

    if request.storyteller && game.storyteller_seat_id.is_some() {
        return Err(GameError::PreconditionFailed(
            "A storyteller is already assigned".to_string(),
        ));
    }
    if let Some(player_id) = &request.player_id {
        if game
            .seats
            .iter()
            .any(|s| s.player_id.as_deref() == Some(player_id.as_str()))
        {
            return Err(GameError::InvalidRequest(format!(
                "Player {} already has a seat",
                player_id
            )));
        }
    }

    let seat_id = game
        .add_seat(request.player_id.clone(), request.is_npc)
        .id
        .clone();
    if request.storyteller {
        game.storyteller_seat_id = Some(seat_id.clone());
    }
    events.record(
        EventType::PlayerJoined,
        Some(&seat_id),
        json!({
            "player_id": request.player_id,
            "is_npc": request.is_npc,
            "storyteller": request.storyteller,
        }),
    );
    debug!(game_id, seat_id = %seat_id, "seat added");

    let view = GameView::for_viewer(game, Some(&seat_id));
    view.seats
        .into_iter()
        .find(|s| s.id == seat_id)
        .ok_or(GameError::SeatNotFound(seat_id))
}

/// Lobby only. A seat may leave on its own; the storyteller may remove anyone.
pub async fn remove_player(
    state: AppState,
    game_id: &str,
    seat_id: &str,
    actor_seat: &str,
) -> Result<(), GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    let GameSession { game, events } = &mut *session;
    require_phase(game, &[GamePhase::Lobby])?;
    if game.seat(seat_id).is_none() {
        return Err(GameError::SeatNotFound(seat_id.to_string()));
    }
    if actor_seat != seat_id && !game.is_storyteller(actor_seat) {
        return Err(GameError::storyteller_only("remove other players"));
    }

    game.seats.retain(|s| s.id != seat_id);
    game.role_claims.remove(seat_id);
    if game.is_storyteller(seat_id) {
        game.storyteller_seat_id = None;
    }
    events.record(EventType::PlayerLeft, Some(actor_seat), json!({ "seat_id": seat_id }));
    Ok(())
}

/// Lobby only. A claimed character is pre-assigned by the direct assignment path.
pub async fn claim_role(
    state: AppState,
    game_id: &str,
    seat_id: &str,
    character_id: &str,
) -> Result<(), GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    let script = script_for(&state, &session.game).await?;
    let GameSession { game, events } = &mut *session;
    require_phase(game, &[GamePhase::Lobby])?;

    if game.seat(seat_id).is_none() {
        return Err(GameError::SeatNotFound(seat_id.to_string()));
    }
    if game.is_storyteller(seat_id) {
        return Err(GameError::InvalidRequest(
            "The storyteller cannot claim a character".to_string(),
        ));
    }
    if !script.contains(character_id) {
        return Err(GameError::UnknownCharacters(vec![character_id.to_string()]));
    }
    if game
        .role_claims
        .iter()
        .any(|(seat, claimed)| seat != seat_id && claimed == character_id)
    {
        return Err(GameError::InvalidRequest(format!(
            "{} is already claimed",
            character_id
        )));
    }

    game.role_claims
        .insert(seat_id.to_string(), character_id.to_string());
    events.record(EventType::RoleClaimed, Some(seat_id), json!({}));
    Ok(())
}

/// Runs a phase transition on a copy of the game and commits it only on success.
fn commit_transition(
    state: &AppState,
    session: &mut GameSession,
    script: &Script,
    target: GamePhase,
) -> Result<PhaseChange, GameError> {
    let mut game = session.game.clone();
    let mut events = session.events.clone();
    let change = phase::transition(&mut game, &mut events, script, target, &state.config)?;
    session.game = game;
    session.events = events;
    Ok(change)
}

pub async fn enter_setup(
    state: AppState,
    game_id: &str,
    actor_seat: &str,
) -> Result<PhaseChange, GameError> {
    set_phase(state, game_id, actor_seat, GamePhase::Setup).await
}

pub async fn advance_phase(
    state: AppState,
    game_id: &str,
    actor_seat: &str,
) -> Result<PhaseChange, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    require_storyteller(&session.game, actor_seat, "advance the phase")?;
    let target = session.game.phase.next().ok_or(GameError::InvalidTransition {
        from: session.game.phase,
        to: session.game.phase,
    })?;
    let script = script_for(&state, &session.game).await?;
    commit_transition(&state, &mut session, &script, target)
}

/// Like `advance_phase`, but the target is explicit so END can be reached directly.
pub async fn set_phase(
    state: AppState,
    game_id: &str,
    actor_seat: &str,
    target: GamePhase,
) -> Result<PhaseChange, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    require_storyteller(&session.game, actor_seat, "change the phase")?;
    let script = script_for(&state, &session.game).await?;
    commit_transition(&state, &mut session, &script, target)
}

pub async fn end_game(
    state: AppState,
    game_id: &str,
    actor_seat: &str,
    winner: Option<Alignment>,
) -> Result<PhaseChange, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    require_storyteller(&session.game, actor_seat, "end the game")?;
    let script = script_for(&state, &session.game).await?;

    let change = commit_transition(&state, &mut session, &script, GamePhase::End)?;
    session.game.winner = winner;
    session.events.record(
        EventType::GameEnded,
        Some(actor_seat),
        json!({ "winner": winner, "day": change.day }),
    );
    info!(game_id, ?winner, "game ended");
    Ok(change)
}

pub async fn select_setup_characters(
    state: AppState,
    game_id: &str,
    actor_seat: &str,
    character_ids: Vec<String>,
) -> Result<SetupState, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    let script = script_for(&state, &session.game).await?;
    let GameSession { game, events } = &mut *session;

    let setup = setup_service::select_characters(game, &script, character_ids, actor_seat)?;
    events.record(
        EventType::CharactersSelected,
        Some(actor_seat),
        json!({
            "count": setup.selected_characters.len(),
            "modifications": setup.character_modifications,
        }),
    );
    Ok(setup)
}

/// Returns the validation when the selection is valid and `InvalidSetup` with
/// every problem otherwise.
pub async fn validate_setup(state: AppState, game_id: &str) -> Result<SetupValidation, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    let script = script_for(&state, &session.game).await?;
    let GameSession { game, events } = &mut *session;
    require_phase(game, &[GamePhase::Setup])?;

    let validation = setup_service::validate_setup(game, &script);
    events.record(
        EventType::SetupValidated,
        None,
        json!({ "is_valid": validation.is_valid, "errors": validation.errors }),
    );
    if validation.is_valid {
        Ok(validation)
    } else {
        Err(GameError::InvalidSetup(validation.errors))
    }
}

/// Freezes the bag, hands out roles and moves to the first night.
pub async fn complete_setup(
    state: AppState,
    game_id: &str,
    actor_seat: &str,
) -> Result<PhaseChange, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    require_storyteller(&session.game, actor_seat, "complete setup")?;
    require_phase(&session.game, &[GamePhase::Setup])?;
    let script = script_for(&state, &session.game).await?;

    let mut game = session.game.clone();
    let mut events = session.events.clone();
    setup_service::complete_setup(&mut game, &script)?;
    let pool_size = game.setup.as_ref().map_or(0, |s| s.character_pool.len());
    events.record(
        EventType::SetupCompleted,
        Some(actor_seat),
        json!({
            "pool_size": pool_size,
            "reminder_tokens": game.grimoire.reminder_tokens.len(),
        }),
    );
    let change = phase::transition(&mut game, &mut events, &script, GamePhase::Night, &state.config)?;
    session.game = game;
    session.events = events;
    Ok(change)
}

/// Direct assignment from inside SETUP, bypassing the bag. Claims are honored.
/// The assigned characters become the pool so the first night can start.
pub async fn quick_assign_roles(
    state: AppState,
    game_id: &str,
    actor_seat: &str,
    selected: Option<Vec<String>>,
) -> Result<Vec<RoleAssignment>, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    require_storyteller(&session.game, actor_seat, "assign roles")?;
    require_phase(&session.game, &[GamePhase::Setup])?;
    let script = script_for(&state, &session.game).await?;

    let mut game = session.game.clone();
    let assignments = assign_roles(&mut game, &script, selected.as_deref())?;
    let in_seat_order: Vec<String> = game
        .player_seats()
        .iter()
        .filter_map(|s| s.role.clone())
        .collect();
    let night_order = setup_service::resolve_night_order(&script, &in_seat_order);
    let setup = game.setup.get_or_insert_with(SetupState::default);
    setup.character_modifications = modifications_for(&in_seat_order);
    setup.selected_characters = in_seat_order.clone();
    setup.character_pool = in_seat_order;
    setup.is_validated = true;
    game.grimoire.night_order = night_order;

    session.game = game;
    session.events.record(
        EventType::RolesAssigned,
        Some(actor_seat),
        json!({ "seats": assignments.len(), "direct": true }),
    );
    Ok(assignments)
}

/// Nominations are accepted during DAY and NOMINATION.
pub async fn nominate(
    state: AppState,
    game_id: &str,
    nominator: &str,
    nominee: &str,
) -> Result<Nomination, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    let GameSession { game, events } = &mut *session;
    require_phase(game, &[GamePhase::Day, GamePhase::Nomination])?;

    let reject = |reason: &str| Err(GameError::NominationRejected(reason.to_string()));
    let nominator_seat = game
        .seat(nominator)
        .ok_or_else(|| GameError::SeatNotFound(nominator.to_string()))?;
    if game.seat(nominee).is_none() {
        return Err(GameError::SeatNotFound(nominee.to_string()));
    }
    if game.is_storyteller(nominator) {
        return reject("The storyteller cannot nominate");
    }
    if game.is_storyteller(nominee) {
        return reject("The storyteller cannot be nominated");
    }
    if !nominator_seat.is_alive {
        return reject("Dead players cannot nominate");
    }
    if game.current_nomination.as_ref().map_or(false, |n| !n.closed) {
        return reject("A nomination is already open");
    }
    if game.current_vote.as_ref().map_or(false, |v| !v.finished) {
        return reject("A vote is in progress");
    }
    if game.nominations_today.iter().any(|n| n.nominator == nominator) {
        return reject("This player has already nominated today");
    }
    if game.nominations_today.iter().any(|n| n.nominee == nominee) {
        return reject("This player has already been nominated today");
    }

    let nomination = Nomination::new(nominator.to_string(), nominee.to_string());
    game.nominations_today.push(nomination.clone());
    game.current_nomination = Some(nomination.clone());
    game.current_vote = None;
    events.record(
        EventType::NominationCreated,
        Some(nominator),
        json!({ "nomination_id": nomination.id, "nominee": nominee }),
    );
    Ok(nomination)
}

/// Closes the open nomination and opens its vote session.
pub async fn start_vote(
    state: AppState,
    game_id: &str,
    actor_seat: &str,
) -> Result<VoteSession, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    let GameSession { game, events } = &mut *session;
    require_storyteller(game, actor_seat, "start a vote")?;
    require_phase(game, &[GamePhase::Vote])?;
    if game.current_vote.as_ref().map_or(false, |v| !v.finished) {
        return Err(GameError::VoteRejected("A vote is already open".to_string()));
    }
    let Some(nomination) = game.current_nomination.as_mut().filter(|n| !n.closed) else {
        return Err(GameError::PreconditionFailed(
            "No open nomination to vote on".to_string(),
        ));
    };

    nomination.closed = true;
    let vote = VoteSession::open(nomination);
    let nomination_id = nomination.id.clone();
    if let Some(today) = game
        .nominations_today
        .iter_mut()
        .find(|n| n.id == nomination_id)
    {
        today.closed = true;
    }
    game.current_vote = Some(vote.clone());
    events.record(
        EventType::VoteStarted,
        Some(actor_seat),
        json!({ "nomination_id": nomination_id, "nominee": vote.nominee }),
    );
    Ok(vote)
}

pub async fn cast_vote(
    state: AppState,
    game_id: &str,
    voter: &str,
    vote: bool,
) -> Result<Tally, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    let GameSession { game, events } = &mut *session;
    require_phase(game, &[GamePhase::Vote])?;

    let reject = |reason: &str| Err(GameError::VoteRejected(reason.to_string()));
    let Some(current) = game.current_vote.as_ref().filter(|v| !v.finished) else {
        return reject("No vote is open");
    };
    let seat = game
        .seat(voter)
        .ok_or_else(|| GameError::SeatNotFound(voter.to_string()))?;
    if game.is_storyteller(voter) {
        return reject("The storyteller does not vote");
    }
    if current.has_voted(voter) {
        return Err(GameError::AlreadyVoted);
    }
    if seat.has_status(StatusKind::VoteRestricted) {
        return reject("This player may not vote today");
    }
    if !seat.is_alive && seat.voting_power == 0 {
        return reject("This player has no ghost vote left");
    }
    if vote {
        if let Some(master) = seat
            .status(StatusKind::Master)
            .and_then(|s| s.related_seat.as_deref())
        {
            if !current.voted_yes(master) {
                return reject("May only vote yes after their master has");
            }
        }
    }

    let spends_ghost_vote = vote && !seat.is_alive;
    if spends_ghost_vote {
        if let Some(seat) = game.seat_mut(voter) {
            seat.voting_power = seat.voting_power.saturating_sub(1);
        }
    }
    let Some(current) = game.current_vote.as_mut() else {
        return reject("No vote is open");
    };
    current.record(voter, vote);
    let tally = current.tally;
    events.record(
        EventType::VoteCast,
        Some(voter),
        json!({ "vote": vote, "tally": tally }),
    );
    Ok(tally)
}

/// Closes the vote. A passing vote executes the nominee.
pub async fn finish_vote(
    state: AppState,
    game_id: &str,
    actor_seat: &str,
) -> Result<VoteOutcome, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    let GameSession { game, events } = &mut *session;
    require_storyteller(game, actor_seat, "finish a vote")?;
    require_phase(game, &[GamePhase::Vote])?;

    let Some(current) = game.current_vote.as_mut() else {
        return Err(GameError::VoteRejected("No vote is open".to_string()));
    };
    if current.finished {
        return Err(GameError::VoteRejected("The vote is already finished".to_string()));
    }
    current.finished = true;
    let outcome = VoteOutcome {
        nomination_id: current.nomination_id.clone(),
        nominee: current.nominee.clone(),
        tally: current.tally,
        executed: current.passes(),
    };

    events.record(
        EventType::VoteFinished,
        Some(actor_seat),
        json!({
            "nomination_id": outcome.nomination_id,
            "tally": outcome.tally,
            "executed": outcome.executed,
        }),
    );
    if outcome.executed {
        if let Some(seat) = game.seat_mut(&outcome.nominee) {
            seat.is_alive = false;
        }
        game.executed_today = true;
        events.record(
            EventType::ExecutionOccurred,
            None,
            json!({ "seat_id": outcome.nominee, "tally": outcome.tally }),
        );
        events.record(
            EventType::PlayerDied,
            None,
            json!({ "seat_id": outcome.nominee, "cause": "execution" }),
        );
        info!(game_id, seat_id = %outcome.nominee, "player executed");
    }
    Ok(outcome)
}

/// Records the targets a seat chose for tonight's ability. A later choice replaces an earlier one.
pub async fn submit_night_choice(
    state: AppState,
    game_id: &str,
    seat_id: &str,
    targets: Vec<String>,
) -> Result<(), GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    let GameSession { game, events } = &mut *session;
    require_phase(game, &[GamePhase::Night])?;

    let seat = game
        .seat(seat_id)
        .ok_or_else(|| GameError::SeatNotFound(seat_id.to_string()))?;
    if game.is_storyteller(seat_id) {
        return Err(GameError::InvalidRequest(
            "The storyteller does not make night choices".to_string(),
        ));
    }
    if !seat.is_alive {
        return Err(GameError::InvalidRequest("Dead players do not wake".to_string()));
    }
    if let Some(unknown) = targets.iter().find(|t| game.seat(t).is_none()) {
        return Err(GameError::SeatNotFound(unknown.clone()));
    }

    let count = targets.len();
    game.grimoire
        .pending_choices
        .insert(seat_id.to_string(), targets);
    events.record(
        EventType::NightChoiceSubmitted,
        Some(seat_id),
        json!({ "target_count": count }),
    );
    Ok(())
}

/// Resolves tonight's order. Day 1 is the first night.
pub async fn execute_night_order(
    state: AppState,
    game_id: &str,
    actor_seat: &str,
) -> Result<NightExecution, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let mut session = handle.lock().await;
    require_storyteller(&session.game, actor_seat, "run the night")?;
    require_phase(&session.game, &[GamePhase::Night])?;
    let script = script_for(&state, &session.game).await?;

    let first_night = session.game.day <= 1;
    let GameSession { game, events } = &mut *session;
    Ok(state
        .night_processor()
        .execute(game, events, &script, first_night))
}

pub async fn get_night_order_preview(
    state: AppState,
    game_id: &str,
    actor_seat: &str,
    first_night: Option<bool>,
) -> Result<Vec<NightOrderStep>, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let session = handle.lock().await;
    require_storyteller(&session.game, actor_seat, "preview the night")?;
    let script = script_for(&state, &session.game).await?;
    let first_night = first_night.unwrap_or(session.game.day <= 1);
    Ok(state
        .night_processor()
        .preview(&session.game, &script, first_night))
}

/// Checks the game's script, narrowed to the characters selected for this game when there are any.
pub async fn validate_game_script(
    state: AppState,
    game_id: &str,
) -> Result<ScriptValidationReport, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let session = handle.lock().await;
    let script = script_for(&state, &session.game).await?;
    let in_play = session
        .game
        .setup
        .as_ref()
        .map(|s| s.selected_characters.clone())
        .filter(|s| !s.is_empty());
    Ok(validate_script(&script, in_play.as_deref()))
}

pub async fn generate_validation_report(state: AppState, game_id: &str) -> Result<String, GameError> {
    Ok(validate_game_script(state, game_id).await?.render())
}

pub async fn get_game_events(state: AppState, game_id: &str) -> Result<Vec<GameEvent>, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let session = handle.lock().await;
    Ok(session.events.events().to_vec())
}

/// Full, unredacted state. Meant for the storyteller's tools and tests.
pub async fn get_game_state(state: AppState, game_id: &str) -> Result<Game, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let session = handle.lock().await;
    Ok(session.game.clone())
}

pub async fn get_game_view(
    state: AppState,
    game_id: &str,
    viewer_seat: Option<&str>,
) -> Result<GameView, GameError> {
    let handle = game_handle(&state, game_id).await?;
    let session = handle.lock().await;
    Ok(GameView::for_viewer(&session.game, viewer_seat))
}

pub async fn remove_game(state: AppState, game_id: &str) -> Result<(), GameError> {
    state
        .remove_game(game_id)
        .await
        .map(|_| info!(game_id, "game removed"))
        .ok_or_else(|| GameError::GameNotFound(game_id.to_string()))
}
