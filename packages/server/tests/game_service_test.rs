use clocktower_server::{
    actions::effects::apply_status,
    models::{
        action::{EffectDuration, StatusKind},
        api::{CommandResponse, JoinRequest},
        character::Alignment,
        config::EngineConfig,
        event::EventType,
        game::GamePhase,
        nomination::{Nomination, VoteSession},
        setup::TeamCounts,
    },
    services::game_service,
    state::AppState,
    utils::test_setup::setup_test_env,
    GameError,
};

fn test_state(seed: u64) -> AppState {
    setup_test_env();
    AppState::builtin(EngineConfig::default().with_seed(seed)).unwrap()
}

/// A lobby with a storyteller and `players` player seats.
async fn seated_game(state: &AppState, players: usize) -> (String, String, Vec<String>) {
    let created = game_service::create_game(state.clone(), None, None)
        .await
        .unwrap();
    let game_id = created.game_id;
    let storyteller = game_service::add_player(state.clone(), &game_id, JoinRequest::storyteller("st"))
        .await
        .unwrap()
        .id;
    let mut seats = Vec::new();
    for i in 1..=players {
        let seat = game_service::add_player(
            state.clone(),
            &game_id,
            JoinRequest::player(&format!("player{}", i)),
        )
        .await
        .unwrap();
        seats.push(seat.id);
    }
    (game_id, storyteller, seats)
}

/// A six player game that has finished setup and sits in its first night.
async fn game_at_first_night(state: &AppState) -> (String, String, Vec<String>) {
    let (game_id, st, seats) = seated_game(state, 6).await;
    game_service::enter_setup(state.clone(), &game_id, &st)
        .await
        .unwrap();
    game_service::validate_setup(state.clone(), &game_id)
        .await
        .unwrap();
    game_service::complete_setup(state.clone(), &game_id, &st)
        .await
        .unwrap();
    (game_id, st, seats)
}

/// Day one with a vote open on `seats[1]`.
async fn game_with_open_vote(state: &AppState) -> (String, String, Vec<String>) {
    let (game_id, st, seats) = game_at_first_night(state).await;
    game_service::advance_phase(state.clone(), &game_id, &st)
        .await
        .unwrap();
    game_service::nominate(state.clone(), &game_id, &seats[0], &seats[1])
        .await
        .unwrap();
    for _ in 0..2 {
        game_service::advance_phase(state.clone(), &game_id, &st)
            .await
            .unwrap();
    }
    game_service::start_vote(state.clone(), &game_id, &st)
        .await
        .unwrap();
    (game_id, st, seats)
}

#[tokio::test]
async fn test_setup_to_first_night() {
    let state = test_state(11);
    let (game_id, st, seats) = seated_game(&state, 6).await;

    let change = game_service::enter_setup(state.clone(), &game_id, &st)
        .await
        .unwrap();
    assert_eq!(change.to, GamePhase::Setup);

    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    let setup = game.setup.as_ref().unwrap();
    assert_eq!(setup.selected_characters.len(), 6);
    assert_eq!(setup.distribution_override, Some(TeamCounts::new(3, 1, 1, 1)));
    assert!(!setup.seed_notes.is_empty());

    let validation = game_service::validate_setup(state.clone(), &game_id)
        .await
        .unwrap();
    assert!(validation.is_valid, "{:?}", validation.errors);
    assert_eq!(validation.required, TeamCounts::new(3, 1, 1, 1));
    assert_eq!(validation.actual, validation.required);

    let change = game_service::complete_setup(state.clone(), &game_id, &st)
        .await
        .unwrap();
    assert_eq!(change.to, GamePhase::Night);
    assert_eq!(change.day, 1);
    assert!(change.invariant_violations.is_empty());

    let script = state.scripts.get("trouble_brewing").await.unwrap();
    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert_eq!(game.phase, GamePhase::Night);
    assert_eq!(game.day, 1);
    for seat_id in &seats {
        let seat = game.seat(seat_id).unwrap();
        let role = seat.role.as_deref().expect("every player has a role");
        let team = script.team_of(role).unwrap();
        assert_eq!(seat.alignment, Some(team.alignment()));
    }
    assert!(game.seat(&st).unwrap().role.is_none());
    assert_eq!(game.grimoire.positions.len(), 6);

    let events = game_service::get_game_events(state.clone(), &game_id)
        .await
        .unwrap();
    for expected in [
        EventType::SetupStarted,
        EventType::SetupValidated,
        EventType::SetupCompleted,
        EventType::RolesAssigned,
    ] {
        assert!(
            events.iter().any(|e| e.event_type == expected),
            "missing {:?}",
            expected
        );
    }
}

#[tokio::test]
async fn test_same_seed_deals_same_roles() {
    let mut dealt = Vec::new();
    for _ in 0..2 {
        let state = test_state(99);
        let (game_id, _, seats) = game_at_first_night(&state).await;
        let game = game_service::get_game_state(state.clone(), &game_id)
            .await
            .unwrap();
        let roles: Vec<Option<String>> = seats
            .iter()
            .map(|id| game.seat(id).unwrap().role.clone())
            .collect();
        dealt.push(roles);
    }
    assert_eq!(dealt[0], dealt[1]);
}

#[tokio::test]
async fn test_day_nomination_vote_execution() {
    let state = test_state(5);
    let (game_id, st, seats) = game_at_first_night(&state).await;

    let change = game_service::advance_phase(state.clone(), &game_id, &st)
        .await
        .unwrap();
    assert_eq!(change.to, GamePhase::Day);

    // Nominations are accepted during DAY already.
    let nomination = game_service::nominate(state.clone(), &game_id, &seats[0], &seats[1])
        .await
        .unwrap();
    assert!(!nomination.id.is_empty());

    for expected in [GamePhase::Nomination, GamePhase::Vote] {
        let change = game_service::advance_phase(state.clone(), &game_id, &st)
            .await
            .unwrap();
        assert_eq!(change.to, expected);
    }

    let vote = game_service::start_vote(state.clone(), &game_id, &st)
        .await
        .unwrap();
    assert_eq!(vote.nominee, seats[1]);
    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert!(game.current_nomination.as_ref().unwrap().closed);

    for voter in &seats {
        game_service::cast_vote(state.clone(), &game_id, voter, true)
            .await
            .unwrap();
    }
    let outcome = game_service::finish_vote(state.clone(), &game_id, &st)
        .await
        .unwrap();
    assert!(outcome.executed);
    assert_eq!(outcome.tally.yes, 6);
    assert_eq!(outcome.tally.no, 0);

    let again = game_service::finish_vote(state.clone(), &game_id, &st).await;
    assert!(matches!(again, Err(GameError::VoteRejected(_))));

    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert!(!game.seat(&seats[1]).unwrap().is_alive);
    assert!(game.executed_today);
    let events = game_service::get_game_events(state.clone(), &game_id)
        .await
        .unwrap();
    assert!(events
        .iter()
        .any(|e| e.event_type == EventType::ExecutionOccurred && e.payload["seat_id"] == seats[1]));

    game_service::advance_phase(state.clone(), &game_id, &st)
        .await
        .unwrap();
    let change = game_service::advance_phase(state.clone(), &game_id, &st)
        .await
        .unwrap();
    assert_eq!(change.to, GamePhase::Night);
    assert_eq!(change.day, 2);
    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert!(!game.executed_today);
    assert!(game.nominations_today.is_empty());
    assert!(game.current_vote.is_none());
}

#[tokio::test]
async fn test_failed_vote_executes_nobody() {
    let state = test_state(6);
    let (game_id, st, seats) = game_at_first_night(&state).await;
    game_service::advance_phase(state.clone(), &game_id, &st)
        .await
        .unwrap();
    game_service::advance_phase(state.clone(), &game_id, &st)
        .await
        .unwrap();
    game_service::nominate(state.clone(), &game_id, &seats[2], &seats[3])
        .await
        .unwrap();
    game_service::advance_phase(state.clone(), &game_id, &st)
        .await
        .unwrap();
    game_service::start_vote(state.clone(), &game_id, &st)
        .await
        .unwrap();

    for (i, voter) in seats.iter().enumerate() {
        game_service::cast_vote(state.clone(), &game_id, voter, i < 3)
            .await
            .unwrap();
    }
    let outcome = game_service::finish_vote(state.clone(), &game_id, &st)
        .await
        .unwrap();
    assert_eq!((outcome.tally.yes, outcome.tally.no), (3, 3));
    assert!(!outcome.executed);

    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert!(game.seat(&seats[3]).unwrap().is_alive);
}

#[tokio::test]
async fn test_double_vote_rejected() {
    let state = test_state(8);
    let (game_id, st, seats) = game_at_first_night(&state).await;
    game_service::advance_phase(state.clone(), &game_id, &st)
        .await
        .unwrap();
    game_service::nominate(state.clone(), &game_id, &seats[0], &seats[1])
        .await
        .unwrap();
    game_service::advance_phase(state.clone(), &game_id, &st)
        .await
        .unwrap();
    game_service::advance_phase(state.clone(), &game_id, &st)
        .await
        .unwrap();
    game_service::start_vote(state.clone(), &game_id, &st)
        .await
        .unwrap();

    let tally = game_service::cast_vote(state.clone(), &game_id, &seats[2], true)
        .await
        .unwrap();
    assert_eq!((tally.yes, tally.no), (1, 0));

    let response: CommandResponse<_> =
        game_service::cast_vote(state.clone(), &game_id, &seats[2], false)
            .await
            .into();
    assert!(!response.ok);
    assert_eq!(response.error.as_deref(), Some("Already voted"));

    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    let tally = game.current_vote.as_ref().unwrap().tally;
    assert_eq!((tally.yes, tally.no), (1, 0));
}

#[tokio::test]
async fn test_only_storyteller_drives_phases() {
    let state = test_state(2);
    let (game_id, st, seats) = seated_game(&state, 6).await;

    let result = game_service::enter_setup(state.clone(), &game_id, &seats[0]).await;
    assert!(matches!(result, Err(GameError::Unauthorized(_))));

    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert_eq!(game.phase, GamePhase::Lobby);

    game_service::enter_setup(state.clone(), &game_id, &st)
        .await
        .unwrap();
    let result = game_service::set_phase(state.clone(), &game_id, &st, GamePhase::Lobby).await;
    assert!(matches!(result, Err(GameError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_setup_requires_storyteller_seat() {
    let state = test_state(3);
    let created = game_service::create_game(state.clone(), None, None)
        .await
        .unwrap();
    let seat = game_service::add_player(state.clone(), &created.game_id, JoinRequest::player("a"))
        .await
        .unwrap();

    // Nobody holds the storyteller seat, so nobody is authorized.
    let result = game_service::enter_setup(state.clone(), &created.game_id, &seat.id).await;
    assert!(matches!(result, Err(GameError::Unauthorized(_))));

    let second = game_service::add_player(
        state.clone(),
        &created.game_id,
        JoinRequest::player("a"),
    )
    .await;
    assert!(matches!(second, Err(GameError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_invalid_selection_blocks_night() {
    let state = test_state(4);
    let (game_id, st, _) = seated_game(&state, 6).await;
    game_service::enter_setup(state.clone(), &game_id, &st)
        .await
        .unwrap();
    game_service::select_setup_characters(
        state.clone(),
        &game_id,
        &st,
        vec!["washerwoman".into(), "imp".into()],
    )
    .await
    .unwrap();

    let result = game_service::advance_phase(state.clone(), &game_id, &st).await;
    assert!(matches!(result, Err(GameError::PreconditionFailed(_))));
    let result = game_service::complete_setup(state.clone(), &game_id, &st).await;
    match result {
        Err(GameError::InvalidSetup(errors)) => {
            assert!(errors.contains(&"Selected 2 characters for 6 players".to_string()))
        }
        other => panic!("expected invalid setup, got {:?}", other),
    }

    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert_eq!(game.phase, GamePhase::Setup);
    assert!(game.seats.iter().all(|s| s.role.is_none()));

    let unknown = game_service::select_setup_characters(
        state.clone(),
        &game_id,
        &st,
        vec!["zombie".into()],
    )
    .await;
    assert!(matches!(unknown, Err(GameError::UnknownCharacters(ids)) if ids == vec!["zombie".to_string()]));
}

#[tokio::test]
async fn test_nomination_rules() {
    let state = test_state(10);
    let (game_id, st, seats) = game_at_first_night(&state).await;

    let early = game_service::nominate(state.clone(), &game_id, &seats[0], &seats[1]).await;
    assert!(matches!(early, Err(GameError::WrongPhase { .. })));

    game_service::advance_phase(state.clone(), &game_id, &st)
        .await
        .unwrap();
    let by_storyteller = game_service::nominate(state.clone(), &game_id, &st, &seats[1]).await;
    assert!(matches!(by_storyteller, Err(GameError::NominationRejected(_))));
    let of_storyteller = game_service::nominate(state.clone(), &game_id, &seats[0], &st).await;
    assert!(matches!(of_storyteller, Err(GameError::NominationRejected(_))));

    game_service::nominate(state.clone(), &game_id, &seats[0], &seats[1])
        .await
        .unwrap();
    let while_open = game_service::nominate(state.clone(), &game_id, &seats[2], &seats[3]).await;
    assert!(matches!(while_open, Err(GameError::NominationRejected(_))));
}

#[tokio::test]
async fn test_end_game_reveals_roles() {
    let state = test_state(12);
    let (game_id, st, seats) = game_at_first_night(&state).await;

    let view = game_service::get_game_view(state.clone(), &game_id, Some(&seats[0]))
        .await
        .unwrap();
    let hidden = view.seats.iter().filter(|s| s.role.is_none()).count();
    // Everyone but the viewer, plus the storyteller seat which has no role.
    assert_eq!(hidden, 6);

    let change = game_service::end_game(state.clone(), &game_id, &st, Some(Alignment::Good))
        .await
        .unwrap();
    assert_eq!(change.to, GamePhase::End);

    let view = game_service::get_game_view(state.clone(), &game_id, Some(&seats[0]))
        .await
        .unwrap();
    assert_eq!(view.winner, Some(Alignment::Good));
    assert!(view
        .seats
        .iter()
        .filter(|s| !s.is_storyteller)
        .all(|s| s.role.is_some()));

    let result = game_service::advance_phase(state.clone(), &game_id, &st).await;
    assert!(matches!(result, Err(GameError::InvalidTransition { .. })));

    game_service::remove_game(state.clone(), &game_id).await.unwrap();
    assert_eq!(state.game_count().await, 0);
    let gone = game_service::get_game_state(state.clone(), &game_id).await;
    assert!(matches!(gone, Err(GameError::GameNotFound(_))));
}

#[tokio::test]
async fn test_unknown_script_fails_creation() {
    let state = test_state(1);
    let result = game_service::create_game(state.clone(), Some("no_such_script"), None).await;
    assert!(matches!(result, Err(GameError::Script(_))));
    assert_eq!(state.game_count().await, 0);
}

#[tokio::test]
async fn test_forced_end_reports_invariant_violations() {
    let state = test_state(13);
    let (game_id, st, _) = seated_game(&state, 6).await;
    game_service::enter_setup(state.clone(), &game_id, &st)
        .await
        .unwrap();

    let change = game_service::set_phase(state.clone(), &game_id, &st, GamePhase::End)
        .await
        .unwrap();
    assert_eq!(change.from, GamePhase::Setup);
    assert_eq!(change.to, GamePhase::End);
    // Role and alignment are missing on all six player seats.
    assert_eq!(change.invariant_violations.len(), 12);
    assert!(change
        .invariant_violations
        .iter()
        .all(|v| v.contains("outside setup")));

    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert_eq!(game.phase, GamePhase::End);

    let events = game_service::get_game_events(state.clone(), &game_id)
        .await
        .unwrap();
    let violations: Vec<_> = events
        .iter()
        .filter(|e| e.event_type == EventType::InvariantViolation)
        .collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].payload["violations"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_vote_eligibility_rules() {
    let state = test_state(14);
    let (game_id, _st, seats) = game_with_open_vote(&state).await;
    {
        let handle = state.game(&game_id).await.unwrap();
        let mut session = handle.lock().await;
        let game = &mut session.game;
        apply_status(game, &seats[4], StatusKind::VoteRestricted, None, None, EffectDuration::UntilNextNight);
        apply_status(game, &seats[3], StatusKind::Master, Some(&seats[3]), Some(&seats[0]), EffectDuration::UntilNextNight);
        game.seat_mut(&seats[5]).unwrap().is_alive = false;
        let spent = game.seat_mut(&seats[2]).unwrap();
        spent.is_alive = false;
        spent.voting_power = 0;
    }

    let restricted = game_service::cast_vote(state.clone(), &game_id, &seats[4], true).await;
    assert!(matches!(restricted, Err(GameError::VoteRejected(_))));

    let early = game_service::cast_vote(state.clone(), &game_id, &seats[3], true).await;
    assert!(matches!(early, Err(GameError::VoteRejected(ref r)) if r.contains("master")));
    game_service::cast_vote(state.clone(), &game_id, &seats[0], true)
        .await
        .unwrap();
    game_service::cast_vote(state.clone(), &game_id, &seats[3], true)
        .await
        .unwrap();

    let tally = game_service::cast_vote(state.clone(), &game_id, &seats[5], true)
        .await
        .unwrap();
    assert_eq!((tally.yes, tally.no), (3, 0));
    let no_ghost_vote = game_service::cast_vote(state.clone(), &game_id, &seats[2], true).await;
    assert!(matches!(no_ghost_vote, Err(GameError::VoteRejected(_))));

    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert_eq!(game.seat(&seats[5]).unwrap().voting_power, 0);
    assert!(!game.current_vote.as_ref().unwrap().has_voted(&seats[4]));

    // The spent ghost vote stays spent in a later vote.
    {
        let handle = state.game(&game_id).await.unwrap();
        let mut session = handle.lock().await;
        let nomination = Nomination::new(seats[0].clone(), seats[3].clone());
        session.game.current_vote = Some(VoteSession::open(&nomination));
        session.game.current_nomination = Some(nomination);
    }
    let second = game_service::cast_vote(state.clone(), &game_id, &seats[5], true).await;
    assert!(matches!(second, Err(GameError::VoteRejected(_))));
}
