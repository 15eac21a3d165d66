use clocktower_server::{
    models::{
        api::{CommandResponse, JoinRequest},
        character::{Alignment, Team},
        config::EngineConfig,
        game::GamePhase,
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

async fn lobby(state: &AppState, players: usize) -> (String, String, Vec<String>) {
    let game_id = game_service::create_game(state.clone(), None, None)
        .await
        .unwrap()
        .game_id;
    let st = game_service::add_player(state.clone(), &game_id, JoinRequest::storyteller("st"))
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
    (game_id, st, seats)
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_baron_shifts_required_distribution() {
    let state = test_state(31);
    let (game_id, st, _) = lobby(&state, 7).await;
    game_service::enter_setup(state.clone(), &game_id, &st)
        .await
        .unwrap();

    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert_eq!(
        game.setup.as_ref().unwrap().distribution_override,
        Some(TeamCounts::new(4, 0, 2, 1))
    );

    let setup = game_service::select_setup_characters(
        state.clone(),
        &game_id,
        &st,
        ids(&["washerwoman", "librarian", "investigator", "chef", "poisoner", "baron", "imp"]),
    )
    .await
    .unwrap();
    assert_eq!(setup.character_modifications.len(), 1);
    assert_eq!(setup.character_modifications[0].character_id, "baron");

    let response: CommandResponse<_> = game_service::validate_setup(state.clone(), &game_id)
        .await
        .into();
    assert!(!response.ok);
    let details = response.details.unwrap();
    let errors: Vec<&str> = details["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e.as_str())
        .collect();
    assert!(errors.contains(&"Expected 2 townsfolk, selected 4"), "{:?}", errors);
    assert!(errors.contains(&"Expected 2 outsider, selected 0"), "{:?}", errors);
    assert_eq!(errors.len(), 2);

    game_service::select_setup_characters(
        state.clone(),
        &game_id,
        &st,
        ids(&["washerwoman", "librarian", "butler", "saint", "poisoner", "baron", "imp"]),
    )
    .await
    .unwrap();
    let validation = game_service::validate_setup(state.clone(), &game_id)
        .await
        .unwrap();
    assert_eq!(validation.required, TeamCounts::new(2, 2, 2, 1));
    assert_eq!(validation.actual, validation.required);

    game_service::complete_setup(state.clone(), &game_id, &st)
        .await
        .unwrap();
    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert_eq!(game.phase, GamePhase::Night);

    let setup = game.setup.as_ref().unwrap();
    let mut pool = setup.character_pool.clone();
    pool.sort();
    let mut selected = setup.selected_characters.clone();
    selected.sort();
    assert_eq!(pool, selected);

    let tokens: Vec<(&str, &str)> = game
        .grimoire
        .reminder_tokens
        .iter()
        .map(|t| (t.character_id.as_str(), t.text.as_str()))
        .collect();
    assert_eq!(
        tokens,
        vec![
            ("washerwoman", "Townsfolk"),
            ("washerwoman", "Wrong"),
            ("librarian", "Outsider"),
            ("librarian", "Wrong"),
            ("butler", "Master"),
            ("poisoner", "Poisoned"),
            ("imp", "Dead"),
        ]
    );
    assert_eq!(
        game.grimoire.night_order.first_night,
        ids(&["poisoner", "washerwoman", "librarian", "butler"])
    );
    assert_eq!(
        game.grimoire.night_order.other_nights,
        ids(&["poisoner", "imp", "butler"])
    );
}

#[tokio::test]
async fn test_seeding_follows_composition() {
    let state = test_state(32);
    let (game_id, st, _) = lobby(&state, 10).await;
    game_service::enter_setup(state.clone(), &game_id, &st)
        .await
        .unwrap();

    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    let setup = game.setup.as_ref().unwrap();
    assert_eq!(setup.distribution_override, Some(TeamCounts::new(6, 1, 2, 1)));
    assert_eq!(setup.selected_characters.len(), 10);
    assert_eq!(setup.seed_notes.len(), 10);
    // Declaration order within each team.
    assert!(setup.selected_characters.starts_with(&ids(&["imp", "poisoner", "spy", "butler"])));

    let validation = game_service::validate_setup(state.clone(), &game_id)
        .await
        .unwrap();
    assert!(validation.is_valid);
}

#[tokio::test]
async fn test_quick_assign_honors_claims() {
    let state = test_state(33);
    let (game_id, st, seats) = lobby(&state, 6).await;

    game_service::claim_role(state.clone(), &game_id, &seats[0], "imp")
        .await
        .unwrap();
    game_service::claim_role(state.clone(), &game_id, &seats[1], "chef")
        .await
        .unwrap();

    let taken = game_service::claim_role(state.clone(), &game_id, &seats[2], "imp").await;
    assert!(matches!(taken, Err(GameError::InvalidRequest(_))));
    let storyteller = game_service::claim_role(state.clone(), &game_id, &st, "monk").await;
    assert!(matches!(storyteller, Err(GameError::InvalidRequest(_))));
    let unknown = game_service::claim_role(state.clone(), &game_id, &seats[2], "zombie").await;
    assert!(matches!(unknown, Err(GameError::UnknownCharacters(_))));

    game_service::enter_setup(state.clone(), &game_id, &st)
        .await
        .unwrap();
    let assignments = game_service::quick_assign_roles(state.clone(), &game_id, &st, None)
        .await
        .unwrap();
    assert_eq!(assignments.len(), 6);

    let script = state.scripts.get("trouble_brewing").await.unwrap();
    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert_eq!(game.seat(&seats[0]).unwrap().role.as_deref(), Some("imp"));
    assert_eq!(game.seat(&seats[0]).unwrap().alignment, Some(Alignment::Evil));
    assert_eq!(game.seat(&seats[1]).unwrap().role.as_deref(), Some("chef"));

    let count = |team: Team| {
        game.player_seats()
            .iter()
            .filter(|s| s.role.as_deref().and_then(|r| script.team_of(r)) == Some(team))
            .count()
    };
    assert_eq!(count(Team::Demon), 1);
    assert_eq!(count(Team::Minion), 1);
    assert_eq!(count(Team::Outsider), 1);
    assert_eq!(count(Team::Townsfolk), 3);

    let change = game_service::advance_phase(state.clone(), &game_id, &st)
        .await
        .unwrap();
    assert_eq!(change.to, GamePhase::Night);
    assert!(change.invariant_violations.is_empty());
    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert_eq!(game.seat(&seats[0]).unwrap().role.as_deref(), Some("imp"));
}

#[tokio::test]
async fn test_player_count_outside_script_bounds() {
    let state = test_state(34);
    let (game_id, st, _) = lobby(&state, 4).await;
    game_service::enter_setup(state.clone(), &game_id, &st)
        .await
        .unwrap();

    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert!(game.setup.as_ref().unwrap().seed_notes[0].starts_with("No composition entry"));

    match game_service::validate_setup(state.clone(), &game_id).await {
        Err(GameError::InvalidSetup(errors)) => assert!(errors
            .iter()
            .any(|e| e == "4 players is outside the script's 5-15 range")),
        other => panic!("expected invalid setup, got {:?}", other),
    }

    let result = game_service::quick_assign_roles(state.clone(), &game_id, &st, None).await;
    assert!(matches!(result, Err(GameError::RoleAssignment(_))));
    let game = game_service::get_game_state(state.clone(), &game_id)
        .await
        .unwrap();
    assert!(game.seats.iter().all(|s| s.role.is_none()));
    assert!(game.setup.as_ref().unwrap().character_pool.is_empty());
}

#[tokio::test]
async fn test_lobby_seat_management() {
    let state = test_state(35);
    let (game_id, st, seats) = lobby(&state, 3).await;

    let result = game_service::remove_player(state.clone(), &game_id, &seats[1], &seats[0]).await;
    assert!(matches!(result, Err(GameError::Unauthorized(_))));

    game_service::remove_player(state.clone(), &game_id, &seats[1], &seats[1])
        .await
        .unwrap();
    game_service::remove_player(state.clone(), &game_id, &seats[2], &st)
        .await
        .unwrap();

    let second = game_service::add_player(state.clone(), &game_id, JoinRequest::storyteller("other")).await;
    assert!(matches!(second, Err(GameError::PreconditionFailed(_))));
    let npc = game_service::add_player(state.clone(), &game_id, JoinRequest::npc())
        .await
        .unwrap();
    assert!(npc.is_npc);

    let view = game_service::get_game_view(state.clone(), &game_id, None)
        .await
        .unwrap();
    assert_eq!(view.seats.len(), 3);

    game_service::enter_setup(state.clone(), &game_id, &st)
        .await
        .unwrap();
    let late = game_service::add_player(state.clone(), &game_id, JoinRequest::player("late")).await;
    assert!(matches!(late, Err(GameError::WrongPhase { .. })));
}
