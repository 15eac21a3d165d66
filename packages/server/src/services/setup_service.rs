//! Character selection, setup validation and the finalized character pool.

use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::error::GameError;
use crate::models::character::Team;
use crate::models::game::{Game, GamePhase, ResolvedNightOrder};
use crate::models::script::Script;
use crate::models::setup::{ReminderToken, SetupState, SetupValidation, TeamCounts};
use crate::rules::distribution::{base_distribution, modifications_for};
use crate::rules::lineup::{count_by_team, resolve_lineup};

/// Fresh setup state. When the script declares a composition policy the
/// selection is seeded from it and its targets become the distribution override.
pub fn initialize_setup<'a>(game: &'a mut Game, script: &Script) -> &'a SetupState {
    let players = game.player_count();
    let mut setup = SetupState::default();

    if script.meta.composition.is_some() {
        let lineup = resolve_lineup(script, players, &[]);
        debug!(
            game_id = %game.id,
            players,
            seeded = lineup.selection.len(),
            "setup seeded from composition"
        );
        setup.character_modifications = modifications_for(&lineup.selection);
        setup.selected_characters = lineup.selection;
        setup.distribution_override = Some(lineup.targets);
        setup.seed_notes = lineup.notes;
    }

    game.setup.insert(setup)
}

pub fn select_characters(
    game: &mut Game,
    script: &Script,
    ids: Vec<String>,
    actor_seat: &str,
) -> Result<SetupState, GameError> {
    if !game.is_storyteller(actor_seat) {
        return Err(GameError::storyteller_only("select setup characters"));
    }
    if game.phase != GamePhase::Setup {
        return Err(GameError::wrong_phase("SETUP", game.phase));
    }

    let unknown: Vec<String> = ids.iter().filter(|id| !script.contains(id)).cloned().collect();
    if !unknown.is_empty() {
        return Err(GameError::UnknownCharacters(unknown));
    }
    let mut seen = std::collections::HashSet::new();
    if let Some(duplicate) = ids.iter().find(|id| !seen.insert(id.as_str())) {
        return Err(GameError::InvalidRequest(format!(
            "Character {} selected twice",
            duplicate
        )));
    }

    let setup = game.setup.get_or_insert_with(SetupState::default);
    setup.character_modifications = modifications_for(&ids);
    setup.selected_characters = ids;
    setup.is_validated = false;
    setup.character_pool.clear();
    Ok(setup.clone())
}

/// Base distribution (or the override) shifted by every setup modifier.
pub fn required_distribution(setup: &SetupState, players: usize) -> TeamCounts {
    setup
        .distribution_override
        .unwrap_or_else(|| base_distribution(players))
        .apply(&setup.modification_delta())
}

/// Checks the current selection and records the verdict on the setup. Idempotent.
pub fn validate_setup(game: &mut Game, script: &Script) -> SetupValidation {
    let players = game.player_count();
    let Some(setup) = game.setup.as_mut() else {
        return SetupValidation {
            is_valid: false,
            errors: vec!["Setup has not been started".to_string()],
            required: base_distribution(players),
            actual: TeamCounts::default(),
            player_count: players,
        };
    };

    let required = required_distribution(setup, players);
    let actual = count_by_team(script, &setup.selected_characters);
    let mut errors = Vec::new();

    let bounds = script.meta.player_count;
    if !bounds.contains(players) {
        errors.push(format!(
            "{} players is outside the script's {}-{} range",
            players, bounds.min, bounds.max
        ));
    }
    for id in &setup.selected_characters {
        match script.team_of(id) {
            None => errors.push(format!("Unknown character {}", id)),
            Some(team) if !team.is_pool_team() => {
                errors.push(format!("{} is a {} and cannot be in the bag", id, team))
            }
            Some(_) => {}
        }
    }
    for team in Team::POOL_TEAMS {
        if actual.get(team) != required.get(team) {
            errors.push(format!(
                "Expected {} {}, selected {}",
                required.get(team),
                team,
                actual.get(team)
            ));
        }
    }
    if setup.selected_characters.len() != players {
        errors.push(format!(
            "Selected {} characters for {} players",
            setup.selected_characters.len(),
            players
        ));
    }

    setup.is_validated = errors.is_empty();
    SetupValidation {
        is_valid: errors.is_empty(),
        errors,
        required,
        actual,
        player_count: players,
    }
}

/// Selected waking characters sorted by precedence. Ties keep script order.
pub fn resolve_night_order(script: &Script, selected: &[String]) -> ResolvedNightOrder {
    let ordered = |first_night: bool| {
        let mut waking: Vec<(u32, String)> = script
            .characters
            .iter()
            .filter(|c| selected.contains(&c.id))
            .filter_map(|c| c.night_precedence(first_night).map(|n| (n, c.id.clone())))
            .collect();
        waking.sort_by_key(|(n, _)| *n);
        waking.into_iter().map(|(_, id)| id).collect()
    };
    ResolvedNightOrder {
        first_night: ordered(true),
        other_nights: ordered(false),
    }
}

/// Validates once more, then freezes the bag: reminder tokens, shuffled pool
/// and the resolved night order.
pub fn complete_setup(game: &mut Game, script: &Script) -> Result<(), GameError> {
    let validation = validate_setup(game, script);
    if !validation.is_valid {
        return Err(GameError::InvalidSetup(validation.errors));
    }

    let mut rng = game.next_rng();
    let Some(setup) = game.setup.as_mut() else {
        return Err(GameError::PreconditionFailed("Setup has not been started".into()));
    };

    setup.reminder_tokens = setup
        .selected_characters
        .iter()
        .filter_map(|id| script.character(id))
        .flat_map(|c| {
            c.reminders.iter().map(|text| ReminderToken {
                character_id: c.id.clone(),
                text: text.clone(),
            })
        })
        .collect();

    let mut pool = setup.selected_characters.clone();
    pool.shuffle(&mut rng);
    setup.character_pool = pool;

    let night_order = resolve_night_order(script, &setup.selected_characters);
    let reminder_tokens = setup.reminder_tokens.clone();
    game.grimoire.night_order = night_order;
    game.grimoire.reminder_tokens = reminder_tokens;

    info!(game_id = %game.id, "setup completed");
    Ok(())
}
