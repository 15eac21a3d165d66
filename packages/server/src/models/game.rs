use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use super::action::{ActionPhase, EffectDuration};
use super::character::Alignment;
use super::nomination::{Nomination, VoteSession};
use super::seat::Seat;
use super::setup::{ReminderToken, SetupState};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Lobby,
    Setup,
    Night,
    Day,
    Nomination,
    Vote,
    Execution,
    End,
}

impl GamePhase {
    /// The single phase reachable through a plain advance.
    pub fn next(&self) -> Option<GamePhase> {
        match self {
            GamePhase::Lobby => Some(GamePhase::Setup),
            GamePhase::Setup => Some(GamePhase::Night),
            GamePhase::Night => Some(GamePhase::Day),
            GamePhase::Day => Some(GamePhase::Nomination),
            GamePhase::Nomination => Some(GamePhase::Vote),
            GamePhase::Vote => Some(GamePhase::Execution),
            GamePhase::Execution => Some(GamePhase::Night),
            GamePhase::End => None,
        }
    }

    pub fn can_transition_to(&self, target: GamePhase) -> bool {
        if target == GamePhase::End {
            return !matches!(self, GamePhase::Lobby | GamePhase::End);
        }
        self.next() == Some(target)
    }

    /// Roles are not yet handed out in these phases.
    pub fn is_pre_assignment(&self) -> bool {
        matches!(self, GamePhase::Lobby | GamePhase::Setup)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::Lobby => "LOBBY",
            GamePhase::Setup => "SETUP",
            GamePhase::Night => "NIGHT",
            GamePhase::Day => "DAY",
            GamePhase::Nomination => "NOMINATION",
            GamePhase::Vote => "VOTE",
            GamePhase::Execution => "EXECUTION",
            GamePhase::End => "END",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ResolvedNightOrder {
    pub first_night: Vec<String>,
    pub other_nights: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GrimoirePosition {
    pub seat_id: String,
    pub position: u32,
    pub character_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GrimoireState {
    pub positions: Vec<GrimoirePosition>,
    pub reminder_tokens: Vec<ReminderToken>,
    pub night_order: ResolvedNightOrder,
    /// Targets submitted during the current night, keyed by seat id.
    pub pending_choices: BTreeMap<String, Vec<String>>,
}

/// One resolved ability use.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AbilityRecord {
    pub action_id: String,
    pub seat_id: Option<String>,
    pub character_id: Option<String>,
    pub phase: ActionPhase,
    pub day: u32,
    pub targets: Vec<String>,
    pub success: bool,
    pub used_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Game {
    pub id: String,
    pub script_id: String,
    pub phase: GamePhase,
    pub day: u32,
    pub seed: u64,
    pub rng_draws: u64,
    pub seats: Vec<Seat>,
    pub abilities: Vec<AbilityRecord>,
    pub current_nomination: Option<Nomination>,
    pub current_vote: Option<VoteSession>,
    /// Every nomination made today, open or closed.
    pub nominations_today: Vec<Nomination>,
    pub executed_today: bool,
    pub storyteller_seat_id: Option<String>,
    pub setup: Option<SetupState>,
    pub grimoire: GrimoireState,
    /// Characters claimed by seats while in the lobby.
    pub role_claims: BTreeMap<String, String>,
    pub winner: Option<Alignment>,
    pub created_at: DateTime<Utc>,
    next_position: u32,
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Game {{ id: {}, script: {}, phase: {}, day: {}, seats: {}, storyteller: {:?} }}",
            self.id,
            self.script_id,
            self.phase,
            self.day,
            self.seats.len(),
            self.storyteller_seat_id
        )
    }
}

impl Game {
    pub fn new(script_id: String, seed: u64) -> Self {
        Game {
            id: uuid::Uuid::new_v4().to_string(),
            script_id,
            phase: GamePhase::Lobby,
            day: 0,
            seed,
            rng_draws: 0,
            seats: Vec::new(),
            abilities: Vec::new(),
            current_nomination: None,
            current_vote: None,
            nominations_today: Vec::new(),
            executed_today: false,
            storyteller_seat_id: None,
            setup: None,
            grimoire: GrimoireState::default(),
            role_claims: BTreeMap::new(),
            winner: None,
            created_at: Utc::now(),
            next_position: 0,
        }
    }

    /// Deterministic generator for the next random draw of this game.
    pub fn next_rng(&mut self) -> StdRng {
        let stream = self.rng_draws.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        self.rng_draws += 1;
        StdRng::seed_from_u64(self.seed ^ stream)
    }

    pub fn add_seat(&mut self, player_id: Option<String>, is_npc: bool) -> &Seat {
        let seat = Seat::new(
            uuid::Uuid::new_v4().to_string(),
            player_id,
            is_npc,
            self.next_position,
        );
        self.next_position += 1;
        self.seats.push(seat);
        &self.seats[self.seats.len() - 1]
    }

    pub fn seat(&self, seat_id: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == seat_id)
    }

    pub fn seat_mut(&mut self, seat_id: &str) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.id == seat_id)
    }

    pub fn is_storyteller(&self, seat_id: &str) -> bool {
        self.storyteller_seat_id.as_deref() == Some(seat_id)
    }

    /// Non-storyteller seats in seating order.
    pub fn player_seats(&self) -> Vec<&Seat> {
        let mut seats: Vec<&Seat> = self
            .seats
            .iter()
            .filter(|s| !self.is_storyteller(&s.id))
            .collect();
        seats.sort_by_key(|s| s.position);
        seats
    }

    pub fn player_seat_ids(&self) -> Vec<String> {
        self.player_seats().iter().map(|s| s.id.clone()).collect()
    }

    pub fn player_count(&self) -> usize {
        self.player_seats().len()
    }

    pub fn seat_holding(&self, character_id: &str) -> Option<&Seat> {
        self.player_seats().into_iter().find(|s| s.holds(character_id))
    }

    /// Closest alive seat on each side of `seat_id`, treating the seating as a circle.
    pub fn alive_neighbors(&self, seat_id: &str) -> Vec<&Seat> {
        let circle = self.player_seats();
        let Some(index) = circle.iter().position(|s| s.id == seat_id) else {
            return Vec::new();
        };
        let n = circle.len();
        let mut neighbors: Vec<&Seat> = Vec::new();
        let walk = |step: usize| {
            (1..n)
                .map(|offset| circle[(index + offset * step) % n])
                .find(|s| s.is_alive)
        };
        // Stepping by n-1 walks counter-clockwise.
        for step in [1, n.saturating_sub(1)] {
            if let Some(seat) = walk(step) {
                if !neighbors.iter().any(|s| s.id == seat.id) {
                    neighbors.push(seat);
                }
            }
        }
        neighbors
    }

    /// Drops status effects whose duration matches.
    pub fn expire_effects(&mut self, duration: EffectDuration) {
        for seat in &mut self.seats {
            seat.status_effects.retain(|e| e.duration != duration);
        }
    }

    /// Global consistency checks. An empty result means the game is consistent.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        let mut ids = HashSet::new();
        for seat in &self.seats {
            if !ids.insert(seat.id.as_str()) {
                violations.push(format!("Duplicate seat id {}", seat.id));
            }
        }

        if let Some(storyteller) = &self.storyteller_seat_id {
            if self.seat(storyteller).is_none() {
                violations.push(format!(
                    "Storyteller seat {} does not exist",
                    storyteller
                ));
            }
        }

        if !self.phase.is_pre_assignment() {
            for seat in self.player_seats() {
                if seat.role.is_none() {
                    violations.push(format!("Seat {} has no role outside setup", seat.id));
                }
                if seat.alignment.is_none() {
                    violations.push(format!(
                        "Seat {} has no alignment outside setup",
                        seat.id
                    ));
                }
            }
        }

        let open_nominations = self.nominations_today.iter().filter(|n| !n.closed).count();
        if open_nominations > 1 {
            violations.push(format!("{} open nominations", open_nominations));
        }

        if let (Some(vote), Some(nomination)) = (&self.current_vote, &self.current_nomination) {
            if vote.nomination_id != nomination.id {
                violations.push(format!(
                    "Vote session {} does not belong to the current nomination {}",
                    vote.nomination_id, nomination.id
                ));
            }
        }

        violations
    }
}
