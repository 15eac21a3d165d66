use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;

use crate::actions::ActionRegistry;
use crate::error::{GameError, ScriptError};
use crate::models::config::EngineConfig;
use crate::models::event::EventLog;
use crate::models::game::Game;
use crate::services::night_order::NightOrderProcessor;
use crate::services::script_service::{InMemoryScriptSource, ScriptCache, ScriptSource};

/// A game and its event log, always locked together.
#[derive(Debug)]
pub struct GameSession {
    pub game: Game,
    pub events: EventLog,
}

impl GameSession {
    pub fn new(game: Game) -> Self {
        let events = EventLog::new(&game.id);
        Self { game, events }
    }
}

/// Every mutation of one game goes through this lock, one command at a time.
pub type GameHandle = Arc<Mutex<GameSession>>;

#[derive(Clone)]
pub struct AppState {
    pub games: Arc<Mutex<HashMap<String, GameHandle>>>,
    pub scripts: ScriptCache,
    pub actions: Arc<ActionRegistry>,
    pub config: Arc<EngineConfig>,
}

impl AppState {
    pub fn new(source: Arc<dyn ScriptSource>, config: EngineConfig) -> Self {
        AppState {
            games: Arc::new(Mutex::new(HashMap::new())),
            scripts: ScriptCache::new(source),
            actions: Arc::new(ActionRegistry::standard()),
            config: Arc::new(config),
        }
    }

    /// State backed by the bundled scripts only.
    pub fn builtin(config: EngineConfig) -> Result<Self, ScriptError> {
        Ok(Self::new(Arc::new(InMemoryScriptSource::builtin()?), config))
    }

    pub async fn game(&self, game_id: &str) -> Result<GameHandle, GameError> {
        self.games
            .lock()
            .await
            .get(game_id)
            .cloned()
            .ok_or_else(|| GameError::GameNotFound(game_id.to_string()))
    }

    pub async fn insert_game(&self, session: GameSession) -> GameHandle {
        let id = session.game.id.clone();
        let handle = Arc::new(Mutex::new(session));
        self.games.lock().await.insert(id, handle.clone());
        handle
    }

    pub async fn remove_game(&self, game_id: &str) -> Option<GameHandle> {
        self.games.lock().await.remove(game_id)
    }

    pub async fn game_count(&self) -> usize {
        self.games.lock().await.len()
    }

    pub fn night_processor(&self) -> NightOrderProcessor {
        NightOrderProcessor::new(self.actions.clone(), self.config.bluff_count)
    }
}
