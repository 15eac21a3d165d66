use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding `<script_id>.json` files.
    pub scripts_dir: PathBuf,
    pub default_script: String,
    /// Fixed seed for every new game, for reproducible runs.
    pub fixed_seed: Option<u64>,
    pub bluff_count: usize,
    pub log_level: String,
    // Log each seat's character at assignment time
    pub show_player_roles: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let debug_mode = cfg!(debug_assertions) || env::var("DEBUG_MODE").is_ok();

        Self {
            scripts_dir: PathBuf::from("scripts"),
            default_script: "trouble_brewing".to_string(),
            fixed_seed: None,
            bluff_count: 3,
            log_level: "info".to_string(),
            show_player_roles: debug_mode,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let scripts_dir = env::var("CLOCKTOWER_SCRIPTS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.scripts_dir);
        let default_script =
            env::var("CLOCKTOWER_DEFAULT_SCRIPT").unwrap_or(defaults.default_script);
        let fixed_seed = env::var("CLOCKTOWER_SEED")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());
        let bluff_count = env::var("CLOCKTOWER_BLUFF_COUNT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.bluff_count);
        let log_level = env::var("CLOCKTOWER_LOG_LEVEL").unwrap_or(defaults.log_level);
        let show_player_roles = env::var("DEBUG_SHOW_PLAYER_ROLES")
            .map(|v| v == "true")
            .unwrap_or(defaults.show_player_roles);

        Self {
            scripts_dir,
            default_script,
            fixed_seed,
            bluff_count,
            log_level,
            show_player_roles,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.fixed_seed = Some(seed);
        self
    }
}
