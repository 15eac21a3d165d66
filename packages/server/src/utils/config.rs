use once_cell::sync::Lazy;

use crate::models::config::EngineConfig;

/// Process-wide configuration, read from the environment on first use.
pub static CONFIG: Lazy<EngineConfig> = Lazy::new(EngineConfig::from_env);
