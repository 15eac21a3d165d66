pub mod actions;
pub mod error;
pub mod models;
pub mod rules;
pub mod services;
pub mod state;
pub mod utils;

pub use error::{GameError, ScriptError};
pub use state::AppState;
