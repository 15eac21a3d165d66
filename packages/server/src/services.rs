pub mod game_service;
pub mod night_order;
pub mod phase;
pub mod script_service;
pub mod script_validation;
pub mod setup_service;
