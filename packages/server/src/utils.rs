pub mod config;
pub mod logging;
pub mod test_setup;
