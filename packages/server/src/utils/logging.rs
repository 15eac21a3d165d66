use env_logger::Builder;
use log::LevelFilter;
use std::str::FromStr;

/// Installs `env_logger` as the `log` backend. `tracing` events reach it
/// through the `log` feature.
pub fn init_logger(level: &str) {
    let level = LevelFilter::from_str(level).unwrap_or(LevelFilter::Info);
    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .format_timestamp(Some(env_logger::TimestampPrecision::Millis))
        .format_target(true);
    if let Err(e) = builder.try_init() {
        eprintln!("Warning: logger already initialized: {}", e);
    }
}
