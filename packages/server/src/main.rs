use anyhow::Context;
use dotenvy::dotenv;
use log::{info, warn};
use std::sync::Arc;

use clocktower_server::services::script_service::FileScriptSource;
use clocktower_server::services::script_validation::validate_script;
use clocktower_server::state::AppState;
use clocktower_server::utils::config::CONFIG;
use clocktower_server::utils::logging::init_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenv() {
        eprintln!("Warning: failed to load .env file: {}", e);
    }

    let config = CONFIG.clone();
    init_logger(&config.log_level);
    info!("scripts directory: {}", config.scripts_dir.display());

    let source = FileScriptSource::new(config.scripts_dir.clone());
    let state = AppState::new(Arc::new(source), config);

    let script_ids = state
        .scripts
        .list_available()
        .await
        .context("listing available scripts")?;
    if script_ids.is_empty() {
        warn!("no scripts found");
    }

    for script_id in script_ids {
        match state.scripts.get(&script_id).await {
            Ok(script) => println!("{}\n", validate_script(&script, None).render()),
            Err(e) => warn!("skipping {}: {}", script_id, e),
        }
    }
    Ok(())
}
