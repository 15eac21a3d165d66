use dotenvy::dotenv;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn setup_test_env() {
    INIT.call_once(|| {
        dotenv().ok();
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("clocktower_server=debug"),
        )
        .is_test(true)
        .try_init();
    });
}
