use std::time::Duration;

use crate::Address;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

pub fn addr(leaf: &str) -> Address {
    Address::new("Vehicle", leaf)
}

/// Lets spawned tasks run; with a paused clock this also advances time.
pub async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
}
