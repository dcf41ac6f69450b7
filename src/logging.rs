use tracing::Level;

/// Installs the global fmt subscriber. Later calls leave the first one in place.
pub fn init_logging(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
