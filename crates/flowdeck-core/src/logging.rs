use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Filter is taken from the `FLOWDECK_LOG` environment variable, falling
/// back to warnings only. Safe to call once per process; returns quietly if
/// a subscriber is already installed (tests install their own).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("FLOWDECK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
