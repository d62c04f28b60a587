use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. `LOG_LEVEL` takes an env-filter directive, default `info`.
pub fn init_telemetry() {
    let directive = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
