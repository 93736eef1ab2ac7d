use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise structured JSON logging on stdout.
/// `RUST_LOG` selects the level; `default_filter` applies when it is unset.
/// Records emitted through the `log` facade are forwarded as well.
pub fn init_telemetry(default_filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .init();
}
