use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pinner_core::LogFormat;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_telemetry(
    format: LogFormat,
    environment: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "pinner=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
    }

    tracing::info!(environment = %environment, log_format = ?format, "Tracing initialized");
    Ok(())
}
