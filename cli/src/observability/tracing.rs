use std::{error::Error, io::stderr};
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
};

use gly_application::infrastructure_config::{Config, LogFormat};

/// Variable that overrides the configured filter for this binary only.
pub const LOG_ENV: &str = "GLY_LOG";

/// Installs the global subscriber. Everything is written to stderr so that
/// stdout only carries the report.
pub fn setup_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    let registry = tracing_subscriber::registry().with(log_filter(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => registry
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new("gly".to_string(), stderr))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(pretty_layer(config.logging.include_location))
            .try_init()?,
    }

    Ok(())
}

/// `GLY_LOG`, then `RUST_LOG`, then the configured level.
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level))
}

fn pretty_layer<S>(include_location: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .compact()
        .with_writer(stderr)
        .with_target(false)
        .with_thread_names(true)
        .with_file(include_location)
        .with_line_number(include_location)
}
