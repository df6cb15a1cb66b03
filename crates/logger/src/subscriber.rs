use std::env::var;
use std::str::FromStr;

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{
    Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
    util::TryInitError,
};

/// Output format of the log layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" | "" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format `{other}` (expected compact or json)")),
        }
    }
}

/// Install the global subscriber. Panics if one is already set.
///
/// `RUST_LOG` overrides `level`. Without an explicit `format`,
/// `RUST_LOG_FORMAT` decides.
pub fn init(level: LevelFilter, format: Option<LogFormat>) {
    build(level, format).init();
}

/// Like [`init`], but fails instead of panicking when a subscriber exists
pub fn try_init(level: LevelFilter, format: Option<LogFormat>) -> Result<(), TryInitError> {
    build(level, format).try_init()
}

fn build(
    level: LevelFilter,
    format: Option<LogFormat>,
) -> impl SubscriberInitExt {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_layer = match format.unwrap_or_else(format_from_env) {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(log_layer)
}

fn format_from_env() -> LogFormat {
    let Ok(raw) = var("RUST_LOG_FORMAT") else {
        return LogFormat::default();
    };

    raw.parse()
        .inspect_err(|error| warn!("Ignoring RUST_LOG_FORMAT, falling back to compact: {error}"))
        .unwrap_or_default()
}
