use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Output format of the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, span fields flattened in.
    Json,
    /// Human-readable lines for local runs.
    Text,
}

impl LogFormat {
    /// Pick the format from a `RUST_LOG_FORMAT` value. Anything other than
    /// `json` selects text; an unset variable selects JSON.
    #[must_use]
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            None => Self::Json,
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            Some(_) => Self::Text,
        }
    }
}

/// INFO floor, extended by any `RUST_LOG` directives.
fn env_filter() -> EnvFilter {
    EnvFilter::from_default_env().add_directive(Level::INFO.into())
}

/// Initialize the tracing subscriber from `RUST_LOG_FORMAT` and `RUST_LOG`.
pub fn init_tracing() {
    let format = LogFormat::from_env_value(std::env::var("RUST_LOG_FORMAT").ok().as_deref());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_target(false),
            )
            .with(env_filter())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(env_filter())
            .init(),
    }
}
