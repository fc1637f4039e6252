use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Dependencies whose debug chatter drowns out trial traffic. Capped at
/// warn when the level comes from `APP_LOG_LEVEL`; an explicit `RUST_LOG`
/// overrides everything, caps included.
const QUIET_DEPS: &[&str] = &["hyper=warn", "mio=warn", "tokio=warn"];

#[derive(Debug)]
pub enum TelemetryError {
    Filter { directive: String, source: ParseError },
    Init(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Filter { directive, .. } => {
                write!(f, "log filter '{directive}' does not parse")
            }
            TelemetryError::Init(err) => write!(f, "tracing subscriber rejected: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Filter { source, .. } => Some(source),
            TelemetryError::Init(err) => Some(&**err),
        }
    }
}

/// Installs the process-wide subscriber: compact single-line events, no
/// ansi, filtered per the assembled directives. Callable once; a second
/// call reports `Init`.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directive = directives(&config.log_level);
            EnvFilter::try_new(&directive)
                .map_err(|source| TelemetryError::Filter { directive, source })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .try_init()
        .map_err(TelemetryError::Init)
}

/// The configured level for trial code plus warn caps for noisy deps.
fn directives(log_level: &str) -> String {
    let mut directive = log_level.trim().to_string();
    for dep in QUIET_DEPS {
        directive.push(',');
        directive.push_str(dep);
    }
    directive
}
