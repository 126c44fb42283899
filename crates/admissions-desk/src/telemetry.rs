use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(
                    f,
                    "invalid log level/filter '{}': unable to build EnvFilter",
                    value
                )
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Install the global subscriber. Output goes to stderr so stdout stays free for
/// rendered tables and CSV exports.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => {
            EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn config(level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: level.to_string(),
        }
    }

    #[test]
    fn accepts_plain_level_and_directives() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        env::remove_var("RUST_LOG");
        for level in ["warn", "debug", "admissions_desk=trace,reqwest=warn"] {
            assert!(build_filter(&config(level)).is_ok(), "{level} should parse");
        }
    }

    #[test]
    fn reports_invalid_directive() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        env::remove_var("RUST_LOG");
        match build_filter(&config("admissions_desk=loud")) {
            Err(err @ TelemetryError::EnvFilter { .. }) => {
                assert!(err.to_string().contains("admissions_desk=loud"));
            }
            Err(other) => panic!("expected filter error, got {other}"),
            Ok(_) => panic!("directive should be rejected"),
        }
    }

    #[test]
    fn rust_log_takes_precedence_over_configured_level() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        env::set_var("RUST_LOG", "info");
        let filter = build_filter(&config("admissions_desk=loud"));
        env::remove_var("RUST_LOG");
        assert!(filter.is_ok());
    }
}
