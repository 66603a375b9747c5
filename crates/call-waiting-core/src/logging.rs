//! Logging setup
//!
//! All crate events are emitted under the `call_waiting` target, so
//! `RUST_LOG=call_waiting=debug` isolates them.

use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogSettings;
use crate::error::{CallWaitingError, Result};

/// Install a global `tracing` subscriber for `settings`
///
/// Fails if a global subscriber is already installed.
pub fn setup_logging(settings: &LogSettings) -> Result<()> {
    let level = parse_log_level(&settings.level)?;
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let mut subscriber = fmt::Subscriber::builder().with_env_filter(filter);

    if settings.file_info {
        subscriber = subscriber.with_file(true).with_line_number(true);
    }

    let result = if settings.json {
        subscriber.with_writer(std::io::stdout).json().try_init()
    } else {
        subscriber.try_init()
    };

    result.map_err(|e| CallWaitingError::config(format!("Failed to install logger: {}", e)))
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level).map_err(|_| CallWaitingError::config(format!("Invalid log level: {}", level)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    #[serial]
    fn test_second_install_fails() {
        let settings = LogSettings::default();
        // Another test may already have installed one
        let _ = setup_logging(&settings);
        assert!(setup_logging(&settings).is_err());
    }
}
