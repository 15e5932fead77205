//! Session-scoped logging.

use std::{error::Error as StdError, fmt};

use log::{log, log_enabled, Level};

/// Logs through the `log` facade, prefixing every message with the session id.
///
/// Two inspector instances are alive for a moment during a handoff; the prefix tells their
/// messages apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLogger {
    session_id: u32,
    source: String,
}

impl SessionLogger {
    /// A logger for `source` in session `session_id`. Id `0` disables the prefix.
    #[must_use]
    pub fn new(session_id: u32, source: &str) -> Self {
        SessionLogger {
            session_id,
            source: source.to_string(),
        }
    }

    /// The same session, another source
    #[must_use]
    pub fn for_source(&self, source: &str) -> Self {
        SessionLogger::new(self.session_id, source)
    }

    /// The session id
    #[must_use]
    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    /// The log target messages are sent to
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The message as it is logged
    #[must_use]
    pub fn format(&self, message: &str, error: Option<&dyn StdError>) -> String {
        let mut line = if self.session_id == 0 {
            message.to_string()
        } else {
            format!("{} - {message}", self.session_id)
        };
        if let Some(error) = error {
            line.push_str(&format!(" ({error})"));
        }
        line
    }

    /// Logs `message` at `level`, with the error that caused it, if any.
    pub fn log(&self, level: Level, message: &str, error: Option<&dyn StdError>) {
        if log_enabled!(target: self.source.as_str(), level) {
            log!(target: self.source.as_str(), level, "{}", self.format(message, error));
        }
    }

    /// Logs at debug level
    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message, None);
    }

    /// Logs at info level
    pub fn info(&self, message: &str) {
        self.log(Level::Info, message, None);
    }

    /// Logs at warn level
    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message, None);
    }

    /// Logs at error level
    pub fn error(&self, message: &str, error: Option<&dyn StdError>) {
        self.log(Level::Error, message, error);
    }
}

impl fmt::Display for SessionLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.source, self.session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_format() {
        let logger = SessionLogger::new(42, "hawkscope::session");
        assert_eq!(logger.format("ready", None), "42 - ready");

        let error = Error::InvalidState("gone".to_string());
        assert_eq!(
            logger.format("failed", Some(&error)),
            "42 - failed (Invalid state - gone)"
        );

        assert_eq!(SessionLogger::new(0, "x").format("plain", None), "plain");
    }

    #[test]
    fn test_for_source() {
        let logger = SessionLogger::new(7, "a").for_source("b");
        assert_eq!(logger.session_id(), 7);
        assert_eq!(logger.source(), "b");
        assert_eq!(logger.to_string(), "b@7");
    }
}
