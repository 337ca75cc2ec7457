//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handling never reads process-wide environment variables.

use crate::constants::{DEFAULT_DATABASE_PATH, DEFAULT_SESSION_TTL_HOURS, MAX_SESSION_TTL_HOURS};
use crate::{IntakeError, IntakeResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: PathBuf,
    session_ttl_hours: i64,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `database_path` may be `:memory:` for a throwaway in-process database.
    pub fn new(database_path: PathBuf, session_ttl_hours: i64) -> IntakeResult<Self> {
        if database_path.as_os_str().is_empty() {
            return Err(IntakeError::InvalidInput(
                "database path cannot be empty".into(),
            ));
        }
        validate_session_ttl_hours(session_ttl_hours)?;

        Ok(Self {
            database_path,
            session_ttl_hours,
        })
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

fn validate_session_ttl_hours(hours: i64) -> IntakeResult<()> {
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        return Err(IntakeError::InvalidInput(format!(
            "session ttl must be between 1 and {MAX_SESSION_TTL_HOURS} hours, got {hours}"
        )));
    }
    Ok(())
}

/// Resolve the database path from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_DATABASE_PATH`].
pub fn database_path_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
}

/// Parse the session lifetime (hours) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_SESSION_TTL_HOURS`].
pub fn session_ttl_hours_from_env_value(value: Option<String>) -> IntakeResult<i64> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value
        .map(|v| {
            v.parse::<i64>().map_err(|_| {
                IntakeError::InvalidInput(format!("session ttl is not an integer: {v}"))
            })
        })
        .transpose()?;

    Ok(parsed.unwrap_or(DEFAULT_SESSION_TTL_HOURS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_defaults_when_unset_or_blank() {
        assert_eq!(
            database_path_from_env_value(None),
            PathBuf::from(DEFAULT_DATABASE_PATH)
        );
        assert_eq!(
            database_path_from_env_value(Some("   ".into())),
            PathBuf::from(DEFAULT_DATABASE_PATH)
        );
        assert_eq!(
            database_path_from_env_value(Some(" /var/lib/intake.db ".into())),
            PathBuf::from("/var/lib/intake.db")
        );
    }

    #[test]
    fn session_ttl_parses_and_defaults() {
        assert_eq!(
            session_ttl_hours_from_env_value(None).unwrap(),
            DEFAULT_SESSION_TTL_HOURS
        );
        assert_eq!(session_ttl_hours_from_env_value(Some("48".into())).unwrap(), 48);
        assert!(matches!(
            session_ttl_hours_from_env_value(Some("forever".into())),
            Err(IntakeError::InvalidInput(_))
        ));
    }

    #[test]
    fn config_rejects_out_of_range_ttl() {
        assert!(CoreConfig::new(PathBuf::from(":memory:"), 0).is_err());
        assert!(CoreConfig::new(PathBuf::from(":memory:"), MAX_SESSION_TTL_HOURS + 1).is_err());

        let cfg = CoreConfig::new(PathBuf::from(":memory:"), 2).unwrap();
        assert_eq!(cfg.session_ttl(), chrono::Duration::hours(2));
    }

    #[test]
    fn config_rejects_empty_database_path() {
        assert!(matches!(
            CoreConfig::new(PathBuf::new(), 1),
            Err(IntakeError::InvalidInput(_))
        ));
    }
}
