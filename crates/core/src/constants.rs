//! Constants used throughout the intake core crate.

/// Default SQLite database file when no explicit path is configured.
pub const DEFAULT_DATABASE_PATH: &str = "intake.db";

/// Default lifetime of an issued session token, in hours.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

/// Upper bound accepted for `INTAKE_SESSION_TTL_HOURS` (30 days).
pub const MAX_SESSION_TTL_HOURS: i64 = 720;

/// Number of random bytes in a session token before hex encoding.
pub const SESSION_TOKEN_BYTES: usize = 32;
