//! Transactional storage.
//!
//! The intake workflow depends only on the [`IntakeRepository`] and [`AccountRepository`]
//! traits. [`SqliteStore`] provides them over a single SQLite connection and runs every unit of
//! work inside one immediate transaction.

mod sqlite;

use crate::records::{
    Consent, Encounter, EncounterSummary, GeneralHealth, HealthQuestionnaire, NewConsent,
    NewPatient, Patient, PhototypeAssessment, PhototypeScores, SubRecordKind,
};
use crate::repositories::accounts::{SessionOwner, User};
use crate::principal::Role;
use crate::{IntakeError, IntakeResult};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;

/// Storage operations used by the intake workflow.
pub trait IntakeRepository {
    fn find_patient_by_cpf(&self, cpf: &str) -> IntakeResult<Option<Patient>>;

    /// Inserts a patient. A national ID collision is reported as
    /// [`IntakeError::DuplicatePatient`].
    fn insert_patient(
        &self,
        patient: &NewPatient,
        created_by: i64,
        created_at: DateTime<Utc>,
    ) -> IntakeResult<Patient>;

    fn insert_encounter(
        &self,
        patient_id: i64,
        user_id: i64,
        date: DateTime<Utc>,
    ) -> IntakeResult<Encounter>;

    fn find_encounter(&self, id: i64) -> IntakeResult<Option<Encounter>>;

    fn insert_consent(
        &self,
        consent: &NewConsent,
        created_at: DateTime<Utc>,
    ) -> IntakeResult<Consent>;

    fn insert_general_health(
        &self,
        questionnaire: &HealthQuestionnaire,
        created_at: DateTime<Utc>,
    ) -> IntakeResult<GeneralHealth>;

    fn insert_phototype(
        &self,
        scores: &PhototypeScores,
        created_at: DateTime<Utc>,
    ) -> IntakeResult<PhototypeAssessment>;

    /// Points the encounter's `kind` link at `record_id`, only if that link is still unset.
    ///
    /// Returns `false` when the link was already set (or the encounter vanished).
    fn link_sub_record(
        &self,
        encounter_id: i64,
        kind: SubRecordKind,
        record_id: i64,
    ) -> IntakeResult<bool>;

    fn list_encounters_for_user(&self, user_id: i64) -> IntakeResult<Vec<EncounterSummary>>;
}

/// Storage operations for users and their sessions.
pub trait AccountRepository {
    fn insert_user(
        &self,
        username: &str,
        email: &str,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> IntakeResult<User>;

    fn find_user_by_username(&self, username: &str) -> IntakeResult<Option<User>>;

    fn list_users(&self) -> IntakeResult<Vec<User>>;

    fn insert_session(
        &self,
        token_hash: &str,
        user_id: i64,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> IntakeResult<()>;

    fn find_session_owner(&self, token_hash: &str) -> IntakeResult<Option<SessionOwner>>;
}

/// SQLite-backed store. One connection, serialised behind a mutex.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and runs pending migrations.
    pub fn open(path: &Path) -> IntakeResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database (for tests and dry runs).
    pub fn open_in_memory() -> IntakeResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> IntakeResult<Self> {
        configure_pragmas(&conn)?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` inside one immediate transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`; any error rolls back every write `f`
    /// made.
    pub fn with_tx<T>(&self, f: impl FnOnce(&Connection) -> IntakeResult<T>) -> IntakeResult<T> {
        let mut conn = self.conn.lock().map_err(|_| IntakeError::LockPoisoned)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Runs a read-only closure without opening a transaction.
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> IntakeResult<T>) -> IntakeResult<T> {
        let conn = self.conn.lock().map_err(|_| IntakeError::LockPoisoned)?;
        f(&conn)
    }
}

fn configure_pragmas(conn: &Connection) -> IntakeResult<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> IntakeResult<()> {
    let current_version = current_schema_version(conn);

    let migrations: [(i64, &str); 1] = [(1, include_str!("../../migrations/001_initial.sql"))];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql)
                .map_err(|e| IntakeError::MigrationFailed {
                    version,
                    reason: e.to_string(),
                })?;
        }
    }

    Ok(())
}

/// Current schema version (0 if no schema exists yet).
fn current_schema_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .ok()
    .flatten()
    .unwrap_or(0)
}
