use crate::principal::Role;
use crate::records::SubRecordKind;
use crate::validation::PhototypeField;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("patient with national id {cpf} is already registered")]
    DuplicatePatient { cpf: String },
    #[error("encounter {0} not found")]
    EncounterNotFound(i64),
    #[error("encounter {encounter_id} already has a {kind} attached")]
    AlreadyAttached {
        encounter_id: i64,
        kind: SubRecordKind,
    },
    #[error("invalid value {value} for {field}")]
    InvalidFieldValue { field: PhototypeField, value: i64 },
    #[error("no encounters found for user {user_id}")]
    NoEncountersFound { user_id: i64 },
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("authentication required")]
    Unauthenticated,
    #[error("role {actual} does not satisfy required role {required}")]
    Forbidden { required: Role, actual: Role },
    #[error("user {0} not found")]
    UserNotFound(String),
    #[error("username {0} is already taken")]
    DuplicateUser(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("migration to version {version} failed: {reason}")]
    MigrationFailed { version: i64, reason: String },
    #[error("store lock poisoned")]
    LockPoisoned,
    #[error("corrupt stored value for {field}: {value}")]
    CorruptRecord { field: &'static str, value: String },
}

impl From<intake_types::TextError> for IntakeError {
    fn from(err: intake_types::TextError) -> Self {
        IntakeError::InvalidInput(err.to_string())
    }
}

pub type IntakeResult<T> = std::result::Result<T, IntakeError>;
