//! # Intake Core
//!
//! Core business logic for the dermatology research intake service.
//!
//! This crate contains the encounter (atendimento) workflow and its storage:
//! - Patient registration, unique by national ID (CPF)
//! - Encounters with write-once links to consent, general health and phototype records
//! - Phototype code-domain validation
//! - Users, roles and session tokens
//! - SQLite storage with embedded migrations
//!
//! **No API concerns**: HTTP servers, request extraction and response shaping belong in
//! `api-rest` or `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod principal;
pub mod records;
pub mod repositories;
pub mod store;
pub mod validation;

pub use config::CoreConfig;
pub use error::{IntakeError, IntakeResult};
pub use intake_types::{EmailAddress, NonEmptyText, TextError};
pub use principal::{Principal, Role};
pub use repositories::accounts::{AccountService, IssuedSession, User};
pub use repositories::intake::IntakeService;
pub use store::SqliteStore;
