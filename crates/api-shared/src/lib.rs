//! # API Shared
//!
//! Shared utilities and definitions for the intake APIs.
//!
//! Contains:
//! - Wire schemas (`schemas` module), serialisable and documented for OpenAPI
//! - Shared services like `HealthService`
//! - Authentication header parsing
//!
//! Field names follow the established wire contract (`nome_paciente`, `atendimento_id`, ...).

pub mod auth;
pub mod health;
pub mod schemas;

pub use health::HealthService;
pub use schemas::*;
