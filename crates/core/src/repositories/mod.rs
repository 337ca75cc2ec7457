//! Services over the intake store.
//!
//! `intake` holds the encounter workflow; `accounts` holds users and session tokens.

pub mod accounts;
pub mod intake;
