//! Intake records.
//!
//! `New*` types and the questionnaire/score structs are validated inputs; the remaining types
//! are immutable snapshots read back from the store.

use crate::error::IntakeError;
use chrono::{DateTime, NaiveDate, Utc};
use intake_types::{EmailAddress, NonEmptyText};
use serde::Serialize;
use std::str::FromStr;

// ============================================================================
// PATIENT
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Sex {
    #[serde(rename = "masculino")]
    Male,
    #[serde(rename = "feminino")]
    Female,
    #[serde(rename = "outro")]
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "masculino",
            Sex::Female => "feminino",
            Sex::Other => "outro",
        }
    }
}

impl FromStr for Sex {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "masculino" | "m" => Ok(Sex::Male),
            "feminino" | "f" => Ok(Sex::Female),
            "outro" | "o" => Ok(Sex::Other),
            other => Err(IntakeError::InvalidInput(format!("unknown sex: {other}"))),
        }
    }
}

/// Validated patient registration payload.
#[derive(Clone, Debug)]
pub struct NewPatient {
    pub name: NonEmptyText,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    /// Free-text description when `sex` does not cover the patient.
    pub sex_other: Option<NonEmptyText>,
    /// National ID (CPF). Unique across all patients.
    pub cpf: NonEmptyText,
    pub sus_card_number: Option<NonEmptyText>,
    pub address: Option<NonEmptyText>,
    pub phone: Option<NonEmptyText>,
    pub email: Option<EmailAddress>,
    pub research_consent: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub sex_other: Option<String>,
    pub cpf: String,
    pub sus_card_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub research_consent: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// ENCOUNTER
// ============================================================================

/// The three optional sub-records an encounter can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubRecordKind {
    Consent,
    GeneralHealth,
    Phototype,
}

impl SubRecordKind {
    /// Column on the `encounters` table holding the link.
    pub(crate) fn link_column(&self) -> &'static str {
        match self {
            SubRecordKind::Consent => "consent_id",
            SubRecordKind::GeneralHealth => "general_health_id",
            SubRecordKind::Phototype => "phototype_id",
        }
    }
}

impl std::fmt::Display for SubRecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SubRecordKind::Consent => "consent form",
            SubRecordKind::GeneralHealth => "general health questionnaire",
            SubRecordKind::Phototype => "phototype assessment",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Encounter {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub patient_id: i64,
    pub user_id: i64,
    pub consent_id: Option<i64>,
    pub general_health_id: Option<i64>,
    pub phototype_id: Option<i64>,
}

impl Encounter {
    pub fn link(&self, kind: SubRecordKind) -> Option<i64> {
        match kind {
            SubRecordKind::Consent => self.consent_id,
            SubRecordKind::GeneralHealth => self.general_health_id,
            SubRecordKind::Phototype => self.phototype_id,
        }
    }
}

/// An encounter joined with the identifying fields of its patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EncounterSummary {
    pub encounter_id: i64,
    pub date: DateTime<Utc>,
    pub patient_id: i64,
    pub patient_name: String,
    pub patient_cpf: String,
    pub consent_id: Option<i64>,
    pub general_health_id: Option<i64>,
    pub phototype_id: Option<i64>,
}

// ============================================================================
// SUB-RECORDS
// ============================================================================

#[derive(Clone, Debug)]
pub struct NewConsent {
    pub document_url: NonEmptyText,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Consent {
    pub id: i64,
    pub document_url: String,
    pub created_at: DateTime<Utc>,
}

/// General health questionnaire answers. Each flag has an optional free-text companion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HealthQuestionnaire {
    pub chronic_diseases: bool,
    pub hypertension: bool,
    pub diabetes: bool,
    pub cardiopathy: bool,
    pub other_diseases: Option<String>,
    pub cancer_diagnosis: bool,
    pub cancer_type: Option<String>,
    pub uses_medication: bool,
    pub medications: Option<String>,
    pub has_allergy: bool,
    pub allergies: Option<String>,
    pub dermatologic_surgery: bool,
    pub procedure_type: Option<String>,
    pub physical_activity: bool,
    pub physical_activity_frequency: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeneralHealth {
    pub id: i64,
    pub questionnaire: HealthQuestionnaire,
    pub created_at: DateTime<Utc>,
}

/// The seven coded phototype observations. See [`crate::validation`] for the valid codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PhototypeScores {
    pub skin_color: i64,
    pub eye_color: i64,
    pub hair_color: i64,
    pub freckle_quantity: i64,
    pub sun_reaction: i64,
    pub tanning: i64,
    pub sun_sensitivity: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PhototypeAssessment {
    pub id: i64,
    pub scores: PhototypeScores,
    pub created_at: DateTime<Utc>,
}
