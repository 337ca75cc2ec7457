//! Clinical intake workflow.
//!
//! An encounter (atendimento) is opened for a newly registered patient and then filled in
//! incrementally: a consent form, a general health questionnaire and a phototype assessment
//! can each be attached exactly once.
//!
//! The workflow functions in this module are written against [`IntakeRepository`] only.
//! [`IntakeService`] runs each of them inside one store transaction, so a sub-record and the
//! encounter link pointing at it are committed together.
//!
//! ## Pure Data Operations
//!
//! No HTTP concerns live here. The caller resolves the acting [`Principal`] and passes it in.

use crate::principal::{Principal, Role};
use crate::records::{
    Consent, Encounter, EncounterSummary, GeneralHealth, HealthQuestionnaire, NewConsent,
    NewPatient, PhototypeAssessment, PhototypeScores, SubRecordKind,
};
use crate::store::{IntakeRepository, SqliteStore};
use crate::validation::validate_phototype;
use crate::{IntakeError, IntakeResult};
use chrono::Utc;
use std::sync::Arc;

/// Minimum role required for every intake operation.
pub const INTAKE_ROLE: Role = Role::Researcher;

/// Registers a new patient and opens an encounter for them.
///
/// # Errors
///
/// Returns [`IntakeError::DuplicatePatient`] if a patient with the same national ID already
/// exists. Existing patients are never updated.
pub fn register_encounter<R: IntakeRepository + ?Sized>(
    repo: &R,
    principal: &Principal,
    patient: &NewPatient,
) -> IntakeResult<Encounter> {
    if repo.find_patient_by_cpf(patient.cpf.as_str())?.is_some() {
        return Err(IntakeError::DuplicatePatient {
            cpf: patient.cpf.to_string(),
        });
    }

    let now = Utc::now();
    let patient = repo.insert_patient(patient, principal.user_id, now)?;
    repo.insert_encounter(patient.id, principal.user_id, now)
}

/// Shared attach-once sequence: resolve the encounter, refuse if `kind` is already linked,
/// create the sub-record, then link it.
fn attach_once<R, T>(
    repo: &R,
    encounter_id: i64,
    kind: SubRecordKind,
    create: impl FnOnce(&R) -> IntakeResult<T>,
    record_id: impl Fn(&T) -> i64,
) -> IntakeResult<T>
where
    R: IntakeRepository + ?Sized,
{
    let encounter = repo
        .find_encounter(encounter_id)?
        .ok_or(IntakeError::EncounterNotFound(encounter_id))?;

    if encounter.link(kind).is_some() {
        return Err(IntakeError::AlreadyAttached { encounter_id, kind });
    }

    let record = create(repo)?;

    if !repo.link_sub_record(encounter_id, kind, record_id(&record))? {
        return Err(IntakeError::AlreadyAttached { encounter_id, kind });
    }

    Ok(record)
}

pub fn attach_consent<R: IntakeRepository + ?Sized>(
    repo: &R,
    encounter_id: i64,
    consent: &NewConsent,
) -> IntakeResult<Consent> {
    attach_once(
        repo,
        encounter_id,
        SubRecordKind::Consent,
        |r| r.insert_consent(consent, Utc::now()),
        |c| c.id,
    )
}

pub fn attach_general_health<R: IntakeRepository + ?Sized>(
    repo: &R,
    encounter_id: i64,
    questionnaire: &HealthQuestionnaire,
) -> IntakeResult<GeneralHealth> {
    attach_once(
        repo,
        encounter_id,
        SubRecordKind::GeneralHealth,
        |r| r.insert_general_health(questionnaire, Utc::now()),
        |g| g.id,
    )
}

/// Validates the phototype codes, then attaches the assessment.
///
/// Validation runs before the encounter is looked up, so an invalid payload is reported as
/// [`IntakeError::InvalidFieldValue`] even for an unknown encounter.
pub fn attach_phototype<R: IntakeRepository + ?Sized>(
    repo: &R,
    encounter_id: i64,
    scores: &PhototypeScores,
) -> IntakeResult<PhototypeAssessment> {
    validate_phototype(scores)?;
    attach_once(
        repo,
        encounter_id,
        SubRecordKind::Phototype,
        |r| r.insert_phototype(scores, Utc::now()),
        |p| p.id,
    )
}

/// Lists the caller's encounters.
///
/// # Errors
///
/// Returns [`IntakeError::NoEncountersFound`] when the caller has none.
pub fn list_encounters_for_user<R: IntakeRepository + ?Sized>(
    repo: &R,
    principal: &Principal,
) -> IntakeResult<Vec<EncounterSummary>> {
    let encounters = repo.list_encounters_for_user(principal.user_id)?;
    if encounters.is_empty() {
        return Err(IntakeError::NoEncountersFound {
            user_id: principal.user_id,
        });
    }
    Ok(encounters)
}

/// Service running the intake workflow against the shared store.
#[derive(Clone, Debug)]
pub struct IntakeService {
    store: Arc<SqliteStore>,
}

impl IntakeService {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    pub fn register_encounter(
        &self,
        principal: &Principal,
        patient: NewPatient,
    ) -> IntakeResult<Encounter> {
        principal.require(INTAKE_ROLE)?;
        let encounter = self
            .store
            .with_tx(|repo| register_encounter(repo, principal, &patient))
            .inspect_err(|e| log_rejection("register encounter", principal, e))?;

        tracing::info!(
            encounter_id = encounter.id,
            patient_id = encounter.patient_id,
            user_id = principal.user_id,
            "encounter registered"
        );
        Ok(encounter)
    }

    pub fn attach_consent(
        &self,
        principal: &Principal,
        encounter_id: i64,
        consent: NewConsent,
    ) -> IntakeResult<Consent> {
        principal.require(INTAKE_ROLE)?;
        let created = self
            .store
            .with_tx(|repo| attach_consent(repo, encounter_id, &consent))
            .inspect_err(|e| log_rejection("attach consent", principal, e))?;

        tracing::info!(encounter_id, consent_id = created.id, "consent attached");
        Ok(created)
    }

    pub fn attach_general_health(
        &self,
        principal: &Principal,
        encounter_id: i64,
        questionnaire: HealthQuestionnaire,
    ) -> IntakeResult<GeneralHealth> {
        principal.require(INTAKE_ROLE)?;
        let created = self
            .store
            .with_tx(|repo| attach_general_health(repo, encounter_id, &questionnaire))
            .inspect_err(|e| log_rejection("attach general health", principal, e))?;

        tracing::info!(
            encounter_id,
            general_health_id = created.id,
            "general health attached"
        );
        Ok(created)
    }

    pub fn attach_phototype(
        &self,
        principal: &Principal,
        encounter_id: i64,
        scores: PhototypeScores,
    ) -> IntakeResult<PhototypeAssessment> {
        principal.require(INTAKE_ROLE)?;
        let created = self
            .store
            .with_tx(|repo| attach_phototype(repo, encounter_id, &scores))
            .inspect_err(|e| log_rejection("attach phototype", principal, e))?;

        tracing::info!(encounter_id, phototype_id = created.id, "phototype attached");
        Ok(created)
    }

    pub fn list_encounters_for_user(
        &self,
        principal: &Principal,
    ) -> IntakeResult<Vec<EncounterSummary>> {
        principal.require(INTAKE_ROLE)?;
        self.store
            .read(|repo| list_encounters_for_user(repo, principal))
    }
}

fn log_rejection(operation: &str, principal: &Principal, err: &IntakeError) {
    match err {
        IntakeError::Storage(_)
        | IntakeError::MigrationFailed { .. }
        | IntakeError::LockPoisoned
        | IntakeError::CorruptRecord { .. } => {
            tracing::error!(operation, user_id = principal.user_id, error = %err, "store failure");
        }
        _ => {
            tracing::warn!(operation, user_id = principal.user_id, error = %err, "request rejected");
        }
    }
}
