use super::{AccountRepository, IntakeRepository};
use crate::repositories::accounts::{SessionOwner, User};
use crate::principal::Role;
use crate::records::{
    Consent, Encounter, EncounterSummary, GeneralHealth, HealthQuestionnaire, NewConsent,
    NewPatient, Patient, PhototypeAssessment, PhototypeScores, Sex, SubRecordKind,
};
use crate::{IntakeError, IntakeResult};
use chrono::{DateTime, Utc};
use intake_types::NonEmptyText;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PATIENT_COLUMNS: &str = "id, name, birth_date, sex, sex_other, cpf, sus_card_number, \
     address, phone, email, research_consent, created_by, created_at";

const ENCOUNTER_COLUMNS: &str =
    "id, date, patient_id, user_id, consent_id, general_health_id, phototype_id";

const USER_COLUMNS: &str = "id, username, email, role, created_at";

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn opt_str(value: &Option<NonEmptyText>) -> Option<&str> {
    value.as_ref().map(NonEmptyText::as_str)
}

fn parse_sex(raw: String) -> IntakeResult<Sex> {
    raw.parse().map_err(|_| IntakeError::CorruptRecord {
        field: "patients.sex",
        value: raw,
    })
}

fn parse_role(raw: String) -> IntakeResult<Role> {
    raw.parse().map_err(|_| IntakeError::CorruptRecord {
        field: "users.role",
        value: raw,
    })
}

struct PatientRow {
    id: i64,
    name: String,
    birth_date: chrono::NaiveDate,
    sex: String,
    sex_other: Option<String>,
    cpf: String,
    sus_card_number: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    research_consent: bool,
    created_by: i64,
    created_at: DateTime<Utc>,
}

impl PatientRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            birth_date: row.get(2)?,
            sex: row.get(3)?,
            sex_other: row.get(4)?,
            cpf: row.get(5)?,
            sus_card_number: row.get(6)?,
            address: row.get(7)?,
            phone: row.get(8)?,
            email: row.get(9)?,
            research_consent: row.get(10)?,
            created_by: row.get(11)?,
            created_at: row.get(12)?,
        })
    }

    fn into_patient(self) -> IntakeResult<Patient> {
        Ok(Patient {
            id: self.id,
            name: self.name,
            birth_date: self.birth_date,
            sex: parse_sex(self.sex)?,
            sex_other: self.sex_other,
            cpf: self.cpf,
            sus_card_number: self.sus_card_number,
            address: self.address,
            phone: self.phone,
            email: self.email,
            research_consent: self.research_consent,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

fn encounter_from_row(row: &Row<'_>) -> rusqlite::Result<Encounter> {
    Ok(Encounter {
        id: row.get(0)?,
        date: row.get(1)?,
        patient_id: row.get(2)?,
        user_id: row.get(3)?,
        consent_id: row.get(4)?,
        general_health_id: row.get(5)?,
        phototype_id: row.get(6)?,
    })
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, String, DateTime<Utc>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_user(
    (id, username, email, role, created_at): (i64, String, String, String, DateTime<Utc>),
) -> IntakeResult<User> {
    Ok(User {
        id,
        username,
        email,
        role: parse_role(role)?,
        created_at,
    })
}

impl IntakeRepository for Connection {
    fn find_patient_by_cpf(&self, cpf: &str) -> IntakeResult<Option<Patient>> {
        let row = self
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE cpf = ?1"),
                params![cpf],
                PatientRow::from_row,
            )
            .optional()?;
        row.map(PatientRow::into_patient).transpose()
    }

    fn insert_patient(
        &self,
        patient: &NewPatient,
        created_by: i64,
        created_at: DateTime<Utc>,
    ) -> IntakeResult<Patient> {
        let inserted = self.execute(
            "INSERT INTO patients (name, birth_date, sex, sex_other, cpf, sus_card_number,
                                   address, phone, email, research_consent, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                patient.name.as_str(),
                patient.birth_date,
                patient.sex.as_str(),
                opt_str(&patient.sex_other),
                patient.cpf.as_str(),
                opt_str(&patient.sus_card_number),
                opt_str(&patient.address),
                opt_str(&patient.phone),
                patient.email.as_ref().map(|e| e.as_str()),
                patient.research_consent,
                created_by,
                created_at,
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(IntakeError::DuplicatePatient {
                    cpf: patient.cpf.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Patient {
            id: self.last_insert_rowid(),
            name: patient.name.to_string(),
            birth_date: patient.birth_date,
            sex: patient.sex,
            sex_other: patient.sex_other.clone().map(NonEmptyText::into_inner),
            cpf: patient.cpf.to_string(),
            sus_card_number: patient.sus_card_number.clone().map(NonEmptyText::into_inner),
            address: patient.address.clone().map(NonEmptyText::into_inner),
            phone: patient.phone.clone().map(NonEmptyText::into_inner),
            email: patient.email.as_ref().map(|e| e.to_string()),
            research_consent: patient.research_consent,
            created_by,
            created_at,
        })
    }

    fn insert_encounter(
        &self,
        patient_id: i64,
        user_id: i64,
        date: DateTime<Utc>,
    ) -> IntakeResult<Encounter> {
        self.execute(
            "INSERT INTO encounters (date, patient_id, user_id) VALUES (?1, ?2, ?3)",
            params![date, patient_id, user_id],
        )?;

        Ok(Encounter {
            id: self.last_insert_rowid(),
            date,
            patient_id,
            user_id,
            consent_id: None,
            general_health_id: None,
            phototype_id: None,
        })
    }

    fn find_encounter(&self, id: i64) -> IntakeResult<Option<Encounter>> {
        Ok(self
            .query_row(
                &format!("SELECT {ENCOUNTER_COLUMNS} FROM encounters WHERE id = ?1"),
                params![id],
                encounter_from_row,
            )
            .optional()?)
    }

    fn insert_consent(
        &self,
        consent: &NewConsent,
        created_at: DateTime<Utc>,
    ) -> IntakeResult<Consent> {
        self.execute(
            "INSERT INTO consents (document_url, created_at) VALUES (?1, ?2)",
            params![consent.document_url.as_str(), created_at],
        )?;

        Ok(Consent {
            id: self.last_insert_rowid(),
            document_url: consent.document_url.to_string(),
            created_at,
        })
    }

    fn insert_general_health(
        &self,
        q: &HealthQuestionnaire,
        created_at: DateTime<Utc>,
    ) -> IntakeResult<GeneralHealth> {
        self.execute(
            "INSERT INTO general_health (
                 chronic_diseases, hypertension, diabetes, cardiopathy, other_diseases,
                 cancer_diagnosis, cancer_type, uses_medication, medications,
                 has_allergy, allergies, dermatologic_surgery, procedure_type,
                 physical_activity, physical_activity_frequency, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                q.chronic_diseases,
                q.hypertension,
                q.diabetes,
                q.cardiopathy,
                q.other_diseases,
                q.cancer_diagnosis,
                q.cancer_type,
                q.uses_medication,
                q.medications,
                q.has_allergy,
                q.allergies,
                q.dermatologic_surgery,
                q.procedure_type,
                q.physical_activity,
                q.physical_activity_frequency,
                created_at,
            ],
        )?;

        Ok(GeneralHealth {
            id: self.last_insert_rowid(),
            questionnaire: q.clone(),
            created_at,
        })
    }

    fn insert_phototype(
        &self,
        s: &PhototypeScores,
        created_at: DateTime<Utc>,
    ) -> IntakeResult<PhototypeAssessment> {
        self.execute(
            "INSERT INTO phototype_assessments (
                 skin_color, eye_color, hair_color, freckle_quantity,
                 sun_reaction, tanning, sun_sensitivity, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                s.skin_color,
                s.eye_color,
                s.hair_color,
                s.freckle_quantity,
                s.sun_reaction,
                s.tanning,
                s.sun_sensitivity,
                created_at,
            ],
        )?;

        Ok(PhototypeAssessment {
            id: self.last_insert_rowid(),
            scores: *s,
            created_at,
        })
    }

    fn link_sub_record(
        &self,
        encounter_id: i64,
        kind: SubRecordKind,
        record_id: i64,
    ) -> IntakeResult<bool> {
        // The IS NULL guard makes the link write-once even if two callers raced past the
        // attached check.
        let sql = format!(
            "UPDATE encounters SET {col} = ?1 WHERE id = ?2 AND {col} IS NULL",
            col = kind.link_column()
        );
        let updated = self.execute(&sql, params![record_id, encounter_id])?;
        Ok(updated == 1)
    }

    fn list_encounters_for_user(&self, user_id: i64) -> IntakeResult<Vec<EncounterSummary>> {
        let mut stmt = self.prepare(
            "SELECT e.id, e.date, e.patient_id, p.name, p.cpf,
                    e.consent_id, e.general_health_id, e.phototype_id
             FROM encounters e
             JOIN patients p ON p.id = e.patient_id
             WHERE e.user_id = ?1
             ORDER BY e.id",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(EncounterSummary {
                encounter_id: row.get(0)?,
                date: row.get(1)?,
                patient_id: row.get(2)?,
                patient_name: row.get(3)?,
                patient_cpf: row.get(4)?,
                consent_id: row.get(5)?,
                general_health_id: row.get(6)?,
                phototype_id: row.get(7)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl AccountRepository for Connection {
    fn insert_user(
        &self,
        username: &str,
        email: &str,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> IntakeResult<User> {
        match self.execute(
            "INSERT INTO users (username, email, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![username, email, role.as_str(), created_at],
        ) {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(IntakeError::DuplicateUser(username.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        Ok(User {
            id: self.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            role,
            created_at,
        })
    }

    fn find_user_by_username(&self, username: &str) -> IntakeResult<Option<User>> {
        let row = self
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                user_row,
            )
            .optional()?;
        row.map(into_user).transpose()
    }

    fn list_users(&self) -> IntakeResult<Vec<User>> {
        let mut stmt = self.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
        let rows = stmt.query_map([], user_row)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(into_user(row?)?);
        }
        Ok(users)
    }

    fn insert_session(
        &self,
        token_hash: &str,
        user_id: i64,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> IntakeResult<()> {
        self.execute(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![token_hash, user_id, created_at, expires_at],
        )?;
        Ok(())
    }

    fn find_session_owner(&self, token_hash: &str) -> IntakeResult<Option<SessionOwner>> {
        let row = self
            .query_row(
                "SELECT u.id, u.username, u.email, u.role, u.created_at, s.expires_at
                 FROM sessions s
                 JOIN users u ON u.id = s.user_id
                 WHERE s.token_hash = ?1",
                params![token_hash],
                |row| Ok((user_row(row)?, row.get::<_, DateTime<Utc>>(5)?)),
            )
            .optional()?;

        row.map(|(user, expires_at)| {
            Ok(SessionOwner {
                user: into_user(user)?,
                expires_at,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use chrono::NaiveDate;

    fn new_patient(cpf: &str) -> NewPatient {
        NewPatient {
            name: NonEmptyText::new("Joana Prado").unwrap(),
            birth_date: NaiveDate::from_ymd_opt(1980, 3, 14).unwrap(),
            sex: Sex::Female,
            sex_other: None,
            cpf: NonEmptyText::new(cpf).unwrap(),
            sus_card_number: NonEmptyText::optional(Some("898001160123456")),
            address: None,
            phone: None,
            email: None,
            research_consent: true,
        }
    }

    fn store_with_user() -> (SqliteStore, User) {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store
            .with_tx(|c| c.insert_user("ana", "ana@ufmg.br", Role::Researcher, Utc::now()))
            .unwrap();
        (store, user)
    }

    #[test]
    fn patient_round_trips_through_store() {
        let (store, user) = store_with_user();
        let inserted = store
            .with_tx(|c| c.insert_patient(&new_patient("111"), user.id, Utc::now()))
            .unwrap();

        let found = store
            .read(|c| c.find_patient_by_cpf("111"))
            .unwrap()
            .expect("patient stored");
        assert_eq!(found, inserted);
        assert_eq!(found.sus_card_number.as_deref(), Some("898001160123456"));
    }

    #[test]
    fn unique_cpf_violation_maps_to_duplicate_patient() {
        let (store, user) = store_with_user();
        store
            .with_tx(|c| c.insert_patient(&new_patient("111"), user.id, Utc::now()))
            .unwrap();

        let err = store
            .with_tx(|c| c.insert_patient(&new_patient("111"), user.id, Utc::now()))
            .unwrap_err();
        assert!(matches!(err, IntakeError::DuplicatePatient { ref cpf } if cpf == "111"));
    }

    #[test]
    fn link_is_write_once() {
        let (store, user) = store_with_user();
        let encounter = store
            .with_tx(|c| {
                let p = c.insert_patient(&new_patient("222"), user.id, Utc::now())?;
                c.insert_encounter(p.id, user.id, Utc::now())
            })
            .unwrap();

        let (first, second) = store
            .with_tx(|c| {
                let a = c.insert_consent(
                    &NewConsent {
                        document_url: NonEmptyText::new("a").unwrap(),
                    },
                    Utc::now(),
                )?;
                let b = c.insert_consent(
                    &NewConsent {
                        document_url: NonEmptyText::new("b").unwrap(),
                    },
                    Utc::now(),
                )?;
                let first = c.link_sub_record(encounter.id, SubRecordKind::Consent, a.id)?;
                let second = c.link_sub_record(encounter.id, SubRecordKind::Consent, b.id)?;
                Ok((first, second))
            })
            .unwrap();

        assert!(first);
        assert!(!second);
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let (store, _) = store_with_user();
        let err = store
            .with_tx(|c| c.insert_user("ana", "outra@ufmg.br", Role::Supervisor, Utc::now()))
            .unwrap_err();
        assert!(matches!(err, IntakeError::DuplicateUser(ref u) if u == "ana"));
    }
}
