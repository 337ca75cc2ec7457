//! Conversions between wire schemas and core records.

use api_shared::{
    AtendimentoRes, AtendimentoResumo, AvaliacaoFototipoCreateReq, AvaliacaoFototipoRes,
    PacienteCreateReq, SaudeGeralCreateReq, SaudeGeralRes, TermoConsentimentoCreateReq,
    TermoConsentimentoRes,
};
use intake_core::records::{
    Consent, Encounter, EncounterSummary, GeneralHealth, HealthQuestionnaire, NewConsent,
    NewPatient, PhototypeAssessment, PhototypeScores,
};
use intake_core::{EmailAddress, IntakeError, IntakeResult, NonEmptyText};

fn required(field: &str, value: &str) -> IntakeResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|e| IntakeError::InvalidInput(format!("{field}: {e}")))
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

pub(crate) fn new_patient(req: PacienteCreateReq) -> IntakeResult<NewPatient> {
    let email = match NonEmptyText::optional(req.email_paciente.as_deref()) {
        Some(raw) => Some(
            EmailAddress::parse(raw.as_str())
                .map_err(|e| IntakeError::InvalidInput(format!("email_paciente: {e}")))?,
        ),
        None => None,
    };

    Ok(NewPatient {
        name: required("nome_paciente", &req.nome_paciente)?,
        birth_date: req.data_nascimento,
        sex: req
            .sexo
            .parse()
            .map_err(|_: IntakeError| {
                IntakeError::InvalidInput("sexo: expected masculino, feminino or outro".into())
            })?,
        sex_other: NonEmptyText::optional(req.sexo_outro),
        cpf: required("cpf_paciente", &req.cpf_paciente)?,
        sus_card_number: NonEmptyText::optional(req.num_cartao_sus),
        address: NonEmptyText::optional(req.endereco_paciente),
        phone: NonEmptyText::optional(req.telefone_paciente),
        email,
        research_consent: req.autoriza_pesquisa,
    })
}

pub(crate) fn new_consent(req: TermoConsentimentoCreateReq) -> IntakeResult<NewConsent> {
    Ok(NewConsent {
        document_url: required("arquivo_url", &req.arquivo_url)?,
    })
}

pub(crate) fn questionnaire(req: SaudeGeralCreateReq) -> HealthQuestionnaire {
    HealthQuestionnaire {
        chronic_diseases: req.doencas_cronicas,
        hypertension: req.hipertenso,
        diabetes: req.diabetes,
        cardiopathy: req.cardiopatia,
        other_diseases: blank_to_none(req.outras_doencas),
        cancer_diagnosis: req.diagnostico_cancer,
        cancer_type: blank_to_none(req.tipo_cancer),
        uses_medication: req.uso_medicamentos,
        medications: blank_to_none(req.medicamentos),
        has_allergy: req.possui_alergia,
        allergies: blank_to_none(req.alergias),
        dermatologic_surgery: req.ciruturgias_dermatologicas,
        procedure_type: blank_to_none(req.tipo_procedimento),
        physical_activity: req.pratica_atividade_fisica,
        physical_activity_frequency: blank_to_none(req.frequencia_atividade_fisica),
    }
}

pub(crate) fn scores(req: AvaliacaoFototipoCreateReq) -> PhototypeScores {
    PhototypeScores {
        skin_color: req.cor_pele,
        eye_color: req.cor_olhos,
        hair_color: req.cor_cabelo,
        freckle_quantity: req.quantidade_sardas,
        sun_reaction: req.reacao_sol,
        tanning: req.bronzeamento,
        sun_sensitivity: req.sensibilidade_solar,
    }
}

pub(crate) fn encounter_res(encounter: Encounter) -> AtendimentoRes {
    AtendimentoRes {
        id: encounter.id,
        data_atendimento: encounter.date,
        paciente_id: encounter.patient_id,
        user_id: encounter.user_id,
        termo_consentimento_id: encounter.consent_id,
        saude_geral_id: encounter.general_health_id,
        avaliacao_fototipo_id: encounter.phototype_id,
    }
}

pub(crate) fn summary_res(summary: EncounterSummary) -> AtendimentoResumo {
    AtendimentoResumo {
        id: summary.encounter_id,
        data_atendimento: summary.date,
        paciente_id: summary.patient_id,
        nome_paciente: summary.patient_name,
        cpf_paciente: summary.patient_cpf,
        termo_consentimento_id: summary.consent_id,
        saude_geral_id: summary.general_health_id,
        avaliacao_fototipo_id: summary.phototype_id,
    }
}

pub(crate) fn consent_res(consent: Consent) -> TermoConsentimentoRes {
    TermoConsentimentoRes {
        id: consent.id,
        arquivo_url: consent.document_url,
        created_at: consent.created_at,
    }
}

pub(crate) fn general_health_res(record: GeneralHealth) -> SaudeGeralRes {
    let q = record.questionnaire;
    SaudeGeralRes {
        id: record.id,
        respostas: SaudeGeralCreateReq {
            doencas_cronicas: q.chronic_diseases,
            hipertenso: q.hypertension,
            diabetes: q.diabetes,
            cardiopatia: q.cardiopathy,
            outras_doencas: q.other_diseases,
            diagnostico_cancer: q.cancer_diagnosis,
            tipo_cancer: q.cancer_type,
            uso_medicamentos: q.uses_medication,
            medicamentos: q.medications,
            possui_alergia: q.has_allergy,
            alergias: q.allergies,
            ciruturgias_dermatologicas: q.dermatologic_surgery,
            tipo_procedimento: q.procedure_type,
            pratica_atividade_fisica: q.physical_activity,
            frequencia_atividade_fisica: q.physical_activity_frequency,
        },
        created_at: record.created_at,
    }
}

pub(crate) fn phototype_res(record: PhototypeAssessment) -> AvaliacaoFototipoRes {
    let s = record.scores;
    AvaliacaoFototipoRes {
        id: record.id,
        codigos: AvaliacaoFototipoCreateReq {
            cor_pele: s.skin_color,
            cor_olhos: s.eye_color,
            cor_cabelo: s.hair_color,
            quantidade_sardas: s.freckle_quantity,
            reacao_sol: s.sun_reaction,
            bronzeamento: s.tanning,
            sensibilidade_solar: s.sun_sensitivity,
        },
        created_at: record.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use intake_core::records::Sex;

    fn patient_req() -> PacienteCreateReq {
        PacienteCreateReq {
            nome_paciente: "Maria Souza".into(),
            data_nascimento: NaiveDate::from_ymd_opt(1985, 6, 2).unwrap(),
            sexo: "feminino".into(),
            sexo_outro: None,
            cpf_paciente: "  123.456.789-00 ".into(),
            num_cartao_sus: Some("".into()),
            endereco_paciente: None,
            telefone_paciente: Some("31 99999-0000".into()),
            email_paciente: Some("".into()),
            autoriza_pesquisa: true,
        }
    }

    #[test]
    fn patient_fields_are_trimmed_and_blanks_dropped() {
        let patient = new_patient(patient_req()).unwrap();
        assert_eq!(patient.cpf.as_str(), "123.456.789-00");
        assert_eq!(patient.sex, Sex::Female);
        assert!(patient.sus_card_number.is_none());
        assert!(patient.email.is_none());
        assert_eq!(patient.phone.unwrap().as_str(), "31 99999-0000");
    }

    #[test]
    fn blank_cpf_is_invalid_input() {
        let mut req = patient_req();
        req.cpf_paciente = "   ".into();
        let err = new_patient(req).unwrap_err();
        assert!(matches!(err, IntakeError::InvalidInput(ref msg) if msg.starts_with("cpf_paciente")));
    }

    #[test]
    fn malformed_email_and_unknown_sex_are_rejected() {
        let mut req = patient_req();
        req.email_paciente = Some("maria.at.example".into());
        assert!(matches!(new_patient(req), Err(IntakeError::InvalidInput(_))));

        let mut req = patient_req();
        req.sexo = "x".into();
        assert!(matches!(new_patient(req), Err(IntakeError::InvalidInput(_))));
    }

    #[test]
    fn questionnaire_drops_blank_companion_text() {
        let q = questionnaire(SaudeGeralCreateReq {
            possui_alergia: true,
            alergias: Some(" ".into()),
            medicamentos: Some("losartana".into()),
            ..Default::default()
        });
        assert!(q.has_allergy);
        assert!(q.allergies.is_none());
        assert_eq!(q.medications.as_deref(), Some("losartana"));
    }
}
