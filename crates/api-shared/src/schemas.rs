//! Request and response bodies.
//!
//! These types mirror the JSON contract exactly and carry no validation beyond shape; the REST
//! layer converts them into validated core records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const CONSENT_ATTACHED_MESSAGE: &str = "Termo de Consentimento cadastrado com sucesso!";
pub const GENERAL_HEALTH_ATTACHED_MESSAGE: &str =
    "Informações de Saúde Geral cadastradas com sucesso!";
pub const PHOTOTYPE_ATTACHED_MESSAGE: &str = "Avaliação de Fototipo cadastrada com sucesso!";

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body returned by every failing endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    /// Human-readable description.
    pub detail: String,
    /// Stable machine-readable code, e.g. `DUPLICATE_PATIENT`.
    pub code: String,
}

// ============================================================================
// PATIENT / ENCOUNTER
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PacienteCreateReq {
    pub nome_paciente: String,
    #[schema(value_type = String, format = Date, example = "1980-03-14")]
    pub data_nascimento: NaiveDate,
    /// `masculino`, `feminino` or `outro`.
    pub sexo: String,
    #[serde(default)]
    pub sexo_outro: Option<String>,
    pub cpf_paciente: String,
    #[serde(default)]
    pub num_cartao_sus: Option<String>,
    #[serde(default)]
    pub endereco_paciente: Option<String>,
    #[serde(default)]
    pub telefone_paciente: Option<String>,
    #[serde(default)]
    pub email_paciente: Option<String>,
    #[serde(default)]
    pub autoriza_pesquisa: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AtendimentoRes {
    pub id: i64,
    #[schema(value_type = String, format = DateTime)]
    pub data_atendimento: DateTime<Utc>,
    pub paciente_id: i64,
    pub user_id: i64,
    pub termo_consentimento_id: Option<i64>,
    pub saude_geral_id: Option<i64>,
    pub avaliacao_fototipo_id: Option<i64>,
}

/// One row of the logged-in user's encounter list.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AtendimentoResumo {
    pub id: i64,
    #[schema(value_type = String, format = DateTime)]
    pub data_atendimento: DateTime<Utc>,
    pub paciente_id: i64,
    pub nome_paciente: String,
    pub cpf_paciente: String,
    pub termo_consentimento_id: Option<i64>,
    pub saude_geral_id: Option<i64>,
    pub avaliacao_fototipo_id: Option<i64>,
}

// ============================================================================
// CONSENT
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TermoConsentimentoCreateReq {
    pub arquivo_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TermoConsentimentoRes {
    pub id: i64,
    pub arquivo_url: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CadastroTermoConsentimentoRes {
    pub message: String,
    pub termo_consentimento: TermoConsentimentoRes,
}

// ============================================================================
// GENERAL HEALTH
// ============================================================================

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SaudeGeralCreateReq {
    pub doencas_cronicas: bool,
    pub hipertenso: bool,
    pub diabetes: bool,
    pub cardiopatia: bool,
    pub outras_doencas: Option<String>,
    pub diagnostico_cancer: bool,
    pub tipo_cancer: Option<String>,
    pub uso_medicamentos: bool,
    pub medicamentos: Option<String>,
    pub possui_alergia: bool,
    pub alergias: Option<String>,
    #[serde(alias = "cirurgias_dermatologicas")]
    pub ciruturgias_dermatologicas: bool,
    pub tipo_procedimento: Option<String>,
    pub pratica_atividade_fisica: bool,
    pub frequencia_atividade_fisica: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SaudeGeralRes {
    pub id: i64,
    #[serde(flatten)]
    pub respostas: SaudeGeralCreateReq,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CadastroSaudeGeralRes {
    pub message: String,
    pub saude_geral: SaudeGeralRes,
}

// ============================================================================
// PHOTOTYPE
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema)]
pub struct AvaliacaoFototipoCreateReq {
    /// One of 0, 2, 4, 8, 12, 16, 20.
    pub cor_pele: i64,
    /// One of 0..=4.
    pub cor_olhos: i64,
    /// One of 0..=4.
    pub cor_cabelo: i64,
    /// One of 0..=3.
    pub quantidade_sardas: i64,
    /// One of 0, 2, 4, 6, 8.
    pub reacao_sol: i64,
    /// One of 0, 2, 4, 6.
    pub bronzeamento: i64,
    /// One of 0..=4.
    pub sensibilidade_solar: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AvaliacaoFototipoRes {
    pub id: i64,
    #[serde(flatten)]
    pub codigos: AvaliacaoFototipoCreateReq,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CadastroAvaliacaoFototipoRes {
    pub message: String,
    pub avaliacao_fototipo: AvaliacaoFototipoRes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_request_optional_fields_default() {
        let req: PacienteCreateReq = serde_json::from_str(
            r#"{
                "nome_paciente": "Maria",
                "data_nascimento": "1990-01-31",
                "sexo": "feminino",
                "cpf_paciente": "12345678900"
            }"#,
        )
        .unwrap();
        assert_eq!(req.data_nascimento, NaiveDate::from_ymd_opt(1990, 1, 31).unwrap());
        assert!(req.email_paciente.is_none());
        assert!(!req.autoriza_pesquisa);
    }

    #[test]
    fn general_health_accepts_corrected_surgery_spelling() {
        let req: SaudeGeralCreateReq =
            serde_json::from_str(r#"{"cirurgias_dermatologicas": true}"#).unwrap();
        assert!(req.ciruturgias_dermatologicas);
        assert!(!req.hipertenso);
    }

    #[test]
    fn general_health_response_is_flat() {
        let res = SaudeGeralRes {
            id: 7,
            respostas: SaudeGeralCreateReq {
                diabetes: true,
                ..Default::default()
            },
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["diabetes"], true);
        assert!(json.get("respostas").is_none());
    }

    #[test]
    fn phototype_request_requires_every_code() {
        let missing = serde_json::from_str::<AvaliacaoFototipoCreateReq>(r#"{"cor_pele": 0}"#);
        assert!(missing.is_err());
    }
}
