//! Route handlers.
//!
//! Each handler converts its wire payload into core records, calls the intake service with the
//! authenticated principal, and shapes the result back into a wire response.

use crate::auth::Authenticated;
use crate::convert;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::AppState;
use api_shared::{
    AtendimentoRes, AtendimentoResumo, AvaliacaoFototipoCreateReq, CadastroAvaliacaoFototipoRes,
    CadastroSaudeGeralRes, CadastroTermoConsentimentoRes, ErrorRes, HealthRes, HealthService,
    PacienteCreateReq, SaudeGeralCreateReq, TermoConsentimentoCreateReq,
    CONSENT_ATTACHED_MESSAGE, GENERAL_HEALTH_ATTACHED_MESSAGE, PHOTOTYPE_ATTACHED_MESSAGE,
};
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

/// Query string selecting the encounter a sub-record is attached to.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AtendimentoQuery {
    /// Encounter id.
    pub atendimento_id: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/cadastrar-atendimento",
    request_body = PacienteCreateReq,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Patient and encounter registered", body = AtendimentoRes),
        (status = 400, description = "Patient already registered", body = ErrorRes),
        (status = 401, description = "Missing or invalid token", body = ErrorRes),
        (status = 422, description = "Invalid patient fields", body = ErrorRes)
    )
)]
/// Register a new patient together with their first encounter.
///
/// The encounter belongs to the calling user and starts with no sub-records.
#[axum::debug_handler(state = AppState)]
pub async fn register_encounter(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiJson(req): ApiJson<PacienteCreateReq>,
) -> Result<Json<AtendimentoRes>, ApiError> {
    let patient = convert::new_patient(req)?;
    let encounter = state.intake.register_encounter(&principal, patient)?;
    Ok(Json(convert::encounter_res(encounter)))
}

#[utoipa::path(
    post,
    path = "/cadastrar-termo-consentimento",
    params(AtendimentoQuery),
    request_body = TermoConsentimentoCreateReq,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Consent form attached", body = CadastroTermoConsentimentoRes),
        (status = 400, description = "Encounter already has a consent form", body = ErrorRes),
        (status = 404, description = "Encounter not found", body = ErrorRes),
        (status = 422, description = "Malformed body or missing atendimento_id", body = ErrorRes)
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn attach_consent(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiQuery(query): ApiQuery<AtendimentoQuery>,
    ApiJson(req): ApiJson<TermoConsentimentoCreateReq>,
) -> Result<Json<CadastroTermoConsentimentoRes>, ApiError> {
    let consent = convert::new_consent(req)?;
    let created = state
        .intake
        .attach_consent(&principal, query.atendimento_id, consent)?;
    Ok(Json(CadastroTermoConsentimentoRes {
        message: CONSENT_ATTACHED_MESSAGE.into(),
        termo_consentimento: convert::consent_res(created),
    }))
}

#[utoipa::path(
    post,
    path = "/cadastrar-saude-geral",
    params(AtendimentoQuery),
    request_body = SaudeGeralCreateReq,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "General health questionnaire attached", body = CadastroSaudeGeralRes),
        (status = 400, description = "Encounter already has a questionnaire", body = ErrorRes),
        (status = 404, description = "Encounter not found", body = ErrorRes),
        (status = 422, description = "Malformed body or missing atendimento_id", body = ErrorRes)
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn attach_general_health(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiQuery(query): ApiQuery<AtendimentoQuery>,
    ApiJson(req): ApiJson<SaudeGeralCreateReq>,
) -> Result<Json<CadastroSaudeGeralRes>, ApiError> {
    let created = state.intake.attach_general_health(
        &principal,
        query.atendimento_id,
        convert::questionnaire(req),
    )?;
    Ok(Json(CadastroSaudeGeralRes {
        message: GENERAL_HEALTH_ATTACHED_MESSAGE.into(),
        saude_geral: convert::general_health_res(created),
    }))
}

#[utoipa::path(
    post,
    path = "/cadastrar-avaliacao-fototipo",
    params(AtendimentoQuery),
    request_body = AvaliacaoFototipoCreateReq,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Phototype assessment attached", body = CadastroAvaliacaoFototipoRes),
        (status = 400, description = "Invalid code or encounter already assessed", body = ErrorRes),
        (status = 404, description = "Encounter not found", body = ErrorRes),
        (status = 422, description = "Malformed body or missing atendimento_id", body = ErrorRes)
    )
)]
/// Attach a phototype assessment.
///
/// Codes are checked before the encounter is looked up, so an invalid code is reported even
/// for an unknown encounter.
#[axum::debug_handler(state = AppState)]
pub async fn attach_phototype(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiQuery(query): ApiQuery<AtendimentoQuery>,
    ApiJson(req): ApiJson<AvaliacaoFototipoCreateReq>,
) -> Result<Json<CadastroAvaliacaoFototipoRes>, ApiError> {
    let created =
        state
            .intake
            .attach_phototype(&principal, query.atendimento_id, convert::scores(req))?;
    Ok(Json(CadastroAvaliacaoFototipoRes {
        message: PHOTOTYPE_ATTACHED_MESSAGE.into(),
        avaliacao_fototipo: convert::phototype_res(created),
    }))
}

#[utoipa::path(
    get,
    path = "/listar-atendimentos-usuario-logado",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Encounters created by the caller", body = [AtendimentoResumo]),
        (status = 404, description = "The caller has no encounters", body = ErrorRes)
    )
)]
#[axum::debug_handler(state = AppState)]
pub async fn list_encounters(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<Json<Vec<AtendimentoResumo>>, ApiError> {
    let encounters = state.intake.list_encounters_for_user(&principal)?;
    Ok(Json(
        encounters.into_iter().map(convert::summary_res).collect(),
    ))
}
