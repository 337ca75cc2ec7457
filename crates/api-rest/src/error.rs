//! API error types with structured JSON responses.

use api_shared::ErrorRes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use intake_core::records::SubRecordKind;
use intake_core::IntakeError;

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {detail}")]
    NotFound { code: &'static str, detail: String },
    #[error("Bad request: {detail}")]
    BadRequest { code: &'static str, detail: String },
    #[error("Invalid input: {0}")]
    Unprocessable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Autenticação necessária".to_string(),
            ),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail),
            ApiError::NotFound { code, detail } => (StatusCode::NOT_FOUND, code, detail),
            ApiError::BadRequest { code, detail } => (StatusCode::BAD_REQUEST, code, detail),
            ApiError::Unprocessable(detail) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_INPUT", detail)
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Erro interno".to_string(),
                )
            }
        };

        let body = ErrorRes {
            detail,
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

fn already_attached_detail(kind: SubRecordKind) -> &'static str {
    match kind {
        SubRecordKind::Consent => "Atendimento já possui um termo de consentimento",
        SubRecordKind::GeneralHealth => "Atendimento já possui informações de Saúde Geral",
        SubRecordKind::Phototype => "Atendimento já possui uma avaliação de fototipo",
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::DuplicatePatient { .. } => ApiError::BadRequest {
                code: "DUPLICATE_PATIENT",
                detail: "Paciente já cadastrado".into(),
            },
            IntakeError::EncounterNotFound(_) => ApiError::NotFound {
                code: "ENCOUNTER_NOT_FOUND",
                detail: "Atendimento não encontrado".into(),
            },
            IntakeError::AlreadyAttached { kind, .. } => ApiError::BadRequest {
                code: "ALREADY_ATTACHED",
                detail: already_attached_detail(kind).into(),
            },
            IntakeError::InvalidFieldValue { field, .. } => ApiError::BadRequest {
                code: "INVALID_FIELD_VALUE",
                detail: format!("Valor inválido para {field}"),
            },
            IntakeError::NoEncountersFound { .. } => ApiError::NotFound {
                code: "NO_ENCOUNTERS_FOUND",
                detail: "Nenhum atendimento encontrado para este usuário.".into(),
            },
            IntakeError::InvalidInput(detail) => ApiError::Unprocessable(detail),
            IntakeError::Unauthenticated => ApiError::Unauthenticated,
            e @ IntakeError::Forbidden { .. } => ApiError::Forbidden(e.to_string()),
            e @ IntakeError::UserNotFound(_) => ApiError::NotFound {
                code: "USER_NOT_FOUND",
                detail: e.to_string(),
            },
            e @ IntakeError::DuplicateUser(_) => ApiError::BadRequest {
                code: "DUPLICATE_USER",
                detail: e.to_string(),
            },
            e @ (IntakeError::Storage(_)
            | IntakeError::MigrationFailed { .. }
            | IntakeError::LockPoisoned
            | IntakeError::CorruptRecord { .. }) => ApiError::Internal(e.to_string()),
        }
    }
}
