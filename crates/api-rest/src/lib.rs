//! # API REST
//!
//! REST API for the intake service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Bearer-token authentication through the [`auth::Authenticated`] extractor
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, error bodies)
//!
//! Uses `api-shared` for wire schemas and `intake-core` for the workflow itself.

#![warn(rust_2018_idioms)]

pub mod auth;
mod convert;
pub mod error;
pub mod extract;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use intake_core::{AccountService, IntakeService};
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

pub use error::ApiError;

/// Shared state handed to every request handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub intake: IntakeService,
    pub accounts: AccountService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::register_encounter,
        handlers::attach_consent,
        handlers::attach_general_health,
        handlers::attach_phototype,
        handlers::list_encounters,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        api_shared::PacienteCreateReq,
        api_shared::AtendimentoRes,
        api_shared::AtendimentoResumo,
        api_shared::TermoConsentimentoCreateReq,
        api_shared::TermoConsentimentoRes,
        api_shared::CadastroTermoConsentimentoRes,
        api_shared::SaudeGeralCreateReq,
        api_shared::SaudeGeralRes,
        api_shared::CadastroSaudeGeralRes,
        api_shared::AvaliacaoFototipoCreateReq,
        api_shared::AvaliacaoFototipoRes,
        api_shared::CadastroAvaliacaoFototipoRes,
    )),
    modifiers(&BearerSecurity)
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Builds the full application router, including Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/cadastrar-atendimento", post(handlers::register_encounter))
        .route(
            "/cadastrar-termo-consentimento",
            post(handlers::attach_consent),
        )
        .route("/cadastrar-saude-geral", post(handlers::attach_general_health))
        .route(
            "/cadastrar-avaliacao-fototipo",
            post(handlers::attach_phototype),
        )
        .route(
            "/listar-atendimentos-usuario-logado",
            get(handlers::list_encounters),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use intake_core::{CoreConfig, EmailAddress, NonEmptyText, Role, SqliteStore};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        accounts: AccountService,
    }

    impl TestApp {
        fn new() -> Self {
            let cfg = CoreConfig::new(":memory:".into(), 12).unwrap();
            let store = Arc::new(SqliteStore::open_in_memory().unwrap());
            let state = AppState {
                intake: IntakeService::new(store.clone()),
                accounts: AccountService::new(&cfg, store),
            };
            Self {
                router: router(state.clone()),
                accounts: state.accounts,
            }
        }

        fn token_for(&self, username: &str) -> String {
            self.accounts
                .create_user(
                    NonEmptyText::new(username).unwrap(),
                    EmailAddress::parse(format!("{username}@ufmg.br")).unwrap(),
                    Role::Researcher,
                )
                .unwrap();
            self.accounts.issue_session(username).unwrap().token
        }

        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
            let request = Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            read_json(self.send(request).await).await
        }

        async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
            let request = Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap();
            read_json(self.send(request).await).await
        }
    }

    async fn read_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let body = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn patient(cpf: &str) -> Value {
        json!({
            "nome_paciente": "Maria Souza",
            "data_nascimento": "1985-06-02",
            "sexo": "feminino",
            "cpf_paciente": cpf,
            "email_paciente": "maria@example.com",
            "autoriza_pesquisa": true
        })
    }

    fn phototype(cor_pele: i64) -> Value {
        json!({
            "cor_pele": cor_pele,
            "cor_olhos": 1,
            "cor_cabelo": 2,
            "quantidade_sardas": 0,
            "reacao_sol": 4,
            "bronzeamento": 2,
            "sensibilidade_solar": 3
        })
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let app = TestApp::new();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = read_json(app.send(request).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn missing_or_unknown_token_is_401() {
        let app = TestApp::new();
        let request = Request::builder()
            .method("POST")
            .uri("/cadastrar-atendimento")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(patient("111").to_string()))
            .unwrap();
        let (status, body) = read_json(app.send(request).await).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "AUTH_REQUIRED");

        let (status, _) = app.get("/listar-atendimentos-usuario-logado", "deadbeef").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_then_duplicate_cpf() {
        let app = TestApp::new();
        let token = app.token_for("ana");

        let (status, body) = app.post("/cadastrar-atendimento", &token, patient("111")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["id"].as_i64().is_some());
        assert!(body["termo_consentimento_id"].is_null());
        assert!(body["saude_geral_id"].is_null());
        assert!(body["avaliacao_fototipo_id"].is_null());

        let (status, body) = app.post("/cadastrar-atendimento", &token, patient("111")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Paciente já cadastrado");
    }

    #[tokio::test]
    async fn blank_name_is_422() {
        let app = TestApp::new();
        let token = app.token_for("ana");
        let mut body = patient("111");
        body["nome_paciente"] = json!("  ");
        let (status, body) = app.post("/cadastrar-atendimento", &token, body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn consent_attaches_once() {
        let app = TestApp::new();
        let token = app.token_for("ana");
        let (_, encounter) = app.post("/cadastrar-atendimento", &token, patient("111")).await;
        let uri = format!(
            "/cadastrar-termo-consentimento?atendimento_id={}",
            encounter["id"]
        );

        let (status, body) = app
            .post(&uri, &token, json!({"arquivo_url": "https://docs/termo-1.pdf"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], api_shared::CONSENT_ATTACHED_MESSAGE);
        let first_id = body["termo_consentimento"]["id"].clone();

        let (status, body) = app
            .post(&uri, &token, json!({"arquivo_url": "https://docs/termo-2.pdf"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["detail"],
            "Atendimento já possui um termo de consentimento"
        );

        let (_, list) = app.get("/listar-atendimentos-usuario-logado", &token).await;
        assert_eq!(list[0]["termo_consentimento_id"], first_id);
    }

    #[tokio::test]
    async fn general_health_returns_flat_record() {
        let app = TestApp::new();
        let token = app.token_for("ana");
        let (_, encounter) = app.post("/cadastrar-atendimento", &token, patient("111")).await;
        let uri = format!("/cadastrar-saude-geral?atendimento_id={}", encounter["id"]);

        let (status, body) = app
            .post(&uri, &token, json!({"hipertenso": true, "medicamentos": "losartana"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], api_shared::GENERAL_HEALTH_ATTACHED_MESSAGE);
        assert_eq!(body["saude_geral"]["hipertenso"], true);
        assert_eq!(body["saude_geral"]["medicamentos"], "losartana");
    }

    #[tokio::test]
    async fn invalid_phototype_code_names_field() {
        let app = TestApp::new();
        let token = app.token_for("ana");
        let (_, encounter) = app.post("/cadastrar-atendimento", &token, patient("111")).await;
        let uri = format!(
            "/cadastrar-avaliacao-fototipo?atendimento_id={}",
            encounter["id"]
        );

        let (status, body) = app.post(&uri, &token, phototype(3)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Valor inválido para cor_pele");

        let (status, body) = app.post(&uri, &token, phototype(8)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["avaliacao_fototipo"]["cor_pele"], 8);
    }

    #[tokio::test]
    async fn unknown_encounter_is_404() {
        let app = TestApp::new();
        let token = app.token_for("ana");
        let (status, body) = app
            .post(
                "/cadastrar-termo-consentimento?atendimento_id=999",
                &token,
                json!({"arquivo_url": "https://docs/termo.pdf"}),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Atendimento não encontrado");
    }

    #[tokio::test]
    async fn listing_is_scoped_to_caller() {
        let app = TestApp::new();
        let ana = app.token_for("ana");
        let bruno = app.token_for("bruno");

        let (status, _) = app.get("/listar-atendimentos-usuario-logado", &ana).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        app.post("/cadastrar-atendimento", &ana, patient("111")).await;
        app.post("/cadastrar-atendimento", &bruno, patient("222")).await;

        let (status, body) = app.get("/listar-atendimentos-usuario-logado", &ana).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["cpf_paciente"], "111");
        assert_eq!(rows[0]["nome_paciente"], "Maria Souza");
    }

    #[tokio::test]
    async fn malformed_requests_use_the_error_body() {
        let app = TestApp::new();
        let token = app.token_for("ana");
        let (_, encounter) = app.post("/cadastrar-atendimento", &token, patient("111")).await;

        let mut incomplete = phototype(8);
        incomplete.as_object_mut().unwrap().remove("cor_olhos");
        let uri = format!(
            "/cadastrar-avaliacao-fototipo?atendimento_id={}",
            encounter["id"]
        );
        let (status, body) = app.post(&uri, &token, incomplete).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_INPUT");
        assert!(body["detail"].as_str().unwrap().contains("cor_olhos"));

        let (status, body) = app
            .post(
                "/cadastrar-termo-consentimento",
                &token,
                json!({"arquivo_url": "https://docs/termo.pdf"}),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_INPUT");

        let mut bad_date = patient("222");
        bad_date["data_nascimento"] = json!("02/06/1985");
        let (status, body) = app.post("/cadastrar-atendimento", &token, bad_date).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[test]
    fn openapi_documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/cadastrar-atendimento",
            "/cadastrar-termo-consentimento",
            "/cadastrar-saude-geral",
            "/cadastrar-avaliacao-fototipo",
            "/listar-atendimentos-usuario-logado",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
