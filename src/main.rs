use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use intake_core::config::{database_path_from_env_value, session_ttl_hours_from_env_value};
use intake_core::{AccountService, CoreConfig, IntakeService, SqliteStore};

/// Main entry point for the intake service
///
/// Starts the REST server with OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `INTAKE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `INTAKE_DATABASE_PATH`: SQLite database file (default: "intake.db")
/// - `INTAKE_SESSION_TTL_HOURS`: Lifetime of issued session tokens (default: 12)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the database cannot be opened,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("intake=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("INTAKE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = CoreConfig::new(
        database_path_from_env_value(std::env::var("INTAKE_DATABASE_PATH").ok()),
        session_ttl_hours_from_env_value(std::env::var("INTAKE_SESSION_TTL_HOURS").ok())?,
    )?;

    tracing::info!(path = %cfg.database_path().display(), "opening database");
    let store = Arc::new(SqliteStore::open(cfg.database_path())?);

    let state = AppState {
        intake: IntakeService::new(store.clone()),
        accounts: AccountService::new(&cfg, store),
    };

    tracing::info!("++ Starting intake REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
