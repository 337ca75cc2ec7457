use anyhow::Context;
use clap::{Parser, Subcommand};
use intake_core::config::{database_path_from_env_value, session_ttl_hours_from_env_value};
use intake_core::{
    AccountService, CoreConfig, EmailAddress, IntakeError, IntakeService, NonEmptyText, Role,
    SqliteStore,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Intake service operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply migrations
    InitDb,
    /// Create a user
    AddUser {
        /// Unique login name
        username: String,
        /// Contact email
        email: String,
        /// pesquisador, supervisor or administrador
        #[arg(long, default_value = "pesquisador")]
        role: Role,
    },
    /// List all users
    ListUsers,
    /// Issue a bearer token for a user
    IssueToken {
        /// Login name
        username: String,
    },
    /// List the encounters a user has registered
    ListEncounters {
        /// Login name
        username: String,
    },
}

fn load_config() -> anyhow::Result<CoreConfig> {
    let database_path = database_path_from_env_value(std::env::var("INTAKE_DATABASE_PATH").ok());
    let ttl_hours = session_ttl_hours_from_env_value(std::env::var("INTAKE_SESSION_TTL_HOURS").ok())?;
    Ok(CoreConfig::new(database_path, ttl_hours)?)
}

fn open_store(cfg: &CoreConfig) -> anyhow::Result<Arc<SqliteStore>> {
    let store = SqliteStore::open(cfg.database_path())
        .with_context(|| format!("opening {}", cfg.database_path().display()))?;
    Ok(Arc::new(store))
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'intake --help' for commands");
        return Ok(());
    };

    let cfg = load_config()?;
    let store = open_store(&cfg)?;
    let accounts = AccountService::new(&cfg, store.clone());

    match command {
        Commands::InitDb => {
            println!("Database ready at {}", cfg.database_path().display());
        }
        Commands::AddUser {
            username,
            email,
            role,
        } => {
            let user = accounts.create_user(
                NonEmptyText::new(&username).map_err(IntakeError::from)?,
                EmailAddress::parse(&email).map_err(IntakeError::from)?,
                role,
            )?;
            println!("Created user {} (id {}, role {})", user.username, user.id, user.role);
        }
        Commands::ListUsers => {
            let users = accounts.list_users()?;
            if users.is_empty() {
                println!("No users found.");
            }
            for user in users {
                println!(
                    "ID: {}, Username: {}, Email: {}, Role: {}",
                    user.id, user.username, user.email, user.role
                );
            }
        }
        Commands::IssueToken { username } => {
            let session = accounts.issue_session(&username)?;
            println!("{}", session.token);
            eprintln!("Expires at {}", session.expires_at.to_rfc3339());
        }
        Commands::ListEncounters { username } => {
            let principal = accounts.find_user(&username)?.principal();
            let intake = IntakeService::new(store);
            match intake.list_encounters_for_user(&principal) {
                Ok(encounters) => {
                    for e in encounters {
                        println!(
                            "ID: {}, Date: {}, Patient: {} ({}), Consent: {:?}, Health: {:?}, Phototype: {:?}",
                            e.encounter_id,
                            e.date.to_rfc3339(),
                            e.patient_name,
                            e.patient_cpf,
                            e.consent_id,
                            e.general_health_id,
                            e.phototype_id
                        );
                    }
                }
                Err(IntakeError::NoEncountersFound { .. }) => {
                    println!("No encounters found for {username}.");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}
