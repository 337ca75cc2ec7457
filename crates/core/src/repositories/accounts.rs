//! Users and session tokens.
//!
//! Tokens are opaque random strings handed to the client once; only their SHA-256 digest is
//! stored. Resolving a token yields the typed [`Principal`] that every intake operation takes.

use crate::config::CoreConfig;
use crate::constants::SESSION_TOKEN_BYTES;
use crate::principal::{Principal, Role};
use crate::store::{AccountRepository, SqliteStore};
use crate::{IntakeError, IntakeResult};
use chrono::{DateTime, Duration, Utc};
use intake_types::{EmailAddress, NonEmptyText};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// A stored session joined with the user it belongs to.
#[derive(Clone, Debug)]
pub struct SessionOwner {
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// A freshly issued session. `token` is only available here.
#[derive(Clone, Debug)]
pub struct IssuedSession {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn generate_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Service for managing users and authenticating session tokens.
#[derive(Clone, Debug)]
pub struct AccountService {
    store: Arc<SqliteStore>,
    session_ttl: Duration,
}

impl AccountService {
    pub fn new(cfg: &CoreConfig, store: Arc<SqliteStore>) -> Self {
        Self {
            store,
            session_ttl: cfg.session_ttl(),
        }
    }

    /// Registers a new user.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::DuplicateUser`] if the username is taken.
    pub fn create_user(
        &self,
        username: NonEmptyText,
        email: EmailAddress,
        role: Role,
    ) -> IntakeResult<User> {
        let user = self.store.with_tx(|repo| {
            repo.insert_user(username.as_str(), email.as_str(), role, Utc::now())
        })?;
        tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "user created");
        Ok(user)
    }

    pub fn find_user(&self, username: &str) -> IntakeResult<User> {
        self.store
            .read(|repo| repo.find_user_by_username(username))?
            .ok_or_else(|| IntakeError::UserNotFound(username.to_string()))
    }

    pub fn list_users(&self) -> IntakeResult<Vec<User>> {
        self.store.read(|repo| repo.list_users())
    }

    /// Issues a new bearer token for `username`, valid for the configured session lifetime.
    pub fn issue_session(&self, username: &str) -> IntakeResult<IssuedSession> {
        let token = generate_token();
        let token_hash = hash_token(&token);
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        let user = self.store.with_tx(|repo| {
            let user = repo
                .find_user_by_username(username)?
                .ok_or_else(|| IntakeError::UserNotFound(username.to_string()))?;
            repo.insert_session(&token_hash, user.id, now, expires_at)?;
            Ok(user)
        })?;

        tracing::info!(user_id = user.id, %expires_at, "session issued");
        Ok(IssuedSession {
            token,
            user,
            expires_at,
        })
    }

    /// Resolves a bearer token to the principal that owns it.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::Unauthenticated`] if the token is unknown or expired.
    pub fn authenticate(&self, token: &str) -> IntakeResult<Principal> {
        self.authenticate_at(token, Utc::now())
    }

    pub(crate) fn authenticate_at(&self, token: &str, now: DateTime<Utc>) -> IntakeResult<Principal> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IntakeError::Unauthenticated);
        }

        let owner = self
            .store
            .read(|repo| repo.find_session_owner(&hash_token(token)))?
            .ok_or(IntakeError::Unauthenticated)?;

        if owner.expires_at <= now {
            tracing::warn!(user_id = owner.user.id, "expired session token presented");
            return Err(IntakeError::Unauthenticated);
        }

        Ok(owner.user.principal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn service() -> AccountService {
        let cfg = CoreConfig::new(PathBuf::from(":memory:"), 1).unwrap();
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        AccountService::new(&cfg, store)
    }

    fn add_ana(svc: &AccountService) -> User {
        svc.create_user(
            NonEmptyText::new("ana").unwrap(),
            EmailAddress::parse("ana@ufmg.br").unwrap(),
            Role::Researcher,
        )
        .unwrap()
    }

    #[test]
    fn issued_token_authenticates_as_its_user() {
        let svc = service();
        let ana = add_ana(&svc);

        let session = svc.issue_session("ana").unwrap();
        assert_eq!(session.token.len(), SESSION_TOKEN_BYTES * 2);

        let principal = svc.authenticate(&session.token).unwrap();
        assert_eq!(principal, ana.principal());
    }

    #[test]
    fn only_the_token_hash_is_stored() {
        let svc = service();
        add_ana(&svc);
        let session = svc.issue_session("ana").unwrap();

        let stored: String = svc
            .store
            .read(|c| Ok(c.query_row("SELECT token_hash FROM sessions", [], |r| r.get(0))?))
            .unwrap();
        assert_ne!(stored, session.token);
        assert_eq!(stored, hash_token(&session.token));
    }

    #[test]
    fn unknown_and_blank_tokens_are_rejected() {
        let svc = service();
        add_ana(&svc);
        assert!(matches!(
            svc.authenticate("deadbeef"),
            Err(IntakeError::Unauthenticated)
        ));
        assert!(matches!(svc.authenticate("  "), Err(IntakeError::Unauthenticated)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service();
        add_ana(&svc);
        let session = svc.issue_session("ana").unwrap();

        let later = session.expires_at + Duration::seconds(1);
        assert!(matches!(
            svc.authenticate_at(&session.token, later),
            Err(IntakeError::Unauthenticated)
        ));
    }

    #[test]
    fn issuing_for_unknown_user_fails() {
        let svc = service();
        assert!(matches!(
            svc.issue_session("ghost"),
            Err(IntakeError::UserNotFound(ref u)) if u == "ghost"
        ));
    }

    #[test]
    fn list_users_returns_in_creation_order() {
        let svc = service();
        add_ana(&svc);
        svc.create_user(
            NonEmptyText::new("bruno").unwrap(),
            EmailAddress::parse("bruno@ufmg.br").unwrap(),
            Role::Supervisor,
        )
        .unwrap();

        let names: Vec<String> = svc
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["ana", "bruno"]);
    }
}
