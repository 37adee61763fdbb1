//! Process-wide application state shared by every request.
//!
//! Holds no open connection: each request opens its own SQLite
//! connection from `db_path`, so the state is plain immutable data
//! behind an `Arc`.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, Utc};

use crate::config::Settings;
use crate::db;
use crate::federated::{GoogleProvider, IdentityProvider};

pub struct CoreState {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// PBKDF2 iterations for newly hashed passwords.
    pub password_rounds: u32,
    /// Lifetime of issued bearer tokens; `None` = no expiry.
    pub token_ttl: Option<Duration>,
    /// Browser destination after federated sign-in.
    pub frontend_url: String,
    identity_provider: Option<Arc<dyn IdentityProvider>>,
}

impl CoreState {
    pub fn new(db_path: PathBuf, password_rounds: u32) -> Self {
        Self {
            db_path,
            password_rounds,
            token_ttl: None,
            frontend_url: "/".to_string(),
            identity_provider: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut state = Self::new(settings.database_path.clone(), settings.password_rounds);
        state.token_ttl = settings.token_ttl_hours.map(Duration::hours);
        state.frontend_url = settings.frontend_url.clone();
        if let Some(google) = &settings.google {
            state.identity_provider = Some(Arc::new(GoogleProvider::new(google.clone())));
        }
        state
    }

    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity_provider = Some(provider);
        self
    }

    pub fn identity_provider(&self) -> Option<Arc<dyn IdentityProvider>> {
        self.identity_provider.clone()
    }

    /// Open a connection to the application database (migrations applied).
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    /// Expiry for a token issued now.
    pub fn token_expiry(&self) -> Option<NaiveDateTime> {
        self.token_ttl.map(|ttl| Utc::now().naive_utc() + ttl)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_db_creates_schema() {
        let tmp = tempfile::tempdir().unwrap();
        let state = CoreState::new(tmp.path().join("m.db"), 1_000);
        let conn = state.open_db().unwrap();
        assert_eq!(db::count_tables(&conn).unwrap(), 20);
    }

    #[test]
    fn tokens_never_expire_without_ttl() {
        let tmp = tempfile::tempdir().unwrap();
        let state = CoreState::new(tmp.path().join("m.db"), 1_000);
        assert!(state.token_expiry().is_none());
    }

    #[test]
    fn ttl_sets_future_expiry() {
        let tmp = tempfile::tempdir().unwrap();
        let mut state = CoreState::new(tmp.path().join("m.db"), 1_000);
        state.token_ttl = Some(Duration::hours(2));
        let expiry = state.token_expiry().unwrap();
        assert!(expiry > Utc::now().naive_utc() + Duration::minutes(119));
    }
}
