//! Account lifecycle: sign-up, login, bearer tokens, profile edits.
//!
//! Every multi-row write here runs inside one SQLite transaction. Tokens
//! are only issued after that transaction committed.

pub mod profile;
pub mod registration;

pub use profile::*;
pub use registration::*;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use thiserror::Error;

use crate::config::AdminSeed;
use crate::core_state::CoreState;
use crate::crypto::{self, CryptoError};
use crate::db::{self, DatabaseError};
use crate::models::enums::Role;
use crate::models::*;
use crate::validation::{rules, FieldErrors, Payload, ValidationError, Validator};

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Validation failed")]
    Invalid(FieldErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// A UNIQUE/FK constraint fired inside the write transaction
    /// (e.g. a concurrent sign-up with the same email). Rolled back.
    #[error("Conflicting data: {0}")]
    Conflict(String),

    /// The account was committed but no token could be stored.
    #[error("Token issuance failed for user {user_id}: {source}")]
    TokenIssuance {
        user_id: i64,
        #[source]
        source: DatabaseError,
    },

    #[error("Database error: {0}")]
    Database(DatabaseError),

    #[error("Password hashing error: {0}")]
    Crypto(#[from] CryptoError),
}

impl From<DatabaseError> for AccountError {
    fn from(err: DatabaseError) -> Self {
        if err.is_constraint_violation() {
            AccountError::Conflict(err.to_string())
        } else {
            AccountError::Database(err)
        }
    }
}

impl From<rusqlite::Error> for AccountError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

impl From<ValidationError> for AccountError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Invalid(errors) => AccountError::Invalid(errors),
            ValidationError::Database(e) => e.into(),
        }
    }
}

impl From<FieldErrors> for AccountError {
    fn from(errors: FieldErrors) -> Self {
        AccountError::Invalid(errors)
    }
}

// ═══════════════════════════════════════════════════════════
// Tokens
// ═══════════════════════════════════════════════════════════

/// Mint a bearer token for `user_id` and store its hash.
/// Returns the plaintext, which is never persisted.
pub fn issue_token(
    conn: &Connection,
    user_id: i64,
    expires_at: Option<NaiveDateTime>,
) -> Result<String, DatabaseError> {
    let token = crypto::generate_token();
    db::insert_access_token(conn, user_id, &crypto::hash_token(&token), expires_at)?;
    Ok(token)
}

/// Issue a token for an account that was just committed.
pub(crate) fn issue_after_commit(
    conn: &Connection,
    core: &CoreState,
    user_id: i64,
) -> Result<String, AccountError> {
    issue_token(conn, user_id, core.token_expiry())
        .map_err(|source| AccountError::TokenIssuance { user_id, source })
}

// ═══════════════════════════════════════════════════════════
// Login & plain sign-up
// ═══════════════════════════════════════════════════════════

/// Check email + password and issue a fresh token.
pub fn login(
    conn: &Connection,
    core: &CoreState,
    payload: &Payload,
) -> Result<(User, String), AccountError> {
    let mut v = Validator::new(payload);
    let (email, password) = rules::credentials(&mut v);
    v.finish()?;
    let (Some(email), Some(password)) = (email, password) else {
        return Err(AccountError::InvalidCredentials);
    };

    let user = db::find_user_by_email(conn, &email)?;
    let Some((user, stored)) = user.and_then(|u| {
        let stored = u.password_hash.clone()?;
        Some((u, stored))
    }) else {
        // Unknown email or federated-only account.
        crypto::burn_verify(&password, core.password_rounds);
        return Err(AccountError::InvalidCredentials);
    };
    if !crypto::verify_password(&password, &stored)? {
        tracing::info!(user_id = user.id, "Login rejected: wrong password");
        return Err(AccountError::InvalidCredentials);
    }

    let token = issue_token(conn, user.id, core.token_expiry())?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok((user, token))
}

/// Create a role-less account. No token is issued.
pub fn register_user(
    conn: &Connection,
    core: &CoreState,
    payload: &Payload,
) -> Result<User, AccountError> {
    let mut v = Validator::new(payload);
    let info = rules::personal_info(&mut v, conn, None)?;
    v.finish()?;

    let password = info.password.clone().unwrap_or_default();
    let hash = crypto::hash_password(&password, core.password_rounds)?;
    let id = db::insert_user(conn, &info.into_new_user(None, hash)?)?;
    tracing::info!(user_id = id, "User registered");
    db::get_user(conn, id)?.ok_or(AccountError::NotFound("User"))
}

/// Ensure the configured administrator exists. Existing accounts with
/// that email are left untouched.
pub fn bootstrap_admin(
    conn: &Connection,
    core: &CoreState,
    seed: &AdminSeed,
) -> Result<i64, AccountError> {
    let email = seed.email.trim().to_lowercase();
    if let Some(existing) = db::find_user_by_email(conn, &email)? {
        if existing.role != Some(Role::Admin) {
            tracing::warn!(
                user_id = existing.id,
                "Admin seed email belongs to a non-admin account; not promoting"
            );
        }
        return Ok(existing.id);
    }
    let hash = crypto::hash_password(&seed.password, core.password_rounds)?;
    let id = db::insert_user(
        conn,
        &NewUser {
            role: Some(Role::Admin),
            name: "Admin".into(),
            last_name: "MedAppoint".into(),
            email,
            password_hash: Some(hash),
            ..Default::default()
        },
    )?;
    tracing::info!(user_id = id, "Bootstrap admin created");
    Ok(id)
}
