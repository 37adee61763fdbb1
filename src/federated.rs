//! Federated sign-in through an external identity provider.
//!
//! The HTTP layer only sees the `IdentityProvider` trait; `GoogleProvider`
//! is the production implementation (OAuth 2.0 authorization-code flow).

use async_trait::async_trait;
use reqwest::Url;
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleSettings;
use crate::db::{self, DatabaseError};
use crate::models::*;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Error, Debug)]
pub enum FederatedError {
    #[error("Identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Identity provider rejected the request: {0}")]
    Rejected(String),

    #[error("Identity provider returned no email address")]
    MissingEmail,

    #[error("Identity provider has not verified the email address")]
    UnverifiedEmail,

    #[error("Email already belongs to a password account")]
    EmailInUse,

    #[error("Sign-in state missing or mismatched")]
    StateMismatch,

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),
}

/// Who the provider says the caller is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub subject: String,
    pub email: String,
    pub email_verified: bool,
    pub given_name: String,
    pub family_name: String,
    pub picture: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Stored in `users.external_auth`.
    fn name(&self) -> &'static str;

    /// Consent page the browser is redirected to. `state` comes back
    /// untouched on the callback.
    fn authorize_url(&self, state: &str) -> Result<String, FederatedError>;

    /// Trade an authorization code for the caller's identity.
    async fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, FederatedError>;
}

// ═══════════════════════════════════════════════════════════
// Google
// ═══════════════════════════════════════════════════════════

pub struct GoogleProvider {
    settings: GoogleSettings,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    given_name: Option<String>,
    family_name: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleProvider {
    pub fn new(settings: GoogleSettings) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorize_url(&self, state: &str) -> Result<String, FederatedError> {
        let url = Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .map_err(|e| FederatedError::InvalidUrl(e.to_string()))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, FederatedError> {
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FederatedError::Rejected(format!(
                "token exchange returned {}",
                response.status()
            )));
        }
        let token: TokenResponse = response.json().await?;

        let info: UserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let email = info.email.ok_or(FederatedError::MissingEmail)?;
        let given_name = info
            .given_name
            .or_else(|| info.name.clone())
            .unwrap_or_else(|| email.clone());
        Ok(ExternalIdentity {
            subject: info.sub,
            email,
            email_verified: info.email_verified,
            given_name,
            family_name: info.family_name.unwrap_or_default(),
            picture: info.picture,
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Account resolution
// ═══════════════════════════════════════════════════════════

/// Find the account linked to `identity`, or create a role-less one.
///
/// An email that already belongs to another account is never taken
/// over; the caller has to log in with that account's password.
pub fn resolve_external_user(
    conn: &Connection,
    provider: &str,
    identity: &ExternalIdentity,
) -> Result<User, FederatedError> {
    if let Some(user) = db::find_user_by_external(conn, &identity.subject, provider)? {
        return Ok(user);
    }
    if !identity.email_verified {
        return Err(FederatedError::UnverifiedEmail);
    }

    let email = identity.email.to_lowercase();
    if let Some(existing) = db::find_user_by_email(conn, &email)? {
        tracing::warn!(
            user_id = existing.id,
            provider,
            "Federated sign-in refused: email belongs to another account"
        );
        return Err(FederatedError::EmailInUse);
    }

    let id = db::insert_user(
        conn,
        &NewUser {
            name: identity.given_name.clone(),
            last_name: identity.family_name.clone(),
            email,
            link_photo: identity.picture.clone(),
            external_id: Some(identity.subject.clone()),
            external_auth: Some(provider.to_string()),
            ..Default::default()
        },
    )?;
    tracing::info!(user_id = id, provider, "Created account from external identity");
    db::get_user(conn, id)?.ok_or_else(|| DatabaseError::not_found("User", id).into())
}
