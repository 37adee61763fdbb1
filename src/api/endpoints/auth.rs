//! Sign-up, login and federated sign-in.
//!
//! `POST /api/login`: email + password, returns a bearer token
//! `POST /api/users/register`: role-less account, no token
//! `POST /api/doctors/register`, `POST /api/patients/register`: atomic
//! user + profile creation, returns a bearer token
//! `GET /api/auth/google/redirect`, `GET /api/auth/google/callback`

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use subtle::ConstantTimeEq;

use super::{created, CreatedResult};
use crate::accounts::{self, Registration};
use crate::api::error::ApiError;
use crate::api::resources;
use crate::api::types::{blocking, payload, ApiContext};
use crate::crypto;
use crate::federated::{self, FederatedError};

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: Value,
}

#[derive(Serialize)]
pub struct RegisteredResponse {
    pub success: bool,
    pub data: Value,
    pub token: String,
}

/// `POST /api/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let data = payload(body)?;
    let (user, token) = blocking(move || {
        let conn = ctx.db()?;
        Ok(accounts::login(&conn, &ctx.core, &data)?)
    })
    .await?;

    Ok(Json(LoginResponse {
        success: true,
        token,
        user: resources::user(&user),
    }))
}

/// `POST /api/users/register`
pub async fn register_user(
    State(ctx): State<ApiContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> CreatedResult {
    let data = payload(body)?;
    let user = blocking(move || {
        let conn = ctx.db()?;
        Ok(accounts::register_user(&conn, &ctx.core, &data)?)
    })
    .await?;
    Ok(created(resources::user(&user)))
}

fn registered(data: Value, token: String) -> (StatusCode, Json<RegisteredResponse>) {
    (
        StatusCode::CREATED,
        Json(RegisteredResponse {
            success: true,
            data,
            token,
        }),
    )
}

/// `POST /api/doctors/register`
pub async fn register_doctor(
    State(ctx): State<ApiContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    let data = payload(body)?;
    let Registration { profile, token } = blocking(move || {
        let mut conn = ctx.db()?;
        Ok(accounts::register_doctor(&mut conn, &ctx.core, &data)?)
    })
    .await?;
    Ok(registered(resources::doctor(&profile), token))
}

/// `POST /api/patients/register`
pub async fn register_patient(
    State(ctx): State<ApiContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    let data = payload(body)?;
    let Registration { profile, token } = blocking(move || {
        let mut conn = ctx.db()?;
        Ok(accounts::register_patient(&mut conn, &ctx.core, &data)?)
    })
    .await?;
    Ok(registered(resources::patient(&profile), token))
}

// ═══════════════════════════════════════════════════════════
// Federated sign-in
// ═══════════════════════════════════════════════════════════

/// Carries the `state` handed to the provider back to the callback.
const STATE_COOKIE: &str = "medappoint_oauth_state";
const STATE_COOKIE_PATH: &str = "/api/auth/google";
const STATE_TTL_SECS: u32 = 600;

fn found(location: &str, cookie: String) -> Response {
    (
        StatusCode::FOUND,
        [(LOCATION, location.to_string()), (SET_COOKIE, cookie)],
    )
        .into_response()
}

fn state_cookie(value: &str, max_age: u32) -> String {
    format!("{STATE_COOKIE}={value}; Path={STATE_COOKIE_PATH}; Max-Age={max_age}; HttpOnly; SameSite=Lax")
}

/// Value of cookie `name` from the request's `Cookie` headers.
fn read_cookie<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// The callback's `state` must equal the one this browser was sent off with.
fn check_state(headers: &HeaderMap, returned: Option<&str>) -> Result<(), FederatedError> {
    match (read_cookie(headers, STATE_COOKIE), returned) {
        (Some(expected), Some(returned))
            if !expected.is_empty()
                && bool::from(expected.as_bytes().ct_eq(returned.as_bytes())) =>
        {
            Ok(())
        }
        _ => Err(FederatedError::StateMismatch),
    }
}

/// `GET /api/auth/google/redirect`: send the browser to the consent page.
pub async fn google_redirect(State(ctx): State<ApiContext>) -> Result<Response, ApiError> {
    let provider = ctx
        .core
        .identity_provider()
        .ok_or_else(|| ApiError::not_found("Identity provider"))?;
    let state = crypto::generate_token();
    let location = provider.authorize_url(&state)?;
    Ok(found(&location, state_cookie(&state, STATE_TTL_SECS)))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// `GET /api/auth/google/callback`: exchange the code, sign the user in
/// and hand the token to the frontend in the URL fragment.
pub async fn google_callback(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    let provider = ctx
        .core
        .identity_provider()
        .ok_or_else(|| ApiError::not_found("Identity provider"))?;

    if let Some(error) = query.error {
        tracing::info!(error = %error, "Federated sign-in cancelled by provider");
        return Err(ApiError::InvalidCredentials);
    }
    check_state(&headers, query.state.as_deref())?;
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".into()))?;

    let identity = provider.exchange_code(&code).await?;

    let token = {
        let conn = ctx.db()?;
        let user = federated::resolve_external_user(&conn, provider.name(), &identity)?;
        let token = accounts::issue_token(&conn, user.id, ctx.core.token_expiry())?;
        tracing::info!(user_id = user.id, provider = provider.name(), "Federated sign-in");
        token
    };

    let base = ctx.core.frontend_url.trim_end_matches('/');
    Ok(found(&format!("{base}/#{token}"), state_cookie("", 0)))
}
