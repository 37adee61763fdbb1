//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves its hash against
//! `access_tokens`, and injects `AuthContext` into request extensions
//! for downstream handlers.

use axum::http::header::{AUTHORIZATION, CACHE_CONTROL};
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::crypto;
use crate::db;

/// Require a valid, unexpired bearer token.
///
/// Reads `ApiContext` from request extensions (injected by the Extension layer).
/// On success the principal is also copied into the response extensions so
/// the access log can attribute the request.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = bearer_token(req.headers()).ok_or(ApiError::Unauthorized)?;

    let principal = {
        let conn = ctx.db()?;
        let record = db::find_access_token(&conn, &crypto::hash_token(&token))?
            .ok_or(ApiError::Unauthorized)?;

        if let Some(expires_at) = record.expires_at {
            if expires_at <= Utc::now().naive_utc() {
                db::delete_access_token(&conn, record.token_id)?;
                tracing::info!(user_id = record.user_id, "Expired token rejected");
                return Err(ApiError::TokenExpired);
            }
        }
        db::touch_access_token(&conn, record.token_id)?;

        AuthContext {
            user_id: record.user_id,
            role: record.role,
            token_id: record.token_id,
        }
    }; // connection dropped here, before any .await

    req.extensions_mut().insert(principal);

    let mut response = next.run(req).await;

    response.extensions_mut().insert(principal);
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    Ok(response)
}
