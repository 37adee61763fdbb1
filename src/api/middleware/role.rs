//! Role gates for the doctor / patient / admin route groups.
//! Must run inside `require_auth`.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::AuthContext;
use crate::models::enums::Role;

async fn require_role(role: Role, req: Request<axum::body::Body>, next: Next) -> Response {
    let Some(principal) = req.extensions().get::<AuthContext>().copied() else {
        return ApiError::Unauthorized.into_response();
    };
    if principal.role != Some(role) {
        tracing::debug!(
            user_id = principal.user_id,
            required = role.as_str(),
            "Role gate rejected request"
        );
        return ApiError::Forbidden.into_response();
    }
    next.run(req).await
}

pub async fn doctor(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(Role::Doctor, req, next).await
}

pub async fn patient(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(Role::Patient, req, next).await
}

pub async fn admin(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(Role::Admin, req, next).await
}
