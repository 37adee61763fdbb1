//! Access log middleware.
//!
//! One line per request: request id, method, path, status, caller and
//! elapsed time. Runs outermost, so it also sees requests rejected by auth.

use std::time::Instant;

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::api::types::AuthContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(req).await;

    let status = response.status().as_u16();
    // Set by the auth middleware on authenticated routes.
    let user_id = response.extensions().get::<AuthContext>().map(|p| p.user_id);
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status >= 500 {
        tracing::warn!(%request_id, %method, %path, status, ?user_id, elapsed_ms, "API request failed");
    } else {
        tracing::info!(%request_id, %method, %path, status, ?user_id, elapsed_ms, "API request");
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("X-Request-Id", value);
    }
    response
}
