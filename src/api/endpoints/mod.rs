//! HTTP endpoint handlers, one module per resource.
//!
//! Handlers validate input, call the repository or account layer, and
//! shape the result with `api::resources`.

pub mod associations;
pub mod auth;
pub mod appointments;
pub mod catalogs;
pub mod doctors;
pub mod establishments;
pub mod patients;
pub mod schedules;
pub mod summaries;
pub mod users;

use axum::extract::rejection::PathRejection;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::ApiResponse;

/// Default page size of resource listings.
pub const PER_PAGE: u32 = 5;
/// Page size of the public directories.
pub const PUBLIC_PER_PAGE: u32 = 20;

pub type JsonResult = Result<Json<ApiResponse<Value>>, ApiError>;
pub type CreatedResult = Result<(StatusCode, Json<ApiResponse<Value>>), ApiError>;

/// Numeric `:id` segment; anything else is a 400.
pub(crate) fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::BadRequest("Invalid id".into()))
}

pub(crate) fn created(data: Value) -> (StatusCode, Json<ApiResponse<Value>>) {
    (StatusCode::CREATED, ApiResponse::data(data))
}

pub(crate) fn deleted(entity: &str) -> Json<ApiResponse<()>> {
    ApiResponse::message(format!("{entity} deleted"))
}
