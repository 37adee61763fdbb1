//! Doctor profile endpoints.
//!
//! `GET /api/doctors_publics`: public directory (anonymous)
//! `GET /api/doctor/info`, `PUT /api/doctors`, `DELETE /api/doctors`: own profile (doctor)
//! `GET /api/doctors/:id`: any doctor's profile (patient)

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::{Extension, Json};
use serde_json::Value;

use super::{deleted, path_id, JsonResult, PUBLIC_PER_PAGE};
use crate::accounts;
use crate::api::error::ApiError;
use crate::api::resources;
use crate::api::types::{
    blocking, payload, ApiContext, ApiResponse, AuthContext, PageQuery, Paginated,
};
use crate::db;

/// `GET /api/doctors_publics`
pub async fn public_index(
    State(ctx): State<ApiContext>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Value>>, ApiError> {
    let conn = ctx.db()?;
    let page = db::list_doctors(&conn, query.request(PUBLIC_PER_PAGE))?
        .try_map(|doctor| db::enrich_doctor(&conn, doctor))?
        .map(|profile| resources::doctor_public(&profile));
    Ok(Paginated::from_page(page, uri.path()))
}

/// `GET /api/doctor/info`
pub async fn info(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
) -> JsonResult {
    let conn = ctx.db()?;
    let profile = db::load_doctor_profile(&conn, principal.user_id)?
        .ok_or_else(|| ApiError::not_found("Doctor"))?;
    Ok(ApiResponse::data(resources::doctor(&profile)))
}

/// `GET /api/doctors/:id`
pub async fn show(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    let profile =
        db::load_doctor_profile(&conn, id)?.ok_or_else(|| ApiError::not_found("Doctor"))?;
    Ok(ApiResponse::data(resources::doctor(&profile)))
}

/// `PUT /api/doctors`: partial update of the caller's user + doctor rows.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> JsonResult {
    let data = payload(body)?;
    let profile = blocking(move || {
        let mut conn = ctx.db()?;
        Ok(accounts::update_doctor_profile(
            &mut conn,
            &ctx.core,
            principal.user_id,
            &data,
        )?)
    })
    .await?;
    Ok(ApiResponse::data(resources::doctor(&profile)))
}

/// `DELETE /api/doctors`: removes the caller's account.
pub async fn destroy(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let mut conn = ctx.db()?;
    accounts::delete_doctor_profile(&mut conn, principal.user_id)?;
    Ok(deleted("Doctor"))
}
