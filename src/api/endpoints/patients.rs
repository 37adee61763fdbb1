//! Patient profile endpoints.
//!
//! `GET /api/patients`, `GET /api/patients/:id`: browse patients (doctor)
//! `GET /api/patient/info`, `PUT /api/patients`, `DELETE /api/patients`: own profile (patient)

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::{Extension, Json};
use serde_json::Value;

use super::{deleted, path_id, JsonResult, PER_PAGE};
use crate::accounts;
use crate::api::error::ApiError;
use crate::api::resources;
use crate::api::types::{
    blocking, payload, ApiContext, ApiResponse, AuthContext, PageQuery, Paginated,
};
use crate::db;

/// `GET /api/patients`
pub async fn index(
    State(ctx): State<ApiContext>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Value>>, ApiError> {
    let conn = ctx.db()?;
    let page = db::list_patients(&conn, query.request(PER_PAGE))?
        .try_map(|patient| db::enrich_patient(&conn, patient))?
        .map(|profile| resources::patient(&profile));
    Ok(Paginated::from_page(page, uri.path()))
}

/// `GET /api/patients/:id`
pub async fn show(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    let profile =
        db::load_patient_profile(&conn, id)?.ok_or_else(|| ApiError::not_found("Patient"))?;
    Ok(ApiResponse::data(resources::patient(&profile)))
}

/// `GET /api/patient/info`
pub async fn info(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
) -> JsonResult {
    let conn = ctx.db()?;
    let profile = db::load_patient_profile(&conn, principal.user_id)?
        .ok_or_else(|| ApiError::not_found("Patient"))?;
    Ok(ApiResponse::data(resources::patient(&profile)))
}

/// `PUT /api/patients`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> JsonResult {
    let data = payload(body)?;
    let profile = blocking(move || {
        let mut conn = ctx.db()?;
        Ok(accounts::update_patient_profile(
            &mut conn,
            &ctx.core,
            principal.user_id,
            &data,
        )?)
    })
    .await?;
    Ok(ApiResponse::data(resources::patient(&profile)))
}

/// `DELETE /api/patients`
pub async fn destroy(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let mut conn = ctx.db()?;
    accounts::delete_patient_profile(&mut conn, principal.user_id)?;
    Ok(deleted("Patient"))
}
