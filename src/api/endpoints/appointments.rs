//! Appointment endpoints (doctor group).
//!
//! `GET /api/appointments` and `POST /api/appointments`
//! `GET|PUT|DELETE /api/appointments/:id`
//!
//! Each appointment is returned with its doctor and patient rows and the
//! first summary (with medicines) when one exists.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::Json;
use serde_json::Value;

use super::{created, deleted, path_id, CreatedResult, JsonResult, PER_PAGE};
use crate::api::error::ApiError;
use crate::api::resources;
use crate::api::types::{payload, ApiContext, ApiResponse, PageQuery, Paginated};
use crate::db;
use crate::validation::{rules, Validator};

pub async fn index(
    State(ctx): State<ApiContext>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Value>>, ApiError> {
    let conn = ctx.db()?;
    let page = db::list_appointments(&conn, query.request(PER_PAGE))?
        .try_map(|appt| db::enrich_appointment(&conn, appt))?
        .map(|detail| resources::appointment(&detail));
    Ok(Paginated::from_page(page, uri.path()))
}

pub async fn store(
    State(ctx): State<ApiContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> CreatedResult {
    let data = payload(body)?;
    let conn = ctx.db()?;

    let mut v = Validator::new(&data);
    let patch = rules::appointment_fields(&mut v, &conn)?;
    v.finish()?;

    let id = db::insert_appointment(&conn, &rules::new_appointment(patch)?)?;
    tracing::info!(appointment_id = id, "Appointment created");
    let detail =
        db::load_appointment_detail(&conn, id)?.ok_or_else(|| ApiError::not_found("Appointment"))?;
    Ok(created(resources::appointment(&detail)))
}

pub async fn show(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    let detail =
        db::load_appointment_detail(&conn, id)?.ok_or_else(|| ApiError::not_found("Appointment"))?;
    Ok(ApiResponse::data(resources::appointment(&detail)))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let data = payload(body)?;
    let conn = ctx.db()?;
    let mut appt =
        db::get_appointment(&conn, id)?.ok_or_else(|| ApiError::not_found("Appointment"))?;

    let mut v = Validator::partial(&data);
    let patch = rules::appointment_fields(&mut v, &conn)?;
    v.finish()?;

    patch.apply(&mut appt);
    db::update_appointment(&conn, &appt)?;
    let detail = db::enrich_appointment(&conn, appt)?;
    Ok(ApiResponse::data(resources::appointment(&detail)))
}

pub async fn destroy(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    if !db::delete_appointment(&conn, id)? {
        return Err(ApiError::not_found("Appointment"));
    }
    tracing::info!(appointment_id = id, "Appointment deleted");
    Ok(deleted("Appointment"))
}
