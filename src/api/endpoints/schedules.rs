//! Weekly availability slots (doctor group).
//!
//! `GET /api/schedules`, `POST /api/schedules` (owner is the caller)
//! `GET /api/schedules/:doctor_id`: every slot of one doctor, unpaginated
//! `PUT|DELETE /api/schedules/:id`: only the owning doctor's slots

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::{Extension, Json};
use rusqlite::Connection;
use serde_json::Value;

use super::{created, deleted, path_id, CreatedResult, JsonResult, PER_PAGE};
use crate::api::error::ApiError;
use crate::api::resources;
use crate::api::types::{payload, ApiContext, ApiResponse, AuthContext, PageQuery, Paginated};
use crate::db;
use crate::models::Schedule;
use crate::validation::{rules, Validator};

/// A slot of the calling doctor; other doctors' slots read as missing.
fn owned(conn: &Connection, id: i64, principal: &AuthContext) -> Result<Schedule, ApiError> {
    db::get_schedule(conn, id)?
        .filter(|schedule| schedule.doctor_id == principal.user_id)
        .ok_or_else(|| ApiError::not_found("Schedule"))
}

pub async fn index(
    State(ctx): State<ApiContext>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Value>>, ApiError> {
    let conn = ctx.db()?;
    let page = db::list_schedules(&conn, query.request(PER_PAGE))?.map(|s| resources::schedule(&s));
    Ok(Paginated::from_page(page, uri.path()))
}

pub async fn store(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> CreatedResult {
    let data = payload(body)?;
    let conn = ctx.db()?;

    let mut v = Validator::new(&data);
    let patch = rules::schedule_fields(&mut v, None);
    v.finish()?;

    let id = db::insert_schedule(&conn, &rules::new_schedule(principal.user_id, patch)?)?;
    tracing::info!(schedule_id = id, doctor_id = principal.user_id, "Schedule created");
    let schedule = db::get_schedule(&conn, id)?.ok_or_else(|| ApiError::not_found("Schedule"))?;
    Ok(created(resources::schedule(&schedule)))
}

pub async fn for_doctor(
    State(ctx): State<ApiContext>,
    doctor_id: Result<Path<i64>, PathRejection>,
) -> JsonResult {
    let doctor_id = path_id(doctor_id)?;
    let conn = ctx.db()?;
    let schedules = db::list_schedules_for_doctor(&conn, doctor_id)?;
    Ok(ApiResponse::data(
        schedules.iter().map(resources::schedule).collect(),
    ))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let data = payload(body)?;
    let conn = ctx.db()?;
    let mut schedule = owned(&conn, id, &principal)?;

    let mut v = Validator::partial(&data);
    let patch = rules::schedule_fields(&mut v, Some(&schedule));
    v.finish()?;

    patch.apply(&mut schedule);
    db::update_schedule(&conn, &schedule)?;
    Ok(ApiResponse::data(resources::schedule(&schedule)))
}

pub async fn destroy(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    let schedule = owned(&conn, id, &principal)?;
    if !db::delete_schedule(&conn, schedule.id)? {
        return Err(ApiError::not_found("Schedule"));
    }
    Ok(deleted("Schedule"))
}
