//! Consultation summaries and their medicines (doctor group).
//!
//! `/api/summaries[/:id]` and `/api/medicines[/:id]`

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

// ═══════════════════════════════════════════════════════════
// Summaries
// ═══════════════════════════════════════════════════════════

pub async fn index(
    State(ctx): State<ApiContext>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Value>>, ApiError> {
    let conn = ctx.db()?;
    let page = db::list_summaries(&conn, query.request(PER_PAGE))?
        .try_map(|s| db::with_medicines(&conn, s))?
        .map(|s| resources::summary(&s));
    Ok(Paginated::from_page(page, uri.path()))
}

pub async fn store(
    State(ctx): State<ApiContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> CreatedResult {
    let data = payload(body)?;
    let conn = ctx.db()?;

    let mut v = Validator::new(&data);
    let patch = rules::summary_fields(&mut v, &conn)?;
    v.finish()?;

    let (appointment_id, diagnosis) = rules::new_summary(patch)?;
    let id = db::insert_summary(&conn, appointment_id, &diagnosis)?;
    tracing::info!(summary_id = id, appointment_id, "Summary created");
    let summary = db::get_summary(&conn, id)?.ok_or_else(|| ApiError::not_found("Summary"))?;
    Ok(created(resources::summary(&db::with_medicines(&conn, summary)?)))
}

pub async fn show(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    let summary = db::get_summary(&conn, id)?.ok_or_else(|| ApiError::not_found("Summary"))?;
    Ok(ApiResponse::data(resources::summary(&db::with_medicines(
        &conn, summary,
    )?)))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let data = payload(body)?;
    let conn = ctx.db()?;
    let mut summary =
        db::get_summary(&conn, id)?.ok_or_else(|| ApiError::not_found("Summary"))?;

    let mut v = Validator::partial(&data);
    let patch = rules::summary_fields(&mut v, &conn)?;
    v.finish()?;

    patch.apply(&mut summary);
    db::update_summary(&conn, &summary)?;
    Ok(ApiResponse::data(resources::summary(&db::with_medicines(
        &conn, summary,
    )?)))
}

/// Medicines of the summary go with it.
pub async fn destroy(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    if !db::delete_summary(&conn, id)? {
        return Err(ApiError::not_found("Summary"));
    }
    tracing::info!(summary_id = id, "Summary deleted");
    Ok(deleted("Summary"))
}

// ═══════════════════════════════════════════════════════════
// Medicines
// ═══════════════════════════════════════════════════════════

pub async fn medicine_index(
    State(ctx): State<ApiContext>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Value>>, ApiError> {
    let conn = ctx.db()?;
    let page = db::list_medicines(&conn, query.request(PER_PAGE))?.map(|m| resources::medicine(&m));
    Ok(Paginated::from_page(page, uri.path()))
}

pub async fn medicine_store(
    State(ctx): State<ApiContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> CreatedResult {
    let data = payload(body)?;
    let conn = ctx.db()?;

    let mut v = Validator::new(&data);
    let patch = rules::medicine_fields(&mut v, &conn)?;
    v.finish()?;

    let id = db::insert_medicine(&conn, &rules::new_medicine(patch)?)?;
    let medicine = db::get_medicine(&conn, id)?.ok_or_else(|| ApiError::not_found("Medicine"))?;
    Ok(created(resources::medicine(&medicine)))
}

pub async fn medicine_show(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    let medicine = db::get_medicine(&conn, id)?.ok_or_else(|| ApiError::not_found("Medicine"))?;
    Ok(ApiResponse::data(resources::medicine(&medicine)))
}

pub async fn medicine_update(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let data = payload(body)?;
    let conn = ctx.db()?;
    let mut medicine =
        db::get_medicine(&conn, id)?.ok_or_else(|| ApiError::not_found("Medicine"))?;

    let mut v = Validator::partial(&data);
    let patch = rules::medicine_fields(&mut v, &conn)?;
    v.finish()?;

    patch.apply(&mut medicine);
    db::update_medicine(&conn, &medicine)?;
    Ok(ApiResponse::data(resources::medicine(&medicine)))
}

pub async fn medicine_destroy(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    if !db::delete_medicine(&conn, id)? {
        return Err(ApiError::not_found("Medicine"));
    }
    Ok(deleted("Medicine"))
}
