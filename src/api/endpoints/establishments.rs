//! Establishments and their street addresses (doctor group).
//!
//! `/api/establishments[/:id]`, `/api/addresses[/:id]`

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
// Establishments
// ═══════════════════════════════════════════════════════════

pub async fn index(
    State(ctx): State<ApiContext>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Value>>, ApiError> {
    let conn = ctx.db()?;
    let page = db::list_establishments(&conn, query.request(PER_PAGE))?
        .try_map(|e| db::with_address(&conn, e))?
        .map(|e| resources::establishment(&e));
    Ok(Paginated::from_page(page, uri.path()))
}

pub async fn store(
    State(ctx): State<ApiContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> CreatedResult {
    let data = payload(body)?;
    let conn = ctx.db()?;

    let mut v = Validator::new(&data);
    let patch = rules::establishment_fields(&mut v, &conn)?;
    v.finish()?;

    let id = db::insert_establishment(&conn, &rules::new_establishment(patch)?)?;
    let establishment =
        db::load_establishment(&conn, id)?.ok_or_else(|| ApiError::not_found("Establishment"))?;
    Ok(created(resources::establishment(&establishment)))
}

pub async fn show(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    let establishment =
        db::load_establishment(&conn, id)?.ok_or_else(|| ApiError::not_found("Establishment"))?;
    Ok(ApiResponse::data(resources::establishment(&establishment)))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let data = payload(body)?;
    let conn = ctx.db()?;
    let mut establishment =
        db::get_establishment(&conn, id)?.ok_or_else(|| ApiError::not_found("Establishment"))?;

    let mut v = Validator::partial(&data);
    let patch = rules::establishment_fields(&mut v, &conn)?;
    v.finish()?;

    patch.apply(&mut establishment);
    db::update_establishment(&conn, &establishment)?;
    let establishment = db::with_address(&conn, establishment)?;
    Ok(ApiResponse::data(resources::establishment(&establishment)))
}

pub async fn destroy(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    if !db::delete_establishment(&conn, id)? {
        return Err(ApiError::not_found("Establishment"));
    }
    Ok(deleted("Establishment"))
}

// ═══════════════════════════════════════════════════════════
// Addresses
// ═══════════════════════════════════════════════════════════

pub async fn address_index(
    State(ctx): State<ApiContext>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Value>>, ApiError> {
    let conn = ctx.db()?;
    let page = db::list_addresses(&conn, query.request(PER_PAGE))?.map(|a| resources::address(&a));
    Ok(Paginated::from_page(page, uri.path()))
}

pub async fn address_store(
    State(ctx): State<ApiContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> CreatedResult {
    let data = payload(body)?;
    let conn = ctx.db()?;

    let mut v = Validator::new(&data);
    let patch = rules::address_fields(&mut v);
    v.finish()?;

    let id = db::insert_address(&conn, &rules::new_address(patch)?)?;
    let address = db::get_address(&conn, id)?.ok_or_else(|| ApiError::not_found("Address"))?;
    Ok(created(resources::address(&address)))
}

pub async fn address_show(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    let address = db::get_address(&conn, id)?.ok_or_else(|| ApiError::not_found("Address"))?;
    Ok(ApiResponse::data(resources::address(&address)))
}

pub async fn address_update(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let data = payload(body)?;
    let conn = ctx.db()?;
    let mut address = db::get_address(&conn, id)?.ok_or_else(|| ApiError::not_found("Address"))?;

    let mut v = Validator::partial(&data);
    let patch = rules::address_fields(&mut v);
    v.finish()?;

    patch.apply(&mut address);
    db::update_address(&conn, &address)?;
    Ok(ApiResponse::data(resources::address(&address)))
}

/// Establishments at the address keep existing without one.
pub async fn address_destroy(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    if !db::delete_address(&conn, id)? {
        return Err(ApiError::not_found("Address"));
    }
    Ok(deleted("Address"))
}
