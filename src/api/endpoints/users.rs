//! User administration (admin group).
//!
//! `GET /api/users`, `GET|PUT|DELETE /api/users/:id`

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::Json;
use serde_json::Value;

use super::{deleted, path_id, JsonResult, PER_PAGE};
use crate::accounts;
use crate::api::error::ApiError;
use crate::api::resources;
use crate::api::types::{blocking, payload, ApiContext, ApiResponse, PageQuery, Paginated};
use crate::db;

pub async fn index(
    State(ctx): State<ApiContext>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Value>>, ApiError> {
    let conn = ctx.db()?;
    let page = db::list_users(&conn, query.request(PER_PAGE))?.map(|u| resources::user(&u));
    Ok(Paginated::from_page(page, uri.path()))
}

pub async fn show(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    let user = db::get_user(&conn, id)?.ok_or_else(|| ApiError::not_found("User"))?;
    Ok(ApiResponse::data(resources::user(&user)))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let data = payload(body)?;
    let user = blocking(move || {
        let mut conn = ctx.db()?;
        Ok(accounts::update_user_account(&mut conn, &ctx.core, id, &data)?)
    })
    .await?;
    Ok(ApiResponse::data(resources::user(&user)))
}

pub async fn destroy(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = path_id(id)?;
    let mut conn = ctx.db()?;
    accounts::delete_user_account(&mut conn, id)?;
    Ok(deleted("User"))
}
