//! Name + description catalogs.
//!
//! One generic handler set serves all four tables; the route picks the
//! table with a marker type, e.g. `get(catalogs::index::<Allergies>)`.
//!
//! `/api/specialties` (admin), `/api/allergies`, `/api/diseases`,
//! `/api/medications` (patient), `GET /api/specialties_public`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::Json;
use serde_json::Value;

use super::{created, deleted, path_id, CreatedResult, JsonResult, PER_PAGE, PUBLIC_PER_PAGE};
use crate::api::error::ApiError;
use crate::api::resources;
use crate::api::types::{payload, ApiContext, ApiResponse, PageQuery, Paginated};
use crate::db;
use crate::models::CatalogKind;
use crate::validation::{rules, Validator};

pub trait Catalog: Send + Sync + 'static {
    const KIND: CatalogKind;
}

pub struct Specialties;
pub struct Allergies;
pub struct Diseases;
pub struct Medications;

impl Catalog for Specialties {
    const KIND: CatalogKind = CatalogKind::Specialty;
}
impl Catalog for Allergies {
    const KIND: CatalogKind = CatalogKind::Allergy;
}
impl Catalog for Diseases {
    const KIND: CatalogKind = CatalogKind::Disease;
}
impl Catalog for Medications {
    const KIND: CatalogKind = CatalogKind::Medication;
}

fn listing(
    ctx: &ApiContext,
    kind: CatalogKind,
    path: &str,
    query: &PageQuery,
    per_page: u32,
) -> Result<Json<Paginated<Value>>, ApiError> {
    let conn = ctx.db()?;
    let page = db::list_catalog(&conn, kind, query.request(per_page))?
        .map(|entry| resources::catalog_entry(kind, &entry));
    Ok(Paginated::from_page(page, path))
}

pub async fn index<C: Catalog>(
    State(ctx): State<ApiContext>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Value>>, ApiError> {
    listing(&ctx, C::KIND, uri.path(), &query, PER_PAGE)
}

/// `GET /api/specialties_public`
pub async fn public_index(
    State(ctx): State<ApiContext>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Value>>, ApiError> {
    listing(&ctx, CatalogKind::Specialty, uri.path(), &query, PUBLIC_PER_PAGE)
}

pub async fn store<C: Catalog>(
    State(ctx): State<ApiContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> CreatedResult {
    let data = payload(body)?;
    let conn = ctx.db()?;

    let mut v = Validator::new(&data);
    let patch = rules::catalog_fields(&mut v, C::KIND);
    v.finish()?;

    let id = db::insert_catalog_entry(&conn, C::KIND, &rules::new_catalog_entry(C::KIND, patch)?)?;
    let entry = db::get_catalog_entry(&conn, C::KIND, id)?
        .ok_or_else(|| ApiError::not_found(C::KIND.label()))?;
    Ok(created(resources::catalog_entry(C::KIND, &entry)))
}

pub async fn show<C: Catalog>(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    let entry = db::get_catalog_entry(&conn, C::KIND, id)?
        .ok_or_else(|| ApiError::not_found(C::KIND.label()))?;
    Ok(ApiResponse::data(resources::catalog_entry(C::KIND, &entry)))
}

pub async fn update<C: Catalog>(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let data = payload(body)?;
    let conn = ctx.db()?;
    let mut entry = db::get_catalog_entry(&conn, C::KIND, id)?
        .ok_or_else(|| ApiError::not_found(C::KIND.label()))?;

    let mut v = Validator::partial(&data);
    let patch = rules::catalog_fields(&mut v, C::KIND);
    v.finish()?;

    patch.apply(&mut entry);
    db::update_catalog_entry(&conn, C::KIND, &entry)?;
    Ok(ApiResponse::data(resources::catalog_entry(C::KIND, &entry)))
}

pub async fn destroy<C: Catalog>(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    if !db::delete_catalog_entry(&conn, C::KIND, id)? {
        return Err(ApiError::not_found(C::KIND.label()));
    }
    Ok(deleted(C::KIND.label()))
}
