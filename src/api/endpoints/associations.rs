//! Join rows between the caller's profile and catalog or establishment
//! rows.
//!
//! The owner side is always the authenticated user: listings only show
//! the caller's links and another owner's link answers 404.
//!
//! Doctor group: `/api/doctors/specialty`, `/api/doctors/establishment`
//! Patient group: `/api/patient/allergies`, `/api/patient/diseases`,
//! `/api/patient/medications`

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
use crate::models::{Association, LinkKind};
use crate::validation::{rules, Validator};

pub trait Link: Send + Sync + 'static {
    const KIND: LinkKind;
}

pub struct DoctorSpecialties;
pub struct DoctorEstablishments;
pub struct PatientAllergies;
pub struct PatientDiseases;
pub struct PatientMedications;

impl Link for DoctorSpecialties {
    const KIND: LinkKind = LinkKind::DoctorSpecialty;
}
impl Link for DoctorEstablishments {
    const KIND: LinkKind = LinkKind::DoctorEstablishment;
}
impl Link for PatientAllergies {
    const KIND: LinkKind = LinkKind::AllergyPatient;
}
impl Link for PatientDiseases {
    const KIND: LinkKind = LinkKind::DiseasePatient;
}
impl Link for PatientMedications {
    const KIND: LinkKind = LinkKind::MedicationPatient;
}

/// The caller's link `id`, or 404 when missing or owned by someone else.
fn owned(
    conn: &Connection,
    kind: LinkKind,
    id: i64,
    principal: &AuthContext,
) -> Result<Association, ApiError> {
    db::get_association(conn, kind, id)?
        .filter(|link| link.owner_id == principal.user_id)
        .ok_or_else(|| ApiError::not_found(kind.label()))
}

pub async fn index<L: Link>(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Value>>, ApiError> {
    let conn = ctx.db()?;
    let page = db::list_associations(&conn, L::KIND, principal.user_id, query.request(PER_PAGE))?
        .map(|link| resources::association(L::KIND, &link));
    Ok(Paginated::from_page(page, uri.path()))
}

pub async fn store<L: Link>(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> CreatedResult {
    let data = payload(body)?;
    let conn = ctx.db()?;

    let mut v = Validator::new(&data);
    let patch = rules::association_fields(&mut v, &conn, L::KIND)?;
    v.finish()?;

    let target_id = rules::association_target(patch, L::KIND)?;
    let id = db::insert_association(&conn, L::KIND, principal.user_id, target_id)?;
    tracing::info!(
        link = L::KIND.label(),
        owner_id = principal.user_id,
        target_id,
        "Association created"
    );
    Ok(created(resources::association(
        L::KIND,
        &Association {
            id,
            owner_id: principal.user_id,
            target_id,
        },
    )))
}

pub async fn show<L: Link>(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
    id: Result<Path<i64>, PathRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    let link = owned(&conn, L::KIND, id, &principal)?;
    Ok(ApiResponse::data(resources::association(L::KIND, &link)))
}

pub async fn update<L: Link>(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> JsonResult {
    let id = path_id(id)?;
    let data = payload(body)?;
    let conn = ctx.db()?;
    let mut link = owned(&conn, L::KIND, id, &principal)?;

    let mut v = Validator::partial(&data);
    let patch = rules::association_fields(&mut v, &conn, L::KIND)?;
    v.finish()?;

    patch.apply(&mut link);
    db::update_association(&conn, L::KIND, &link)?;
    Ok(ApiResponse::data(resources::association(L::KIND, &link)))
}

pub async fn destroy<L: Link>(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<AuthContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = path_id(id)?;
    let conn = ctx.db()?;
    owned(&conn, L::KIND, id, &principal)?;
    db::delete_association(&conn, L::KIND, id)?;
    Ok(deleted(L::KIND.label()))
}
