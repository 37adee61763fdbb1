//! HTTP router.
//!
//! Routes are nested under `/api/` in four groups: public, doctor,
//! patient and admin. Each protected group carries its own
//! `require_auth` + role gate as route layers, so one path can serve
//! different methods to different roles (e.g. `GET /api/patients` for
//! doctors, `PUT /api/patients` for patients).
//!
//! Layers (outermost → innermost):
//! CORS → Extension(ApiContext) → access log → [auth → role] → handler

use std::sync::Arc;

use axum::middleware::from_fn;
use axum::routing::{get, post, put};
use axum::{Extension, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints::associations::{
    self, DoctorEstablishments, DoctorSpecialties, PatientAllergies, PatientDiseases,
    PatientMedications,
};
use crate::api::endpoints::catalogs::{self, Allergies, Diseases, Medications, Specialties};
use crate::api::endpoints::{
    appointments, auth, doctors, establishments, patients, schedules, summaries, users,
};
use crate::api::error::ApiError;
use crate::api::middleware::{audit, auth as auth_mw, role};
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

type ApiRouter = Router<ApiContext>;

/// Build the full API router.
///
/// Middleware reads `ApiContext` from the request extensions (the
/// `Extension` layer sits outside every route); handlers get it through
/// `State`.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);
    let federated = ctx.core.identity_provider().is_some();

    let api = public_routes(federated)
        .merge(doctor_routes())
        .merge(patient_routes())
        .merge(admin_routes())
        .with_state(ctx.clone());

    Router::new()
        .nest("/api", api)
        .fallback(|| async { ApiError::not_found("Route") })
        .layer(from_fn(audit::log_access))
        .layer(Extension(ctx))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

fn public_routes(federated: bool) -> ApiRouter {
    let router = Router::new()
        .route("/login", post(auth::login))
        .route("/users/register", post(auth::register_user))
        .route("/doctors/register", post(auth::register_doctor))
        .route("/patients/register", post(auth::register_patient))
        .route("/doctors_publics", get(doctors::public_index))
        .route("/specialties_public", get(catalogs::public_index));

    if !federated {
        return router;
    }
    router
        .route("/auth/google/redirect", get(auth::google_redirect))
        .route("/auth/google/callback", get(auth::google_callback))
}

/// `GET|POST /base` and `GET|PUT|DELETE /base/:id` for generic handlers.
macro_rules! resource {
    ($router:expr, $base:literal, $module:ident :: <$marker:ty>) => {
        $router
            .route(
                $base,
                get($module::index::<$marker>).post($module::store::<$marker>),
            )
            .route(
                concat!($base, "/:id"),
                get($module::show::<$marker>)
                    .put($module::update::<$marker>)
                    .delete($module::destroy::<$marker>),
            )
    };
    ($router:expr, $base:literal, $module:ident) => {
        $router
            .route($base, get($module::index).post($module::store))
            .route(
                concat!($base, "/:id"),
                get($module::show)
                    .put($module::update)
                    .delete($module::destroy),
            )
    };
}

fn doctor_routes() -> ApiRouter {
    let router = Router::new()
        .route("/doctor/info", get(doctors::info))
        .route("/doctors", put(doctors::update).delete(doctors::destroy))
        .route("/patients", get(patients::index))
        .route("/patients/:id", get(patients::show))
        .route(
            "/schedules",
            get(schedules::index).post(schedules::store),
        )
        // GET takes a doctor id, PUT/DELETE a schedule id.
        .route(
            "/schedules/:id",
            get(schedules::for_doctor)
                .put(schedules::update)
                .delete(schedules::destroy),
        )
        .route(
            "/addresses",
            get(establishments::address_index).post(establishments::address_store),
        )
        .route(
            "/addresses/:id",
            get(establishments::address_show)
                .put(establishments::address_update)
                .delete(establishments::address_destroy),
        )
        .route(
            "/medicines",
            get(summaries::medicine_index).post(summaries::medicine_store),
        )
        .route(
            "/medicines/:id",
            get(summaries::medicine_show)
                .put(summaries::medicine_update)
                .delete(summaries::medicine_destroy),
        );
    let router = resource!(router, "/appointments", appointments);
    let router = resource!(router, "/summaries", summaries);
    let router = resource!(router, "/establishments", establishments);
    let router = resource!(router, "/doctors/specialty", associations::<DoctorSpecialties>);
    let router = resource!(
        router,
        "/doctors/establishment",
        associations::<DoctorEstablishments>
    );

    router
        .route_layer(from_fn(role::doctor))
        .route_layer(from_fn(auth_mw::require_auth))
}

fn patient_routes() -> ApiRouter {
    let router = Router::new()
        .route("/patient/info", get(patients::info))
        .route(
            "/patients",
            put(patients::update).delete(patients::destroy),
        )
        .route("/doctors/:id", get(doctors::show));
    let router = resource!(router, "/allergies", catalogs::<Allergies>);
    let router = resource!(router, "/diseases", catalogs::<Diseases>);
    let router = resource!(router, "/medications", catalogs::<Medications>);
    let router = resource!(router, "/patient/allergies", associations::<PatientAllergies>);
    let router = resource!(router, "/patient/diseases", associations::<PatientDiseases>);
    let router = resource!(
        router,
        "/patient/medications",
        associations::<PatientMedications>
    );

    router
        .route_layer(from_fn(role::patient))
        .route_layer(from_fn(auth_mw::require_auth))
}

fn admin_routes() -> ApiRouter {
    let router = Router::new().route("/users", get(users::index)).route(
        "/users/:id",
        get(users::show).put(users::update).delete(users::destroy),
    );
    let router = resource!(router, "/specialties", catalogs::<Specialties>);

    router
        .route_layer(from_fn(role::admin))
        .route_layer(from_fn(auth_mw::require_auth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, Response, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::accounts;
    use crate::config::AdminSeed;
    use crate::crypto;
    use crate::db;
    use crate::federated::testing::{identity, StaticProvider};
    use crate::federated::ExternalIdentity;

    const ROUNDS: u32 = 1_000;

    /// File-backed state: every request opens its own connection.
    fn test_core() -> (Arc<CoreState>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let core = CoreState::new(tmp.path().join("medappoint.db"), ROUNDS);
        (Arc::new(core), tmp)
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(
        core: &Arc<CoreState>,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let app = api_router(core.clone());
        let response: Response<Body> = app
            .oneshot(request(method, uri, token, body))
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn docmario() -> Value {
        json!({
            "name": "Mario",
            "last_name": "Bros",
            "email": "docmario@example.com",
            "password": "password123",
            "phone": "5551234567",
            "sex": "male",
            "age": 40,
            "date_of_birth": "1985-06-15",
            "professional_license": "SITBVP9VMOAO",
            "education": "UNAM",
            "consultation_cost": 650,
        })
    }

    fn luigi() -> Value {
        json!({
            "name": "Luigi",
            "last_name": "Bros",
            "email": "luigi@example.com",
            "password": "password123",
            "phone": "5557654321",
            "sex": "male",
            "age": 38,
            "date_of_birth": "1987-09-01",
            "weight": 72.5,
            "height": 1.80,
            "nss": "12345678901",
            "blood_type": "A+",
        })
    }

    async fn register_doctor(core: &Arc<CoreState>) -> (i64, String) {
        let (status, body) = send(core, "POST", "/api/doctors/register", None, Some(docmario())).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["data"]["user_id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    async fn register_patient(core: &Arc<CoreState>) -> (i64, String) {
        let (status, body) = send(core, "POST", "/api/patients/register", None, Some(luigi())).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["data"]["user_id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    fn counts(core: &Arc<CoreState>) -> (i64, i64, i64) {
        let conn = core.open_db().unwrap();
        (
            db::count_rows(&conn, "users").unwrap(),
            db::count_rows(&conn, "doctors").unwrap(),
            db::count_rows(&conn, "schedules").unwrap(),
        )
    }

    #[tokio::test]
    async fn doctor_registration_returns_profile_week_and_token() {
        let (core, _tmp) = test_core();
        let (status, body) =
            send(&core, "POST", "/api/doctors/register", None, Some(docmario())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["professional_license"], "SITBVP9VMOAO");
        assert_eq!(body["data"]["personal_information"]["role"], "doctor");
        assert!(body["data"]["personal_information"].get("password").is_none());
        assert_eq!(body["data"]["schedules"].as_array().unwrap().len(), 7);
        assert!(!body["token"].as_str().unwrap().is_empty());
        assert_eq!(counts(&core), (1, 1, 7));
    }

    #[tokio::test]
    async fn duplicate_doctor_registration_is_rejected_without_writes() {
        let (core, _tmp) = test_core();
        register_doctor(&core).await;

        let (status, body) =
            send(&core, "POST", "/api/doctors/register", None, Some(docmario())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["errors"]["email"].is_array());
        assert!(body["errors"]["professional_license"].is_array());
        assert_eq!(counts(&core), (1, 1, 7));
    }

    #[tokio::test]
    async fn missing_token_is_401() {
        let (core, _tmp) = test_core();
        let (status, body) = send(&core, "GET", "/api/appointments", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn unknown_token_is_401() {
        let (core, _tmp) = test_core();
        let (status, _) = send(&core, "GET", "/api/doctor/info", Some("nope"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_401_and_revoked() {
        let (core, _tmp) = test_core();
        let (_, token) = register_doctor(&core).await;
        {
            let conn = core.open_db().unwrap();
            conn.execute(
                "UPDATE access_tokens SET expires_at = '2000-01-01 00:00:00'",
                [],
            )
            .unwrap();
        }
        let (status, _) = send(&core, "GET", "/api/doctor/info", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let conn = core.open_db().unwrap();
        assert_eq!(db::count_rows(&conn, "access_tokens").unwrap(), 0);
    }

    #[tokio::test]
    async fn wrong_role_is_403() {
        let (core, _tmp) = test_core();
        let (_, patient_token) = register_patient(&core).await;
        let (status, body) =
            send(&core, "GET", "/api/appointments", Some(&patient_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn login_issues_working_token() {
        let (core, _tmp) = test_core();
        register_doctor(&core).await;

        let (status, body) = send(
            &core,
            "POST",
            "/api/login",
            None,
            Some(json!({"email": "DocMario@example.com", "password": "password123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "docmario@example.com");
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = send(&core, "GET", "/api/doctor/info", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["professional_license"], "SITBVP9VMOAO");
    }

    #[tokio::test]
    async fn wrong_password_is_401() {
        let (core, _tmp) = test_core();
        register_doctor(&core).await;
        let (status, body) = send(
            &core,
            "POST",
            "/api/login",
            None,
            Some(json!({"email": "docmario@example.com", "password": "wrong-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn appointment_lifecycle() {
        let (core, _tmp) = test_core();
        let (doctor_id, token) = register_doctor(&core).await;
        let (patient_id, _) = register_patient(&core).await;

        let (status, body) = send(
            &core,
            "POST",
            "/api/appointments",
            Some(&token),
            Some(json!({
                "doctor_id": doctor_id,
                "patient_id": patient_id,
                "appointment_datetime": "2026-03-02 10:30:00",
                "status": "scheduled",
                "reason": "Checkup",
                "consultation_cost": 650,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let id = body["data"]["id"].as_i64().unwrap();
        assert_eq!(body["data"]["appointment_datetime"], "2026-03-02 10:30:00");
        assert_eq!(body["data"]["doctor"]["user_id"], doctor_id);
        assert!(body["data"]["summary"].is_null());

        let (status, body) = send(
            &core,
            "PUT",
            &format!("/api/appointments/{id}"),
            Some(&token),
            Some(json!({"status": "completed", "reason": null})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "completed");
        assert_eq!(body["data"]["reason"], "Checkup");

        let (status, _) = send(
            &core,
            "DELETE",
            &format!("/api/appointments/{id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &core,
            "GET",
            &format!("/api/appointments/{id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Appointment not found");
    }

    #[tokio::test]
    async fn deleting_missing_row_is_404_and_changes_nothing() {
        let (core, _tmp) = test_core();
        let (_, token) = register_doctor(&core).await;
        let (status, body) =
            send(&core, "DELETE", "/api/schedules/999", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(counts(&core), (1, 1, 7));
    }

    #[tokio::test]
    async fn non_numeric_id_is_400() {
        let (core, _tmp) = test_core();
        let (_, token) = register_doctor(&core).await;
        let (status, _) = send(&core, "GET", "/api/appointments/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn schedule_listing_is_paginated() {
        let (core, _tmp) = test_core();
        let (_, token) = register_doctor(&core).await;

        let (status, body) =
            send(&core, "GET", "/api/schedules?page=2", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["total"], 7);
        assert_eq!(body["meta"]["per_page"], 5);
        assert_eq!(body["meta"]["current_page"], 2);
        assert_eq!(body["meta"]["last_page"], 2);
        assert_eq!(body["meta"]["from"], 6);
        assert_eq!(body["meta"]["to"], 7);
        assert_eq!(body["meta"]["path"], "/api/schedules");
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["links"]["prev"], "/api/schedules?page=1");
        assert!(body["links"]["next"].is_null());
    }

    #[tokio::test]
    async fn doctor_schedule_endpoint_lists_whole_week() {
        let (core, _tmp) = test_core();
        let (doctor_id, token) = register_doctor(&core).await;
        let (status, body) = send(
            &core,
            "GET",
            &format!("/api/schedules/{doctor_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn schedule_end_must_follow_start() {
        let (core, _tmp) = test_core();
        let (_, token) = register_doctor(&core).await;
        let (status, body) = send(
            &core,
            "POST",
            "/api/schedules",
            Some(&token),
            Some(json!({"start_time": "10:00", "end_time": "09:00", "day_of_week": "monday"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["end_time"].is_array());
    }

    #[tokio::test]
    async fn public_directory_needs_no_token_and_hides_contacts() {
        let (core, _tmp) = test_core();
        register_doctor(&core).await;
        let (status, body) = send(&core, "GET", "/api/doctors_publics", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["per_page"], 20);
        let info = &body["data"][0]["personal_information"];
        assert_eq!(info["name"], "Mario");
        assert!(info.get("email").is_none());
    }

    #[tokio::test]
    async fn patient_sees_doctor_but_not_patients() {
        let (core, _tmp) = test_core();
        let (doctor_id, _) = register_doctor(&core).await;
        let (_, token) = register_patient(&core).await;

        let (status, body) = send(
            &core,
            "GET",
            &format!("/api/doctors/{doctor_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user_id"], doctor_id);

        let (status, _) = send(&core, "GET", "/api/patients", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn associations_are_owner_scoped() {
        let (core, _tmp) = test_core();
        let (_, token) = register_patient(&core).await;

        let (status, body) = send(
            &core,
            "POST",
            "/api/allergies",
            Some(&token),
            Some(json!({"allergy_name": "Penicillin"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let allergy_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &core,
            "POST",
            "/api/patient/allergies",
            Some(&token),
            Some(json!({"allergy_id": allergy_id})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let link_id = body["data"]["id"].as_i64().unwrap();

        let (_, info) = send(&core, "GET", "/api/patient/info", Some(&token), None).await;
        assert_eq!(info["data"]["allergies"][0]["allergy_name"], "Penicillin");

        // A second patient cannot see or delete the first one's link.
        let mut other = luigi();
        other["email"] = json!("mario.jr@example.com");
        other["nss"] = json!("99999999999");
        let (_, body) = send(&core, "POST", "/api/patients/register", None, Some(other)).await;
        let other_token = body["token"].as_str().unwrap().to_string();

        let uri = format!("/api/patient/allergies/{link_id}");
        let (status, _) = send(&core, "GET", &uri, Some(&other_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&core, "DELETE", &uri, Some(&other_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&core, "GET", "/api/patient/allergies", Some(&other_token), None).await;
        assert_eq!(body["meta"]["total"], 0);
    }

    #[tokio::test]
    async fn profile_delete_removes_account() {
        let (core, _tmp) = test_core();
        let (_, token) = register_doctor(&core).await;
        let (status, _) = send(&core, "DELETE", "/api/doctors", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(counts(&core), (0, 0, 0));

        // The token went with the user.
        let (status, _) = send(&core, "GET", "/api/doctor/info", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn google_routes_absent_without_provider() {
        let (core, _tmp) = test_core();
        let (status, body) = send(&core, "GET", "/api/auth/google/redirect", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let response = app
            .oneshot(request("GET", "/api/specialties_public", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("X-Request-Id"));
    }

    // ── Ownership ───────────────────────────────────────────

    fn wario() -> Value {
        let mut doctor = docmario();
        doctor["name"] = json!("Wario");
        doctor["email"] = json!("wario@example.com");
        doctor["professional_license"] = json!("WARIO0000001");
        doctor
    }

    #[tokio::test]
    async fn doctors_cannot_touch_each_others_schedules() {
        let (core, _tmp) = test_core();
        let (mario_id, mario_token) = register_doctor(&core).await;
        let (status, body) =
            send(&core, "POST", "/api/doctors/register", None, Some(wario())).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let wario_token = body["token"].as_str().unwrap().to_string();

        let week = format!("/api/schedules/{mario_id}");
        let (_, body) = send(&core, "GET", &week, Some(&wario_token), None).await;
        let slot = body["data"][0]["id"].as_i64().unwrap();
        let slot_uri = format!("/api/schedules/{slot}");

        let (status, _) = send(
            &core,
            "PUT",
            &slot_uri,
            Some(&wario_token),
            Some(json!({"start_time": "01:00", "end_time": "02:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&core, "DELETE", &slot_uri, Some(&wario_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&core, "GET", &week, Some(&mario_token), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 7);
        assert!(body["data"][0]["start_time"].is_null());

        let (status, body) = send(
            &core,
            "PUT",
            &slot_uri,
            Some(&mario_token),
            Some(json!({"start_time": "09:00", "end_time": "13:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["start_time"], "09:00");
        let (status, _) = send(&core, "DELETE", &slot_uri, Some(&mario_token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    // ── Admin ───────────────────────────────────────────────

    async fn admin_token(core: &Arc<CoreState>) -> String {
        {
            let conn = core.open_db().unwrap();
            let seed = AdminSeed {
                email: "root@example.com".into(),
                password: "rootpass123".into(),
            };
            accounts::bootstrap_admin(&conn, core, &seed).unwrap();
        }
        let (status, body) = send(
            core,
            "POST",
            "/api/login",
            None,
            Some(json!({"email": "root@example.com", "password": "rootpass123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn admin_manages_users() {
        let (core, _tmp) = test_core();
        let (mario_id, doctor_token) = register_doctor(&core).await;
        let admin = admin_token(&core).await;

        let (status, body) = send(&core, "GET", "/api/users", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["total"], 2);
        let (status, _) = send(&core, "GET", "/api/users", Some(&doctor_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let user_uri = format!("/api/users/{mario_id}");
        let (status, body) = send(
            &core,
            "PUT",
            &user_uri,
            Some(&admin),
            Some(json!({"phone": "5550009999"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["phone"], "5550009999");
        assert_eq!(body["data"]["email"], "docmario@example.com");

        let (status, _) = send(&core, "DELETE", "/api/users/999", Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(counts(&core), (2, 1, 7));

        let (status, _) = send(&core, "DELETE", &user_uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(counts(&core), (1, 0, 0));
    }

    #[tokio::test]
    async fn specialties_are_admin_managed_and_publicly_listed() {
        let (core, _tmp) = test_core();
        let (_, doctor_token) = register_doctor(&core).await;
        let admin = admin_token(&core).await;
        let specialty = json!({"specialty_name": "Cardiology", "description": "Heart"});

        let (status, _) = send(
            &core,
            "POST",
            "/api/specialties",
            Some(&doctor_token),
            Some(specialty.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) =
            send(&core, "POST", "/api/specialties", Some(&admin), Some(specialty)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["specialty_name"], "Cardiology");

        let (status, body) = send(&core, "GET", "/api/specialties_public", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["per_page"], 20);
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["specialty_name"], "Cardiology");
        assert_eq!(body["data"][0]["description"], "Heart");

        let (status, _) =
            send(&core, "DELETE", "/api/specialties/999", Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let conn = core.open_db().unwrap();
        assert_eq!(db::count_rows(&conn, "specialties").unwrap(), 1);
    }

    // ── Clinical records ────────────────────────────────────

    #[tokio::test]
    async fn summaries_carry_their_medicines() {
        let (core, _tmp) = test_core();
        let (doctor_id, token) = register_doctor(&core).await;
        let (patient_id, _) = register_patient(&core).await;
        let (_, body) = send(
            &core,
            "POST",
            "/api/appointments",
            Some(&token),
            Some(json!({
                "doctor_id": doctor_id,
                "patient_id": patient_id,
                "appointment_datetime": "2026-03-02 10:30:00",
                "status": "completed",
                "reason": "Fever",
                "consultation_cost": 650,
            })),
        )
        .await;
        let appointment_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &core,
            "POST",
            "/api/summaries",
            Some(&token),
            Some(json!({"appointment_id": appointment_id, "diagnosis": "Flu"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["medicines"], json!([]));
        let summary_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &core,
            "POST",
            "/api/medicines",
            Some(&token),
            Some(json!({
                "summary_id": summary_id,
                "medicine_name": "Paracetamol",
                "dosage": "500mg",
                "frequency": "every 8 hours",
                "duration": "5 days",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let medicine_id = body["data"]["id"].as_i64().unwrap();

        let (_, body) = send(
            &core,
            "GET",
            &format!("/api/appointments/{appointment_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(body["data"]["summary"]["diagnosis"], "Flu");
        assert_eq!(
            body["data"]["summary"]["medicines"][0]["medicine_name"],
            "Paracetamol"
        );

        let (status, body) = send(
            &core,
            "PUT",
            &format!("/api/medicines/{medicine_id}"),
            Some(&token),
            Some(json!({"dosage": "1g"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["dosage"], "1g");
        assert_eq!(body["data"]["frequency"], "every 8 hours");

        let medicines = |core: &Arc<CoreState>| {
            let conn = core.open_db().unwrap();
            db::count_rows(&conn, "medicines").unwrap()
        };
        let (status, _) = send(&core, "DELETE", "/api/medicines/999", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(medicines(&core), 1);

        let summary_uri = format!("/api/summaries/{summary_id}");
        let (status, _) = send(&core, "DELETE", &summary_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(medicines(&core), 0);
        let (status, body) = send(&core, "GET", &summary_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Summary not found");
    }

    #[tokio::test]
    async fn establishments_embed_their_address() {
        let (core, _tmp) = test_core();
        let (_, token) = register_doctor(&core).await;

        let (status, body) = send(
            &core,
            "POST",
            "/api/addresses",
            Some(&token),
            Some(json!({
                "street": "Av. Reforma",
                "exterior_number": "222",
                "neighborhood": "Juarez",
                "zip_code": "06600",
                "city": "CDMX",
                "country": "Mexico",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let address_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &core,
            "POST",
            "/api/establishments",
            Some(&token),
            Some(json!({
                "establishment_name": "Clinica Roma",
                "establishment_type": "Clinic",
                "website_url": "https://clinica.example.com",
                "address_id": address_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["address"]["city"], "CDMX");
        let establishment_uri = format!("/api/establishments/{}", body["data"]["id"]);

        let (status, _) =
            send(&core, "DELETE", "/api/establishments/999", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        {
            let conn = core.open_db().unwrap();
            assert_eq!(db::count_rows(&conn, "establishments").unwrap(), 1);
        }

        let (status, _) = send(
            &core,
            "DELETE",
            &format!("/api/addresses/{address_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&core, "GET", &establishment_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["address_id"].is_null());
        assert!(body["data"]["address"].is_null());
    }

    // ── Accounts ────────────────────────────────────────────

    #[tokio::test]
    async fn plain_registration_returns_no_token() {
        let (core, _tmp) = test_core();
        let mut user = luigi();
        user["email"] = json!("peach@example.com");
        let (status, body) = send(&core, "POST", "/api/users/register", None, Some(user)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert!(body.get("token").is_none());
        assert!(body["data"]["role"].is_null());
        assert_eq!(counts(&core), (1, 0, 0));
        let conn = core.open_db().unwrap();
        assert_eq!(db::count_rows(&conn, "access_tokens").unwrap(), 0);
    }

    #[tokio::test]
    async fn patient_updates_and_deletes_own_profile() {
        let (core, _tmp) = test_core();
        let (_, token) = register_patient(&core).await;

        let (status, body) = send(
            &core,
            "PUT",
            "/api/patients",
            Some(&token),
            Some(json!({"weight": 70.5, "occupation": "Plumber"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["weight"], 70.5);
        assert_eq!(body["data"]["occupation"], "Plumber");
        assert_eq!(body["data"]["nss"], "12345678901");
        assert_eq!(body["data"]["personal_information"]["name"], "Luigi");

        let (status, _) = send(&core, "DELETE", "/api/patients", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let conn = core.open_db().unwrap();
        assert_eq!(db::count_rows(&conn, "users").unwrap(), 0);
        assert_eq!(db::count_rows(&conn, "patients").unwrap(), 0);
        let (status, _) = send(&core, "GET", "/api/patient/info", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // ── Federated sign-in ───────────────────────────────────

    const FRONTEND: &str = "https://app.example.com";

    fn federated_core(identity: ExternalIdentity) -> (Arc<CoreState>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let provider = StaticProvider {
            code: "good-code".into(),
            identity,
        };
        let mut core = CoreState::new(tmp.path().join("medappoint.db"), ROUNDS)
            .with_identity_provider(Arc::new(provider));
        core.frontend_url = format!("{FRONTEND}/");
        (Arc::new(core), tmp)
    }

    async fn send_raw(core: &Arc<CoreState>, request: Request<Body>) -> Response<Body> {
        api_router(core.clone()).oneshot(request).await.unwrap()
    }

    fn header(response: &Response<Body>, name: &str) -> String {
        response.headers()[name].to_str().unwrap().to_string()
    }

    /// Hit the redirect endpoint; returns the issued state and the cookie
    /// pair a browser would send back.
    async fn begin_google_sign_in(core: &Arc<CoreState>) -> (String, String) {
        let response = send_raw(core, request("GET", "/api/auth/google/redirect", None, None)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let set_cookie = header(&response, "set-cookie");
        assert!(set_cookie.contains("HttpOnly"));
        let pair = set_cookie.split(';').next().unwrap().to_string();
        let state = pair.split_once('=').unwrap().1.to_string();
        assert!(!state.is_empty());
        assert!(header(&response, "location").contains(&format!("state={state}")));
        (state, pair)
    }

    fn callback(query: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("GET")
            .uri(format!("/api/auth/google/callback?{query}"));
        if let Some(cookie) = cookie {
            builder = builder.header("Cookie", cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn status_and_json(response: Response<Body>) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn google_sign_in_hands_token_to_frontend() {
        let (core, _tmp) = federated_core(identity("g-100", "grace@example.com"));
        let (state, cookie) = begin_google_sign_in(&core).await;

        let response = send_raw(
            &core,
            callback(&format!("code=good-code&state={state}"), Some(&cookie)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(header(&response, "set-cookie").contains("Max-Age=0"));
        let location = header(&response, "location");
        let token = location
            .strip_prefix(&format!("{FRONTEND}/#"))
            .unwrap()
            .to_string();

        let conn = core.open_db().unwrap();
        let record = db::find_access_token(&conn, &crypto::hash_token(&token))
            .unwrap()
            .unwrap();
        let user = db::get_user(&conn, record.user_id).unwrap().unwrap();
        assert_eq!(user.email, "grace@example.com");
        assert_eq!(user.external_id.as_deref(), Some("g-100"));
        assert_eq!(user.role, None);
    }

    #[tokio::test]
    async fn google_callback_requires_matching_state() {
        let (core, _tmp) = federated_core(identity("g-101", "grace@example.com"));
        let (state, cookie) = begin_google_sign_in(&core).await;

        let no_cookie = callback(&format!("code=good-code&state={state}"), None);
        let (status, body) = status_and_json(send_raw(&core, no_cookie).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let no_state = callback("code=good-code", Some(&cookie));
        assert_eq!(send_raw(&core, no_state).await.status(), StatusCode::BAD_REQUEST);

        let forged = callback("code=good-code&state=forged", Some(&cookie));
        assert_eq!(send_raw(&core, forged).await.status(), StatusCode::BAD_REQUEST);

        assert_eq!(counts(&core), (0, 0, 0));
    }

    #[tokio::test]
    async fn google_sign_in_cannot_claim_existing_account() {
        let (core, _tmp) = federated_core(identity("attacker-sub", "docmario@example.com"));
        let (doctor_id, _) = register_doctor(&core).await;
        let (state, cookie) = begin_google_sign_in(&core).await;

        let response = send_raw(
            &core,
            callback(&format!("code=good-code&state={state}"), Some(&cookie)),
        )
        .await;
        let (status, body) = status_and_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let conn = core.open_db().unwrap();
        assert_eq!(db::count_rows(&conn, "access_tokens").unwrap(), 1);
        let doctor = db::get_user(&conn, doctor_id).unwrap().unwrap();
        assert_eq!(doctor.external_id, None);
    }

    #[tokio::test]
    async fn google_callback_reports_provider_errors() {
        let (core, _tmp) = federated_core(identity("g-102", "grace@example.com"));
        let (state, cookie) = begin_google_sign_in(&core).await;

        let cancelled = callback("error=access_denied", Some(&cookie));
        assert_eq!(send_raw(&core, cancelled).await.status(), StatusCode::UNAUTHORIZED);

        let missing_code = callback(&format!("state={state}"), Some(&cookie));
        let (status, body) = status_and_json(send_raw(&core, missing_code).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing authorization code");

        let bad_code = callback(&format!("code=stale&state={state}"), Some(&cookie));
        assert_eq!(send_raw(&core, bad_code).await.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(counts(&core), (0, 0, 0));
    }
}
