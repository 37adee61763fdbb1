//! Shared types for the HTTP layer.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::db::repository::{Page, PageRequest};
use crate::models::enums::Role;
use crate::validation::Payload;

// ═══════════════════════════════════════════════════════════
// API context: shared state for every route
// ═══════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }

    /// Per-request connection.
    pub fn db(&self) -> Result<rusqlite::Connection, ApiError> {
        Ok(self.core.open_db()?)
    }
}

// ═══════════════════════════════════════════════════════════
// Principal: injected by the auth middleware
// ═══════════════════════════════════════════════════════════

/// The authenticated caller. Handlers receive it explicitly through
/// `Extension<AuthContext>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: Option<Role>,
    pub token_id: i64,
}

// ═══════════════════════════════════════════════════════════
// Response envelopes
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data: None,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PageLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MetaLink {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub from: Option<i64>,
    pub last_page: u32,
    pub links: Vec<MetaLink>,
    pub path: String,
    pub per_page: u32,
    pub to: Option<i64>,
    pub total: i64,
}

/// Pages shown on each side of the current one in `meta.links`.
const ON_EACH_SIDE: u32 = 3;

/// Page numbers listed in `meta.links`; `None` is a "..." gap. Short
/// page ranges are listed whole, long ones are cut down to both ends
/// plus a slider around `current`.
fn page_window(current: u32, last: u32) -> Vec<Option<u32>> {
    let span = |from: u32, to: u32| (from..=to).map(Some);
    if last < ON_EACH_SIDE * 2 + 8 {
        return span(1, last).collect();
    }

    let window = ON_EACH_SIDE + 4;
    let mut pages = Vec::new();
    if current <= window {
        pages.extend(span(1, window + ON_EACH_SIDE));
        pages.push(None);
        pages.extend(span(last - 1, last));
    } else if current > last - window {
        pages.extend(span(1, 2));
        pages.push(None);
        pages.extend(span(last - (window + ON_EACH_SIDE - 1), last));
    } else {
        pages.extend(span(1, 2));
        pages.push(None);
        pages.extend(span(current - ON_EACH_SIDE, current + ON_EACH_SIDE));
        pages.push(None);
        pages.extend(span(last - 1, last));
    }
    pages
}

/// Paginated list envelope.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub links: PageLinks,
    pub meta: PageMeta,
}

impl<T: Serialize> Paginated<T> {
    /// `path` is the request path the page links point back to.
    pub fn from_page(page: Page<T>, path: &str) -> Json<Self> {
        let url = |n: u32| format!("{path}?page={n}");
        let current = page.current_page;
        let last = page.last_page();

        let window = page_window(current, last);
        let mut links = Vec::with_capacity(window.len() + 2);
        links.push(MetaLink {
            url: (current > 1).then(|| url(current - 1)),
            label: "&laquo; Previous".into(),
            active: false,
        });
        links.extend(window.into_iter().map(|slot| match slot {
            Some(n) => MetaLink {
                url: Some(url(n)),
                label: n.to_string(),
                active: n == current,
            },
            None => MetaLink {
                url: None,
                label: "...".into(),
                active: false,
            },
        }));
        links.push(MetaLink {
            url: (current < last).then(|| url(current + 1)),
            label: "Next &raquo;".into(),
            active: false,
        });

        let meta = PageMeta {
            current_page: current,
            from: page.from(),
            last_page: last,
            links,
            path: path.to_string(),
            per_page: page.per_page,
            to: page.to(),
            total: page.total,
        };
        Json(Self {
            success: true,
            links: PageLinks {
                first: url(1),
                last: url(last),
                prev: (current > 1).then(|| url(current - 1)),
                next: (current < last).then(|| url(current + 1)),
            },
            meta,
            data: page.items,
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Request helpers
// ═══════════════════════════════════════════════════════════

/// `?page=N`. Anything unparsable or below 1 means page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn request(&self, per_page: u32) -> PageRequest {
        let page = self
            .page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(1);
        PageRequest::new(page, per_page)
    }
}

/// Unwrap a JSON body into an object payload; malformed bodies are a 400.
pub fn payload(body: Result<Json<Value>, JsonRejection>) -> Result<Payload, ApiError> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(_)) => Err(ApiError::BadRequest(
            "Request body must be a JSON object".into(),
        )),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
}

/// Run CPU-heavy work (password hashing) off the async workers.
pub async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("Blocking task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(total: i64, page: u32, per_page: u32) -> Page<i64> {
        let req = PageRequest::new(page, per_page);
        let items: Vec<i64> = (req.offset()..total.min(req.offset() + req.limit())).collect();
        req.page_of(items, total)
    }

    #[test]
    fn page_query_defaults_to_first_page() {
        assert_eq!(PageQuery::default().request(5).page, 1);
        let bad = PageQuery {
            page: Some("abc".into()),
        };
        assert_eq!(bad.request(5).page, 1);
        let zero = PageQuery {
            page: Some("0".into()),
        };
        assert_eq!(zero.request(5).page, 1);
        let three = PageQuery {
            page: Some("3".into()),
        };
        assert_eq!(three.request(5).page, 3);
    }

    #[test]
    fn envelope_meta_matches_page() {
        let Json(body) = Paginated::from_page(page_of(12, 2, 5), "/api/appointments");
        assert_eq!(body.meta.total, 12);
        assert_eq!(body.meta.current_page, 2);
        assert_eq!(body.meta.last_page, 3);
        assert_eq!(body.meta.from, Some(6));
        assert_eq!(body.meta.to, Some(10));
        assert_eq!(body.data.len(), 5);
        assert_eq!(body.links.first, "/api/appointments?page=1");
        assert_eq!(body.links.prev.as_deref(), Some("/api/appointments?page=1"));
        assert_eq!(body.links.next.as_deref(), Some("/api/appointments?page=3"));
        // prev + 3 pages + next
        assert_eq!(body.meta.links.len(), 5);
        assert!(body.meta.links[2].active);
    }

    #[test]
    fn long_listings_get_a_link_window() {
        let Json(body) = Paginated::from_page(page_of(100_000, 5_000, 5), "/api/users");
        assert_eq!(body.meta.last_page, 20_000);
        let labels: Vec<&str> = body.meta.links.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "&laquo; Previous", "1", "2", "...", "4997", "4998", "4999", "5000", "5001",
                "5002", "5003", "...", "19999", "20000", "Next &raquo;",
            ]
        );
        assert!(body.meta.links[7].active);
        assert!(body.meta.links[3].url.is_none());
    }

    #[test]
    fn link_window_near_the_ends() {
        assert_eq!(page_window(2, 30).len(), 10 + 1 + 2);
        assert_eq!(page_window(2, 30)[0], Some(1));
        let tail = page_window(29, 30);
        assert_eq!(tail[..3], [Some(1), Some(2), None]);
        assert_eq!(tail.last(), Some(&Some(30)));
        assert_eq!(tail.len(), 2 + 1 + 10);
        assert_eq!(page_window(4, 13).len(), 13);
    }

    #[test]
    fn empty_page_has_null_bounds() {
        let Json(body) = Paginated::from_page(page_of(0, 1, 20), "/api/users");
        assert_eq!(body.meta.from, None);
        assert_eq!(body.meta.to, None);
        assert_eq!(body.meta.last_page, 1);
        assert!(body.links.next.is_none());
        assert!(body.links.prev.is_none());
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = payload(Ok(Json(serde_json::json!([1, 2])))).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
