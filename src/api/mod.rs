//! REST API.
//!
//! Routes are nested under `/api/`. Public routes cover sign-up, login
//! and the public directories; everything else needs a bearer token and
//! the route group's role.
//!
//! `api_router()` returns a plain `Router`, so tests drive it directly
//! with `tower::ServiceExt::oneshot`.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod resources;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{serve_until_ctrl_c, start_server, ApiServer, ServerError};
pub use types::ApiContext;
