//! Request middleware.
//!
//! Execution order (outermost → innermost):
//! 1. Access log: request id, timing, status
//! 2. Auth: bearer token → `AuthContext` (protected groups only)
//! 3. Role gate: 403 unless the principal has the group's role

pub mod audit;
pub mod auth;
pub mod role;
