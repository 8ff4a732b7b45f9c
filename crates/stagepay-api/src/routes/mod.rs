//! HTTP route modules.
//!
//! Each module exposes `pub fn router() -> Router<AppState>` with full
//! `/v1/...` paths; [`crate::app`] merges them behind the auth
//! middleware. `users` additionally exposes a public router for
//! registration, which must stay reachable without credentials.

pub mod companies;
pub mod configs;
pub mod members;
pub mod reviews;
pub mod tenants;
pub mod users;
