//! # stagepay-api — Axum API Services for StagePay
//!
//! Multi-tenant company onboarding and payroll configuration. Companies
//! are assembled as drafts (profile, addresses, bank / payroll / union
//! configuration), submitted for review, and approved or rejected by a
//! platform super admin. Approval fans out asynchronously, flipping the
//! approved flag on the company and each of its configuration records.
//!
//! ## API Surface
//!
//! | Prefix                          | Module               | Domain            |
//! |---------------------------------|----------------------|-------------------|
//! | `/v1/tenants/*`                 | [`routes::tenants`]  | Tenant provisioning |
//! | `/v1/users`, `/v1/me`           | [`routes::users`]    | Registration and identity |
//! | `/v1/companies/*`               | [`routes::companies`]| Onboarding profiles |
//! | `/v1/companies/{id}/members`    | [`routes::members`]  | Company rosters |
//! | `/v1/companies/{id}/*-config`   | [`routes::configs`]  | Configuration sub-records |
//! | `/v1/companies/{id}/submit-for-review`, `/v1/reviews/*` | [`routes::reviews`] | Review workflow |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```
//!
//! `POST /v1/users` and the health probes are mounted outside the auth
//! middleware.
//!
//! ## OpenAPI
//!
//! Auto-generated spec via utoipa derive macros at `/openapi.json`.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) and registration stay outside the auth
/// middleware so a fresh deployment can be probed and seeded without
/// credentials.
pub fn app(state: AppState) -> Router {
    // Body size limit: 2 MiB. Onboarding payloads are small; anything
    // larger is a client bug or abuse.
    let api = Router::new()
        .merge(routes::tenants::router())
        .merge(routes::users::router())
        .merge(routes::companies::router())
        .merge(routes::members::router())
        .merge(routes::configs::router())
        .merge(routes::reviews::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(from_fn_with_state(state.clone(), auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .merge(routes::users::public_router())
        .with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// Liveness probe. Returns 200 whenever the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe.
///
/// Checks that the in-memory stores are accessible and, when a database
/// is configured, that it answers a trivial query. Returns 200 "ready"
/// or 503 with a diagnostic message.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    // Stores are accessible when a read lock is acquirable.
    let _ = state.companies.len();
    let _ = state.reviews.len();

    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}
