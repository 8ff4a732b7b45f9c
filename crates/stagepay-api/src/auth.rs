//! # Authentication & Authorization
//!
//! Bearer token middleware. Two token classes:
//!
//! - the bootstrap admin token from configuration, compared in constant
//!   time, resolving to the seeded platform-operator profile;
//! - registry tokens issued at user registration, resolving to stored
//!   profiles.
//!
//! Every authenticated request gets a [`CallerIdentity`] injected into
//! the request extensions. Handlers extract it via `FromRequestParts`
//! and pass it to the domain explicitly; authorization never consults
//! ambient globals.

use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use stagepay_core::{CompanyId, Role, UserId};

use crate::error::{AppError, ErrorBody, ErrorDetail};
use crate::state::AppState;

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller, resolved by the middleware and
/// available to all route handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: UserId,
    /// Rendered on review records ("reviewed by").
    pub full_name: String,
    /// `None` for a profile with neither the operator flag nor a
    /// company membership; such callers can only reach endpoints open
    /// to any authenticated user.
    pub role: Option<Role>,
}

impl CallerIdentity {
    pub fn is_super_admin(&self) -> bool {
        matches!(self.role, Some(Role::SuperAdmin))
    }

    /// Whether the caller can manage the given company.
    pub fn administers(&self, company_id: CompanyId) -> bool {
        self.role.map_or(false, |r| r.administers(company_id))
    }

    /// Whether the caller can read the given company.
    pub fn can_read(&self, company_id: CompanyId) -> bool {
        self.role.map_or(false, |r| r.can_read(company_id))
    }
}

impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ── Authorization helpers ───────────────────────────────────────────────────

/// 403 unless the caller is a super admin.
pub fn require_super_admin(caller: &CallerIdentity) -> Result<(), AppError> {
    if caller.is_super_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("super admin capability required".into()))
    }
}

/// 403 unless the caller manages the given company.
pub fn require_company_admin(
    caller: &CallerIdentity,
    company_id: CompanyId,
) -> Result<(), AppError> {
    if caller.administers(company_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "admin capability over company {company_id} required"
        )))
    }
}

/// 403 unless the caller can read the given company.
pub fn require_company_access(
    caller: &CallerIdentity,
    company_id: CompanyId,
) -> Result<(), AppError> {
    if caller.can_read(company_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "access to company {company_id} required"
        )))
    }
}

// ── Middleware ──────────────────────────────────────────────────────────────

/// Resolve the `Authorization: Bearer` header to a [`CallerIdentity`]
/// and inject it into the request extensions.
///
/// With no admin token configured, requests without credentials run as
/// the platform operator (development mode); registry tokens still
/// resolve normally.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let identity = match auth_header.as_deref() {
        Some(value) if value.starts_with("Bearer ") => {
            match resolve_token(&state, &value[7..]) {
                Ok(identity) => identity,
                Err(msg) => {
                    tracing::warn!(reason = %msg, "authentication failed");
                    return unauthorized_response(&msg);
                }
            }
        }
        Some(_) => {
            tracing::warn!("authentication failed: non-Bearer authorization scheme");
            return unauthorized_response("authorization header must use Bearer scheme");
        }
        None => {
            if state.config.admin_token.is_some() {
                tracing::warn!("authentication failed: missing authorization header");
                return unauthorized_response("missing authorization header");
            }
            // Auth disabled: everything runs as the operator.
            operator_identity(&state)
        }
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Resolve a presented bearer token against the admin token and the
/// user token registry.
fn resolve_token(state: &AppState, presented: &str) -> Result<CallerIdentity, String> {
    if let Some(admin_token) = &state.config.admin_token {
        if admin_token.matches(presented) {
            return Ok(operator_identity(state));
        }
    }

    let user_id = state
        .tokens
        .resolve(presented)
        .ok_or_else(|| "invalid bearer token".to_string())?;
    let profile = state
        .users
        .get(&user_id)
        .ok_or_else(|| "token resolves to an unknown user".to_string())?;
    if !profile.lifecycle.is_active() {
        return Err("token resolves to a discarded user".to_string());
    }
    Ok(CallerIdentity {
        user_id: profile.id,
        full_name: profile.full_name(),
        role: profile.role(),
    })
}

fn operator_identity(state: &AppState) -> CallerIdentity {
    let full_name = state
        .users
        .get(&state.operator_id)
        .map(|p| p.full_name())
        .unwrap_or_else(|| "Platform Operator".to_string());
    CallerIdentity {
        user_id: state.operator_id,
        full_name,
        role: Some(Role::SuperAdmin),
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
