//! Tenant routes.
//!
//! Tenants are platform-operator territory: companies hang off a
//! tenant, so provisioning one is the first step of an onboarding.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use stagepay_domain::Tenant;

use crate::auth::{require_super_admin, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{checks, extract_validated_json, Validate};
use crate::state::AppState;

/// Build the tenant router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/tenants", post(create_tenant).get(list_tenants))
        .route("/v1/tenants/{id}", get(get_tenant))
}

/// Request to provision a tenant.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTenantRequest {
    pub name: String,
    /// Short code, unique among active tenants.
    pub code: String,
}

impl Validate for CreateTenantRequest {
    fn validate(&self) -> Result<(), String> {
        checks::non_blank(&self.name, "name")?;
        checks::non_blank(&self.code, "code")
    }
}

/// Tenant as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct TenantResponse {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl TenantResponse {
    fn from_record(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id.as_uuid(),
            name: tenant.name.clone(),
            code: tenant.code.clone(),
            active: tenant.lifecycle.is_active(),
            created_at: tenant.created_at,
        }
    }
}

/// POST /v1/tenants — Provision a tenant.
#[utoipa::path(
    post,
    path = "/v1/tenants",
    request_body = CreateTenantRequest,
    responses(
        (status = 201, description = "Tenant created", body = TenantResponse),
        (status = 403, description = "Super admin capability required"),
        (status = 409, description = "Tenant code already in use"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "tenants"
)]
pub async fn create_tenant(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateTenantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TenantResponse>), AppError> {
    require_super_admin(&caller)?;
    let req = extract_validated_json(body)?;

    let code = req.code.trim().to_string();
    if state
        .tenants
        .find(|t| t.code == code && t.lifecycle.is_active())
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "tenant code '{code}' already in use"
        )));
    }

    let tenant = Tenant::new(req.name.trim().to_string(), code, Utc::now());
    state.tenants.insert(tenant.id, tenant.clone());

    if let Some(pool) = &state.db_pool {
        crate::db::tenants::upsert(pool, &tenant)
            .await
            .map_err(|e| AppError::Internal(format!("failed to persist tenant: {e}")))?;
    }

    tracing::info!(tenant_id = %tenant.id, code = %tenant.code, "tenant created");
    Ok((StatusCode::CREATED, Json(TenantResponse::from_record(&tenant))))
}

/// GET /v1/tenants — List all tenants.
#[utoipa::path(
    get,
    path = "/v1/tenants",
    responses(
        (status = 200, description = "All tenants", body = [TenantResponse]),
        (status = 403, description = "Super admin capability required"),
    ),
    tag = "tenants"
)]
pub async fn list_tenants(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<TenantResponse>>, AppError> {
    require_super_admin(&caller)?;
    let mut tenants = state.tenants.list();
    tenants.sort_by_key(|t| t.created_at);
    Ok(Json(tenants.iter().map(TenantResponse::from_record).collect()))
}

/// GET /v1/tenants/{id} — Fetch one tenant.
#[utoipa::path(
    get,
    path = "/v1/tenants/{id}",
    params(("id" = Uuid, Path, description = "Tenant id")),
    responses(
        (status = 200, description = "The tenant", body = TenantResponse),
        (status = 404, description = "No such tenant"),
    ),
    tag = "tenants"
)]
pub async fn get_tenant(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<TenantResponse>, AppError> {
    require_super_admin(&caller)?;
    let tenant = state
        .tenants
        .get(&id.into())
        .ok_or_else(|| AppError::NotFound(format!("tenant {id} not found")))?;
    Ok(Json(TenantResponse::from_record(&tenant)))
}
