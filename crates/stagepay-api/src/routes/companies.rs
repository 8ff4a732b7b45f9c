//! Company routes: creation, core-field updates, address history.
//!
//! The creator becomes the company's owner and, for a plain profile,
//! its admin member. Ownership counts as admin capability so a company
//! is never orphaned by a membership edit.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use stagepay_core::CompanyId;
use stagepay_domain::{
    Address, AddressKind, Company, CompanyMembership, Country, MemberRole, SignaturePolicy,
};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{checks, extract_validated_json, Validate};
use crate::state::AppState;

/// Build the company router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/companies", post(create_company).get(list_companies))
        .route("/v1/companies/{id}", get(get_company))
        .route("/v1/companies/{id}", patch(update_company))
        .route(
            "/v1/companies/{id}/addresses",
            post(add_address).get(list_addresses),
        )
}

// ── Access helpers ──────────────────────────────────────────────────────────

/// 403 unless the caller administers the company or owns it.
pub(crate) fn ensure_manage(caller: &CallerIdentity, company: &Company) -> Result<(), AppError> {
    if caller.administers(company.id) || caller.user_id == company.owned_by {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "admin capability over company {} required",
            company.id
        )))
    }
}

/// 403 unless the caller can read the company (member or owner).
pub(crate) fn ensure_read(caller: &CallerIdentity, company: &Company) -> Result<(), AppError> {
    if caller.can_read(company.id) || caller.user_id == company.owned_by {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "access to company {} required",
            company.id
        )))
    }
}

pub(crate) fn fetch_company(state: &AppState, id: CompanyId) -> Result<Company, AppError> {
    state
        .companies
        .get(&id)
        .filter(|c| c.lifecycle.is_active())
        .ok_or_else(|| AppError::NotFound(format!("company {id} not found")))
}

pub(crate) async fn persist_company(state: &AppState, company: &Company) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        crate::db::companies::upsert(pool, company)
            .await
            .map_err(|e| AppError::Internal(format!("failed to persist company: {e}")))?;
    }
    Ok(())
}

// ── DTOs ────────────────────────────────────────────────────────────────────

/// Request to create a company under a tenant.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCompanyRequest {
    pub tenant_id: Uuid,
    pub name: String,
    /// Globally unique short code.
    pub code: String,
    /// Defaults to `single`.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub signature_policy: Option<SignaturePolicy>,
}

impl Validate for CreateCompanyRequest {
    fn validate(&self) -> Result<(), String> {
        checks::non_blank(&self.name, "name")?;
        checks::non_blank(&self.code, "code")
    }
}

/// Partial update of a company's core fields. Absent fields are left
/// untouched; the company code is immutable after creation.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCompanyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fein: Option<String>,
    #[serde(default)]
    pub company_type: Option<String>,
    #[serde(default)]
    pub nys_no: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub signature_policy: Option<SignaturePolicy>,
    /// Signed asset reference recorded after an upload completes.
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub secondary_signature: Option<String>,
}

impl Validate for UpdateCompanyRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            checks::non_blank(name, "name")?;
        }
        if let Some(phone) = &self.phone {
            checks::phone(phone)?;
        }
        if let Some(email) = &self.email {
            checks::email(email)?;
        }
        Ok(())
    }
}

/// Request to record a new address slice.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddressRequest {
    /// `primary`, `billing`, or `shipping`.
    #[schema(value_type = String)]
    pub kind: AddressKind,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    /// `US` or `CA`.
    #[schema(value_type = String)]
    pub country: Country,
}

impl Validate for AddressRequest {
    fn validate(&self) -> Result<(), String> {
        checks::non_blank(&self.line1, "line1")?;
        checks::non_blank(&self.city, "city")?;
        checks::non_blank(&self.region, "region")?;
        checks::non_blank(&self.postal_code, "postal_code")
    }
}

/// Company as returned by the API. Sub-records are embedded documents.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub owned_by: Uuid,
    pub name: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fein: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nys_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[schema(value_type = String)]
    pub signature_policy: SignaturePolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_signature: Option<String>,
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    pub suspended: bool,
    #[schema(value_type = Vec<Object>)]
    pub addresses: Vec<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub bank_config: Option<stagepay_domain::BankConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub payroll_config: Option<stagepay_domain::PayrollConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub union_config: Option<stagepay_domain::UnionConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyResponse {
    pub(crate) fn from_record(company: &Company) -> Self {
        Self {
            id: company.id.as_uuid(),
            tenant_id: company.tenant_id.as_uuid(),
            owned_by: company.owned_by.as_uuid(),
            name: company.name.clone(),
            code: company.code.clone(),
            fein: company.fein.clone(),
            company_type: company.company_type.clone(),
            nys_no: company.nys_no.clone(),
            phone: company.phone.clone(),
            email: company.email.clone(),
            signature_policy: company.signature_policy,
            signature: company.signature.clone(),
            secondary_signature: company.secondary_signature.clone(),
            approved: company.approved,
            approved_at: company.approved_at,
            suspended: company.suspended,
            addresses: company.addresses.clone(),
            bank_config: company.bank_config.clone(),
            payroll_config: company.payroll_config.clone(),
            union_config: company.union_config.clone(),
            created_at: company.created_at,
            updated_at: company.updated_at,
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// POST /v1/companies — Create a company. The caller becomes its owner.
#[utoipa::path(
    post,
    path = "/v1/companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 404, description = "No such tenant"),
        (status = 409, description = "Company code already in use"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "companies"
)]
pub async fn create_company(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateCompanyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CompanyResponse>), AppError> {
    let req = extract_validated_json(body)?;

    let tenant_id = req.tenant_id.into();
    let tenant = state
        .tenants
        .get(&tenant_id)
        .filter(|t| t.lifecycle.is_active())
        .ok_or_else(|| AppError::NotFound(format!("tenant {} not found", req.tenant_id)))?;

    let code = req.code.trim().to_string();
    if state
        .companies
        .find(|c| c.code == code && c.lifecycle.is_active())
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "company code '{code}' already in use"
        )));
    }

    let now = Utc::now();
    let mut company = Company::new(
        tenant.id,
        caller.user_id,
        req.name.trim().to_string(),
        code,
        now,
    );
    if let Some(policy) = req.signature_policy {
        company.signature_policy = policy;
    }
    state.companies.insert(company.id, company.clone());

    // A plain profile that creates a company becomes its admin member.
    // Super admins already administer everything.
    let membership_update = state.users.update(&caller.user_id, |profile| {
        if !profile.super_admin && profile.membership.is_none() {
            profile.membership = Some(CompanyMembership {
                company_id: company.id,
                role: MemberRole::Admin,
            });
        }
    });

    persist_company(&state, &company).await?;
    if let (Some(pool), Some(profile)) = (&state.db_pool, membership_update) {
        crate::db::users::upsert(pool, &profile)
            .await
            .map_err(|e| AppError::Internal(format!("failed to persist membership: {e}")))?;
    }

    tracing::info!(company_id = %company.id, code = %company.code, "company created");
    Ok((StatusCode::CREATED, Json(CompanyResponse::from_record(&company))))
}

/// GET /v1/companies — Companies visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/companies",
    responses(
        (status = 200, description = "Visible companies", body = [CompanyResponse]),
    ),
    tag = "companies"
)]
pub async fn list_companies(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<CompanyResponse>>, AppError> {
    let mut companies: Vec<Company> = state
        .companies
        .list()
        .into_iter()
        .filter(|c| c.lifecycle.is_active())
        .filter(|c| caller.is_super_admin() || ensure_read(&caller, c).is_ok())
        .collect();
    companies.sort_by_key(|c| c.created_at);
    Ok(Json(companies.iter().map(CompanyResponse::from_record).collect()))
}

/// GET /v1/companies/{id} — Fetch one company aggregate.
#[utoipa::path(
    get,
    path = "/v1/companies/{id}",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "The company", body = CompanyResponse),
        (status = 403, description = "No access to this company"),
        (status = 404, description = "No such company"),
    ),
    tag = "companies"
)]
pub async fn get_company(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyResponse>, AppError> {
    let company = fetch_company(&state, id.into())?;
    ensure_read(&caller, &company)?;
    Ok(Json(CompanyResponse::from_record(&company)))
}

/// PATCH /v1/companies/{id} — Update core fields and signature refs.
#[utoipa::path(
    patch,
    path = "/v1/companies/{id}",
    params(("id" = Uuid, Path, description = "Company id")),
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Updated company", body = CompanyResponse),
        (status = 403, description = "Admin capability required"),
        (status = 404, description = "No such company"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "companies"
)]
pub async fn update_company(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateCompanyRequest>, JsonRejection>,
) -> Result<Json<CompanyResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let company = fetch_company(&state, id.into())?;
    ensure_manage(&caller, &company)?;

    let now = Utc::now();
    let updated = state
        .companies
        .update(&company.id, |c| {
            if let Some(name) = &req.name {
                c.name = name.trim().to_string();
            }
            if let Some(fein) = &req.fein {
                c.fein = Some(fein.trim().to_string());
            }
            if let Some(company_type) = &req.company_type {
                c.company_type = Some(company_type.trim().to_string());
            }
            if let Some(nys_no) = &req.nys_no {
                c.nys_no = Some(nys_no.trim().to_string());
            }
            if let Some(phone) = &req.phone {
                c.phone = Some(phone.clone());
            }
            if let Some(email) = &req.email {
                c.email = Some(email.trim().to_string());
            }
            if let Some(policy) = req.signature_policy {
                c.signature_policy = policy;
            }
            if let Some(signature) = &req.signature {
                c.signature = Some(signature.clone());
            }
            if let Some(secondary) = &req.secondary_signature {
                c.secondary_signature = Some(secondary.clone());
            }
            c.updated_at = now;
        })
        .ok_or_else(|| AppError::NotFound(format!("company {id} not found")))?;

    persist_company(&state, &updated).await?;
    Ok(Json(CompanyResponse::from_record(&updated)))
}

/// POST /v1/companies/{id}/addresses — Record a new address slice,
/// superseding the currently active slice of the same kind.
#[utoipa::path(
    post,
    path = "/v1/companies/{id}/addresses",
    params(("id" = Uuid, Path, description = "Company id")),
    request_body = AddressRequest,
    responses(
        (status = 201, description = "Updated company", body = CompanyResponse),
        (status = 403, description = "Admin capability required"),
        (status = 404, description = "No such company"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "companies"
)]
pub async fn add_address(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<AddressRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CompanyResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let company = fetch_company(&state, id.into())?;
    ensure_manage(&caller, &company)?;

    let now = Utc::now();
    let address = Address {
        id: Uuid::new_v4(),
        kind: req.kind,
        line1: req.line1.trim().to_string(),
        line2: req.line2,
        city: req.city.trim().to_string(),
        region: req.region.trim().to_string(),
        postal_code: req.postal_code.trim().to_string(),
        country: req.country,
        active_from: now,
        active_until: None,
    };

    let updated = state
        .companies
        .update(&company.id, |c| c.add_address(address.clone(), now))
        .ok_or_else(|| AppError::NotFound(format!("company {id} not found")))?;

    persist_company(&state, &updated).await?;
    Ok((StatusCode::CREATED, Json(CompanyResponse::from_record(&updated))))
}

/// GET /v1/companies/{id}/addresses — Full address history.
#[utoipa::path(
    get,
    path = "/v1/companies/{id}/addresses",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "Address slices, newest first", body = Vec<Object>),
        (status = 403, description = "No access to this company"),
        (status = 404, description = "No such company"),
    ),
    tag = "companies"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Address>>, AppError> {
    let company = fetch_company(&state, id.into())?;
    ensure_read(&caller, &company)?;
    let mut addresses = company.addresses;
    addresses.sort_by(|a, b| b.active_from.cmp(&a.active_from));
    Ok(Json(addresses))
}
