//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the Bearer token security scheme to the OpenAPI spec.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Bearer token authentication. Tokens are issued at registration; \
                             the operator token is set via STAGEPAY_ADMIN_TOKEN.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "StagePay API — Company Onboarding & Payroll Configuration",
        version = "0.3.0",
        description = "Multi-tenant company onboarding and payroll configuration service.\n\nProvides:\n- **Tenant provisioning** (platform operator)\n- **User registration** and token issuance\n- **Company onboarding**: profile, addresses, bank / payroll / union configuration\n- **Review workflow**: submission gates, super-admin approval and rejection, approval fan-out\n\nAuthentication: Bearer token via `Authorization: Bearer <token>` header.\nAll `/v1/*` endpoints except `POST /v1/users` require authentication. Health probes (`/health/*`) are unauthenticated.",
        contact(name = "StagePay")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        // ── Tenants ──────────────────────────────────────────────────────
        crate::routes::tenants::create_tenant,
        crate::routes::tenants::list_tenants,
        crate::routes::tenants::get_tenant,
        // ── Users ────────────────────────────────────────────────────────
        crate::routes::users::register_user,
        crate::routes::users::me,
        crate::routes::users::get_user,
        // ── Companies ────────────────────────────────────────────────────
        crate::routes::companies::create_company,
        crate::routes::companies::list_companies,
        crate::routes::companies::get_company,
        crate::routes::companies::update_company,
        crate::routes::companies::add_address,
        crate::routes::companies::list_addresses,
        // ── Company members ──────────────────────────────────────────────
        crate::routes::members::add_member,
        crate::routes::members::list_members,
        crate::routes::members::remove_member,
        // ── Configuration sub-records ────────────────────────────────────
        crate::routes::configs::put_bank_config,
        crate::routes::configs::get_bank_config,
        crate::routes::configs::put_payroll_config,
        crate::routes::configs::get_payroll_config,
        crate::routes::configs::put_union_config,
        crate::routes::configs::get_union_config,
        // ── Review workflow ──────────────────────────────────────────────
        crate::routes::reviews::submit_for_review,
        crate::routes::reviews::review_status,
        crate::routes::reviews::list_reviews,
        crate::routes::reviews::get_review,
        crate::routes::reviews::approve_review,
        crate::routes::reviews::reject_review,
    ),
    components(
        schemas(
            // ── Error types ──────────────────────────────────────────────
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            // ── Tenant DTOs ──────────────────────────────────────────────
            crate::routes::tenants::CreateTenantRequest,
            crate::routes::tenants::TenantResponse,
            // ── User DTOs ────────────────────────────────────────────────
            crate::routes::users::RegisterUserRequest,
            crate::routes::users::UserResponse,
            crate::routes::users::RegisteredUserResponse,
            crate::routes::users::MeResponse,
            // ── Company DTOs ─────────────────────────────────────────────
            crate::routes::companies::CreateCompanyRequest,
            crate::routes::companies::UpdateCompanyRequest,
            crate::routes::companies::AddressRequest,
            crate::routes::companies::CompanyResponse,
            // ── Member DTOs ──────────────────────────────────────────────
            crate::routes::members::AddMemberRequest,
            crate::routes::members::MemberResponse,
            // ── Configuration DTOs ───────────────────────────────────────
            crate::routes::configs::BankConfigRequest,
            crate::routes::configs::PayrollConfigRequest,
            crate::routes::configs::UnionConfigRequest,
            // ── Review DTOs ──────────────────────────────────────────────
            crate::routes::reviews::ApproveRequest,
            crate::routes::reviews::RejectRequest,
            crate::routes::reviews::ReviewResponse,
            crate::routes::reviews::SubmitResponse,
            crate::routes::reviews::ReviewStatusResponse,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "tenants", description = "Tenant provisioning — platform operator only"),
        (name = "users", description = "User registration, identity, and profiles"),
        (name = "companies", description = "Company onboarding profiles and addresses"),
        (name = "members", description = "Company rosters — admin and employee memberships"),
        (name = "configs", description = "Bank, payroll, and union configuration sub-records"),
        (name = "reviews", description = "Review workflow — submission gates, approval, rejection, fan-out"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router. Serves the spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_generates_successfully() {
        let spec = ApiDoc::openapi();
        assert_eq!(
            spec.info.title,
            "StagePay API — Company Onboarding & Payroll Configuration"
        );
    }

    #[test]
    fn spec_has_review_workflow_paths() {
        let spec = ApiDoc::openapi();
        for path in &[
            "/v1/companies/{id}/submit-for-review",
            "/v1/companies/{id}/review-status",
            "/v1/reviews",
            "/v1/reviews/{id}/approve",
            "/v1/reviews/{id}/reject",
        ] {
            assert!(
                spec.paths.paths.contains_key(*path),
                "should contain {path}"
            );
        }
    }

    #[test]
    fn spec_has_company_and_config_paths() {
        let spec = ApiDoc::openapi();
        for path in &[
            "/v1/companies",
            "/v1/companies/{id}",
            "/v1/companies/{id}/addresses",
            "/v1/companies/{id}/members",
            "/v1/companies/{id}/members/{user_id}",
            "/v1/companies/{id}/bank-config",
            "/v1/companies/{id}/payroll-config",
            "/v1/companies/{id}/union-config",
        ] {
            assert!(
                spec.paths.paths.contains_key(*path),
                "should contain {path}"
            );
        }
    }

    #[test]
    fn spec_has_tenant_and_user_paths() {
        let spec = ApiDoc::openapi();
        for path in &["/v1/tenants", "/v1/tenants/{id}", "/v1/users", "/v1/me"] {
            assert!(
                spec.paths.paths.contains_key(*path),
                "should contain {path}"
            );
        }
    }

    #[test]
    fn spec_has_security_scheme() {
        let spec = ApiDoc::openapi();
        let components = spec.components.as_ref().unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn spec_has_error_schemas() {
        let spec = ApiDoc::openapi();
        let schemas = &spec.components.as_ref().unwrap().schemas;
        assert!(schemas.contains_key("ErrorBody"));
        assert!(schemas.contains_key("ErrorDetail"));
        assert!(schemas.contains_key("ReviewResponse"));
    }

    #[test]
    fn spec_serializes_to_json() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("bearer_auth"));
    }

    #[test]
    fn router_builds_successfully() {
        let _router = router();
    }
}
