//! # Completeness Checker
//!
//! The two readiness rule sets of the review workflow, as pure functions
//! over the company aggregate. Both accumulate discrete
//! [`Violation`]s — one per missing or invalid item, each with a field
//! path — and never fail themselves; callers decide whether an empty
//! list authorizes a transition.
//!
//! Submission-readiness is the minimum to request review. Approval-
//! readiness is a strict superset: approval makes the company eligible
//! for money movement, so every dependent record must be internally
//! complete before a reviewer can approve.
//!
//! This is the single home of both rule sets. The submit and approve
//! gates call the same functions; there is no second copy to drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::company::{Company, SignaturePolicy};

/// One discrete readiness violation: the field path that needs attention
/// and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    /// Build a violation from any stringish field path and message.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// Submission-readiness: what a company needs before it may request
/// review. Provisional banking and payroll data is allowed at this
/// stage.
pub fn submission_violations(company: &Company, now: DateTime<Utc>) -> Vec<Violation> {
    let mut out = Vec::new();
    if company.primary_address(now).is_none() {
        out.push(Violation::new(
            "addresses",
            "a current primary address is required",
        ));
    }
    if blank(&company.signature) {
        out.push(Violation::new("signature", "a signature is required"));
    }
    if company.signature_policy == SignaturePolicy::Double && blank(&company.secondary_signature) {
        out.push(Violation::new(
            "secondary_signature",
            "a secondary signature is required for the double signature policy",
        ));
    }
    out
}

/// Approval-readiness: a strict superset of submission-readiness. Core
/// identity fields must be populated and every configuration sub-record
/// must be present and internally complete.
pub fn approval_violations(company: &Company, now: DateTime<Utc>) -> Vec<Violation> {
    let mut out = submission_violations(company, now);

    if company.name.trim().is_empty() {
        out.push(Violation::new("name", "is required"));
    }
    if company.code.trim().is_empty() {
        out.push(Violation::new("code", "is required"));
    }
    if blank(&company.fein) {
        out.push(Violation::new("fein", "is required"));
    }
    if blank(&company.company_type) {
        out.push(Violation::new("company_type", "is required"));
    }
    if blank(&company.nys_no) {
        out.push(Violation::new("nys_no", "is required"));
    }
    if blank(&company.phone) {
        out.push(Violation::new("phone", "is required"));
    }

    match &company.bank_config {
        None => out.push(Violation::new(
            "bank_config",
            "must be present and complete",
        )),
        Some(bank) => out.extend(bank.violations()),
    }
    match &company.payroll_config {
        None => out.push(Violation::new(
            "payroll_config",
            "must be present and complete",
        )),
        Some(payroll) => out.extend(payroll.violations()),
    }
    match &company.union_config {
        None => out.push(Violation::new(
            "union_config",
            "must have a union configuration",
        )),
        Some(union) => out.extend(union.violations()),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{AccountType, BankConfig};
    use crate::company::{Address, AddressKind, Country};
    use crate::payroll::{PayFrequency, PayrollConfig};
    use crate::union_config::{UnionConfig, UnionMembership};
    use chrono::NaiveDate;
    use stagepay_core::{TenantId, UserId};
    use uuid::Uuid;

    fn fields(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.field.as_str()).collect()
    }

    fn bare_company(now: DateTime<Utc>) -> Company {
        Company::new(
            TenantId::new(),
            UserId::new(),
            "Cherry Lane Stage Co".to_string(),
            "CHERRY-LANE-01".to_string(),
            now,
        )
    }

    /// A company that passes submission-readiness with a single policy.
    fn submission_ready(now: DateTime<Utc>) -> Company {
        let mut c = bare_company(now);
        c.add_address(
            Address {
                id: Uuid::new_v4(),
                kind: AddressKind::Primary,
                line1: "38 Commerce St".to_string(),
                line2: None,
                city: "New York".to_string(),
                region: "NY".to_string(),
                postal_code: "10014".to_string(),
                country: Country::Us,
                active_from: now,
                active_until: None,
            },
            now,
        );
        c.signature = Some("s3://signatures/primary".to_string());
        c
    }

    /// A company that passes approval-readiness end to end.
    fn approval_ready(now: DateTime<Utc>) -> Company {
        let mut c = submission_ready(now);
        c.fein = Some("12-3456789".to_string());
        c.company_type = Some("business".to_string());
        c.nys_no = Some("NYS-008812".to_string());
        c.phone = Some("+12125550117".to_string());
        c.bank_config = Some(BankConfig {
            bank_name: "Chase Bank".to_string(),
            account_number: "123456789".to_string(),
            routing_number_ach: "021000021".to_string(),
            routing_number_wire: "021000021".to_string(),
            account_type: AccountType::Checking,
            authorized: true,
            active: true,
            approved: false,
        });
        c.payroll_config = Some(PayrollConfig {
            frequency: PayFrequency::Weekly,
            period: "2025-07".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 7, 7).unwrap(),
            check_start_number: 1000,
            active: true,
            approved: false,
        });
        c.union_config = Some(UnionConfig {
            membership: UnionMembership::NonUnion,
            active: true,
            approved: false,
        });
        c
    }

    #[test]
    fn bare_company_fails_submission_with_address_and_signature() {
        let now = Utc::now();
        let v = submission_violations(&bare_company(now), now);
        assert_eq!(fields(&v), vec!["addresses", "signature"]);
    }

    #[test]
    fn submission_ready_company_passes() {
        let now = Utc::now();
        assert!(submission_violations(&submission_ready(now), now).is_empty());
    }

    #[test]
    fn double_policy_requires_secondary_signature() {
        let now = Utc::now();
        let mut c = submission_ready(now);
        c.signature_policy = SignaturePolicy::Double;
        let v = submission_violations(&c, now);
        assert_eq!(fields(&v), vec!["secondary_signature"]);

        c.secondary_signature = Some("s3://signatures/secondary".to_string());
        assert!(submission_violations(&c, now).is_empty());
    }

    #[test]
    fn superseded_address_does_not_satisfy_submission() {
        let now = Utc::now();
        let mut c = submission_ready(now);
        // Close out the only primary slice.
        for a in &mut c.addresses {
            a.active_until = Some(now - chrono::Duration::days(1));
        }
        let v = submission_violations(&c, now);
        assert_eq!(fields(&v), vec!["addresses"]);
    }

    #[test]
    fn approval_ready_company_passes() {
        let now = Utc::now();
        assert!(approval_violations(&approval_ready(now), now).is_empty());
    }

    #[test]
    fn approval_is_strict_superset_of_submission() {
        let now = Utc::now();
        // Submission-ready but nothing else: approval must still fail.
        let v = approval_violations(&submission_ready(now), now);
        let f = fields(&v);
        assert!(f.contains(&"fein"));
        assert!(f.contains(&"company_type"));
        assert!(f.contains(&"nys_no"));
        assert!(f.contains(&"phone"));
        assert!(f.contains(&"bank_config"));
        assert!(f.contains(&"payroll_config"));
        assert!(f.contains(&"union_config"));
    }

    #[test]
    fn absent_bank_config_reported_as_single_violation() {
        let now = Utc::now();
        let mut c = approval_ready(now);
        c.bank_config = None;
        let v = approval_violations(&c, now);
        assert_eq!(fields(&v), vec!["bank_config"]);
    }

    #[test]
    fn incomplete_bank_config_reports_the_specific_field() {
        let now = Utc::now();
        let mut c = approval_ready(now);
        c.bank_config.as_mut().unwrap().routing_number_ach = "1234".to_string();
        let v = approval_violations(&c, now);
        assert_eq!(fields(&v), vec!["bank_config.routing_number_ach"]);
        assert_eq!(v[0].message, "must be 9 digits");
    }

    #[test]
    fn union_term_sheet_violations_surface_through_approval() {
        use crate::union_config::{AgreementType, DevelopmentTerms};
        let now = Utc::now();
        let mut c = approval_ready(now);
        c.union_config = Some(UnionConfig {
            membership: UnionMembership::Union {
                union_name: "Actors' Equity Association".to_string(),
                agreement: AgreementType::DevelopmentAgreement(DevelopmentTerms {
                    tier: String::new(),
                    aea_employer_id: "AEA-4471".to_string(),
                    aea_production_title: "Evening Light".to_string(),
                    aea_business_representative: "R. Alvarez".to_string(),
                }),
            },
            active: true,
            approved: false,
        });
        let v = approval_violations(&c, now);
        assert_eq!(
            fields(&v),
            vec!["union_config.agreement_type_configuration.tier"]
        );
    }

    #[test]
    fn checker_never_fails_it_only_accumulates() {
        let now = Utc::now();
        let mut c = bare_company(now);
        c.name = String::new();
        c.code = String::new();
        // Everything is wrong at once; every problem is reported once.
        let v = approval_violations(&c, now);
        assert!(v.len() >= 9);
        let f = fields(&v);
        let mut dedup = f.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), f.len(), "no duplicate field paths");
    }
}
