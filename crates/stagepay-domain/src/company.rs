//! # Company Aggregate
//!
//! The onboarding subject. A company owns its addresses and its three
//! one-to-one configuration sub-records; the whole aggregate is loaded and
//! mutated together, which is what lets the review gates evaluate it with
//! pure functions.
//!
//! Addresses are time-sliced: at most one address per kind is active at a
//! time, and inserting a new one closes out the previous slice in the same
//! mutation. `approved` is the terminal positive outcome of the review
//! workflow and is set only by the approval fan-out — nothing else writes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stagepay_core::{CompanyId, Lifecycle, TenantId, UserId};

use crate::bank::BankConfig;
use crate::payroll::PayrollConfig;
use crate::union_config::UnionConfig;

/// How many officer signatures checks issued by this company carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignaturePolicy {
    /// One signature asset required.
    Single,
    /// Two signature assets required.
    Double,
}

/// Countries the platform can pay into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "CA")]
    Ca,
}

/// Address kinds. Only the `Primary` slice participates in review
/// readiness; billing and shipping are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Primary,
    Billing,
    Shipping,
}

/// One time-sliced address. `active_until == None` means the slice is
/// still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: Uuid,
    pub kind: AddressKind,
    pub line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: Country,
    pub active_from: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_until: Option<DateTime<Utc>>,
}

impl Address {
    /// Whether this slice is active at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.active_from <= now && self.active_until.map_or(true, |until| until >= now)
    }
}

/// The company aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub tenant_id: TenantId,
    /// The user who created the company.
    pub owned_by: UserId,
    pub name: String,
    /// Globally unique short code.
    pub code: String,
    /// Federal employer identification number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fein: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_type: Option<String>,
    /// State registration number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nys_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub signature_policy: SignaturePolicy,
    /// Signed asset reference recorded after upload completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_signature: Option<String>,
    /// Terminal positive review outcome. Set only by the approval fan-out.
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<UserId>,
    pub suspended: bool,
    pub lifecycle: Lifecycle,
    pub addresses: Vec<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_config: Option<BankConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payroll_config: Option<PayrollConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub union_config: Option<UnionConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// Create a fresh, unapproved company aggregate with no addresses or
    /// configuration sub-records.
    pub fn new(
        tenant_id: TenantId,
        owned_by: UserId,
        name: String,
        code: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CompanyId::new(),
            tenant_id,
            owned_by,
            name,
            code,
            fein: None,
            company_type: None,
            nys_no: None,
            phone: None,
            email: None,
            signature_policy: SignaturePolicy::Single,
            signature: None,
            secondary_signature: None,
            approved: false,
            approved_at: None,
            approved_by: None,
            suspended: false,
            lifecycle: Lifecycle::Active,
            addresses: Vec::new(),
            bank_config: None,
            payroll_config: None,
            union_config: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The address of the given kind that is active at `now`, if any.
    pub fn current_address(&self, kind: AddressKind, now: DateTime<Utc>) -> Option<&Address> {
        self.addresses
            .iter()
            .find(|a| a.kind == kind && a.is_active_at(now))
    }

    /// The currently active primary address, if any.
    pub fn primary_address(&self, now: DateTime<Utc>) -> Option<&Address> {
        self.current_address(AddressKind::Primary, now)
    }

    /// Insert a new address, closing out the currently active slice of the
    /// same kind. The superseded slice keeps its history; only
    /// `active_until` is written.
    pub fn add_address(&mut self, mut address: Address, now: DateTime<Utc>) {
        address.active_from = now;
        address.active_until = None;
        for existing in &mut self.addresses {
            if existing.kind == address.kind && existing.is_active_at(now) {
                existing.active_until = Some(now);
            }
        }
        self.addresses.push(address);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(kind: AddressKind) -> Address {
        Address {
            id: Uuid::new_v4(),
            kind,
            line1: "321 W 44th St".to_string(),
            line2: None,
            city: "New York".to_string(),
            region: "NY".to_string(),
            postal_code: "10036".to_string(),
            country: Country::Us,
            active_from: Utc::now(),
            active_until: None,
        }
    }

    fn company() -> Company {
        Company::new(
            TenantId::new(),
            UserId::new(),
            "Broadhurst Productions".to_string(),
            "BROADHURST-01".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn new_company_starts_unapproved_with_no_dependents() {
        let c = company();
        assert!(!c.approved);
        assert!(!c.suspended);
        assert!(c.lifecycle.is_active());
        assert!(c.addresses.is_empty());
        assert!(c.bank_config.is_none());
        assert!(c.payroll_config.is_none());
        assert!(c.union_config.is_none());
    }

    #[test]
    fn add_address_makes_it_current() {
        let mut c = company();
        let now = Utc::now();
        c.add_address(address(AddressKind::Primary), now);
        assert!(c.primary_address(now).is_some());
    }

    #[test]
    fn adding_second_primary_supersedes_the_first() {
        let mut c = company();
        let t0 = Utc::now();
        c.add_address(address(AddressKind::Primary), t0);
        let first_id = c.addresses[0].id;

        let t1 = t0 + chrono::Duration::days(1);
        c.add_address(address(AddressKind::Primary), t1);

        let later = t1 + chrono::Duration::hours(1);
        let current = c.primary_address(later).expect("a current primary");
        assert_ne!(current.id, first_id);

        // The first slice is closed out, not deleted.
        let first = c.addresses.iter().find(|a| a.id == first_id).unwrap();
        assert_eq!(first.active_until, Some(t1));
        assert_eq!(c.addresses.len(), 2);

        // Exactly one primary is active at any instant after the swap.
        let active: Vec<_> = c
            .addresses
            .iter()
            .filter(|a| a.kind == AddressKind::Primary && a.is_active_at(later))
            .collect();
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn superseding_is_scoped_to_the_address_kind() {
        let mut c = company();
        let t0 = Utc::now();
        c.add_address(address(AddressKind::Primary), t0);
        let t1 = t0 + chrono::Duration::days(1);
        c.add_address(address(AddressKind::Billing), t1);

        let later = t1 + chrono::Duration::hours(1);
        assert!(c.primary_address(later).is_some());
        assert!(c.current_address(AddressKind::Billing, later).is_some());
    }

    #[test]
    fn address_slice_boundaries_are_inclusive() {
        let now = Utc::now();
        let mut a = address(AddressKind::Primary);
        a.active_from = now;
        a.active_until = Some(now);
        assert!(a.is_active_at(now));
        assert!(!a.is_active_at(now + chrono::Duration::seconds(1)));
    }

    #[test]
    fn signature_policy_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(SignaturePolicy::Double).unwrap(),
            serde_json::json!("double")
        );
    }
}
