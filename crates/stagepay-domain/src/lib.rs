//! # stagepay-domain — Onboarding Domain Model
//!
//! The company aggregate and everything the review workflow evaluates:
//!
//! - [`company`] — the onboarding subject: identity fields, signature
//!   policy, time-sliced addresses, and the three one-to-one
//!   configuration sub-records.
//! - [`bank`], [`payroll`], [`union_config`] — the configuration
//!   sub-records with their per-record completeness rules. Union
//!   agreement terms are a tagged sum type validated by exhaustive
//!   match; an unhandled agreement kind cannot silently skip validation.
//! - [`completeness`] — the two readiness rule sets (submission /
//!   approval). Pure accumulation of violations, never an error.
//! - [`review`] — the `CompanyReview` record and its state machine:
//!   `pending → {approved, rejected}`, both outcomes terminal.
//!
//! ## Crate Policy
//!
//! - No I/O, no async, no framework types. Persistence and HTTP live in
//!   `stagepay-api`.
//! - Readiness checks return violation lists; only state transitions
//!   return `Err`.

pub mod bank;
pub mod company;
pub mod completeness;
pub mod payroll;
pub mod review;
pub mod tenant;
pub mod union_config;
pub mod user;

pub use bank::{AccountType, BankConfig};
pub use company::{Address, AddressKind, Company, Country, SignaturePolicy};
pub use completeness::{approval_violations, submission_violations, Violation};
pub use payroll::{PayFrequency, PayrollConfig};
pub use review::{CompanyReview, ReviewError, ReviewStatus};
pub use tenant::Tenant;
pub use union_config::{
    AgreementType, DevelopmentTerms, ProductionContractTerms, UnionConfig, UnionMembership,
};
pub use user::{CompanyMembership, MemberRole, UserProfile};
