//! # Bank Configuration
//!
//! Disbursement account details for a company. The record can be saved in
//! any state of completeness before submission; approval requires every
//! field populated, both routing numbers in valid ABA format, and the
//! authorization flag granted.

use serde::{Deserialize, Serialize};

use crate::completeness::Violation;

/// Bank account type accepted for payroll disbursement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
}

/// The company's disbursement account configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankConfig {
    pub bank_name: String,
    pub account_number: String,
    /// ACH routing number, 9 digits.
    pub routing_number_ach: String,
    /// Wire routing number, 9 digits.
    pub routing_number_wire: String,
    pub account_type: AccountType,
    /// Whether the company has authorized debits/credits on this account.
    pub authorized: bool,
    pub active: bool,
    /// Set only by the approval fan-out.
    pub approved: bool,
}

/// An ABA routing number: exactly nine ASCII digits.
fn valid_routing_number(s: &str) -> bool {
    s.len() == 9 && s.bytes().all(|b| b.is_ascii_digit())
}

impl BankConfig {
    /// Approval-readiness violations for this record, with field paths
    /// rooted at `bank_config`.
    pub fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        if self.bank_name.trim().is_empty() {
            out.push(Violation::new("bank_config.bank_name", "is required"));
        }
        if self.account_number.trim().is_empty() {
            out.push(Violation::new("bank_config.account_number", "is required"));
        }
        if !valid_routing_number(&self.routing_number_ach) {
            out.push(Violation::new(
                "bank_config.routing_number_ach",
                "must be 9 digits",
            ));
        }
        if !valid_routing_number(&self.routing_number_wire) {
            out.push(Violation::new(
                "bank_config.routing_number_wire",
                "must be 9 digits",
            ));
        }
        if !self.authorized {
            out.push(Violation::new(
                "bank_config.authorized",
                "account authorization must be granted",
            ));
        }
        out
    }

    /// Whether the record satisfies every approval-readiness rule.
    pub fn is_complete(&self) -> bool {
        self.violations().is_empty()
    }
}
