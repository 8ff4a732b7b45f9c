//! # Payroll Configuration
//!
//! Pay-run cadence for a company: how often payroll runs, which period it
//! starts in, and the first check number issued.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::completeness::Violation;

/// How often payroll runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    Weekly,
    Biweekly,
    Semimonthly,
    Monthly,
}

/// The company's payroll cadence configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollConfig {
    pub frequency: PayFrequency,
    /// The payroll period label the schedule starts in, e.g. "2025-07".
    pub period: String,
    pub start_date: NaiveDate,
    /// First check number issued by this company.
    pub check_start_number: u32,
    pub active: bool,
    /// Set only by the approval fan-out.
    pub approved: bool,
}

impl PayrollConfig {
    /// Approval-readiness violations for this record, with field paths
    /// rooted at `payroll_config`. Frequency, start date, and check
    /// number are present by construction; only the period label can be
    /// saved blank.
    pub fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        if self.period.trim().is_empty() {
            out.push(Violation::new("payroll_config.period", "is required"));
        }
        out
    }

    /// Whether the record satisfies every approval-readiness rule.
    pub fn is_complete(&self) -> bool {
        self.violations().is_empty()
    }
}
