//! # Union Configuration
//!
//! Whether the company operates under a union agreement, and if so, which
//! agreement and its term sheet. Agreement terms are a tagged sum type —
//! each agreement kind carries exactly the fields it requires and is
//! validated by exhaustive match, so an unhandled agreement kind is a
//! compile error, not a silently skipped schema.

use serde::{Deserialize, Serialize};

use crate::completeness::Violation;

/// Term sheet shared by the full production contracts: Equity/League and
/// Off-Broadway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionContractTerms {
    /// Whether the production is musical or dramatic.
    pub musical_or_dramatic: String,
    pub aea_employer_id: String,
    pub aea_production_title: String,
    pub aea_business_representative: String,
}

/// Term sheet for the development agreement. Carries a tier instead of
/// the musical/dramatic classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentTerms {
    pub tier: String,
    pub aea_employer_id: String,
    pub aea_production_title: String,
    pub aea_business_representative: String,
}

/// The union agreement kinds the platform recognizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "agreement_type", rename_all = "snake_case")]
pub enum AgreementType {
    EquityOrLeagueProductionContract(ProductionContractTerms),
    OffBroadwayAgreement(ProductionContractTerms),
    DevelopmentAgreement(DevelopmentTerms),
    /// Staged readings capped at 29 rehearsal hours; no term sheet.
    #[serde(rename = "29_hour_reading")]
    TwentyNineHourReading,
}

/// Union membership status. Non-union companies carry no union fields at
/// all — the sum type makes "non-union with a stale union name"
/// unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "union_type")]
pub enum UnionMembership {
    #[serde(rename = "non-union")]
    NonUnion,
    #[serde(rename = "union")]
    Union {
        union_name: String,
        agreement: AgreementType,
    },
}

/// The company's union configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionConfig {
    #[serde(flatten)]
    pub membership: UnionMembership,
    pub active: bool,
    /// Set only by the approval fan-out.
    pub approved: bool,
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn require(out: &mut Vec<Violation>, field: &str, value: &str) {
    if blank(value) {
        out.push(Violation::new(
            format!("union_config.agreement_type_configuration.{field}"),
            "is required",
        ));
    }
}

impl AgreementType {
    /// Approval-readiness violations for the agreement term sheet.
    /// Exhaustive over agreement kinds by construction.
    pub fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        match self {
            AgreementType::EquityOrLeagueProductionContract(terms)
            | AgreementType::OffBroadwayAgreement(terms) => {
                require(&mut out, "musical_or_dramatic", &terms.musical_or_dramatic);
                require(&mut out, "aea_employer_id", &terms.aea_employer_id);
                require(&mut out, "aea_production_title", &terms.aea_production_title);
                require(
                    &mut out,
                    "aea_business_representative",
                    &terms.aea_business_representative,
                );
            }
            AgreementType::DevelopmentAgreement(terms) => {
                require(&mut out, "tier", &terms.tier);
                require(&mut out, "aea_employer_id", &terms.aea_employer_id);
                require(&mut out, "aea_production_title", &terms.aea_production_title);
                require(
                    &mut out,
                    "aea_business_representative",
                    &terms.aea_business_representative,
                );
            }
            AgreementType::TwentyNineHourReading => {}
        }
        out
    }
}

impl UnionConfig {
    /// Approval-readiness violations for this record, with field paths
    /// rooted at `union_config`. Non-union configurations are always
    /// complete.
    pub fn violations(&self) -> Vec<Violation> {
        match &self.membership {
            UnionMembership::NonUnion => Vec::new(),
            UnionMembership::Union {
                union_name,
                agreement,
            } => {
                let mut out = Vec::new();
                if blank(union_name) {
                    out.push(Violation::new("union_config.union_name", "is required"));
                }
                out.extend(agreement.violations());
                out
            }
        }
    }

    /// Whether the record satisfies every approval-readiness rule.
    pub fn is_complete(&self) -> bool {
        self.violations().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn production_terms() -> ProductionContractTerms {
        ProductionContractTerms {
            musical_or_dramatic: "musical".to_string(),
            aea_employer_id: "AEA-4471".to_string(),
            aea_production_title: "Evening Light".to_string(),
            aea_business_representative: "R. Alvarez".to_string(),
        }
    }

    fn union(agreement: AgreementType) -> UnionConfig {
        UnionConfig {
            membership: UnionMembership::Union {
                union_name: "Actors' Equity Association".to_string(),
                agreement,
            },
            active: true,
            approved: false,
        }
    }

    #[test]
    fn non_union_is_always_complete() {
        let config = UnionConfig {
            membership: UnionMembership::NonUnion,
            active: true,
            approved: false,
        };
        assert!(config.is_complete());
    }

    #[test]
    fn complete_production_contract_passes() {
        let config = union(AgreementType::EquityOrLeagueProductionContract(
            production_terms(),
        ));
        assert!(config.is_complete());
    }

    #[test]
    fn blank_union_name_reported() {
        let mut config = union(AgreementType::OffBroadwayAgreement(production_terms()));
        if let UnionMembership::Union { union_name, .. } = &mut config.membership {
            *union_name = String::new();
        }
        let v = config.violations();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].field, "union_config.union_name");
    }

    #[test]
    fn development_agreement_requires_tier() {
        let config = union(AgreementType::DevelopmentAgreement(DevelopmentTerms {
            tier: String::new(),
            aea_employer_id: "AEA-4471".to_string(),
            aea_production_title: "Evening Light".to_string(),
            aea_business_representative: "R. Alvarez".to_string(),
        }));
        let v = config.violations();
        assert_eq!(v.len(), 1);
        assert_eq!(
            v[0].field,
            "union_config.agreement_type_configuration.tier"
        );
    }

    #[test]
    fn production_contract_requires_musical_or_dramatic_not_tier() {
        let mut terms = production_terms();
        terms.musical_or_dramatic = String::new();
        let config = union(AgreementType::EquityOrLeagueProductionContract(terms));
        let v = config.violations();
        assert_eq!(v.len(), 1);
        assert_eq!(
            v[0].field,
            "union_config.agreement_type_configuration.musical_or_dramatic"
        );
    }

    #[test]
    fn twenty_nine_hour_reading_needs_no_terms() {
        assert!(union(AgreementType::TwentyNineHourReading).is_complete());
    }

    #[test]
    fn membership_round_trips_through_json() {
        let config = union(AgreementType::DevelopmentAgreement(DevelopmentTerms {
            tier: "tier 2".to_string(),
            aea_employer_id: "AEA-4471".to_string(),
            aea_production_title: "Evening Light".to_string(),
            aea_business_representative: "R. Alvarez".to_string(),
        }));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["union_type"], "union");
        assert_eq!(json["agreement"]["agreement_type"], "development_agreement");
        assert_eq!(json["agreement"]["tier"], "tier 2");
        let back: UnionConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn unknown_agreement_type_rejected_at_deserialization() {
        let json = serde_json::json!({
            "union_type": "union",
            "union_name": "AEA",
            "agreement": { "agreement_type": "cabaret_agreement" },
            "active": true,
            "approved": false,
        });
        assert!(serde_json::from_value::<UnionConfig>(json).is_err());
    }
}
