//! Report classification: the closed set of compatibility outcomes and
//! their deterministic exit semantics.
//!
//! `difference` never panics and never terminates the process; exit-code
//! mapping happens exactly once, at the outermost CLI boundary.

use crate::contract::Contract;
use crate::diff::find_differences;
use crate::error::PatternError;
use crate::result::DiffResults;

/// The outcome of comparing two contract versions.
#[derive(Debug)]
pub enum CompatibilityReport {
    Compatible,
    Incompatible { results: DiffResults },
    ContractException { error: PatternError },
    GenericException { message: String },
}

impl CompatibilityReport {
    /// Deterministic process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompatibilityReport::Compatible => 0,
            CompatibilityReport::Incompatible { .. } => 1,
            CompatibilityReport::ContractException { .. } => 2,
            CompatibilityReport::GenericException { .. } => 3,
        }
    }

    /// Textual rendering; a pure function of the variant.
    pub fn message(&self) -> String {
        match self {
            CompatibilityReport::Compatible => {
                "The two contracts are backward compatible.".to_string()
            }
            CompatibilityReport::Incompatible { results } => format!(
                "{}\n\nThe newer contract is not backward compatible with the older contract ({} breaking change(s)).",
                results.report(),
                results.failure_count()
            ),
            CompatibilityReport::ContractException { error } => {
                format!("contract error: {}", error)
            }
            CompatibilityReport::GenericException { message } => {
                format!("error: {}", message)
            }
        }
    }

    /// JSON rendering for machine consumers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CompatibilityReport::Compatible => serde_json::json!({
                "compatible": true,
                "failure_count": 0,
            }),
            CompatibilityReport::Incompatible { results } => serde_json::json!({
                "compatible": false,
                "failure_count": results.failure_count(),
                "failures": results.failures,
            }),
            CompatibilityReport::ContractException { error } => serde_json::json!({
                "compatible": false,
                "error": error.to_string(),
                "error_kind": "contract",
            }),
            CompatibilityReport::GenericException { message } => serde_json::json!({
                "compatible": false,
                "error": message,
                "error_kind": "internal",
            }),
        }
    }
}

/// Run the diff engine guarded and classify the outcome.
pub fn difference(older: &Contract, newer: &Contract) -> CompatibilityReport {
    match find_differences(older, newer) {
        Ok(results) if results.failure_count() > 0 => {
            CompatibilityReport::Incompatible { results }
        }
        Ok(_) => CompatibilityReport::Compatible,
        Err(error) if error.is_contract_defect() => CompatibilityReport::ContractException { error },
        Err(error) => CompatibilityReport::GenericException {
            message: error.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multipart::{ContentPart, MultiPartPattern};
    use crate::pattern::Pattern;

    fn contract(parts: Vec<MultiPartPattern>) -> Contract {
        let mut contract = Contract::new("upload");
        contract.multipart = parts;
        contract
    }

    #[test]
    fn compatible_maps_to_exit_zero() {
        let older = contract(vec![MultiPartPattern::Content(ContentPart::new(
            "id",
            Pattern::Number,
        ))]);
        let report = difference(&older, &older.clone());
        assert!(matches!(report, CompatibilityReport::Compatible));
        assert_eq!(report.exit_code(), 0);
        assert!(report.message().contains("backward compatible"));
    }

    #[test]
    fn incompatible_counts_failures() {
        let older = contract(vec![MultiPartPattern::Content(ContentPart::new(
            "id",
            Pattern::String,
        ))]);
        let newer = contract(vec![MultiPartPattern::Content(ContentPart::new(
            "id",
            Pattern::Number,
        ))]);
        let report = difference(&older, &newer);
        assert_eq!(report.exit_code(), 1);
        assert!(report.message().contains("1 breaking change"));
        assert_eq!(report.to_json()["failure_count"], 1);
    }

    #[test]
    fn unresolved_reference_is_a_contract_exception() {
        let mut older = Contract::new("v1");
        older.body = Some(Pattern::lookup("Missing"));
        let mut newer = Contract::new("v2");
        newer.body = Some(Pattern::String);

        let report = difference(&older, &newer);
        assert!(matches!(
            report,
            CompatibilityReport::ContractException { .. }
        ));
        assert_eq!(report.exit_code(), 2);
        assert!(report.message().contains("Missing"));
    }
}
