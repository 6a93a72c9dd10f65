//! Drug-interaction checking boundary.
//!
//! The interaction knowledge base itself is an external collaborator;
//! this crate fixes the wire shapes on the path into it and ships a small
//! builtin pair table behind the same trait so the endpoint works without
//! the collaborator wired in.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Severity tiers reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionSeverity {
    Major,
    Moderate,
    Minor,
}

/// One known interaction between a medication pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugInteraction {
    pub medication1: String,
    pub medication2: String,
    pub description: String,
    pub recommendation: String,
}

/// Interactions grouped by severity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionReport {
    pub major: Vec<DrugInteraction>,
    pub moderate: Vec<DrugInteraction>,
    pub minor: Vec<DrugInteraction>,
}

impl InteractionReport {
    pub fn has_interactions(&self) -> bool {
        !(self.major.is_empty() && self.moderate.is_empty() && self.minor.is_empty())
    }

    fn push(&mut self, severity: InteractionSeverity, interaction: DrugInteraction) {
        match severity {
            InteractionSeverity::Major => self.major.push(interaction),
            InteractionSeverity::Moderate => self.moderate.push(interaction),
            InteractionSeverity::Minor => self.minor.push(interaction),
        }
    }
}

/// Seam for the external interaction-lookup collaborator.
#[async_trait]
pub trait InteractionChecker: Send + Sync {
    async fn check(&self, medications: &[String]) -> Result<InteractionReport>;
}

/// Known interaction pairs: (drug a, drug b, severity, description, recommendation).
/// A placeholder knowledge base; deployments substitute a real collaborator.
const PAIR_TABLE: &[(
    &str,
    &str,
    InteractionSeverity,
    &str,
    &str,
)] = &[
    (
        "warfarin",
        "aspirin",
        InteractionSeverity::Major,
        "Combined anticoagulant and antiplatelet effect raises bleeding risk",
        "Avoid the combination unless explicitly directed by the prescriber",
    ),
    (
        "warfarin",
        "ibuprofen",
        InteractionSeverity::Major,
        "NSAIDs increase bleeding risk and may potentiate warfarin",
        "Prefer acetaminophen for pain relief while on warfarin",
    ),
    (
        "lisinopril",
        "ibuprofen",
        InteractionSeverity::Moderate,
        "NSAIDs can blunt the antihypertensive effect and stress the kidneys",
        "Monitor blood pressure and renal function if used together",
    ),
    (
        "metformin",
        "prednisone",
        InteractionSeverity::Moderate,
        "Corticosteroids raise blood glucose and oppose metformin",
        "Monitor glucose more frequently during the steroid course",
    ),
    (
        "simvastatin",
        "amlodipine",
        InteractionSeverity::Minor,
        "Amlodipine modestly raises simvastatin exposure",
        "Keep simvastatin at or below 20mg daily with amlodipine",
    ),
];

/// Builtin table-driven checker.
pub struct TableChecker;

impl TableChecker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TableChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[async_trait]
impl InteractionChecker for TableChecker {
    async fn check(&self, medications: &[String]) -> Result<InteractionReport> {
        let normalized: Vec<String> = medications.iter().map(|m| normalize_name(m)).collect();
        let mut report = InteractionReport::default();

        for (i, first) in normalized.iter().enumerate() {
            for second in normalized.iter().skip(i + 1) {
                for (a, b, severity, description, recommendation) in PAIR_TABLE {
                    let matches = (first.contains(a) && second.contains(b))
                        || (first.contains(b) && second.contains(a));
                    if matches {
                        report.push(
                            *severity,
                            DrugInteraction {
                                medication1: first.clone(),
                                medication2: second.clone(),
                                description: description.to_string(),
                                recommendation: recommendation.to_string(),
                            },
                        );
                    }
                }
            }
        }

        debug!(
            medications = medications.len(),
            major = report.major.len(),
            moderate = report.moderate.len(),
            minor = report.minor.len(),
            "interaction check complete"
        );
        Ok(report)
    }
}
