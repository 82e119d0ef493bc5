//! Conflict-of-interest evaluation
//!
//! A HIGH conflict on the primary evidence caps the grade at C unless enough
//! independent top-tier sources free of the same conflict back the claim.
//! An uncured conflict is a cap, not a defect.

use crate::tawatur::{IndependenceKey, TawaturAnalyzer};
use sanad_domain::{
    COIEvaluation, ConflictSeverity, CorroborationStatus, Disclosure, EvidenceItem, Grade,
};
use std::collections::{BTreeMap, BTreeSet};

/// Grade an uncured HIGH conflict caps at
pub const COI_CAP: Grade = Grade::C;

/// Evaluations plus the resulting cap
#[derive(Debug, Clone, PartialEq)]
pub struct COIOutcome {
    /// One evaluation per conflicted party
    pub evaluations: Vec<COIEvaluation>,
    /// Cap to apply, if any conflict is uncured
    pub cap: Option<Grade>,
}

/// Evaluates conflicts of interest
#[derive(Debug, Clone, Default)]
pub struct COIEvaluator;

impl COIEvaluator {
    /// Create an evaluator
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the conflicts carried by the primary evidence
    ///
    /// Cures may come from any item in `all_items`.
    pub fn evaluate(
        &self,
        primary: &[&EvidenceItem],
        all_items: &[EvidenceItem],
        corroboration: CorroborationStatus,
        tawatur: &TawaturAnalyzer,
    ) -> COIOutcome {
        // party -> (disclosure, severity, evidence ids)
        let mut parties: BTreeMap<&str, (Disclosure, ConflictSeverity, Vec<String>)> = BTreeMap::new();
        for item in primary {
            for flag in item.conflicts() {
                let entry = parties.entry(flag.party.as_str()).or_insert((
                    flag.disclosure,
                    flag.severity,
                    Vec::new(),
                ));
                if flag.disclosure == Disclosure::Undisclosed {
                    entry.0 = Disclosure::Undisclosed;
                }
                entry.1 = entry.1.max(flag.severity);
                if !entry.2.iter().any(|id| id == item.evidence_id()) {
                    entry.2.push(item.evidence_id().to_string());
                }
            }
        }

        let mut evaluations = Vec::new();
        let mut cap = None;
        for (party, (disclosure, severity, evidence_refs)) in parties {
            let free_sources = self.independent_free_sources(party, all_items, tawatur);
            let (cured, rationale) = match (severity, disclosure) {
                (ConflictSeverity::High, Disclosure::Undisclosed) => {
                    if free_sources >= 1 {
                        (true, format!("Undisclosed HIGH conflict cured by {} independent tier 1/2 source(s)", free_sources))
                    } else {
                        (false, "Undisclosed HIGH conflict with no independent tier 1/2 source".to_string())
                    }
                }
                (ConflictSeverity::High, Disclosure::Disclosed) => {
                    if corroboration == CorroborationStatus::Mutawatir {
                        (true, "Disclosed HIGH conflict cured by MUTAWATIR corroboration".to_string())
                    } else if free_sources >= 2 {
                        (true, format!("Disclosed HIGH conflict cured by {} independent tier 1/2 sources", free_sources))
                    } else {
                        (false, format!(
                            "Disclosed HIGH conflict needs MUTAWATIR or 2 independent tier 1/2 sources, found {}",
                            free_sources
                        ))
                    }
                }
                (s, _) => (true, format!("{:?} conflict does not cap the grade", s)),
            };
            if !cured {
                cap = Some(COI_CAP);
            }
            evaluations.push(COIEvaluation {
                party: party.to_string(),
                evidence_refs,
                disclosure,
                severity,
                cured,
                rationale,
            });
        }

        COIOutcome { evaluations, cap }
    }

    /// Distinct independence keys among tier 1/2 items free of the conflict,
    /// excluding keys shared with a conflicted item
    fn independent_free_sources(
        &self,
        party: &str,
        all_items: &[EvidenceItem],
        tawatur: &TawaturAnalyzer,
    ) -> usize {
        let conflicted = |item: &EvidenceItem| item.conflicts().iter().any(|f| f.party == party);
        let tainted: BTreeSet<IndependenceKey> = all_items
            .iter()
            .filter(|i| conflicted(*i))
            .map(|i| tawatur.key(i))
            .collect();
        all_items
            .iter()
            .filter(|i| i.source_tier().is_top_tier() && !conflicted(*i))
            .map(|i| tawatur.key(i))
            .filter(|k| !tainted.contains(k))
            .collect::<BTreeSet<_>>()
            .len()
    }
}
