//! The grading engine facade
//!
//! One synchronous call per claim. The engine holds only configuration and
//! stateless components, so a single instance can be shared across threads.

use crate::classifier::SourceTierClassifier;
use crate::coi::COIEvaluator;
use crate::composer::{CompositionInput, GradeComposer};
use crate::config::{BaseGradePolicy, EngineConfig};
use crate::dabt::{DabtScore, DabtScorer};
use crate::ilal::IlalDetector;
use crate::ledger::DefectLedger;
use crate::shudhudh::ShudhudhDetector;
use crate::tawatur::TawaturAnalyzer;
use crate::validation::validate_snapshot;
use crate::{ConfigError, GradingError, InvalidInputError};
use sanad_domain::{
    AnomalyOutcome, ClaimSnapshot, Defect, DefectKind, EvidenceItem, Grade, Sanad,
    SanadGradeResult, SanadId, SourceTier, TransmissionChain, SANAD_ID_NAMESPACE,
};
use std::collections::BTreeSet;

/// Evidentiary trust grading engine
#[derive(Debug, Clone)]
pub struct SanadEngine {
    config: EngineConfig,
    classifier: SourceTierClassifier,
    dabt: DabtScorer,
    tawatur: TawaturAnalyzer,
    shudhudh: ShudhudhDetector,
    ilal: IlalDetector,
    coi: COIEvaluator,
    composer: GradeComposer,
}

impl Default for SanadEngine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

/// The anchoring primary evidence and its score
struct Anchor<'a> {
    item: &'a EvidenceItem,
    score: DabtScore,
}

impl SanadEngine {
    /// Create an engine after validating its configuration
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            classifier: SourceTierClassifier::with_rules(&config.source_rules),
            dabt: DabtScorer::new(config.dabt.clone()),
            tawatur: TawaturAnalyzer::new(config.tawatur.clone()),
            shudhudh: ShudhudhDetector::new(config.shudhudh.clone()),
            ilal: IlalDetector::new(),
            coi: COIEvaluator::new(),
            composer: GradeComposer::new(),
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Tier classifier in use
    pub fn classifier(&self) -> &SourceTierClassifier {
        &self.classifier
    }

    /// Grade one claim
    ///
    /// # Errors
    /// Rejects the snapshot (no result) if it is structurally invalid or an
    /// evidence source is not in the tier table. Chain faults are not errors;
    /// they become FATAL defects.
    pub fn grade(&self, snapshot: &ClaimSnapshot) -> Result<SanadGradeResult, GradingError> {
        self.grade_sanad(snapshot).map(|sanad| sanad.result)
    }

    /// Grade one claim and keep the chain it was graded over
    pub fn grade_sanad(&self, snapshot: &ClaimSnapshot) -> Result<Sanad, GradingError> {
        let claim = &snapshot.claim;
        let claim_id = claim.claim_id;

        // 1. Reject malformed input
        validate_snapshot(snapshot).map_err(|e| self.reject(snapshot, e))?;

        // 2. Classify evidence
        let items: Vec<EvidenceItem> = snapshot
            .evidence
            .iter()
            .cloned()
            .map(|record| self.classifier.classify_record(record))
            .collect::<Result<_, _>>()
            .map_err(|e| self.reject(snapshot, e))?;

        // 3. Build the chain arena
        let chain = TransmissionChain::build(snapshot.chain.clone())
            .map_err(|e| self.reject(snapshot, InvalidInputError::from(e)))?;

        // 4. Primary evidence and anchor
        let primary = primary_evidence(&items, &chain);
        let anchor = self.anchor(&primary);
        let (tier_floor, floor_rationale) = self.base_grade(anchor.as_ref(), &items, &chain);

        // 5. Defects, in detection order
        let mut ledger = DefectLedger::new(claim_id);
        for defect in self.ilal.detect(claim_id, &chain, &items) {
            ledger.raise(defect);
        }

        let anomaly = self.shudhudh.detect(
            claim.asserted_value.as_ref(),
            anchor.as_ref().map(|a| a.item.source_tier()),
            &snapshot.peers,
        );
        if let AnomalyOutcome::Anomaly { peer_ids } = &anomaly {
            ledger.raise(Defect::open(
                claim_id,
                DefectKind::Anomaly,
                "shudhudh",
                format!(
                    "Claim value contradicts the consensus of {} after reconciliation",
                    peer_ids.join(", ")
                ),
            ));
        }

        for report in &snapshot.reported_defects {
            let mut refs = report.evidence_refs.clone();
            refs.sort();
            let locus = format!("reported/{}/{}", refs.join(","), report.description);
            ledger.raise(
                Defect::open(claim_id, report.kind, &locus, report.description.clone())
                    .with_evidence(report.evidence_refs.iter().cloned()),
            );
        }

        if let Some(anchor) = &anchor {
            for missing in &anchor.score.missing {
                ledger.raise(
                    Defect::open(
                        claim_id,
                        DefectKind::MissingMetadata,
                        &format!("dabt/{}/{}", missing.evidence_id, missing.dimension),
                        missing.to_string(),
                    )
                    .with_evidence([missing.evidence_id.clone()]),
                );
            }
        }

        // 6. Prior dispositions
        for disposition in &snapshot.dispositions {
            if ledger.status(disposition.defect_id).is_none() {
                tracing::debug!(defect_id = %disposition.defect_id, "Disposition matches no current defect");
                continue;
            }
            // Refusals are logged by the ledger and leave the defect as found
            let _ = ledger.apply(disposition);
        }

        // 7. Corroboration and conflicts
        let tawatur = self.tawatur.analyze(&items, &chain);
        let coi = self
            .coi
            .evaluate(&primary, &items, tawatur.status, &self.tawatur);

        // 8. Compose
        let dabt_composite = anchor.as_ref().map(|a| a.score.composite).unwrap_or(0.0);
        let defects = ledger.defects();
        let composition = self.composer.compose(&CompositionInput {
            tier_floor,
            floor_rationale,
            dabt_composite,
            corroboration: tawatur.status,
            defects: &defects,
            coi_cap: coi.cap,
            has_primary_anchor: anchor.is_some(),
        });
        let replayed = composition.trail.replay()?;
        debug_assert_eq!(replayed, composition.grade);

        // 9. Identify the outcome
        let digest = uuid::Uuid::new_v5(
            &SANAD_ID_NAMESPACE,
            &serde_json::to_vec(&(snapshot, &self.config))?,
        );
        let sanad_id = SanadId::derive(claim_id, &digest.to_string());

        let result = SanadGradeResult {
            sanad_id,
            claim_id,
            grade: replayed,
            source_tier: anchor.as_ref().map(|a| a.item.source_tier()),
            source_tier_floor: tier_floor,
            dabt_composite,
            dabt_band: DabtScorer::band(dabt_composite),
            corroboration_status: tawatur.status,
            independent_clusters: tawatur.independent_clusters(),
            collusion_risk: tawatur.collusion_risk,
            anomaly,
            coi_evaluations: coi.evaluations,
            defects,
            ledger: ledger.into_entries(),
            explanation_trail: composition.trail,
            materiality: claim.materiality,
            lineage: claim.lineage,
            auto_regrade_eligible: claim.lineage == sanad_domain::Lineage::Primary,
        };

        tracing::info!(
            claim_id = %claim_id,
            grade = %result.grade,
            defects = result.defects.len(),
            corroboration = %result.corroboration_status,
            stop = result.triggers_stop(),
            "Claim graded"
        );

        Ok(Sanad::new(chain, result))
    }

    fn reject(&self, snapshot: &ClaimSnapshot, error: InvalidInputError) -> InvalidInputError {
        tracing::warn!(claim_id = %snapshot.claim.claim_id, %error, "Snapshot rejected");
        error
    }

    /// Best primary-eligible item: best tier, then best Dabt, then lowest id
    fn anchor<'a>(&self, primary: &[&'a EvidenceItem]) -> Option<Anchor<'a>> {
        primary
            .iter()
            .copied()
            .filter(|item| item.source_tier().is_primary_eligible())
            .map(|item| Anchor {
                item,
                score: self.dabt.score(item),
            })
            .min_by(|a, b| {
                a.item
                    .source_tier()
                    .cmp(&b.item.source_tier())
                    .then_with(|| b.score.composite.total_cmp(&a.score.composite))
                    .then_with(|| a.item.evidence_id().cmp(b.item.evidence_id()))
            })
    }

    fn base_grade(
        &self,
        anchor: Option<&Anchor<'_>>,
        items: &[EvidenceItem],
        chain: &TransmissionChain,
    ) -> (Grade, String) {
        match self.config.base_grade_policy {
            BaseGradePolicy::TierFloor => {
                let anchored = anchor.and_then(|a| a.item.source_tier().grade_floor().map(|g| (a, g)));
                match anchored {
                    Some((a, floor)) => (
                        floor,
                        format!(
                            "Anchoring evidence '{}' is {}; floor {}",
                            a.item.evidence_id(),
                            a.item.source_tier(),
                            floor
                        ),
                    ),
                    None => (Grade::D, "No primary-eligible evidence; floor D".to_string()),
                }
            }
            BaseGradePolicy::ChainMinimum => {
                let consumed: BTreeSet<&str> = chain
                    .nodes()
                    .iter()
                    .flat_map(|n| n.evidence_inputs())
                    .collect();
                let worst: Option<SourceTier> = items
                    .iter()
                    .filter(|i| consumed.contains(i.evidence_id()))
                    .map(|i| i.source_tier())
                    .filter(|t| t.is_primary_eligible())
                    .max();
                match worst.and_then(|t| t.grade_floor().map(|g| (t, g))) {
                    Some((tier, floor)) => (
                        floor,
                        format!("Weakest primary-eligible source in the chain is {}; floor {}", tier, floor),
                    ),
                    None => (Grade::D, "No primary-eligible evidence in the chain; floor D".to_string()),
                }
            }
        }
    }
}

/// Evidence consumed by root nodes; all evidence if roots consume none
fn primary_evidence<'a>(items: &'a [EvidenceItem], chain: &TransmissionChain) -> Vec<&'a EvidenceItem> {
    let rooted: BTreeSet<&str> = chain
        .roots()
        .into_iter()
        .flat_map(|idx| chain.node(idx).evidence_inputs())
        .collect();

    let primary: Vec<&EvidenceItem> = items
        .iter()
        .filter(|i| rooted.contains(i.evidence_id()))
        .collect();
    if primary.is_empty() {
        items.iter().collect()
    } else {
        primary
    }
}
