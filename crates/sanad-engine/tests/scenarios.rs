//! End-to-end grading scenarios
//!
//! Each scenario grades a full snapshot unless the combination cannot be
//! produced from evidence, in which case it drives the composer directly.

mod common;

use common::*;
use sanad_domain::{
    AnomalyOutcome, ClaimSnapshot, CorroborationStatus, DabtBand, DabtInputs, DefectKind,
    DefectStatus, Disposition, DispositionAction, DocumentationFacts, EvidenceRecord,
    FidelityFacts, Grade, LedgerEvent, MetricValue, OutputRef, PeerValue, PreparerFacts,
    PreparerKind, RuleId, Severity, SourceTier, VerificationStatus,
};
use sanad_engine::{CompositionInput, EngineConfig, GradeComposer, SanadEngine};

fn engine() -> SanadEngine {
    SanadEngine::new(EngineConfig::default()).unwrap()
}

#[test]
fn test_tier2_mutawatir_no_defects_upgrades_to_a() {
    let result = engine().grade(&mutawatir_tier2_snapshot()).unwrap();

    assert_eq!(result.source_tier, Some(SourceTier::Tier2));
    assert_eq!(result.source_tier_floor, Grade::B);
    assert_eq!(result.corroboration_status, CorroborationStatus::Mutawatir);
    assert_eq!(result.independent_clusters, 3);
    assert!(result.defects.is_empty());
    assert_eq!(result.grade, Grade::A);

    let last = result.explanation_trail.steps().last().unwrap();
    assert_eq!(last.rule_id, RuleId::MutawatirUpgrade);
    assert_eq!((last.grade_before, last.grade_after), (Grade::B, Grade::A));
}

#[test]
fn test_tier1_single_source_with_major_inconsistency_is_b() {
    let snapshot = ClaimSnapshot::new(
        claim(),
        vec![record("fs", "auditor", "audited_financial_statement", T0)],
    )
    .with_chain(linear_chain(&["fs"]))
    .with_reported_defect(report(
        DefectKind::Inconsistency,
        "fs",
        "Segment totals do not sum to reported revenue",
    ));

    let result = engine().grade(&snapshot).unwrap();

    assert_eq!(result.source_tier_floor, Grade::A);
    assert_eq!(result.corroboration_status, CorroborationStatus::Ahad1);
    assert_eq!(result.defects.len(), 1);
    assert_eq!(result.defects[0].severity, Severity::Major);
    assert_eq!(result.grade, Grade::B);
}

#[test]
fn test_fatal_broken_chain_pins_d_despite_mutawatir() {
    let mut snapshot = mutawatir_tier2_snapshot();
    // Terminal node no longer produces the claim
    snapshot.chain[1].output = OutputRef::Value("revenue.arr/draft".into());

    let result = engine().grade(&snapshot).unwrap();

    assert_eq!(result.corroboration_status, CorroborationStatus::Mutawatir);
    assert!(result.has_open_fatal());
    assert_eq!(result.defects[0].kind, DefectKind::BrokenChain);
    assert_eq!(result.grade, Grade::D);
    assert!(result.triggers_stop());

    let last = result.explanation_trail.steps().last().unwrap();
    assert_eq!(last.rule_id, RuleId::FatalShortCircuit);
}

#[test]
fn test_tier3_floor_without_corroboration_stays_c() {
    // NONE means no evidence at all, which leaves no Tier 3 anchor; compose directly
    let composition = GradeComposer::default().compose(&CompositionInput {
        tier_floor: Grade::C,
        floor_rationale: "Anchoring evidence is TIER3".to_string(),
        dabt_composite: 0.9,
        corroboration: CorroborationStatus::None,
        defects: &[],
        coi_cap: None,
        has_primary_anchor: true,
    });

    assert_eq!(composition.grade, Grade::C);
    assert_eq!(composition.trail.replay(), Ok(Grade::C));
}

#[test]
fn test_tier2_ahad2_two_majors_falls_to_d() {
    let anchor = record("gl", "netsuite", "general_ledger", T0);
    let snapshot = ClaimSnapshot::new(claim(), corroborated(anchor, 1))
        .with_chain(linear_chain(&["gl"]))
        .with_reported_defect(report(DefectKind::Inconsistency, "gl", "Ledger and export disagree"))
        .with_reported_defect(report(DefectKind::StaleSource, "gl", "Ledger export predates close"));

    let result = engine().grade(&snapshot).unwrap();

    assert_eq!(result.corroboration_status, CorroborationStatus::Ahad2);
    let grades: Vec<(Grade, Grade)> = result
        .explanation_trail
        .steps()
        .iter()
        .filter(|s| s.rule_id == RuleId::MajorDowngrade)
        .map(|s| (s.grade_before, s.grade_after))
        .collect();
    assert_eq!(grades, vec![(Grade::B, Grade::C), (Grade::C, Grade::D)]);
    assert_eq!(result.grade, Grade::D);
}

#[test]
fn test_poor_dabt_caps_before_upgrade() {
    let retrieved = T0;
    let poor = DabtInputs {
        documentation: Some(DocumentationFacts {
            fields_expected: 10,
            fields_present: 0,
            citation_locator: true,
        }),
        fidelity: Some(FidelityFacts {
            transform_steps: 2,
            lossy_steps: 0,
        }),
        // 474 days stale: 40% temporal credit at the default 90/730 day window
        fact_time: Some(retrieved - 474 * 86_400),
        preparer: Some(PreparerFacts {
            kind: PreparerKind::Management,
            prior_errors: 0,
        }),
    };
    let anchor = EvidenceRecord::new(
        "fs",
        "auditor",
        "audited_financial_statement",
        "origin-fs",
        "fs.pdf",
        retrieved,
        VerificationStatus::Unverified,
    )
    .with_quality(poor);
    let snapshot =
        ClaimSnapshot::new(claim(), corroborated(anchor, 2)).with_chain(linear_chain(&["fs"]));

    let result = engine().grade(&snapshot).unwrap();

    assert!((result.dabt_composite - 0.40).abs() < 1e-9);
    assert_eq!(result.dabt_band, DabtBand::Poor);
    assert!(result.defects.is_empty());
    assert_eq!(result.corroboration_status, CorroborationStatus::Mutawatir);
    assert_eq!(result.source_tier_floor, Grade::A);
    assert_eq!(result.grade, Grade::B);
}

#[test]
fn test_waived_fatal_still_pins_grade() {
    let mut snapshot = mutawatir_tier2_snapshot();
    snapshot.chain[1].output = OutputRef::Value("revenue.arr/draft".into());
    let first = engine().grade(&snapshot).unwrap();
    let fatal = first.defects[0].defect_id;
    assert!(first.triggers_stop());

    let snapshot = snapshot.with_disposition(Disposition {
        defect_id: fatal,
        action: DispositionAction::Waive,
        actor_id: "partner:bo".to_string(),
        reason: "Draft label only; value matches the filed ledger".to_string(),
    });
    let second = engine().grade(&snapshot).unwrap();

    assert_eq!(second.defects[0].defect_id, fatal);
    assert_eq!(second.defects[0].status, DefectStatus::Waived);
    assert!(second.has_fatal());
    assert_eq!(second.grade, Grade::D);
    // The waiver clears the stop, not the pin
    assert!(!second.triggers_stop());

    let last = second.explanation_trail.steps().last().unwrap();
    assert_eq!(last.rule_id, RuleId::FatalShortCircuit);
    assert!(last.rationale.contains("WAIVED"));
    assert!(second.ledger.iter().any(|e| matches!(
        &e.event,
        LedgerEvent::Disposed { actor_id, .. } if actor_id == "partner:bo"
    )));
    assert_ne!(first.sanad_id, second.sanad_id);
}

#[test]
fn test_presets_share_fixed_thresholds() {
    let strict = SanadEngine::new(EngineConfig::strict()).unwrap();
    let lenient = SanadEngine::new(EngineConfig::lenient()).unwrap();

    // Three independent clusters reach MUTAWATIR under every preset
    for engine in [&strict, &lenient] {
        let result = engine.grade(&mutawatir_tier2_snapshot()).unwrap();
        assert_eq!(result.corroboration_status, CorroborationStatus::Mutawatir);
        assert_eq!(result.grade, Grade::A);
    }

    // Dabt 0.55 is above the cap under every preset
    let mut anchor = record("fs", "data_room", "audited_financial_statement", T0);
    anchor = anchor.with_quality(DabtInputs {
        documentation: Some(DocumentationFacts {
            fields_expected: 10,
            fields_present: 0,
            citation_locator: true,
        }),
        fidelity: Some(FidelityFacts {
            transform_steps: 4,
            lossy_steps: 4,
        }),
        fact_time: Some(T0),
        preparer: Some(PreparerFacts {
            kind: PreparerKind::Management,
            prior_errors: 0,
        }),
    });
    let snapshot = ClaimSnapshot::new(claim(), vec![anchor]).with_chain(linear_chain(&["fs"]));
    for engine in [&engine(), &strict, &lenient] {
        let result = engine.grade(&snapshot).unwrap();
        assert!((result.dabt_composite - 0.55).abs() < 1e-9);
        assert_eq!(result.grade, Grade::A);
    }
}

#[test]
fn test_lower_tier_outlier_raises_anomaly() {
    let claim = claim().with_value(MetricValue::currency(12_400_000.0, "USD"));
    let anchor = record("deck", "company", "pitch_deck", T0)
        .with_value(MetricValue::currency(12_400_000.0, "USD"));
    let snapshot = ClaimSnapshot::new(claim, vec![anchor])
        .with_chain(linear_chain(&["deck"]))
        .with_peers(vec![
            PeerValue::new("audit", MetricValue::currency(9_800_000.0, "USD"), SourceTier::Tier1),
            PeerValue::new("bank", MetricValue::currency(9_810_000.0, "USD"), SourceTier::Tier1),
        ]);

    let result = engine().grade(&snapshot).unwrap();

    assert!(matches!(result.anomaly, AnomalyOutcome::Anomaly { .. }));
    assert!(result
        .defects
        .iter()
        .any(|d| d.kind == DefectKind::Anomaly && d.severity == Severity::Major));
    // Tier 4 floor D; a MAJOR downgrade stays at D
    assert_eq!(result.grade, Grade::D);
}

#[test]
fn test_rejected_snapshot_produces_no_result() {
    let snapshot = ClaimSnapshot::new(
        claim(),
        vec![record("x", "scanner", "unlabelled_scan", T0)],
    );
    assert!(engine().grade(&snapshot).is_err());
}

#[test]
fn test_missing_chain_is_fatal_not_rejected() {
    let snapshot = ClaimSnapshot::new(
        claim(),
        vec![record("fs", "auditor", "audited_financial_statement", T0)],
    );
    let result = engine().grade(&snapshot).unwrap();
    assert_eq!(result.grade, Grade::D);
    assert_eq!(result.defects.len(), 1);
    assert_eq!(result.defects[0].kind, DefectKind::BrokenChain);
}
