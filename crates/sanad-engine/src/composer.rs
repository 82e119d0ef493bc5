//! Grade composition
//!
//! Folds the component outcomes into a grade in a fixed order, appending
//! one explanation step per rule:
//!
//! 1. Tier floor
//! 2. Dabt cap (composite below threshold caps at B)
//! 3. FATAL short-circuit (pins to D and stops)
//! 4. One downgrade per MAJOR defect, in detection order
//! 5. COI cap
//! 6. MUTAWATIR upgrade, bounded by every active cap
//!
//! A FATAL defect pins D whatever its status; a waiver or cure is recorded
//! in the trail but does not lift the pin. Cured or waived MAJOR defects no
//! longer count. MINOR defects never change the grade.

use crate::coi::COI_CAP;
use crate::dabt::{DabtScorer, DABT_CAP_THRESHOLD};
use sanad_domain::{
    CorroborationStatus, Defect, ExplanationStep, ExplanationTrail, Grade, RuleId, Severity,
};

/// Grade the Dabt cap limits a claim to
pub const DABT_CAP: Grade = Grade::B;

/// Everything the composer needs, already computed
#[derive(Debug, Clone)]
pub struct CompositionInput<'a> {
    /// Starting grade
    pub tier_floor: Grade,
    /// Why the floor is what it is
    pub floor_rationale: String,
    /// Composite Dabt score of the anchoring evidence
    pub dabt_composite: f64,
    /// Corroboration status
    pub corroboration: CorroborationStatus,
    /// Defects in detection order, any status
    pub defects: &'a [Defect],
    /// Cap from an uncured conflict of interest
    pub coi_cap: Option<Grade>,
    /// Whether any primary-eligible evidence anchors the claim
    pub has_primary_anchor: bool,
}

/// Final grade with its trail
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Final grade
    pub grade: Grade,
    /// Steps from floor to final grade
    pub trail: ExplanationTrail,
}

/// Composes grades
#[derive(Debug, Clone, Default)]
pub struct GradeComposer;

struct Trail {
    grade: Grade,
    steps: ExplanationTrail,
}

impl Trail {
    fn apply(&mut self, rule_id: RuleId, grade_after: Grade, rationale: String) {
        tracing::debug!(rule = %rule_id, before = %self.grade, after = %grade_after, "{}", rationale);
        self.steps.push(ExplanationStep {
            rule_id,
            grade_before: self.grade,
            grade_after,
            rationale,
        });
        self.grade = grade_after;
    }

    fn finish(self) -> Composition {
        Composition {
            grade: self.grade,
            trail: self.steps,
        }
    }
}

impl GradeComposer {
    /// Create a composer
    pub fn new() -> Self {
        Self
    }

    /// Compose the grade
    pub fn compose(&self, input: &CompositionInput<'_>) -> Composition {
        let mut trail = Trail {
            grade: input.tier_floor,
            steps: ExplanationTrail::new(),
        };

        // 1. Tier floor
        trail.apply(RuleId::TierFloor, input.tier_floor, input.floor_rationale.clone());

        // 2. Dabt cap
        let dabt_capped = DabtScorer::caps_grade(input.dabt_composite);
        if dabt_capped {
            let after = trail.grade.min(DABT_CAP);
            trail.apply(
                RuleId::DabtCap,
                after,
                format!(
                    "Dabt composite {:.2} below {:.2}; grade capped at {}",
                    input.dabt_composite, DABT_CAP_THRESHOLD, DABT_CAP
                ),
            );
        } else {
            let grade = trail.grade;
            trail.apply(
                RuleId::DabtCap,
                grade,
                format!(
                    "Dabt composite {:.2} meets {:.2}; no cap",
                    input.dabt_composite, DABT_CAP_THRESHOLD
                ),
            );
        }

        // 3. FATAL short-circuit, whatever the status
        let fatal: Vec<&Defect> = input
            .defects
            .iter()
            .filter(|d| d.severity == Severity::Fatal)
            .collect();
        if !fatal.is_empty() {
            let findings: Vec<String> = fatal
                .iter()
                .map(|d| format!("{} ({})", d.kind, d.status))
                .collect();
            trail.apply(
                RuleId::FatalShortCircuit,
                Grade::D,
                format!("{} FATAL defect(s): {}", fatal.len(), findings.join(", ")),
            );
            return trail.finish();
        }

        // 4. MAJOR downgrades
        let major: Vec<&Defect> = input
            .defects
            .iter()
            .filter(|d| d.is_open() && d.severity == Severity::Major)
            .collect();
        for defect in &major {
            let after = trail.grade.downgrade();
            trail.apply(
                RuleId::MajorDowngrade,
                after,
                format!("MAJOR {}: {}", defect.kind, defect.description),
            );
        }

        // 5. COI cap
        match input.coi_cap {
            Some(cap) => {
                let after = trail.grade.min(cap);
                let rationale = if trail.grade.is_at_or_below(cap) {
                    format!("Uncured conflict of interest; already at or below {}", cap)
                } else {
                    format!("Uncured conflict of interest; grade capped at {}", cap)
                };
                trail.apply(RuleId::CoiCap, after, rationale);
            }
            None => {
                let grade = trail.grade;
                trail.apply(RuleId::CoiCap, grade, "No uncured conflict of interest".to_string());
            }
        }

        // 6. MUTAWATIR upgrade
        let grade = trail.grade;
        if !input.corroboration.allows_upgrade() {
            trail.apply(
                RuleId::MutawatirUpgrade,
                grade,
                format!("Corroboration {}; no upgrade", input.corroboration),
            );
        } else if !major.is_empty() {
            trail.apply(
                RuleId::MutawatirUpgrade,
                grade,
                format!("MUTAWATIR, but {} MAJOR defect(s) outstanding; no upgrade", major.len()),
            );
        } else if !input.has_primary_anchor {
            trail.apply(
                RuleId::MutawatirUpgrade,
                grade,
                "MUTAWATIR, but no primary-eligible source; no upgrade".to_string(),
            );
        } else {
            let mut ceiling = Grade::A;
            if dabt_capped {
                ceiling = ceiling.min(DABT_CAP);
            }
            if input.coi_cap.is_some() {
                ceiling = ceiling.min(COI_CAP);
            }
            let after = grade.upgrade().min(ceiling).max(grade);
            let rationale = if after == grade {
                format!("MUTAWATIR; upgrade held at {} by an active cap", grade)
            } else {
                format!("MUTAWATIR with no MAJOR or FATAL defect; upgraded to {}", after)
            };
            trail.apply(RuleId::MutawatirUpgrade, after, rationale);
        }

        trail.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sanad_domain::{ClaimId, DefectKind, DefectStatus};

    fn defect(kind: DefectKind, locus: &str) -> Defect {
        Defect::open(ClaimId::from_value(1), kind, locus, "finding")
    }

    fn input<'a>(
        floor: Grade,
        dabt: f64,
        corroboration: CorroborationStatus,
        defects: &'a [Defect],
    ) -> CompositionInput<'a> {
        CompositionInput {
            tier_floor: floor,
            floor_rationale: "floor".to_string(),
            dabt_composite: dabt,
            corroboration,
            defects,
            coi_cap: None,
            has_primary_anchor: true,
        }
    }

    fn compose(input: &CompositionInput<'_>) -> Composition {
        let composition = GradeComposer::default().compose(input);
        assert_eq!(composition.trail.replay(), Ok(composition.grade));
        composition
    }

    #[test]
    fn test_mutawatir_upgrades() {
        let c = compose(&input(Grade::B, 0.9, CorroborationStatus::Mutawatir, &[]));
        assert_eq!(c.grade, Grade::A);
        assert_eq!(c.trail.len(), 4);
    }

    #[test]
    fn test_major_downgrades_in_order() {
        let defects = vec![
            defect(DefectKind::Inconsistency, "a"),
            defect(DefectKind::StaleSource, "b"),
        ];
        let c = compose(&input(Grade::B, 0.9, CorroborationStatus::Ahad2, &defects));
        assert_eq!(c.grade, Grade::D);
        let majors: Vec<_> = c
            .trail
            .steps()
            .iter()
            .filter(|s| s.rule_id == RuleId::MajorDowngrade)
            .map(|s| (s.grade_before, s.grade_after))
            .collect();
        assert_eq!(majors, vec![(Grade::B, Grade::C), (Grade::C, Grade::D)]);
    }

    #[test]
    fn test_fatal_short_circuits() {
        let defects = vec![defect(DefectKind::BrokenChain, "x")];
        let c = compose(&input(Grade::B, 0.9, CorroborationStatus::Mutawatir, &defects));
        assert_eq!(c.grade, Grade::D);
        assert_eq!(c.trail.steps().last().map(|s| s.rule_id), Some(RuleId::FatalShortCircuit));
    }

    #[test]
    fn test_dabt_cap() {
        let c = compose(&input(Grade::A, 0.40, CorroborationStatus::Ahad1, &[]));
        assert_eq!(c.grade, Grade::B);
    }

    #[test]
    fn test_upgrade_never_breaks_dabt_cap() {
        let c = compose(&input(Grade::A, 0.40, CorroborationStatus::Mutawatir, &[]));
        assert_eq!(c.grade, Grade::B);
    }

    #[test]
    fn test_coi_cap_bounds_upgrade() {
        let mut i = input(Grade::B, 0.9, CorroborationStatus::Mutawatir, &[]);
        i.coi_cap = Some(Grade::C);
        let c = compose(&i);
        assert_eq!(c.grade, Grade::C);
    }

    #[test]
    fn test_coi_cap_below_floor_is_noop() {
        let mut i = input(Grade::D, 0.9, CorroborationStatus::Ahad1, &[]);
        i.coi_cap = Some(Grade::C);
        assert_eq!(compose(&i).grade, Grade::D);
    }

    #[test]
    fn test_disposed_major_ignored() {
        let mut major = defect(DefectKind::Anomaly, "y");
        major.status = DefectStatus::Cured;
        let defects = vec![major];
        let c = compose(&input(Grade::B, 0.9, CorroborationStatus::Mutawatir, &defects));
        assert_eq!(c.grade, Grade::A);
    }

    #[test]
    fn test_waived_fatal_still_pins_d() {
        let mut fatal = defect(DefectKind::BrokenChain, "x");
        fatal.status = DefectStatus::Waived;
        let defects = vec![fatal];
        let c = compose(&input(Grade::A, 0.9, CorroborationStatus::Mutawatir, &defects));
        assert_eq!(c.grade, Grade::D);
        let last = c.trail.steps().last().unwrap();
        assert_eq!(last.rule_id, RuleId::FatalShortCircuit);
        assert!(last.rationale.contains("BROKEN_CHAIN (WAIVED)"));
    }

    #[test]
    fn test_minor_never_changes_grade() {
        let defects = vec![defect(DefectKind::MissingMetadata, "m")];
        let c = compose(&input(Grade::C, 0.9, CorroborationStatus::Ahad1, &defects));
        assert_eq!(c.grade, Grade::C);
        let with_upgrade = compose(&input(Grade::C, 0.9, CorroborationStatus::Mutawatir, &defects));
        assert_eq!(with_upgrade.grade, Grade::B);
    }

    #[test]
    fn test_no_anchor_blocks_upgrade() {
        let mut i = input(Grade::D, 0.9, CorroborationStatus::Mutawatir, &[]);
        i.has_primary_anchor = false;
        assert_eq!(compose(&i).grade, Grade::D);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use sanad_domain::{ClaimId, DefectKind, DefectStatus};

    fn arb_grade() -> impl Strategy<Value = Grade> {
        prop::sample::select(Grade::ALL.to_vec())
    }

    fn arb_status() -> impl Strategy<Value = CorroborationStatus> {
        prop::sample::select(vec![
            CorroborationStatus::None,
            CorroborationStatus::Ahad1,
            CorroborationStatus::Ahad2,
            CorroborationStatus::Mutawatir,
        ])
    }

    fn arb_defects() -> impl Strategy<Value = Vec<Defect>> {
        prop::collection::vec(prop::sample::select(DefectKind::ALL.to_vec()), 0..6).prop_map(|kinds| {
            kinds
                .into_iter()
                .enumerate()
                .map(|(i, k)| Defect::open(ClaimId::from_value(5), k, &i.to_string(), "generated"))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_trail_replays(
            floor in arb_grade(),
            dabt in 0.0f64..1.0,
            status in arb_status(),
            defects in arb_defects(),
            coi in any::<bool>(),
        ) {
            let input = CompositionInput {
                tier_floor: floor,
                floor_rationale: String::new(),
                dabt_composite: dabt,
                corroboration: status,
                defects: &defects,
                coi_cap: if coi { Some(COI_CAP) } else { None },
                has_primary_anchor: true,
            };
            let c = GradeComposer::default().compose(&input);
            prop_assert_eq!(c.trail.replay(), Ok(c.grade));
        }

        #[test]
        fn prop_fatal_dominates(
            floor in arb_grade(),
            dabt in 0.0f64..1.0,
            status in arb_status(),
            mut defects in arb_defects(),
            fatal_status in prop::sample::select(vec![
                DefectStatus::Open,
                DefectStatus::Cured,
                DefectStatus::Waived,
            ]),
        ) {
            let mut fatal = Defect::open(ClaimId::from_value(5), DefectKind::ChainGrafting, "fatal", "generated");
            fatal.status = fatal_status;
            defects.push(fatal);
            let input = CompositionInput {
                tier_floor: floor,
                floor_rationale: String::new(),
                dabt_composite: dabt,
                corroboration: status,
                defects: &defects,
                coi_cap: None,
                has_primary_anchor: true,
            };
            prop_assert_eq!(GradeComposer::default().compose(&input).grade, Grade::D);
        }

        #[test]
        fn prop_adding_major_never_raises(
            floor in arb_grade(),
            dabt in 0.0f64..1.0,
            status in arb_status(),
            defects in arb_defects(),
        ) {
            let base = CompositionInput {
                tier_floor: floor,
                floor_rationale: String::new(),
                dabt_composite: dabt,
                corroboration: status,
                defects: &defects,
                coi_cap: None,
                has_primary_anchor: true,
            };
            let before = GradeComposer::default().compose(&base).grade;

            let mut more = defects.clone();
            more.push(Defect::open(ClaimId::from_value(5), DefectKind::Inconsistency, "extra", "generated"));
            let after = GradeComposer::default().compose(&CompositionInput { defects: &more, ..base.clone() }).grade;
            prop_assert!(after <= before);
        }

        #[test]
        fn prop_upgrade_only_with_mutawatir(
            floor in arb_grade(),
            dabt in 0.0f64..1.0,
            status in arb_status(),
            defects in arb_defects(),
        ) {
            let input = CompositionInput {
                tier_floor: floor,
                floor_rationale: String::new(),
                dabt_composite: dabt,
                corroboration: status,
                defects: &defects,
                coi_cap: None,
                has_primary_anchor: true,
            };
            let grade = GradeComposer::default().compose(&input).grade;
            if grade > floor {
                prop_assert_eq!(status, CorroborationStatus::Mutawatir);
                prop_assert!(!defects.iter().any(|d| d.severity >= Severity::Major));
            }
        }
    }
}
