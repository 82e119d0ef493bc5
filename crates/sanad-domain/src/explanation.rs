//! Explanation trail - the append-only record of why a claim got its grade

use crate::Grade;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Composition rule that produced a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleId {
    /// Starting grade from the source tier
    TierFloor,
    /// Data-quality cap
    DabtCap,
    /// FATAL defect pins the grade to D
    FatalShortCircuit,
    /// One MAJOR defect, one level down
    MajorDowngrade,
    /// Conflict-of-interest cap
    CoiCap,
    /// Mutawatir corroboration, one level up
    MutawatirUpgrade,
}

impl RuleId {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::TierFloor => "TIER_FLOOR",
            RuleId::DabtCap => "DABT_CAP",
            RuleId::FatalShortCircuit => "FATAL_SHORT_CIRCUIT",
            RuleId::MajorDowngrade => "MAJOR_DOWNGRADE",
            RuleId::CoiCap => "COI_CAP",
            RuleId::MutawatirUpgrade => "MUTAWATIR_UPGRADE",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable step of the trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationStep {
    /// Rule applied
    pub rule_id: RuleId,
    /// Grade entering the step
    pub grade_before: Grade,
    /// Grade leaving the step
    pub grade_after: Grade,
    /// Why
    pub rationale: String,
}

impl ExplanationStep {
    /// Whether the step changed the grade
    pub fn changed(&self) -> bool {
        self.grade_before != self.grade_after
    }
}

/// A trail that does not reconstruct a grade
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrailError {
    /// No steps at all
    #[error("Explanation trail is empty")]
    Empty,

    /// The first step is not the tier floor
    #[error("Explanation trail must start with TIER_FLOOR, found {0}")]
    MissingFloor(RuleId),

    /// A step does not continue from the previous one
    #[error("Step {index} starts at {found} but the previous step ended at {expected}")]
    Discontinuous {
        /// Position of the offending step
        index: usize,
        /// Grade the previous step ended at
        expected: Grade,
        /// Grade the step claims to start at
        found: Grade,
    },
}

/// Append-only sequence of explanation steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExplanationTrail(Vec<ExplanationStep>);

impl ExplanationTrail {
    /// An empty trail
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a step
    pub fn push(&mut self, step: ExplanationStep) {
        self.0.push(step);
    }

    /// Steps in order
    pub fn steps(&self) -> &[ExplanationStep] {
        &self.0
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the trail has no steps
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Grade the trail ends at, if any
    pub fn final_grade(&self) -> Option<Grade> {
        self.0.last().map(|s| s.grade_after)
    }

    /// Reconstruct the final grade from the tier floor
    ///
    /// # Errors
    /// Fails if the trail is empty, does not start at `TIER_FLOOR`, or if a
    /// step does not begin where the previous one ended.
    pub fn replay(&self) -> Result<Grade, TrailError> {
        let first = self.0.first().ok_or(TrailError::Empty)?;
        if first.rule_id != RuleId::TierFloor {
            return Err(TrailError::MissingFloor(first.rule_id));
        }
        let mut grade = first.grade_after;
        for (index, step) in self.0.iter().enumerate().skip(1) {
            if step.grade_before != grade {
                return Err(TrailError::Discontinuous {
                    index,
                    expected: grade,
                    found: step.grade_before,
                });
            }
            grade = step.grade_after;
        }
        Ok(grade)
    }
}
