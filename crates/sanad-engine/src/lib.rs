//! Sanad Engine
//!
//! Grades claims by the strength of their evidence chain.
//!
//! The engine provides:
//! - Source tier classification against a configurable table
//! - Dabt (source precision) scoring
//! - Tawatur (independent corroboration) analysis
//! - Shudhudh (peer anomaly) and Ilal (hidden chain defect) detection
//! - Conflict-of-interest evaluation
//! - A disposition ledger and the final grade composition
//!
//! # Examples
//!
//! ```no_run
//! use sanad_engine::{EngineConfig, SanadEngine};
//!
//! let engine = SanadEngine::new(EngineConfig::strict()).unwrap();
//!
//! // Grade a claim snapshot loaded from disk
//! // let result = engine.grade(&snapshot)?;
//! ```

#![warn(missing_docs)]

mod classifier;
mod coi;
mod composer;
mod config;
mod dabt;
mod engine;
mod error;
mod ilal;
mod ledger;
mod shudhudh;
mod tawatur;
mod validation;

pub use classifier::{SourceTierClassifier, ANY_SYSTEM};
pub use coi::{COIEvaluator, COIOutcome, COI_CAP};
pub use composer::{Composition, CompositionInput, GradeComposer, DABT_CAP};
pub use config::{
    BaseGradePolicy, DabtConfig, EngineConfig, ShudhudhConfig, SourceRule, TawaturConfig,
    MAX_TEMPORAL_DAYS,
};
pub use dabt::{
    DabtDimension, DabtScore, DabtScorer, MissingDimensionError, DABT_CAP_THRESHOLD,
    EXCELLENT_THRESHOLD, FAIR_THRESHOLD, GOOD_THRESHOLD,
};
pub use engine::SanadEngine;
pub use error::{
    ConfigError, GradingError, InvalidInputError, LedgerError, Result, WaiverAuthorizationError,
};
pub use ilal::IlalDetector;
pub use ledger::DefectLedger;
pub use shudhudh::ShudhudhDetector;
pub use tawatur::{
    IndependenceKey, TawaturAnalyzer, TawaturAssessment, MUTAWATIR_MAX_COLLUSION_RISK,
    MUTAWATIR_MIN_CLUSTERS,
};
pub use validation::validate_snapshot;
