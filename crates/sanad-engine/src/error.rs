//! Engine error types

use sanad_domain::{ChainBuildError, DefectId, SourceDescriptor, TrailError, TransitionError};
use thiserror::Error;

/// Snapshot rejected before any grading happened
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInputError {
    /// Claim id is the nil UUID
    #[error("Claim id must not be nil")]
    NilClaimId,

    /// Claim has no metric key
    #[error("Claim {0} has an empty metric key")]
    EmptyMetricKey(String),

    /// Evidence at a position has no id
    #[error("Evidence at position {0} has an empty id")]
    EmptyEvidenceId(usize),

    /// Two evidence records share an id
    #[error("Duplicate evidence id: {0}")]
    DuplicateEvidenceId(String),

    /// No row of the tier table matches the descriptor
    #[error("Unrecognized source descriptor: {0}")]
    UnknownSource(SourceDescriptor),

    /// A value is NaN or infinite
    #[error("Non-finite value in {0}")]
    NonFiniteValue(String),

    /// A peer value has no id, or two share one
    #[error("Invalid peer id: '{0}'")]
    InvalidPeerId(String),

    /// A prior disposition lacks an actor or reason
    #[error("Disposition for defect {0} has no actor or reason")]
    IncompleteDisposition(DefectId),

    /// Chain nodes cannot be arranged into an arena
    #[error("Malformed transmission chain: {0}")]
    MalformedChain(#[from] ChainBuildError),
}

/// Errors returned by [`crate::SanadEngine::grade`]
#[derive(Error, Debug)]
pub enum GradingError {
    /// Snapshot rejected; no result produced
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Snapshot could not be serialized for the sanad id
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The composed trail does not reproduce the grade
    #[error("Explanation trail error: {0}")]
    Trail(#[from] TrailError),
}

/// Cure or waive refused; the ledger is left unchanged
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaiverAuthorizationError {
    /// Actor id is empty
    #[error("An actor id is required")]
    MissingActor,

    /// Reason is empty
    #[error("A reason is required")]
    MissingReason,

    /// Defect is no longer OPEN
    #[error("{0}")]
    NotOpen(#[from] TransitionError),
}

/// Errors that can occur during ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Missing actor or reason, or the defect is not OPEN
    #[error("Authorization error: {0}")]
    Authorization(#[from] WaiverAuthorizationError),

    /// Defect not in this ledger
    #[error("Unknown defect: {0}")]
    UnknownDefect(DefectId),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to render TOML
    #[error("Failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for grading operations
pub type Result<T> = std::result::Result<T, GradingError>;
