//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Engine configuration rejected
    #[error("Engine configuration error: {0}")]
    EngineConfig(#[from] sanad_engine::ConfigError),

    /// Grading refused a snapshot
    #[error("Grading error: {0}")]
    Grading(#[from] sanad_engine::GradingError),

    /// Ledger refused a disposition
    #[error("Ledger error: {0}")]
    Ledger(#[from] sanad_engine::LedgerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Background grading task failed
    #[error("Grading task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
