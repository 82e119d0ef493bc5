//! Trait definitions for external interactions
//!
//! The engine never persists anything. Grading outcomes and ledger events
//! are handed to an audit collaborator implemented outside this crate.

use crate::{LedgerEntry, SanadGradeResult};
use serde::{Deserialize, Serialize};

/// One record handed to the audit collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditRecord {
    /// A claim was graded
    Graded {
        /// The complete grading outcome
        result: Box<SanadGradeResult>,
    },
    /// A defect ledger changed
    Disposition {
        /// The appended ledger entry
        entry: LedgerEntry,
    },
}

/// Sink for audit records
///
/// Implemented by the host (the CLI writes JSON lines)
pub trait AuditSink {
    /// Error type for sink operations
    type Error;

    /// Record one event
    fn record(&mut self, record: &AuditRecord) -> Result<(), Self::Error>;

    /// Flush buffered records
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Sink that keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Vec<AuditRecord>,
}

impl MemoryAuditSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Records received so far
    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }
}

impl AuditSink for MemoryAuditSink {
    type Error = std::convert::Infallible;

    fn record(&mut self, record: &AuditRecord) -> Result<(), Self::Error> {
        self.records.push(record.clone());
        Ok(())
    }
}
