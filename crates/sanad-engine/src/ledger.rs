//! Defect ledger
//!
//! Append-only: raising a defect and every cure or waiver each add one
//! entry. Existing entries are never rewritten; the current status of a
//! defect is the result of replaying its entries.

use crate::{LedgerError, WaiverAuthorizationError};
use sanad_domain::{
    ClaimId, Defect, DefectId, DefectStatus, Disposition, DispositionAction, LedgerEntry,
    LedgerEvent, SanadGradeResult,
};
use serde::{Deserialize, Serialize};

/// Structured defects of one claim with their disposition history
///
/// The entries are the only state. Defects and their statuses are derived
/// from them on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectLedger {
    claim_id: ClaimId,
    entries: Vec<LedgerEntry>,
}

impl DefectLedger {
    /// An empty ledger
    pub fn new(claim_id: ClaimId) -> Self {
        Self {
            claim_id,
            entries: Vec::new(),
        }
    }

    /// Reopen the ledger of a grading outcome
    ///
    /// Every entry of the result is kept, so dispositions applied while
    /// grading keep their actor and reason.
    pub fn from_result(result: &SanadGradeResult) -> Self {
        Self {
            claim_id: result.claim_id,
            entries: result.ledger.clone(),
        }
    }

    /// Claim the ledger belongs to
    pub fn claim_id(&self) -> ClaimId {
        self.claim_id
    }

    /// Record a newly found defect
    ///
    /// Returns `false` if a defect with the same id is already recorded.
    pub fn raise(&mut self, defect: Defect) -> bool {
        if self.raised(defect.defect_id).is_some() {
            return false;
        }
        self.entries.push(LedgerEntry {
            sequence: self.entries.len() as u64,
            defect_id: defect.defect_id,
            event: LedgerEvent::Raised {
                defect: Defect {
                    status: DefectStatus::Open,
                    ..defect
                },
            },
        });
        true
    }

    /// Mark a defect CURED
    pub fn cure(
        &mut self,
        defect_id: DefectId,
        actor_id: &str,
        reason: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        self.dispose(defect_id, DispositionAction::Cure, actor_id, reason)
    }

    /// Mark a defect WAIVED
    pub fn waive(
        &mut self,
        defect_id: DefectId,
        actor_id: &str,
        reason: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        self.dispose(defect_id, DispositionAction::Waive, actor_id, reason)
    }

    /// Apply a recorded disposition
    pub fn apply(&mut self, disposition: &Disposition) -> Result<LedgerEntry, LedgerError> {
        self.dispose(
            disposition.defect_id,
            disposition.action,
            &disposition.actor_id,
            &disposition.reason,
        )
    }

    fn dispose(
        &mut self,
        defect_id: DefectId,
        action: DispositionAction,
        actor_id: &str,
        reason: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        let result = self.try_dispose(defect_id, action, actor_id, reason);
        if let Err(err) = &result {
            tracing::warn!(defect_id = %defect_id, ?action, error = %err, "Ledger transition refused");
        }
        result
    }

    fn try_dispose(
        &mut self,
        defect_id: DefectId,
        action: DispositionAction,
        actor_id: &str,
        reason: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        // 1. Accountability
        let actor_id = actor_id.trim();
        let reason = reason.trim();
        if actor_id.is_empty() {
            return Err(WaiverAuthorizationError::MissingActor.into());
        }
        if reason.is_empty() {
            return Err(WaiverAuthorizationError::MissingReason.into());
        }

        // 2. Existence
        let from = self
            .status(defect_id)
            .ok_or(LedgerError::UnknownDefect(defect_id))?;

        // 3. State machine
        let to = from
            .transition(action)
            .map_err(WaiverAuthorizationError::NotOpen)?;

        let entry = LedgerEntry {
            sequence: self.entries.len() as u64,
            defect_id,
            event: LedgerEvent::Disposed {
                action,
                from,
                to,
                actor_id: actor_id.to_string(),
                reason: reason.to_string(),
            },
        };
        self.entries.push(entry.clone());
        tracing::info!(defect_id = %defect_id, from = %from, to = %to, actor = actor_id, "Defect disposed");
        Ok(entry)
    }

    fn raised(&self, defect_id: DefectId) -> Option<&Defect> {
        self.entries.iter().find_map(|entry| match &entry.event {
            LedgerEvent::Raised { defect } if entry.defect_id == defect_id => Some(defect),
            _ => None,
        })
    }

    /// Current status of a defect, from replaying its entries
    pub fn status(&self, defect_id: DefectId) -> Option<DefectStatus> {
        self.raised(defect_id)?;
        let status = self
            .entries
            .iter()
            .filter(|entry| entry.defect_id == defect_id)
            .fold(DefectStatus::Open, |status, entry| match entry.event {
                LedgerEvent::Disposed { to, .. } => to,
                LedgerEvent::Raised { .. } => status,
            });
        Some(status)
    }

    /// Look up a defect with its current status
    pub fn get(&self, defect_id: DefectId) -> Option<Defect> {
        let status = self.status(defect_id)?;
        self.raised(defect_id).map(|defect| Defect {
            status,
            ..defect.clone()
        })
    }

    /// Defects in the order they were raised, with their current status
    pub fn defects(&self) -> Vec<Defect> {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.event, LedgerEvent::Raised { .. }))
            .filter_map(|entry| self.get(entry.defect_id))
            .collect()
    }

    /// Every entry, oldest first
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Consume the ledger, keeping its entries
    pub fn into_entries(self) -> Vec<LedgerEntry> {
        self.entries
    }
}
