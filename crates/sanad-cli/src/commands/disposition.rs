//! Cure and waive command implementation.

use crate::audit::{record_to, JsonlAuditSink};
use crate::cli::DispositionArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use sanad_domain::{AuditRecord, AuditSink, DefectId, DispositionAction, LedgerEntry, SanadGradeResult};
use sanad_engine::DefectLedger;
use std::fs;
use std::path::Path;

/// Execute a cure or waive.
pub async fn execute_disposition(
    args: DispositionArgs,
    action: DispositionAction,
    formatter: &Formatter,
) -> Result<()> {
    let entry = dispose(&args, action)?;

    if let Some(path) = &args.audit_log {
        let mut sink = Some(JsonlAuditSink::open(path)?);
        record_to(&mut sink, &AuditRecord::Disposition { entry: entry.clone() })?;
        if let Some(sink) = sink.as_mut() {
            sink.flush()?;
        }
    }

    println!("{}", formatter.format_entry(&entry)?);
    Ok(())
}

/// Apply one disposition to a ledger file, returning the appended entry.
///
/// The ledger file is only rewritten when the ledger accepts the change.
pub fn dispose(args: &DispositionArgs, action: DispositionAction) -> Result<LedgerEntry> {
    let defect_id = DefectId::from_string(args.defect.trim()).map_err(CliError::InvalidInput)?;
    let mut ledger = load_ledger(&args.ledger, &args.result)?;

    let entry = match action {
        DispositionAction::Cure => ledger.cure(defect_id, &args.actor, &args.reason)?,
        DispositionAction::Waive => ledger.waive(defect_id, &args.actor, &args.reason)?,
    };

    fs::write(&args.ledger, serde_json::to_string_pretty(&ledger)?)?;
    Ok(entry)
}

/// Open a ledger file, seeding it from the grade result when absent.
pub fn load_ledger(ledger_path: &Path, result_path: &Path) -> Result<DefectLedger> {
    let result: SanadGradeResult = serde_json::from_str(&fs::read_to_string(result_path)?)?;

    if !ledger_path.exists() {
        return Ok(DefectLedger::from_result(&result));
    }
    let ledger: DefectLedger = serde_json::from_str(&fs::read_to_string(ledger_path)?)?;
    if ledger.claim_id() != result.claim_id {
        return Err(CliError::InvalidInput(format!(
            "Ledger belongs to claim {}, result to claim {}",
            ledger.claim_id(),
            result.claim_id
        )));
    }
    Ok(ledger)
}
