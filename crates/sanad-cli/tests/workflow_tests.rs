//! Integration tests for the grade → waive → regrade workflow
//!
//! These tests drive the command functions against files in a temp dir.

use sanad_cli::cli::DispositionArgs;
use sanad_cli::commands::disposition::{dispose, load_ledger};
use sanad_cli::commands::grade::{grade_file, result_path};
use sanad_cli::CliError;
use sanad_domain::{
    AuditRecord, AuditSink, ClaimSnapshot, DefectStatus, Disposition, DispositionAction, Grade,
    LedgerEvent, MemoryAuditSink, SanadGradeResult,
};
use sanad_engine::{LedgerError, SanadEngine, WaiverAuthorizationError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SNAPSHOT: &str = include_str!("fixtures/arr_snapshot.json");

fn setup() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arr.json");
    fs::write(&path, SNAPSHOT).unwrap();
    (dir, path)
}

fn write_result(snapshot: &Path) -> (SanadGradeResult, PathBuf) {
    let result = grade_file(&SanadEngine::default(), snapshot).unwrap();
    let path = result_path(snapshot);
    fs::write(&path, serde_json::to_string_pretty(&result).unwrap()).unwrap();
    (result, path)
}

fn args(dir: &Path, result: &Path, defect: String, reason: &str) -> DispositionArgs {
    DispositionArgs {
        result: result.to_path_buf(),
        ledger: dir.join("arr.ledger.json"),
        defect,
        actor: "partner:bo".to_string(),
        reason: reason.to_string(),
        audit_log: None,
    }
}

#[test]
fn test_grade_fixture() {
    let (_dir, path) = setup();
    let result = grade_file(&SanadEngine::default(), &path).unwrap();

    assert_eq!(result.source_tier_floor, Grade::A);
    assert_eq!(result.dabt_composite, 1.0);
    assert_eq!(result.defects.len(), 1);
    assert_eq!(result.grade, Grade::B);
    assert!(!result.triggers_stop());
}

#[test]
fn test_waive_then_regrade() {
    let (dir, path) = setup();
    let (result, result_file) = write_result(&path);
    let defect_id = result.defects[0].defect_id;

    let entry = dispose(
        &args(dir.path(), &result_file, defect_id.to_string(), "Note rounds differently; face is audited"),
        DispositionAction::Waive,
    )
    .unwrap();
    assert_eq!(entry.sequence, 1);
    assert!(matches!(
        entry.event,
        LedgerEvent::Disposed {
            to: DefectStatus::Waived,
            ..
        }
    ));

    let ledger = load_ledger(&dir.path().join("arr.ledger.json"), &result_file).unwrap();
    assert_eq!(ledger.entries().len(), 2);
    assert_eq!(ledger.get(defect_id).unwrap().status, DefectStatus::Waived);

    // Carry the disposition into the next grading run
    let snapshot: ClaimSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
    let snapshot = snapshot.with_disposition(Disposition {
        defect_id,
        action: DispositionAction::Waive,
        actor_id: "partner:bo".to_string(),
        reason: "Note rounds differently; face is audited".to_string(),
    });
    let regraded = SanadEngine::default().grade(&snapshot).unwrap();
    assert_eq!(regraded.grade, Grade::A);
    assert_eq!(regraded.defects[0].status, DefectStatus::Waived);
    assert!(regraded.ledger.iter().any(|e| matches!(
        &e.event,
        LedgerEvent::Disposed { actor_id, reason, .. }
            if actor_id == "partner:bo" && reason == "Note rounds differently; face is audited"
    )));

    // A ledger reopened from the regraded result keeps the waiver
    let regraded_file = dir.path().join("arr.regraded.json");
    fs::write(&regraded_file, serde_json::to_string_pretty(&regraded).unwrap()).unwrap();
    let mut second = args(dir.path(), &regraded_file, defect_id.to_string(), "Fixed");
    second.ledger = dir.path().join("arr.regraded.ledger.json");
    assert!(matches!(
        dispose(&second, DispositionAction::Cure),
        Err(CliError::Ledger(LedgerError::Authorization(WaiverAuthorizationError::NotOpen(_))))
    ));
}

#[test]
fn test_second_disposition_refused() {
    let (dir, path) = setup();
    let (result, result_file) = write_result(&path);
    let id = result.defects[0].defect_id.to_string();

    dispose(&args(dir.path(), &result_file, id.clone(), "Accepted"), DispositionAction::Waive).unwrap();
    let before = fs::read_to_string(dir.path().join("arr.ledger.json")).unwrap();

    let refused = dispose(&args(dir.path(), &result_file, id, "Fixed"), DispositionAction::Cure);
    assert!(matches!(
        refused,
        Err(CliError::Ledger(LedgerError::Authorization(WaiverAuthorizationError::NotOpen(_))))
    ));
    assert_eq!(fs::read_to_string(dir.path().join("arr.ledger.json")).unwrap(), before);
}

#[test]
fn test_waiver_without_reason_leaves_no_ledger() {
    let (dir, path) = setup();
    let (result, result_file) = write_result(&path);

    let refused = dispose(
        &args(dir.path(), &result_file, result.defects[0].defect_id.to_string(), "  "),
        DispositionAction::Waive,
    );
    assert!(matches!(
        refused,
        Err(CliError::Ledger(LedgerError::Authorization(WaiverAuthorizationError::MissingReason)))
    ));
    assert!(!dir.path().join("arr.ledger.json").exists());
}

#[test]
fn test_malformed_defect_id() {
    let (dir, path) = setup();
    let (_, result_file) = write_result(&path);
    let refused = dispose(
        &args(dir.path(), &result_file, "not-a-uuid".to_string(), "Accepted"),
        DispositionAction::Cure,
    );
    assert!(matches!(refused, Err(CliError::InvalidInput(_))));
}

#[test]
fn test_each_grade_pairs_with_one_audit_record() {
    let (_dir, path) = setup();
    let engine = SanadEngine::default();
    let mut sink = MemoryAuditSink::new();

    for _ in 0..2 {
        let result = grade_file(&engine, &path).unwrap();
        sink.record(&AuditRecord::Graded {
            result: Box::new(result),
        })
        .unwrap();
    }

    assert_eq!(sink.records().len(), 2);
    // Identical input, identical record
    assert_eq!(sink.records()[0], sink.records()[1]);
}
