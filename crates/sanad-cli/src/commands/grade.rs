//! Grade command implementation.

use crate::audit::{record_to, JsonlAuditSink};
use crate::cli::GradeArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use sanad_domain::{AuditRecord, AuditSink, ClaimSnapshot, SanadGradeResult};
use sanad_engine::SanadEngine;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Execute the grade command.
pub async fn execute_grade(
    args: GradeArgs,
    engine: Arc<SanadEngine>,
    formatter: &Formatter,
) -> Result<()> {
    // Grade every file on the blocking pool
    let mut handles = Vec::with_capacity(args.files.len());
    for path in args.files {
        let engine = Arc::clone(&engine);
        handles.push(tokio::task::spawn_blocking(move || {
            let outcome = grade_file(&engine, &path);
            (path, outcome)
        }));
    }

    let mut sink = args.audit_log.as_deref().map(JsonlAuditSink::open).transpose()?;
    let mut results = Vec::new();
    let mut failures = Vec::new();
    for handle in handles {
        let (path, outcome) = handle.await?;
        match outcome {
            Ok(result) => {
                record_to(
                    &mut sink,
                    &AuditRecord::Graded {
                        result: Box::new(result.clone()),
                    },
                )?;
                if args.write_results {
                    fs::write(result_path(&path), serde_json::to_string_pretty(&result)?)?;
                }
                results.push(result);
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Snapshot not graded");
                failures.push((path, e));
            }
        }
    }
    if let Some(sink) = sink.as_mut() {
        sink.flush()?;
    }

    println!("{}", formatter.format_results(&results)?);
    for (path, e) in &failures {
        eprintln!("{}", formatter.error(&format!("{}: {}", path.display(), e)));
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(CliError::InvalidInput(format!(
            "{} of {} snapshot(s) were not graded",
            failures.len(),
            failures.len() + results.len()
        )))
    }
}

/// Read, parse and grade one snapshot file.
pub fn grade_file(engine: &SanadEngine, path: &Path) -> Result<SanadGradeResult> {
    let contents = fs::read_to_string(path)?;
    let snapshot: ClaimSnapshot = serde_json::from_str(&contents)?;
    Ok(engine.grade(&snapshot)?)
}

/// Where `--write-results` puts the result for a snapshot.
pub fn result_path(snapshot: &Path) -> PathBuf {
    let mut name = snapshot.file_stem().unwrap_or_default().to_os_string();
    name.push(".result.json");
    snapshot.with_file_name(name)
}
