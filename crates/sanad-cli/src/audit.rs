//! JSON-lines audit log.

use crate::error::{CliError, Result};
use sanad_domain::{AuditRecord, AuditSink};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Appends one JSON object per line to a file.
pub struct JsonlAuditSink {
    writer: BufWriter<File>,
}

impl JsonlAuditSink {
    /// Open a log for appending, creating it if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl AuditSink for JsonlAuditSink {
    type Error = CliError;

    fn record(&mut self, record: &AuditRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Record into an optional sink.
pub fn record_to(sink: &mut Option<JsonlAuditSink>, record: &AuditRecord) -> Result<()> {
    match sink {
        Some(sink) => sink.record(record),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sanad_domain::{
        ClaimId, Defect, DefectKind, LedgerEntry, LedgerEvent,
    };
    use tempfile::tempdir;

    fn entry(sequence: u64) -> AuditRecord {
        let defect = Defect::open(ClaimId::from_value(1), DefectKind::Anomaly, "peers", "Outlier");
        AuditRecord::Disposition {
            entry: LedgerEntry {
                sequence,
                defect_id: defect.defect_id,
                event: LedgerEvent::Raised { defect },
            },
        }
    }

    #[test]
    fn test_appends_one_line_per_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("audit.jsonl");

        let mut sink = JsonlAuditSink::open(&path).unwrap();
        sink.record(&entry(0)).unwrap();
        sink.flush().unwrap();
        drop(sink);

        let mut sink = JsonlAuditSink::open(&path).unwrap();
        sink.record(&entry(1)).unwrap();
        sink.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: AuditRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second, entry(1));
    }
}
