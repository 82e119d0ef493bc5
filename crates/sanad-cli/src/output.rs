//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use sanad_domain::{
    DefectStatus, Grade, LedgerEntry, LedgerEvent, SanadGradeResult, SourceDescriptor, SourceTier,
};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format grading results.
    pub fn format_results(&self, results: &[SanadGradeResult]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(results)?),
            OutputFormat::Table => Ok(self.format_results_table(results)),
            OutputFormat::Quiet => Ok(results
                .iter()
                .map(|r| format!("{} {}", r.claim_id, r.grade))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_results_table(&self, results: &[SanadGradeResult]) -> String {
        if results.is_empty() {
            return self.colorize("No claims graded.", "yellow");
        }

        let mut out = Vec::new();
        for result in results {
            let mut builder = Builder::default();
            builder.push_record(["Claim", "Grade", "Tier", "Dabt", "Corroboration", "Defects"]);
            let tier = result
                .source_tier
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string());
            builder.push_record([
                result.claim_id.to_string(),
                self.grade(result.grade),
                tier,
                format!("{:.2} ({})", result.dabt_composite, result.dabt_band),
                format!("{} ({} clusters)", result.corroboration_status, result.independent_clusters),
                result.defects.len().to_string(),
            ]);
            let mut table = builder.build();
            table
                .with(Style::rounded())
                .with(Modify::new(Rows::first()).with(Alignment::center()));
            out.push(table.to_string());

            if !result.defects.is_empty() {
                let mut builder = Builder::default();
                builder.push_record(["Defect", "Kind", "Severity", "Status", "Description"]);
                for defect in &result.defects {
                    builder.push_record([
                        defect.defect_id.to_string(),
                        defect.kind.to_string(),
                        defect.severity.to_string(),
                        self.status(defect.status),
                        defect.description.clone(),
                    ]);
                }
                let mut table = builder.build();
                table.with(Style::rounded());
                out.push(table.to_string());
            }

            for step in result.explanation_trail.steps() {
                out.push(format!(
                    "  {} {} -> {}: {}",
                    step.rule_id, step.grade_before, step.grade_after, step.rationale
                ));
            }

            if result.triggers_stop() {
                out.push(self.error("Material claim with an open FATAL defect"));
            }
        }
        out.join("\n")
    }

    /// Format the tier table.
    pub fn format_tiers(&self, rows: &[(SourceDescriptor, SourceTier)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = rows
                    .iter()
                    .map(|(d, t)| {
                        serde_json::json!({
                            "system_id": d.system_id,
                            "document_type": d.document_type,
                            "tier": t,
                            "grade_floor": t.grade_floor(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table | OutputFormat::Quiet => {
                let mut builder = Builder::default();
                builder.push_record(["System", "Document type", "Tier", "Floor"]);
                for (descriptor, tier) in rows {
                    builder.push_record([
                        descriptor.system_id.clone(),
                        descriptor.document_type.clone(),
                        tier.to_string(),
                        tier.grade_floor()
                            .map(|g| g.to_string())
                            .unwrap_or_else(|| "support only".to_string()),
                    ]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a ledger entry.
    pub fn format_entry(&self, entry: &LedgerEntry) -> Result<String> {
        match (&self.format, &entry.event) {
            (OutputFormat::Json, _) => Ok(serde_json::to_string_pretty(entry)?),
            (_, LedgerEvent::Disposed { from, to, actor_id, .. }) => Ok(self.success(&format!(
                "Defect {} {} -> {} by {}",
                entry.defect_id, from, to, actor_id
            ))),
            (_, LedgerEvent::Raised { defect }) => {
                Ok(self.info(&format!("Defect {} raised: {}", entry.defect_id, defect.kind)))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    fn grade(&self, grade: Grade) -> String {
        let color = match grade {
            Grade::A => "green",
            Grade::B => "cyan",
            Grade::C => "yellow",
            Grade::D => "red",
        };
        self.colorize(grade.as_str(), color)
    }

    fn status(&self, status: DefectStatus) -> String {
        let color = match status {
            DefectStatus::Open => "red",
            DefectStatus::Cured => "green",
            DefectStatus::Waived => "magenta",
        };
        self.colorize(&status.to_string(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}
