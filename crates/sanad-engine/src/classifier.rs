//! Source tier classification
//!
//! A total, explicit table from `(system id, document type)` to one of six
//! tiers. There is no fallback: a descriptor no row matches is rejected.

use crate::config::SourceRule;
use crate::InvalidInputError;
use sanad_domain::{EvidenceItem, EvidenceRecord, Grade, SourceDescriptor, SourceTier};
use std::collections::BTreeMap;

/// System id that matches any system
pub const ANY_SYSTEM: &str = "*";

/// Built-in rows: (system id, document type, tier)
const BUILTIN_ROWS: &[(&str, &str, SourceTier)] = &[
    // Independently attested
    ("*", "audited_financial_statement", SourceTier::Tier1),
    ("*", "regulatory_filing", SourceTier::Tier1),
    ("*", "tax_return", SourceTier::Tier1),
    ("*", "bank_statement", SourceTier::Tier1),
    ("sec_edgar", "annual_report", SourceTier::Tier1),
    // Signed or system of record
    ("*", "signed_contract", SourceTier::Tier2),
    ("*", "board_minutes", SourceTier::Tier2),
    ("*", "cap_table", SourceTier::Tier2),
    ("docusign", "envelope", SourceTier::Tier2),
    ("netsuite", "general_ledger", SourceTier::Tier2),
    ("stripe", "payout_report", SourceTier::Tier2),
    // Internal management records
    ("*", "management_accounts", SourceTier::Tier3),
    ("*", "general_ledger", SourceTier::Tier3),
    ("*", "kpi_dashboard", SourceTier::Tier3),
    ("salesforce", "pipeline_export", SourceTier::Tier3),
    // Company-prepared presentation material
    ("*", "financial_model", SourceTier::Tier4),
    ("*", "management_presentation", SourceTier::Tier4),
    ("*", "pitch_deck", SourceTier::Tier4),
    ("*", "information_memorandum", SourceTier::Tier4),
    // Third-party publications
    ("*", "analyst_report", SourceTier::Tier5),
    ("*", "press_release", SourceTier::Tier5),
    ("*", "news_article", SourceTier::Tier5),
    // Anecdotal
    ("*", "expert_call", SourceTier::Tier6),
    ("*", "customer_reference", SourceTier::Tier6),
    ("*", "web_page", SourceTier::Tier6),
];

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Maps source descriptors to tiers
#[derive(Debug, Clone)]
pub struct SourceTierClassifier {
    exact: BTreeMap<(String, String), SourceTier>,
    any_system: BTreeMap<String, SourceTier>,
}

impl Default for SourceTierClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SourceTierClassifier {
    /// Classifier with only the built-in rows
    pub fn builtin() -> Self {
        let mut classifier = Self {
            exact: BTreeMap::new(),
            any_system: BTreeMap::new(),
        };
        for (system, doc, tier) in BUILTIN_ROWS {
            classifier.insert(system, doc, *tier);
        }
        classifier
    }

    /// Built-in rows plus configured rows; configured rows replace built-in
    /// rows with the same key
    pub fn with_rules(rules: &[SourceRule]) -> Self {
        let mut classifier = Self::builtin();
        for rule in rules {
            classifier.insert(&rule.system_id, &rule.document_type, rule.tier);
        }
        classifier
    }

    fn insert(&mut self, system_id: &str, document_type: &str, tier: SourceTier) {
        let system = normalize(system_id);
        let doc = normalize(document_type);
        if system == ANY_SYSTEM {
            self.any_system.insert(doc, tier);
        } else {
            self.exact.insert((system, doc), tier);
        }
    }

    /// Look up the tier of a descriptor
    ///
    /// Exact system rows win over `*` rows. Matching ignores case and
    /// surrounding whitespace.
    pub fn classify(&self, descriptor: &SourceDescriptor) -> Result<SourceTier, InvalidInputError> {
        let system = normalize(&descriptor.system_id);
        let doc = normalize(&descriptor.document_type);
        self.exact
            .get(&(system, doc.clone()))
            .or_else(|| self.any_system.get(&doc))
            .copied()
            .ok_or_else(|| InvalidInputError::UnknownSource(descriptor.clone()))
    }

    /// Turn a raw record into an immutable evidence item
    pub fn classify_record(&self, record: EvidenceRecord) -> Result<EvidenceItem, InvalidInputError> {
        let tier = self.classify(&record.descriptor())?;
        Ok(EvidenceItem::new(record, tier))
    }

    /// Grade floor of a tier, `None` for support-only tiers
    pub fn floor(tier: SourceTier) -> Option<Grade> {
        tier.grade_floor()
    }

    /// Every row, exact rows first, each group sorted
    pub fn rows(&self) -> Vec<(SourceDescriptor, SourceTier)> {
        let exact = self
            .exact
            .iter()
            .map(|((system, doc), tier)| (SourceDescriptor::new(system.clone(), doc.clone()), *tier));
        let any = self
            .any_system
            .iter()
            .map(|(doc, tier)| (SourceDescriptor::new(ANY_SYSTEM, doc.clone()), *tier));
        exact.chain(any).collect()
    }
}
