//! Claim module - the factual statement being graded

use crate::MetricValue;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Unique identifier for a claim (UUID)
///
/// Claims are minted by the extraction layer; the engine only parses and
/// compares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimId(u128);

impl ClaimId {
    /// Generate a new UUIDv7-based ClaimId
    ///
    /// # Examples
    ///
    /// ```
    /// use sanad_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// assert!(!id.is_nil());
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a ClaimId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a ClaimId from a UUID string
    ///
    /// # Examples
    ///
    /// ```
    /// use sanad_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// let parsed = ClaimId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid claim id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Whether this is the nil UUID (never a valid claim)
    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }

    /// The id as a `uuid::Uuid`
    pub fn as_uuid(&self) -> uuid::Uuid {
        uuid::Uuid::from_u128(self.0)
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_uuid())
    }
}

impl Serialize for ClaimId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClaimId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ClaimId::from_string(&s).map_err(serde::de::Error::custom)
    }
}

/// How much a claim matters to the decision memo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Materiality {
    /// Background detail
    Low,
    /// Supporting detail
    Medium,
    /// Drives a section of the memo
    High,
    /// Drives the investment decision
    Critical,
}

impl Materiality {
    /// Whether a FATAL defect on a claim of this materiality is a stop condition
    pub fn is_material(&self) -> bool {
        matches!(self, Materiality::High | Materiality::Critical)
    }
}

/// Whether a claim was read from a source or computed from other claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Lineage {
    /// Stated directly by a source
    Primary,
    /// Computed from other claims; graded, but never re-triggers grading of
    /// dependent calculations
    Derived,
}

/// A claim as consumed by the grading engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub claim_id: ClaimId,

    /// Metric this claim asserts (e.g., "revenue.arr"); peers share it
    pub metric_key: String,

    /// Asserted value, if the claim is quantitative
    #[serde(default)]
    pub asserted_value: Option<MetricValue>,

    /// Materiality level
    pub materiality: Materiality,

    /// Primary or derived
    pub lineage: Lineage,
}

impl Claim {
    /// Create a new quantitative-free claim
    pub fn new(
        claim_id: ClaimId,
        metric_key: impl Into<String>,
        materiality: Materiality,
        lineage: Lineage,
    ) -> Self {
        Self {
            claim_id,
            metric_key: metric_key.into(),
            asserted_value: None,
            materiality,
            lineage,
        }
    }

    /// Attach an asserted value
    pub fn with_value(mut self, value: MetricValue) -> Self {
        self.asserted_value = Some(value);
        self
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: ordering is consistent with the underlying value
        #[test]
        fn test_id_ordering_property(a: u128, b: u128) {
            prop_assert_eq!(ClaimId::from_value(a) < ClaimId::from_value(b), a < b);
        }

        /// Property: string form round-trips
        #[test]
        fn test_id_string_roundtrip(value: u128) {
            let id = ClaimId::from_value(value);
            match ClaimId::from_string(&id.to_string()) {
                Ok(parsed) => prop_assert_eq!(id, parsed),
                Err(e) => return Err(TestCaseError::fail(e)),
            }
        }
    }
}
