//! Metric values and deterministic reconciliation
//!
//! Quantitative claims and evidence observations carry a [`MetricValue`].
//! Two values are compared by [`reconcile`], which tries the reconciliation
//! heuristics in a fixed order (unit conversion, time-window alignment,
//! rounding tolerance) before declaring a contradiction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative epsilon below which two normalized amounts are identical
const EXACT_EPSILON: f64 = 1e-9;

/// What a metric measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dimension {
    /// Money; requires a currency code
    Currency,
    /// Plain counts (customers, employees, units)
    Count,
    /// Ratios and percentages
    Ratio,
}

/// Multiplier applied to the reported amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scale {
    /// As reported
    One,
    /// Hundredths (12.5 percent = 0.125)
    Percent,
    /// Thousands
    Thousand,
    /// Millions
    Million,
    /// Billions
    Billion,
}

impl Scale {
    /// Multiplicative factor to base units
    pub fn factor(&self) -> f64 {
        match self {
            Scale::One => 1.0,
            Scale::Percent => 0.01,
            Scale::Thousand => 1e3,
            Scale::Million => 1e6,
            Scale::Billion => 1e9,
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::One
    }
}

/// Reporting window of a flow metric
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window length in months (1 = monthly, 3 = quarterly, 12 = annual)
    pub months: u8,

    /// Last month covered, `YYYY-MM`
    pub ending: String,
}

impl TimeWindow {
    /// Create a new window
    pub fn new(months: u8, ending: impl Into<String>) -> Self {
        Self {
            months,
            ending: ending.into(),
        }
    }
}

/// A reported quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    /// Amount as reported, in `scale` units
    pub amount: f64,

    /// What is measured
    pub dimension: Dimension,

    /// ISO currency code when `dimension` is `Currency`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Reporting scale
    #[serde(default)]
    pub scale: Scale,

    /// Reporting window for flow metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeWindow>,

    /// Decimal places shown in the source, used for rounding tolerance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

impl MetricValue {
    /// A currency amount in base units
    pub fn currency(amount: f64, code: impl Into<String>) -> Self {
        Self {
            amount,
            dimension: Dimension::Currency,
            currency: Some(code.into()),
            scale: Scale::One,
            window: None,
            decimals: None,
        }
    }

    /// A plain count
    pub fn count(amount: f64) -> Self {
        Self {
            amount,
            dimension: Dimension::Count,
            currency: None,
            scale: Scale::One,
            window: None,
            decimals: None,
        }
    }

    /// A ratio in base units (0.25 = 25%)
    pub fn ratio(amount: f64) -> Self {
        Self {
            amount,
            dimension: Dimension::Ratio,
            currency: None,
            scale: Scale::One,
            window: None,
            decimals: None,
        }
    }

    /// Set the reporting scale
    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    /// Set the reporting window
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Set the displayed precision
    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Amount in base units
    pub fn normalized(&self) -> f64 {
        self.amount * self.scale.factor()
    }

    /// Whether the amount is a usable number
    pub fn is_finite(&self) -> bool {
        self.amount.is_finite()
    }

    /// Half of the smallest step the source could display, in base units
    fn rounding_half_step(&self) -> f64 {
        match self.decimals {
            Some(d) => 0.5 * 10f64.powi(-(d as i32)) * self.scale.factor(),
            None => 0.0,
        }
    }

    fn currency_code(&self) -> Option<String> {
        self.currency.as_ref().map(|c| c.trim().to_uppercase())
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.amount)?;
        match self.scale {
            Scale::One => {}
            Scale::Percent => write!(f, "%")?,
            Scale::Thousand => write!(f, "K")?,
            Scale::Million => write!(f, "M")?,
            Scale::Billion => write!(f, "B")?,
        }
        if let Some(code) = &self.currency {
            write!(f, " {}", code)?;
        }
        if let Some(w) = &self.window {
            write!(f, " ({}m to {})", w.months, w.ending)?;
        }
        Ok(())
    }
}

/// Heuristic that made two values agree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationStep {
    /// Identical as reported
    Exact,
    /// Identical after scaling to base units
    UnitConversion,
    /// Identical after annualizing different window lengths
    TimeWindowAlignment,
    /// Within rounding tolerance
    RoundingTolerance,
}

/// Outcome of comparing two metric values
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// The values agree, possibly after reconciliation
    Agrees(ReconciliationStep),
    /// The values describe the same fact and disagree
    Contradicts,
    /// The values do not describe the same fact
    Incomparable(String),
}

impl Comparison {
    /// Whether the values agree
    pub fn agrees(&self) -> bool {
        matches!(self, Comparison::Agrees(_))
    }
}

fn approx_eq(x: f64, y: f64) -> bool {
    let scale = x.abs().max(y.abs()).max(1.0);
    (x - y).abs() <= EXACT_EPSILON * scale
}

/// Compare two values, attempting reconciliation before reporting a
/// contradiction
///
/// `relative_tolerance` is the relative rounding allowance (e.g. 0.005 for
/// half a percent). The heuristics run in a fixed order and the first one that
/// makes the values agree is reported.
pub fn reconcile(a: &MetricValue, b: &MetricValue, relative_tolerance: f64) -> Comparison {
    if a.dimension != b.dimension {
        return Comparison::Incomparable(format!(
            "dimension {:?} vs {:?}",
            a.dimension, b.dimension
        ));
    }
    if a.dimension == Dimension::Currency && a.currency_code() != b.currency_code() {
        return Comparison::Incomparable(format!(
            "currency {} vs {}",
            a.currency_code().unwrap_or_default(),
            b.currency_code().unwrap_or_default()
        ));
    }
    if let (Some(wa), Some(wb)) = (&a.window, &b.window) {
        if wa.ending != wb.ending {
            return Comparison::Incomparable(format!(
                "window ending {} vs {}",
                wa.ending, wb.ending
            ));
        }
        if wa.months == 0 || wb.months == 0 {
            return Comparison::Incomparable("zero-length window".to_string());
        }
    }

    let months_a = a.window.as_ref().map(|w| w.months);
    let months_b = b.window.as_ref().map(|w| w.months);
    let windows_differ = matches!((months_a, months_b), (Some(x), Some(y)) if x != y);

    if a.scale == b.scale && !windows_differ && approx_eq(a.amount, b.amount) {
        return Comparison::Agrees(ReconciliationStep::Exact);
    }

    // Unit conversion
    let mut x = a.normalized();
    let mut y = b.normalized();
    let mut half_step_x = a.rounding_half_step();
    let mut half_step_y = b.rounding_half_step();
    if a.scale != b.scale && !windows_differ && approx_eq(x, y) {
        return Comparison::Agrees(ReconciliationStep::UnitConversion);
    }

    // Time-window alignment (annualize)
    if let (true, Some(ma), Some(mb)) = (windows_differ, months_a, months_b) {
        let fa = 12.0 / ma as f64;
        let fb = 12.0 / mb as f64;
        x *= fa;
        y *= fb;
        half_step_x *= fa;
        half_step_y *= fb;
        if approx_eq(x, y) {
            return Comparison::Agrees(ReconciliationStep::TimeWindowAlignment);
        }
    }

    // Rounding tolerance
    let relative = relative_tolerance.max(0.0) * x.abs().max(y.abs());
    let allowed = relative.max(half_step_x).max(half_step_y);
    if (x - y).abs() <= allowed {
        return Comparison::Agrees(ReconciliationStep::RoundingTolerance);
    }

    Comparison::Contradicts
}
