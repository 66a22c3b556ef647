//! Confidence value module
//!
//! `ConfidenceValue` is a closed sum type: every confidence in the system
//! carries its provenance in its variant. Raw unlabeled floats are never
//! treated as confidence - the type system, not convention, forbids it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by confidence value construction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfidenceError {
    /// A value was outside the [0, 1] range
    #[error("Confidence value {0} is outside [0, 1]")]
    OutOfRange(f64),

    /// Bounded interval with lower bound above upper bound
    #[error("Invalid bounds: low {low} > high {high}")]
    InvertedBounds {
        /// Lower bound as supplied
        low: f64,
        /// Upper bound as supplied
        high: f64,
    },
}

/// Why a confidence value is absent
///
/// Absence is modeled as a value, never as an exception; the specific reason
/// is preserved so callers can choose the right remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceReason {
    /// No calibration data exists for this path yet
    Uncalibrated,

    /// Too few observations to state anything
    InsufficientData,

    /// Confidence is not a meaningful concept for this value
    NotApplicable,
}

/// Justification basis for a bounded confidence range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundedBasis {
    /// Derived from a theoretical argument
    Theoretical,

    /// Taken from published literature
    Literature,

    /// Established by formal analysis
    FormalAnalysis,
}

/// Empirical calibration data backing a measured confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Identifier of the dataset the measurement was taken on
    pub dataset_id: String,

    /// Number of samples in the measurement
    pub sample_size: u64,

    /// Observed accuracy on the dataset
    pub accuracy: f64,

    /// 95% confidence interval around the accuracy
    pub ci95: (f64, f64),

    /// When the measurement was taken (ms since Unix epoch)
    pub measured_at: u64,
}

/// A named input to a derived confidence value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInput {
    /// Name of the input (e.g. "retrieval", "step0")
    pub name: String,

    /// The input's confidence value
    pub confidence: ConfidenceValue,
}

/// A provenance-tagged confidence value
///
/// Exactly one of five variants; every value round-trips through one of the
/// validating constructors. A derived value must record its formula and every
/// input, a bounded value must cite its basis, and an absent value must name
/// its reason - "unknown" is honest, never fabricated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfidenceValue {
    /// Logically certain outcome (parse succeeded/failed); value is 0 or 1
    Deterministic {
        /// Exactly 0.0 or 1.0
        value: f64,
        /// Why the outcome is certain
        reason: String,
    },

    /// Computed from other confidence values
    Derived {
        /// Resulting value in [0, 1]
        value: f64,
        /// The formula that produced it (e.g. "sequence(min)")
        formula: String,
        /// Every input that fed the formula
        inputs: Vec<ConfidenceInput>,
    },

    /// Empirically calibrated against a dataset
    Measured {
        /// Calibrated value in [0, 1]
        value: f64,
        /// The backing measurement
        measurement: Measurement,
    },

    /// A range with explicit justification
    Bounded {
        /// Lower bound, 0 <= low <= high
        low: f64,
        /// Upper bound, low <= high <= 1
        high: f64,
        /// Why these bounds are believed
        basis: BoundedBasis,
        /// Citation for the bounds
        citation: String,
    },

    /// Honest "unknown"
    Absent {
        /// Why no confidence can be stated
        reason: AbsenceReason,
    },
}

fn check_unit_range(value: f64) -> Result<f64, ConfidenceError> {
    if !(0.0..=1.0).contains(&value) || value.is_nan() {
        return Err(ConfidenceError::OutOfRange(value));
    }
    Ok(value)
}

impl ConfidenceValue {
    /// Create a deterministic confidence for a certain outcome
    ///
    /// `certain = true` yields value 1.0, `false` yields 0.0; no other values
    /// are representable for this variant.
    pub fn deterministic(certain: bool, reason: impl Into<String>) -> Self {
        Self::Deterministic {
            value: if certain { 1.0 } else { 0.0 },
            reason: reason.into(),
        }
    }

    /// Create a derived confidence from a formula and its inputs
    ///
    /// # Errors
    /// Returns an error if `value` is outside [0, 1].
    pub fn derived(
        value: f64,
        formula: impl Into<String>,
        inputs: Vec<ConfidenceInput>,
    ) -> Result<Self, ConfidenceError> {
        Ok(Self::Derived {
            value: check_unit_range(value)?,
            formula: formula.into(),
            inputs,
        })
    }

    /// Create a measured confidence backed by calibration data
    ///
    /// # Errors
    /// Returns an error if `value` is outside [0, 1].
    pub fn measured(value: f64, measurement: Measurement) -> Result<Self, ConfidenceError> {
        Ok(Self::Measured {
            value: check_unit_range(value)?,
            measurement,
        })
    }

    /// Create a bounded confidence range
    ///
    /// # Errors
    /// Returns an error if either bound is outside [0, 1] or `low > high`.
    /// Bounds are never silently clamped.
    pub fn bounded(
        low: f64,
        high: f64,
        basis: BoundedBasis,
        citation: impl Into<String>,
    ) -> Result<Self, ConfidenceError> {
        check_unit_range(low)?;
        check_unit_range(high)?;
        if low > high {
            return Err(ConfidenceError::InvertedBounds { low, high });
        }
        Ok(Self::Bounded {
            low,
            high,
            basis,
            citation: citation.into(),
        })
    }

    /// Create an absent confidence with an explicit reason
    pub fn absent(reason: AbsenceReason) -> Self {
        Self::Absent { reason }
    }

    /// Extract the numeric value, if one is present
    ///
    /// Deterministic/derived/measured yield their value, bounded yields the
    /// interval midpoint, absent yields `None`.
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            Self::Deterministic { value, .. }
            | Self::Derived { value, .. }
            | Self::Measured { value, .. } => Some(*value),
            Self::Bounded { low, high, .. } => Some((low + high) / 2.0),
            Self::Absent { .. } => None,
        }
    }

    /// Conservative extraction for gating decisions
    ///
    /// Same as [`numeric_value`](Self::numeric_value) except bounded yields
    /// its *lower* bound and absent yields 0.0. This is the only sanctioned
    /// coercion of absence to a number; callers must never invent their own
    /// default.
    pub fn effective_value(&self) -> f64 {
        match self {
            Self::Bounded { low, .. } => *low,
            Self::Absent { .. } => 0.0,
            other => other.numeric_value().unwrap_or(0.0),
        }
    }

    /// Whether this value is the absent variant
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent { .. })
    }

    /// The absence reason, if this value is absent
    pub fn absence_reason(&self) -> Option<AbsenceReason> {
        match self {
            Self::Absent { reason } => Some(*reason),
            _ => None,
        }
    }

    /// Stable name of the variant, for reporting
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Deterministic { .. } => "deterministic",
            Self::Derived { .. } => "derived",
            Self::Measured { .. } => "measured",
            Self::Bounded { .. } => "bounded",
            Self::Absent { .. } => "absent",
        }
    }
}

/// Outcome of gating a confidence value against a threshold
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdCheck {
    /// Whether the gate passed
    pub passed: bool,

    /// The conservative effective value that was compared
    pub effective_value: f64,

    /// The threshold that was applied
    pub threshold: f64,

    /// Variant name of the checked value
    pub variant: &'static str,

    /// Suggested remediation when blocked
    pub remediation: Option<String>,
}

/// Gate a confidence value against a threshold
///
/// Uses the conservative [`effective_value`](ConfidenceValue::effective_value)
/// so bounded values gate on their lower bound and absent values never pass a
/// positive threshold.
pub fn meets_threshold(confidence: &ConfidenceValue, threshold: f64) -> bool {
    confidence.effective_value() >= threshold
}

/// Gate a confidence value against a threshold, with a full report
///
/// Blocked results carry the effective value, the variant that was checked,
/// and a remediation: absent values need calibration, present-but-low values
/// need a higher-confidence source.
pub fn check_threshold(confidence: &ConfidenceValue, threshold: f64) -> ThresholdCheck {
    let effective = confidence.effective_value();
    let passed = effective >= threshold;
    let remediation = if passed {
        None
    } else if confidence.is_absent() {
        Some("run calibration".to_string())
    } else {
        Some("use a higher-confidence source".to_string())
    };
    ThresholdCheck {
        passed,
        effective_value: effective,
        threshold,
        variant: confidence.variant_name(),
        remediation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_values() {
        let yes = ConfidenceValue::deterministic(true, "parse succeeded");
        let no = ConfidenceValue::deterministic(false, "parse failed");
        assert_eq!(yes.numeric_value(), Some(1.0));
        assert_eq!(no.numeric_value(), Some(0.0));
    }

    #[test]
    fn test_bounded_midpoint_and_effective() {
        let b = ConfidenceValue::bounded(0.6, 0.8, BoundedBasis::Literature, "doi:10/xyz").unwrap();
        assert_eq!(b.numeric_value(), Some(0.7));
        // Conservative extraction uses the lower bound, not the midpoint
        assert_eq!(b.effective_value(), 0.6);
    }

    #[test]
    fn test_bounded_rejects_inverted_bounds() {
        let result = ConfidenceValue::bounded(0.9, 0.5, BoundedBasis::Theoretical, "");
        assert_eq!(
            result,
            Err(ConfidenceError::InvertedBounds { low: 0.9, high: 0.5 })
        );
    }

    #[test]
    fn test_bounded_rejects_out_of_range() {
        assert!(ConfidenceValue::bounded(-0.1, 0.5, BoundedBasis::Theoretical, "").is_err());
        assert!(ConfidenceValue::bounded(0.1, 1.5, BoundedBasis::Theoretical, "").is_err());
    }

    #[test]
    fn test_derived_rejects_out_of_range() {
        assert!(ConfidenceValue::derived(1.2, "bad", vec![]).is_err());
        assert!(ConfidenceValue::derived(f64::NAN, "bad", vec![]).is_err());
    }

    #[test]
    fn test_absent_extraction() {
        let a = ConfidenceValue::absent(AbsenceReason::Uncalibrated);
        assert_eq!(a.numeric_value(), None);
        assert_eq!(a.effective_value(), 0.0);
        assert_eq!(a.absence_reason(), Some(AbsenceReason::Uncalibrated));
    }

    #[test]
    fn test_threshold_remediation_for_absent() {
        let a = ConfidenceValue::absent(AbsenceReason::Uncalibrated);
        let check = check_threshold(&a, 0.5);
        assert!(!check.passed);
        assert_eq!(check.variant, "absent");
        assert_eq!(check.remediation.as_deref(), Some("run calibration"));
    }

    #[test]
    fn test_threshold_remediation_for_low_present() {
        let d = ConfidenceValue::derived(0.3, "combined", vec![]).unwrap();
        let check = check_threshold(&d, 0.5);
        assert!(!check.passed);
        assert_eq!(
            check.remediation.as_deref(),
            Some("use a higher-confidence source")
        );
    }

    #[test]
    fn test_threshold_pass_has_no_remediation() {
        let d = ConfidenceValue::deterministic(true, "verified");
        let check = check_threshold(&d, 0.9);
        assert!(check.passed);
        assert!(check.remediation.is_none());
    }

    #[test]
    fn test_serde_round_trip() {
        let values = vec![
            ConfidenceValue::deterministic(true, "parsed"),
            ConfidenceValue::derived(0.5, "and(min)", vec![]).unwrap(),
            ConfidenceValue::bounded(0.2, 0.4, BoundedBasis::FormalAnalysis, "proof").unwrap(),
            ConfidenceValue::absent(AbsenceReason::NotApplicable),
        ];
        for value in values {
            let json = serde_json::to_string(&value).unwrap();
            let back: ConfidenceValue = serde_json::from_str(&json).unwrap();
            assert_eq!(value, back);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: valid bounds always construct, and midpoint lies inside them
        #[test]
        fn test_bounded_midpoint_inside(low in 0.0f64..=1.0, delta in 0.0f64..=1.0) {
            let high = (low + delta).min(1.0);
            let b = ConfidenceValue::bounded(low, high, BoundedBasis::Theoretical, "t").unwrap();
            let mid = b.numeric_value().unwrap();
            prop_assert!(mid >= low - 1e-12 && mid <= high + 1e-12);
            prop_assert!(b.effective_value() <= mid + 1e-12);
        }

        /// Property: effective value is always in [0, 1] for constructible values
        #[test]
        fn test_effective_in_unit_range(value in 0.0f64..=1.0) {
            let d = ConfidenceValue::derived(value, "f", vec![]).unwrap();
            let e = d.effective_value();
            prop_assert!((0.0..=1.0).contains(&e));
        }
    }
}
