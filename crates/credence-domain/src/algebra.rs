//! Confidence algebra module
//!
//! Composition and derivation operators over [`ConfidenceValue`]. All
//! operators are pure, synchronous, total functions over the five variants:
//! absence of data is a value, never an error, and composed results record
//! their formula and every input.
//!
//! Composition models:
//! - [`sequence`] - weakest link: a pipeline is only as trustworthy as its
//!   least-known stage
//! - [`parallel_all`] - independent AND: product of branch confidences
//! - [`parallel_any`] - independent OR: noisy-OR `1 - prod(1 - c_i)`

use crate::confidence::{
    AbsenceReason, ConfidenceInput, ConfidenceValue, Measurement,
};
use serde::{Deserialize, Serialize};

/// Build a derived value from an algebra operator
///
/// Values produced by the operators below are provably in [0, 1]; the clamp
/// only guards against float drift at the boundaries.
fn derive(value: f64, formula: impl Into<String>, inputs: Vec<ConfidenceInput>) -> ConfidenceValue {
    ConfidenceValue::Derived {
        value: value.clamp(0.0, 1.0),
        formula: formula.into(),
        inputs,
    }
}

fn named_inputs(values: &[ConfidenceValue], prefix: &str) -> Vec<ConfidenceInput> {
    values
        .iter()
        .enumerate()
        .map(|(i, confidence)| ConfidenceInput {
            name: format!("{}{}", prefix, i),
            confidence: confidence.clone(),
        })
        .collect()
}

/// Extract present numeric values; `None` if any step is absent
fn all_present(values: &[ConfidenceValue]) -> Option<Vec<f64>> {
    values.iter().map(ConfidenceValue::numeric_value).collect()
}

/// Weakest-link composition for sequential pipelines
///
/// Returns the minimum of all present values. If *any* step is absent the
/// result is absent (uncalibrated): a sequential pipeline cannot outrun its
/// least-known stage. An empty sequence is absent (insufficient data).
pub fn sequence(steps: &[ConfidenceValue]) -> ConfidenceValue {
    if steps.is_empty() {
        return ConfidenceValue::absent(AbsenceReason::InsufficientData);
    }
    match all_present(steps) {
        None => ConfidenceValue::absent(AbsenceReason::Uncalibrated),
        Some(values) => {
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            derive(min, "sequence(min)", named_inputs(steps, "step"))
        }
    }
}

/// Independent-AND composition for parallel branches
///
/// Product of all present values; absent-propagating like [`sequence`].
pub fn parallel_all(branches: &[ConfidenceValue]) -> ConfidenceValue {
    if branches.is_empty() {
        return ConfidenceValue::absent(AbsenceReason::InsufficientData);
    }
    match all_present(branches) {
        None => ConfidenceValue::absent(AbsenceReason::Uncalibrated),
        Some(values) => {
            let product: f64 = values.iter().product();
            derive(product, "parallel_all(product)", named_inputs(branches, "branch"))
        }
    }
}

/// Independent-OR composition for parallel branches
///
/// Noisy-OR: `1 - prod(1 - c_i)`; absent-propagating like [`sequence`].
pub fn parallel_any(branches: &[ConfidenceValue]) -> ConfidenceValue {
    if branches.is_empty() {
        return ConfidenceValue::absent(AbsenceReason::InsufficientData);
    }
    match all_present(branches) {
        None => ConfidenceValue::absent(AbsenceReason::Uncalibrated),
        Some(values) => {
            let value = 1.0 - values.iter().map(|v| 1.0 - v).product::<f64>();
            derive(value, "parallel_any(noisy_or)", named_inputs(branches, "branch"))
        }
    }
}

/// Conjunction of two confidence values (minimum)
///
/// If either operand is absent, that operand is returned verbatim so the
/// specific absence reason survives instead of collapsing to a generic one.
pub fn and(a: &ConfidenceValue, b: &ConfidenceValue) -> ConfidenceValue {
    if a.is_absent() {
        return a.clone();
    }
    if b.is_absent() {
        return b.clone();
    }
    let (va, vb) = (a.effective_value(), b.effective_value());
    derive(
        va.min(vb),
        "and(min)",
        vec![
            ConfidenceInput { name: "a".to_string(), confidence: a.clone() },
            ConfidenceInput { name: "b".to_string(), confidence: b.clone() },
        ],
    )
}

/// Disjunction of two confidence values (maximum)
///
/// If exactly one operand is absent the present one is returned; if both are
/// absent the result is absent (insufficient data).
pub fn or(a: &ConfidenceValue, b: &ConfidenceValue) -> ConfidenceValue {
    match (a.is_absent(), b.is_absent()) {
        (true, true) => ConfidenceValue::absent(AbsenceReason::InsufficientData),
        (true, false) => b.clone(),
        (false, true) => a.clone(),
        (false, false) => {
            let (va, vb) = (a.effective_value(), b.effective_value());
            derive(
                va.max(vb),
                "or(max)",
                vec![
                    ConfidenceInput { name: "a".to_string(), confidence: a.clone() },
                    ConfidenceInput { name: "b".to_string(), confidence: b.clone() },
                ],
            )
        }
    }
}

/// A weighted input to [`combined`]
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedInput {
    /// Name of the factor (e.g. "retrieval")
    pub name: String,

    /// The factor's confidence
    pub confidence: ConfidenceValue,

    /// Relative weight of the factor
    pub weight: f64,
}

/// Weighted average over the present subset of inputs
///
/// Absent inputs contribute nothing - neither value nor weight. If no input
/// is present the result is absent (uncalibrated).
pub fn combined(inputs: &[WeightedInput]) -> ConfidenceValue {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for input in inputs {
        if let Some(value) = input.confidence.numeric_value() {
            weighted_sum += value * input.weight;
            weight_sum += input.weight;
        }
    }
    if weight_sum <= 0.0 {
        return ConfidenceValue::absent(AbsenceReason::Uncalibrated);
    }
    let recorded = inputs
        .iter()
        .map(|input| ConfidenceInput {
            name: input.name.clone(),
            confidence: input.confidence.clone(),
        })
        .collect();
    derive(weighted_sum / weight_sum, "combined(weighted_average)", recorded)
}

/// Apply half-life decay to a confidence value
///
/// Multiplies the numeric value by `0.5^(age / half_life)` and rewraps the
/// result as derived with the original as an input. Absent passes through
/// unchanged - decaying an unknown does not make it known.
pub fn decay(confidence: &ConfidenceValue, age_ms: u64, half_life_ms: u64) -> ConfidenceValue {
    let Some(value) = confidence.numeric_value() else {
        return confidence.clone();
    };
    let half_lives = age_ms as f64 / half_life_ms as f64;
    let factor = 0.5_f64.powf(half_lives);
    derive(
        value * factor,
        format!("decay({:.6})", factor),
        vec![ConfidenceInput {
            name: "original".to_string(),
            confidence: confidence.clone(),
        }],
    )
}

/// A candidate for [`select_best`]
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Stable identifier, used for deterministic tie-breaking
    pub id: String,

    /// The candidate's confidence
    pub confidence: ConfidenceValue,
}

/// Select the candidate with the highest effective confidence
///
/// When no candidate has present confidence, ties break deterministically by
/// `id` ascending - never by insertion order, never randomly. Equal effective
/// values also break by `id` ascending.
pub fn select_best(items: &[Candidate]) -> Option<&Candidate> {
    if items.is_empty() {
        return None;
    }
    let any_present = items.iter().any(|c| !c.confidence.is_absent());
    if !any_present {
        return items.iter().min_by(|a, b| a.id.cmp(&b.id));
    }
    items.iter().filter(|c| !c.confidence.is_absent()).min_by(|a, b| {
        b.confidence
            .effective_value()
            .partial_cmp(&a.confidence.effective_value())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    })
}

/// One point on an empirical calibration curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Predicted confidence bucket
    pub predicted: f64,

    /// Observed accuracy for predictions in that bucket
    pub observed: f64,
}

/// An externally supplied calibration curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Identifier of the dataset the curve was fit on
    pub dataset_id: String,

    /// Total samples behind the curve
    pub sample_size: u64,

    /// Curve points, ordered by `predicted` ascending
    pub curve: Vec<CalibrationPoint>,

    /// When the curve was generated (ms since Unix epoch)
    pub generated_at: u64,
}

impl CalibrationReport {
    /// Map a raw confidence through the curve by linear interpolation
    ///
    /// Values outside the curve's range clamp to the endpoint observations;
    /// an empty curve is the identity map.
    pub fn apply(&self, raw: f64) -> f64 {
        let curve = &self.curve;
        if curve.is_empty() {
            return raw;
        }
        if raw <= curve[0].predicted {
            return curve[0].observed;
        }
        if raw >= curve[curve.len() - 1].predicted {
            return curve[curve.len() - 1].observed;
        }
        for pair in curve.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if raw >= lo.predicted && raw <= hi.predicted {
                let span = hi.predicted - lo.predicted;
                if span <= f64::EPSILON {
                    return lo.observed;
                }
                let t = (raw - lo.predicted) / span;
                return lo.observed + t * (hi.observed - lo.observed);
            }
        }
        raw
    }
}

/// Calibration maturity, based on the curve's sample weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStatus {
    /// Too few samples to adjust at all
    Uncalibrated,

    /// Enough samples to adjust, not enough to certify
    Calibrating,

    /// Fully calibrated
    Calibrated,
}

/// Sample-count thresholds for calibration maturity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationOptions {
    /// Minimum samples before any adjustment is applied
    pub min_samples_calibrating: u64,

    /// Minimum samples before the result counts as measured
    pub min_samples_calibrated: u64,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            min_samples_calibrating: 20,
            min_samples_calibrated: 200,
        }
    }
}

/// Result of [`adjust_for_calibration`]
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationAdjustment {
    /// The (possibly rewrapped) confidence value
    pub confidence: ConfidenceValue,

    /// Calibration maturity of the result
    pub status: CalibrationStatus,
}

/// Recompute a confidence value through an external calibration curve
///
/// Absent values are never adjusted (status stays uncalibrated). Below the
/// calibrating threshold the original value passes through unchanged; in the
/// calibrating band the adjusted value is derived from the original; past the
/// calibrated threshold the result is a measured value backed by the curve's
/// dataset.
pub fn adjust_for_calibration(
    confidence: &ConfidenceValue,
    report: &CalibrationReport,
    options: &CalibrationOptions,
) -> CalibrationAdjustment {
    let Some(raw) = confidence.numeric_value() else {
        return CalibrationAdjustment {
            confidence: confidence.clone(),
            status: CalibrationStatus::Uncalibrated,
        };
    };
    if report.sample_size < options.min_samples_calibrating {
        return CalibrationAdjustment {
            confidence: confidence.clone(),
            status: CalibrationStatus::Uncalibrated,
        };
    }

    let adjusted = report.apply(raw).clamp(0.0, 1.0);
    if report.sample_size < options.min_samples_calibrated {
        return CalibrationAdjustment {
            confidence: derive(
                adjusted,
                "calibrated(interpolated)",
                vec![ConfidenceInput {
                    name: "original".to_string(),
                    confidence: confidence.clone(),
                }],
            ),
            status: CalibrationStatus::Calibrating,
        };
    }

    // Wald interval half-width for the observed accuracy
    let n = report.sample_size as f64;
    let half_width = 1.96 * (adjusted * (1.0 - adjusted) / n).sqrt();
    let measurement = Measurement {
        dataset_id: report.dataset_id.clone(),
        sample_size: report.sample_size,
        accuracy: adjusted,
        ci95: (
            (adjusted - half_width).max(0.0),
            (adjusted + half_width).min(1.0),
        ),
        measured_at: report.generated_at,
    };
    CalibrationAdjustment {
        confidence: ConfidenceValue::Measured {
            value: adjusted,
            measurement,
        },
        status: CalibrationStatus::Calibrated,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn derived(value: f64) -> ConfidenceValue {
        ConfidenceValue::derived(value, "p", vec![]).unwrap()
    }

    proptest! {
        /// Property: and(a, b) <= min of effective values when both present
        #[test]
        fn test_and_bounded_by_min(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let result = and(&derived(a), &derived(b));
            let min = a.min(b);
            prop_assert!(result.effective_value() <= min + 1e-12);
        }

        /// Property: composition results stay inside [0, 1]
        #[test]
        fn test_compositions_in_unit_range(values in prop::collection::vec(0.0f64..=1.0, 1..8)) {
            let wrapped: Vec<_> = values.iter().map(|&v| derived(v)).collect();
            for result in [sequence(&wrapped), parallel_all(&wrapped), parallel_any(&wrapped)] {
                let v = result.numeric_value().unwrap();
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }

        /// Property: parallel_any never yields less than the best branch
        #[test]
        fn test_parallel_any_at_least_max(values in prop::collection::vec(0.0f64..=1.0, 1..8)) {
            let wrapped: Vec<_> = values.iter().map(|&v| derived(v)).collect();
            let max = values.iter().cloned().fold(0.0, f64::max);
            let result = parallel_any(&wrapped).numeric_value().unwrap();
            prop_assert!(result >= max - 1e-12);
        }

        /// Property: decay never increases confidence and is monotone in age
        #[test]
        fn test_decay_monotone(value in 0.0f64..=1.0, age in 0u64..100_000, older in 0u64..100_000) {
            let c = derived(value);
            let young = decay(&c, age, 10_000).numeric_value().unwrap();
            let old = decay(&c, age + older, 10_000).numeric_value().unwrap();
            prop_assert!(young <= value + 1e-12);
            prop_assert!(old <= young + 1e-12);
        }
    }
}
