//! Configuration for adjudicator operations
//!
//! Defines the staleness threshold, per-type confidence reductions, the
//! defeat floor, and the per-call application batch bound.

use credence_domain::{DefeaterType, Severity};
use serde::{Deserialize, Serialize};

const HOUR_MS: u64 = 60 * 60 * 1000;
const DAY_MS: u64 = 24 * HOUR_MS;

/// Configuration for the adjudicator
///
/// # Examples
///
/// ```
/// use credence_adjudicator::AdjudicatorConfig;
///
/// // Default configuration (balanced)
/// let config = AdjudicatorConfig::default();
/// assert_eq!(config.staleness_threshold_ms, 7 * 24 * 60 * 60 * 1000);
///
/// // Strict: shorter freshness window, higher defeat floor
/// let config = AdjudicatorConfig::strict();
/// assert!(config.staleness_threshold_ms < AdjudicatorConfig::default().staleness_threshold_ms);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjudicatorConfig {
    /// Age at which an active claim is flagged stale (ms)
    /// Default: 7 days
    pub staleness_threshold_ms: u64,

    /// Age multiple of the threshold at which staleness escalates from
    /// warning to partial severity
    /// Default: 2.0
    pub staleness_partial_multiple: f64,

    /// Maximum defeaters applied per `apply_defeaters` call - a latency and
    /// memory ceiling, not a correctness bound; callers loop to drain
    /// Default: 50
    pub max_batch_size: usize,

    /// Effective confidence below which a reduced claim is defeated
    /// Default: 0.2
    pub confidence_floor: f64,

    /// Base confidence reduction for a test failure defeater
    /// Default: 0.5 (failed test evidence is the most disqualifying)
    pub test_failure_reduction: f64,

    /// Base confidence reduction for a hash mismatch defeater
    /// Default: 0.5
    pub hash_mismatch_reduction: f64,

    /// Base confidence reduction for a code change defeater
    /// Default: 0.3
    pub code_change_reduction: f64,

    /// Base confidence reduction for a staleness defeater
    /// Default: 0.15
    pub staleness_reduction: f64,

    /// Base confidence reduction for a provider-unavailable defeater
    /// Default: 0.1 (degraded trust, not invalidation)
    pub provider_unavailable_reduction: f64,
}

impl Default for AdjudicatorConfig {
    fn default() -> Self {
        Self {
            staleness_threshold_ms: 7 * DAY_MS,
            staleness_partial_multiple: 2.0,
            max_batch_size: 50,
            confidence_floor: 0.2,
            test_failure_reduction: 0.5,
            hash_mismatch_reduction: 0.5,
            code_change_reduction: 0.3,
            staleness_reduction: 0.15,
            provider_unavailable_reduction: 0.1,
        }
    }
}

impl AdjudicatorConfig {
    /// Strict preset: short freshness window, higher defeat floor
    pub fn strict() -> Self {
        Self {
            staleness_threshold_ms: 2 * DAY_MS,
            confidence_floor: 0.35,
            ..Self::default()
        }
    }

    /// Lenient preset: long freshness window, lower defeat floor
    pub fn lenient() -> Self {
        Self {
            staleness_threshold_ms: 30 * DAY_MS,
            confidence_floor: 0.1,
            ..Self::default()
        }
    }

    /// Base confidence reduction for a defeater type
    pub fn base_reduction(&self, defeater_type: DefeaterType) -> f64 {
        match defeater_type {
            DefeaterType::TestFailure => self.test_failure_reduction,
            DefeaterType::HashMismatch => self.hash_mismatch_reduction,
            DefeaterType::CodeChange => self.code_change_reduction,
            DefeaterType::Staleness => self.staleness_reduction,
            DefeaterType::ProviderUnavailable => self.provider_unavailable_reduction,
        }
    }

    /// Reduction for a defeater type at a severity
    ///
    /// Warnings apply half the base reduction; partial and full apply it in
    /// full (a full defeater additionally forces the defeated transition
    /// regardless of the remaining confidence).
    pub fn reduction_for(&self, defeater_type: DefeaterType, severity: Severity) -> f64 {
        let base = self.base_reduction(defeater_type);
        match severity {
            Severity::Warning => base * 0.5,
            Severity::Partial | Severity::Full => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold_is_a_week() {
        assert_eq!(AdjudicatorConfig::default().staleness_threshold_ms, 7 * DAY_MS);
    }

    #[test]
    fn test_test_failures_reduce_most() {
        let config = AdjudicatorConfig::default();
        assert!(
            config.base_reduction(DefeaterType::TestFailure)
                > config.base_reduction(DefeaterType::Staleness)
        );
        assert!(
            config.base_reduction(DefeaterType::HashMismatch)
                > config.base_reduction(DefeaterType::ProviderUnavailable)
        );
    }

    #[test]
    fn test_warning_halves_reduction() {
        let config = AdjudicatorConfig::default();
        let full = config.reduction_for(DefeaterType::CodeChange, Severity::Partial);
        let warned = config.reduction_for(DefeaterType::CodeChange, Severity::Warning);
        assert!((warned - full / 2.0).abs() < 1e-12);
    }
}
