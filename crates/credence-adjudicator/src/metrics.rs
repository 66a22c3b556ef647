//! Metrics collection for adjudicator operations

use serde::{Deserialize, Serialize};

/// Cumulative counters across adjudicator cycles
///
/// # Examples
///
/// ```
/// use credence_adjudicator::AdjudicatorMetrics;
///
/// let mut metrics = AdjudicatorMetrics::new();
/// metrics.record_detection(3, 1);
/// assert_eq!(metrics.defeaters_detected, 3);
/// println!("{}", metrics.summary());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjudicatorMetrics {
    /// Number of full cycles run
    pub cycles_run: u64,

    /// Defeaters produced by detection
    pub defeaters_detected: u64,

    /// Contradictions produced by detection
    pub contradictions_detected: u64,

    /// Defeaters persisted and applied
    pub defeaters_applied: u64,

    /// Defeaters resolved
    pub defeaters_resolved: u64,

    /// Claims transitioned to defeated
    pub claims_defeated: u64,

    /// Claims transitioned to contradicted
    pub claims_contradicted: u64,

    /// Claims transitioned to stale by resolution
    pub claims_marked_stale: u64,
}

impl AdjudicatorMetrics {
    /// Create zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a detection pass
    pub fn record_detection(&mut self, defeaters: usize, contradictions: usize) {
        self.defeaters_detected += defeaters as u64;
        self.contradictions_detected += contradictions as u64;
    }

    /// Record the outcome of an application pass
    pub fn record_application(&mut self, applied: usize, defeated: usize, contradicted: usize) {
        self.defeaters_applied += applied as u64;
        self.claims_defeated += defeated as u64;
        self.claims_contradicted += contradicted as u64;
    }

    /// Record one resolution
    pub fn record_resolution(&mut self, claims_marked_stale: usize) {
        self.defeaters_resolved += 1;
        self.claims_marked_stale += claims_marked_stale as u64;
    }

    /// Record one completed cycle
    pub fn record_cycle(&mut self) {
        self.cycles_run += 1;
    }

    /// Reset all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        format!(
            "cycles: {}, detected: {} defeaters / {} contradictions, applied: {}, \
             resolved: {}, defeated: {}, contradicted: {}, marked stale: {}",
            self.cycles_run,
            self.defeaters_detected,
            self.contradictions_detected,
            self.defeaters_applied,
            self.defeaters_resolved,
            self.claims_defeated,
            self.claims_contradicted,
            self.claims_marked_stale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let mut metrics = AdjudicatorMetrics::new();
        metrics.record_detection(2, 1);
        metrics.record_detection(3, 0);
        metrics.record_application(4, 1, 2);
        metrics.record_resolution(3);
        metrics.record_cycle();
        assert_eq!(metrics.defeaters_detected, 5);
        assert_eq!(metrics.contradictions_detected, 1);
        assert_eq!(metrics.defeaters_applied, 4);
        assert_eq!(metrics.claims_defeated, 1);
        assert_eq!(metrics.claims_marked_stale, 3);
        assert_eq!(metrics.cycles_run, 1);
    }

    #[test]
    fn test_reset() {
        let mut metrics = AdjudicatorMetrics::new();
        metrics.record_cycle();
        metrics.reset();
        assert_eq!(metrics.cycles_run, 0);
    }
}
