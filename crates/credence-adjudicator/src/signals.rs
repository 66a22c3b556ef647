//! Detection signals
//!
//! External facts the adjudicator consumes on each cycle: changed files,
//! failed tests, unavailable providers, hash mismatches, and new candidate
//! claims. Collaborators (indexer, test runner, provider adapters) gather
//! them; the engine never reaches out on its own.

use credence_domain::{Claim, ClaimId};
use std::collections::HashSet;

/// An externally observed content-hash mismatch for a claim
#[derive(Debug, Clone, PartialEq)]
pub struct HashMismatch {
    /// The claim whose input hash no longer matches
    pub claim_id: ClaimId,

    /// Hash recorded when the claim was derived
    pub expected: String,

    /// Hash observed now
    pub actual: String,
}

/// Signals consumed by one detection pass
///
/// An empty signal set is not an error: detection returns an empty report.
#[derive(Debug, Clone, Default)]
pub struct DetectionSignals {
    /// Repository-relative paths of files that changed
    pub changed_files: HashSet<String>,

    /// Source identifiers of tests that failed
    pub failed_tests: HashSet<String>,

    /// Source identifiers of providers currently unavailable
    pub unavailable_providers: HashSet<String>,

    /// Externally supplied hash mismatches
    pub hash_mismatches: Vec<HashMismatch>,

    /// New candidate claims to check against existing claims for
    /// contradictions
    pub candidate_claims: Vec<Claim>,
}

impl DetectionSignals {
    /// Add changed file paths
    pub fn with_changed_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changed_files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Add failed test identifiers
    pub fn with_failed_tests<I, S>(mut self, tests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failed_tests.extend(tests.into_iter().map(Into::into));
        self
    }

    /// Add unavailable provider identifiers
    pub fn with_unavailable_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unavailable_providers
            .extend(providers.into_iter().map(Into::into));
        self
    }

    /// Add hash mismatches
    pub fn with_hash_mismatches(mut self, mismatches: Vec<HashMismatch>) -> Self {
        self.hash_mismatches.extend(mismatches);
        self
    }

    /// Add candidate claims for contradiction checking
    pub fn with_candidates(mut self, claims: Vec<Claim>) -> Self {
        self.candidate_claims.extend(claims);
        self
    }

    /// Whether no signal of any kind is present
    pub fn is_empty(&self) -> bool {
        self.changed_files.is_empty()
            && self.failed_tests.is_empty()
            && self.unavailable_providers.is_empty()
            && self.hash_mismatches.is_empty()
            && self.candidate_claims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_accumulate() {
        let signals = DetectionSignals::default()
            .with_changed_files(["a.rs", "b.rs"])
            .with_failed_tests(["t1"])
            .with_unavailable_providers(["ollama"]);
        assert_eq!(signals.changed_files.len(), 2);
        assert_eq!(signals.failed_tests.len(), 1);
        assert!(!signals.is_empty());
    }

    #[test]
    fn test_default_is_empty() {
        assert!(DetectionSignals::default().is_empty());
    }
}
