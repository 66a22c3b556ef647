//! Core adjudicator implementation
//!
//! Detection is a pure read-only scan over the claim store plus the incoming
//! signals; application mutates the store (confidence reduction, status
//! transitions); resolution terminates defeaters; health assessment reports
//! on the aggregate graph. `run_cycle` composes all of them - it is the unit
//! an external scheduler invokes per cycle.

use crate::config::AdjudicatorConfig;
use crate::error::AdjudicatorError;
use crate::judge::LexicalNegationJudge;
use crate::metrics::AdjudicatorMetrics;
use crate::signals::DetectionSignals;
use credence_domain::traits::{ClaimStore, ContradictionJudge};
use credence_domain::{
    Claim, ClaimId, ClaimStatus, Contradiction, Defeater, DefeaterId, DefeaterStatus,
    DefeaterType, Severity,
};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current timestamp in milliseconds since Unix epoch
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn store_err<E: Display>(e: E) -> AdjudicatorError {
    AdjudicatorError::Store(e.to_string())
}

/// Result of a detection pass - nothing has been persisted yet
#[derive(Debug, Clone, Default)]
pub struct DetectionReport {
    /// Defeaters detected, one per root cause
    pub defeaters: Vec<Defeater>,

    /// Contradictions detected between candidate and existing claims
    pub contradictions: Vec<Contradiction>,

    /// Every claim id touched by a defeater or contradiction, deduplicated
    pub affected_claim_ids: Vec<ClaimId>,
}

/// Result of applying a detection report to the claim store
#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    /// Defeaters persisted with status active (at most `max_batch_size`)
    pub activated_defeaters: Vec<Defeater>,

    /// Claims whose confidence or status changed, in their final state
    pub updated_claims: Vec<Claim>,

    /// Contradictions persisted
    pub recorded_contradictions: Vec<Contradiction>,
}

/// Aggregate health of the claim graph
#[derive(Debug, Clone)]
pub struct GraphHealth {
    /// Overall health in [0, 1]; near 1 for an empty or healthy graph,
    /// decreasing monotonically with defeater and contradiction load
    pub overall_health: f64,

    /// Claims with status active
    pub active_claim_count: usize,

    /// Defeaters with status active
    pub active_defeater_count: usize,

    /// Contradictions with status open
    pub unresolved_contradiction_count: usize,

    /// Worst problems first; non-empty whenever defeaters are active
    pub top_issues: Vec<String>,

    /// Suggested remediations; non-empty whenever defeaters are active
    pub recommendations: Vec<String>,
}

/// Everything one cycle produced
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// What detection found
    pub detection: DetectionReport,

    /// What application changed
    pub outcome: ApplyOutcome,

    /// Graph health after application
    pub health: GraphHealth,
}

/// How to resolve a defeater
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Mark every touched claim stale so it gets re-derived; the honest
    /// default - a resolved defeater never restores `active`
    Revalidate,

    /// Resolve the defeater without touching claims (operator-acknowledged
    /// false positive)
    Dismiss,
}

/// One prioritized entry in the remediation queue
#[derive(Debug, Clone)]
pub struct ResolutionAction {
    /// The defeater to resolve
    pub defeater_id: DefeaterId,

    /// Its type
    pub defeater_type: DefeaterType,

    /// Its severity (full first in the queue)
    pub severity: Severity,

    /// How many claims it affects
    pub affected_claim_count: usize,

    /// Whether resolution can proceed without a human
    pub auto_resolvable: bool,

    /// Suggested resolution
    pub suggested: Resolution,

    /// The defeater's description
    pub description: String,
}

/// The defeater engine
///
/// Holds configuration, a pluggable contradiction judge, and cumulative
/// metrics. All store access goes through the [`ClaimStore`] trait; storage
/// errors are fatal and propagate to the caller.
pub struct Adjudicator {
    config: AdjudicatorConfig,
    judge: Box<dyn ContradictionJudge>,
    metrics: AdjudicatorMetrics,
}

impl Adjudicator {
    /// Create an adjudicator with the given configuration and the default
    /// lexical contradiction judge
    pub fn new(config: AdjudicatorConfig) -> Self {
        Self::with_judge(config, Box::new(LexicalNegationJudge))
    }

    /// Create an adjudicator with default configuration
    pub fn default_config() -> Self {
        Self::new(AdjudicatorConfig::default())
    }

    /// Create an adjudicator with a custom contradiction judge
    pub fn with_judge(config: AdjudicatorConfig, judge: Box<dyn ContradictionJudge>) -> Self {
        Self {
            config,
            judge,
            metrics: AdjudicatorMetrics::new(),
        }
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &AdjudicatorMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Detect defeaters and contradictions - a pure read-only scan
    ///
    /// Nothing is persisted; the report must be handed to
    /// [`apply_defeaters`](Self::apply_defeaters) to take effect. Absent
    /// signals produce an empty report, never an error.
    pub fn detect_defeaters<S: ClaimStore>(
        &self,
        store: &S,
        signals: &DetectionSignals,
    ) -> Result<DetectionReport, AdjudicatorError>
    where
        S::Error: Display,
    {
        let now = current_timestamp_ms();
        let active = store.active_claims().map_err(store_err)?;

        let mut defeaters = Vec::new();

        self.detect_staleness(&active, now, &mut defeaters);
        self.detect_code_changes(&active, signals, now, &mut defeaters);
        self.detect_test_failures(&active, signals, now, &mut defeaters);
        self.detect_hash_mismatches(store, signals, now, &mut defeaters)?;
        self.detect_provider_outages(&active, signals, now, &mut defeaters);

        let contradictions = self.detect_contradictions(&active, signals, now);

        let mut seen: HashSet<ClaimId> = HashSet::new();
        let mut affected_claim_ids = Vec::new();
        for id in defeaters
            .iter()
            .flat_map(|d| d.affected_claim_ids.iter())
            .chain(contradictions.iter().flat_map(|c| [&c.claim_a, &c.claim_b]))
        {
            if seen.insert(*id) {
                affected_claim_ids.push(*id);
            }
        }

        Ok(DetectionReport {
            defeaters,
            contradictions,
            affected_claim_ids,
        })
    }

    /// Flag active claims older than the staleness threshold
    ///
    /// Severity escalates from warning to partial once age passes
    /// `staleness_partial_multiple` times the threshold.
    fn detect_staleness(&self, active: &[Claim], now: u64, out: &mut Vec<Defeater>) {
        let threshold = self.config.staleness_threshold_ms;
        let partial_at = (threshold as f64 * self.config.staleness_partial_multiple) as u64;
        for claim in active {
            let age = claim.age_ms(now);
            if age < threshold {
                continue;
            }
            let severity = if age >= partial_at {
                Severity::Partial
            } else {
                Severity::Warning
            };
            out.push(Defeater::new(
                DefeaterType::Staleness,
                format!(
                    "claim {} aged {} ms past the {} ms freshness threshold",
                    claim.id,
                    age - threshold,
                    threshold
                ),
                severity,
                vec![claim.id],
                self.config.reduction_for(DefeaterType::Staleness, severity),
                true,
                now,
            ));
        }
    }

    /// One code-change defeater per changed file, covering all of that
    /// file's claims
    fn detect_code_changes(
        &self,
        active: &[Claim],
        signals: &DetectionSignals,
        now: u64,
        out: &mut Vec<Defeater>,
    ) {
        let mut by_file: BTreeMap<&str, Vec<ClaimId>> = BTreeMap::new();
        for claim in active {
            if let Some(location) = &claim.subject.location {
                if signals.changed_files.contains(&location.file) {
                    by_file.entry(&location.file).or_default().push(claim.id);
                }
            }
        }
        for (file, claim_ids) in by_file {
            let count = claim_ids.len();
            out.push(Defeater::new(
                DefeaterType::CodeChange,
                format!("{} changed; {} claim(s) reference it", file, count),
                Severity::Partial,
                claim_ids,
                self.config
                    .reduction_for(DefeaterType::CodeChange, Severity::Partial),
                true,
                now,
            ));
        }
    }

    /// One test-failure defeater per failed test, severity full: test
    /// evidence that failed is immediately disqualifying
    fn detect_test_failures(
        &self,
        active: &[Claim],
        signals: &DetectionSignals,
        now: u64,
        out: &mut Vec<Defeater>,
    ) {
        let mut by_test: BTreeMap<&str, Vec<ClaimId>> = BTreeMap::new();
        for claim in active {
            if claim.source.source_type == credence_domain::SourceType::Test
                && signals.failed_tests.contains(&claim.source.id)
            {
                by_test.entry(&claim.source.id).or_default().push(claim.id);
            }
        }
        for (test_id, claim_ids) in by_test {
            out.push(Defeater::new(
                DefeaterType::TestFailure,
                format!("test '{}' failed", test_id),
                Severity::Full,
                claim_ids,
                self.config
                    .reduction_for(DefeaterType::TestFailure, Severity::Full),
                false,
                now,
            ));
        }
    }

    /// One hash-mismatch defeater per supplied mismatch, severity full
    fn detect_hash_mismatches<S: ClaimStore>(
        &self,
        store: &S,
        signals: &DetectionSignals,
        now: u64,
        out: &mut Vec<Defeater>,
    ) -> Result<(), AdjudicatorError>
    where
        S::Error: Display,
    {
        for mismatch in &signals.hash_mismatches {
            if store.get_claim(mismatch.claim_id).map_err(store_err)?.is_none() {
                continue;
            }
            out.push(Defeater::new(
                DefeaterType::HashMismatch,
                format!(
                    "input hash for claim {} drifted: expected {}, found {}",
                    mismatch.claim_id, mismatch.expected, mismatch.actual
                ),
                Severity::Full,
                vec![mismatch.claim_id],
                self.config
                    .reduction_for(DefeaterType::HashMismatch, Severity::Full),
                false,
                now,
            ));
        }
        Ok(())
    }

    /// One provider-unavailable defeater per provider, severity warning:
    /// degraded trust, not invalidation
    fn detect_provider_outages(
        &self,
        active: &[Claim],
        signals: &DetectionSignals,
        now: u64,
        out: &mut Vec<Defeater>,
    ) {
        let mut by_provider: BTreeMap<&str, Vec<ClaimId>> = BTreeMap::new();
        for claim in active {
            if claim.source.source_type == credence_domain::SourceType::Llm
                && signals.unavailable_providers.contains(&claim.source.id)
            {
                by_provider
                    .entry(&claim.source.id)
                    .or_default()
                    .push(claim.id);
            }
        }
        for (provider, claim_ids) in by_provider {
            out.push(Defeater::new(
                DefeaterType::ProviderUnavailable,
                format!("provider '{}' is unavailable", provider),
                Severity::Warning,
                claim_ids,
                self.config
                    .reduction_for(DefeaterType::ProviderUnavailable, Severity::Warning),
                true,
                now,
            ));
        }
    }

    /// Check each candidate claim against existing claims on the same
    /// subject through the pluggable judge
    fn detect_contradictions(
        &self,
        active: &[Claim],
        signals: &DetectionSignals,
        now: u64,
    ) -> Vec<Contradiction> {
        let mut contradictions = Vec::new();
        for candidate in &signals.candidate_claims {
            for existing in active {
                if candidate.id == existing.id {
                    continue;
                }
                if let Some(finding) = self.judge.judge(candidate, existing) {
                    contradictions.push(Contradiction::new(
                        candidate.id,
                        existing.id,
                        finding.contradiction_type,
                        finding.severity,
                        finding.description,
                        now,
                    ));
                }
            }
        }
        contradictions
    }

    /// Apply a detection report to the claim store
    ///
    /// Processes at most `max_batch_size` defeaters per call; callers loop to
    /// drain a larger backlog. Application is NOT internally deduplicated:
    /// calling this twice on the same unmodified report double-reduces
    /// confidence. Apply each report exactly once.
    pub fn apply_defeaters<S: ClaimStore>(
        &mut self,
        store: &mut S,
        report: &DetectionReport,
    ) -> Result<ApplyOutcome, AdjudicatorError>
    where
        S::Error: Display,
    {
        let mut activated_defeaters = Vec::new();
        let mut updated: BTreeMap<ClaimId, Claim> = BTreeMap::new();
        let mut defeated = 0usize;
        let mut contradicted = 0usize;

        for defeater in report.defeaters.iter().take(self.config.max_batch_size) {
            store.upsert_defeater(defeater.clone()).map_err(store_err)?;
            for claim_id in &defeater.affected_claim_ids {
                let Some(mut claim) = store.get_claim(*claim_id).map_err(store_err)? else {
                    continue;
                };
                claim.confidence.apply_reduction(defeater.confidence_reduction);
                let below_floor =
                    claim.confidence.effective_value() < self.config.confidence_floor;
                if (defeater.severity == Severity::Full || below_floor)
                    && claim.status == ClaimStatus::Active
                {
                    claim.status = ClaimStatus::Defeated;
                    defeated += 1;
                }
                store.upsert_claim(claim.clone()).map_err(store_err)?;
                updated.insert(claim.id, claim);
            }
            activated_defeaters.push(defeater.clone());
        }

        let mut recorded_contradictions = Vec::new();
        for contradiction in &report.contradictions {
            store
                .record_contradiction(contradiction.clone())
                .map_err(store_err)?;
            for claim_id in [contradiction.claim_a, contradiction.claim_b] {
                let Some(mut claim) = store.get_claim(claim_id).map_err(store_err)? else {
                    continue;
                };
                if claim.status != ClaimStatus::Contradicted {
                    claim.status = ClaimStatus::Contradicted;
                    contradicted += 1;
                }
                store.upsert_claim(claim.clone()).map_err(store_err)?;
                updated.insert(claim.id, claim);
            }
            recorded_contradictions.push(contradiction.clone());
        }

        self.metrics
            .record_application(activated_defeaters.len(), defeated, contradicted);
        tracing::debug!(
            activated = activated_defeaters.len(),
            defeated,
            contradicted,
            "applied detection report"
        );

        Ok(ApplyOutcome {
            activated_defeaters,
            updated_claims: updated.into_values().collect(),
            recorded_contradictions,
        })
    }

    /// Prioritized remediation queue over active defeaters
    ///
    /// Full severity first, then by how many claims a defeater affects.
    pub fn get_resolution_actions<S: ClaimStore>(
        &self,
        store: &S,
    ) -> Result<Vec<ResolutionAction>, AdjudicatorError>
    where
        S::Error: Display,
    {
        let mut defeaters = store.active_defeaters().map_err(store_err)?;
        defeaters.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| b.affected_claim_ids.len().cmp(&a.affected_claim_ids.len()))
        });
        Ok(defeaters
            .into_iter()
            .map(|defeater| {
                let suggested =
                    if defeater.severity == Severity::Warning && defeater.auto_resolvable {
                        Resolution::Dismiss
                    } else {
                        Resolution::Revalidate
                    };
                ResolutionAction {
                    defeater_id: defeater.id,
                    defeater_type: defeater.defeater_type,
                    severity: defeater.severity,
                    affected_claim_count: defeater.affected_claim_ids.len(),
                    auto_resolvable: defeater.auto_resolvable,
                    suggested,
                    description: defeater.description,
                }
            })
            .collect())
    }

    /// Resolve a defeater
    ///
    /// For [`Resolution::Revalidate`] every claim the defeater touched is set
    /// to stale - needs re-derivation - never back to active.
    /// [`Resolution::Dismiss`] resolves the defeater without touching claims.
    ///
    /// Returns the ids of claims marked stale.
    pub fn resolve_defeater<S: ClaimStore>(
        &mut self,
        store: &mut S,
        defeater_id: DefeaterId,
        resolution: Resolution,
    ) -> Result<Vec<ClaimId>, AdjudicatorError>
    where
        S::Error: Display,
    {
        let mut defeater = store
            .get_defeater(defeater_id)
            .map_err(store_err)?
            .ok_or(AdjudicatorError::DefeaterNotFound(defeater_id))?;
        defeater.status = DefeaterStatus::Resolved;
        let affected = defeater.affected_claim_ids.clone();
        store.upsert_defeater(defeater).map_err(store_err)?;

        let mut marked_stale = Vec::new();
        if resolution == Resolution::Revalidate {
            for claim_id in affected {
                let Some(mut claim) = store.get_claim(claim_id).map_err(store_err)? else {
                    continue;
                };
                claim.status = ClaimStatus::Stale;
                store.upsert_claim(claim).map_err(store_err)?;
                marked_stale.push(claim_id);
            }
        }
        self.metrics.record_resolution(marked_stale.len());
        Ok(marked_stale)
    }

    /// Assess aggregate graph health
    ///
    /// Health starts near 1.0 for an empty graph and decreases monotonically
    /// as active-defeater and open-contradiction counts grow relative to the
    /// claim count.
    pub fn assess_graph_health<S: ClaimStore>(
        &self,
        store: &S,
    ) -> Result<GraphHealth, AdjudicatorError>
    where
        S::Error: Display,
    {
        let active_claims = store.active_claims().map_err(store_err)?;
        let active_defeaters = store.active_defeaters().map_err(store_err)?;
        let open_contradictions = store.unresolved_contradictions().map_err(store_err)?;

        let claim_count = active_claims.len();
        let defeater_count = active_defeaters.len();
        let contradiction_count = open_contradictions.len();

        let defeater_load = (defeater_count as f64 / (claim_count + 1) as f64).min(1.0);
        let contradiction_load =
            (contradiction_count as f64 / (claim_count + 1) as f64).min(1.0);
        let overall_health = (1.0 - 0.5 * defeater_load - 0.4 * contradiction_load).max(0.0);

        let mut top_issues = Vec::new();
        let mut worst = active_defeaters.clone();
        worst.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| b.affected_claim_ids.len().cmp(&a.affected_claim_ids.len()))
        });
        for defeater in worst.iter().take(3) {
            top_issues.push(format!(
                "[{}/{}] {} ({} claim(s) affected)",
                defeater.severity.as_str(),
                defeater.defeater_type.as_str(),
                defeater.description,
                defeater.affected_claim_ids.len()
            ));
        }
        if contradiction_count > 0 {
            top_issues.push(format!(
                "{} open contradiction(s) blocking both sides",
                contradiction_count
            ));
        }

        let mut recommendations = Vec::new();
        let types_present: HashSet<DefeaterType> =
            active_defeaters.iter().map(|d| d.defeater_type).collect();
        if types_present.contains(&DefeaterType::TestFailure) {
            recommendations.push("re-run failing tests, then resolve with revalidate".to_string());
        }
        if types_present.contains(&DefeaterType::CodeChange)
            || types_present.contains(&DefeaterType::HashMismatch)
        {
            recommendations.push("re-derive claims over the changed files".to_string());
        }
        if types_present.contains(&DefeaterType::Staleness) {
            recommendations.push("schedule re-derivation of stale claims".to_string());
        }
        if types_present.contains(&DefeaterType::ProviderUnavailable) {
            recommendations
                .push("restore provider availability or switch sources".to_string());
        }
        if contradiction_count > 0 {
            recommendations
                .push("resolve open contradictions before trusting either side".to_string());
        }
        if defeater_count > 0 && recommendations.is_empty() {
            recommendations.push("drain the resolution queue".to_string());
        }

        Ok(GraphHealth {
            overall_health,
            active_claim_count: claim_count,
            active_defeater_count: defeater_count,
            unresolved_contradiction_count: contradiction_count,
            top_issues,
            recommendations,
        })
    }

    /// Run one full cycle: detect, apply, assess
    ///
    /// This is the unit an external scheduler invokes per cycle. The report
    /// produced by detection is applied exactly once.
    pub fn run_cycle<S: ClaimStore>(
        &mut self,
        store: &mut S,
        signals: &DetectionSignals,
    ) -> Result<CycleReport, AdjudicatorError>
    where
        S::Error: Display,
    {
        let detection = self.detect_defeaters(store, signals)?;
        self.metrics
            .record_detection(detection.defeaters.len(), detection.contradictions.len());

        let outcome = self.apply_defeaters(store, &detection)?;
        let health = self.assess_graph_health(store)?;

        self.metrics.record_cycle();
        tracing::info!(
            defeaters = detection.defeaters.len(),
            contradictions = detection.contradictions.len(),
            health = health.overall_health,
            "adjudication cycle complete"
        );

        Ok(CycleReport {
            detection,
            outcome,
            health,
        })
    }
}
