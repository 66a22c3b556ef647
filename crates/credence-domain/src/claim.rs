//! Claim module - the fundamental unit of the knowledge store
//!
//! Everything recorded about the system under study is a claim with
//! confidence, not a fact. Claims are created by collaborators (indexers,
//! extractors, test runners), mutated only by the defeater engine, and never
//! deleted - invalidation is a status transition, with full history in the
//! evidence ledger.

use crate::algebra::{self, WeightedInput};
use crate::confidence::{ConfidenceInput, ConfidenceValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a claim based on UUIDv7
///
/// UUIDv7 provides chronological sortability for temporal queries, 128-bit
/// uniqueness, and no coordination for distributed generation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClaimId(uuid::Uuid);

impl ClaimId {
    /// Generate a new UUIDv7-based ClaimId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse a ClaimId from a UUID string
    ///
    /// # Errors
    /// Returns an error for malformed UUID strings.
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid claim id: {}", e))
    }

    /// Get the timestamp component of the UUIDv7 (ms since Unix epoch)
    pub fn timestamp(&self) -> u64 {
        (self.0.as_u128() >> 80) as u64
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a claim
///
/// Claims are born active and decay toward stale/defeated/contradicted only
/// via the defeater engine. A resolved defeater returns a claim to stale -
/// never directly back to active - because "please re-derive" is not
/// "still true".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Trusted, in force
    Active,

    /// Needs re-derivation before it can be trusted again
    Stale,

    /// Invalidated by a full-severity defeater
    Defeated,

    /// In logical conflict with another claim about the same subject
    Contradicted,
}

impl ClaimStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Active => "active",
            ClaimStatus::Stale => "stale",
            ClaimStatus::Defeated => "defeated",
            ClaimStatus::Contradicted => "contradicted",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ClaimStatus::Active),
            "stale" => Some(ClaimStatus::Stale),
            "defeated" => Some(ClaimStatus::Defeated),
            "contradicted" => Some(ClaimStatus::Contradicted),
            _ => None,
        }
    }
}

/// Kind of collaborator that produced a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// An LLM extractor
    Llm,

    /// A test run
    Test,

    /// A static analysis pass
    StaticAnalysis,

    /// The code indexer
    Indexer,

    /// A human annotation
    Human,
}

/// Where a claim came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSource {
    /// Kind of producer
    pub source_type: SourceType,

    /// Producer-specific identifier (test name, model name, pass name)
    pub id: String,
}

/// Source location a claim's subject refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Repository-relative file path
    pub file: String,

    /// Optional line number
    pub line: Option<u32>,
}

/// What a claim is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSubject {
    /// Kind of subject (e.g. "function", "module", "dependency")
    pub kind: String,

    /// Stable identifier of the subject within its kind
    pub identifier: String,

    /// Optional source location
    pub location: Option<SourceLocation>,
}

impl ClaimSubject {
    /// Whether two subjects denote the same thing (kind + identifier)
    pub fn same_as(&self, other: &ClaimSubject) -> bool {
        self.kind == other.kind && self.identifier == other.identifier
    }
}

/// Composite multi-factor confidence for a claim
///
/// Each factor is optional; the overall value is the weighted average over
/// the present factors via [`algebra::combined`]. Defeater reductions are
/// recorded as an explicit adjustment layered over the factors, so the
/// pre-reduction provenance survives.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClaimConfidence {
    /// How well the supporting evidence was retrieved
    pub retrieval: Option<ConfidenceValue>,

    /// Structural (AST-level) agreement
    pub structural: Option<ConfidenceValue>,

    /// Semantic agreement
    pub semantic: Option<ConfidenceValue>,

    /// Test execution backing
    pub test_execution: Option<ConfidenceValue>,

    /// Freshness of the evidence
    pub recency: Option<ConfidenceValue>,

    /// Defeater-applied adjustment; overrides the factor combination when set
    pub adjusted: Option<ConfidenceValue>,
}

/// Factor weights for the overall combination
const FACTOR_WEIGHTS: [(&str, f64); 5] = [
    ("retrieval", 0.2),
    ("structural", 0.25),
    ("semantic", 0.2),
    ("test_execution", 0.25),
    ("recency", 0.1),
];

impl ClaimConfidence {
    /// Composite with no factors at all; overall is absent (uncalibrated)
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Build a composite with a single factor
    ///
    /// Convenience for producers that only have one score. Unrecognized
    /// factor names land on the semantic factor.
    pub fn from_single(factor_name: &str, confidence: ConfidenceValue) -> Self {
        let mut composite = Self::default();
        match factor_name {
            "retrieval" => composite.retrieval = Some(confidence),
            "structural" => composite.structural = Some(confidence),
            "semantic" => composite.semantic = Some(confidence),
            "test_execution" => composite.test_execution = Some(confidence),
            "recency" => composite.recency = Some(confidence),
            _ => composite.semantic = Some(confidence),
        }
        composite
    }

    /// Reduce the overall confidence to a single ConfidenceValue
    ///
    /// Returns the defeater adjustment when one has been applied, otherwise
    /// the weighted combination of the present factors; absent (uncalibrated)
    /// when no factor is present.
    pub fn overall(&self) -> ConfidenceValue {
        if let Some(adjusted) = &self.adjusted {
            return adjusted.clone();
        }
        let factors = [
            &self.retrieval,
            &self.structural,
            &self.semantic,
            &self.test_execution,
            &self.recency,
        ];
        let inputs: Vec<WeightedInput> = FACTOR_WEIGHTS
            .iter()
            .zip(factors)
            .filter_map(|(&(name, weight), factor)| {
                factor.as_ref().map(|confidence| WeightedInput {
                    name: name.to_string(),
                    confidence: confidence.clone(),
                    weight,
                })
            })
            .collect();
        algebra::combined(&inputs)
    }

    /// Conservative scalar for gating and floor checks
    pub fn effective_value(&self) -> f64 {
        self.overall().effective_value()
    }

    /// Apply a defeater confidence reduction
    ///
    /// Subtracts `amount` from the current overall value (floored at 0) and
    /// records the result as a derived adjustment with the prior overall as
    /// input. An absent overall stays absent: reducing an unknown does not
    /// make it known.
    pub fn apply_reduction(&mut self, amount: f64) {
        let prior = self.overall();
        let Some(value) = prior.numeric_value() else {
            return;
        };
        let reduced = (value - amount).max(0.0);
        self.adjusted = Some(ConfidenceValue::Derived {
            value: reduced,
            formula: format!("defeater_reduction({:.3})", amount),
            inputs: vec![ConfidenceInput {
                name: "prior".to_string(),
                confidence: prior,
            }],
        });
    }
}

/// A claim - a proposition about the system under study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,

    /// The proposition being claimed
    pub proposition: String,

    /// Category of claim (e.g. "behavior", "dependency", "invariant")
    pub claim_type: String,

    /// What the claim is about
    pub subject: ClaimSubject,

    /// Where the claim came from
    pub source: ClaimSource,

    /// Composite multi-factor confidence
    pub confidence: ClaimConfidence,

    /// Lifecycle status
    pub status: ClaimStatus,

    /// When this claim was created (ms since Unix epoch)
    pub created_at: u64,
}

impl Claim {
    /// Create a new active claim
    pub fn new(
        proposition: impl Into<String>,
        claim_type: impl Into<String>,
        subject: ClaimSubject,
        source: ClaimSource,
        confidence: ClaimConfidence,
        created_at: u64,
    ) -> Self {
        Self {
            id: ClaimId::new(),
            proposition: proposition.into(),
            claim_type: claim_type.into(),
            subject,
            source,
            confidence,
            status: ClaimStatus::Active,
            created_at,
        }
    }

    /// Age of the claim relative to `now_ms`
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at)
    }
}
