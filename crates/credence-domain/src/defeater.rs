//! Defeater and contradiction records
//!
//! A defeater is a detected event that reduces or invalidates the confidence
//! of one or more claims; a contradiction is a detected logical conflict
//! between two claims about the same subject. Both are created by the
//! detection pass, persisted on application, and terminated by resolution.

use crate::claim::ClaimId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a defeater based on UUIDv7
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DefeaterId(uuid::Uuid);

impl DefeaterId {
    /// Generate a new UUIDv7-based DefeaterId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse a DefeaterId from a UUID string
    ///
    /// # Errors
    /// Returns an error for malformed UUID strings.
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid defeater id: {}", e))
    }
}

impl Default for DefeaterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DefeaterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of invalidating signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefeaterType {
    /// Claim aged past the freshness threshold
    Staleness,

    /// The file the claim is about changed
    CodeChange,

    /// The test the claim is sourced from failed
    TestFailure,

    /// The content hash the claim was derived from no longer matches
    HashMismatch,

    /// The provider the claim is sourced from is unavailable
    ProviderUnavailable,
}

impl DefeaterType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DefeaterType::Staleness => "staleness",
            DefeaterType::CodeChange => "code_change",
            DefeaterType::TestFailure => "test_failure",
            DefeaterType::HashMismatch => "hash_mismatch",
            DefeaterType::ProviderUnavailable => "provider_unavailable",
        }
    }

    /// Parse a type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "staleness" => Some(DefeaterType::Staleness),
            "code_change" => Some(DefeaterType::CodeChange),
            "test_failure" => Some(DefeaterType::TestFailure),
            "hash_mismatch" => Some(DefeaterType::HashMismatch),
            "provider_unavailable" => Some(DefeaterType::ProviderUnavailable),
            _ => None,
        }
    }
}

/// How strongly a defeater degrades confidence
///
/// Ordered: `Warning < Partial < Full`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Degraded trust; the claim stays active
    Warning,

    /// Substantial confidence loss; the claim stays active
    Partial,

    /// Immediately disqualifying; the claim is defeated
    Full,
}

impl Severity {
    /// Get the severity name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Partial => "partial",
            Severity::Full => "full",
        }
    }

    /// Parse a severity from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "warning" => Some(Severity::Warning),
            "partial" => Some(Severity::Partial),
            "full" => Some(Severity::Full),
            _ => None,
        }
    }
}

/// Lifecycle status of a defeater
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefeaterStatus {
    /// In force against its affected claims
    Active,

    /// Resolved; affected claims were handed to revalidation
    Resolved,
}

impl DefeaterStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DefeaterStatus::Active => "active",
            DefeaterStatus::Resolved => "resolved",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(DefeaterStatus::Active),
            "resolved" => Some(DefeaterStatus::Resolved),
            _ => None,
        }
    }
}

/// A detected event that reduces or invalidates claims
///
/// Multiple claims affected by the same root cause (same file, same test)
/// share a single defeater with a multi-element `affected_claim_ids`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defeater {
    /// Unique identifier
    pub id: DefeaterId,

    /// Kind of invalidating signal
    pub defeater_type: DefeaterType,

    /// Human-readable description of the root cause
    pub description: String,

    /// How strongly this degrades confidence
    pub severity: Severity,

    /// Every claim this defeater applies to
    pub affected_claim_ids: Vec<ClaimId>,

    /// Confidence reduction applied per affected claim, in [0, 1]
    pub confidence_reduction: f64,

    /// Whether resolution can proceed without a human in the loop
    pub auto_resolvable: bool,

    /// Lifecycle status
    pub status: DefeaterStatus,

    /// When this defeater was detected (ms since Unix epoch)
    pub detected_at: u64,
}

impl Defeater {
    /// Create a new active defeater
    pub fn new(
        defeater_type: DefeaterType,
        description: impl Into<String>,
        severity: Severity,
        affected_claim_ids: Vec<ClaimId>,
        confidence_reduction: f64,
        auto_resolvable: bool,
        detected_at: u64,
    ) -> Self {
        Self {
            id: DefeaterId::new(),
            defeater_type,
            description: description.into(),
            severity,
            affected_claim_ids,
            confidence_reduction: confidence_reduction.clamp(0.0, 1.0),
            auto_resolvable,
            status: DefeaterStatus::Active,
            detected_at,
        }
    }
}

/// Kind of logical conflict between two claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionType {
    /// The propositions directly negate each other
    Direct,

    /// One proposition implies the negation of the other
    Implicational,

    /// The propositions conflict over time ordering
    Temporal,

    /// The propositions conflict over scope
    Scope,
}

impl ContradictionType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContradictionType::Direct => "direct",
            ContradictionType::Implicational => "implicational",
            ContradictionType::Temporal => "temporal",
            ContradictionType::Scope => "scope",
        }
    }

    /// Parse a type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "direct" => Some(ContradictionType::Direct),
            "implicational" => Some(ContradictionType::Implicational),
            "temporal" => Some(ContradictionType::Temporal),
            "scope" => Some(ContradictionType::Scope),
            _ => None,
        }
    }
}

/// How serious a contradiction is
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionSeverity {
    /// Cosmetic disagreement
    Minor,

    /// Worth surfacing but not blocking
    Significant,

    /// Both claims are untrustworthy until resolved
    Blocking,
}

impl ContradictionSeverity {
    /// Get the severity name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContradictionSeverity::Minor => "minor",
            ContradictionSeverity::Significant => "significant",
            ContradictionSeverity::Blocking => "blocking",
        }
    }

    /// Parse a severity from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "minor" => Some(ContradictionSeverity::Minor),
            "significant" => Some(ContradictionSeverity::Significant),
            "blocking" => Some(ContradictionSeverity::Blocking),
            _ => None,
        }
    }
}

/// Resolution state of a contradiction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionStatus {
    /// Neither claim can be trusted yet
    Open,

    /// A human or a new derivation settled which claim (if either) holds
    Resolved,
}

impl ContradictionStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContradictionStatus::Open => "open",
            ContradictionStatus::Resolved => "resolved",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(ContradictionStatus::Open),
            "resolved" => Some(ContradictionStatus::Resolved),
            _ => None,
        }
    }
}

/// A detected logical conflict between two claims about the same subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contradiction {
    /// Unique identifier
    pub id: DefeaterId,

    /// First conflicting claim
    pub claim_a: ClaimId,

    /// Second conflicting claim
    pub claim_b: ClaimId,

    /// Kind of conflict
    pub contradiction_type: ContradictionType,

    /// How serious the conflict is
    pub severity: ContradictionSeverity,

    /// Human-readable description of the conflict
    pub description: String,

    /// Resolution state
    pub status: ContradictionStatus,

    /// When this contradiction was detected (ms since Unix epoch)
    pub detected_at: u64,
}

impl Contradiction {
    /// Create a new open contradiction
    pub fn new(
        claim_a: ClaimId,
        claim_b: ClaimId,
        contradiction_type: ContradictionType,
        severity: ContradictionSeverity,
        description: impl Into<String>,
        detected_at: u64,
    ) -> Self {
        Self {
            id: DefeaterId::new(),
            claim_a,
            claim_b,
            contradiction_type,
            severity,
            description: description.into(),
            status: ContradictionStatus::Open,
            detected_at,
        }
    }
}

/// A judge's verdict that two claims conflict
///
/// Produced by [`crate::traits::ContradictionJudge`] implementations; the
/// engine turns findings into persisted [`Contradiction`] records.
#[derive(Debug, Clone, PartialEq)]
pub struct ContradictionFinding {
    /// Kind of conflict found
    pub contradiction_type: ContradictionType,

    /// How serious the conflict is
    pub severity: ContradictionSeverity,

    /// Why the judge believes the claims conflict
    pub description: String,
}
