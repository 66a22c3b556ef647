//! Evidence entry module
//!
//! One immutable row in the append-only ledger documenting an epistemic
//! event. Entries are born once and never change: "undoing" a conclusion
//! means appending a new contradiction or verification entry, not mutating
//! the old one.

use crate::confidence::ConfidenceValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an evidence entry based on UUIDv7
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EvidenceId(uuid::Uuid);

impl EvidenceId {
    /// Generate a new UUIDv7-based EvidenceId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse an EvidenceId from a UUID string
    ///
    /// # Errors
    /// Returns an error for malformed UUID strings.
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid evidence id: {}", e))
    }
}

impl Default for EvidenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of epistemic event an entry documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// Raw material extracted from the codebase
    Extraction,

    /// Evidence retrieved for a question
    Retrieval,

    /// Multiple pieces of evidence synthesized into one
    Synthesis,

    /// A claim was registered
    Claim,

    /// A claim was checked against reality
    Verification,

    /// A conflict between claims was recorded
    Contradiction,

    /// Human feedback on a conclusion
    Feedback,

    /// An observed downstream outcome
    Outcome,

    /// An external tool was invoked
    ToolCall,

    /// A bounded interaction episode
    Episode,

    /// A calibration pass ran
    Calibration,
}

impl EvidenceKind {
    /// Every kind, in declaration order
    pub const ALL: [EvidenceKind; 11] = [
        EvidenceKind::Extraction,
        EvidenceKind::Retrieval,
        EvidenceKind::Synthesis,
        EvidenceKind::Claim,
        EvidenceKind::Verification,
        EvidenceKind::Contradiction,
        EvidenceKind::Feedback,
        EvidenceKind::Outcome,
        EvidenceKind::ToolCall,
        EvidenceKind::Episode,
        EvidenceKind::Calibration,
    ];

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::Extraction => "extraction",
            EvidenceKind::Retrieval => "retrieval",
            EvidenceKind::Synthesis => "synthesis",
            EvidenceKind::Claim => "claim",
            EvidenceKind::Verification => "verification",
            EvidenceKind::Contradiction => "contradiction",
            EvidenceKind::Feedback => "feedback",
            EvidenceKind::Outcome => "outcome",
            EvidenceKind::ToolCall => "tool_call",
            EvidenceKind::Episode => "episode",
            EvidenceKind::Calibration => "calibration",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

/// Provenance for an evidence entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Provenance {
    /// Source identifier (e.g. "indexer", "extractor:gpt4", "test-runner")
    pub source: String,

    /// Method that produced the evidence (e.g. "ast_walk", "llm_extraction")
    pub method: String,

    /// Optional agent identifier
    pub agent: Option<String>,

    /// Optional hash of the inputs the evidence was derived from
    pub input_hash: Option<String>,

    /// Optional configuration snapshot
    pub config: Option<serde_json::Value>,
}

impl Provenance {
    /// Create a provenance record with source and method
    pub fn new(source: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            method: method.into(),
            agent: None,
            input_hash: None,
            config: None,
        }
    }

    /// Attach an agent identifier
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Attach an input hash
    pub fn with_input_hash(mut self, hash: impl Into<String>) -> Self {
        self.input_hash = Some(hash.into());
        self
    }
}

/// A caller-submitted evidence draft
///
/// The ledger assigns `id` and `timestamp` server-side; caller-supplied
/// values for either are never trusted, which is why the draft type cannot
/// carry them at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvidence {
    /// Kind of epistemic event
    pub kind: EvidenceKind,

    /// Kind-specific payload
    pub payload: serde_json::Value,

    /// Where the evidence came from
    pub provenance: Provenance,

    /// Optional confidence attached to the event
    pub confidence: Option<ConfidenceValue>,

    /// Back-references to prior evidence that supports this entry
    pub related_entries: Vec<EvidenceId>,

    /// Optional session this entry belongs to
    pub session_id: Option<String>,
}

impl NewEvidence {
    /// Create a draft with a kind, payload, and provenance
    pub fn new(kind: EvidenceKind, payload: serde_json::Value, provenance: Provenance) -> Self {
        Self {
            kind,
            payload,
            provenance,
            confidence: None,
            related_entries: Vec::new(),
            session_id: None,
        }
    }

    /// Attach a confidence value
    pub fn with_confidence(mut self, confidence: ConfidenceValue) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Attach back-references to supporting evidence
    pub fn with_related(mut self, related: Vec<EvidenceId>) -> Self {
        self.related_entries = related;
        self
    }

    /// Attach a session id
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// One immutable row in the append-only evidence ledger
///
/// `related_entries` forms a DAG of back-references, not a tree; traversal
/// must tolerate cycles with a visited set rather than assume acyclicity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceEntry {
    /// Ledger-assigned unique identifier
    pub id: EvidenceId,

    /// Ledger-assigned timestamp (ms since Unix epoch)
    pub timestamp: u64,

    /// Kind of epistemic event
    pub kind: EvidenceKind,

    /// Kind-specific payload
    pub payload: serde_json::Value,

    /// Where the evidence came from
    pub provenance: Provenance,

    /// Optional confidence attached to the event
    pub confidence: Option<ConfidenceValue>,

    /// Back-references to prior evidence that supports this entry
    pub related_entries: Vec<EvidenceId>,

    /// Optional session this entry belongs to
    pub session_id: Option<String>,
}

impl EvidenceEntry {
    /// Materialize a draft with ledger-assigned identity
    pub fn from_draft(draft: NewEvidence, id: EvidenceId, timestamp: u64) -> Self {
        Self {
            id,
            timestamp,
            kind: draft.kind,
            payload: draft.payload,
            provenance: draft.provenance,
            confidence: draft.confidence,
            related_entries: draft.related_entries,
            session_id: draft.session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip_covers_all_eleven() {
        assert_eq!(EvidenceKind::ALL.len(), 11);
        for kind in EvidenceKind::ALL {
            assert_eq!(EvidenceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EvidenceKind::parse("gossip"), None);
    }

    #[test]
    fn test_draft_builders() {
        let draft = NewEvidence::new(
            EvidenceKind::Claim,
            serde_json::json!({"proposition": "x"}),
            Provenance::new("indexer", "ast_walk").with_agent("worker-1"),
        )
        .with_session("session-1");
        assert_eq!(draft.session_id.as_deref(), Some("session-1"));
        assert_eq!(draft.provenance.agent.as_deref(), Some("worker-1"));
        assert!(draft.related_entries.is_empty());
    }

    #[test]
    fn test_from_draft_assigns_identity() {
        let draft = NewEvidence::new(
            EvidenceKind::Extraction,
            serde_json::json!({}),
            Provenance::new("indexer", "scan"),
        );
        let id = EvidenceId::new();
        let entry = EvidenceEntry::from_draft(draft, id, 42);
        assert_eq!(entry.id, id);
        assert_eq!(entry.timestamp, 42);
    }
}
