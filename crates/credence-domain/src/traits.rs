//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and
//! infrastructure. Infrastructure implementations live in other crates
//! (credence-store, credence-ledger); the defeater engine in
//! credence-adjudicator is written against them.

use crate::claim::{Claim, ClaimId};
use crate::confidence::ConfidenceValue;
use crate::defeater::{Contradiction, ContradictionFinding, Defeater, DefeaterId};
use crate::evidence::{EvidenceEntry, EvidenceId, EvidenceKind, NewEvidence};
use std::collections::HashMap;

/// Trait for storing and retrieving claims, defeaters, and contradictions
///
/// The store is a single logical resource: all mutation goes through `&mut`,
/// which serializes read-modify-write on per-claim confidence. Claims are
/// upserted, never deleted.
pub trait ClaimStore {
    /// Error type for store operations
    type Error;

    /// Get a claim by ID
    fn get_claim(&self, id: ClaimId) -> Result<Option<Claim>, Self::Error>;

    /// Insert or update a claim
    fn upsert_claim(&mut self, claim: Claim) -> Result<(), Self::Error>;

    /// Insert or update multiple claims
    fn upsert_claims(&mut self, claims: Vec<Claim>) -> Result<(), Self::Error>;

    /// Enumerate claims with status `active`
    fn active_claims(&self) -> Result<Vec<Claim>, Self::Error>;

    /// Get a defeater by ID
    fn get_defeater(&self, id: DefeaterId) -> Result<Option<Defeater>, Self::Error>;

    /// Insert or update a defeater
    fn upsert_defeater(&mut self, defeater: Defeater) -> Result<(), Self::Error>;

    /// Enumerate defeaters with status `active`
    fn active_defeaters(&self) -> Result<Vec<Defeater>, Self::Error>;

    /// Persist a contradiction
    fn record_contradiction(&mut self, contradiction: Contradiction) -> Result<(), Self::Error>;

    /// Enumerate contradictions with status `open`
    fn unresolved_contradictions(&self) -> Result<Vec<Contradiction>, Self::Error>;
}

/// Pluggable judgment of whether two claims conflict
///
/// The default implementation is a conservative lexical heuristic; a richer
/// semantic judge can be substituted without touching the engine.
pub trait ContradictionJudge {
    /// Judge a candidate claim against an existing claim about the same
    /// subject; `None` means no conflict found
    fn judge(&self, candidate: &Claim, existing: &Claim) -> Option<ContradictionFinding>;
}

/// Sort key for ledger queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    /// Order by ledger-assigned timestamp (the default)
    #[default]
    Timestamp,

    /// Order by entry kind, then timestamp
    Kind,
}

/// Sort direction for ledger queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Newest first (the default)
    #[default]
    Descending,

    /// Oldest first
    Ascending,
}

/// Query criteria for retrieving evidence entries
///
/// Filters are conjunctive (AND). `offset` without `limit` must still return
/// rows - implementations use an unbounded-limit sentinel internally.
#[derive(Debug, Clone, Default)]
pub struct EvidenceQuery {
    /// Restrict to these kinds
    pub kinds: Option<Vec<EvidenceKind>>,

    /// Restrict to entries with timestamp in `[start, end]` (ms, inclusive)
    pub time_range: Option<(u64, u64)>,

    /// Restrict to a session
    pub session_id: Option<String>,

    /// Restrict to a provenance source
    pub source: Option<String>,

    /// Substring match against the serialized payload
    pub text_search: Option<String>,

    /// Maximum results to return
    pub limit: Option<usize>,

    /// Results to skip
    pub offset: Option<usize>,

    /// Sort key
    pub order_by: OrderBy,

    /// Sort direction
    pub order_direction: OrderDirection,
}

/// A reconstructed causal chain rooted at one evidence entry
#[derive(Debug, Clone)]
pub struct EvidenceChain {
    /// The entry the chain was reconstructed from
    pub root: EvidenceEntry,

    /// Every entry reachable from the root, in traversal order
    pub evidence: Vec<EvidenceEntry>,

    /// Adjacency: entry id to its related entry ids
    pub graph: HashMap<EvidenceId, Vec<EvidenceId>>,

    /// Weakest-link confidence across the chain; absent if any entry in the
    /// chain lacks confidence
    pub chain_confidence: ConfidenceValue,

    /// Contradiction entries encountered along the chain
    pub contradictions: Vec<EvidenceEntry>,
}

/// Filter for live ledger subscriptions
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    /// Only notify for these kinds (all kinds when `None`)
    pub kinds: Option<Vec<EvidenceKind>>,

    /// Only notify for this session (all sessions when `None`)
    pub session_id: Option<String>,
}

impl SubscriptionFilter {
    /// Whether an entry matches this filter
    pub fn matches(&self, entry: &EvidenceEntry) -> bool {
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&entry.kind) {
                return false;
            }
        }
        if let Some(session_id) = &self.session_id {
            if entry.session_id.as_deref() != Some(session_id.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Handle identifying one live subscription on a ledger instance
///
/// Returned by [`EvidenceLedger::subscribe`]; passing it back to
/// [`EvidenceLedger::unsubscribe`] tears the subscription down. The registry
/// is owned by the ledger instance, not a process-wide singleton, so multiple
/// ledger instances (e.g. in tests) don't cross-talk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Callback invoked synchronously for each matching append
pub type SubscriberCallback = Box<dyn Fn(&EvidenceEntry) + Send>;

/// Trait for the append-only evidence ledger
///
/// Entries are immutable once appended; ids and timestamps are assigned by
/// the ledger, never by the caller. Appends are durable before the call
/// returns.
pub trait EvidenceLedger {
    /// Error type for ledger operations
    type Error;

    /// Append one entry; assigns id and timestamp, persists durably, then
    /// notifies in-process subscribers (whose panics are swallowed)
    fn append(&mut self, draft: NewEvidence) -> Result<EvidenceEntry, Self::Error>;

    /// Append a batch in a single all-or-nothing transaction
    fn append_batch(&mut self, drafts: Vec<NewEvidence>)
        -> Result<Vec<EvidenceEntry>, Self::Error>;

    /// Query entries; filters are conjunctive, default order newest-first
    fn query(&self, query: &EvidenceQuery) -> Result<Vec<EvidenceEntry>, Self::Error>;

    /// Point lookup by id
    fn get(&self, id: EvidenceId) -> Result<Option<EvidenceEntry>, Self::Error>;

    /// Reconstruct the causal chain rooted at an entry
    ///
    /// Breadth-first over `related_entries` with a visited set (cycles are
    /// tolerated, not assumed absent). Fails with a distinct not-found error
    /// for an unknown root - never a degenerate chain.
    fn get_chain(&self, root: EvidenceId) -> Result<EvidenceChain, Self::Error>;

    /// All entries for a session, oldest first
    fn get_session_entries(&self, session_id: &str)
        -> Result<Vec<EvidenceEntry>, Self::Error>;

    /// Register a live subscription; returns the teardown handle
    fn subscribe(
        &mut self,
        filter: SubscriptionFilter,
        callback: SubscriberCallback,
    ) -> SubscriptionId;

    /// Tear down a subscription; returns false if it was already gone
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}
