//! Credence Evidence Ledger
//!
//! Implements the `EvidenceLedger` trait over SQLite: an append-only,
//! queryable log of every epistemic event, with causal-chain reconstruction
//! and live in-process subscriptions.
//!
//! # Guarantees
//!
//! - Entries are immutable once appended; ids and timestamps are assigned
//!   server-side, never taken from the caller
//! - Appends are durable before the call returns (each append is its own
//!   transaction; batches are all-or-nothing)
//! - Subscriber panics are caught and logged; one broken consumer never
//!   affects other subscribers or future appends
//!
//! # Examples
//!
//! ```no_run
//! use credence_ledger::SqliteLedger;
//! use credence_domain::traits::EvidenceLedger;
//! use credence_domain::{EvidenceKind, NewEvidence, Provenance};
//!
//! let mut ledger = SqliteLedger::new(":memory:").unwrap();
//! let entry = ledger.append(NewEvidence::new(
//!     EvidenceKind::Extraction,
//!     serde_json::json!({"file": "src/lib.rs"}),
//!     Provenance::new("indexer", "ast_walk"),
//! )).unwrap();
//! assert!(entry.timestamp > 0);
//! ```

#![warn(missing_docs)]

use credence_domain::algebra;
use credence_domain::traits::{
    EvidenceChain, EvidenceLedger, EvidenceQuery, OrderBy, OrderDirection, SubscriberCallback,
    SubscriptionFilter, SubscriptionId,
};
use credence_domain::{
    AbsenceReason, ConfidenceValue, EvidenceEntry, EvidenceId, EvidenceKind, NewEvidence,
};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Current timestamp in milliseconds since Unix epoch
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Errors that can occur during ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization error on a structured column
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Chain reconstruction was asked for an unknown entry
    #[error("Claim not found in ledger: {0}")]
    ClaimNotFound(EvidenceId),

    /// Invalid data found in a persisted row
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

struct Subscriber {
    id: SubscriptionId,
    filter: SubscriptionFilter,
    callback: SubscriberCallback,
}

/// SQLite-based implementation of `EvidenceLedger`
///
/// The subscriber registry is owned by the instance, not a process-wide
/// singleton, so multiple ledgers (e.g. in tests) don't cross-talk.
pub struct SqliteLedger {
    conn: Connection,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
}

impl SqliteLedger {
    /// Create a new SqliteLedger with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        let ledger = Self {
            conn,
            subscribers: Vec::new(),
            next_subscription: 0,
        };
        ledger.initialize_schema()?;
        Ok(ledger)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), LedgerError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn row_to_entry(row: &Row<'_>) -> Result<EvidenceEntry, LedgerError> {
        let id: String = row.get(0)?;
        let kind: String = row.get(2)?;
        let confidence: Option<String> = row.get(5)?;
        let related: String = row.get(6)?;
        Ok(EvidenceEntry {
            id: EvidenceId::from_string(&id).map_err(LedgerError::InvalidData)?,
            timestamp: row.get::<_, i64>(1)? as u64,
            kind: EvidenceKind::parse(&kind)
                .ok_or_else(|| LedgerError::InvalidData(format!("Unknown kind: {}", kind)))?,
            payload: serde_json::from_str(&row.get::<_, String>(3)?)?,
            provenance: serde_json::from_str(&row.get::<_, String>(4)?)?,
            confidence: confidence
                .map(|c| serde_json::from_str(&c))
                .transpose()?,
            related_entries: serde_json::from_str(&related)?,
            session_id: row.get(7)?,
        })
    }

    fn insert_entry(conn: &Connection, entry: &EvidenceEntry) -> Result<(), LedgerError> {
        conn.execute(
            "INSERT INTO evidence (id, timestamp, kind, payload, provenance, confidence,
                                   related_entries, session_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.id.to_string(),
                entry.timestamp as i64,
                entry.kind.as_str(),
                serde_json::to_string(&entry.payload)?,
                serde_json::to_string(&entry.provenance)?,
                entry
                    .confidence
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                serde_json::to_string(&entry.related_entries)?,
                entry.session_id,
            ],
        )?;
        Ok(())
    }

    /// Notify matching subscribers of a freshly appended entry
    ///
    /// Synchronous, after the write is durable. A panicking callback is
    /// caught and logged; remaining subscribers still run.
    fn notify(&self, entry: &EvidenceEntry) {
        for subscriber in &self.subscribers {
            if !subscriber.filter.matches(entry) {
                continue;
            }
            let result = catch_unwind(AssertUnwindSafe(|| (subscriber.callback)(entry)));
            if result.is_err() {
                tracing::warn!(
                    subscription = subscriber.id.0,
                    entry_id = %entry.id,
                    "evidence subscriber panicked; continuing"
                );
            }
        }
    }
}

const ENTRY_COLUMNS: &str =
    "id, timestamp, kind, payload, provenance, confidence, related_entries, session_id";

impl EvidenceLedger for SqliteLedger {
    type Error = LedgerError;

    fn append(&mut self, draft: NewEvidence) -> Result<EvidenceEntry, LedgerError> {
        let entry = EvidenceEntry::from_draft(draft, EvidenceId::new(), current_timestamp_ms());
        Self::insert_entry(&self.conn, &entry)?;
        self.notify(&entry);
        Ok(entry)
    }

    fn append_batch(
        &mut self,
        drafts: Vec<NewEvidence>,
    ) -> Result<Vec<EvidenceEntry>, LedgerError> {
        let timestamp = current_timestamp_ms();
        let entries: Vec<EvidenceEntry> = drafts
            .into_iter()
            .map(|draft| EvidenceEntry::from_draft(draft, EvidenceId::new(), timestamp))
            .collect();

        let tx = self.conn.transaction()?;
        for entry in &entries {
            Self::insert_entry(&tx, entry)?;
        }
        tx.commit()?;

        for entry in &entries {
            self.notify(entry);
        }
        Ok(entries)
    }

    fn query(&self, query: &EvidenceQuery) -> Result<Vec<EvidenceEntry>, LedgerError> {
        let mut sql = format!("SELECT {} FROM evidence", ENTRY_COLUMNS);
        let mut conditions: Vec<String> = Vec::new();
        let mut bound: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(kinds) = &query.kinds {
            if kinds.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders = vec!["?"; kinds.len()].join(", ");
            conditions.push(format!("kind IN ({})", placeholders));
            for kind in kinds {
                bound.push(Box::new(kind.as_str().to_string()));
            }
        }
        if let Some((start, end)) = query.time_range {
            conditions.push("timestamp BETWEEN ? AND ?".to_string());
            bound.push(Box::new(start as i64));
            bound.push(Box::new(end as i64));
        }
        if let Some(session_id) = &query.session_id {
            conditions.push("session_id = ?".to_string());
            bound.push(Box::new(session_id.clone()));
        }
        if let Some(source) = &query.source {
            conditions.push("json_extract(provenance, '$.source') = ?".to_string());
            bound.push(Box::new(source.clone()));
        }
        if let Some(needle) = &query.text_search {
            conditions.push("payload LIKE ?".to_string());
            bound.push(Box::new(format!("%{}%", needle)));
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let direction = match query.order_direction {
            OrderDirection::Descending => "DESC",
            OrderDirection::Ascending => "ASC",
        };
        // rowid breaks ties between same-millisecond appends in insert order
        match query.order_by {
            OrderBy::Timestamp => {
                sql.push_str(&format!(
                    " ORDER BY timestamp {dir}, rowid {dir}",
                    dir = direction
                ));
            }
            OrderBy::Kind => {
                sql.push_str(&format!(
                    " ORDER BY kind {dir}, timestamp {dir}, rowid {dir}",
                    dir = direction
                ));
            }
        }

        // Offset without limit must still return rows: SQLite's LIMIT -1 is
        // the unbounded sentinel.
        if query.limit.is_some() || query.offset.is_some() {
            let limit = query.limit.map(|l| l as i64).unwrap_or(-1);
            sql.push_str(&format!(" LIMIT {}", limit));
            if let Some(offset) = query.offset {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(bound.iter().map(|b| b.as_ref())),
            |row| Ok(Self::row_to_entry(row)),
        )?;
        rows.map(|r| r?).collect()
    }

    fn get(&self, id: EvidenceId) -> Result<Option<EvidenceEntry>, LedgerError> {
        let sql = format!("SELECT {} FROM evidence WHERE id = ?1", ENTRY_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id.to_string()], |row| {
                Ok(Self::row_to_entry(row))
            })
            .optional()?;
        row.transpose()
    }

    fn get_chain(&self, root: EvidenceId) -> Result<EvidenceChain, LedgerError> {
        let root_entry = self
            .get(root)?
            .ok_or(LedgerError::ClaimNotFound(root))?;

        let mut visited: HashSet<EvidenceId> = HashSet::new();
        let mut queue: VecDeque<EvidenceId> = VecDeque::new();
        let mut evidence: Vec<EvidenceEntry> = Vec::new();
        let mut graph: HashMap<EvidenceId, Vec<EvidenceId>> = HashMap::new();
        let mut contradictions: Vec<EvidenceEntry> = Vec::new();

        visited.insert(root);
        queue.push_back(root);

        while let Some(id) = queue.pop_front() {
            // Root is already in hand; dangling back-references are skipped
            let entry = if id == root {
                Some(root_entry.clone())
            } else {
                self.get(id)?
            };
            let Some(entry) = entry else {
                continue;
            };
            graph.insert(entry.id, entry.related_entries.clone());
            for related in &entry.related_entries {
                if visited.insert(*related) {
                    queue.push_back(*related);
                }
            }
            if entry.kind == EvidenceKind::Contradiction {
                contradictions.push(entry.clone());
            }
            evidence.push(entry);
        }

        // Chain confidence is weakest-link: an entry without confidence makes
        // the whole chain absent, same as an absent pipeline stage.
        let confidences: Vec<ConfidenceValue> = evidence
            .iter()
            .map(|entry| {
                entry
                    .confidence
                    .clone()
                    .unwrap_or_else(|| ConfidenceValue::absent(AbsenceReason::Uncalibrated))
            })
            .collect();
        let chain_confidence = algebra::sequence(&confidences);

        Ok(EvidenceChain {
            root: root_entry,
            evidence,
            graph,
            chain_confidence,
            contradictions,
        })
    }

    fn get_session_entries(
        &self,
        session_id: &str,
    ) -> Result<Vec<EvidenceEntry>, LedgerError> {
        let sql = format!(
            "SELECT {} FROM evidence WHERE session_id = ?1 ORDER BY timestamp ASC, rowid ASC",
            ENTRY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![session_id], |row| Ok(Self::row_to_entry(row)))?;
        rows.map(|r| r?).collect()
    }

    fn subscribe(
        &mut self,
        filter: SubscriptionFilter,
        callback: SubscriberCallback,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(Subscriber { id, filter, callback });
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }
}
