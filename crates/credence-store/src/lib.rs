//! Credence Claim Store
//!
//! Implements the `ClaimStore` trait over SQLite.
//!
//! # Architecture
//!
//! - SQLite for claims, defeaters, and contradictions (arena-by-id tables)
//! - Structured fields (subject, source, confidence) as serialized columns
//! - Claims are upserted, never deleted; invalidation is a status transition
//!
//! # Thread Safety
//!
//! SQLite connections are not thread-safe and the store is a single logical
//! resource: all mutation goes through `&mut self`, which serializes
//! read-modify-write on per-claim confidence. Each thread should have its
//! own store instance.
//!
//! # Examples
//!
//! ```no_run
//! use credence_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for claim operations
//! ```

#![warn(missing_docs)]

use credence_domain::traits::ClaimStore;
use credence_domain::{
    Claim, ClaimId, Contradiction, ContradictionSeverity, ContradictionStatus,
    ContradictionType, Defeater, DefeaterId, DefeaterStatus, DefeaterType, Severity,
};
use credence_domain::claim::ClaimStatus;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization error on a structured column
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data found in a persisted row
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of `ClaimStore`
///
/// Provides persistent storage for claims, defeaters, and contradictions.
/// Use `:memory:` as the path for an in-memory database (useful for tests).
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use credence_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("credence.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn row_to_claim(row: &Row<'_>) -> Result<Claim, StoreError> {
        let id: String = row.get(0)?;
        let status: String = row.get(6)?;
        Ok(Claim {
            id: ClaimId::from_string(&id).map_err(StoreError::InvalidData)?,
            proposition: row.get(1)?,
            claim_type: row.get(2)?,
            subject: serde_json::from_str(&row.get::<_, String>(3)?)?,
            source: serde_json::from_str(&row.get::<_, String>(4)?)?,
            confidence: serde_json::from_str(&row.get::<_, String>(5)?)?,
            status: ClaimStatus::parse(&status)
                .ok_or_else(|| StoreError::InvalidData(format!("Unknown claim status: {}", status)))?,
            created_at: row.get::<_, i64>(7)? as u64,
        })
    }

    fn row_to_defeater(row: &Row<'_>) -> Result<Defeater, StoreError> {
        let id: String = row.get(0)?;
        let defeater_type: String = row.get(1)?;
        let severity: String = row.get(3)?;
        let affected: String = row.get(4)?;
        let status: String = row.get(7)?;
        Ok(Defeater {
            id: DefeaterId::from_string(&id).map_err(StoreError::InvalidData)?,
            defeater_type: DefeaterType::parse(&defeater_type).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown defeater type: {}", defeater_type))
            })?,
            description: row.get(2)?,
            severity: Severity::parse(&severity)
                .ok_or_else(|| StoreError::InvalidData(format!("Unknown severity: {}", severity)))?,
            affected_claim_ids: serde_json::from_str(&affected)?,
            confidence_reduction: row.get(5)?,
            auto_resolvable: row.get::<_, i64>(6)? != 0,
            status: DefeaterStatus::parse(&status).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown defeater status: {}", status))
            })?,
            detected_at: row.get::<_, i64>(8)? as u64,
        })
    }

    fn row_to_contradiction(row: &Row<'_>) -> Result<Contradiction, StoreError> {
        let id: String = row.get(0)?;
        let claim_a: String = row.get(1)?;
        let claim_b: String = row.get(2)?;
        let contradiction_type: String = row.get(3)?;
        let severity: String = row.get(4)?;
        let status: String = row.get(6)?;
        Ok(Contradiction {
            id: DefeaterId::from_string(&id).map_err(StoreError::InvalidData)?,
            claim_a: ClaimId::from_string(&claim_a).map_err(StoreError::InvalidData)?,
            claim_b: ClaimId::from_string(&claim_b).map_err(StoreError::InvalidData)?,
            contradiction_type: ContradictionType::parse(&contradiction_type).ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "Unknown contradiction type: {}",
                    contradiction_type
                ))
            })?,
            severity: ContradictionSeverity::parse(&severity).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown contradiction severity: {}", severity))
            })?,
            description: row.get(5)?,
            status: ContradictionStatus::parse(&status).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown contradiction status: {}", status))
            })?,
            detected_at: row.get::<_, i64>(7)? as u64,
        })
    }

    /// Total number of claims regardless of status
    pub fn claim_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM claims", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

const CLAIM_COLUMNS: &str =
    "id, proposition, claim_type, subject, source, confidence, status, created_at";
const DEFEATER_COLUMNS: &str = "id, defeater_type, description, severity, affected_claim_ids, \
     confidence_reduction, auto_resolvable, status, detected_at";
const CONTRADICTION_COLUMNS: &str =
    "id, claim_a, claim_b, contradiction_type, severity, description, status, detected_at";

impl ClaimStore for SqliteStore {
    type Error = StoreError;

    fn get_claim(&self, id: ClaimId) -> Result<Option<Claim>, StoreError> {
        let sql = format!("SELECT {} FROM claims WHERE id = ?1", CLAIM_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id.to_string()], |row| {
                Ok(Self::row_to_claim(row))
            })
            .optional()?;
        row.transpose()
    }

    fn upsert_claim(&mut self, claim: Claim) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO claims (id, proposition, claim_type, subject, source, confidence, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                proposition = excluded.proposition,
                claim_type = excluded.claim_type,
                subject = excluded.subject,
                source = excluded.source,
                confidence = excluded.confidence,
                status = excluded.status,
                created_at = excluded.created_at",
            params![
                claim.id.to_string(),
                claim.proposition,
                claim.claim_type,
                serde_json::to_string(&claim.subject)?,
                serde_json::to_string(&claim.source)?,
                serde_json::to_string(&claim.confidence)?,
                claim.status.as_str(),
                claim.created_at as i64,
            ],
        )?;
        Ok(())
    }

    fn upsert_claims(&mut self, claims: Vec<Claim>) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO claims (id, proposition, claim_type, subject, source, confidence, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                    proposition = excluded.proposition,
                    claim_type = excluded.claim_type,
                    subject = excluded.subject,
                    source = excluded.source,
                    confidence = excluded.confidence,
                    status = excluded.status,
                    created_at = excluded.created_at",
            )?;
            for claim in &claims {
                stmt.execute(params![
                    claim.id.to_string(),
                    claim.proposition,
                    claim.claim_type,
                    serde_json::to_string(&claim.subject)?,
                    serde_json::to_string(&claim.source)?,
                    serde_json::to_string(&claim.confidence)?,
                    claim.status.as_str(),
                    claim.created_at as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn active_claims(&self) -> Result<Vec<Claim>, StoreError> {
        let sql = format!(
            "SELECT {} FROM claims WHERE status = 'active' ORDER BY created_at, id",
            CLAIM_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| Ok(Self::row_to_claim(row)))?;
        rows.map(|r| r?).collect()
    }

    fn get_defeater(&self, id: DefeaterId) -> Result<Option<Defeater>, StoreError> {
        let sql = format!("SELECT {} FROM defeaters WHERE id = ?1", DEFEATER_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id.to_string()], |row| {
                Ok(Self::row_to_defeater(row))
            })
            .optional()?;
        row.transpose()
    }

    fn upsert_defeater(&mut self, defeater: Defeater) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO defeaters (id, defeater_type, description, severity, affected_claim_ids,
                                    confidence_reduction, auto_resolvable, status, detected_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                defeater_type = excluded.defeater_type,
                description = excluded.description,
                severity = excluded.severity,
                affected_claim_ids = excluded.affected_claim_ids,
                confidence_reduction = excluded.confidence_reduction,
                auto_resolvable = excluded.auto_resolvable,
                status = excluded.status,
                detected_at = excluded.detected_at",
            params![
                defeater.id.to_string(),
                defeater.defeater_type.as_str(),
                defeater.description,
                defeater.severity.as_str(),
                serde_json::to_string(&defeater.affected_claim_ids)?,
                defeater.confidence_reduction,
                defeater.auto_resolvable as i64,
                defeater.status.as_str(),
                defeater.detected_at as i64,
            ],
        )?;
        Ok(())
    }

    fn active_defeaters(&self) -> Result<Vec<Defeater>, StoreError> {
        let sql = format!(
            "SELECT {} FROM defeaters WHERE status = 'active' ORDER BY detected_at, id",
            DEFEATER_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| Ok(Self::row_to_defeater(row)))?;
        rows.map(|r| r?).collect()
    }

    fn record_contradiction(&mut self, contradiction: Contradiction) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO contradictions (id, claim_a, claim_b, contradiction_type, severity,
                                         description, status, detected_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                description = excluded.description",
            params![
                contradiction.id.to_string(),
                contradiction.claim_a.to_string(),
                contradiction.claim_b.to_string(),
                contradiction.contradiction_type.as_str(),
                contradiction.severity.as_str(),
                contradiction.description,
                contradiction.status.as_str(),
                contradiction.detected_at as i64,
            ],
        )?;
        Ok(())
    }

    fn unresolved_contradictions(&self) -> Result<Vec<Contradiction>, StoreError> {
        let sql = format!(
            "SELECT {} FROM contradictions WHERE status = 'open' ORDER BY detected_at, id",
            CONTRADICTION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| Ok(Self::row_to_contradiction(row)))?;
        rows.map(|r| r?).collect()
    }
}
