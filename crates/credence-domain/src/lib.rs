//! Credence Domain Layer
//!
//! This crate contains the core business logic and domain model for Credence,
//! a defeasible knowledge store. It defines the fundamental concepts, value
//! objects, and trait interfaces that all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **ConfidenceValue**: A provenance-tagged representation of certainty -
//!   never a bare float
//! - **Claim**: A proposition about the system under study, with provenance
//!   and confidence, not a fact
//! - **Defeater**: A detected event that reduces or invalidates a claim's
//!   confidence
//! - **Contradiction**: A detected logical conflict between two claims about
//!   the same subject
//! - **EvidenceEntry**: One immutable row in the append-only ledger
//!   documenting an epistemic event
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - Pure business logic only (the confidence algebra is total and stateless)
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algebra;
pub mod claim;
pub mod confidence;
pub mod defeater;
pub mod evidence;
pub mod traits;

// Re-exports for convenience
pub use claim::{
    Claim, ClaimConfidence, ClaimId, ClaimSource, ClaimStatus, ClaimSubject, SourceLocation,
    SourceType,
};
pub use confidence::{AbsenceReason, BoundedBasis, ConfidenceError, ConfidenceValue, Measurement};
pub use defeater::{
    Contradiction, ContradictionFinding, ContradictionSeverity, ContradictionStatus,
    ContradictionType, Defeater, DefeaterId, DefeaterStatus, DefeaterType, Severity,
};
pub use evidence::{EvidenceEntry, EvidenceId, EvidenceKind, NewEvidence, Provenance};
