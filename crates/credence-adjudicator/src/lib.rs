//! Credence Adjudicator
//!
//! The defeater engine: detects invalidating signals against the claim
//! store, applies them (confidence reduction, status transition), resolves
//! them, and reports aggregate graph health.
//!
//! # Overview
//!
//! The adjudicator implements non-monotonic reasoning over the claim graph:
//! conclusions can be retracted, and certainty is never silently fabricated.
//! It is driven externally - a scheduler or direct caller invokes one
//! [`Adjudicator::run_cycle`] per cycle; the engine spawns no threads of its
//! own.
//!
//! ## Claim state machine
//!
//! ```text
//! active --(warning|partial defeater)--> active (confidence reduced)
//! active --(full defeater | contradiction)--> defeated | contradicted
//! defeated/contradicted --(resolve 'revalidate')--> stale
//! ```
//!
//! There is no transition back to `active` except via a fresh claim
//! replacing the stale one: a resolved defeater means "please re-derive",
//! not "still true".
//!
//! # Usage
//!
//! ```no_run
//! use credence_adjudicator::{Adjudicator, AdjudicatorConfig, DetectionSignals};
//! use credence_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = SqliteStore::new(":memory:")?;
//! let mut adjudicator = Adjudicator::default_config();
//!
//! let signals = DetectionSignals::default()
//!     .with_changed_files(["src/parser.rs"])
//!     .with_failed_tests(["tests::parse_roundtrip"]);
//!
//! let report = adjudicator.run_cycle(&mut store, &signals)?;
//! println!("health: {:.2}", report.health.overall_health);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod judge;
mod metrics;
mod signals;

pub use config::AdjudicatorConfig;
pub use engine::{
    Adjudicator, ApplyOutcome, CycleReport, DetectionReport, GraphHealth, Resolution,
    ResolutionAction,
};
pub use error::AdjudicatorError;
pub use judge::LexicalNegationJudge;
pub use metrics::AdjudicatorMetrics;
pub use signals::{DetectionSignals, HashMismatch};
