//! Error types for adjudicator operations

use credence_domain::DefeaterId;
use thiserror::Error;

/// Errors that can occur during adjudicator operations
///
/// Storage errors are fatal and propagate uncaught to the caller: partial
/// application is never hidden behind a success result.
#[derive(Error, Debug)]
pub enum AdjudicatorError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Resolution was asked for a defeater that does not exist
    #[error("Defeater not found: {0}")]
    DefeaterNotFound(DefeaterId),
}
