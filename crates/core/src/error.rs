//! Error types for the scorecap domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

use crate::component::Component;

/// The top-level error type for all scorecap operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Input validation ---
    #[error("{0}")]
    Validation(#[from] ValidationError),

    // --- Decomposition ---
    #[error(
        "Breakdown total ({computed:.4}) does not match expected total from percent ({expected:.4}). \
         Likely due to conflicting overrides or weight overflow."
    )]
    InconsistentBreakdown { computed: f64, expected: f64 },

    // --- Ledger ---
    #[error("{0}")]
    Ledger(#[from] LedgerError),

    // --- Persistence (the in-memory mutation has already happened) ---
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StorageError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Invalid key: {0}. Allowed: a, b, c, d")]
    InvalidKey(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("{component} must be in [0, {max}] (got {value})")]
    OutOfRange {
        component: Component,
        value: f64,
        max: f64,
    },

    #[error("Missing: {0}")]
    MissingKey(String),

    #[error("Unexpected keys: {0}")]
    UnexpectedKey(String),

    #[error("Percent must be between 0 and 100 (got {0})")]
    PercentOutOfRange(f64),

    #[error("Only one component can be adjusted at a time (got {0})")]
    TooManyFields(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("No data found for {0}")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("No previous assignment to undo for {0}")]
    NoUndoAvailable(String),

    #[error("No recent result found for {0}. Run calculate first.")]
    NoRecentResult(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("Failed to serialize {what}: {reason}")]
    Serialize { what: String, reason: String },
}
