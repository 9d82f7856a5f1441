//! Error types for the conversion pipeline

use thiserror::Error;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConversionError>;

/// Conversion errors
///
/// Fatal, structural problems are variants here. Recoverable conditions
/// (skipped promotions, skipped renames, residual import cycles) are
/// logged and degrade the output instead of aborting the run.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Unresolvable type reference: {name} in namespace {namespace:?} (referenced from {referenced_from})")]
    UnresolvableReference {
        name: String,
        namespace: Option<String>,
        referenced_from: String,
    },

    #[error("Unsupported schema construct: {0}")]
    UnsupportedConstruct(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid rename rule '{pattern}': {reason}")]
    InvalidRule { pattern: String, reason: String },

    #[error("Cannot promote local type {name}: defining types {defining:?} disagree, naming would not be deterministic")]
    AmbiguousPromotion { name: String, defining: Vec<String> },

    #[error("Reconciliation did not converge for {type_name} after {iterations} iterations")]
    ReconcileLoop { type_name: String, iterations: usize },

    #[error("Reserved {kind} '{member}' reappeared in {type_name}")]
    ReappearedReservation {
        type_name: String,
        kind: String,
        member: String,
    },

    #[error("Backward-incompatible change: {0}")]
    IncompatibleChange(String),

    #[error("Output filename conflict: {count} packages would be written to {filename}")]
    OutputFilenameConflict { filename: String, count: usize },

    #[error("Invalid lock file: {0}")]
    InvalidLockFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
