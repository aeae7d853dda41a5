//! Pipeline error types.
//!
//! Every failure mode has a named variant. No stringly-typed errors.

use thiserror::Error;

use crate::validator::ValidationReport;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to read {table} from '{path}': {source}")]
    Io {
        table: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Data-shape error in a source table: missing column, unparseable
    /// date or quantity. Fatal before any stage executes — the upstream
    /// cleaning step failed its contract.
    #[error("{table} row {line}: {message}")]
    MalformedRow {
        table: &'static str,
        line: usize,
        message: String,
    },

    /// A hard invariant failed post-enrichment. The run is failed with the
    /// offending keys; no partial or corrected output is emitted.
    #[error("validation failed: {0}")]
    ValidationFailed(Box<ValidationReport>),
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
