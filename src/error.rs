//! Error types for flatstore
//!
//! Provides a unified error type for all operations.
//!
//! Conditions the store cannot recover from (a table file that will not
//! open, a rewrite that cannot be installed) surface as `Err`. Callers that
//! want abort-on-failure semantics treat any `Err` as fatal; the bundled
//! CLI does exactly that.

use std::path::PathBuf;

use thiserror::Error;

use crate::record::TableKind;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for flatstore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A backing file could not be opened for reading during a load
    #[error("cannot open {table} table at {}: {source}", path.display())]
    TableOpen {
        table: TableKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Persistence Errors
    // -------------------------------------------------------------------------
    /// Temp file creation, write, or the installing rename failed
    #[error("atomic rewrite of {} failed: {source}", path.display())]
    Rewrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("append to {} failed: {source}", path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    /// A value that cannot round-trip through the delimited file format
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Loader error: {0}")]
    Loader(String),
}
