//! # flatstore
//!
//! A small three-table record store backed by flat delimited files:
//! - Atomic whole-file rewrites (temp file + rename), no write-ahead log
//! - Append-only inserts with foreign-key validation
//! - Per-table locking with a fixed acquisition order
//! - Sequential and parallel loaders that commit identical state
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  users.csv        posts.csv        engagements.csv          │
//! └──────┬────────────────┬─────────────────┬───────────────────┘
//!        │                │                 │
//! ┌──────▼────────────────▼─────────────────▼───────────────────┐
//! │              Loader (sequential | parallel)                  │
//! │           parse rows → foreign-key filter                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ commit (all three locks)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     TableStore                               │
//! │    Mutex<users>  →  Mutex<posts>  →  Mutex<engagements>      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ mutations
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Atomic    │          │   Append    │
//!   │   Rewrite   │          │   (rows)    │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod storage;
pub mod loader;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::{Config, SyncMode};
pub use loader::{LoadMode, LoadStats};
pub use record::{Engagement, EngagementKind, Post, RecordId, Table, TableKind, User};
pub use store::{IntegrityReport, Snapshot, TableRef, TableStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of flatstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
