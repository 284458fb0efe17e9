//! Storage Module
//!
//! File primitives underneath the table store.
//!
//! ## Responsibilities
//! - Stream rows out of a table file (header skipped, bad rows counted)
//! - Replace a table file atomically (temp sibling + rename)
//! - Append a single row without touching existing ones
//! - Bootstrap a table file with only its header
//!
//! ## Atomic Rewrite
//! ```text
//!   users.csv ──read──▶ transform ──write──▶ users.csv.tmp
//!                                               │ (fsync)
//!   users.csv ◀────────── rename ───────────────┘
//!                                                 (fsync dir)
//! ```
//! A reader of `users.csv` sees either the old file or the new one, never
//! a prefix. There is no log: the rename is the commit point.

mod append;
mod reader;
mod rewrite;

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::error::Result;
use crate::record::TableKind;

pub use append::append_line;
pub use reader::{read_rows, ReadStats};
pub use rewrite::{atomic_rewrite, temp_path_for};

/// Create `path` holding only the header for `table`.
///
/// Returns `false` if the file already existed (its content is untouched).
pub fn ensure_table_file(path: &Path, table: TableKind) -> Result<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    writeln!(file, "{}", table.header())?;
    file.sync_all()?;

    tracing::debug!(table = %table, path = %path.display(), "created table file");
    Ok(true)
}
