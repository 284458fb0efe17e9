//! Table file reader
//!
//! Streams parsed rows out of one table file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, StoreError};
use crate::record::{parse_line, Record};

/// Per-file read counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Rows handed to the sink
    pub parsed: usize,
    /// Non-empty data lines rejected by the parser
    pub malformed: usize,
}

/// Read every data row of `path` into `sink`, in file order.
///
/// The first line is skipped without inspection. Empty lines are ignored.
/// Lines that fail to parse (wrong arity, bad integer, invalid UTF-8) are
/// counted and dropped. Failing to open the file is an error.
pub fn read_rows<R, F>(path: &Path, mut sink: F) -> Result<ReadStats>
where
    R: Record,
    F: FnMut(R),
{
    let file = File::open(path).map_err(|source| StoreError::TableOpen {
        table: R::TABLE,
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let mut stats = ReadStats::default();
    let mut buf = Vec::new();
    let mut header = true;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if header {
            header = false;
            continue;
        }

        let bytes = strip_line_ending(&buf);
        if bytes.is_empty() {
            continue;
        }

        let row = std::str::from_utf8(bytes).ok().and_then(parse_line::<R>);
        match row {
            Some(row) => {
                stats.parsed += 1;
                sink(row);
            }
            None => {
                stats.malformed += 1;
                tracing::trace!(
                    table = %R::TABLE,
                    line = %String::from_utf8_lossy(bytes),
                    "rejected malformed row"
                );
            }
        }
    }

    Ok(stats)
}

fn strip_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
