//! Append-only row writes

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::config::SyncMode;
use crate::error::{Result, StoreError};
use crate::record::TableKind;

/// Append one row to the end of `path`.
///
/// Existing bytes are never rewritten. If the file does not end in a
/// newline, one is written first so the previous row stays intact. An
/// empty file gets `table`'s header first, since readers skip line 1.
pub fn append_line(path: &Path, table: TableKind, line: &str, sync: SyncMode) -> Result<()> {
    let wrap = |source: io::Error| StoreError::Append {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .open(path)
        .map_err(wrap)?;

    let mut buf = String::with_capacity(line.len() + 2);
    match file_tail(&mut file).map_err(wrap)? {
        Tail::Empty => {
            buf.push_str(table.header());
            buf.push('\n');
        }
        Tail::Unterminated => buf.push('\n'),
        Tail::Newline => {}
    }
    buf.push_str(line);
    buf.push('\n');

    file.write_all(buf.as_bytes()).map_err(wrap)?;
    if sync == SyncMode::Fsync {
        file.sync_data().map_err(wrap)?;
    }

    Ok(())
}

/// How the file currently ends
enum Tail {
    Empty,
    Newline,
    Unterminated,
}

fn file_tail(file: &mut File) -> io::Result<Tail> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(Tail::Empty);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(if last[0] == b'\n' {
        Tail::Newline
    } else {
        Tail::Unterminated
    })
}
