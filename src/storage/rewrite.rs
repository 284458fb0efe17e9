//! Atomic Rewrite
//!
//! Whole-file replacement via a sibling temp file and a single rename.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::SyncMode;
use crate::error::{Result, StoreError};

/// Rewrite `path` through `transform` and install the result atomically.
///
/// - Line 1 (header) is copied verbatim.
/// - Empty lines are copied verbatim.
/// - Line endings are kept: a replaced line reuses the `\n` or `\r\n`
///   of the line it replaces.
/// - Every other line is handed to `transform`: `Some(new)` replaces it,
///   `None` keeps it as is.
///
/// Returns the number of lines `transform` replaced. The temp file is
/// removed if anything fails before the rename.
pub fn atomic_rewrite<F>(path: &Path, sync: SyncMode, transform: F) -> Result<usize>
where
    F: FnMut(&str) -> Option<String>,
{
    let tmp_path = temp_path_for(path);

    let replaced = match write_temp(path, &tmp_path, sync, transform) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(rewrite_error(path, e));
        }
    };

    // Commit point
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(rewrite_error(path, e));
    }

    if sync == SyncMode::Fsync {
        sync_parent_dir(path).map_err(|e| rewrite_error(path, e))?;
    }

    Ok(replaced)
}

/// Sibling temp path: `posts.csv` → `posts.csv.tmp`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_temp<F>(src: &Path, tmp_path: &Path, sync: SyncMode, mut transform: F) -> io::Result<usize>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut reader = BufReader::new(File::open(src)?);
    let tmp = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(tmp_path)?;
    let mut writer = BufWriter::new(tmp);
    let mut replaced = 0;
    let mut buf = Vec::new();
    let mut header = true;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let (bytes, ending) = split_line_ending(&buf);

        // Header, blank and non-UTF-8 lines are copied as they are
        let new_line = match std::str::from_utf8(bytes) {
            Ok(line) if !header && !line.is_empty() => transform(line),
            _ => None,
        };
        header = false;

        match new_line {
            Some(line) => {
                writer.write_all(line.as_bytes())?;
                // An unterminated last line gets a newline once replaced
                writer.write_all(if ending.is_empty() { &b"\n"[..] } else { ending })?;
                replaced += 1;
            }
            None => writer.write_all(&buf)?,
        }
    }

    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    if sync == SyncMode::Fsync {
        file.sync_all()?;
    }

    Ok(replaced)
}

/// Split a raw line into its content and its `\n` / `\r\n` terminator
fn split_line_ending(buf: &[u8]) -> (&[u8], &[u8]) {
    let content_len = match buf {
        [.., b'\r', b'\n'] => buf.len() - 2,
        [.., b'\n'] => buf.len() - 1,
        _ => buf.len(),
    };
    buf.split_at(content_len)
}

/// Persist the directory entry change made by the rename
fn sync_parent_dir(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        File::open(dir)?.sync_all()?;
    }
    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}

fn rewrite_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Rewrite {
        path: path.to_path_buf(),
        source,
    }
}
