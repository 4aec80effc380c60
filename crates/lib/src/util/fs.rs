//! Crash-safe file writes.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

/// Write `contents` to `path` without ever exposing a partial file.
///
/// The data goes to a temporary file in the same directory, is flushed to
/// disk, and then replaces `path` with a rename. A crash mid-write leaves
/// the previous file untouched.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
  let parent = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  fs::create_dir_all(parent)?;

  let mut temp = NamedTempFile::new_in(parent)?;
  temp.write_all(contents)?;
  temp.as_file().sync_all()?;
  temp.persist(path).map_err(|e| e.error)?;

  Ok(())
}

/// Serialize `value` as pretty JSON into a byte buffer with a trailing newline.
pub fn to_json_bytes<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
  let mut bytes = serde_json::to_vec_pretty(value)?;
  bytes.push(b'\n');
  Ok(bytes)
}
