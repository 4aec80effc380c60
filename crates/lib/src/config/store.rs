//! Loading and saving configuration documents.
//!
//! Nothing is cached between calls: every load re-reads and every save
//! re-serializes the whole record list.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use super::types::{ConfigurationRecord, StoreError};
use crate::consts::REMOTE_TIMEOUT_SECS;
use crate::util::fs::{to_json_bytes, write_atomic};
use crate::version::UpdateVersion;

/// Transport settings for [`load_remote`].
#[derive(Debug, Clone)]
pub struct RemoteOptions {
  /// Connect and read timeout for the whole request.
  pub timeout: Duration,
  /// Proxy URL all requests go through.
  pub proxy: Option<String>,
  /// Accept any server certificate.
  ///
  /// On by default so existing deployments with self-signed or expired
  /// certificates keep working. Every permissive request logs a warning.
  pub accept_invalid_certs: bool,
}

impl Default for RemoteOptions {
  fn default() -> Self {
    Self {
      timeout: Duration::from_secs(REMOTE_TIMEOUT_SECS),
      proxy: None,
      accept_invalid_certs: true,
    }
  }
}

/// Read a configuration document from disk.
///
/// An empty file is an empty catalog.
pub fn load_local(path: &Path) -> Result<Vec<ConfigurationRecord>, StoreError> {
  let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  let records = parse_document(&content)?;
  debug!(path = %path.display(), records = records.len(), "loaded configuration document");
  Ok(records)
}

/// Fetch a configuration document over HTTP(S).
///
/// Returns `Ok(None)` when the server answers with an empty body.
pub async fn load_remote(url: &str, options: &RemoteOptions) -> Result<Option<Vec<ConfigurationRecord>>, StoreError> {
  let fetch_err = |source| StoreError::Fetch {
    url: url.to_string(),
    source,
  };

  let mut builder = reqwest::Client::builder().timeout(options.timeout);
  if let Some(proxy) = &options.proxy {
    builder = builder.proxy(reqwest::Proxy::all(proxy.as_str()).map_err(fetch_err)?);
  }
  if options.accept_invalid_certs {
    warn!(url, "certificate validation disabled for remote configuration read");
    builder = builder.danger_accept_invalid_certs(true);
  }
  let client = builder.build().map_err(fetch_err)?;

  let body = client
    .get(url)
    .send()
    .await
    .and_then(|response| response.error_for_status())
    .map_err(fetch_err)?
    .text()
    .await
    .map_err(fetch_err)?;

  if body.trim().is_empty() {
    debug!(url, "remote configuration document is empty");
    return Ok(None);
  }

  let records = parse_document(&body)?;
  debug!(url, records = records.len(), "fetched configuration document");
  Ok(Some(records))
}

/// Write the full record list to `path`.
///
/// Uses atomic write (write to temp, then rename) so a crash never leaves a
/// truncated document behind.
pub fn save(path: &Path, records: &[ConfigurationRecord]) -> Result<(), StoreError> {
  let content = to_json_bytes(records).map_err(StoreError::Serialize)?;
  write_atomic(path, &content).map_err(|source| StoreError::Write {
    path: path.to_path_buf(),
    source,
  })?;

  debug!(path = %path.display(), records = records.len(), "saved configuration document");
  Ok(())
}

/// A version published by more than one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateVersion {
  pub version: UpdateVersion,
  /// Positions of the colliding records, in document order.
  pub positions: Vec<usize>,
}

/// Find versions carried by more than one record.
///
/// Literals are compared by parsed value, so `1.0.0.0` and `1.0.0.0-release`
/// collide. Unparseable literals are skipped.
pub fn find_duplicate_versions(records: &[ConfigurationRecord]) -> Vec<DuplicateVersion> {
  let mut seen: BTreeMap<UpdateVersion, Vec<usize>> = BTreeMap::new();
  for (position, record) in records.iter().enumerate() {
    if let Ok(version) = record.version() {
      seen.entry(version).or_default().push(position);
    }
  }

  seen
    .into_iter()
    .filter(|(_, positions)| positions.len() > 1)
    .map(|(version, positions)| DuplicateVersion { version, positions })
    .collect()
}

/// Position of the record publishing `literal`.
///
/// Matches by parsed version when `literal` parses, by exact text otherwise.
pub fn record_position(records: &[ConfigurationRecord], literal: &str) -> Option<usize> {
  match UpdateVersion::parse(literal) {
    Ok(wanted) => records.iter().position(|r| r.version().is_ok_and(|v| v == wanted)),
    Err(_) => records.iter().position(|r| r.literal_version == literal),
  }
}

/// The record publishing `literal`, if any.
pub fn find_record<'a>(records: &'a [ConfigurationRecord], literal: &str) -> Option<&'a ConfigurationRecord> {
  record_position(records, literal).map(|position| &records[position])
}

fn parse_document(content: &str) -> Result<Vec<ConfigurationRecord>, StoreError> {
  if content.trim().is_empty() {
    return Ok(Vec::new());
  }
  serde_json::from_str(content).map_err(StoreError::Parse)
}
