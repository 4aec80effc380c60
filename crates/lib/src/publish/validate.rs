use tracing::debug;

use super::PublishError;
use super::types::EditRequest;
use crate::config::{ConfigurationRecord, record_position};
use crate::consts::DEFAULT_LOCALE;
use crate::operation::validate_operations;
use crate::version::UpdateVersion;

/// Outcome of a successful validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Validated {
  /// Position of the edited record.
  pub position: usize,
  pub old_version: UpdateVersion,
  pub version_changed: bool,
}

/// Check an edit before anything is touched.
pub(crate) fn validate(
  records: &[ConfigurationRecord],
  old_literal: &str,
  request: &EditRequest,
) -> Result<Validated, PublishError> {
  let position = record_position(records, old_literal).ok_or_else(|| PublishError::UnknownRecord {
    literal: old_literal.to_string(),
  })?;
  let old_version = records[position]
    .version()
    .map_err(|source| PublishError::InvalidVersion {
      literal: records[position].literal_version.clone(),
      reason: source.to_string(),
    })?;

  if request.version.is_zero() {
    return Err(PublishError::InvalidVersion {
      literal: request.version.render(),
      reason: "0.0.0.0 cannot be published".to_string(),
    });
  }

  let version_changed = request.version != old_version;
  if version_changed {
    let collides = records
      .iter()
      .enumerate()
      .any(|(i, r)| i != position && r.version().is_ok_and(|v| v == request.version));
    if collides {
      return Err(PublishError::DuplicateVersion {
        literal: request.version.render(),
      });
    }
  }

  let has_default = request
    .changelog
    .get(DEFAULT_LOCALE)
    .is_some_and(|text| !text.trim().is_empty());
  if !has_default {
    return Err(PublishError::MissingChangelog {
      locale: DEFAULT_LOCALE.to_string(),
    });
  }

  validate_operations(&request.operations).map_err(|invalid| PublishError::InvalidOperation {
    index: invalid.index,
    method: invalid.method,
  })?;

  debug!(old = %old_version, new = %request.version, version_changed, "edit validated");
  Ok(Validated {
    position,
    old_version,
    version_changed,
  })
}
