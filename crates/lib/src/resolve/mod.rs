//! Client-side update resolution.
//!
//! Given a catalog and the client's installed version and preferences,
//! [`resolve`] filters the catalog down to the eligible records and selects
//! the newest one. Each filter is a separate public predicate so callers can
//! explain why a record was not offered.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ConfigurationRecord;
use crate::platform::HostArch;
use crate::version::{DevelopmentalStage, UpdateVersion, highest};

/// What the client has installed and what it is willing to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionContext {
  pub installed: UpdateVersion,
  pub accept_alpha: bool,
  pub accept_beta: bool,
  pub host: HostArch,
}

impl ResolutionContext {
  /// Releases only, for the running host.
  pub fn new(installed: UpdateVersion) -> Self {
    Self {
      installed,
      accept_alpha: false,
      accept_beta: false,
      host: HostArch::current(),
    }
  }

  pub fn with_alpha(mut self, accept: bool) -> Self {
    self.accept_alpha = accept;
    self
  }

  pub fn with_beta(mut self, accept: bool) -> Self {
    self.accept_beta = accept;
    self
  }

  pub fn with_host(mut self, host: HostArch) -> Self {
    self.host = host;
    self
  }
}

/// Outcome of a resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
  /// Records surviving every filter, in catalog order.
  pub eligible: Vec<ConfigurationRecord>,
  /// The eligible record with the highest version.
  pub best: Option<ConfigurationRecord>,
}

impl Resolution {
  pub fn found(&self) -> bool {
    !self.eligible.is_empty()
  }

  /// Whether any eligible record forces installation.
  ///
  /// Skipping the best update would also skip every mandatory one below it.
  pub fn must_update(&self) -> bool {
    self.eligible.iter().any(|record| record.must_update)
  }

  /// Changelogs of the eligible records, newest first.
  pub fn changelogs(&self, locale: &str) -> Vec<(UpdateVersion, String)> {
    let mut entries: Vec<_> = self
      .eligible
      .iter()
      .filter_map(|record| {
        let version = record.version().ok()?;
        let text = record.changelog_for(locale)?;
        Some((version, text.to_string()))
      })
      .collect();
    entries.sort_by(|a, b| b.0.cmp(&a.0));
    entries
  }
}

/// The record's version is newer than the installed one.
pub fn is_newer(version: &UpdateVersion, ctx: &ResolutionContext) -> bool {
  *version > ctx.installed
}

/// Releases always pass; pre-releases only when the client opted in.
pub fn is_stage_accepted(version: &UpdateVersion, ctx: &ResolutionContext) -> bool {
  match version.stage() {
    DevelopmentalStage::Release => true,
    DevelopmentalStage::Alpha => ctx.accept_alpha,
    DevelopmentalStage::Beta => ctx.accept_beta,
  }
}

/// The installed version is not excluded by the record.
pub fn is_supported(record: &ConfigurationRecord, ctx: &ResolutionContext) -> bool {
  !record.is_unsupported_for(&ctx.installed)
}

pub fn is_architecture_compatible(record: &ConfigurationRecord, ctx: &ResolutionContext) -> bool {
  record.architecture.is_compatible_with(ctx.host)
}

/// Compute the eligible records and the best candidate.
///
/// Records whose version literal does not parse are skipped with a warning
/// so one bad record cannot deny updates to every client. When two eligible
/// records carry the same highest version the first in catalog order wins;
/// [`crate::config::find_duplicate_versions`] reports that situation.
pub fn resolve(catalog: &[ConfigurationRecord], ctx: &ResolutionContext) -> Resolution {
  let mut eligible: Vec<(UpdateVersion, &ConfigurationRecord)> = Vec::new();

  for record in catalog {
    let version = match record.version() {
      Ok(version) => version,
      Err(err) => {
        warn!(literal = %record.literal_version, error = %err, "skipping record with malformed version");
        continue;
      }
    };

    let rejected_by = if !is_newer(&version, ctx) {
      Some("not newer")
    } else if !is_stage_accepted(&version, ctx) {
      Some("stage not accepted")
    } else if !is_supported(record, ctx) {
      Some("installed version unsupported")
    } else if !is_architecture_compatible(record, ctx) {
      Some("architecture mismatch")
    } else {
      None
    };

    match rejected_by {
      Some(reason) => debug!(version = %version, reason, "record not eligible"),
      None => eligible.push((version, record)),
    }
  }

  let best = highest(eligible.iter().map(|(version, _)| version))
    .ok()
    .and_then(|max| eligible.iter().find(|(version, _)| *version == max))
    .map(|(_, record)| (*record).clone());

  if let Some(best) = &best {
    debug!(installed = %ctx.installed, best = %best.literal_version, eligible = eligible.len(), "resolved update");
  }

  Resolution {
    eligible: eligible.into_iter().map(|(_, record)| record.clone()).collect(),
    best,
  }
}
