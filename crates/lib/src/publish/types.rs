use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{Architecture, ConfigurationRecord};
use crate::operation::Operation;
use crate::version::{UpdateVersion, VersionError};

/// The new contents of a record, as entered by the author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
  pub version: UpdateVersion,
  #[serde(default)]
  pub architecture: Architecture,
  #[serde(default)]
  pub changelog: BTreeMap<String, String>,
  #[serde(default)]
  pub must_update: bool,
  #[serde(default)]
  pub unsupported_versions: Vec<String>,
  #[serde(default)]
  pub use_statistics: bool,
  #[serde(default)]
  pub operations: Vec<Operation>,
  /// Package description stored in the project definition.
  #[serde(default)]
  pub description: String,
}

impl EditRequest {
  /// A request that leaves `record` as it is.
  pub fn from_record(record: &ConfigurationRecord, description: impl Into<String>) -> Result<Self, VersionError> {
    Ok(Self {
      version: record.version()?,
      architecture: record.architecture,
      changelog: record.changelog.clone(),
      must_update: record.must_update,
      unsupported_versions: record.unsupported_versions.clone(),
      use_statistics: record.use_statistics,
      operations: record.operations.clone(),
      description: description.into(),
    })
  }
}

/// Where a publish attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PublishPhase {
  Editing,
  Validating,
  /// Directory relocated and configuration document written locally.
  PersistedLocal,
  /// Statistics database updated.
  PersistedRemote,
  /// Configuration document uploaded to the remote store.
  UploadedRemote,
  Committed,
  Compensating,
  Failed,
}

impl PublishPhase {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Editing => "editing",
      Self::Validating => "validating",
      Self::PersistedLocal => "persisted-local",
      Self::PersistedRemote => "persisted-remote",
      Self::UploadedRemote => "uploaded-remote",
      Self::Committed => "committed",
      Self::Compensating => "compensating",
      Self::Failed => "failed",
    }
  }
}

impl fmt::Display for PublishPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Bookkeeping for one publish attempt, used to drive compensation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishTransactionState {
  pub old_literal: String,
  pub new_literal: String,
  pub old_dir: PathBuf,
  pub new_dir: PathBuf,
  pub version_changed: bool,
  pub directory_moved: bool,
  /// The statistics statement ran.
  pub statement_executed: bool,
  pub configuration_uploaded: bool,
  pub remote_renamed: bool,
  pub phase: PublishPhase,
}

impl PublishTransactionState {
  pub(crate) fn clear_flags(&mut self) {
    self.directory_moved = false;
    self.statement_executed = false;
    self.configuration_uploaded = false;
    self.remote_renamed = false;
  }
}

/// Steps of the release phase, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReleaseStep {
  ExecuteStatement,
  UploadConfiguration,
  RenameRemoteDirectory,
  SaveProject,
}

impl fmt::Display for ReleaseStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::ExecuteStatement => "execute statistics statement",
      Self::UploadConfiguration => "upload configuration",
      Self::RenameRemoteDirectory => "rename remote directory",
      Self::SaveProject => "save project",
    };
    write!(f, "{}", name)
  }
}

/// Undo actions run after a failed release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompensationStep {
  RestoreDirectory,
  RestoreConfiguration,
  RenameRemoteBack,
  InverseStatement,
  ReuploadConfiguration,
  RestoreProject,
}

impl fmt::Display for CompensationStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::RestoreDirectory => "move local directory back",
      Self::RestoreConfiguration => "restore local configuration",
      Self::RenameRemoteBack => "rename remote directory back",
      Self::InverseStatement => "restore statistics version",
      Self::ReuploadConfiguration => "re-upload previous configuration",
      Self::RestoreProject => "restore project definition",
    };
    write!(f, "{}", name)
  }
}

/// A compensation step that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompensationFailure {
  pub step: CompensationStep,
  pub message: String,
}

impl fmt::Display for CompensationFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.step, self.message)
  }
}

/// Events emitted while a release runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishProgress {
  PhaseChanged(PublishPhase),
  StepCompleted(ReleaseStep),
  /// Compensation ran; carries the final state.
  Compensated(PublishTransactionState),
}
