//! Editing and republishing a version's configuration record.
//!
//! A publish spans the local version directory, the local configuration
//! document, an optional statistics database and a remote file store. There
//! is no transaction across those systems, so the release phase records what
//! it did in a [`PublishTransactionState`] and undoes it step by step when a
//! later step fails.
//!
//! # Phases
//!
//! 1. Validate the request (nothing is touched on failure).
//! 2. Apply it to working copies of the records and project.
//! 3. Move the version directory if the version changed.
//! 4. Write the configuration document into the version directory.
//! 5. For released packages, on a background task holding the record lock:
//!    update statistics, upload the document, rename the remote directory,
//!    then save the project definition.
//!
//! Phases 1 to 4 run in [`PublishSaga::edit`]. Phase 5 runs in
//! [`PreparedPublish::spawn_release`]; unreleased packages commit with
//! [`PreparedPublish::finish`].

mod adapters;
mod lock;
mod release;
mod remote;
mod saga;
mod types;
mod validate;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use adapters::{DirectoryFileStore, SqliteStatistics};
pub use lock::{RecordGuard, RecordLocks, record_key};
pub use release::ReleaseHandle;
pub use remote::{
  BoxError, Collaborators, ConnectionParams, RemoteError, RemoteFileStore, StatisticsBackend, StatisticsDatabase,
  VersionStatement,
};
pub use saga::{Committed, PreparedPublish, PublishSaga};
pub use types::{
  CompensationFailure, CompensationStep, EditRequest, PublishPhase, PublishProgress, PublishTransactionState,
  ReleaseStep,
};

use crate::config::StoreError;
use crate::operation::OperationMethod;
use crate::project::ProjectError;

/// Errors that can occur while publishing.
#[derive(Debug, Error)]
pub enum PublishError {
  /// The edited version is zero or the stored literal does not parse.
  #[error("invalid version '{literal}': {reason}")]
  InvalidVersion { literal: String, reason: String },

  /// No record publishes the version being edited.
  #[error("no record publishes version '{literal}'")]
  UnknownRecord { literal: String },

  /// Another record already publishes the new version.
  #[error("version '{literal}' is already published")]
  DuplicateVersion { literal: String },

  #[error("a changelog for locale '{locale}' is required")]
  MissingChangelog { locale: String },

  /// The operation at `index` is missing required fields.
  #[error("operation {index} ({method}) is incomplete")]
  InvalidOperation { index: usize, method: OperationMethod },

  /// A release of this record is in progress.
  #[error("version '{literal}' is being released; try again when it finishes")]
  RecordLocked { literal: String },

  /// Moving the version directory failed. Nothing was persisted.
  #[error("failed to move {from} to {to}: {source}")]
  DirectoryRelocation {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Writing the local configuration document failed.
  ///
  /// A directory moved in the same attempt stays at its new path.
  #[error("failed to write configuration (directory moved: {directory_moved}): {source}")]
  StoreWrite {
    directory_moved: bool,
    #[source]
    source: StoreError,
  },

  /// A database or remote store call failed during release.
  #[error("release step '{step}' failed: {source}")]
  RemoteState {
    step: ReleaseStep,
    #[source]
    source: RemoteError,
  },

  #[error("failed to save project: {0}")]
  ProjectSave(#[source] ProjectError),

  /// `finish` was called on a released package.
  #[error("version '{literal}' is released and must go through the release phase")]
  ReleasePending { literal: String },

  /// The caller undid a committed release.
  #[error("release reverted by caller")]
  Reverted,

  /// Compensation could not restore a consistent state. Local and remote
  /// state may have diverged and need manual repair.
  #[error("compensation failed after '{original}': {}", format_failures(.failures))]
  CompensationFailed {
    original: Box<PublishError>,
    failures: Vec<CompensationFailure>,
  },

  /// The release task panicked or was cancelled.
  #[error("release task failed: {0}")]
  TaskFailed(String),
}

impl PublishError {
  /// Validation errors leave every system untouched.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::InvalidVersion { .. }
        | Self::UnknownRecord { .. }
        | Self::DuplicateVersion { .. }
        | Self::MissingChangelog { .. }
        | Self::InvalidOperation { .. }
        | Self::RecordLocked { .. }
    )
  }
}

fn format_failures(failures: &[CompensationFailure]) -> String {
  failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
