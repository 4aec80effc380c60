//! Editing phases of a publish: validate, mutate, relocate, persist.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use super::PublishError;
use super::lock::{RecordGuard, RecordLocks};
use super::types::{EditRequest, PublishPhase, PublishTransactionState};
use super::validate::validate;
use crate::config::{self, ConfigurationRecord};
use crate::project::{PackageEntry, Project, ProjectError};

/// Entry point for editing a published record.
#[derive(Debug, Clone)]
pub struct PublishSaga {
  project_file: PathBuf,
  locks: RecordLocks,
}

/// Result of the editing phases, ready to be finished or released.
///
/// Holds working copies; the caller's project and records are never touched.
/// The record stays locked until the value is finished, released or dropped.
#[derive(Debug)]
pub struct PreparedPublish {
  pub(crate) project: Project,
  pub(crate) records: Vec<ConfigurationRecord>,
  pub(crate) state: PublishTransactionState,
  pub(crate) rollback: Rollback,
  pub(crate) description: String,
  pub(crate) released: bool,
  pub(crate) guard: RecordGuard,
}

/// What compensation needs to put things back.
#[derive(Debug, Clone)]
pub(crate) struct Rollback {
  pub previous_records: Vec<ConfigurationRecord>,
  /// The edited record's package entry before the edit.
  pub previous_package: Option<PackageEntry>,
  pub project_file: PathBuf,
  pub version_id: i64,
  pub locks: RecordLocks,
}

/// A publish that reached the committed state.
#[derive(Debug)]
pub struct Committed {
  pub project: Project,
  pub records: Vec<ConfigurationRecord>,
  pub state: PublishTransactionState,
  pub(crate) rollback: Rollback,
}

impl PublishSaga {
  /// `project_file` is where the project definition is persisted.
  pub fn new(project_file: impl Into<PathBuf>, locks: RecordLocks) -> Self {
    Self {
      project_file: project_file.into(),
      locks,
    }
  }

  pub fn locks(&self) -> &RecordLocks {
    &self.locks
  }

  /// Validate `request`, apply it to a copy of `records`, relocate the
  /// version directory if the version changed, and write the configuration
  /// document into the (new) version directory.
  ///
  /// Refuses with [`PublishError::RecordLocked`] while another publish holds
  /// the old or the new literal. Validation failures touch nothing. A failure
  /// writing the document does not move a relocated directory back; the error
  /// says whether it moved.
  pub fn edit(
    &self,
    project: &Project,
    records: &[ConfigurationRecord],
    old_literal: &str,
    request: EditRequest,
  ) -> Result<PreparedPublish, PublishError> {
    let new_key = request.version.render();
    let Some(guard) = self.locks.try_acquire([old_literal, new_key.as_str()]) else {
      let literal = [old_literal, new_key.as_str()]
        .into_iter()
        .find(|l| self.locks.is_locked(l))
        .unwrap_or(old_literal);
      return Err(PublishError::RecordLocked {
        literal: literal.to_string(),
      });
    };

    self.edit_locked(guard, project, records, old_literal, request)
  }

  /// Like [`PublishSaga::edit`], but waits for a publish holding the same
  /// literals to finish instead of refusing.
  ///
  /// The caller's `records` should reflect the outcome of that publish.
  pub async fn edit_queued(
    &self,
    project: &Project,
    records: &[ConfigurationRecord],
    old_literal: &str,
    request: EditRequest,
  ) -> Result<PreparedPublish, PublishError> {
    let new_key = request.version.render();
    let guard = self.locks.acquire([old_literal, new_key.as_str()]).await;

    self.edit_locked(guard, project, records, old_literal, request)
  }

  fn edit_locked(
    &self,
    guard: RecordGuard,
    project: &Project,
    records: &[ConfigurationRecord],
    old_literal: &str,
    request: EditRequest,
  ) -> Result<PreparedPublish, PublishError> {
    let checked = validate(records, old_literal, &request)?;
    let previous = &records[checked.position];

    let old_name = previous.literal_version.clone();
    let new_name = if checked.version_changed {
      request.version.render()
    } else {
      old_name.clone()
    };

    let mut state = PublishTransactionState {
      old_literal: old_name.clone(),
      new_literal: new_name.clone(),
      old_dir: project.version_dir(&old_name),
      new_dir: project.version_dir(&new_name),
      version_changed: checked.version_changed,
      directory_moved: false,
      statement_executed: false,
      configuration_uploaded: false,
      remote_renamed: false,
      phase: PublishPhase::Validating,
    };

    let mut working = records.to_vec();
    let record = &mut working[checked.position];
    record.literal_version = new_name.clone();
    record.architecture = request.architecture;
    record.changelog = request.changelog;
    record.must_update = request.must_update;
    record.unsupported_versions = request.unsupported_versions;
    record.use_statistics = request.use_statistics;
    record.operations = request.operations;
    record.package_uri = Some(project.package_uri(&new_name));
    let version_id = record.version_id;

    if checked.version_changed {
      relocate(&state.old_dir, &state.new_dir)?;
      state.directory_moved = true;
      info!(from = %state.old_dir.display(), to = %state.new_dir.display(), "relocated version directory");
    }

    let document = project.configuration_path(&new_name);
    if let Err(source) = config::save(&document, &working) {
      error!(
        path = %document.display(),
        directory_moved = state.directory_moved,
        error = %source,
        "failed to persist configuration document"
      );
      return Err(PublishError::StoreWrite {
        directory_moved: state.directory_moved,
        source,
      });
    }
    state.phase = PublishPhase::PersistedLocal;
    info!(old = %old_name, new = %new_name, "configuration persisted locally");

    let previous_package = project.package(&old_name).cloned();
    let released = previous_package.as_ref().is_some_and(|p| p.is_released);

    Ok(PreparedPublish {
      project: project.clone(),
      records: working,
      state,
      rollback: Rollback {
        previous_records: records.to_vec(),
        previous_package,
        project_file: self.project_file.clone(),
        version_id,
        locks: self.locks.clone(),
      },
      description: request.description,
      released,
      guard,
    })
  }
}

impl PreparedPublish {
  /// Released packages must go through [`PreparedPublish::spawn_release`].
  pub fn is_released(&self) -> bool {
    self.released
  }

  pub fn state(&self) -> &PublishTransactionState {
    &self.state
  }

  pub fn records(&self) -> &[ConfigurationRecord] {
    &self.records
  }

  /// Commit an unreleased package: update its project entry and save the
  /// project definition.
  pub fn finish(mut self) -> Result<Committed, PublishError> {
    if self.released {
      return Err(PublishError::ReleasePending {
        literal: self.state.old_literal.clone(),
      });
    }

    self.project = self.save_package_entry().map_err(PublishError::ProjectSave)?;
    self.state.phase = PublishPhase::Committed;
    info!(version = %self.state.new_literal, "publish committed");

    Ok(self.into_committed())
  }

  /// Point this record's package entry at the new version.
  ///
  /// The project file is re-read under the project mutex so entries other
  /// publishes committed in the meantime survive.
  pub(crate) fn save_package_entry(&self) -> Result<Project, ProjectError> {
    let _project = self.rollback.locks.lock_project();
    let mut project = Project::load(&self.rollback.project_file)?;

    let old = &self.state.old_literal;
    let new = &self.state.new_literal;
    let local_package_path = project.package_path(new);
    match project.package_mut(old) {
      Some(entry) => {
        entry.version = new.clone();
        entry.description = self.description.clone();
        entry.local_package_path = local_package_path;
      }
      None => project.packages.push(PackageEntry {
        version: new.clone(),
        description: self.description.clone(),
        local_package_path,
        is_released: self.released,
      }),
    }

    project.save(&self.rollback.project_file)?;
    Ok(project)
  }

  /// Releases the record lock.
  pub(crate) fn into_committed(self) -> Committed {
    Committed {
      project: self.project,
      records: self.records,
      state: self.state,
      rollback: self.rollback,
    }
  }
}

impl Rollback {
  /// Put the edited record's package entry back, leaving every other entry as
  /// the project file currently has it.
  pub(crate) fn restore_package_entry(&self, new_literal: &str) -> Result<(), ProjectError> {
    let _project = self.locks.lock_project();
    let mut project = Project::load(&self.project_file)?;

    let position = project.packages.iter().position(|p| p.version == new_literal);
    match (position, &self.previous_package) {
      (Some(i), Some(previous)) => project.packages[i] = previous.clone(),
      (Some(i), None) => {
        project.packages.remove(i);
      }
      (None, Some(previous)) if project.package(&previous.version).is_none() => {
        project.packages.push(previous.clone());
      }
      (None, _) => {}
    }

    project.save(&self.project_file)
  }
}

fn relocate(from: &Path, to: &Path) -> Result<(), PublishError> {
  let relocation_err = |source| PublishError::DirectoryRelocation {
    from: from.to_path_buf(),
    to: to.to_path_buf(),
    source,
  };

  if to.exists() {
    return Err(relocation_err(io::Error::new(
      io::ErrorKind::AlreadyExists,
      "target version directory already exists",
    )));
  }
  if let Some(parent) = to.parent() {
    fs::create_dir_all(parent).map_err(relocation_err)?;
  }
  fs::rename(from, to).map_err(relocation_err)
}
