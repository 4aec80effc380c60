//! The release phase: mirror an edited record to the statistics database and
//! the remote file store, compensating on failure.

use std::fs;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::PublishError;
use super::remote::{Collaborators, RemoteError, VersionStatement};
use super::saga::{Committed, PreparedPublish, Rollback};
use super::types::{
  CompensationFailure, CompensationStep, PublishPhase, PublishProgress, PublishTransactionState, ReleaseStep,
};
use crate::config;
use crate::consts::CONFIGURATION_FILENAME;

/// A running release. Await [`ReleaseHandle::wait`] for the outcome.
#[derive(Debug)]
pub struct ReleaseHandle {
  inner: JoinHandle<Result<Committed, PublishError>>,
}

impl ReleaseHandle {
  pub async fn wait(self) -> Result<Committed, PublishError> {
    self
      .inner
      .await
      .map_err(|e| PublishError::TaskFailed(e.to_string()))?
  }

  pub fn is_finished(&self) -> bool {
    self.inner.is_finished()
  }
}

impl PreparedPublish {
  /// Run the release phase on a blocking thread of the tokio runtime.
  ///
  /// The record lock taken by `edit` travels with the job and is released on
  /// every exit path, including a panicking collaborator.
  pub fn spawn_release(self, collaborators: Collaborators, progress: UnboundedSender<PublishProgress>) -> ReleaseHandle {
    let inner = tokio::task::spawn_blocking(move || release(self, collaborators, &progress));

    ReleaseHandle { inner }
  }
}

impl Committed {
  /// Undo a committed release after the fact.
  ///
  /// Waits for the record lock, runs the same compensation a failed release
  /// runs, then puts the record's package entry back.
  pub async fn revert(self, collaborators: Collaborators) -> Result<PublishTransactionState, PublishError> {
    let locks = self.rollback.locks.clone();
    let _guard = locks
      .acquire([self.state.old_literal.as_str(), self.state.new_literal.as_str()])
      .await;

    tokio::task::spawn_blocking(move || self.compensate_committed(collaborators))
      .await
      .map_err(|e| PublishError::TaskFailed(e.to_string()))?
  }

  fn compensate_committed(mut self, mut collaborators: Collaborators) -> Result<PublishTransactionState, PublishError> {
    let failures = compensate(&mut self.state, &self.rollback, &mut collaborators, false, true);
    if failures.is_empty() {
      Ok(self.state)
    } else {
      Err(PublishError::CompensationFailed {
        original: Box::new(PublishError::Reverted),
        failures,
      })
    }
  }
}

fn release(
  mut job: PreparedPublish,
  mut collaborators: Collaborators,
  progress: &UnboundedSender<PublishProgress>,
) -> Result<Committed, PublishError> {
  let notify = |event: PublishProgress| {
    let _ = progress.send(event);
  };
  info!(old = %job.state.old_literal, new = %job.state.new_literal, "starting release");

  let mut connected = false;
  match run_steps(&mut job, &mut collaborators, &mut connected, &notify) {
    Ok(()) => {
      job.state.phase = PublishPhase::Committed;
      notify(PublishProgress::PhaseChanged(PublishPhase::Committed));
      info!(version = %job.state.new_literal, "release committed");
      Ok(job.into_committed())
    }
    Err(err) => {
      error!(error = %err, phase = %job.state.phase, "release failed, compensating");
      job.state.phase = PublishPhase::Compensating;
      notify(PublishProgress::PhaseChanged(PublishPhase::Compensating));

      let failures = compensate(&mut job.state, &job.rollback, &mut collaborators, connected, false);
      notify(PublishProgress::Compensated(job.state.clone()));

      if failures.is_empty() {
        Err(err)
      } else {
        Err(PublishError::CompensationFailed {
          original: Box::new(err),
          failures,
        })
      }
    }
  }
}

/// Steps 5a to 5d, strictly in order.
fn run_steps(
  job: &mut PreparedPublish,
  collaborators: &mut Collaborators,
  connected: &mut bool,
  notify: &impl Fn(PublishProgress),
) -> Result<(), PublishError> {
  let remote_err = |step| move |source| PublishError::RemoteState { step, source };

  if job.project.statistics_enabled() {
    let backend = collaborators
      .statistics
      .as_mut()
      .ok_or(RemoteError::MissingBackend)
      .map_err(remote_err(ReleaseStep::ExecuteStatement))?;
    backend
      .database
      .connect(&backend.params)
      .map_err(remote_err(ReleaseStep::ExecuteStatement))?;
    *connected = true;

    let statement = VersionStatement {
      version_id: job.rollback.version_id,
      version: job.state.new_literal.clone(),
    };
    backend
      .database
      .execute(&statement)
      .map_err(remote_err(ReleaseStep::ExecuteStatement))?;
    job.state.statement_executed = true;
    job.state.phase = PublishPhase::PersistedRemote;
    notify(PublishProgress::StepCompleted(ReleaseStep::ExecuteStatement));
    info!(version_id = statement.version_id, version = %statement.version, "statistics updated");
  }

  let local = job.state.new_dir.join(CONFIGURATION_FILENAME);
  collaborators
    .remote
    .upload(&local, &remote_document(&job.state.old_literal))
    .map_err(remote_err(ReleaseStep::UploadConfiguration))?;
  job.state.configuration_uploaded = true;
  job.state.phase = PublishPhase::UploadedRemote;
  notify(PublishProgress::StepCompleted(ReleaseStep::UploadConfiguration));

  if job.state.version_changed {
    collaborators
      .remote
      .rename(&job.state.old_literal, &job.state.new_literal)
      .map_err(remote_err(ReleaseStep::RenameRemoteDirectory))?;
    job.state.remote_renamed = true;
    notify(PublishProgress::StepCompleted(ReleaseStep::RenameRemoteDirectory));
  }

  job.project = job.save_package_entry().map_err(PublishError::ProjectSave)?;
  notify(PublishProgress::StepCompleted(ReleaseStep::SaveProject));

  Ok(())
}

/// Undo whatever the flags say happened. Every step is attempted; failures
/// are collected, never retried.
fn compensate(
  state: &mut PublishTransactionState,
  rollback: &Rollback,
  collaborators: &mut Collaborators,
  connected: bool,
  restore_project: bool,
) -> Vec<CompensationFailure> {
  let mut failures = Vec::new();
  let mut record = |step: CompensationStep, result: Result<(), String>| match result {
    Ok(()) => info!(%step, "compensation step done"),
    Err(message) => {
      error!(%step, error = %message, "compensation step failed");
      failures.push(CompensationFailure { step, message });
    }
  };

  if state.directory_moved {
    let result = fs::rename(&state.new_dir, &state.old_dir).map_err(|e| e.to_string());
    record(CompensationStep::RestoreDirectory, result);
  }

  let document = state.old_dir.join(CONFIGURATION_FILENAME);
  let result = config::save(&document, &rollback.previous_records).map_err(|e| e.to_string());
  record(CompensationStep::RestoreConfiguration, result);

  if state.remote_renamed {
    let result = collaborators
      .remote
      .rename(&state.new_literal, &state.old_literal)
      .map_err(|e| e.to_string());
    record(CompensationStep::RenameRemoteBack, result);
  }

  if state.statement_executed {
    let result = match collaborators.statistics.as_mut() {
      Some(backend) => {
        let connect = if connected {
          Ok(())
        } else {
          backend.database.connect(&backend.params)
        };
        connect.and_then(|()| {
          backend.database.execute(&VersionStatement {
            version_id: rollback.version_id,
            version: state.old_literal.clone(),
          })
        })
      }
      None => Err(RemoteError::MissingBackend),
    };
    record(CompensationStep::InverseStatement, result.map_err(|e| e.to_string()));
  }

  if state.configuration_uploaded {
    let result = collaborators
      .remote
      .upload(&document, &remote_document(&state.old_literal))
      .map_err(|e| e.to_string());
    record(CompensationStep::ReuploadConfiguration, result);
  }

  if restore_project {
    let result = rollback
      .restore_package_entry(&state.new_literal)
      .map_err(|e| e.to_string());
    record(CompensationStep::RestoreProject, result);
  }

  state.clear_flags();
  state.phase = PublishPhase::Failed;
  failures
}

fn remote_document(literal: &str) -> String {
  format!("{}/{}", literal, CONFIGURATION_FILENAME)
}
