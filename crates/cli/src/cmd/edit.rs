//! Implementation of the `patchline edit` command.
//!
//! Applies a changes file to one version of a project and, for released
//! packages, mirrors the result to the project's remote directory and
//! statistics database. The project stays locked against other patchline
//! processes until the command returns.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use patchline_lib::config;
use patchline_lib::project::{Project, ProjectLock};
use patchline_lib::publish::{
  Collaborators, ConnectionParams, DirectoryFileStore, EditRequest, PublishProgress, PublishSaga, RecordLocks,
  SqliteStatistics,
};
use tokio::sync::mpsc::unbounded_channel;
use tracing::info;

use crate::output::{format_duration, print_info, print_stat, print_success, print_warning, symbols};

pub fn cmd_edit(project_file: &Path, version: &str, changes: &Path, sql_password: Option<String>) -> Result<()> {
  let start = Instant::now();
  let project_file = dunce::canonicalize(project_file)
    .with_context(|| format!("Project file not found: {}", project_file.display()))?;
  let _lock = ProjectLock::acquire(&project_file, "patchline edit").context("Project is busy")?;
  let project = Project::load(&project_file).context("Failed to load project")?;

  let document = project.configuration_path(version);
  let records = config::load_local(&document).context("Failed to load configuration")?;

  let content = fs::read_to_string(changes).with_context(|| format!("Failed to read {}", changes.display()))?;
  let request: EditRequest = serde_json::from_str(&content).context("Invalid changes file")?;

  let saga = PublishSaga::new(&project_file, RecordLocks::new());
  let prepared = saga
    .edit(&project, &records, version, request)
    .context("Edit rejected")?;
  let state = prepared.state().clone();
  info!(old = %state.old_literal, new = %state.new_literal, "edit persisted locally");

  let committed = if prepared.is_released() {
    let collaborators = collaborators(&project, sql_password)?;
    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

    rt.block_on(async {
      let (tx, mut rx) = unbounded_channel();
      let handle = prepared.spawn_release(collaborators, tx);

      while let Some(event) = rx.recv().await {
        report(&event);
      }
      handle.wait().await
    })
    .context("Release failed")?
  } else {
    prepared.finish().context("Failed to commit edit")?
  };

  let state = &committed.state;
  if state.version_changed {
    print_success(&format!(
      "Published {} {} {}",
      state.old_literal,
      symbols::ARROW,
      state.new_literal
    ));
  } else {
    print_success(&format!("Published {}", state.new_literal));
  }
  print_stat("Directory", &state.new_dir.display().to_string());
  print_stat("Released", if state.configuration_uploaded { "yes" } else { "no" });
  print_stat("Took", &format_duration(start.elapsed()));

  Ok(())
}

fn collaborators(project: &Project, sql_password: Option<String>) -> Result<Collaborators> {
  let Some(remote) = &project.remote_directory else {
    bail!("Project '{}' has no remote directory configured", project.name);
  };
  let mut collaborators = Collaborators::new(DirectoryFileStore::new(remote));

  if project.statistics_enabled()
    && let Some(settings) = &project.statistics
  {
    collaborators = collaborators.with_statistics(
      SqliteStatistics::new(),
      ConnectionParams::from_settings(settings, sql_password),
    );
  }

  Ok(collaborators)
}

fn report(event: &PublishProgress) {
  match event {
    PublishProgress::PhaseChanged(phase) => info!(%phase, "release phase"),
    PublishProgress::StepCompleted(step) => print_info(&format!("{} done", step)),
    PublishProgress::Compensated(state) => print_warning(&format!(
      "Release rolled back; {} is back at {}",
      state.old_literal,
      state.old_dir.display()
    )),
  }
}
