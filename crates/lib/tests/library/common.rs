//! Shared fixtures for library integration tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use patchline_lib::config::{self, ConfigurationRecord};
use patchline_lib::project::{PackageEntry, Project, StatisticsSettings};
use patchline_lib::publish::{
  ConnectionParams, EditRequest, PublishProgress, PublishSaga, RecordLocks, RemoteError, RemoteFileStore,
  StatisticsDatabase, VersionStatement,
};
use patchline_lib::version::UpdateVersion;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

pub fn record(literal: &str) -> ConfigurationRecord {
  let mut rec = ConfigurationRecord::new(&UpdateVersion::parse(literal).unwrap());
  rec.changelog.insert("en".into(), format!("Changes in {}", literal));
  rec
}

/// A project with one version directory per record, each holding the
/// configuration document.
pub struct Fixture {
  pub dir: TempDir,
  pub project: Project,
  pub project_file: PathBuf,
  pub records: Vec<ConfigurationRecord>,
}

impl Fixture {
  pub fn new(versions: &[&str], released: bool) -> Self {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("projects");

    let records: Vec<_> = versions
      .iter()
      .enumerate()
      .map(|(i, v)| {
        let mut rec = record(v);
        rec.version_id = i as i64 + 1;
        rec
      })
      .collect();

    let mut project = Project {
      name: "Example".into(),
      guid: "6f9619ff-8b86-d011-b42d-00c04fc964ff".into(),
      update_url: "https://updates.example.com/example".into(),
      projects_root: Some(root),
      remote_directory: Some(dir.path().join("remote")),
      use_statistics: false,
      statistics: None,
      packages: Vec::new(),
    };
    for v in versions {
      let local_package_path = project.package_path(v);
      project.packages.push(PackageEntry {
        version: v.to_string(),
        description: format!("Package {}", v),
        local_package_path,
        is_released: released,
      });
      fs::create_dir_all(project.version_dir(v)).unwrap();
      fs::write(project.package_path(v), b"zip").unwrap();
      config::save(&project.configuration_path(v), &records).unwrap();
      fs::create_dir_all(dir.path().join("remote").join(v)).unwrap();
    }

    let project_file = dir.path().join("project.json");
    project.save(&project_file).unwrap();

    Self {
      dir,
      project,
      project_file,
      records,
    }
  }

  /// Turn statistics on, backed by a SQLite database at `stats.db`.
  pub fn with_statistics(mut self) -> Self {
    self.project.use_statistics = true;
    self.project.statistics = Some(StatisticsSettings {
      database: self.stats_db().to_string_lossy().into_owned(),
      user: Some("publisher".into()),
    });
    self.project.save(&self.project_file).unwrap();
    self
  }

  pub fn stats_db(&self) -> PathBuf {
    self.dir.path().join("stats.db")
  }

  pub fn remote_dir(&self) -> PathBuf {
    self.dir.path().join("remote")
  }

  pub fn connection_params(&self) -> ConnectionParams {
    ConnectionParams {
      database: self.stats_db().to_string_lossy().into_owned(),
      user: Some("publisher".into()),
      password: Some("secret".into()),
    }
  }

  pub fn saga(&self, locks: &RecordLocks) -> PublishSaga {
    PublishSaga::new(&self.project_file, locks.clone())
  }

  /// Edit `from` into `to`, keeping everything else.
  pub fn request(&self, from: &str, to: &str) -> EditRequest {
    let rec = config::find_record(&self.records, from).unwrap();
    let mut request = EditRequest::from_record(rec, format!("Edited {}", to)).unwrap();
    request.version = UpdateVersion::parse(to).unwrap();
    request
  }
}

/// Every file below `root` with its contents.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
  let mut files = BTreeMap::new();
  collect(root, &mut files);
  files
}

fn collect(dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
  for entry in fs::read_dir(dir).unwrap() {
    let path = entry.unwrap().path();
    if path.is_dir() {
      files.insert(path.clone(), Vec::new());
      collect(&path, files);
    } else {
      files.insert(path.clone(), fs::read(&path).unwrap());
    }
  }
}

pub fn drain(rx: &mut UnboundedReceiver<PublishProgress>) -> Vec<PublishProgress> {
  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }
  events
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
  pub fn push(&self, call: String) {
    self.0.lock().unwrap().push(call);
  }

  pub fn calls(&self) -> Vec<String> {
    self.0.lock().unwrap().clone()
  }
}

/// Tracks how many calls are in flight at once.
#[derive(Debug, Clone, Default)]
pub struct Concurrency {
  active: Arc<AtomicUsize>,
  max: Arc<AtomicUsize>,
}

impl Concurrency {
  fn enter(&self) {
    let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
    self.max.fetch_max(now, Ordering::SeqCst);
  }

  fn exit(&self) {
    self.active.fetch_sub(1, Ordering::SeqCst);
  }

  pub fn max(&self) -> usize {
    self.max.load(Ordering::SeqCst)
  }
}

/// Remote store that records calls and fails on demand.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
  pub log: CallLog,
  pub fail_upload: bool,
  pub fail_rename: bool,
  pub delay: Duration,
  pub concurrency: Concurrency,
}

impl RemoteFileStore for MockStore {
  fn upload(&mut self, _local: &Path, remote_name: &str) -> Result<(), RemoteError> {
    self.concurrency.enter();
    std::thread::sleep(self.delay);
    self.concurrency.exit();

    if self.fail_upload {
      return Err(RemoteError::Upload {
        name: remote_name.to_string(),
        source: "connection reset".into(),
      });
    }
    self.log.push(format!("upload {}", remote_name));
    Ok(())
  }

  fn rename(&mut self, old_name: &str, new_name: &str) -> Result<(), RemoteError> {
    if self.fail_rename {
      return Err(RemoteError::Rename {
        from: old_name.to_string(),
        to: new_name.to_string(),
        source: "permission denied".into(),
      });
    }
    self.log.push(format!("rename {} {}", old_name, new_name));
    Ok(())
  }
}

/// Statistics database that records statements and fails on demand.
#[derive(Debug, Clone, Default)]
pub struct MockDatabase {
  pub log: CallLog,
  pub fail_connect: bool,
  /// Statements setting this version string fail.
  pub fail_version: Option<String>,
}

impl StatisticsDatabase for MockDatabase {
  fn connect(&mut self, _params: &ConnectionParams) -> Result<(), RemoteError> {
    if self.fail_connect {
      return Err(RemoteError::Connect("host unreachable".into()));
    }
    self.log.push("connect".to_string());
    Ok(())
  }

  fn execute(&mut self, statement: &VersionStatement) -> Result<(), RemoteError> {
    if self.fail_version.as_deref() == Some(statement.version.as_str()) {
      return Err(RemoteError::Execute("deadlock detected".into()));
    }
    self
      .log
      .push(format!("execute {} {}", statement.version_id, statement.version));
    Ok(())
  }
}
