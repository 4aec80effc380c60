//! Project definitions.
//!
//! A project names the product, where its version directories live locally,
//! where packages are downloaded from, and which packages exist. The
//! definition is an explicit value: the publish workflow receives it as an
//! argument and hands back an updated copy.
//!
//! # File Format
//!
//! ```json
//! {
//!   "name": "Example",
//!   "guid": "9a0c4b8e-3f5e-4a8b-9d55-0e4e1f7a2c11",
//!   "updateUrl": "https://updates.example.com/example",
//!   "remoteDirectory": "/srv/www/example",
//!   "useStatistics": true,
//!   "statistics": { "database": "/srv/stats/example.db" },
//!   "packages": [
//!     { "version": "1.0.0.0", "description": "First release",
//!       "localPackagePath": "...", "isReleased": true }
//!   ]
//! }
//! ```

mod lock;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::CONFIGURATION_FILENAME;
use crate::platform::paths;
use crate::util::fs::{to_json_bytes, write_atomic};

pub use lock::{LockMetadata, ProjectLock, ProjectLockError, lock_path_for};

/// Where download statistics are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSettings {
  /// Database location handed to the statistics backend.
  pub database: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user: Option<String>,
}

/// A package known to the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageEntry {
  pub version: String,
  #[serde(default)]
  pub description: String,
  pub local_package_path: PathBuf,
  /// Released packages are mirrored to the remote store.
  #[serde(default)]
  pub is_released: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
  pub name: String,
  pub guid: String,
  /// Base URL packages are downloaded from.
  pub update_url: String,
  /// Local root holding `<name>/<version>` directories. Defaults to
  /// [`paths::projects_root`].
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub projects_root: Option<PathBuf>,
  /// Base directory of the remote file store.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub remote_directory: Option<PathBuf>,
  #[serde(default)]
  pub use_statistics: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub statistics: Option<StatisticsSettings>,
  #[serde(default)]
  pub packages: Vec<PackageEntry>,
}

/// Errors that can occur when working with project files.
#[derive(Debug, Error)]
pub enum ProjectError {
  /// Failed to read the project file.
  #[error("failed to read project file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to write the project file.
  #[error("failed to write project file {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to parse the project file JSON.
  #[error("failed to parse project file: {0}")]
  Parse(#[source] serde_json::Error),

  /// Failed to serialize the project.
  #[error("failed to serialize project: {0}")]
  Serialize(#[source] serde_json::Error),
}

impl Project {
  pub fn load(path: &Path) -> Result<Self, ProjectError> {
    let content = fs::read_to_string(path).map_err(|source| ProjectError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let project: Project = serde_json::from_str(&content).map_err(ProjectError::Parse)?;
    debug!(path = %path.display(), name = %project.name, "loaded project");
    Ok(project)
  }

  /// Save the project using an atomic write.
  pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
    let content = to_json_bytes(self).map_err(ProjectError::Serialize)?;
    write_atomic(path, &content).map_err(|source| ProjectError::Write {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn root(&self) -> PathBuf {
    self.projects_root.clone().unwrap_or_else(paths::projects_root)
  }

  /// `<root>/<name>/<literal>`
  pub fn version_dir(&self, literal: &str) -> PathBuf {
    self.root().join(&self.name).join(literal)
  }

  pub fn configuration_path(&self, literal: &str) -> PathBuf {
    self.version_dir(literal).join(CONFIGURATION_FILENAME)
  }

  /// `<update_url>/<literal>/<guid>.zip`
  pub fn package_uri(&self, literal: &str) -> String {
    format!("{}/{}/{}.zip", self.update_url.trim_end_matches('/'), literal, self.guid)
  }

  pub fn package_path(&self, literal: &str) -> PathBuf {
    self.version_dir(literal).join(format!("{}.zip", self.guid))
  }

  /// Statistics are on and a backend is configured.
  pub fn statistics_enabled(&self) -> bool {
    self.use_statistics && self.statistics.is_some()
  }

  pub fn package(&self, literal: &str) -> Option<&PackageEntry> {
    self.packages.iter().find(|p| p.version == literal)
  }

  pub fn package_mut(&mut self, literal: &str) -> Option<&mut PackageEntry> {
    self.packages.iter_mut().find(|p| p.version == literal)
  }
}
