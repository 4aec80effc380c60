//! Narrow capabilities the release phase needs from remote systems.
//!
//! Both traits are blocking: implementations are called from a blocking
//! thread and may perform I/O directly.

use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::project::StatisticsSettings;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors reported by remote collaborators.
#[derive(Debug, Error)]
pub enum RemoteError {
  #[error("failed to connect to statistics database: {0}")]
  Connect(#[source] BoxError),

  #[error("statistics statement failed: {0}")]
  Execute(#[source] BoxError),

  #[error("statistics database is not connected")]
  NotConnected,

  /// Statistics are enabled for the project but no backend was supplied.
  #[error("statistics are enabled but no statistics backend is configured")]
  MissingBackend,

  #[error("failed to upload {name}: {source}")]
  Upload {
    name: String,
    #[source]
    source: BoxError,
  },

  #[error("failed to rename remote {from} to {to}: {source}")]
  Rename {
    from: String,
    to: String,
    #[source]
    source: BoxError,
  },
}

/// File store the configuration document is mirrored to.
///
/// Names are relative to the store's base directory and use `/`.
pub trait RemoteFileStore: Send {
  /// Upload the local file at `local` as `remote_name`.
  fn upload(&mut self, local: &Path, remote_name: &str) -> Result<(), RemoteError>;

  /// Rename the remote entry `old_name` to `new_name`.
  fn rename(&mut self, old_name: &str, new_name: &str) -> Result<(), RemoteError>;
}

/// Backend recording which version string a statistics id maps to.
pub trait StatisticsDatabase: Send {
  fn connect(&mut self, params: &ConnectionParams) -> Result<(), RemoteError>;

  fn execute(&mut self, statement: &VersionStatement) -> Result<(), RemoteError>;
}

/// The single statement a release issues: set the version string stored
/// for `version_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionStatement {
  pub version_id: i64,
  pub version: String,
}

/// Connection parameters for a statistics backend.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
  pub database: String,
  pub user: Option<String>,
  pub password: Option<String>,
}

impl ConnectionParams {
  pub fn from_settings(settings: &StatisticsSettings, password: Option<String>) -> Self {
    Self {
      database: settings.database.clone(),
      user: settings.user.clone(),
      password,
    }
  }
}

// Passwords never reach logs.
impl fmt::Debug for ConnectionParams {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ConnectionParams")
      .field("database", &self.database)
      .field("user", &self.user)
      .field("password", &self.password.as_ref().map(|_| "<redacted>"))
      .finish()
  }
}

/// A statistics database together with how to reach it.
pub struct StatisticsBackend {
  pub database: Box<dyn StatisticsDatabase>,
  pub params: ConnectionParams,
}

/// Everything the release phase talks to.
pub struct Collaborators {
  pub remote: Box<dyn RemoteFileStore>,
  pub statistics: Option<StatisticsBackend>,
}

impl Collaborators {
  pub fn new(remote: impl RemoteFileStore + 'static) -> Self {
    Self {
      remote: Box::new(remote),
      statistics: None,
    }
  }

  pub fn with_statistics(mut self, database: impl StatisticsDatabase + 'static, params: ConnectionParams) -> Self {
    self.statistics = Some(StatisticsBackend {
      database: Box::new(database),
      params,
    });
    self
  }
}
