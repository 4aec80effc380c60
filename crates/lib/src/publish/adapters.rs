//! Concrete collaborators: a directory-backed remote store and a SQLite
//! statistics database.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use rusqlite::{Connection, params};
use tracing::debug;

use super::remote::{ConnectionParams, RemoteError, RemoteFileStore, StatisticsDatabase, VersionStatement};

/// Remote file store mirrored into a local directory, such as a mounted web
/// root.
#[derive(Debug, Clone)]
pub struct DirectoryFileStore {
  base: PathBuf,
}

impl DirectoryFileStore {
  pub fn new(base: impl Into<PathBuf>) -> Self {
    Self { base: base.into() }
  }

  pub fn base(&self) -> &Path {
    &self.base
  }

  /// Resolve a `/`-separated remote name below the base directory.
  fn resolve(&self, name: &str) -> io::Result<PathBuf> {
    let relative = Path::new(name);
    let escapes = relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if name.is_empty() || escapes {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("remote name '{}' must stay inside the store", name),
      ));
    }
    Ok(self.base.join(relative))
  }
}

impl RemoteFileStore for DirectoryFileStore {
  fn upload(&mut self, local: &Path, remote_name: &str) -> Result<(), RemoteError> {
    let upload_err = |source: io::Error| RemoteError::Upload {
      name: remote_name.to_string(),
      source: Box::new(source),
    };

    let target = self.resolve(remote_name).map_err(upload_err)?;
    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent).map_err(upload_err)?;
    }
    fs::copy(local, &target).map_err(upload_err)?;

    debug!(from = %local.display(), to = %target.display(), "uploaded file");
    Ok(())
  }

  fn rename(&mut self, old_name: &str, new_name: &str) -> Result<(), RemoteError> {
    let rename_err = |source: io::Error| RemoteError::Rename {
      from: old_name.to_string(),
      to: new_name.to_string(),
      source: Box::new(source),
    };

    let from = self.resolve(old_name).map_err(rename_err)?;
    let to = self.resolve(new_name).map_err(rename_err)?;
    if to.exists() {
      return Err(rename_err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "remote target already exists",
      )));
    }
    fs::rename(&from, &to).map_err(rename_err)?;

    debug!(from = %from.display(), to = %to.display(), "renamed remote entry");
    Ok(())
  }
}

/// Statistics kept in a SQLite database with a `Version (ID, Version)` table.
#[derive(Debug, Default)]
pub struct SqliteStatistics {
  connection: Option<Connection>,
}

impl SqliteStatistics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create the `Version` table if it does not exist.
  pub fn initialize(path: &Path) -> Result<(), RemoteError> {
    let conn = Connection::open(path).map_err(|e| RemoteError::Connect(Box::new(e)))?;
    conn
      .execute(
        "CREATE TABLE IF NOT EXISTS Version (ID INTEGER PRIMARY KEY, Version TEXT NOT NULL)",
        [],
      )
      .map_err(|e| RemoteError::Execute(Box::new(e)))?;
    Ok(())
  }
}

impl StatisticsDatabase for SqliteStatistics {
  fn connect(&mut self, params: &ConnectionParams) -> Result<(), RemoteError> {
    if !Path::new(&params.database).exists() {
      return Err(RemoteError::Connect(
        format!("database {} does not exist", params.database).into(),
      ));
    }
    let conn = Connection::open(&params.database).map_err(|e| RemoteError::Connect(Box::new(e)))?;
    debug!(?params, "connected to statistics database");
    self.connection = Some(conn);
    Ok(())
  }

  fn execute(&mut self, statement: &VersionStatement) -> Result<(), RemoteError> {
    let conn = self.connection.as_ref().ok_or(RemoteError::NotConnected)?;
    let updated = conn
      .execute(
        "UPDATE Version SET Version = ?1 WHERE ID = ?2",
        params![statement.version, statement.version_id],
      )
      .map_err(|e| RemoteError::Execute(Box::new(e)))?;

    if updated == 0 {
      return Err(RemoteError::Execute(
        format!("no statistics row with id {}", statement.version_id).into(),
      ));
    }
    Ok(())
  }
}
