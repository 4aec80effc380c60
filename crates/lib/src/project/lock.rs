//! Cross-process exclusion for a project definition.
//!
//! Publishing rewrites the project file, version directories and the remote
//! store. Two processes doing that for the same project at once would undo
//! each other, so a publishing process holds `<project file>.lock` for as long
//! as it runs. The lock is advisory and disappears with the process.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Who holds a project lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMetadata {
  pub pid: u32,
  pub started_at_unix: u64,
  pub command: String,
  pub project: PathBuf,
}

#[derive(Debug, Error)]
pub enum ProjectLockError {
  #[error(
    "project is locked by another process: {command} (PID {pid}, started at Unix time {started_at_unix})\n\
     If no patchline process is running, remove the lock file:\n  {lock_path}"
  )]
  Contention {
    command: String,
    pid: u32,
    started_at_unix: u64,
    lock_path: PathBuf,
  },

  #[error(
    "project is locked (holder unknown)\n\
     If no patchline process is running, remove the lock file:\n  {lock_path}"
  )]
  ContentionUnknown { lock_path: PathBuf },

  #[error("failed to open lock file {path}: {source}")]
  OpenFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write lock metadata: {0}")]
  WriteMetadata(#[source] io::Error),

  #[error("failed to lock project: {0}")]
  LockFailed(#[source] io::Error),
}

/// An exclusive lock on one project, released on drop.
#[derive(Debug)]
pub struct ProjectLock {
  file: File,
  lock_path: PathBuf,
}

impl ProjectLock {
  /// Lock the project defined in `project_file` without waiting.
  ///
  /// # Errors
  ///
  /// [`ProjectLockError::Contention`] if another holder exists, naming it when
  /// its metadata is readable.
  pub fn acquire(project_file: &Path, command: &str) -> Result<Self, ProjectLockError> {
    let lock_path = lock_path_for(project_file);

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(|source| ProjectLockError::OpenFile {
        path: lock_path.clone(),
        source,
      })?;

    if let Err(err) = try_lock_exclusive(&file) {
      if err.kind() == io::ErrorKind::WouldBlock {
        return Err(contention_error(&lock_path));
      }
      return Err(ProjectLockError::LockFailed(err));
    }

    let metadata = LockMetadata {
      pid: std::process::id(),
      started_at_unix: SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs(),
      command: command.to_string(),
      project: project_file.to_path_buf(),
    };
    write_metadata(&file, &metadata).map_err(ProjectLockError::WriteMetadata)?;

    debug!(path = %lock_path.display(), "acquired project lock");
    Ok(Self { file, lock_path })
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }

  /// Read the metadata through the held handle.
  pub fn read_metadata(&self) -> io::Result<LockMetadata> {
    let mut file = &self.file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }
}

/// `<project file>.lock`, next to the project file.
pub fn lock_path_for(project_file: &Path) -> PathBuf {
  let mut name = OsString::from(project_file.as_os_str());
  name.push(".lock");
  PathBuf::from(name)
}

fn write_metadata(file: &File, metadata: &LockMetadata) -> io::Result<()> {
  file.set_len(0)?;
  let mut writer = io::BufWriter::new(file);
  writer.seek(SeekFrom::Start(0))?;
  serde_json::to_writer_pretty(&mut writer, metadata).map_err(io::Error::other)?;
  writer.flush()
}

fn contention_error(lock_path: &Path) -> ProjectLockError {
  if let Ok(mut file) = File::open(lock_path) {
    let mut contents = String::new();
    if file.read_to_string(&mut contents).is_ok()
      && let Ok(metadata) = serde_json::from_str::<LockMetadata>(&contents)
    {
      return ProjectLockError::Contention {
        command: metadata.command,
        pid: metadata.pid,
        started_at_unix: metadata.started_at_unix,
        lock_path: lock_path.to_path_buf(),
      };
    }
  }

  ProjectLockError::ContentionUnknown {
    lock_path: lock_path.to_path_buf(),
  }
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive)
    .map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn try_lock_exclusive(file: &File) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;

  // SAFETY: a zeroed OVERLAPPED is valid for LockFileEx on a synchronous
  // handle, and `handle` stays open for the duration of the call.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(
      handle,
      LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK,
      0,
      1,
      0,
      &mut overlapped,
    )
  };

  if result == 0 {
    let err = io::Error::last_os_error();
    // ERROR_LOCK_VIOLATION
    if err.raw_os_error() == Some(33) {
      return Err(io::Error::new(io::ErrorKind::WouldBlock, err));
    }
    Err(err)
  } else {
    Ok(())
  }
}
