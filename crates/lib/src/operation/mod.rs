//! Declarative system mutations bundled with an update package.
//!
//! An [`Operation`] describes one change (delete files, set registry values,
//! start a service, ...) that an executor on the end-user machine applies.
//! Operations are plain values: this crate only validates, orders and
//! persists them. The order of a record's operation list is the order in
//! which the executor applies them.
//!
//! # Document Format
//!
//! Operations are tagged by method:
//!
//! ```json
//! { "method": "SetRegistryValue", "key": "HKEY_CURRENT_USER\\Software\\App",
//!   "values": [{ "name": "Channel", "value": "stable", "kind": "String" }] }
//! ```

mod types;

use serde::{Deserialize, Serialize};

pub use types::{OperationArea, OperationMethod, RegistryValue, RegistryValueKind};

/// A single declarative operation.
///
/// Each variant carries exactly the payload its method needs, so a
/// descriptor whose payload does not fit its method cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum Operation {
  /// Delete `files` inside `directory`.
  DeleteFile { directory: String, files: Vec<String> },
  /// Rename the file at `path` to `new_name`.
  #[serde(rename_all = "camelCase")]
  RenameFile { path: String, new_name: String },
  /// Create `sub_keys` below `key`.
  #[serde(rename_all = "camelCase")]
  CreateRegistrySubKey { key: String, sub_keys: Vec<String> },
  /// Delete `sub_keys` below `key`.
  #[serde(rename_all = "camelCase")]
  DeleteRegistrySubKey { key: String, sub_keys: Vec<String> },
  /// Set `values` on `key`.
  SetRegistryValue { key: String, values: Vec<RegistryValue> },
  /// Delete the named values of `key`.
  DeleteRegistryValue { key: String, names: Vec<String> },
  /// Start the executable at `path`.
  StartProcess {
    path: String,
    #[serde(default)]
    arguments: Vec<String>,
  },
  /// Terminate every process called `name`.
  TerminateProcess { name: String },
  StartService { name: String },
  StopService { name: String },
}

impl Operation {
  pub fn delete_files<I, S>(directory: impl Into<String>, files: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::DeleteFile {
      directory: directory.into(),
      files: files.into_iter().map(Into::into).collect(),
    }
  }

  pub fn rename_file(path: impl Into<String>, new_name: impl Into<String>) -> Self {
    Self::RenameFile {
      path: path.into(),
      new_name: new_name.into(),
    }
  }

  pub fn create_registry_sub_keys<I, S>(key: impl Into<String>, sub_keys: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::CreateRegistrySubKey {
      key: key.into(),
      sub_keys: sub_keys.into_iter().map(Into::into).collect(),
    }
  }

  pub fn delete_registry_sub_keys<I, S>(key: impl Into<String>, sub_keys: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::DeleteRegistrySubKey {
      key: key.into(),
      sub_keys: sub_keys.into_iter().map(Into::into).collect(),
    }
  }

  pub fn set_registry_values(key: impl Into<String>, values: Vec<RegistryValue>) -> Self {
    Self::SetRegistryValue {
      key: key.into(),
      values,
    }
  }

  pub fn delete_registry_values<I, S>(key: impl Into<String>, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::DeleteRegistryValue {
      key: key.into(),
      names: names.into_iter().map(Into::into).collect(),
    }
  }

  pub fn start_process<I, S>(path: impl Into<String>, arguments: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::StartProcess {
      path: path.into(),
      arguments: arguments.into_iter().map(Into::into).collect(),
    }
  }

  pub fn terminate_process(name: impl Into<String>) -> Self {
    Self::TerminateProcess { name: name.into() }
  }

  pub fn start_service(name: impl Into<String>) -> Self {
    Self::StartService { name: name.into() }
  }

  pub fn stop_service(name: impl Into<String>) -> Self {
    Self::StopService { name: name.into() }
  }

  /// The method this operation dispatches on.
  pub fn method(&self) -> OperationMethod {
    match self {
      Self::DeleteFile { .. } => OperationMethod::DeleteFile,
      Self::RenameFile { .. } => OperationMethod::RenameFile,
      Self::CreateRegistrySubKey { .. } => OperationMethod::CreateRegistrySubKey,
      Self::DeleteRegistrySubKey { .. } => OperationMethod::DeleteRegistrySubKey,
      Self::SetRegistryValue { .. } => OperationMethod::SetRegistryValue,
      Self::DeleteRegistryValue { .. } => OperationMethod::DeleteRegistryValue,
      Self::StartProcess { .. } => OperationMethod::StartProcess,
      Self::TerminateProcess { .. } => OperationMethod::TerminateProcess,
      Self::StartService { .. } => OperationMethod::StartService,
      Self::StopService { .. } => OperationMethod::StopService,
    }
  }

  /// Stable dispatch token, e.g. `"SetRegistryValue"`.
  pub fn tag(&self) -> &'static str {
    self.method().as_str()
  }

  pub fn area(&self) -> OperationArea {
    self.method().area()
  }

  /// The primary target: a path, registry key or process/service name.
  pub fn target(&self) -> &str {
    match self {
      Self::DeleteFile { directory, .. } => directory,
      Self::RenameFile { path, .. } | Self::StartProcess { path, .. } => path,
      Self::CreateRegistrySubKey { key, .. }
      | Self::DeleteRegistrySubKey { key, .. }
      | Self::SetRegistryValue { key, .. }
      | Self::DeleteRegistryValue { key, .. } => key,
      Self::TerminateProcess { name } | Self::StartService { name } | Self::StopService { name } => name,
    }
  }

  /// Whether every field the method requires is filled in.
  ///
  /// Process arguments are optional; every other list payload needs at
  /// least one entry, and every string entry or registry value name must be
  /// non-blank.
  pub fn is_valid(&self) -> bool {
    if is_blank(self.target()) {
      return false;
    }

    match self {
      Self::DeleteFile { files: items, .. }
      | Self::CreateRegistrySubKey { sub_keys: items, .. }
      | Self::DeleteRegistrySubKey { sub_keys: items, .. }
      | Self::DeleteRegistryValue { names: items, .. } => has_entries(items),
      Self::RenameFile { new_name, .. } => !is_blank(new_name),
      Self::SetRegistryValue { values, .. } => !values.is_empty() && values.iter().all(|v| !is_blank(&v.name)),
      Self::StartProcess { .. } | Self::TerminateProcess { .. } | Self::StartService { .. } | Self::StopService { .. } => {
        true
      }
    }
  }
}

/// The first invalid operation of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidOperation {
  /// Position in the sequence.
  pub index: usize,
  pub method: OperationMethod,
}

/// Check a sequence of operations, reporting the first invalid one.
pub fn validate_operations(operations: &[Operation]) -> Result<(), InvalidOperation> {
  match operations.iter().position(|op| !op.is_valid()) {
    Some(index) => Err(InvalidOperation {
      index,
      method: operations[index].method(),
    }),
    None => Ok(()),
  }
}

fn is_blank(value: &str) -> bool {
  value.trim().is_empty()
}

fn has_entries(items: &[String]) -> bool {
  !items.is_empty() && items.iter().all(|item| !is_blank(item))
}
