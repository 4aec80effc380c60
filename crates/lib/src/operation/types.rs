use std::fmt;

use serde::{Deserialize, Serialize};

/// The system area an operation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationArea {
  Files,
  Registry,
  Processes,
  Services,
}

impl OperationArea {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Files => "Files",
      Self::Registry => "Registry",
      Self::Processes => "Processes",
      Self::Services => "Services",
    }
  }
}

impl fmt::Display for OperationArea {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Dispatch tag of an operation.
///
/// The string form is stable: external executors dispatch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationMethod {
  DeleteFile,
  RenameFile,
  CreateRegistrySubKey,
  DeleteRegistrySubKey,
  SetRegistryValue,
  DeleteRegistryValue,
  StartProcess,
  TerminateProcess,
  StartService,
  StopService,
}

impl OperationMethod {
  pub const ALL: [OperationMethod; 10] = [
    Self::DeleteFile,
    Self::RenameFile,
    Self::CreateRegistrySubKey,
    Self::DeleteRegistrySubKey,
    Self::SetRegistryValue,
    Self::DeleteRegistryValue,
    Self::StartProcess,
    Self::TerminateProcess,
    Self::StartService,
    Self::StopService,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::DeleteFile => "DeleteFile",
      Self::RenameFile => "RenameFile",
      Self::CreateRegistrySubKey => "CreateRegistrySubKey",
      Self::DeleteRegistrySubKey => "DeleteRegistrySubKey",
      Self::SetRegistryValue => "SetRegistryValue",
      Self::DeleteRegistryValue => "DeleteRegistryValue",
      Self::StartProcess => "StartProcess",
      Self::TerminateProcess => "TerminateProcess",
      Self::StartService => "StartService",
      Self::StopService => "StopService",
    }
  }

  pub fn area(&self) -> OperationArea {
    match self {
      Self::DeleteFile | Self::RenameFile => OperationArea::Files,
      Self::CreateRegistrySubKey | Self::DeleteRegistrySubKey | Self::SetRegistryValue | Self::DeleteRegistryValue => {
        OperationArea::Registry
      }
      Self::StartProcess | Self::TerminateProcess => OperationArea::Processes,
      Self::StartService | Self::StopService => OperationArea::Services,
    }
  }
}

impl fmt::Display for OperationMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Registry value data types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistryValueKind {
  #[default]
  String,
  ExpandString,
  Binary,
  DWord,
  MultiString,
  QWord,
  Unknown,
  None,
}

/// One `(name, value, kind)` entry of a set-registry-value operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistryValue {
  pub name: String,
  pub value: String,
  pub kind: RegistryValueKind,
}

impl RegistryValue {
  pub fn new(name: impl Into<String>, value: impl Into<String>, kind: RegistryValueKind) -> Self {
    Self {
      name: name.into(),
      value: value.into(),
      kind,
    }
  }
}
