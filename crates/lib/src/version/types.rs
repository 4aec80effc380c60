use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stability classification of a version.
///
/// The declaration order is the ranking order: `Alpha < Beta < Release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DevelopmentalStage {
  Alpha,
  Beta,
  Release,
}

impl DevelopmentalStage {
  /// Short token used in canonical literals (`a`, `b`, empty for releases).
  pub fn token(&self) -> &'static str {
    match self {
      Self::Alpha => "a",
      Self::Beta => "b",
      Self::Release => "",
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Alpha => "Alpha",
      Self::Beta => "Beta",
      Self::Release => "Release",
    }
  }

  /// Match a stage token case-insensitively.
  pub(crate) fn from_token(token: &str) -> Option<Self> {
    match token.to_ascii_lowercase().as_str() {
      "a" | "alpha" => Some(Self::Alpha),
      "b" | "beta" => Some(Self::Beta),
      "r" | "release" => Some(Self::Release),
      _ => None,
    }
  }
}

impl fmt::Display for DevelopmentalStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// The `(major, minor, build, revision)` tuple of a version, ignoring stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BasicVersion {
  pub major: u32,
  pub minor: u32,
  pub build: u32,
  pub revision: u32,
}

impl BasicVersion {
  pub fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
    Self {
      major,
      minor,
      build,
      revision,
    }
  }

  /// `0.0.0.0` is never a valid published version.
  pub fn is_zero(&self) -> bool {
    *self == Self::default()
  }
}

impl fmt::Display for BasicVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}.{}", self.major, self.minor, self.build, self.revision)
  }
}

/// Errors produced by version parsing and selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
  /// The literal does not decompose into a valid version.
  #[error("invalid version literal '{literal}': {reason}")]
  Format { literal: String, reason: String },

  /// `highest` was called without any versions.
  #[error("cannot select the highest version of an empty set")]
  EmptyInput,
}

impl VersionError {
  pub(crate) fn format(literal: &str, reason: impl Into<String>) -> Self {
    Self::Format {
      literal: literal.to_string(),
      reason: reason.into(),
    }
  }
}
