use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::consts::DEFAULT_LOCALE;
use crate::operation::Operation;
use crate::platform::HostArch;
use crate::version::{UpdateVersion, VersionError};

/// Target architecture of a published package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
  X86,
  X64,
  /// Installable on every host.
  #[default]
  Any,
}

impl Architecture {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86 => "x86",
      Self::X64 => "x64",
      Self::Any => "any",
    }
  }

  /// Whether a package built for this architecture may be offered to `host`.
  pub fn is_compatible_with(&self, host: HostArch) -> bool {
    match self {
      Self::Any => true,
      Self::X86 => host == HostArch::X86,
      Self::X64 => host == HostArch::X64,
    }
  }
}

impl fmt::Display for Architecture {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Architecture {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "x86" => Ok(Self::X86),
      "x64" => Ok(Self::X64),
      "any" | "anycpu" => Ok(Self::Any),
      other => Err(format!("unknown architecture '{}' (expected x86, x64 or any)", other)),
    }
  }
}

/// One published version in a configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationRecord {
  /// Version literal, unique within a document.
  pub literal_version: String,

  /// Whether clients report downloads of this version.
  #[serde(default)]
  pub use_statistics: bool,

  /// Endpoint clients report statistics to.
  #[serde(rename = "updatePhpFileUri", default, skip_serializing_if = "Option::is_none")]
  pub statistics_uri: Option<String>,

  /// Row id of this version in the statistics database.
  #[serde(default)]
  pub version_id: i64,

  /// Where the package archive is downloaded from.
  #[serde(rename = "updatePackageUri", default, skip_serializing_if = "Option::is_none")]
  pub package_uri: Option<String>,

  /// Changelog text keyed by locale identifier.
  #[serde(default)]
  pub changelog: BTreeMap<String, String>,

  /// Base64 package signature.
  #[serde(default)]
  pub signature: String,

  /// Installed versions that must not be offered this update.
  #[serde(default)]
  pub unsupported_versions: Vec<String>,

  #[serde(default)]
  pub architecture: Architecture,

  /// Applied by the executor in sequence order.
  #[serde(default)]
  pub operations: Vec<Operation>,

  #[serde(default)]
  pub must_update: bool,
}

impl ConfigurationRecord {
  /// A record for `version` with an empty changelog and no operations.
  pub fn new(version: &UpdateVersion) -> Self {
    Self {
      literal_version: version.render(),
      use_statistics: false,
      statistics_uri: None,
      version_id: 0,
      package_uri: None,
      changelog: BTreeMap::new(),
      signature: String::new(),
      unsupported_versions: Vec::new(),
      architecture: Architecture::Any,
      operations: Vec::new(),
      must_update: false,
    }
  }

  /// Parse this record's version literal.
  pub fn version(&self) -> Result<UpdateVersion, VersionError> {
    UpdateVersion::parse(&self.literal_version)
  }

  /// Changelog for `locale`, falling back to the default locale.
  pub fn changelog_for(&self, locale: &str) -> Option<&str> {
    self
      .changelog
      .get(locale)
      .or_else(|| self.changelog.get(DEFAULT_LOCALE))
      .map(String::as_str)
  }

  pub fn has_default_changelog(&self) -> bool {
    self.changelog.get(DEFAULT_LOCALE).is_some_and(|text| !text.trim().is_empty())
  }

  /// Whether `installed` is listed as unsupported.
  ///
  /// Matching uses the basic version only; stage and stage build are ignored.
  /// Unparseable entries never match.
  pub fn is_unsupported_for(&self, installed: &UpdateVersion) -> bool {
    self.unsupported_versions.iter().any(|literal| match UpdateVersion::parse(literal) {
      Ok(unsupported) => unsupported.basic_version() == installed.basic_version(),
      Err(err) => {
        warn!(record = %self.literal_version, entry = %literal, error = %err, "ignoring unparseable unsupported version");
        false
      }
    })
  }

  /// Decode the package signature.
  pub fn signature_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(self.signature.trim())
  }
}

/// Errors that can occur when reading or writing configuration documents.
#[derive(Debug, Error)]
pub enum StoreError {
  /// Failed to read the document from disk.
  #[error("failed to read configuration document {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The document is not a valid list of records.
  #[error("failed to parse configuration document: {0}")]
  Parse(#[source] serde_json::Error),

  /// Fetching the remote document failed.
  #[error("failed to fetch configuration document from {url}: {source}")]
  Fetch {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// Failed to write the document to disk.
  #[error("failed to write configuration document {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to serialize the records.
  #[error("failed to serialize configuration document: {0}")]
  Serialize(#[source] serde_json::Error),
}
