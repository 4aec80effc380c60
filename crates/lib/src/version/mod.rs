//! Update version algebra.
//!
//! An update version is a four-part numeric tuple plus a developmental stage
//! and, for pre-release stages, a stage-local build counter:
//!
//! ```text
//! 1.2.0.0      Release
//! 1.2.0.0a3    Alpha, build 3
//! 1.2.0.0b1    Beta, build 1
//! ```
//!
//! Versions are ordered by the basic tuple first, then by stage
//! (`Alpha < Beta < Release`), then by the stage build. Release versions carry
//! no build counter, so two releases with the same tuple are equal.

mod types;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use types::{BasicVersion, DevelopmentalStage, VersionError};

/// Characters allowed between the basic version, the stage token and the stage build.
const SEPARATORS: &[char] = &['-', '.', '_', ' '];

/// A parsed update version.
///
/// Immutable once constructed and compared only by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UpdateVersion {
  basic: BasicVersion,
  stage: DevelopmentalStage,
  /// Always 0 for releases.
  stage_build: u32,
}

impl UpdateVersion {
  /// Build a version from discrete components.
  ///
  /// The stage build is dropped for [`DevelopmentalStage::Release`].
  pub fn new(basic: BasicVersion, stage: DevelopmentalStage, stage_build: u32) -> Self {
    let stage_build = match stage {
      DevelopmentalStage::Release => 0,
      _ => stage_build,
    };
    Self {
      basic,
      stage,
      stage_build,
    }
  }

  /// Shorthand for a release version.
  pub fn release(major: u32, minor: u32, build: u32, revision: u32) -> Self {
    Self::new(
      BasicVersion::new(major, minor, build, revision),
      DevelopmentalStage::Release,
      0,
    )
  }

  /// Parse a version literal.
  ///
  /// Accepts `1.2.0.0`, `1.2.0.0a2`, `1.2.0.0-beta.2`, `1.2.0.0 Beta 2` and
  /// similar spellings. A stage token without a number means build 1.
  ///
  /// # Errors
  ///
  /// Returns [`VersionError::Format`] if the literal is not four non-negative
  /// integers optionally followed by a stage token and stage build.
  pub fn parse(literal: &str) -> Result<Self, VersionError> {
    let trimmed = literal.trim();
    if trimmed.is_empty() {
      return Err(VersionError::format(literal, "empty literal"));
    }

    let (basic_part, stage_part) = match trimmed.find(|c: char| c.is_ascii_alphabetic()) {
      Some(pos) => (trimmed[..pos].trim_end_matches(SEPARATORS), &trimmed[pos..]),
      None => (trimmed, ""),
    };

    let basic = parse_basic(literal, basic_part)?;

    if stage_part.is_empty() {
      return Ok(Self::new(basic, DevelopmentalStage::Release, 0));
    }

    let token_end = stage_part
      .find(|c: char| !c.is_ascii_alphabetic())
      .unwrap_or(stage_part.len());
    let (token, build_part) = stage_part.split_at(token_end);

    let stage = DevelopmentalStage::from_token(token)
      .ok_or_else(|| VersionError::format(literal, format!("unknown stage '{}'", token)))?;

    let build_part = build_part.trim_start_matches(SEPARATORS);
    let stage_build = if build_part.is_empty() {
      1
    } else {
      parse_component(literal, build_part, "stage build")?
    };

    Ok(Self::new(basic, stage, stage_build))
  }

  /// The basic `(major, minor, build, revision)` tuple.
  pub fn basic_version(&self) -> BasicVersion {
    self.basic
  }

  pub fn stage(&self) -> DevelopmentalStage {
    self.stage
  }

  /// Stage build counter, `None` for releases.
  pub fn stage_build(&self) -> Option<u32> {
    match self.stage {
      DevelopmentalStage::Release => None,
      _ => Some(self.stage_build),
    }
  }

  pub fn is_release(&self) -> bool {
    self.stage == DevelopmentalStage::Release
  }

  /// True for the all-zero basic version, regardless of stage.
  pub fn is_zero(&self) -> bool {
    self.basic.is_zero()
  }

  /// Canonical literal; `UpdateVersion::parse(&v.render()) == Ok(v)`.
  pub fn render(&self) -> String {
    self.to_string()
  }

  /// Human-readable form such as `1.2.0.0 Beta 2`.
  pub fn full_text(&self) -> String {
    match self.stage_build() {
      Some(build) => format!("{} {} {}", self.basic, self.stage, build),
      None => self.basic.to_string(),
    }
  }
}

impl Ord for UpdateVersion {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .basic
      .cmp(&other.basic)
      .then_with(|| self.stage.cmp(&other.stage))
      .then_with(|| self.stage_build.cmp(&other.stage_build))
  }
}

impl PartialOrd for UpdateVersion {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl fmt::Display for UpdateVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.basic)?;
    if let Some(build) = self.stage_build() {
      write!(f, "{}{}", self.stage.token(), build)?;
    }
    Ok(())
  }
}

impl FromStr for UpdateVersion {
  type Err = VersionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl TryFrom<String> for UpdateVersion {
  type Error = VersionError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::parse(&value)
  }
}

impl From<UpdateVersion> for String {
  fn from(version: UpdateVersion) -> Self {
    version.to_string()
  }
}

/// Compare two versions; this is the only ordering used to rank versions.
pub fn compare(a: &UpdateVersion, b: &UpdateVersion) -> Ordering {
  a.cmp(b)
}

/// Return the highest version of the set.
///
/// # Errors
///
/// Returns [`VersionError::EmptyInput`] if `versions` yields nothing.
pub fn highest<'a, I>(versions: I) -> Result<UpdateVersion, VersionError>
where
  I: IntoIterator<Item = &'a UpdateVersion>,
{
  versions.into_iter().max().copied().ok_or(VersionError::EmptyInput)
}

fn parse_basic(literal: &str, basic_part: &str) -> Result<BasicVersion, VersionError> {
  let parts: Vec<&str> = basic_part.split('.').collect();
  if parts.len() != 4 {
    return Err(VersionError::format(
      literal,
      format!("expected 4 numeric components, found {}", parts.len()),
    ));
  }

  Ok(BasicVersion::new(
    parse_component(literal, parts[0], "major")?,
    parse_component(literal, parts[1], "minor")?,
    parse_component(literal, parts[2], "build")?,
    parse_component(literal, parts[3], "revision")?,
  ))
}

fn parse_component(literal: &str, part: &str, name: &str) -> Result<u32, VersionError> {
  if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
    return Err(VersionError::format(literal, format!("{} component '{}' is not a number", name, part)));
  }
  part
    .parse::<u32>()
    .map_err(|e| VersionError::format(literal, format!("{} component '{}': {}", name, part, e)))
}
