use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Bitness of the machine an update is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostArch {
  X86,
  X64,
}

impl HostArch {
  /// Detect the architecture of the running process.
  pub fn current() -> Self {
    if cfg!(target_pointer_width = "64") {
      Self::X64
    } else {
      Self::X86
    }
  }

  /// Returns the lowercase string identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86 => "x86",
      Self::X64 => "x64",
    }
  }
}

impl fmt::Display for HostArch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for HostArch {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "x86" | "i686" | "i386" => Ok(Self::X86),
      "x64" | "x86_64" | "amd64" | "aarch64" | "arm64" => Ok(Self::X64),
      other => Err(format!("unknown architecture '{}' (expected x86 or x64)", other)),
    }
  }
}
