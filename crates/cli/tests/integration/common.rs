//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::json;
use tempfile::TempDir;

/// Get a Command for the patchline binary with logging quiet.
pub fn patchline_cmd() -> Command {
  let mut cmd = cargo_bin_cmd!("patchline");
  cmd.env("RUST_LOG", "warn");
  cmd
}

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the projects root, a
/// remote directory, and the project definition.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  pub fn root_path(&self) -> PathBuf {
    self.path("projects")
  }

  pub fn remote_path(&self) -> PathBuf {
    self.path("remote")
  }

  pub fn project_file(&self) -> PathBuf {
    self.path("project.json")
  }

  /// A project named `Demo` with one package per version. The projects root
  /// is left unset so `PATCHLINE_ROOT` decides where versions live.
  pub fn with_project(self, versions: &[&str], released: bool) -> Self {
    let records: Vec<_> = versions
      .iter()
      .enumerate()
      .map(|(i, v)| {
        json!({
          "literalVersion": v,
          "versionId": i + 1,
          "changelog": { "en": format!("Changes in {}", v) },
          "architecture": "any",
        })
      })
      .collect();
    let document = serde_json::to_string_pretty(&records).unwrap();

    let packages: Vec<_> = versions
      .iter()
      .map(|v| {
        json!({
          "version": v,
          "description": format!("Package {}", v),
          "localPackagePath": self.root_path().join("Demo").join(v).join("demo.zip"),
          "isReleased": released,
        })
      })
      .collect();

    for v in versions {
      self.write_file(&format!("projects/Demo/{}/updates.json", v), &document);
      std::fs::create_dir_all(self.remote_path().join(v)).unwrap();
    }

    let project = json!({
      "name": "Demo",
      "guid": "demo",
      "updateUrl": "https://updates.example.com/demo",
      "remoteDirectory": self.remote_path(),
      "packages": packages,
    });
    self.write_file("project.json", &serde_json::to_string_pretty(&project).unwrap());
    self
  }

  pub fn write_changes(&self, version: &str, extra: serde_json::Value) -> PathBuf {
    let mut changes = json!({
      "version": version,
      "changelog": { "en": format!("Edited {}", version) },
      "description": "edited",
    });
    if let (Some(base), Some(extra)) = (changes.as_object_mut(), extra.as_object()) {
      for (k, v) in extra {
        base.insert(k.clone(), v.clone());
      }
    }
    self.write_file("changes.json", &serde_json::to_string_pretty(&changes).unwrap())
  }
}

pub fn read_json(path: &Path) -> serde_json::Value {
  serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}
