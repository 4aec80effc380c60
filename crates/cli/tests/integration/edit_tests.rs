//! Integration tests for `patchline edit`.

use patchline_lib::project::ProjectLock;
use predicates::prelude::*;
use serde_json::json;

use super::common::{TestEnv, patchline_cmd, read_json};

#[test]
fn edit_unreleased_relocates_and_updates_project() {
  let env = TestEnv::empty().with_project(&["1.0.0.0", "2.0.0.0"], false);
  let changes = env.write_changes("1.1.0.0", json!({}));

  patchline_cmd()
    .env("PATCHLINE_ROOT", env.root_path())
    .arg("edit")
    .arg("--project")
    .arg(env.project_file())
    .args(["--version", "1.0.0.0", "--changes"])
    .arg(&changes)
    .assert()
    .success()
    .stdout(predicate::str::contains("Published 1.0.0.0"))
    .stdout(predicate::str::contains("1.1.0.0"));

  assert!(!env.root_path().join("Demo/1.0.0.0").exists());
  let document = read_json(&env.root_path().join("Demo/1.1.0.0/updates.json"));
  assert_eq!(document[0]["literalVersion"], "1.1.0.0");
  assert_eq!(document[0]["changelog"]["en"], "Edited 1.1.0.0");
  assert_eq!(document[1]["literalVersion"], "2.0.0.0");

  let project = read_json(&env.project_file());
  assert_eq!(project["packages"][0]["version"], "1.1.0.0");
  assert_eq!(project["packages"][0]["description"], "edited");

  // Unreleased edits never touch the remote store.
  assert!(env.remote_path().join("1.0.0.0").exists());
}

#[test]
fn edit_released_mirrors_to_remote_directory() {
  let env = TestEnv::empty().with_project(&["1.0.0.0"], true);
  let changes = env.write_changes("1.0.1.0", json!({ "mustUpdate": true }));

  patchline_cmd()
    .env("PATCHLINE_ROOT", env.root_path())
    .arg("edit")
    .arg("--project")
    .arg(env.project_file())
    .args(["--version", "1.0.0.0", "--changes"])
    .arg(&changes)
    .assert()
    .success()
    .stdout(predicate::str::contains("Released"));

  assert!(!env.remote_path().join("1.0.0.0").exists());
  let uploaded = read_json(&env.remote_path().join("1.0.1.0/updates.json"));
  assert_eq!(uploaded[0]["literalVersion"], "1.0.1.0");
  assert_eq!(uploaded[0]["mustUpdate"], true);
}

#[test]
fn edit_keeping_version_stays_in_place() {
  let env = TestEnv::empty().with_project(&["1.0.0.0"], false);
  let changes = env.write_changes("1.0.0.0", json!({ "changelog": { "en": "Reworded", "de": "Umformuliert" } }));

  patchline_cmd()
    .env("PATCHLINE_ROOT", env.root_path())
    .arg("edit")
    .arg("--project")
    .arg(env.project_file())
    .args(["--version", "1.0.0.0", "--changes"])
    .arg(&changes)
    .assert()
    .success()
    .stdout(predicate::str::contains("Published 1.0.0.0"));

  let document = read_json(&env.root_path().join("Demo/1.0.0.0/updates.json"));
  assert_eq!(document[0]["changelog"]["de"], "Umformuliert");
}

#[test]
fn edit_rejects_zero_version() {
  let env = TestEnv::empty().with_project(&["1.0.0.0"], false);
  let changes = env.write_changes("0.0.0.0", json!({}));
  let before = std::fs::read_to_string(env.root_path().join("Demo/1.0.0.0/updates.json")).unwrap();

  patchline_cmd()
    .env("PATCHLINE_ROOT", env.root_path())
    .arg("edit")
    .arg("--project")
    .arg(env.project_file())
    .args(["--version", "1.0.0.0", "--changes"])
    .arg(&changes)
    .assert()
    .failure()
    .stderr(predicate::str::contains("Edit rejected"));

  let after = std::fs::read_to_string(env.root_path().join("Demo/1.0.0.0/updates.json")).unwrap();
  assert_eq!(before, after);
}

#[test]
fn edit_rejects_missing_default_changelog() {
  let env = TestEnv::empty().with_project(&["1.0.0.0"], false);
  let changes = env.write_changes("1.0.0.1", json!({ "changelog": { "de": "Nur Deutsch" } }));

  patchline_cmd()
    .env("PATCHLINE_ROOT", env.root_path())
    .arg("edit")
    .arg("--project")
    .arg(env.project_file())
    .args(["--version", "1.0.0.0", "--changes"])
    .arg(&changes)
    .assert()
    .failure()
    .stderr(predicate::str::contains("changelog"));

  assert!(env.root_path().join("Demo/1.0.0.0").exists());
  assert!(!env.root_path().join("Demo/1.0.0.1").exists());
}

#[test]
fn edit_rejects_duplicate_version() {
  let env = TestEnv::empty().with_project(&["1.0.0.0", "2.0.0.0"], false);
  let changes = env.write_changes("2.0.0.0", json!({}));

  patchline_cmd()
    .env("PATCHLINE_ROOT", env.root_path())
    .arg("edit")
    .arg("--project")
    .arg(env.project_file())
    .args(["--version", "1.0.0.0", "--changes"])
    .arg(&changes)
    .assert()
    .failure();

  assert!(env.root_path().join("Demo/1.0.0.0").exists());
}

#[test]
fn edit_released_without_remote_fails() {
  let env = TestEnv::empty().with_project(&["1.0.0.0"], true);
  let mut project = read_json(&env.project_file());
  if let Some(obj) = project.as_object_mut() {
    obj.remove("remoteDirectory");
  }
  env.write_file("project.json", &project.to_string());
  let changes = env.write_changes("1.0.0.0", json!({}));

  patchline_cmd()
    .env("PATCHLINE_ROOT", env.root_path())
    .arg("edit")
    .arg("--project")
    .arg(env.project_file())
    .args(["--version", "1.0.0.0", "--changes"])
    .arg(&changes)
    .assert()
    .failure()
    .stderr(predicate::str::contains("no remote directory"));
}

#[test]
fn edit_refused_while_another_process_holds_the_project() {
  let env = TestEnv::empty().with_project(&["1.0.0.0"], false);
  let changes = env.write_changes("1.1.0.0", json!({}));
  let held = ProjectLock::acquire(&env.project_file(), "patchline edit").unwrap();

  patchline_cmd()
    .env("PATCHLINE_ROOT", env.root_path())
    .arg("edit")
    .arg("--project")
    .arg(env.project_file())
    .args(["--version", "1.0.0.0", "--changes"])
    .arg(&changes)
    .assert()
    .failure()
    .stderr(predicate::str::contains("Project is busy"))
    .stderr(predicate::str::contains(std::process::id().to_string()));

  assert!(env.root_path().join("Demo/1.0.0.0").exists());
  assert!(!env.root_path().join("Demo/1.1.0.0").exists());

  // Once released, the same edit goes through.
  drop(held);
  patchline_cmd()
    .env("PATCHLINE_ROOT", env.root_path())
    .arg("edit")
    .arg("--project")
    .arg(env.project_file())
    .args(["--version", "1.0.0.0", "--changes"])
    .arg(&changes)
    .assert()
    .success();
  assert!(env.root_path().join("Demo/1.1.0.0").exists());
}
