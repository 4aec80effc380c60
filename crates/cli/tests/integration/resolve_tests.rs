//! Integration tests for `patchline resolve`, `check` and `show`.

use predicates::prelude::*;
use serde_json::json;

use super::common::{TestEnv, patchline_cmd};

fn catalog_env() -> TestEnv {
  let env = TestEnv::empty();
  let catalog = json!([
    { "literalVersion": "1.1.0.0", "changelog": { "en": "Fixes", "de": "Korrekturen" }, "architecture": "any" },
    { "literalVersion": "1.2.0.0b1", "changelog": { "en": "Preview" }, "architecture": "any" },
    { "literalVersion": "1.3.0.0", "changelog": { "en": "64-bit only" }, "architecture": "x64" },
    { "literalVersion": "2.0.0.0", "changelog": { "en": "Major" }, "unsupportedVersions": ["1.0.0.0"] }
  ]);
  env.write_file("updates.json", &catalog.to_string());
  env
}

#[test]
fn resolve_finds_highest_eligible() {
  let env = catalog_env();

  patchline_cmd()
    .arg("resolve")
    .arg(env.path("updates.json"))
    .args(["--installed", "1.0.0.0", "--arch", "x86"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Update available"))
    .stdout(predicate::str::contains("1.1.0.0"))
    .stdout(predicate::str::contains("1.3.0.0").not());
}

#[test]
fn resolve_json_reports_best_and_changelogs() {
  let env = catalog_env();

  let output = patchline_cmd()
    .arg("resolve")
    .arg(env.path("updates.json"))
    .args(["--installed", "1.0.0.0", "--arch", "x64", "--beta", "--locale", "de", "--json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["found"], true);
  assert_eq!(value["best"]["literalVersion"], "1.3.0.0");
  assert_eq!(value["eligible"].as_array().map(Vec::len), Some(3));
  // Newest first, falling back to English where no German text exists.
  assert_eq!(value["changelogs"][0]["changelog"], "64-bit only");
  assert_eq!(value["changelogs"][2]["changelog"], "Korrekturen");
}

#[test]
fn resolve_reports_up_to_date() {
  let env = catalog_env();

  patchline_cmd()
    .arg("resolve")
    .arg(env.path("updates.json"))
    .args(["--installed", "2.0.0.0", "--arch", "x64"])
    .assert()
    .success()
    .stdout(predicate::str::contains("No update available"));
}

#[test]
fn check_flags_duplicates_and_missing_changelog() {
  let env = TestEnv::empty();
  let catalog = json!([
    { "literalVersion": "1.1.0.0", "changelog": { "en": "Fixes" } },
    { "literalVersion": "1.1.0.0", "changelog": { "de": "Nur Deutsch" } }
  ]);
  env.write_file("updates.json", &catalog.to_string());

  patchline_cmd()
    .arg("check")
    .arg(env.path("updates.json"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("problem(s) found"));
}

#[test]
fn show_json_lists_every_record() {
  let env = catalog_env();

  let output = patchline_cmd()
    .arg("show")
    .arg(env.path("updates.json"))
    .arg("--json")
    .output()
    .unwrap();
  assert!(output.status.success());

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value.as_array().map(Vec::len), Some(4));
}

#[test]
fn show_empty_catalog() {
  let env = TestEnv::empty();
  env.write_file("updates.json", "");

  patchline_cmd()
    .arg("show")
    .arg(env.path("updates.json"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Catalog is empty"));
}
