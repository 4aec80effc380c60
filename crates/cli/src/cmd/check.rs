//! Implementation of the `patchline check` command.
//!
//! Reports integrity problems that would make resolution or publishing
//! misbehave. Exits non-zero when any problem is found.

use anyhow::{Result, bail};
use patchline_lib::config::find_duplicate_versions;
use patchline_lib::consts::DEFAULT_LOCALE;
use patchline_lib::operation::validate_operations;
use serde::Serialize;

use super::{RemoteArgs, load_catalog};
use crate::output::{OutputFormat, print_json, print_success, print_warning};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Problem {
  /// Literal of the offending record.
  record: String,
  message: String,
}

pub fn cmd_check(catalog: &str, remote: &RemoteArgs, format: OutputFormat) -> Result<()> {
  let records = load_catalog(catalog, remote)?;
  let mut problems = Vec::new();

  for record in &records {
    let problem = |message: String| Problem {
      record: record.literal_version.clone(),
      message,
    };

    match record.version() {
      Ok(version) if version.is_zero() => problems.push(problem("version 0.0.0.0 cannot be published".into())),
      Ok(_) => {}
      Err(err) => problems.push(problem(err.to_string())),
    }
    if !record.has_default_changelog() {
      problems.push(problem(format!("missing '{}' changelog", DEFAULT_LOCALE)));
    }
    if let Err(invalid) = validate_operations(&record.operations) {
      problems.push(problem(format!(
        "operation {} ({}) is incomplete",
        invalid.index, invalid.method
      )));
    }
    if !record.signature.is_empty() && record.signature_bytes().is_err() {
      problems.push(problem("signature is not valid base64".into()));
    }
  }

  for duplicate in find_duplicate_versions(&records) {
    problems.push(Problem {
      record: duplicate.version.render(),
      message: format!("published by {} records", duplicate.positions.len()),
    });
  }

  if format.is_json() {
    print_json(&serde_json::json!({ "records": records.len(), "problems": problems }))?;
  } else if problems.is_empty() {
    print_success(&format!("{} record(s), no problems found", records.len()));
  } else {
    for p in &problems {
      print_warning(&format!("{}: {}", p.record, p.message));
    }
  }

  if !problems.is_empty() {
    bail!("{} problem(s) found", problems.len());
  }
  Ok(())
}
