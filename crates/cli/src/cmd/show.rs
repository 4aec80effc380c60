//! Implementation of the `patchline show` command.

use anyhow::Result;
use owo_colors::OwoColorize;

use super::{RemoteArgs, load_catalog};
use crate::output::{OutputFormat, print_info, print_json, print_stat, symbols};

pub fn cmd_show(catalog: &str, remote: &RemoteArgs, format: OutputFormat) -> Result<()> {
  let records = load_catalog(catalog, remote)?;

  if format.is_json() {
    return print_json(&records);
  }

  if records.is_empty() {
    print_info("Catalog is empty");
    return Ok(());
  }

  for record in &records {
    let title = match record.version() {
      Ok(version) => version.full_text(),
      Err(_) => format!("{} (invalid)", record.literal_version),
    };
    println!("{} {}", symbols::INFO, title.bold());
    print_stat("Architecture", record.architecture.as_str());
    print_stat("Operations", &record.operations.len().to_string());
    if record.must_update {
      print_stat("Mandatory", "yes");
    }
    if !record.unsupported_versions.is_empty() {
      print_stat("Unsupported", &record.unsupported_versions.join(", "));
    }
    if let Some(text) = record.changelog_for(patchline_lib::consts::DEFAULT_LOCALE) {
      print_stat("Changelog", text.lines().next().unwrap_or_default());
    }
  }

  Ok(())
}
