//! Implementation of the `patchline resolve` command.
//!
//! Answers the client's question: given what is installed, which published
//! version should be installed next?

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use patchline_lib::platform::HostArch;
use patchline_lib::resolve::{ResolutionContext, resolve};
use patchline_lib::version::UpdateVersion;

use super::{RemoteArgs, load_catalog};
use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success, symbols};

/// Client side of a resolution.
#[derive(Debug, Clone)]
pub struct ResolveArgs {
  pub installed: String,
  pub alpha: bool,
  pub beta: bool,
  pub arch: Option<HostArch>,
  pub locale: String,
}

pub fn cmd_resolve(catalog: &str, args: &ResolveArgs, remote: &RemoteArgs, format: OutputFormat) -> Result<()> {
  let installed = UpdateVersion::parse(&args.installed).context("Invalid --installed version")?;
  let records = load_catalog(catalog, remote)?;

  let ctx = ResolutionContext::new(installed)
    .with_alpha(args.alpha)
    .with_beta(args.beta)
    .with_host(args.arch.unwrap_or_else(HostArch::current));
  let resolution = resolve(&records, &ctx);

  if format.is_json() {
    let changelogs: Vec<_> = resolution
      .changelogs(&args.locale)
      .into_iter()
      .map(|(version, text)| serde_json::json!({ "version": version, "changelog": text }))
      .collect();
    return print_json(&serde_json::json!({
      "found": resolution.found(),
      "mustUpdate": resolution.must_update(),
      "best": resolution.best,
      "eligible": resolution.eligible,
      "changelogs": changelogs,
    }));
  }

  let Some(best) = &resolution.best else {
    print_info(&format!("No update available for {}", installed.full_text()));
    return Ok(());
  };

  let best_version = best.version().context("Resolved record has an invalid version")?;
  print_success(&format!(
    "Update available: {} {} {}",
    installed.full_text(),
    symbols::ARROW,
    best_version.full_text().green()
  ));
  print_stat("Eligible versions", &resolution.eligible.len().to_string());
  print_stat("Architecture", best.architecture.as_str());
  if let Some(uri) = &best.package_uri {
    print_stat("Package", uri);
  }
  if resolution.must_update() {
    print_stat("Mandatory", "yes");
  }

  for (version, text) in resolution.changelogs(&args.locale) {
    println!();
    println!("{}", version.full_text().bold());
    for line in text.lines() {
      println!("  {}", line);
    }
  }

  Ok(())
}
