mod check;
mod edit;
mod resolve;
mod show;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use patchline_lib::config::{self, ConfigurationRecord, RemoteOptions};
use patchline_lib::consts::REMOTE_TIMEOUT_SECS;

pub use check::cmd_check;
pub use edit::cmd_edit;
pub use resolve::{ResolveArgs, cmd_resolve};
pub use show::cmd_show;

/// Transport flags for catalogs given as URLs.
#[derive(Debug, Clone, Args)]
pub struct RemoteArgs {
  /// Proxy URL for remote catalogs
  #[arg(long)]
  proxy: Option<String>,

  /// Reject invalid server certificates
  #[arg(long)]
  strict_tls: bool,

  /// Request timeout in seconds
  #[arg(long, default_value_t = REMOTE_TIMEOUT_SECS)]
  timeout: u64,
}

impl RemoteArgs {
  fn options(&self) -> RemoteOptions {
    RemoteOptions {
      timeout: Duration::from_secs(self.timeout),
      proxy: self.proxy.clone(),
      accept_invalid_certs: !self.strict_tls,
    }
  }
}

fn is_url(source: &str) -> bool {
  source.starts_with("http://") || source.starts_with("https://")
}

/// Load a catalog from a file or URL. An empty remote document is an empty
/// catalog.
fn load_catalog(source: &str, remote: &RemoteArgs) -> Result<Vec<ConfigurationRecord>> {
  if !is_url(source) {
    return config::load_local(Path::new(source)).with_context(|| format!("Failed to load catalog {}", source));
  }

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let records = rt
    .block_on(config::load_remote(source, &remote.options()))
    .with_context(|| format!("Failed to fetch catalog {}", source))?;
  Ok(records.unwrap_or_default())
}
