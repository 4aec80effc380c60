mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use patchline_lib::platform::HostArch;
use tracing_subscriber::EnvFilter;

use crate::output::{OutputFormat, print_error};

/// patchline - publish and resolve software update catalogs
#[derive(Parser)]
#[command(name = "patchline")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Find the update a client should install
  Resolve {
    /// Catalog path or http(s) URL
    catalog: String,

    /// Version the client has installed
    #[arg(long)]
    installed: String,

    /// Offer alpha versions
    #[arg(long)]
    alpha: bool,

    /// Offer beta versions
    #[arg(long)]
    beta: bool,

    /// Host architecture (defaults to the running machine)
    #[arg(long)]
    arch: Option<HostArch>,

    /// Changelog locale
    #[arg(long, default_value = "en")]
    locale: String,

    #[command(flatten)]
    remote: cmd::RemoteArgs,

    #[arg(long)]
    json: bool,
  },

  /// Check a catalog for integrity problems
  Check {
    /// Catalog path or http(s) URL
    catalog: String,

    #[command(flatten)]
    remote: cmd::RemoteArgs,

    #[arg(long)]
    json: bool,
  },

  /// List the records of a catalog
  Show {
    /// Catalog path or http(s) URL
    catalog: String,

    #[command(flatten)]
    remote: cmd::RemoteArgs,

    #[arg(long)]
    json: bool,
  },

  /// Edit a published version and propagate the change
  Edit {
    /// Project definition file
    #[arg(long)]
    project: PathBuf,

    /// Version to edit
    #[arg(long)]
    version: String,

    /// JSON file with the new record contents
    #[arg(long)]
    changes: PathBuf,

    /// Password for the statistics database
    #[arg(long, env = "PATCHLINE_SQL_PASSWORD", hide_env_values = true)]
    sql_password: Option<String>,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let result = match cli.command {
    Commands::Resolve {
      catalog,
      installed,
      alpha,
      beta,
      arch,
      locale,
      remote,
      json,
    } => cmd::cmd_resolve(
      &catalog,
      &cmd::ResolveArgs {
        installed,
        alpha,
        beta,
        arch,
        locale,
      },
      &remote,
      OutputFormat::from_json_flag(json),
    ),
    Commands::Check { catalog, remote, json } => cmd::cmd_check(&catalog, &remote, OutputFormat::from_json_flag(json)),
    Commands::Show { catalog, remote, json } => cmd::cmd_show(&catalog, &remote, OutputFormat::from_json_flag(json)),
    Commands::Edit {
      project,
      version,
      changes,
      sql_password,
    } => cmd::cmd_edit(&project, &version, &changes, sql_password),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}

fn init_logging(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}
