mod cmd;
mod output;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use prebuild_lib::{InstallOptions, Settings, Target};

use crate::output::print_error;

/// prebuild - build a native artifact locally or download a prebuilt one
#[derive(Parser)]
#[command(name = "prebuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile the artifact with the native-build toolchain
  Build {
    /// Target identifier (defaults to the current platform)
    target: Option<String>,
  },

  /// Clean, then compile the artifact
  Rebuild {
    /// Target identifier (defaults to the current platform)
    target: Option<String>,
  },

  /// Build the artifact, falling back to downloading a prebuilt one
  Install {
    /// Target identifier (defaults to the current platform)
    target: Option<String>,

    /// Skip building and download straight away
    #[arg(long)]
    no_build: bool,

    /// Never download; fail if the build fails
    #[arg(long)]
    no_download: bool,
  },
}

fn main() {
  let cli = Cli::parse();

  let default_filter = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  if let Err(e) = run(cli) {
    print_error(&e.to_string());
    std::process::exit(1);
  }
}

fn run(cli: Cli) -> Result<()> {
  let cwd = std::env::current_dir().context("Failed to determine current directory")?;
  let settings = Settings::from_env(cwd);

  match cli.command {
    Commands::Build { target } => cmd::cmd_build(&settings, &resolve_target(target)?, false),
    Commands::Rebuild { target } => cmd::cmd_build(&settings, &resolve_target(target)?, true),
    Commands::Install {
      target,
      no_build,
      no_download,
    } => {
      let flags = InstallOptions { no_build, no_download };
      cmd::cmd_install(&settings, &resolve_target(target)?, flags, cli.verbose)
    }
  }
}

fn resolve_target(target: Option<String>) -> Result<Target> {
  match target {
    Some(id) if !id.is_empty() => Ok(Target::new(id)),
    _ => match Target::current() {
      Some(target) => Ok(target),
      None => bail!("Could not detect platform; pass a target explicitly"),
    },
  }
}
