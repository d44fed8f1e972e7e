// CLI module for command-line interface

pub mod check;
pub mod fmt;
pub mod parse;
pub mod resolve;

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::models::manifest::Manifest;
use crate::services::manifest_loader::ManifestLoader;
use crate::services::manifest_parser::ManifestParser;
use crate::utils::config::ConfigParser;
use crate::utils::error::{ReqmError, Result};

use self::check::CheckCommand;
use self::fmt::FmtCommand;
use self::parse::ParseCommand;
use self::resolve::ResolveCommand;

/// Path that stands for standard input
pub const STDIN_PATH: &str = "-";

/// Main CLI structure
#[derive(Parser)]
#[command(name = "reqm")]
#[command(about = "Parse, validate, format and resolve Python requirements manifests")]
#[command(long_about = r#"reqm works with pip-style requirements manifests: newline-separated
package identifiers grouped under '#' comment headers.

Features:
  • Ordered package listing with comment and blank lines excluded
  • Structural checks: valid identifiers, no duplicates, optional pinning
  • Canonical formatting
  • Version resolution against a PyPI-compatible index, with lock files

Examples:
  reqm parse                          List packages in requirements.txt
  reqm check --strict                 Fail on any finding
  reqm fmt --write                    Rewrite the manifest in canonical form
  reqm resolve --lock reqm.lock       Resolve versions and write a lock file

Configuration is read from --config, ./reqm.toml or the user config directory."#)]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: ./reqm.toml, then the user config directory)
    #[arg(long, global = true, env = "REQM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// All available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List the package identifiers of a manifest
    #[command(long_about = r#"List the package identifiers of a manifest in order.

Comment lines, blank lines and installer options are excluded. Lines that
cannot be parsed are skipped with a warning; use `reqm check` to see why.

Examples:
  reqm parse                           Read ./requirements.txt
  reqm parse deps/base.txt --json      Full entries as JSON
  cat requirements.txt | reqm parse -  Read from stdin"#)]
    Parse(ParseCommand),

    /// Validate a manifest
    #[command(long_about = r#"Check that every requirement line names a valid package identifier
and that no identifier appears twice (compared in normalized form).

Exits with status 1 when errors are found, or any finding under --strict.

Examples:
  reqm check                           Check ./requirements.txt
  reqm check --require-pins --strict   Every package must carry a version
  reqm check --follow-includes         Include files named by -r lines"#)]
    Check(CheckCommand),

    /// Print or rewrite a manifest in canonical form
    #[command(long_about = r#"Render a manifest in canonical form: requirements without redundant
whitespace, '# comment' headers and single blank lines between sections.

Examples:
  reqm fmt                             Print the canonical form
  reqm fmt --check                     Exit 1 if the file is not canonical
  reqm fmt --write                     Rewrite the file in place"#)]
    Fmt(FmtCommand),

    /// Resolve versions against a package index
    #[command(long_about = r#"Look up every package on a PyPI-compatible index and pick the newest
version that satisfies its specifiers, as an installer would.

Examples:
  reqm resolve                                 Print name==version lines
  reqm resolve --lock reqm.lock                Also write a JSON lock file
  reqm resolve --pinned requirements.lock.txt  Write a pinned manifest
  reqm resolve --index-url http://localhost:8080"#)]
    Resolve(ResolveCommand),
}

/// CLI command dispatcher
pub struct CliDispatcher;

impl CliDispatcher {
    /// Execute a CLI command, returning the process exit code
    pub async fn execute(cli: Cli) -> Result<i32> {
        let config = ConfigParser::load(cli.config.as_deref())?;

        match cli.command {
            Commands::Parse(cmd) => cmd.run(&config),
            Commands::Check(cmd) => cmd.run(&config),
            Commands::Fmt(cmd) => cmd.run(&config),
            Commands::Resolve(cmd) => cmd.run(&config).await,
        }
    }
}

/// Initialise `env_logger`; `RUST_LOG` still takes precedence
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// A manifest read for a command, together with its raw text
pub struct LoadedManifest {
    pub manifest: Manifest,
    pub text: String,
}

/// Read `file` (or stdin for `-`) and parse it
pub fn load_manifest(file: &Path, follow_includes: bool) -> Result<LoadedManifest> {
    if file == Path::new(STDIN_PATH) {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| ReqmError::io("<stdin>", e))?;
        if follow_includes {
            log::warn!("-r includes are not followed when reading from stdin");
        }
        let manifest = ManifestParser::parse("<stdin>", &text);
        return Ok(LoadedManifest { manifest, text });
    }

    let text = ManifestLoader::read_text(file)?;
    let manifest = if follow_includes {
        ManifestLoader::new(true).load(file)?
    } else {
        ManifestParser::parse(&file.display().to_string(), &text)
    };
    Ok(LoadedManifest { manifest, text })
}

/// Print `value` as pretty JSON on stdout
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json_output = serde_json::to_string_pretty(value)
        .map_err(|e| ReqmError::ParseError(format!("Failed to serialize JSON response: {e}")))?;
    println!("{json_output}");
    Ok(())
}
