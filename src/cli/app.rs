//! Main CLI application structure

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use crate::storage::{validate, Limits, Store, Verbosity, Verdict, WriteHandle};

#[derive(Parser)]
#[command(name = "confparse")]
#[command(author, version, about = "Read, validate and update INI-style config files")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// TOML file overriding line length, entry count and extension limits
    #[arg(long, global = true)]
    pub limits: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a file's structure without loading it
    Validate {
        /// Config file to check
        path: PathBuf,
    },

    /// Print the value of a key
    Get {
        /// Config file to read
        path: PathBuf,

        /// Key to look up
        key: String,

        /// Only match the key under this category
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Update the value of an existing key
    Set {
        /// Config file to update
        path: PathBuf,

        /// Category the key lives under
        category: String,

        /// Key to update
        key: String,

        /// New value
        value: String,
    },

    /// Print every entry in file order
    Dump {
        /// Config file to read
        path: PathBuf,
    },
}

/// Installs the stderr log subscriber
fn init_tracing(verbose: bool) {
    let default = if verbose { "confparse=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be set when run() is called more than once
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = Output::new(cli.format, cli.verbose);
    let limits = load_limits(cli.limits.as_deref(), &output)?;

    match cli.command {
        Commands::Validate { path } => validate_cmd(&output, &path, &limits)?,
        Commands::Get {
            path,
            key,
            category,
        } => get_cmd(&output, &path, category.as_deref(), &key, &limits)?,
        Commands::Set {
            path,
            category,
            key,
            value,
        } => set_cmd(&output, &path, &category, &key, &value, &limits)?,
        Commands::Dump { path } => dump_cmd(&output, &path, &limits)?,
    }

    output.verbose_ctx("run", "Command completed successfully");
    Ok(())
}

fn load_limits(path: Option<&Path>, output: &Output) -> Result<Limits> {
    match path {
        Some(path) => {
            output.verbose_ctx("limits", &format!("Loading limits from {}", path.display()));
            Limits::load(path)
                .with_context(|| format!("Failed to load limits: {}", path.display()))
        }
        None => Ok(Limits::default()),
    }
}

fn validate_cmd(output: &Output, path: &Path, limits: &Limits) -> Result<()> {
    let verdict = validate(path, Verbosity::from(output.is_verbose()), limits);

    if output.is_json() {
        output.data(&serde_json::json!({
            "path": path.display().to_string(),
            "valid": verdict.is_pass(),
            "error": verdict.error().map(|e| e.to_string()),
        }));
    }

    match verdict {
        Verdict::Pass => {
            output.line(&format!("{}: PASSED", path.display()));
            Ok(())
        }
        Verdict::Fail(err) => {
            Err(err).with_context(|| format!("Validation failed: {}", path.display()))
        }
    }
}

fn get_cmd(
    output: &Output,
    path: &Path,
    category: Option<&str>,
    key: &str,
    limits: &Limits,
) -> Result<()> {
    let store = Store::load(path, limits)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;
    output.verbose_ctx("get", &format!("Loaded {} entries", store.len()));

    let value = match store.lookup(category, key) {
        Some(value) => value.to_string(),
        None => match category {
            Some(category) => bail!("Entry {} not found in {}", key, category),
            None => bail!("Entry {} not found", key),
        },
    };
    store.release();

    if output.is_json() {
        output.data(&serde_json::json!({
            "category": category,
            "key": key,
            "value": value,
        }));
    } else {
        output.line(&value);
    }

    Ok(())
}

fn set_cmd(
    output: &Output,
    path: &Path,
    category: &str,
    key: &str,
    value: &str,
    limits: &Limits,
) -> Result<()> {
    let handle = WriteHandle::open(path, limits)
        .with_context(|| format!("Failed to open config for writing: {}", path.display()))?;

    handle
        .set_value(category, key, value)
        .with_context(|| format!("Failed to update {}", path.display()))?;
    handle.close();

    output.success(&format!("Set [{}] {} = {}", category, key, value));
    Ok(())
}

fn dump_cmd(output: &Output, path: &Path, limits: &Limits) -> Result<()> {
    let store = Store::load(path, limits)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;

    if output.is_json() {
        output.data(&store.entries());
    } else {
        for entry in store.entries() {
            output.line(&entry.to_string());
        }
    }

    store.release();
    Ok(())
}
