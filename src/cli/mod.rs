//! # Command-Line Interface
//!
//! Thin driver over the library, mostly for scripting and manual checks.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `validate <path>` | Structural check only |
//! | `get <path> <key> [--category C]` | Print one value |
//! | `set <path> <category> <key> <value>` | Update one value in place |
//! | `dump <path>` | Print every entry in file order |
//!
//! ## Output Formats
//!
//! All commands support `--format text|json`.
//!
//! ## Verbose Mode
//!
//! `--verbose` (or `-v`) turns on validation progress and debug logging on
//! stderr. `RUST_LOG` overrides the log filter.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
