//! Structural ceilings applied to config files
//!
//! Defaults keep the documented contract (512-byte lines, 500 entries,
//! `.txt`/`.conf`/`.ini`/`.cfg`). They can be tuned from a TOML file:
//!
//! ```toml
//! max_line_len = 1024
//! max_entries = 2000
//! extensions = ["ini", "conf"]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_MAX_LINE_LEN: usize = 512;
pub const DEFAULT_MAX_ENTRIES: usize = 500;
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["txt", "conf", "ini", "cfg"];

/// Limits enforced by validation, load and rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum bytes per line, excluding the terminator
    pub max_line_len: usize,

    /// Maximum number of non-blank, non-comment lines
    pub max_entries: usize,

    /// Accepted file extensions, without the leading dot
    pub extensions: Vec<String>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
            max_entries: DEFAULT_MAX_ENTRIES,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Limits {
    /// Parses limits from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let limits: Limits =
            toml::from_str(content).map_err(|e| Error::Limits(e.to_string()))?;
        limits.check()?;
        Ok(limits)
    }

    /// Loads limits from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io("read", path, e))?;
        Self::from_toml_str(&content)
    }

    /// Returns true if the path's extension is in the allow-list
    ///
    /// The comparison is case-sensitive, so `settings.INI` is rejected.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|allowed| allowed == ext))
            .unwrap_or(false)
    }

    fn check(&self) -> Result<()> {
        if self.max_line_len == 0 {
            return Err(Error::Limits("max_line_len must be positive".into()));
        }
        if self.extensions.is_empty() {
            return Err(Error::Limits("extensions must not be empty".into()));
        }
        if let Some(bad) = self.extensions.iter().find(|e| e.is_empty() || e.starts_with('.')) {
            return Err(Error::Limits(format!(
                "extension '{}' must be non-empty and given without a dot",
                bad
            )));
        }
        Ok(())
    }
}
