//! In-place updates of single keys
//!
//! An update never edits the original file directly. The file is re-read,
//! every line is copied to a shadow file in the same directory (with the
//! target line replaced), and the shadow file is renamed over the original.
//! A crash leaves either the untouched original or a complete shadow file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use fs2::FileExt;
use tracing::debug;

use super::limits::Limits;
use super::validator::{check_line_len, has_forbidden_comment, preflight, read_line};
use crate::domain::{classify, LineKind};
use crate::error::{Error, Result};

/// Distinguishes shadow files created by the same process in the same instant
static SHADOW_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Context for updating one config file
///
/// Returned by [`WriteHandle::open`] and threaded through
/// [`WriteHandle::set_value`]; several handles can be open at once.
#[derive(Debug)]
pub struct WriteHandle {
    path: PathBuf,
    limits: Limits,
}

impl WriteHandle {
    /// Opens a file for updating
    ///
    /// Checks existence, extension and entry count, in that order. Line
    /// lengths are checked by [`WriteHandle::set_value`] as it reads.
    pub fn open(path: impl AsRef<Path>, limits: &Limits) -> Result<Self> {
        let path = path.as_ref();
        preflight(path, limits)?;

        // Fail early if the file can't be read at all
        File::open(path).map_err(|e| Error::io("open", path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            limits: limits.clone(),
        })
    }

    /// Returns the path of the file being updated
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sets `key` under `[category]` to `value`
    ///
    /// Each call re-reads the file, so consecutive calls see each other's
    /// results. Every matching line within the category is rewritten as
    /// `key = value`; all other lines are copied unchanged.
    ///
    /// A source line longer than `max_line_len` aborts the update, as it
    /// would abort a load. Bytes that are not valid UTF-8 are copied through
    /// unchanged.
    ///
    /// Returns [`Error::KeyNotFound`] if no line matched. The original file
    /// is untouched in that case and no shadow file remains.
    pub fn set_value(&self, category: &str, key: &str, value: &str) -> Result<()> {
        check_key(key)?;
        check_value(value)?;

        let replacement = format!("{} = {}", key, value);
        check_line_len(0, replacement.as_bytes(), &self.limits)?;

        // The file may have changed since open
        preflight(&self.path, &self.limits)?;

        let source = File::open(&self.path).map_err(|e| Error::io("open", &self.path, e))?;
        FileExt::lock_exclusive(&source).map_err(|e| Error::io("lock", &self.path, e))?;

        let shadow = ShadowFile::create(&self.path)?;
        let mut current: Option<String> = None;
        let mut found = 0usize;

        {
            let mut writer = BufWriter::new(shadow.file()?);
            let mut reader = BufReader::new(&source);
            let mut buf = Vec::new();
            let mut number = 0;

            while read_line(&mut reader, &mut buf).map_err(|e| Error::io("read", &self.path, e))? {
                number += 1;
                check_line_len(number, &buf, &self.limits)?;

                let text = String::from_utf8_lossy(&buf);
                if let LineKind::Header(name) = classify(&text) {
                    current = Some(name.to_string());
                }

                let out = if current.as_deref() == Some(category) && is_target(&text, key) {
                    found += 1;
                    replacement.as_bytes()
                } else {
                    buf.as_slice()
                };

                writer
                    .write_all(out)
                    .map_err(|e| Error::io("write", shadow.path(), e))?;
                writer
                    .write_all(b"\n")
                    .map_err(|e| Error::io("write", shadow.path(), e))?;
            }

            writer
                .flush()
                .map_err(|e| Error::io("flush", shadow.path(), e))?;
        }

        if found == 0 {
            // Dropping the shadow removes it
            return Err(Error::KeyNotFound {
                category: category.to_string(),
                key: key.to_string(),
            });
        }

        shadow.commit(&self.path)?;

        debug!(
            path = %self.path.display(),
            category,
            key,
            lines = found,
            "updated config value"
        );

        // Lock on the replaced file is released when source is dropped
        Ok(())
    }

    /// Closes the handle
    pub fn close(self) {
        debug!(path = %self.path.display(), "closed config for writing");
    }
}

/// Returns true if the line assigns exactly `key`
///
/// The key has to start the line and be followed by a space or `=`, so
/// `port` does not match `portal = 1`. Header lines never match.
fn is_target(line: &str, key: &str) -> bool {
    if !line.contains('=') || matches!(classify(line), LineKind::Header(_)) {
        return false;
    }

    match line.strip_prefix(key) {
        Some(rest) => rest.starts_with(' ') || rest.starts_with('='),
        None => false,
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::Usage("key must not be empty".into()));
    }
    if let Some(c) = key
        .chars()
        .find(|c| matches!(c, '=' | '#' | '[' | ' ' | '\t' | '\n' | '\r'))
    {
        return Err(Error::Usage(format!(
            "key '{}' contains invalid character {:?}",
            key.escape_debug(),
            c
        )));
    }
    if has_forbidden_comment(key.as_bytes()) {
        return Err(Error::Usage(format!(
            "key '{}' contains a forbidden comment marker",
            key
        )));
    }
    Ok(())
}

fn check_value(value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(Error::Usage("value must be a single line".into()));
    }
    if value.contains('#') {
        return Err(Error::Usage(format!(
            "value '{}' contains '#', which would start a comment",
            value
        )));
    }
    if has_forbidden_comment(value.as_bytes()) {
        return Err(Error::Usage(format!(
            "value '{}' contains a forbidden comment marker",
            value
        )));
    }
    Ok(())
}

/// Temporary file next to the target, removed on drop unless committed
struct ShadowFile {
    path: PathBuf,
    file: Option<File>,
}

impl ShadowFile {
    fn create(target: &Path) -> Result<Self> {
        let path = shadow_path(target);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| Error::io("create shadow file", &path, e))?;

        Ok(Self {
            path,
            file: Some(file),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn file(&self) -> Result<&File> {
        self.file
            .as_ref()
            .ok_or_else(|| Error::io("write", &self.path, std::io::ErrorKind::NotFound.into()))
    }

    /// Syncs the shadow file and renames it over `target`
    fn commit(mut self, target: &Path) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()
                .map_err(|e| Error::io("sync", &self.path, e))?;
        }

        fs::rename(&self.path, target).map_err(|e| Error::io("rename", &self.path, e))?;

        // Nothing left to clean up
        self.path = PathBuf::new();
        Ok(())
    }
}

impl Drop for ShadowFile {
    fn drop(&mut self) {
        self.file.take();
        if !self.path.as_os_str().is_empty() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Builds a unique shadow path in the target's directory
///
/// Format: `.{file_name}.{7-char-hash}.tmp`, hashed from the target path,
/// process id, timestamp and a per-process counter.
fn shadow_path(target: &Path) -> PathBuf {
    let seq = SHADOW_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or(0);
    let input = format!(
        "{}{}{}{}",
        target.display(),
        std::process::id(),
        nanos,
        seq
    );
    let hash = blake3::hash(input.as_bytes()).to_hex();

    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    target.with_file_name(format!(".{}.{}.tmp", name, &hash[..7]))
}
