//! Structural validation of config files
//!
//! A file has to pass [`validate`] before its content is trusted. The checks
//! run in a fixed order and stop at the first failure:
//!
//! 1. the file exists
//! 2. its extension is in the allow-list
//! 3. every line fits in `max_line_len` bytes and uses no `'`, `//` or `/*`
//! 4. the number of entry lines does not exceed `max_entries`
//!
//! Validation only reads the file.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use fs2::FileExt;
use tracing::{info, warn};

use super::limits::Limits;
use crate::domain::classify;
use crate::error::{Error, Result};

/// Characters of an offending line shown in diagnostics
const PREVIEW_LEN: usize = 20;

/// Whether validation reports its progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Quiet,
    Verbose,
}

impl Verbosity {
    pub fn is_verbose(self) -> bool {
        self == Verbosity::Verbose
    }
}

impl From<bool> for Verbosity {
    fn from(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Quiet
        }
    }
}

impl TryFrom<u32> for Verbosity {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Verbosity::Quiet),
            1 => Ok(Verbosity::Verbose),
            other => Err(Error::Usage(format!("unknown verbose value: {}", other))),
        }
    }
}

impl FromStr for Verbosity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "0" | "quiet" => Ok(Verbosity::Quiet),
            "1" | "verbose" => Ok(Verbosity::Verbose),
            other => Err(Error::Usage(format!("unknown verbose value: '{}'", other))),
        }
    }
}

/// Outcome of [`validate`]
#[derive(Debug)]
pub enum Verdict {
    Pass,
    Fail(Error),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// Returns the failure, if any
    pub fn error(&self) -> Option<&Error> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail(err) => Some(err),
        }
    }

    /// Converts into a `Result`, for callers that want `?`
    pub fn into_result(self) -> Result<()> {
        match self {
            Verdict::Pass => Ok(()),
            Verdict::Fail(err) => Err(err),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASSED"),
            Verdict::Fail(err) => write!(f, "FAILED: {}", err),
        }
    }
}

/// Validates a config file against the given limits
///
/// With [`Verbosity::Verbose`] progress and failures are emitted as tracing
/// events; the verdict is the same either way.
pub fn validate(path: impl AsRef<Path>, verbosity: Verbosity, limits: &Limits) -> Verdict {
    let path = path.as_ref();

    if verbosity.is_verbose() {
        info!(path = %path.display(), "running validation checks");
    }

    match run_checks(path, limits) {
        Ok(()) => {
            if verbosity.is_verbose() {
                info!(path = %path.display(), "PASSED");
            }
            Verdict::Pass
        }
        Err(err) => {
            if verbosity.is_verbose() {
                warn!(path = %path.display(), "validation failed: {}", err);
            }
            Verdict::Fail(err)
        }
    }
}

fn run_checks(path: &Path, limits: &Limits) -> Result<()> {
    check_exists(path)?;
    check_extension(path, limits)?;
    scan_lines(path, limits)?;
    check_entry_count(path, limits)?;
    Ok(())
}

pub(crate) fn check_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::FileNotFound(path.to_path_buf()))
    }
}

pub(crate) fn check_extension(path: &Path, limits: &Limits) -> Result<()> {
    if limits.is_supported(path) {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat(path.to_path_buf()))
    }
}

/// Re-checks the preconditions shared by load and open-for-write
///
/// Order: existence, extension, entry count.
pub(crate) fn preflight(path: &Path, limits: &Limits) -> Result<()> {
    check_exists(path)?;
    check_extension(path, limits)?;
    check_entry_count(path, limits)
}

pub(crate) fn check_entry_count(path: &Path, limits: &Limits) -> Result<()> {
    let count = count_entries(path)?;
    if count > limits.max_entries {
        return Err(Error::TooManyEntries {
            count,
            max: limits.max_entries,
        });
    }
    Ok(())
}

/// Counts lines that are neither blank nor comments
pub fn count_entries(path: &Path) -> Result<usize> {
    let mut count = 0;
    for_each_line(path, |_, line| {
        if classify(&String::from_utf8_lossy(line)).is_entry() {
            count += 1;
        }
        Ok(())
    })?;
    Ok(count)
}

/// Fails on the first line that is too long or uses a foreign comment marker
fn scan_lines(path: &Path, limits: &Limits) -> Result<()> {
    for_each_line(path, |number, line| {
        check_line_len(number, line, limits)?;
        if has_forbidden_comment(line) {
            return Err(Error::ForbiddenComment {
                line: number,
                preview: preview(line),
            });
        }
        Ok(())
    })
}

/// Checks a line's byte length, terminator excluded
pub(crate) fn check_line_len(number: usize, line: &[u8], limits: &Limits) -> Result<()> {
    if line.len() > limits.max_line_len {
        return Err(Error::LineTooLong {
            line: number,
            len: line.len(),
            max: limits.max_line_len,
            preview: preview(line),
        });
    }
    Ok(())
}

/// Returns true if the bytes contain `'`, `//` or `/*`
pub(crate) fn has_forbidden_comment(line: &[u8]) -> bool {
    line.contains(&b'\'')
        || line
            .windows(2)
            .any(|pair| pair == b"//" || pair == b"/*")
}

fn preview(line: &[u8]) -> String {
    String::from_utf8_lossy(line).chars().take(PREVIEW_LEN).collect()
}

/// Reads one line into `buf` without its `\n` or `\r\n` terminator
///
/// Returns false at end of file. Bytes are kept as-is, so files that are
/// not valid UTF-8 can still be scanned and copied.
pub(crate) fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(false);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(true)
}

/// Calls `f` with each 1-based line number and raw line, under a shared lock
pub(crate) fn for_each_line<F>(path: &Path, mut f: F) -> Result<()>
where
    F: FnMut(usize, &[u8]) -> Result<()>,
{
    let file = File::open(path).map_err(|e| Error::io("open", path, e))?;
    FileExt::lock_shared(&file).map_err(|e| Error::io("lock", path, e))?;

    let mut reader = BufReader::new(&file);
    let mut buf = Vec::new();
    let mut number = 0;
    while read_line(&mut reader, &mut buf).map_err(|e| Error::io("read", path, e))? {
        number += 1;
        f(number, &buf)?;
    }

    // Lock is released when file is dropped
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn valid_file_passes() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "test.ini",
            "# comment\n[Client]\nip = 127.0.0.1\nport = 1111 # local port\n\n",
        );

        let verdict = validate(&path, Verbosity::Quiet, &Limits::default());
        assert!(verdict.is_pass(), "{}", verdict);
    }

    #[test]
    fn missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let verdict = validate(dir.path().join("nope.ini"), Verbosity::Quiet, &Limits::default());
        assert_eq!(verdict.error().map(Error::kind), Some(ErrorKind::NotFound));
    }

    #[test]
    fn unsupported_extension_fails() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "settings.json", "a = 1\n");

        let verdict = validate(&path, Verbosity::Quiet, &Limits::default());
        assert_eq!(
            verdict.error().map(Error::kind),
            Some(ErrorKind::UnsupportedFormat)
        );
    }

    #[test]
    fn long_line_fails_with_preview() {
        let dir = TempDir::new().unwrap();
        let long = format!("key = {}", "x".repeat(600));
        let path = write(&dir, "long.conf", &format!("[A]\n{}\n", long));

        match validate(&path, Verbosity::Quiet, &Limits::default()) {
            Verdict::Fail(Error::LineTooLong { line, preview, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(preview, "key = xxxxxxxxxxxxxx");
            }
            other => panic!("expected LineTooLong, got {}", other),
        }
    }

    #[test]
    fn line_at_exact_limit_passes() {
        let dir = TempDir::new().unwrap();
        let line = format!("k={}", "v".repeat(510));
        assert_eq!(line.len(), 512);
        let path = write(&dir, "edge.cfg", &format!("{}\n", line));

        assert!(validate(&path, Verbosity::Quiet, &Limits::default()).is_pass());
    }

    #[test]
    fn foreign_comment_markers_fail() {
        let dir = TempDir::new().unwrap();
        for (name, content) in [
            ("single.ini", "name = 'quoted'\n"),
            ("slashes.ini", "// comment\n"),
            ("block.ini", "a = 1 /* note */\n"),
        ] {
            let path = write(&dir, name, content);
            match validate(&path, Verbosity::Quiet, &Limits::default()) {
                Verdict::Fail(Error::ForbiddenComment { line, .. }) => assert_eq!(line, 1),
                other => panic!("{}: expected ForbiddenComment, got {}", name, other),
            }
        }
    }

    #[test]
    fn too_many_entries_fails() {
        let dir = TempDir::new().unwrap();
        let mut content = String::from("# header comment\n\n");
        for i in 0..501 {
            content.push_str(&format!("key{} = {}\n", i, i));
        }
        let path = write(&dir, "big.txt", &content);

        match validate(&path, Verbosity::Quiet, &Limits::default()) {
            Verdict::Fail(Error::TooManyEntries { count, max }) => {
                assert_eq!(count, 501);
                assert_eq!(max, 500);
            }
            other => panic!("expected TooManyEntries, got {}", other),
        }
    }

    #[test]
    fn exactly_max_entries_passes() {
        let dir = TempDir::new().unwrap();
        let content: String = (0..500).map(|i| format!("k{} = {}\n", i, i)).collect();
        let path = write(&dir, "full.txt", &content);

        assert!(validate(&path, Verbosity::Quiet, &Limits::default()).is_pass());
    }

    #[test]
    fn verbosity_does_not_change_verdict() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.ini", "[A]\nx = 1\n");
        let bad = write(&dir, "bad.ini", "x = 'no'\n");
        let limits = Limits::default();

        assert!(validate(&good, Verbosity::Quiet, &limits).is_pass());
        assert!(validate(&good, Verbosity::Verbose, &limits).is_pass());
        assert!(!validate(&bad, Verbosity::Quiet, &limits).is_pass());
        assert!(!validate(&bad, Verbosity::Verbose, &limits).is_pass());
    }

    #[test]
    fn validate_does_not_modify_file() {
        let dir = TempDir::new().unwrap();
        let content = "[Client]\nip = 127.0.0.1\n";
        let path = write(&dir, "same.ini", content);
        let before = blake3::hash(&fs::read(&path).unwrap());

        validate(&path, Verbosity::Verbose, &Limits::default());

        let after = blake3::hash(&fs::read(&path).unwrap());
        assert_eq!(before, after);
    }

    #[test]
    fn verbosity_parsing() {
        assert_eq!(Verbosity::try_from(0).unwrap(), Verbosity::Quiet);
        assert_eq!(Verbosity::try_from(1).unwrap(), Verbosity::Verbose);
        assert_eq!(Verbosity::try_from(2).unwrap_err().kind(), ErrorKind::Usage);
        assert_eq!("verbose".parse::<Verbosity>().unwrap(), Verbosity::Verbose);
        assert_eq!("yes".parse::<Verbosity>().unwrap_err().kind(), ErrorKind::Usage);
    }

    #[test]
    fn count_ignores_blank_and_comments() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "c.ini", "\n  \n# c\n  # c2\n[A]\na=1\nb\n");
        assert_eq!(count_entries(&path).unwrap(), 3);
    }

    #[test]
    fn custom_limits_apply() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "small.ini", "a = 1\nb = 2\nc = 3\n");
        let limits = Limits {
            max_entries: 2,
            ..Limits::default()
        };

        assert!(!validate(&path, Verbosity::Quiet, &limits).is_pass());
    }

    #[test]
    fn latin1_file_passes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.ini");
        fs::write(&path, b"[A]\nname = caf\xe9\n").unwrap();

        let verdict = validate(&path, Verbosity::Quiet, &Limits::default());
        assert!(verdict.is_pass(), "{}", verdict);
        assert_eq!(count_entries(&path).unwrap(), 2);
    }

    #[test]
    fn line_length_counts_bytes() {
        let dir = TempDir::new().unwrap();
        // 256 two-byte characters plus "k=" is 514 bytes but 258 chars
        let line = format!("k={}", "\u{e9}".repeat(256));
        let path = write(&dir, "wide.ini", &format!("{}\n", line));

        match validate(&path, Verbosity::Quiet, &Limits::default()) {
            Verdict::Fail(Error::LineTooLong { len, .. }) => assert_eq!(len, 514),
            other => panic!("expected LineTooLong, got {}", other),
        }
    }

    #[test]
    fn read_line_strips_terminators() {
        let mut reader = std::io::Cursor::new(b"a = 1\r\nb = 2\nlast".to_vec());
        let mut buf = Vec::new();

        assert!(read_line(&mut reader, &mut buf).unwrap());
        assert_eq!(buf, b"a = 1");
        assert!(read_line(&mut reader, &mut buf).unwrap());
        assert_eq!(buf, b"b = 2");
        assert!(read_line(&mut reader, &mut buf).unwrap());
        assert_eq!(buf, b"last");
        assert!(!read_line(&mut reader, &mut buf).unwrap());
    }
}
