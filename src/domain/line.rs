//! Line classification and tokenizing
//!
//! Pure functions over a single physical line (terminator already removed).
//! Nothing here touches the filesystem.

use super::entry::Entry;

/// What a raw line turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Whitespace only
    Blank,
    /// First non-whitespace character is `#`
    Comment,
    /// `[name]`, with the text strictly between the brackets
    Header(&'a str),
    /// Anything else; handed to [`tokenize`]
    Candidate(&'a str),
}

impl LineKind<'_> {
    /// Blank and comment lines carry no entry and don't count toward the ceiling
    pub fn is_entry(&self) -> bool {
        matches!(self, LineKind::Header(_) | LineKind::Candidate(_))
    }
}

/// Classifies one line
pub fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with('#') {
        return LineKind::Comment;
    }
    if let Some(name) = header_name(trimmed) {
        return LineKind::Header(name);
    }

    LineKind::Candidate(trimmed)
}

/// Extracts the category name from a header line, if it is one
///
/// Anything after the closing bracket is ignored.
pub fn header_name(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('[')?;
    let end = rest.find(']')?;
    Some(&rest[..end])
}

/// Splits a candidate line into a key-value entry
///
/// Spaces are removed everywhere in both halves and quotes everywhere in the
/// value, so `name = "My Value"` yields `MyValue`.
pub fn tokenize(line: &str) -> Entry {
    let (key, value) = line.split_once('=').unwrap_or((line, ""));

    let key = strip_spaces(strip_comment(key));
    let value: String = strip_spaces(strip_comment(value))
        .chars()
        .filter(|&c| c != '"')
        .collect();

    Entry::Pair { key, value }
}

/// Turns any entry-bearing line into an [`Entry`]
pub fn parse(line: &str) -> Option<Entry> {
    match classify(line) {
        LineKind::Blank | LineKind::Comment => None,
        LineKind::Header(name) => Some(Entry::category(name)),
        LineKind::Candidate(text) => Some(tokenize(text)),
    }
}

fn strip_comment(s: &str) -> &str {
    match s.find('#') {
        Some(pos) => &s[..pos],
        None => s,
    }
}

fn strip_spaces(s: &str) -> String {
    s.chars().filter(|&c| c != ' ').collect()
}
