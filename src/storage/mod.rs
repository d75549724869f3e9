//! # Storage Layer
//!
//! File-facing side of confparse: validation, loading and in-place updates.
//!
//! ## Operations
//!
//! | Operation | Entry point | Touches the file |
//! |-----------|-------------|------------------|
//! | Validate | [`validate`] | read only |
//! | Load | [`Store::load`] | read only |
//! | Lookup | [`Store::lookup`] | no |
//! | Update | [`WriteHandle::set_value`] | shadow file + rename |
//!
//! ## Ordering
//!
//! Load and open-for-write re-check the file in the same order as
//! validation: existence, extension, entry count. A [`Store`] never sees
//! later updates; load again after writing.
//!
//! ## Concurrency Safety
//!
//! - Reads take a shared `fs2` lock, updates an exclusive one
//! - Updates are atomic (unique shadow file in the same directory + rename)
//! - Concurrent writers to the same file are not supported

mod limits;
mod rewriter;
mod store;
mod validator;

pub use limits::{Limits, DEFAULT_EXTENSIONS, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_LINE_LEN};
pub use rewriter::WriteHandle;
pub use store::{Pairs, Store};
pub use validator::{count_entries, validate, Verbosity, Verdict};
