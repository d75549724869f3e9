//! Domain model for confparse
//!
//! Line-level parsing and the parsed record type, without any I/O concerns.

mod entry;
mod line;

pub use entry::Entry;
pub use line::{classify, header_name, parse, tokenize, LineKind};
