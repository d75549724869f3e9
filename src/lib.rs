//! confparse - a small INI-style config file parser
//!
//! Reads `[Category]` / `key = value` files into an ordered list of entries,
//! answers lookups, and updates single keys in place through a shadow file
//! that is renamed over the original.
//!
//! ```no_run
//! use confparse::{Limits, Store, Verbosity, WriteHandle};
//!
//! # fn main() -> confparse::Result<()> {
//! let limits = Limits::default();
//! confparse::validate("test.ini", Verbosity::Quiet, &limits).into_result()?;
//!
//! let store = Store::load("test.ini", &limits)?;
//! let ip = store.lookup(Some("Client"), "ip").map(str::to_owned);
//! store.release();
//! println!("ip = {:?}", ip);
//!
//! let handle = WriteHandle::open("test.ini", &limits)?;
//! handle.set_value("Client", "port", "1112")?;
//! handle.close();
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod error;
pub mod storage;
pub mod cli;

pub use domain::{Entry, LineKind};
pub use error::{Error, ErrorKind, Result};
pub use storage::{validate, Limits, Store, Verbosity, Verdict, WriteHandle};

use std::path::Path;

/// Loads a file with the default limits
pub fn load(path: impl AsRef<Path>) -> Result<Store> {
    Store::open(path)
}

/// Opens a file for updating with the default limits
pub fn open_for_write(path: impl AsRef<Path>) -> Result<WriteHandle> {
    WriteHandle::open(path, &Limits::default())
}
