//! Property tests for the update path
//!
//! Whatever value gets written through a `WriteHandle` must come back from a
//! fresh load, and writing it again must not change the file.

use std::fs;

use confparse::{Limits, Store, WriteHandle};
use proptest::prelude::*;
use tempfile::TempDir;

const BASE: &str = "\
# service config
[Client]
ip = 127.0.0.1
port = 1111 # local port

[Server]
ip = 0.0.0.0
port = 2222
";

/// Values that survive normalization unchanged: no spaces, quotes, `#`,
/// or the forbidden comment markers
fn plain_value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.:-]{0,40}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn written_value_reads_back(
        category in prop::sample::select(vec!["Client", "Server"]),
        key in prop::sample::select(vec!["ip", "port"]),
        value in plain_value(),
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("svc.conf");
        fs::write(&path, BASE).unwrap();

        let handle = WriteHandle::open(&path, &Limits::default()).unwrap();
        handle.set_value(category, key, &value).unwrap();
        handle.close();

        let store = Store::open(&path).unwrap();
        prop_assert_eq!(store.lookup(Some(category), key), Some(value.as_str()));

        // The other category is untouched
        let other = if category == "Client" { "Server" } else { "Client" };
        let original = match (other, key) {
            ("Client", "ip") => "127.0.0.1",
            ("Client", _) => "1111",
            (_, "ip") => "0.0.0.0",
            _ => "2222",
        };
        prop_assert_eq!(store.lookup(Some(other), key), Some(original));
    }

    #[test]
    fn setting_same_value_twice_is_stable(value in plain_value()) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("svc.ini");
        fs::write(&path, BASE).unwrap();

        let handle = WriteHandle::open(&path, &Limits::default()).unwrap();
        handle.set_value("Server", "port", &value).unwrap();
        let once = fs::read(&path).unwrap();
        handle.set_value("Server", "port", &value).unwrap();
        let twice = fs::read(&path).unwrap();

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn spaces_and_quotes_are_always_removed(words in prop::collection::vec("[a-z]{1,8}", 1..4)) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("q.txt");
        let raw = words.join(" ");
        fs::write(&path, format!("[A]\nmsg = \"{}\"\n", raw)).unwrap();

        let expected = words.concat();
        let store = Store::open(&path).unwrap();
        prop_assert_eq!(store.lookup(Some("A"), "msg"), Some(expected.as_str()));
    }
}
