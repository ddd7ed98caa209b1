//! Fuzz target for structural merge.
//!
//! Merging a value with itself must return it unchanged.

#![no_main]

use fixie::merge;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    if let Ok(value) = serde_json::from_slice::<Value>(data) {
        assert_eq!(merge(&value, &value), value);
        assert_eq!(merge(&Value::Null, &value), value);
    }
});
