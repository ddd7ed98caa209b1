//! Fuzz target for fixture parsing.
//!
//! Arbitrary bytes must either fail to parse with an error or produce a
//! fixture whose records survive grouping, schema derivation and rendering
//! without panicking.

#![no_main]

use fixie::Fixture;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    if let Ok(fixture) = Fixture::from_slice(data) {
        let _ = fixture.view();
        let _ = fixture.all_records();
    }
});
