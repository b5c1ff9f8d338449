//! Fuzz target: name message bounding
//!
//! Feeds arbitrary UTF-8 through `fill_truncated` into the device name
//! buffer.
//!
//! Invariants checked:
//! - No panics on any input
//! - The stored name is always a prefix of the input on a char boundary
//! - Truncation is reported exactly when the input did not fit
//!
//! cargo fuzz run fuzz_name_truncate

#![no_main]

use libfuzzer_sys::fuzz_target;
use nodewarden::app::commands::DeviceName;
use nodewarden::vitals::fill_truncated;

fuzz_target!(|input: &str| {
    let mut name = DeviceName::new();
    let truncated = fill_truncated(&mut name, input);

    assert!(input.starts_with(name.as_str()));
    assert_eq!(truncated, name.len() < input.len());
    if !truncated {
        assert_eq!(name.as_str(), input);
    }
});
