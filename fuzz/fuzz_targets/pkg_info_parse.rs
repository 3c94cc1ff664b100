//! Fuzz target for PKG-INFO parsing and conversion.
//!
//! Parsed records are also converted to a canonical package, exercising
//! the build-tool keymap and normalization.

#![no_main]

use datapkg::metadata::{from_dist_metadata, parse_pkg_info};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(dist) = parse_pkg_info(text) {
        let _ = from_dist_metadata(&dist);
    }
});
