//! Fuzz target for package metadata JSON parsing.
//!
//! This fuzzer feeds arbitrary UTF-8 text to the JSON reader, which parses
//! and normalizes it, checking for panics, crashes, or hangs.

#![no_main]

use datapkg::metadata::io_json::from_json_str;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };

    let _ = from_json_str(json);
});
