//! Fuzz target for free-text tag parsing.

#![no_main]

use datapkg::metadata::parse_tags;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let tags = parse_tags(text);
    assert!(tags.iter().all(|tag| !tag.is_empty()) || text.trim_start().starts_with('['));
});
