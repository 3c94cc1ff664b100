#![allow(dead_code)]

use datapkg::metadata::{RawMetadata, KEY_LIST};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::Value;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Keys outside the canonical vocabulary, including some that keymaps target.
pub const FOREIGN_KEYS: &[&str] = &[
    "keywords",
    "summary",
    "description",
    "long_description",
    "home_page",
    "source_agency",
    "groups",
];

pub fn arb_text() -> BoxedStrategy<String> {
    prop_oneof![
        Just(String::new()),
        "[a-z]{1,8}",
        "[a-z]{1,6}( [a-z]{1,6}){0,3}",
    ]
    .boxed()
}

pub fn arb_value() -> BoxedStrategy<Value> {
    prop_oneof![
        4 => arb_text().prop_map(Value::String),
        1 => Just(Value::Null),
        1 => (0i64..10_000).prop_map(Value::from),
        1 => proptest::collection::vec("[a-z]{1,6}", 0..4)
            .prop_map(Value::from),
    ]
    .boxed()
}

pub fn arb_extras() -> BoxedStrategy<Value> {
    prop_oneof![
        Just(Value::Null),
        Just(Value::String("{}".into())),
        Just(Value::String("not a mapping".into())),
        Just(Value::from(vec!["a", "b"])),
        proptest::collection::btree_map("[a-z]{1,6}", arb_text(), 0..3).prop_map(|map| {
            Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect(),
            )
        }),
    ]
    .boxed()
}

fn arb_key() -> BoxedStrategy<String> {
    let canonical: Vec<&'static str> = KEY_LIST
        .iter()
        .copied()
        .filter(|key| !matches!(*key, "extras" | "resources" | "relationships"))
        .collect();
    prop_oneof![
        proptest::sample::select(canonical).prop_map(str::to_string),
        proptest::sample::select(FOREIGN_KEYS).prop_map(str::to_string),
    ]
    .boxed()
}

/// Arbitrary raw metadata mixing canonical and foreign keys with loosely
/// shaped values.
pub fn arb_raw_metadata() -> BoxedStrategy<RawMetadata> {
    (
        proptest::collection::vec((arb_key(), arb_value()), 0..10),
        proptest::option::of(arb_extras()),
    )
        .prop_map(|(entries, extras)| {
            let mut raw = RawMetadata::new();
            for (key, value) in entries {
                raw.insert(key, value);
            }
            if let Some(extras) = extras {
                raw.insert("extras".into(), extras);
            }
            raw
        })
        .boxed()
}
