use datapkg::metadata::{is_canonical_key, normalize_metadata, parse_tags, KeyMap};
use proptest::prelude::*;
use serde_json::{json, Value};

mod proptest_helpers;

fn dist_keymap() -> KeyMap {
    [
        ("summary", "title"),
        ("description", "notes"),
        ("long_description", "notes"),
        ("keywords", "tags"),
        ("home_page", "homepage"),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn extras_is_always_a_mapping(raw in proptest_helpers::arb_raw_metadata()) {
        let normalized = normalize_metadata(&raw, &dist_keymap());

        prop_assert!(normalized.get("extras").is_some_and(Value::is_object));
    }

    #[test]
    fn only_canonical_keys_remain(raw in proptest_helpers::arb_raw_metadata()) {
        let normalized = normalize_metadata(&raw, &dist_keymap());

        for key in normalized.keys() {
            prop_assert!(is_canonical_key(key), "foreign key '{}' left at top level", key);
        }
    }

    #[test]
    fn input_is_left_untouched(raw in proptest_helpers::arb_raw_metadata()) {
        let before = raw.clone();
        let _ = normalize_metadata(&raw, &dist_keymap());

        prop_assert_eq!(raw, before);
    }

    #[test]
    fn name_falls_back_to_id(raw in proptest_helpers::arb_raw_metadata()) {
        let normalized = normalize_metadata(&raw, &dist_keymap());

        match (raw.get("name"), raw.get("id")) {
            (Some(name), _) => prop_assert_eq!(normalized.get("name"), Some(name)),
            (None, Some(id)) => prop_assert_eq!(normalized.get("name"), Some(id)),
            (None, None) => prop_assert!(normalized.get("name").is_none()),
        }
    }

    #[test]
    fn tag_sequences_pass_through(
        mut raw in proptest_helpers::arb_raw_metadata(),
        tags in proptest::collection::vec("[a-z ]{1,8}", 0..5),
    ) {
        raw.insert("tags".into(), json!(tags));
        let normalized = normalize_metadata(&raw, &dist_keymap());

        prop_assert_eq!(normalized.get("tags"), Some(&json!(tags)));
    }

    #[test]
    fn tag_text_becomes_a_list_without_empty_tags(
        mut raw in proptest_helpers::arb_raw_metadata(),
        text in "[a-z, ]{0,24}",
    ) {
        raw.insert("tags".into(), Value::String(text.clone()));
        let normalized = normalize_metadata(&raw, &dist_keymap());

        let expected = parse_tags(&text);
        prop_assert!(expected.iter().all(|tag| !tag.is_empty()));
        prop_assert_eq!(normalized.get("tags"), Some(&json!(expected)));
    }

    #[test]
    fn download_url_replaces_resources(
        mut raw in proptest_helpers::arb_raw_metadata(),
        url in "http://[a-z]{1,8}\\.org/[a-z]{1,8}\\.csv",
    ) {
        raw.insert("resources".into(), json!([{"url": "http://old.org/a.csv"}, {"url": "b"}]));
        raw.insert("download_url".into(), Value::String(url.clone()));
        let normalized = normalize_metadata(&raw, &dist_keymap());

        prop_assert_eq!(normalized.get("resources"), Some(&json!([{ "url": url }])));
    }

    #[test]
    fn unmapped_non_empty_values_land_in_extras(raw in proptest_helpers::arb_raw_metadata()) {
        let normalized = normalize_metadata(&raw, &KeyMap::new());
        let extras = normalized
            .get("extras")
            .and_then(Value::as_object)
            .expect("extras mapping");

        for (key, value) in raw.iter().filter(|(key, _)| !is_canonical_key(key)) {
            let empty = value.is_null() || value.as_str() == Some("");
            if !empty {
                prop_assert_eq!(extras.get(key), Some(value));
            }
        }
    }
}
