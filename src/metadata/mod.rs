//! Canonical package metadata and the normalization engine.
//!
//! Metadata arrives in many shapes: canonical JSON, stringified values that
//! went through a text-only medium, or build-tool distribution records that
//! use their own key vocabulary. Everything is reconciled into a single
//! [`Package`] record.
//!
//! # Example
//!
//! ```
//! use datapkg::metadata::{normalize, KeyMap, RawMetadata};
//! use serde_json::json;
//!
//! let mut raw = RawMetadata::new();
//! raw.insert("id".into(), json!("gdp"));
//! raw.insert("keywords".into(), json!("economics, world"));
//!
//! let keymap = KeyMap::from([("keywords".to_string(), "tags".to_string())]);
//! let package = normalize(&raw, &keymap).unwrap();
//!
//! assert_eq!(package.name, "gdp");
//! assert_eq!(package.tags, vec!["economics", "world"]);
//! ```

pub mod distutils;
pub mod io_json;
mod model;
mod normalize;

pub use distutils::{from_dist_metadata, parse_pkg_info, to_dist_metadata, DistMetadata};
pub use model::{is_canonical_key, value_to_text, Package, RawMetadata, Resource, KEY_LIST};
pub use normalize::{
    normalize, normalize_metadata, parse_tags, repair_extras, KeyMap, LINE_SEPARATOR,
};
