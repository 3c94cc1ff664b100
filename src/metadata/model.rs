//! Canonical package model.
//!
//! Every metadata source is normalized into a [`Package`]. Fields with no
//! canonical home live in [`Package::extras`], so foreign data is carried
//! along instead of dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::normalize::parse_tags;
use crate::error::DatapkgError;

/// An insertion-ordered metadata mapping, as read from an arbitrary source.
pub type RawMetadata = Map<String, Value>;

/// The canonical top-level metadata keys.
pub const KEY_LIST: &[&str] = &[
    "id",
    "name",
    "title",
    "version",
    "license",
    "author",
    "author_email",
    "maintainer",
    "maintainer_email",
    "url",
    "download_url",
    "notes",
    "tags",
    "resources",
    "extras",
    "relationships",
];

/// Returns true if `key` is one of the canonical metadata keys.
pub fn is_canonical_key(key: &str) -> bool {
    KEY_LIST.contains(&key)
}

/// A data package in canonical form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Package identifier, unique within an index.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    /// Free-text notes, possibly several foreign fields joined together.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Retrievable units, in their stable ordinal order.
    #[serde(default)]
    pub resources: Vec<Resource>,

    /// Fields with no canonical home.
    #[serde(default)]
    pub extras: Map<String, Value>,

    /// Reserved; carried through unstructured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Value>,
}

impl Package {
    /// Creates an empty package with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds a resource to the package.
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Builds a typed package from an already normalized mapping.
    ///
    /// Keys outside [`KEY_LIST`] are folded into `extras` (first value wins),
    /// so the typed record never loses data the mapping carried.
    ///
    /// # Errors
    /// Returns an error if `name` is missing, or if a canonical field holds a
    /// value of the wrong shape (e.g. a resource without a `url`).
    pub fn from_metadata(metadata: RawMetadata) -> Result<Self, DatapkgError> {
        let mut package = Package::default();
        let mut name = None;
        let mut foreign = Vec::new();

        for (key, value) in metadata {
            match key.as_str() {
                "id" => package.id = text_field("id", value)?,
                "name" => name = text_field("name", value)?,
                "title" => package.title = text_field("title", value)?,
                "version" => package.version = text_field("version", value)?,
                "license" => package.license = text_field("license", value)?,
                "author" => package.author = text_field("author", value)?,
                "author_email" => package.author_email = text_field("author_email", value)?,
                "maintainer" => package.maintainer = text_field("maintainer", value)?,
                "maintainer_email" => {
                    package.maintainer_email = text_field("maintainer_email", value)?
                }
                "url" => package.url = text_field("url", value)?,
                "download_url" => package.download_url = text_field("download_url", value)?,
                "notes" => package.notes = text_field("notes", value)?,
                "tags" => package.tags = tags_field(value)?,
                "resources" => package.resources = resources_field(value)?,
                "extras" => match value {
                    Value::Object(map) => package.extras.extend(map),
                    Value::Null => {}
                    other => {
                        return Err(DatapkgError::MetadataInvalid {
                            field: "extras".into(),
                            message: format!("expected a mapping, found {other}"),
                        })
                    }
                },
                "relationships" => {
                    package.relationships = if value.is_null() { None } else { Some(value) }
                }
                _ => foreign.push((key, value)),
            }
        }

        for (key, value) in foreign {
            package.extras.entry(key).or_insert(value);
        }

        package.name = name.filter(|n| !n.is_empty()).ok_or_else(|| {
            DatapkgError::MetadataInvalid {
                field: "name".into(),
                message: "package has no name (and no id to derive one from)".into(),
            }
        })?;

        Ok(package)
    }

    /// Renders the package back into a canonical mapping.
    pub fn to_metadata(&self) -> RawMetadata {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => RawMetadata::new(),
        }
    }
}

/// A single retrievable unit of a package.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub url: String,

    /// Free-text format, conventionally `type/subtype` shaped (`csv`, `api/rest`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Any further resource attributes (description, size, hash, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    /// Creates a resource pointing at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: None,
            extra: Map::new(),
        }
    }

    /// Sets the resource format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Adds an attribute to the resource.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The format string, or `""` when none is set.
    pub fn format_str(&self) -> &str {
        self.format.as_deref().unwrap_or("")
    }
}

/// Renders a scalar metadata value as text.
///
/// Strings are taken as-is, numbers and booleans use their JSON rendering,
/// and null is the empty string. Structured values render as compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text_field(field: &str, value: Value) -> Result<Option<String>, DatapkgError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(_) | Value::Bool(_) => Ok(Some(value.to_string())),
        other => Err(DatapkgError::MetadataInvalid {
            field: field.to_string(),
            message: format!("expected text, found {other}"),
        }),
    }
}

fn tags_field(value: Value) -> Result<Vec<String>, DatapkgError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(parse_tags(&s)),
        Value::Array(items) => Ok(items.iter().map(value_to_text).collect()),
        other => Err(DatapkgError::MetadataInvalid {
            field: "tags".into(),
            message: format!("expected text or a sequence, found {other}"),
        }),
    }
}

fn resources_field(value: Value) -> Result<Vec<Resource>, DatapkgError> {
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        other => {
            return Err(DatapkgError::MetadataInvalid {
                field: "resources".into(),
                message: format!("expected a sequence, found {other}"),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(ordinal, item)| resource_from_value(ordinal, item))
        .collect()
}

fn resource_from_value(ordinal: usize, value: Value) -> Result<Resource, DatapkgError> {
    let invalid = |message: String| DatapkgError::MetadataInvalid {
        field: format!("resources[{ordinal}]"),
        message,
    };

    let mut map = match value {
        Value::String(url) => return Ok(Resource::new(url)),
        Value::Object(map) => map,
        other => return Err(invalid(format!("expected a mapping, found {other}"))),
    };

    let url = match map.remove("url") {
        Some(Value::String(url)) => url,
        Some(other) => return Err(invalid(format!("url must be text, found {other}"))),
        None => return Err(invalid("resource has no url".into())),
    };
    let format = match map.remove("format") {
        None | Some(Value::Null) => None,
        Some(other) => Some(value_to_text(&other)),
    };

    Ok(Resource {
        url,
        format,
        extra: map,
    })
}
