//! Build-tool distribution metadata adapter.
//!
//! Distribution metadata comes in two renderings:
//!
//! - the *live* descriptor, as passed to the build tool (`description` is the
//!   one-line summary, `long_description` the full text, `url` the home page);
//! - the *frozen* `PKG-INFO` record, in which every text field has moved up
//!   one level (`Summary` holds the short description, `Description` the
//!   long one, `Home-page` the url).
//!
//! [`from_dist_metadata`] detects which rendering it is looking at and
//! rewires the keymap so long-form text never overwrites the title.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::model::{Package, RawMetadata};
use super::normalize::{normalize, KeyMap};
use crate::error::DatapkgError;

/// The value build tools write for required-but-unset fields.
const UNKNOWN: &str = "UNKNOWN";

/// Every attribute the build tool's metadata record declares.
pub const ATTRIBUTE_NAMES: &[&str] = &[
    "name",
    "version",
    "author",
    "author_email",
    "maintainer",
    "maintainer_email",
    "url",
    "license",
    "description",
    "long_description",
    "keywords",
    "platforms",
    "fullname",
    "contact",
    "contact_email",
    "classifiers",
    "download_url",
    "provides",
    "requires",
    "obsoletes",
];

/// Attributes computed from other fields; reading them would duplicate data.
const DERIVED_ATTRIBUTES: &[&str] = &["fullname", "contact", "contact_email"];

/// Attributes only the frozen rendering fills in.
const IMPLICIT_ATTRIBUTES: &[&str] = &["summary", "home_page"];

/// Distribution metadata as written by a build tool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistMetadata {
    pub name: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub maintainer: Option<String>,
    pub maintainer_email: Option<String>,
    pub url: Option<String>,
    pub license: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub keywords: Option<String>,
    pub platforms: Vec<String>,
    pub classifiers: Vec<String>,
    pub download_url: Option<String>,
    pub provides: Vec<String>,
    pub requires: Vec<String>,
    pub obsoletes: Vec<String>,

    /// Only set in the frozen rendering.
    pub summary: Option<String>,
    /// Only set in the frozen rendering.
    pub home_page: Option<String>,
}

impl DistMetadata {
    /// `name-version`, as the build tool would name the distribution.
    pub fn fullname(&self) -> String {
        format!(
            "{}-{}",
            self.name.as_deref().unwrap_or(UNKNOWN),
            self.version.as_deref().unwrap_or("0.0.0")
        )
    }

    /// The maintainer if set, otherwise the author.
    pub fn contact(&self) -> Option<&str> {
        self.maintainer.as_deref().or(self.author.as_deref())
    }

    /// The maintainer email if set, otherwise the author email.
    pub fn contact_email(&self) -> Option<&str> {
        self.maintainer_email
            .as_deref()
            .or(self.author_email.as_deref())
    }

    /// Reads one attribute by name, rendered as text.
    ///
    /// Multi-valued attributes are joined with `", "`. Unknown names and
    /// unset attributes yield `None`.
    pub fn attribute(&self, name: &str) -> Option<String> {
        let text = |value: &Option<String>| value.clone();
        let list = |values: &[String]| {
            if values.is_empty() {
                None
            } else {
                Some(values.join(", "))
            }
        };

        match name {
            "name" => text(&self.name),
            "version" => text(&self.version),
            "author" => text(&self.author),
            "author_email" => text(&self.author_email),
            "maintainer" => text(&self.maintainer),
            "maintainer_email" => text(&self.maintainer_email),
            "url" => text(&self.url),
            "license" => text(&self.license),
            "description" => text(&self.description),
            "long_description" => text(&self.long_description),
            "keywords" => text(&self.keywords),
            "platforms" => list(&self.platforms),
            "fullname" => Some(self.fullname()),
            "contact" => self.contact().map(str::to_string),
            "contact_email" => self.contact_email().map(str::to_string),
            "classifiers" => list(&self.classifiers),
            "download_url" => text(&self.download_url),
            "provides" => list(&self.provides),
            "requires" => list(&self.requires),
            "obsoletes" => list(&self.obsoletes),
            "summary" => text(&self.summary),
            "home_page" => text(&self.home_page),
            _ => None,
        }
    }
}

/// Reads the non-derived attributes off `data` into a flat text mapping.
///
/// Unset values and the `UNKNOWN` sentinel both become `""`.
pub fn standardize(data: &DistMetadata) -> RawMetadata {
    ATTRIBUTE_NAMES
        .iter()
        .filter(|name| !DERIVED_ATTRIBUTES.contains(name))
        .chain(IMPLICIT_ATTRIBUTES.iter())
        .map(|name| {
            let value = data
                .attribute(name)
                .filter(|value| value != UNKNOWN)
                .unwrap_or_default();
            (name.to_string(), Value::String(value))
        })
        .collect()
}

/// The keymap for build-tool metadata, adjusted for the rendering `standardized` came from.
fn dist_keymap(standardized: &RawMetadata) -> KeyMap {
    let mut keymap: KeyMap = [
        ("summary", "title"),
        ("description", "title"),
        ("long_description", "notes"),
        ("keywords", "tags"),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect();

    if has_text(standardized, "summary") {
        debug!("summary present, treating metadata as frozen PKG-INFO rendering");
        keymap.insert("description".into(), "notes".into());
    } else {
        keymap.remove("summary");
    }

    keymap
}

/// Converts build-tool distribution metadata into a canonical package.
pub fn from_dist_metadata(data: &DistMetadata) -> Result<Package, DatapkgError> {
    let mut inmeta = standardize(data);
    let keymap = dist_keymap(&inmeta);

    if has_text(&inmeta, "home_page") {
        if let Some(home_page) = inmeta.remove("home_page") {
            inmeta.insert("url".into(), home_page);
        }
    }

    normalize(&inmeta, &keymap)
}

/// Renders a canonical package as live-form distribution metadata.
///
/// Extras have no place in the build tool's schema and are not carried.
pub fn to_dist_metadata(package: &Package) -> DistMetadata {
    DistMetadata {
        name: Some(package.name.clone()),
        version: package.version.clone(),
        author: package.author.clone(),
        author_email: package.author_email.clone(),
        maintainer: package.maintainer.clone(),
        maintainer_email: package.maintainer_email.clone(),
        url: package.url.clone(),
        license: package.license.clone(),
        description: package.title.clone(),
        long_description: package.notes.clone(),
        keywords: if package.tags.is_empty() {
            None
        } else {
            Some(package.tags.join(","))
        },
        download_url: package.download_url.clone(),
        ..Default::default()
    }
}

/// Parses a frozen `PKG-INFO` record.
///
/// # Errors
/// Returns an error if a header line is not of the form `Key: value`.
pub fn parse_pkg_info(text: &str) -> Result<DistMetadata, DatapkgError> {
    parse_pkg_info_at(text, Path::new("<string>"))
}

/// Reads a `PKG-INFO` file from disk.
pub fn read_pkg_info(path: &Path) -> Result<DistMetadata, DatapkgError> {
    let text = std::fs::read_to_string(path)?;
    parse_pkg_info_at(&text, path)
}

fn parse_pkg_info_at(text: &str, path: &Path) -> Result<DistMetadata, DatapkgError> {
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut lines = text.lines().enumerate();
    let mut body = Vec::new();

    for (index, line) in lines.by_ref() {
        if line.is_empty() {
            break;
        }

        // Indented lines, whitespace-only ones included, continue the previous header.
        if line.starts_with([' ', '\t']) {
            let Some((_, value)) = headers.last_mut() else {
                return Err(DatapkgError::PkgInfoParse {
                    path: path.to_path_buf(),
                    line: index + 1,
                    message: "continuation line before any header".into(),
                });
            };
            value.push('\n');
            value.push_str(strip_continuation(line));
            continue;
        }

        let (key, value) = line.split_once(':').ok_or_else(|| DatapkgError::PkgInfoParse {
            path: path.to_path_buf(),
            line: index + 1,
            message: format!("expected 'Key: value', found '{line}'"),
        })?;
        headers.push((key.trim().to_ascii_lowercase(), value.trim().to_string()));
    }

    body.extend(lines.map(|(_, line)| line));

    let mut data = DistMetadata::default();
    for (key, value) in headers {
        match key.as_str() {
            "name" => data.name = Some(value),
            "version" => data.version = Some(value),
            "summary" => data.summary = Some(value),
            "home-page" => data.home_page = Some(value),
            "author" => data.author = Some(value),
            "author-email" => data.author_email = Some(value),
            "maintainer" => data.maintainer = Some(value),
            "maintainer-email" => data.maintainer_email = Some(value),
            "license" => data.license = Some(value),
            "description" => data.description = Some(value),
            "keywords" => data.keywords = Some(value),
            "download-url" => data.download_url = Some(value),
            "platform" => data.platforms.push(value),
            "classifier" => data.classifiers.push(value),
            "provides" => data.provides.push(value),
            "requires" => data.requires.push(value),
            "obsoletes" => data.obsoletes.push(value),
            other => debug!(header = other, "ignoring PKG-INFO header"),
        }
    }

    let body = body.join("\n");
    let body = body.trim();
    if data.description.is_none() && !body.is_empty() {
        data.description = Some(body.to_string());
    }

    Ok(data)
}

/// Strips the indentation (and the optional `|` marker) from a continuation line.
fn strip_continuation(line: &str) -> &str {
    let stripped = line.trim_start_matches([' ', '\t']);
    stripped.strip_prefix('|').unwrap_or(stripped)
}

fn has_text(metadata: &RawMetadata, key: &str) -> bool {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|value| !value.is_empty())
}
