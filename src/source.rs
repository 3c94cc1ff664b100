//! Resolving a source specifier into a package.
//!
//! Sources are local: a metadata file, or a directory holding one. A
//! `file://` prefix is accepted and stripped.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::DatapkgError;
use crate::metadata::distutils::read_pkg_info;
use crate::metadata::io_json::read_package_json;
use crate::metadata::{from_dist_metadata, DistMetadata, Package};

/// File names probed, in order, when the source is a directory.
const DIRECTORY_CANDIDATES: &[&str] = &["metadata.json", "PKG-INFO"];

/// How to read a package source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceFormat {
    /// Decide from the path.
    #[default]
    Auto,
    /// A JSON metadata object in (or near) the canonical vocabulary.
    Json,
    /// A frozen `PKG-INFO` distribution record.
    PkgInfo,
    /// A live distribution descriptor serialized as JSON.
    DistJson,
}

impl SourceFormat {
    /// Human-readable name for the format.
    pub fn name(&self) -> &'static str {
        match self {
            SourceFormat::Auto => "auto",
            SourceFormat::Json => "json",
            SourceFormat::PkgInfo => "pkg-info",
            SourceFormat::DistJson => "dist-json",
        }
    }
}

/// Loads the package a source specifier points at.
///
/// # Errors
/// Returns an error if the source is remote, missing, or cannot be read as
/// the requested format.
pub fn load_package(specifier: &str, format: SourceFormat) -> Result<Package, DatapkgError> {
    let path = local_path(specifier)?;
    if !path.exists() {
        return Err(DatapkgError::SourceNotFound(path));
    }

    let path = if path.is_dir() {
        find_metadata_file(&path)?
    } else {
        path
    };

    let format = match format {
        SourceFormat::Auto => detect_format(&path)?,
        explicit => explicit,
    };
    debug!(path = %path.display(), format = format.name(), "loading package source");

    match format {
        SourceFormat::Json | SourceFormat::Auto => read_package_json(&path),
        SourceFormat::PkgInfo => from_dist_metadata(&read_pkg_info(&path)?),
        SourceFormat::DistJson => from_dist_metadata(&read_dist_json(&path)?),
    }
}

fn local_path(specifier: &str) -> Result<PathBuf, DatapkgError> {
    if let Some(rest) = specifier.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if specifier.contains("://") {
        return Err(DatapkgError::UnsupportedSource(format!(
            "'{specifier}' (only local paths and file:// sources are supported)"
        )));
    }
    Ok(PathBuf::from(specifier))
}

fn find_metadata_file(dir: &Path) -> Result<PathBuf, DatapkgError> {
    DIRECTORY_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| {
            DatapkgError::UnsupportedSource(format!(
                "directory {} contains none of: {}",
                dir.display(),
                DIRECTORY_CANDIDATES.join(", ")
            ))
        })
}

fn detect_format(path: &Path) -> Result<SourceFormat, DatapkgError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if file_name == "pkg-info" || file_name.ends_with(".pkg-info") {
        Ok(SourceFormat::PkgInfo)
    } else if file_name == "setup.json" {
        Ok(SourceFormat::DistJson)
    } else if file_name.ends_with(".json") {
        Ok(SourceFormat::Json)
    } else {
        Err(DatapkgError::UnsupportedSource(format!(
            "cannot tell the metadata format of {} (pass --source-format)",
            path.display()
        )))
    }
}

fn read_dist_json(path: &Path) -> Result<DistMetadata, DatapkgError> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| DatapkgError::MetadataJsonParse {
        path: path.to_path_buf(),
        source,
    })
}
