//! JSON serialization for canonical package metadata.
//!
//! Reading goes through the normalization engine, so any JSON object is
//! accepted and a file written by [`write_package_json`] reads back to an
//! equal [`Package`].

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::model::{Package, RawMetadata};
use super::normalize::{normalize, KeyMap};
use crate::error::DatapkgError;

/// Reads and normalizes a package from a JSON metadata file.
///
/// # Errors
/// Returns an error if the file cannot be read, is not a JSON object, or
/// does not describe a valid package.
pub fn read_package_json(path: &Path) -> Result<Package, DatapkgError> {
    let file = File::open(path).map_err(DatapkgError::Io)?;
    let reader = BufReader::new(file);

    let raw: RawMetadata =
        serde_json::from_reader(reader).map_err(|source| DatapkgError::MetadataJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    normalize(&raw, &KeyMap::new())
}

/// Writes a package to a JSON metadata file.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_package_json(path: &Path, package: &Package) -> Result<(), DatapkgError> {
    let file = File::create(path).map_err(DatapkgError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, package).map_err(|source| {
        DatapkgError::MetadataJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.write_all(b"\n").map_err(DatapkgError::Io)?;
    writer.flush().map_err(DatapkgError::Io)
}

/// Reads and normalizes a package from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_json_str(json: &str) -> Result<Package, DatapkgError> {
    let raw: RawMetadata =
        serde_json::from_str(json).map_err(|source| DatapkgError::MetadataJsonParse {
            path: Path::new("<string>").to_path_buf(),
            source,
        })?;

    normalize(&raw, &KeyMap::new())
}

/// Writes a package to a JSON string.
pub fn to_json_string(package: &Package) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(package)
}
