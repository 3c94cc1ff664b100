//! Metadata sinks: where a package's canonical metadata is written.

use std::path::{Path, PathBuf};

use crate::error::DatapkgError;
use crate::metadata::io_json::write_package_json;
use crate::metadata::Package;

/// File name the JSON sink writes inside the destination directory.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Writes canonical package metadata into a destination directory.
pub trait MetadataSink {
    /// Writes `package` under `destination`, returning the written path.
    fn write(&self, package: &Package, destination: &Path) -> Result<PathBuf, DatapkgError>;
}

/// Writes metadata as pretty-printed JSON to `<destination>/metadata.json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonMetadataSink;

impl MetadataSink for JsonMetadataSink {
    fn write(&self, package: &Package, destination: &Path) -> Result<PathBuf, DatapkgError> {
        let path = destination.join(METADATA_FILE_NAME);
        write_package_json(&path, package)?;
        Ok(path)
    }
}
