use std::path::PathBuf;
use thiserror::Error;

use crate::download::DownloadReport;

/// The main error type for datapkg operations.
#[derive(Debug, Error)]
pub enum DatapkgError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse metadata JSON from {path}: {source}")]
    MetadataJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write metadata JSON to {path}: {source}")]
    MetadataJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid metadata field '{field}': {message}")]
    MetadataInvalid { field: String, message: String },

    #[error("Failed to parse PKG-INFO {path} at line {line}: {message}")]
    PkgInfoParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Package source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Unsupported package source: {0}")]
    UnsupportedSource(String),

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Unknown resource downloader '{0}' (known: simple)")]
    UnknownDownloader(String),

    #[error("Failed to transfer {url}: {message}")]
    Transfer { url: String, message: String },

    #[error("Download incomplete: {failed} failed and {unhandled} unhandled resource(s)")]
    DownloadIncomplete {
        failed: usize,
        unhandled: usize,
        report: DownloadReport,
    },
}
