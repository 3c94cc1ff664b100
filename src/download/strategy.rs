//! Resource downloader strategies.
//!
//! A package downloader holds an ordered chain of strategies. Each resource
//! is offered to them in turn; the first one that claims it owns it, whether
//! or not its transfer then succeeds.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::transfer::{Transfer, UrlTransfer};
use crate::error::DatapkgError;
use crate::metadata::Resource;

/// Configuration name of [`SimpleDownloader`].
pub const SIMPLE: &str = "simple";

/// Format types that describe an access protocol rather than a file.
const ACCESS_PROTOCOL_TYPES: &[&str] = &["api", "services"];

/// What a strategy did with a resource it was offered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// Not this strategy's kind of resource; try the next one.
    Declined,
    /// Claimed and written to the given path.
    Retrieved(PathBuf),
    /// Claimed, but the transfer failed.
    Failed(String),
}

impl StrategyOutcome {
    /// Returns true if the strategy took ownership of the resource.
    pub fn is_claimed(&self) -> bool {
        !matches!(self, StrategyOutcome::Declined)
    }
}

/// A strategy able to retrieve (or access) some kinds of resources.
pub trait ResourceDownloader {
    /// Stable name, as used in downloader configuration lists.
    fn name(&self) -> &str;

    /// Offers `resource` to this strategy.
    ///
    /// Returns [`StrategyOutcome::Declined`] to let the next strategy try.
    fn try_download(&self, resource: &Resource, destination: &Path) -> StrategyOutcome;
}

/// Retrieves every resource that is a plain file by transferring its url.
///
/// Resources whose format type (the text before the first `/`) is `api` or
/// `services` are declined.
#[derive(Clone, Debug, Default)]
pub struct SimpleDownloader<T = UrlTransfer> {
    transfer: T,
}

impl<T: Transfer> SimpleDownloader<T> {
    pub fn new(transfer: T) -> Self {
        Self { transfer }
    }
}

impl<T: Transfer> ResourceDownloader for SimpleDownloader<T> {
    fn name(&self) -> &str {
        SIMPLE
    }

    fn try_download(&self, resource: &Resource, destination: &Path) -> StrategyOutcome {
        let format_type = resource.format_str().split('/').next().unwrap_or_default();
        if ACCESS_PROTOCOL_TYPES.contains(&format_type) {
            return StrategyOutcome::Declined;
        }

        match self.transfer.fetch(&resource.url, destination) {
            Ok(path) => StrategyOutcome::Retrieved(path),
            Err(err) => {
                warn!(url = %resource.url, error = %err, "transfer failed");
                StrategyOutcome::Failed(err.to_string())
            }
        }
    }
}

/// Builds the downloader chain named by `names`, preserving their order.
///
/// # Errors
/// Returns an error for any name that is not a known downloader.
pub fn downloaders_from_names(
    names: &[String],
    transfer: &UrlTransfer,
) -> Result<Vec<Box<dyn ResourceDownloader>>, DatapkgError> {
    names
        .iter()
        .map(|name| -> Result<Box<dyn ResourceDownloader>, DatapkgError> {
            match name.trim() {
                SIMPLE => Ok(Box::new(SimpleDownloader::new(transfer.clone()))),
                other => Err(DatapkgError::UnknownDownloader(other.to_string())),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingTransfer {
        fetched: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Transfer for RecordingTransfer {
        fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, DatapkgError> {
            self.fetched.borrow_mut().push(url.to_string());
            if self.fail {
                Err(DatapkgError::Transfer {
                    url: url.to_string(),
                    message: "connection refused".into(),
                })
            } else {
                Ok(destination.join("file"))
            }
        }
    }

    #[test]
    fn declines_access_protocol_formats() {
        let downloader = SimpleDownloader::new(RecordingTransfer::default());
        let dest = Path::new("/tmp/unused");

        for format in ["api/rest", "api", "services/wms"] {
            let resource = Resource::new("http://x/endpoint").with_format(format);
            let outcome = downloader.try_download(&resource, dest);
            assert_eq!(outcome, StrategyOutcome::Declined, "format {format}");
            assert!(!outcome.is_claimed());
        }
        assert!(downloader.transfer.fetched.borrow().is_empty());
    }

    #[test]
    fn claims_files_and_transfers_url() {
        let downloader = SimpleDownloader::new(RecordingTransfer::default());
        let resource = Resource::new("http://x/a.csv").with_format("csv");

        let outcome = downloader.try_download(&resource, Path::new("/dest"));

        assert_eq!(outcome, StrategyOutcome::Retrieved(Path::new("/dest/file").into()));
        assert!(outcome.is_claimed());
        assert_eq!(*downloader.transfer.fetched.borrow(), vec!["http://x/a.csv"]);
    }

    #[test]
    fn claims_resources_without_format() {
        let downloader = SimpleDownloader::new(RecordingTransfer::default());
        let outcome = downloader.try_download(&Resource::new("http://x/a"), Path::new("/d"));
        assert!(outcome.is_claimed());
    }

    #[test]
    fn transfer_failure_is_claimed_but_failed() {
        let downloader = SimpleDownloader::new(RecordingTransfer {
            fail: true,
            ..Default::default()
        });
        let resource = Resource::new("http://x/a.csv").with_format("csv");

        let outcome = downloader.try_download(&resource, Path::new("/dest"));

        assert!(outcome.is_claimed());
        match outcome {
            StrategyOutcome::Failed(message) => assert!(message.contains("connection refused")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn downloaders_from_names_preserves_order_and_rejects_unknown() {
        let transfer = UrlTransfer::new();
        let chain =
            downloaders_from_names(&["simple".into(), " simple ".into()], &transfer).expect("chain");
        assert_eq!(chain.len(), 2);
        assert!(chain.iter().all(|d| d.name() == "simple"));

        let err = downloaders_from_names(&["ckan".into()], &transfer)
            .err()
            .expect("unknown downloader");
        assert!(matches!(err, DatapkgError::UnknownDownloader(name) if name == "ckan"));
    }
}
