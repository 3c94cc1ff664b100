//! Package download orchestration.
//!
//! Downloading a package means writing its canonical metadata to a
//! destination directory and then sweeping its resources in order:
//!
//! 1. The filter decides whether a resource takes part (by resource and
//!    ordinal position).
//! 2. Accepted resources are offered to the downloader chain; the first
//!    strategy that claims a resource owns it.
//! 3. Every outcome is recorded; nothing aborts the batch.
//!
//! Only failures to create the destination or write metadata are returned
//! as errors.

pub mod filter;
pub mod report;
pub mod sink;
pub mod strategy;
pub mod transfer;

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

pub use filter::{AcceptAll, GlobFilter, ResourceFilter};
pub use report::{DownloadReport, DownloadStatus, ResourceOutcome, ResourceReport};
pub use sink::{JsonMetadataSink, MetadataSink, METADATA_FILE_NAME};
pub use strategy::{downloaders_from_names, ResourceDownloader, SimpleDownloader, StrategyOutcome};
pub use transfer::{Transfer, UrlTransfer};

use crate::error::DatapkgError;
use crate::metadata::{Package, Resource};

/// Downloads packages: metadata plus resources.
pub struct PackageDownloader {
    downloaders: Vec<Box<dyn ResourceDownloader>>,
    sink: Box<dyn MetadataSink>,
}

impl PackageDownloader {
    /// Creates a downloader trying `downloaders` in the given order.
    pub fn new(downloaders: Vec<Box<dyn ResourceDownloader>>, sink: Box<dyn MetadataSink>) -> Self {
        Self { downloaders, sink }
    }

    /// Names of the configured strategies, in the order they are tried.
    pub fn downloader_names(&self) -> Vec<&str> {
        self.downloaders.iter().map(|d| d.name()).collect()
    }

    /// Downloads `package` into `destination`.
    ///
    /// `filter` selects which resources to retrieve; `None` retrieves all.
    ///
    /// # Errors
    /// Returns an error only if the destination cannot be created or the
    /// metadata cannot be written. Per-resource problems are recorded in the
    /// returned report.
    pub fn download(
        &self,
        package: &Package,
        destination: &Path,
        filter: Option<&dyn ResourceFilter>,
    ) -> Result<DownloadStatus, DatapkgError> {
        let filter = filter.unwrap_or(&AcceptAll);
        info!(package = %package.name, destination = %destination.display(), "downloading package");

        if package.resources.is_empty() {
            warn!(package = %package.name, "no resources to download for package");
            return Ok(DownloadStatus::NoResources);
        }

        fs::create_dir_all(destination)?;
        let mut report = DownloadReport::new(&package.name, destination);
        report.metadata_path = self.sink.write(package, destination)?;
        debug!(path = %report.metadata_path.display(), "wrote package metadata");

        for (ordinal, resource) in package.resources.iter().enumerate() {
            let outcome = if filter.accepts(resource, ordinal) {
                self.download_resource(resource, ordinal, destination)
            } else {
                debug!(ordinal, url = %resource.url, "skipping package resource");
                ResourceOutcome::Skipped
            };

            report.add(ResourceReport {
                ordinal,
                url: resource.url.clone(),
                outcome,
            });
        }

        Ok(DownloadStatus::Completed(report))
    }

    /// Offers one resource to the downloader chain.
    ///
    /// Never fails: a resource no strategy claims is reported as
    /// [`ResourceOutcome::Unhandled`].
    pub fn download_resource(
        &self,
        resource: &Resource,
        ordinal: usize,
        destination: &Path,
    ) -> ResourceOutcome {
        info!(ordinal, url = %resource.url, "downloading package resource");

        for downloader in &self.downloaders {
            match downloader.try_download(resource, destination) {
                StrategyOutcome::Declined => continue,
                StrategyOutcome::Retrieved(path) => {
                    return ResourceOutcome::Retrieved {
                        strategy: downloader.name().to_string(),
                        path,
                    }
                }
                StrategyOutcome::Failed(message) => {
                    return ResourceOutcome::Failed {
                        strategy: downloader.name().to_string(),
                        message,
                    }
                }
            }
        }

        warn!(ordinal, url = %resource.url, format = resource.format_str(), "unable to retrieve resource");
        ResourceOutcome::Unhandled
    }
}

/// The directory a package is downloaded into: `<root>/<package name>`.
///
/// # Errors
/// Returns an error if the name is not a single plain path component
/// (absolute, containing separators, `.` or `..`), since it would place the
/// download outside `root`.
pub fn package_destination(root: &Path, package: &Package) -> Result<PathBuf, DatapkgError> {
    let mut components = Path::new(&package.name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Ok(root.join(name)),
        _ => Err(DatapkgError::MetadataInvalid {
            field: "name".into(),
            message: format!(
                "'{}' cannot be used as a directory name under {}",
                package.name,
                root.display()
            ),
        }),
    }
}

impl Default for PackageDownloader {
    /// The simple downloader over [`UrlTransfer`], writing JSON metadata.
    fn default() -> Self {
        Self::new(
            vec![Box::new(SimpleDownloader::new(UrlTransfer::new()))],
            Box::new(JsonMetadataSink),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;
    use std::rc::Rc;

    /// Claims resources whose format starts with `prefix`, logging every offer.
    struct PrefixStrategy {
        name: &'static str,
        prefix: &'static str,
        offers: Rc<RefCell<Vec<(&'static str, String)>>>,
    }

    impl ResourceDownloader for PrefixStrategy {
        fn name(&self) -> &str {
            self.name
        }

        fn try_download(&self, resource: &Resource, destination: &Path) -> StrategyOutcome {
            self.offers
                .borrow_mut()
                .push((self.name, resource.url.clone()));
            if resource.format_str().starts_with(self.prefix) {
                StrategyOutcome::Retrieved(destination.join(&resource.url))
            } else {
                StrategyOutcome::Declined
            }
        }
    }

    #[derive(Clone, Default)]
    struct CountingSink {
        writes: Rc<Cell<usize>>,
    }

    impl MetadataSink for CountingSink {
        fn write(&self, _package: &Package, destination: &Path) -> Result<PathBuf, DatapkgError> {
            self.writes.set(self.writes.get() + 1);
            Ok(destination.join(METADATA_FILE_NAME))
        }
    }

    fn chain(
        specs: &[(&'static str, &'static str)],
    ) -> (Vec<Box<dyn ResourceDownloader>>, Rc<RefCell<Vec<(&'static str, String)>>>) {
        let offers = Rc::new(RefCell::new(Vec::new()));
        let downloaders = specs
            .iter()
            .map(|&(name, prefix)| {
                Box::new(PrefixStrategy {
                    name,
                    prefix,
                    offers: Rc::clone(&offers),
                }) as Box<dyn ResourceDownloader>
            })
            .collect();
        (downloaders, offers)
    }

    fn sample_package() -> Package {
        Package::new("gdp")
            .with_resource(Resource::new("a").with_format("csv"))
            .with_resource(Resource::new("b").with_format("json"))
    }

    fn completed(status: DownloadStatus) -> DownloadReport {
        match status {
            DownloadStatus::Completed(report) => report,
            DownloadStatus::NoResources => panic!("expected a completed download"),
        }
    }

    #[test]
    fn empty_package_returns_no_resources_without_side_effects() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (downloaders, offers) = chain(&[("any", "")]);
        let sink = CountingSink::default();
        let downloader = PackageDownloader::new(downloaders, Box::new(sink.clone()));

        let status = downloader
            .download(&Package::new("empty"), &dir.path().join("empty"), None)
            .expect("download");

        assert!(matches!(status, DownloadStatus::NoResources));
        assert_eq!(sink.writes.get(), 0);
        assert!(offers.borrow().is_empty());
        assert!(!dir.path().join("empty").exists());
    }

    #[test]
    fn glob_filter_dispatches_only_matching_resources() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (downloaders, offers) = chain(&[("any", "")]);
        let sink = CountingSink::default();
        let downloader = PackageDownloader::new(downloaders, Box::new(sink.clone()));
        let filter = GlobFilter::new("csv", "*").expect("filter");

        let report = completed(
            downloader
                .download(&sample_package(), dir.path(), Some(&filter))
                .expect("download"),
        );

        assert_eq!(sink.writes.get(), 1);
        assert_eq!(*offers.borrow(), vec![("any", "a".to_string())]);
        assert_eq!(report.retrieved_count(), 1);
        assert_eq!(report.resources[1].outcome, ResourceOutcome::Skipped);
    }

    #[test]
    fn first_claiming_strategy_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (downloaders, offers) = chain(&[("csv-only", "csv"), ("fallback", ""), ("never", "")]);
        let downloader = PackageDownloader::new(downloaders, Box::new(CountingSink::default()));

        let report = completed(
            downloader
                .download(&sample_package(), dir.path(), None)
                .expect("download"),
        );

        assert_eq!(
            *offers.borrow(),
            vec![
                ("csv-only", "a".to_string()),
                ("csv-only", "b".to_string()),
                ("fallback", "b".to_string()),
            ]
        );
        let strategies: Vec<_> = report
            .resources
            .iter()
            .map(|r| match &r.outcome {
                ResourceOutcome::Retrieved { strategy, .. } => strategy.as_str(),
                other => panic!("unexpected outcome: {other:?}"),
            })
            .collect();
        assert_eq!(strategies, vec!["csv-only", "fallback"]);
    }

    #[test]
    fn unhandled_resource_does_not_abort_batch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (downloaders, _offers) = chain(&[("json-only", "json")]);
        let downloader = PackageDownloader::new(downloaders, Box::new(CountingSink::default()));

        let report = completed(
            downloader
                .download(&sample_package(), dir.path(), None)
                .expect("download"),
        );

        assert_eq!(report.resources[0].outcome, ResourceOutcome::Unhandled);
        assert!(matches!(
            report.resources[1].outcome,
            ResourceOutcome::Retrieved { .. }
        ));
        assert!(!report.is_complete());
    }

    #[test]
    fn filter_sees_ordinals() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (downloaders, offers) = chain(&[("any", "")]);
        let downloader = PackageDownloader::new(downloaders, Box::new(CountingSink::default()));
        let second_only = |_: &Resource, ordinal: usize| ordinal == 1;

        downloader
            .download(&sample_package(), dir.path(), Some(&second_only))
            .expect("download");

        assert_eq!(*offers.borrow(), vec![("any", "b".to_string())]);
    }

    #[test]
    fn package_destination_stays_under_root() {
        let root = Path::new("/data/out");
        assert_eq!(
            package_destination(root, &Package::new("gdp")).expect("plain name"),
            root.join("gdp")
        );

        for name in ["../gdp", "/tmp/escaped", "a/b", "..", "."] {
            let err = package_destination(root, &Package::new(name)).expect_err(name);
            assert!(
                matches!(&err, DatapkgError::MetadataInvalid { field, .. } if field == "name"),
                "name {name}: {err:?}"
            );
        }
    }

    #[test]
    fn default_downloader_uses_simple_strategy() {
        assert_eq!(PackageDownloader::default().downloader_names(), vec!["simple"]);
    }
}
