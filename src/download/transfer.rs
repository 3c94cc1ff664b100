//! Low-level transfer of a single url into a directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
#[cfg(feature = "http")]
use std::{fs::File, io};

use tracing::debug;
use url::Url;

use crate::error::DatapkgError;

/// File name used when a url has no usable last path segment.
const FALLBACK_FILE_NAME: &str = "download";

/// Fetches the content behind a url into a destination directory.
pub trait Transfer {
    /// Fetches `url` into `destination`, returning the path of the written file.
    fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, DatapkgError>;
}

/// Transfers `file://` urls, bare local paths, and (with the `http` feature)
/// `http(s)://` urls.
///
/// A partially written file is removed when the transfer fails. Clones share
/// one HTTP agent, so connections are pooled across a whole batch.
#[derive(Clone, Debug)]
pub struct UrlTransfer {
    timeout: Option<Duration>,
    #[cfg(feature = "http")]
    agent: ureq::Agent,
}

impl UrlTransfer {
    pub fn new() -> Self {
        Self {
            timeout: None,
            #[cfg(feature = "http")]
            agent: build_agent(None),
        }
    }

    /// Limits each HTTP request to `timeout` overall.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        #[cfg(feature = "http")]
        {
            self.agent = build_agent(timeout);
        }
        self
    }

    /// The overall per-request HTTP timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn copy_local(
        &self,
        url: &str,
        source: &Path,
        destination: &Path,
    ) -> Result<PathBuf, DatapkgError> {
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
        let target = destination.join(file_name);

        debug!(source = %source.display(), target = %target.display(), "copying local resource");
        fs::copy(source, &target).map_err(|err| {
            let _ = fs::remove_file(&target);
            transfer_error(url, err)
        })?;

        Ok(target)
    }

    #[cfg(feature = "http")]
    fn fetch_http(&self, parsed: &Url, destination: &Path) -> Result<PathBuf, DatapkgError> {
        let target = destination.join(file_name_for(parsed));
        debug!(url = %parsed, target = %target.display(), "fetching remote resource");

        let mut response = self
            .agent
            .get(parsed.as_str())
            .call()
            .map_err(|source| transfer_error(parsed.as_str(), source))?;

        let result = File::create(&target).and_then(|mut file| {
            io::copy(&mut response.body_mut().as_reader(), &mut file).map(|_| ())
        });
        if let Err(err) = result {
            let _ = fs::remove_file(&target);
            return Err(transfer_error(parsed.as_str(), err));
        }

        Ok(target)
    }

    #[cfg(not(feature = "http"))]
    fn fetch_http(&self, parsed: &Url, _destination: &Path) -> Result<PathBuf, DatapkgError> {
        Err(transfer_error(
            parsed.as_str(),
            "datapkg was built without HTTP support (enable the `http` feature)",
        ))
    }
}

impl Default for UrlTransfer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
fn build_agent(timeout: Option<Duration>) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(timeout)
        .build();
    config.into()
}

impl Transfer for UrlTransfer {
    fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, DatapkgError> {
        fs::create_dir_all(destination)?;

        match Url::parse(url) {
            Ok(parsed) => match parsed.scheme() {
                "file" => {
                    let source = parsed
                        .to_file_path()
                        .map_err(|()| transfer_error(url, "file url has no local path"))?;
                    self.copy_local(url, &source, destination)
                }
                "http" | "https" => self.fetch_http(&parsed, destination),
                other => Err(transfer_error(url, format!("unsupported scheme '{other}'"))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.copy_local(url, Path::new(url), destination)
            }
            Err(source) => Err(transfer_error(url, format!("invalid url: {source}"))),
        }
    }
}

/// The local file name for a url: its last non-empty path segment.
pub fn file_name_for(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

fn transfer_error(url: &str, message: impl ToString) -> DatapkgError {
    DatapkgError::Transfer {
        url: url.to_string(),
        message: message.to_string(),
    }
}
