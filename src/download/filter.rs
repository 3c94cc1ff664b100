//! Resource inclusion filters.

use glob::{MatchOptions, Pattern};

use crate::error::DatapkgError;
use crate::metadata::Resource;

/// Decides whether a resource takes part in a download batch.
///
/// `ordinal` is the zero-based position of the resource in its package.
/// Any `Fn(&Resource, usize) -> bool` closure is a filter.
pub trait ResourceFilter {
    fn accepts(&self, resource: &Resource, ordinal: usize) -> bool;
}

impl<F> ResourceFilter for F
where
    F: Fn(&Resource, usize) -> bool,
{
    fn accepts(&self, resource: &Resource, ordinal: usize) -> bool {
        self(resource, ordinal)
    }
}

/// Accepts every resource.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl ResourceFilter for AcceptAll {
    fn accepts(&self, _resource: &Resource, _ordinal: usize) -> bool {
        true
    }
}

/// Matches the resource format and url against two glob patterns.
///
/// Both patterns must match; the default filter has no patterns and matches
/// everything. `*` also matches `/`, so `xml/*` and `http://abc*`
/// behave as shell-style wildcards over the whole string. Format matching
/// ignores case (`csv` selects `CSV`); url matching does not.
#[derive(Clone, Debug, Default)]
pub struct GlobFilter {
    format: Option<Pattern>,
    url: Option<Pattern>,
}

impl GlobFilter {
    /// Builds a filter from a format pattern and a url pattern.
    ///
    /// # Errors
    /// Returns an error if either pattern is not a valid glob.
    pub fn new(format_pattern: &str, url_pattern: &str) -> Result<Self, DatapkgError> {
        Ok(Self {
            format: Some(compile(format_pattern)?),
            url: Some(compile(url_pattern)?),
        })
    }
}

impl ResourceFilter for GlobFilter {
    fn accepts(&self, resource: &Resource, _ordinal: usize) -> bool {
        let format_options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };

        let format_ok = self
            .format
            .as_ref()
            .is_none_or(|pattern| pattern.matches_with(resource.format_str(), format_options));
        let url_ok = self
            .url
            .as_ref()
            .is_none_or(|pattern| pattern.matches_with(&resource.url, MatchOptions::new()));

        format_ok && url_ok
    }
}

fn compile(pattern: &str) -> Result<Pattern, DatapkgError> {
    Pattern::new(pattern).map_err(|source| DatapkgError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
