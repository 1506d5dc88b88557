#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading of the solar customer `GeoJSON` dataset.
//!
//! A [`DataSource`] is an ordered list of resolution strategies (inline
//! JSON, a JSON string, a local file or a remote URL). Strategies are
//! tried in order until one yields a non-empty feature set. Remote
//! fetches share a single [`FetchPolicy`] with an explicit timeout and a
//! bounded number of retries.

pub mod fetch;
pub mod parse;
pub mod source;

pub use fetch::FetchPolicy;
pub use parse::{parse_document, parse_str};
pub use source::{DataSource, SourceInput};

use thiserror::Error;

/// Errors that can occur while resolving the feature dataset.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// The input was not valid JSON, or not a feature collection.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of what went wrong.
        message: String,
    },

    /// A remote fetch failed with a non-success status or after all
    /// retries were exhausted.
    #[error("Fetch error: {message}")]
    Fetch {
        /// Description of what went wrong.
        message: String,
    },

    /// The HTTP client failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The source resolved to zero features.
    #[error("No features found in {origin}")]
    EmptyData {
        /// Human-readable description of the source.
        origin: String,
    },

    /// A local file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeatureError {
    /// Whether this error came from the network layer.
    #[must_use]
    pub const fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Http(_))
    }
}
