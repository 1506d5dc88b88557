//! Data source resolution strategies.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use solar_map_feature_models::FeatureCollection;

use crate::fetch::{self, FetchPolicy};
use crate::{FeatureError, parse};

/// A single way of obtaining the feature dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceInput {
    /// An already-parsed JSON document.
    Inline(Value),
    /// A JSON document held as text.
    Json(String),
    /// A local `GeoJSON` file.
    Path(PathBuf),
    /// A remote `GeoJSON` document.
    Url(String),
}

impl SourceInput {
    /// Classifies a user-supplied string.
    ///
    /// Strings that look like JSON (`{` or `[` after trimming) are parsed
    /// in place, `http://` and `https://` strings are fetched, and
    /// everything else is treated as a file path.
    #[must_use]
    pub fn detect(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            Self::Json(input.to_string())
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }

    /// Resolves this strategy to a feature collection.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError`] if the input cannot be read, fetched or
    /// parsed, or if it contains no features.
    pub async fn resolve(
        &self,
        client: Option<&reqwest::Client>,
        policy: &FetchPolicy,
    ) -> Result<FeatureCollection, FeatureError> {
        let origin = self.to_string();
        let collection = match self {
            Self::Inline(value) => parse::parse_document(value.clone(), &origin)?,
            Self::Json(text) => parse::parse_str(text, &origin)?,
            Self::Path(path) => {
                if !path.is_file() {
                    return Err(FeatureError::Parse {
                        message: format!(
                            "{origin} is neither valid JSON nor a readable file"
                        ),
                    });
                }
                let text = tokio::fs::read_to_string(path).await?;
                parse::parse_str(&text, &origin)?
            }
            Self::Url(url) => {
                let owned;
                let client = if let Some(client) = client {
                    client
                } else {
                    owned = policy.client()?;
                    &owned
                };
                let text = fetch::fetch_text(client, url, policy).await?;
                parse::parse_str(&text, &origin)?
            }
        };

        if collection.is_empty() {
            return Err(FeatureError::EmptyData { origin });
        }

        Ok(collection)
    }
}

impl fmt::Display for SourceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(_) => write!(f, "inline data"),
            Self::Json(_) => write!(f, "JSON text"),
            Self::Path(path) => write!(f, "file {}", path.display()),
            Self::Url(url) => write!(f, "URL {url}"),
        }
    }
}

/// An ordered list of resolution strategies with one fetch policy.
#[derive(Debug, Clone)]
pub struct DataSource {
    strategies: Vec<SourceInput>,
    policy: FetchPolicy,
}

impl DataSource {
    /// Creates a data source with a single primary strategy.
    #[must_use]
    pub fn new(primary: SourceInput) -> Self {
        Self {
            strategies: vec![primary],
            policy: FetchPolicy::default(),
        }
    }

    /// Appends a fallback strategy, tried after all earlier ones fail.
    #[must_use]
    pub fn with_fallback(mut self, fallback: SourceInput) -> Self {
        self.strategies.push(fallback);
        self
    }

    /// Replaces the fetch policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The strategies in resolution order.
    #[must_use]
    pub fn strategies(&self) -> &[SourceInput] {
        &self.strategies
    }

    /// The fetch policy applied to remote strategies.
    #[must_use]
    pub const fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Tries each strategy in order and returns the first non-empty
    /// feature collection.
    ///
    /// # Errors
    ///
    /// Returns the error of the first strategy when every strategy fails.
    pub async fn load(&self) -> Result<FeatureCollection, FeatureError> {
        let client = if self
            .strategies
            .iter()
            .any(|s| matches!(s, SourceInput::Url(_)))
        {
            Some(self.policy.client()?)
        } else {
            None
        };

        let mut first_error: Option<FeatureError> = None;

        for (idx, strategy) in self.strategies.iter().enumerate() {
            log::info!(
                "Loading features from {strategy} ({}/{})",
                idx + 1,
                self.strategies.len()
            );
            match strategy.resolve(client.as_ref(), &self.policy).await {
                Ok(collection) => {
                    log::info!("Loaded {} features from {strategy}", collection.len());
                    return Ok(collection);
                }
                Err(e) => {
                    log::warn!("Failed to load features from {strategy}: {e}");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        Err(first_error.unwrap_or_else(|| FeatureError::EmptyData {
            origin: "an empty data source".to_string(),
        }))
    }
}
