//! HTTP fetching with a single timeout and bounded-retry policy.
//!
//! Every remote strategy of a [`crate::DataSource`] goes through
//! [`fetch_text`], so a hanging or flaky server costs at most
//! `(1 + max_retries) × timeout` plus the backoff delays before the
//! loader moves on to the next strategy.

use std::time::Duration;

use crate::FeatureError;

/// Timeout and retry settings shared by all remote fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub initial_backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 2,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl FetchPolicy {
    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(factor)
    }

    /// Builds an HTTP client that applies this policy's timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Http`] if the client cannot be built.
    pub fn client(&self) -> Result<reqwest::Client, FeatureError> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

/// Fetches `url` and returns the response body as text.
///
/// Retries connection errors, timeouts, HTTP 429 and HTTP 5xx up to
/// `policy.max_retries` times with exponential backoff. Other 4xx
/// responses are permanent and returned immediately.
///
/// # Errors
///
/// Returns [`FeatureError`] if the request fails after all retries or the
/// server returns a non-retryable status.
pub async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    policy: &FetchPolicy,
) -> Result<String, FeatureError> {
    let mut last_error: Option<FeatureError> = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.backoff_for(attempt);
            log::warn!("  retry {attempt}/{} in {delay:?}...", policy.max_retries);
            tokio::time::sleep(delay).await;
        }

        let response = match client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                if is_transient(&e) && attempt < policy.max_retries {
                    log::warn!("  transient error fetching {url}: {e}");
                    last_error = Some(FeatureError::Http(e));
                    continue;
                }
                return Err(FeatureError::Http(e));
            }
        };

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            if attempt < policy.max_retries {
                log::warn!("  HTTP {status} from {url}");
                last_error = Some(FeatureError::Fetch {
                    message: format!("HTTP {status} from {url}"),
                });
                continue;
            }
            return Err(FeatureError::Fetch {
                message: format!(
                    "HTTP {status} from {url} after {} retries",
                    policy.max_retries
                ),
            });
        }

        if !status.is_success() {
            return Err(FeatureError::Fetch {
                message: format!("HTTP {status} from {url}"),
            });
        }

        return Ok(response.text().await?);
    }

    Err(last_error.unwrap_or_else(|| FeatureError::Fetch {
        message: format!("request to {url} failed after all retries"),
    }))
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}
