use anyhow::{Context, Result, bail};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// How many times a failed request is retried and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Runs `operation` until it succeeds or `1 + retries` attempts have failed,
    /// returning the last error.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(val) => return Ok(val),
                Err(err) if attempt > self.retries => return Err(err),
                Err(err) => {
                    debug!(
                        "Attempt {}/{} failed: {:#}. Retrying...",
                        attempt,
                        self.retries + 1,
                        err
                    );
                    attempt += 1;
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}

/// GETs `url`, retrying transport failures and 5xx responses.
///
/// Other non-success statuses are returned to the caller untouched.
pub async fn get_with_retry(
    client: &reqwest::Client,
    url: &str,
    policy: RetryPolicy,
) -> Result<reqwest::Response> {
    policy
        .run(move || async move {
            let response = client
                .get(url)
                .send()
                .await
                .with_context(|| format!("Request error for {url}"))?;
            if response.status().is_server_error() {
                bail!("HTTP error: {} for {}", response.status(), url);
            }
            Ok(response)
        })
        .await
}
