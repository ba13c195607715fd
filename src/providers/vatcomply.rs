use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::config::VatComplyProviderConfig;
use crate::core::currency::{RateProvider, RateSnapshot, RateTable};
use crate::providers::util::{RetryPolicy, get_with_retry};

/// Fetches the latest reference rates from a vatcomply-compatible `/rates` endpoint.
pub struct VatComplyProvider {
    base_url: String,
    base: Option<String>,
    retry: RetryPolicy,
}

impl VatComplyProvider {
    pub fn new(config: &VatComplyProviderConfig) -> Self {
        VatComplyProvider {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            base: config.base.clone(),
            retry: RetryPolicy {
                retries: config.retries,
                delay: Duration::from_millis(config.retry_delay_ms),
            },
        }
    }

    fn rates_url(&self) -> String {
        match &self.base {
            Some(base) => format!("{}/rates?base={}", self.base_url, base.to_uppercase()),
            None => format!("{}/rates", self.base_url),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VatComplyResponse {
    date: String,
    base: String,
    rates: RateTable,
}

#[async_trait]
impl RateProvider for VatComplyProvider {
    #[instrument(name = "VatComplyRatesFetch", skip(self), fields(base = ?self.base))]
    async fn fetch_rates(&self) -> Result<RateSnapshot> {
        let url = self.rates_url();
        debug!("Requesting exchange rates from {}", url);

        let client = reqwest::Client::builder().user_agent("xfx/1.0").build()?;
        let response = get_with_retry(&client, &url, self.retry).await?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} for {}", response.status(), url));
        }

        let text = response.text().await?;
        let data: VatComplyResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse rates response from {}: {}", url, e))?;

        if data.rates.is_empty() {
            return Err(anyhow!("No rates found in response from {}", url));
        }

        debug!(
            base = %data.base,
            date = %data.date,
            count = data.rates.len(),
            "Received exchange rates"
        );
        Ok(RateSnapshot::new(data.base, data.date, data.rates))
    }
}
