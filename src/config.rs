//! Runtime configuration and service construction.
//!
//! Configuration values come from the command line (or their environment
//! variable fallbacks); services such as the HTTP client and the retry
//! controller are built from it here.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;

use crate::controller::RetryController;
use crate::fetcher::{DEFAULT_API_URL, SwapiFetcher};
use crate::http::HttpClient;
use crate::retry::RetryPolicy;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("filmreel/", env!("FILMREEL_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Films endpoint
    pub api_url: String,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Build a configuration, falling back to defaults for unset values.
    pub fn new(
        api_url: Option<String>,
        retry_interval_secs: Option<u64>,
        max_attempts: Option<NonZeroU32>,
    ) -> Result<Self> {
        let defaults = Self::default();

        let api_url = api_url.unwrap_or(defaults.api_url);
        reqwest::Url::parse(&api_url).with_context(|| format!("Invalid API URL: {}", api_url))?;

        let interval = retry_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.retry.interval);
        if interval.is_zero() {
            anyhow::bail!("Retry interval must be at least one second");
        }

        Ok(Self {
            api_url,
            retry: RetryPolicy::new(interval, max_attempts),
        })
    }
}

/// Build the HTTP client used for all requests.
pub fn build_http_client() -> Result<HttpClient> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    Ok(HttpClient::new(client))
}

/// Build the SWAPI fetcher from configuration.
pub fn build_fetcher(config: &Config) -> Result<SwapiFetcher> {
    let http_client = build_http_client()?;
    Ok(SwapiFetcher::from_http_client(http_client, &config.api_url))
}

/// Build a retry controller driving the SWAPI fetcher.
pub fn build_controller(config: &Config) -> Result<RetryController> {
    let fetcher = build_fetcher(config)?;
    debug!(
        "Fetching from {} (retry every {:?}, max attempts {:?})",
        fetcher.api_url(),
        config.retry.interval,
        config.retry.max_attempts
    );
    Ok(RetryController::new(fetcher, config.retry))
}
