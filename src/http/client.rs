//! Thin JSON-over-HTTP client.

use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::FetchError;

/// HTTP client performing single, non-retried requests.
///
/// Retrying is the job of the [`RetryController`](crate::controller::RetryController);
/// every call here is exactly one request/response cycle.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Performs a GET request and deserializes the JSON response.
    ///
    /// Any non-success status, transport failure, or body that does not
    /// deserialize into `T` is reported as a [`FetchError`].
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!("GET JSON from {}...", url);

        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;

        let body = response.bytes().await?;
        let result = serde_json::from_slice::<T>(&body)?;

        debug!("GET JSON from {}: {} bytes", url, body.len());
        Ok(result)
    }
}
