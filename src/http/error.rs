//! Classification of failed fetches.

use thiserror::Error;

/// Why a fetch failed.
///
/// The retry controller treats every variant the same way; the cause is
/// kept for logging and for callers that want to report it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, timeout, reset)
    #[error("request failed: {0}")]
    Request(String),
    /// The server answered with a non-success status
    #[error("server responded with HTTP {0}")]
    Status(u16),
    /// The body was not the expected JSON document
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return FetchError::Status(status.as_u16());
        }
        if error.is_decode() {
            return FetchError::Malformed(error.to_string());
        }
        FetchError::Request(error.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        FetchError::Malformed(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status(503);
        assert_eq!(err.to_string(), "server responded with HTTP 503");

        let err = FetchError::Request("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));

        let err = FetchError::Malformed("missing field `title`".to_string());
        assert!(err.to_string().starts_with("malformed response"));
    }

    #[test]
    fn test_from_serde_json_error_is_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(FetchError::from(err), FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_from_reqwest_status_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("GET", "/").with_status(404).create_async().await;

        let client = reqwest::Client::new();
        let response = client.get(server.url()).send().await.unwrap();
        let err = response.error_for_status().unwrap_err();

        assert_eq!(FetchError::from(err), FetchError::Status(404));
    }

    #[tokio::test]
    async fn test_from_reqwest_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("GET", "/").with_status(500).create_async().await;

        let client = reqwest::Client::new();
        let response = client.get(server.url()).send().await.unwrap();
        let err = response.error_for_status().unwrap_err();

        assert_eq!(FetchError::from(err), FetchError::Status(500));
    }

    #[tokio::test]
    async fn test_from_reqwest_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let response = client.get(server.url()).send().await.unwrap();
        let err = response.json::<serde_json::Value>().await.unwrap_err();

        assert!(matches!(FetchError::from(err), FetchError::Malformed(_)));
    }
}
