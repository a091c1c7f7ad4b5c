//! Movie fetching.
//!
//! This module defines the [`Movie`] model and the [`MovieSource`] trait the
//! retry controller drives. [`SwapiFetcher`] is the implementation backed by
//! the public Star Wars API.

mod swapi;

use async_trait::async_trait;
use serde::Serialize;

pub use crate::http::FetchError;
pub use swapi::{DEFAULT_API_URL, SwapiFetcher};

/// A film as presented to the user.
///
/// Each field is a direct projection of the corresponding raw field of the
/// API record. `id` is the episode number and is not unique across sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    /// Release date as an ISO 8601 calendar date (`YYYY-MM-DD`)
    pub release_date: String,
    pub opening_text: String,
}

/// Something that can produce the current list of movies.
///
/// One call is one fetch: implementations must not retry internally.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovieSource: Send + Sync {
    /// Fetch the full movie list, in source order.
    async fn fetch_movies(&self) -> Result<Vec<Movie>, FetchError>;
}
