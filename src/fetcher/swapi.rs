//! Star Wars API (swapi.dev) movie source.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;

use crate::http::{FetchError, HttpClient};

use super::{Movie, MovieSource};

/// Films endpoint of the public Star Wars API.
pub const DEFAULT_API_URL: &str = "https://swapi.dev/api/films/";

/// Format of `release_date` in API records.
const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

/// SWAPI response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct FilmList {
        pub results: Vec<Film>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Film {
        pub episode_id: i64,
        pub title: String,
        pub release_date: String,
        pub opening_crawl: String,
    }
}

/// Fetches films from a SWAPI-compatible endpoint.
pub struct SwapiFetcher {
    http_client: HttpClient,
    api_url: String,
}

impl SwapiFetcher {
    /// Create from an existing HttpClient.
    pub fn from_http_client(http_client: HttpClient, api_url: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.to_string(),
        }
    }

    /// The films endpoint this fetcher reads from.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Validate one raw record and project it into a [`Movie`].
    fn convert_film(film: api::Film) -> Result<Movie, FetchError> {
        NaiveDate::parse_from_str(&film.release_date, RELEASE_DATE_FORMAT).map_err(|e| {
            FetchError::Malformed(format!(
                "episode {}: invalid release_date {:?}: {}",
                film.episode_id, film.release_date, e
            ))
        })?;

        Ok(Movie {
            id: film.episode_id,
            title: film.title,
            release_date: film.release_date,
            opening_text: film.opening_crawl,
        })
    }
}

#[async_trait]
impl MovieSource for SwapiFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch_movies(&self) -> Result<Vec<Movie>, FetchError> {
        let list: api::FilmList = self.http_client.get_json(&self.api_url).await?;
        debug!("Received {} films", list.results.len());

        list.results.into_iter().map(Self::convert_film).collect()
    }
}
