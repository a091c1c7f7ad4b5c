//! Terminal presentation of a controller [`Snapshot`].

use std::fmt::Write;

use chrono::NaiveDate;

use crate::controller::{FetchState, Snapshot};
use crate::fetcher::Movie;

/// Number of characters of the opening text shown on a card.
pub const EXCERPT_CHARS: usize = 150;

const HEADING: &str = "Star Wars Movies";

const CANCEL_HINT: &str = "Press Ctrl-C to cancel retrying.";

/// First [`EXCERPT_CHARS`] characters of `text` followed by `...`.
pub fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    out.push_str("...");
    out
}

/// Put the opening crawl's line breaks on one line.
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Human-readable release date, e.g. `May 25, 1977`.
///
/// Dates that are not `YYYY-MM-DD` are shown as-is.
pub fn format_release_date(release_date: &str) -> String {
    match NaiveDate::parse_from_str(release_date, "%Y-%m-%d") {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => release_date.to_string(),
    }
}

/// Render one movie card.
pub fn render_card(movie: &Movie) -> String {
    format!(
        "{}\n  Release Date: {}\n  {}\n",
        movie.title,
        format_release_date(&movie.release_date),
        single_line(&excerpt(&movie.opening_text))
    )
}

/// Render the loading line, the error and the cancel hint for `state`.
///
/// Empty when nothing is loading and there is no error.
pub fn render_status(state: &FetchState) -> String {
    let mut out = String::new();

    if state.is_loading {
        let _ = writeln!(out, "Loading movies...");
    }

    if let Some(error) = &state.error {
        let _ = writeln!(out, "error: {}", error);
        if state.is_retrying {
            let _ = writeln!(out, "{}", CANCEL_HINT);
        }
    }

    out
}

/// Render the whole view: heading, status and movie cards.
pub fn render(snapshot: &Snapshot) -> String {
    let state = &snapshot.state;
    let mut out = String::new();

    let _ = writeln!(out, "{}\n{}\n", HEADING, "=".repeat(HEADING.len()));

    let status = render_status(state);
    if !status.is_empty() {
        out.push_str(&status);
        out.push('\n');
    }

    if !state.is_loading && state.error.is_none() && snapshot.movies.is_empty() {
        let _ = writeln!(out, "No movies found. Run \"filmreel fetch\" to load data.");
    }

    for movie in &snapshot.movies {
        out.push_str(&render_card(movie));
        out.push('\n');
    }

    out
}
