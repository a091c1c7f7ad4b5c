use std::future::Future;
use std::io::Write;
use std::num::NonZeroU32;

use anyhow::{Context, Result};
use clap::Parser;
use filmreel::config::{Config, build_controller};
use filmreel::controller::{FetchState, RetryController, Snapshot};
use filmreel::render::{render, render_status};
use log::debug;

/// filmreel - Star Wars film list fetcher
///
/// Fetches the film list from the Star Wars API and prints it. Failed
/// fetches are retried automatically; press Ctrl-C to stop retrying.
///
/// Examples:
///   filmreel fetch                      # Fetch and print the films
///   filmreel fetch --json               # Print the films as JSON
///   filmreel --max-attempts 3 fetch     # Give up after three failures
#[derive(Parser, Debug)]
#[command(author, version = env!("FILMREEL_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Films endpoint (defaults to https://swapi.dev/api/films/)
    #[arg(
        long = "api-url",
        env = "FILMREEL_API_URL",
        value_name = "URL",
        global = true
    )]
    pub api_url: Option<String>,

    /// Seconds between automatic retries (defaults to 5)
    #[arg(
        long = "retry-interval",
        env = "FILMREEL_RETRY_INTERVAL",
        value_name = "SECONDS",
        global = true
    )]
    pub retry_interval: Option<u64>,

    /// Give up after this many failed attempts (defaults to retrying forever)
    #[arg(
        long = "max-attempts",
        env = "FILMREEL_MAX_ATTEMPTS",
        value_name = "N",
        global = true
    )]
    pub max_attempts: Option<NonZeroU32>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch the film list, retrying until it succeeds or is cancelled
    Fetch(FetchArgs),
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Print the films as JSON instead of cards
    #[arg(long)]
    pub json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let config = Config::new(cli.api_url, cli.retry_interval, cli.max_attempts)?;

    match cli.command {
        Commands::Fetch(args) => fetch(&config, &args).await?,
    }
    Ok(())
}

#[tracing::instrument(skip(config, args))]
async fn fetch(config: &Config, args: &FetchArgs) -> Result<()> {
    let controller = build_controller(config)?;

    let snapshot = follow(&controller, &mut std::io::stderr(), tokio::signal::ctrl_c).await;
    controller.shutdown();
    let snapshot = require_success(snapshot?)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&snapshot.movies).context("Failed to serialize movies")?;
        println!("{}", json);
    } else {
        print!("{}", render(&snapshot));
    }
    Ok(())
}

/// Start a fetch and report every status change to `out` until the
/// controller settles. Each time `cancel` resolves, the retry cycle is
/// cancelled.
async fn follow<W, C, Fut>(controller: &RetryController, out: &mut W, mut cancel: C) -> Result<Snapshot>
where
    W: Write,
    C: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    let mut updates = controller.subscribe();
    let attempt = controller.trigger_fetch();
    tokio::pin!(attempt);
    let mut attempt_done = false;
    let mut shown = FetchState::default();

    loop {
        let snapshot = updates.borrow_and_update().clone();
        if snapshot.state != shown {
            write!(out, "{}", render_status(&snapshot.state)).context("Failed to write status")?;
            shown = snapshot.state.clone();
        }

        if attempt_done && !shown.is_loading && !shown.is_retrying {
            return Ok(snapshot);
        }

        tokio::select! {
            started = &mut attempt, if !attempt_done => {
                attempt_done = true;
                if !started {
                    debug!("Fetch request was not accepted");
                }
            }
            changed = updates.changed() => {
                changed.context("Retry controller stopped unexpectedly")?;
            }
            signal = cancel() => {
                signal.context("Failed to listen for Ctrl-C")?;
                if !controller.cancel_retry() {
                    debug!("Ctrl-C received outside a retry cycle");
                }
            }
        }
    }
}

/// The settled snapshot, or an error carrying its error message.
fn require_success(snapshot: Snapshot) -> Result<Snapshot> {
    if let Some(error) = &snapshot.state.error {
        anyhow::bail!("Failed to fetch movies: {}", error);
    }
    Ok(snapshot)
}
