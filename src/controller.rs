//! Retry controller: the fetch/retry/cancel state machine.
//!
//! The controller owns the movie list, the fetch state and the single retry
//! timer slot. A failed fetch starts a retry cycle: the timer re-runs the
//! fetch every [`RetryPolicy::interval`] until it succeeds, the user cancels,
//! the policy gives up, or the controller is torn down.
//!
//! Every attempt is tagged with a generation. Cancel, teardown and new
//! attempts advance the generation, and a completion whose generation is no
//! longer current is discarded.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use tokio::sync::watch;

use crate::fetcher::{FetchError, Movie, MovieSource};
use crate::retry::{RetryPolicy, RetryTimer};

/// Message shown while a retry cycle is active.
pub const RETRYING_MESSAGE: &str = "Something went wrong... Retrying";

/// Message shown after the user cancels a retry cycle.
pub const CANCELLED_MESSAGE: &str = "Retrying canceled by user.";

/// Where the controller is in its fetch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing in flight, no error. Movies may or may not be loaded.
    Idle,
    /// A fetch is in flight. `retrying` is set when it was started by the
    /// retry timer.
    Loading { retrying: bool },
    /// The last attempt failed. With `retrying` set the timer is armed.
    Failed { retrying: bool },
}

impl Phase {
    pub fn is_retrying(self) -> bool {
        matches!(
            self,
            Phase::Loading { retrying: true } | Phase::Failed { retrying: true }
        )
    }
}

/// Flags the presentation renders loading and error UI from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub is_retrying: bool,
}

/// Everything the presentation consumes, published on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub movies: Vec<Movie>,
    pub state: FetchState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    User,
    Timer,
}

struct Inner {
    phase: Phase,
    error: Option<String>,
    movies: Vec<Movie>,
    generation: u64,
    failed_attempts: u32,
    timer: Option<RetryTimer>,
    torn_down: bool,
}

impl Inner {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            movies: self.movies.clone(),
            state: FetchState {
                is_loading: matches!(self.phase, Phase::Loading { .. }),
                error: self.error.clone(),
                is_retrying: self.phase.is_retrying(),
            },
        }
    }

    fn clear_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

struct Shared {
    source: Box<dyn MovieSource>,
    policy: RetryPolicy,
    inner: Mutex<Inner>,
    updates: watch::Sender<Snapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.updates.send_replace(inner.snapshot());
    }

    /// Move into `Loading` and return the new attempt's generation, or
    /// `None` if the trigger is not allowed in the current phase.
    fn begin_attempt(&self, trigger: Trigger) -> Option<u64> {
        let mut inner = self.lock();
        if inner.torn_down {
            return None;
        }

        let retrying = match (trigger, inner.phase) {
            (Trigger::User, Phase::Idle | Phase::Failed { retrying: false }) => false,
            (Trigger::Timer, Phase::Failed { retrying: true }) => true,
            _ => return None,
        };

        if trigger == Trigger::User {
            inner.failed_attempts = 0;
        }
        inner.generation += 1;
        inner.phase = Phase::Loading { retrying };
        inner.error = None;
        self.publish(&inner);

        Some(inner.generation)
    }

    /// Apply the result of attempt `generation`. Returns whether the retry
    /// timer should keep ticking.
    fn finish_attempt(
        self: &Arc<Self>,
        generation: u64,
        result: Result<Vec<Movie>, FetchError>,
    ) -> ControlFlow<()> {
        let mut inner = self.lock();
        if inner.torn_down || inner.generation != generation {
            debug!(
                "Discarding result of stale fetch (generation {}, current {})",
                generation, inner.generation
            );
            return ControlFlow::Break(());
        }

        let flow = match result {
            Ok(movies) => {
                info!("Fetched {} movies", movies.len());
                inner.movies = movies;
                inner.phase = Phase::Idle;
                inner.error = None;
                inner.failed_attempts = 0;
                inner.clear_timer();
                ControlFlow::Break(())
            }
            Err(e) => {
                inner.failed_attempts += 1;
                let attempts = inner.failed_attempts;

                if self.policy.is_exhausted(attempts) {
                    warn!("Fetch attempt {} failed ({}), giving up", attempts, e);
                    inner.phase = Phase::Failed { retrying: false };
                    inner.error = Some(format!("Giving up after {} failed attempts.", attempts));
                    inner.clear_timer();
                    ControlFlow::Break(())
                } else {
                    warn!(
                        "Fetch attempt {} failed ({}), retrying in {:?}...",
                        attempts, e, self.policy.interval
                    );
                    inner.phase = Phase::Failed { retrying: true };
                    inner.error = Some(RETRYING_MESSAGE.to_string());
                    self.ensure_timer(&mut inner);
                    ControlFlow::Continue(())
                }
            }
        };

        self.publish(&inner);
        flow
    }

    /// Arm the retry timer unless one is already running. A finished timer
    /// left in the slot is cleared first.
    fn ensure_timer(self: &Arc<Self>, inner: &mut Inner) {
        if inner.timer.as_ref().is_some_and(RetryTimer::is_active) {
            return;
        }
        inner.clear_timer();

        let weak = Arc::downgrade(self);
        inner.timer = Some(RetryTimer::arm(self.policy.interval, move || {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(shared) => shared.run_attempt(Trigger::Timer).await,
                    None => ControlFlow::Break(()),
                }
            }
        }));
    }

    async fn run_attempt(self: &Arc<Self>, trigger: Trigger) -> ControlFlow<()> {
        let Some(generation) = self.begin_attempt(trigger) else {
            return ControlFlow::Break(());
        };
        let result = self.source.fetch_movies().await;
        self.finish_attempt(generation, result)
    }
}

/// Drives a [`MovieSource`] with automatic retry and user cancellation.
///
/// Dropping the controller tears it down like [`RetryController::shutdown`].
pub struct RetryController {
    shared: Arc<Shared>,
}

impl RetryController {
    pub fn new(source: impl MovieSource + 'static, policy: RetryPolicy) -> Self {
        let inner = Inner {
            phase: Phase::Idle,
            error: None,
            movies: Vec::new(),
            generation: 0,
            failed_attempts: 0,
            timer: None,
            torn_down: false,
        };
        let (updates, _) = watch::channel(inner.snapshot());

        Self {
            shared: Arc::new(Shared {
                source: Box::new(source),
                policy,
                inner: Mutex::new(inner),
                updates,
            }),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.shared.policy
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().phase
    }

    pub fn state(&self) -> FetchState {
        self.shared.lock().snapshot().state
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.lock().snapshot()
    }

    /// Receive a [`Snapshot`] after every state change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.updates.subscribe()
    }

    /// User-initiated fetch.
    ///
    /// Ignored (returns `false`) while a fetch is in flight, while a retry
    /// cycle is active, or after teardown. Otherwise performs one attempt and
    /// returns `true` once its result has been applied; a failure starts a
    /// retry cycle.
    #[tracing::instrument(skip(self))]
    pub async fn trigger_fetch(&self) -> bool {
        let Some(generation) = self.shared.begin_attempt(Trigger::User) else {
            debug!("Fetch request ignored in phase {:?}", self.phase());
            return false;
        };

        let result = self.shared.source.fetch_movies().await;
        let _ = self.shared.finish_attempt(generation, result);
        true
    }

    /// Stop the active retry cycle.
    ///
    /// Cancels the timer. A retry fetch still in flight runs to completion
    /// but its result is discarded.
    /// Returns `false` when no retry cycle is active.
    pub fn cancel_retry(&self) -> bool {
        let mut inner = self.shared.lock();
        if inner.torn_down || !inner.phase.is_retrying() {
            return false;
        }

        inner.clear_timer();
        inner.generation += 1;
        inner.phase = Phase::Failed { retrying: false };
        inner.error = Some(CANCELLED_MESSAGE.to_string());
        info!("Retrying canceled by user");

        self.shared.publish(&inner);
        true
    }

    /// Tear down: cancel the timer, discard in-flight results and refuse
    /// further fetches. Idempotent.
    ///
    /// Subscribers receive a final snapshot with no retry cycle and nothing
    /// loading.
    pub fn shutdown(&self) {
        let mut inner = self.shared.lock();
        if inner.torn_down {
            return;
        }

        inner.torn_down = true;
        inner.generation += 1;
        inner.clear_timer();
        inner.phase = match inner.phase {
            Phase::Loading { retrying: false } => Phase::Idle,
            Phase::Idle => Phase::Idle,
            Phase::Loading { retrying: true } | Phase::Failed { .. } => {
                Phase::Failed { retrying: false }
            }
        };
        debug!("Retry controller shut down");

        self.shared.publish(&inner);
    }
}

impl Drop for RetryController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
