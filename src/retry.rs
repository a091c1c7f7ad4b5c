//! Retry policy and the owned retry timer.

use std::future::Future;
use std::num::NonZeroU32;
use std::ops::ControlFlow;
use std::time::Duration;

use log::debug;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Default period between automatic retry attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// How failed fetches are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Time between the end of one failed attempt and the start of the next
    pub interval: Duration,
    /// Consecutive failed attempts (the first one included) after which the
    /// controller gives up. `None` retries until success or cancellation.
    pub max_attempts: Option<NonZeroU32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn new(interval: Duration, max_attempts: Option<NonZeroU32>) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Whether `failed_attempts` consecutive failures end the retry cycle.
    pub fn is_exhausted(&self, failed_attempts: u32) -> bool {
        self.max_attempts
            .is_some_and(|max| failed_attempts >= max.get())
    }
}

/// Handle to a recurring retry timer task.
///
/// The first tick fires `period` after arming; every later tick fires
/// `period` after the previous tick's callback has finished, so a slow
/// attempt never eats into the wait before the next one. Ticks never
/// overlap. Dropping the handle stops the timer: a tick callback already
/// running is allowed to finish, but no further tick starts.
#[derive(Debug)]
pub struct RetryTimer {
    handle: JoinHandle<()>,
    _stop: oneshot::Sender<()>,
}

impl RetryTimer {
    /// Spawn the timer task. Must be called from within a tokio runtime.
    ///
    /// The task also stops on its own once `on_tick` returns
    /// [`ControlFlow::Break`].
    pub fn arm<F, Fut>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        debug!("Arming retry timer with period {:?}", period);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => {
                        debug!("Retry timer cancelled");
                        break;
                    }
                    _ = tokio::time::sleep(period) => {}
                }

                if on_tick().await.is_break() {
                    debug!("Retry timer finished");
                    break;
                }
            }
        });

        Self {
            handle,
            _stop: stop_tx,
        }
    }

    /// Whether the timer task is still scheduled.
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the timer. No tick starts after this returns.
    pub fn cancel(self) {
        drop(self);
    }
}
