//! Fixed-interval status polling.
//!
//! One routine serves every "wait until the server says done" stage. A poll
//! moves `Idle → Polling → {Complete, Failed, Cancelled}` and never leaves a
//! terminal phase; retrying means building a new [`Poller`].
//!
//! Ticks are serialized: the next request goes out only after the previous
//! response arrived and the interval elapsed, so a slow server never sees
//! overlapping status requests.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use insight_logging::{insight_debug, insight_trace};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{ApiError, Envelope, PollError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` polls until the server reports completion or an error.
    pub max_duration: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_duration: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Polling,
    Complete,
    Failed,
    Cancelled,
}

impl PollPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PollPhase::Complete | PollPhase::Failed | PollPhase::Cancelled
        )
    }
}

#[derive(Debug, Clone)]
struct PhaseCell(Arc<Mutex<PollPhase>>);

impl PhaseCell {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(PollPhase::Idle)))
    }

    fn get(&self) -> PollPhase {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves `from → to`; returns false (and changes nothing) if the current
    /// phase is not `from`.
    fn transition(&self, from: PollPhase, to: PollPhase) -> bool {
        let mut phase = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if *phase != from {
            return false;
        }
        *phase = to;
        true
    }
}

/// Polls `check` every `settings.interval` until `extract` reports completion.
///
/// The first request is issued one interval after the call. A `check` error or
/// an `extract` error ends the poll at once; `Ok(None)` from `extract` waits
/// for the next tick.
pub async fn poll_until<T, P, Fut, X>(
    settings: PollSettings,
    cancel: &CancellationToken,
    mut check: P,
    extract: X,
) -> Result<T, PollError>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<Envelope, ApiError>>,
    X: Fn(Envelope) -> Result<Option<T>, ApiError>,
{
    let started = Instant::now();
    let period = settings.interval.max(Duration::from_millis(1));
    let mut ticker = time::interval_at(started + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            _ = ticker.tick() => {}
        }

        if let Some(limit) = settings.max_duration {
            let elapsed = started.elapsed();
            if elapsed >= limit {
                insight_debug!("poll gave up after {:?} and {} ticks", elapsed, tick);
                return Err(PollError::TimedOut { elapsed });
            }
        }

        tick += 1;
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            response = check() => response,
        };

        match response.and_then(&extract) {
            Ok(Some(value)) => {
                insight_debug!("poll completed on tick {}", tick);
                return Ok(value);
            }
            Ok(None) => insight_trace!("poll tick {} not complete", tick),
            Err(err) => {
                insight_debug!("poll failed on tick {}: {}", tick, err);
                return Err(PollError::Api(err));
            }
        }
    }
}

/// A poll that has not started yet.
#[derive(Debug)]
pub struct Poller {
    settings: PollSettings,
    phase: PhaseCell,
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(settings: PollSettings) -> Self {
        Self {
            settings,
            phase: PhaseCell::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.phase.get()
    }

    /// Starts polling on `runtime`. Exactly one of `on_complete` / `on_error`
    /// runs when the poll ends on its own; neither runs after
    /// [`PollHandle::cancel`].
    pub fn start<T, P, Fut, X, C, E>(
        self,
        runtime: &tokio::runtime::Handle,
        check: P,
        extract: X,
        on_complete: C,
        on_error: E,
    ) -> PollHandle
    where
        T: Send + 'static,
        P: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Envelope, ApiError>> + Send,
        X: Fn(Envelope) -> Result<Option<T>, ApiError> + Send + 'static,
        C: FnOnce(T) + Send + 'static,
        E: FnOnce(PollError) + Send + 'static,
    {
        self.phase.transition(PollPhase::Idle, PollPhase::Polling);
        let handle = PollHandle {
            phase: self.phase.clone(),
            cancel: self.cancel.clone(),
        };

        let settings = self.settings;
        let phase = self.phase;
        let cancel = self.cancel;
        runtime.spawn(async move {
            match poll_until(settings, &cancel, check, extract).await {
                Ok(value) => {
                    if phase.transition(PollPhase::Polling, PollPhase::Complete) {
                        on_complete(value);
                    }
                }
                Err(PollError::Cancelled) => {
                    phase.transition(PollPhase::Polling, PollPhase::Cancelled);
                }
                Err(err) => {
                    if phase.transition(PollPhase::Polling, PollPhase::Failed) {
                        on_error(err);
                    }
                }
            }
        });

        handle
    }
}

/// Control over a running poll.
#[derive(Debug, Clone)]
pub struct PollHandle {
    phase: PhaseCell,
    cancel: CancellationToken,
}

impl PollHandle {
    /// Stops the poll. No callback runs afterwards; a finished poll is unaffected.
    pub fn cancel(&self) {
        if self
            .phase
            .transition(PollPhase::Polling, PollPhase::Cancelled)
        {
            insight_debug!("poll cancelled");
        }
        self.cancel.cancel();
    }

    pub fn phase(&self) -> PollPhase {
        self.phase.get()
    }

    pub fn is_finished(&self) -> bool {
        self.phase().is_terminal()
    }
}
