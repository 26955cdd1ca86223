//! Bounded background loops that keep one status message current.
//!
//! Each loop owns its message and its counters; loops never share state with
//! each other. Cancellation is cooperative: the flag is checked between
//! iterations and a pending sleep is cut short.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::TrackingConfig;
use crate::constants::tracking::{DEFAULT_BAR_WIDTH, DEFAULT_INTERVAL, DEFAULT_MAX_ITERATIONS};
use crate::domain::{ItemId, MediaKind};
use crate::error::RequestResult;
use crate::render::{MessageHandle, StatusSink, stopped_message, tracking_message};
use crate::services::status::{StatusProbe, StatusReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingSettings {
    pub interval: Duration,
    pub max_iterations: u32,
    pub bar_width: usize,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            bar_width: DEFAULT_BAR_WIDTH,
        }
    }
}

impl From<&TrackingConfig> for TrackingSettings {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            interval: config.interval(),
            max_iterations: config.max_iterations,
            bar_width: config.bar_width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingOutcome {
    /// The item reached its terminal state.
    Done,
    /// The iteration budget ran out first.
    Exhausted,
    /// Stopped by the user.
    Cancelled,
    /// The message could no longer be edited.
    Aborted,
}

impl TrackingOutcome {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
            Self::Aborted => "aborted",
        }
    }
}

struct TrackingState {
    kind: MediaKind,
    item_id: ItemId,
    message: MessageHandle,
    settings: TrackingSettings,
    probe: StatusProbe,
    sink: Arc<dyn StatusSink>,
    iterations: AtomicU32,
    cancelled: AtomicBool,
    finished: AtomicBool,
    wake: Notify,
}

impl TrackingState {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    async fn render(&self) -> RequestResult<StatusReport> {
        let report = self.probe.probe(self.kind, self.item_id).await?;
        self.sink
            .edit(
                &self.message,
                tracking_message(&report, self.settings.bar_width),
            )
            .await?;
        Ok(report)
    }
}

/// Starts tracking loops for submitted items.
#[derive(Clone)]
pub struct Tracker {
    probe: StatusProbe,
    sink: Arc<dyn StatusSink>,
    settings: TrackingSettings,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Tracker {
    #[must_use]
    pub fn new(probe: StatusProbe, sink: Arc<dyn StatusSink>, settings: TrackingSettings) -> Self {
        Self {
            probe,
            sink,
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &TrackingSettings {
        &self.settings
    }

    /// Spawns the loop editing `message`. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start(&self, kind: MediaKind, item_id: ItemId, message: MessageHandle) -> TrackingHandle {
        let state = Arc::new(TrackingState {
            kind,
            item_id,
            message,
            settings: self.settings,
            probe: self.probe.clone(),
            sink: Arc::clone(&self.sink),
            iterations: AtomicU32::new(0),
            cancelled: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            wake: Notify::new(),
        });

        metrics::counter!("tracking_loops_started_total", "kind" => kind.as_str()).increment(1);
        info!(
            kind = %kind,
            item_id = %item_id,
            message = %state.message,
            interval_secs = self.settings.interval.as_secs(),
            max_iterations = self.settings.max_iterations,
            "Tracking started"
        );

        let task = tokio::spawn(run_loop(Arc::clone(&state)));
        TrackingHandle {
            state,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }
}

async fn run_loop(state: Arc<TrackingState>) -> TrackingOutcome {
    let outcome = loop {
        if state.is_cancelled() {
            break TrackingOutcome::Cancelled;
        }
        if state.iterations.load(Ordering::SeqCst) >= state.settings.max_iterations {
            break TrackingOutcome::Exhausted;
        }

        match state.probe.probe(state.kind, state.item_id).await {
            Ok(report) => {
                // A stop that landed during the probe owns the message now.
                if state.is_cancelled() {
                    break TrackingOutcome::Cancelled;
                }
                let message = tracking_message(&report, state.settings.bar_width);
                if let Err(e) = state.sink.edit(&state.message, message).await {
                    debug!(message = %state.message, error = %e, "Status message no longer editable");
                    break TrackingOutcome::Aborted;
                }
                if report.done {
                    break TrackingOutcome::Done;
                }
            }
            Err(e) => {
                warn!(kind = %state.kind, item_id = %state.item_id, error = %e, "Status probe failed");
            }
        }

        state.iterations.fetch_add(1, Ordering::SeqCst);

        tokio::select! {
            () = tokio::time::sleep(state.settings.interval) => {}
            () = state.wake.notified() => {}
        }
    };

    state.finished.store(true, Ordering::SeqCst);
    metrics::counter!("tracking_loops_finished_total", "outcome" => outcome.as_str()).increment(1);
    info!(
        kind = %state.kind,
        item_id = %state.item_id,
        iterations = state.iterations.load(Ordering::SeqCst),
        outcome = outcome.as_str(),
        "Tracking finished"
    );
    outcome
}

/// Owner's view of a running loop. Cheap to clone; all clones control the
/// same loop.
#[derive(Clone)]
pub struct TrackingHandle {
    state: Arc<TrackingState>,
    task: Arc<Mutex<Option<JoinHandle<TrackingOutcome>>>>,
}

impl std::fmt::Debug for TrackingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingHandle")
            .field("kind", &self.state.kind)
            .field("item_id", &self.state.item_id)
            .field("iterations", &self.iterations())
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl TrackingHandle {
    #[must_use]
    pub fn message(&self) -> &MessageHandle {
        &self.state.message
    }

    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.state.iterations.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// Requests the loop to stop. Safe to call any number of times; only the
    /// first call marks the message as stopped. Returns whether this call
    /// did the stopping.
    pub async fn stop(&self) -> bool {
        if self.state.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.state.wake.notify_one();
        info!(kind = %self.state.kind, item_id = %self.state.item_id, "Tracking stop requested");

        let report = self
            .state
            .probe
            .probe(self.state.kind, self.state.item_id)
            .await
            .ok();
        let message = stopped_message(report.as_ref(), self.state.settings.bar_width);
        if let Err(e) = self.state.sink.edit(&self.state.message, message).await {
            debug!(error = %e, "Could not mark message as stopped");
        }
        true
    }

    /// Renders once right now without touching the iteration count.
    ///
    /// # Errors
    ///
    /// Returns the probe or sink failure; the loop itself is unaffected.
    pub async fn refresh_now(&self) -> RequestResult<StatusReport> {
        self.state.render().await
    }

    /// Waits for the loop to end. Later calls after the first return
    /// `None`.
    pub async fn wait(&self) -> Option<TrackingOutcome> {
        let task = self.task.lock().await.take()?;
        match task.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(error = %e, "Tracking task failed");
                None
            }
        }
    }
}
