//! # LogWriter: structured event logger
//!
//! A subscriber that turns lifecycle [`Event`]s into `tracing` records under the
//! `adkeeper` target. Routine transitions log at `debug`, fills and dismissals at
//! `info`, failures and overflow at `warn`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG adkeeper: load started category=banner placement="home" attempt=1
//!  INFO adkeeper: loaded category=banner placement="home" handle=17
//!  WARN adkeeper: load failed category=rewarded placement="shop" attempt=2 reason="no fill"
//! DEBUG adkeeper: retry scheduled category=rewarded placement="shop" delay_ms=5000
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let category = e.category.map(|c| c.as_str()).unwrap_or("-");
        let placement = e.placement.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::LoadStarted => {
                debug!(target: "adkeeper", category, placement, attempt = e.attempt, "load started");
            }
            EventKind::Loaded => {
                info!(target: "adkeeper", category, placement, handle = e.handle, "loaded");
            }
            EventKind::LoadFailed => {
                warn!(target: "adkeeper", category, placement, attempt = e.attempt, reason, "load failed");
            }
            EventKind::RetryScheduled => {
                debug!(target: "adkeeper", category, placement, attempt = e.attempt, delay_ms = e.delay_ms, "retry scheduled");
            }
            EventKind::RetriesExhausted => {
                warn!(target: "adkeeper", category, placement, attempt = e.attempt, "retries exhausted");
            }
            EventKind::RetriesReset => {
                debug!(target: "adkeeper", category, placement, "retries reset");
            }
            EventKind::Expired => {
                debug!(target: "adkeeper", category, placement, handle = e.handle, "expired");
            }
            EventKind::RefreshScheduled => {
                debug!(target: "adkeeper", category, placement, interval_ms = e.delay_ms, "refresh scheduled");
            }
            EventKind::Refreshed => {
                debug!(target: "adkeeper", category, placement, handle = e.handle, "refreshed");
            }
            EventKind::RefreshSkipped => {
                debug!(target: "adkeeper", category, placement, reason, "refresh skipped");
            }
            EventKind::VisibilityChanged => {
                debug!(target: "adkeeper", category, placement, reason, "visibility changed");
            }
            EventKind::ShowStarted => {
                info!(target: "adkeeper", category, placement, handle = e.handle, "show started");
            }
            EventKind::Dismissed => {
                info!(target: "adkeeper", category, placement, handle = e.handle, reason, "dismissed");
            }
            EventKind::ShowFailed => {
                warn!(target: "adkeeper", category, placement, handle = e.handle, reason, "show failed");
            }
            EventKind::ResultDiscarded => {
                debug!(target: "adkeeper", category, placement, handle = e.handle, "late result discarded");
            }
            EventKind::Disposed => {
                debug!(target: "adkeeper", category, placement, handle = e.handle, "disposed");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "adkeeper", reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(target: "adkeeper", reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
