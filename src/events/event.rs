//! # Lifecycle events emitted by the controllers.
//!
//! The [`EventKind`] enum classifies events across four groups:
//! - **Load events**: fetching a resource (started, loaded, failed, retry bookkeeping)
//! - **Freshness events**: expiry and scheduled refresh
//! - **Presentation events**: full-screen show / dismissal
//! - **Teardown events**: disposal and discarded late results
//!
//! The [`Event`] struct carries metadata such as the placement, category,
//! attempt number, retry delay and handle id.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use adkeeper::{Category, Event, EventKind};
//!
//! let ev = Event::new(EventKind::RetryScheduled)
//!     .with_category(Category::Banner)
//!     .with_placement("home")
//!     .with_attempt(2)
//!     .with_delay(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.placement.as_deref(), Some("home"));
//! assert_eq!(ev.delay_ms, Some(5_000));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::policies::Category;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `reason` (subscriber name and panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `reason` (subscriber name and "full" / "closed").
    SubscriberOverflow,

    // === Load events ===
    /// Entry moved to `Loading`; a gateway call is in flight.
    ///
    /// Sets `category`, `placement`, `attempt`.
    LoadStarted,

    /// Gateway delivered a resource; entry is `Ready`.
    ///
    /// Sets `category`, `placement`, `handle`.
    Loaded,

    /// Gateway failed; entry is `Failed`.
    ///
    /// Sets `category`, `placement`, `attempt` (consecutive failures), `reason`.
    LoadFailed,

    /// Automatic retry scheduled after a failure.
    ///
    /// Sets `category`, `placement`, `attempt`, `delay_ms`.
    RetryScheduled,

    /// Attempt cap reached; automatic retries stop until an explicit request.
    ///
    /// Sets `category`, `placement`, `attempt`.
    RetriesExhausted,

    /// An explicit request restarted a placement that had exhausted its retries.
    ///
    /// Sets `category`, `placement`.
    RetriesReset,

    // === Freshness events ===
    /// A ready resource outlived its expiry and was released before reloading.
    ///
    /// Sets `category`, `placement`, `handle`.
    Expired,

    /// Periodic refresh armed for a placement.
    ///
    /// Sets `category`, `placement`, `delay_ms` (interval).
    RefreshScheduled,

    /// Periodic refresh replaced a ready resource.
    ///
    /// Sets `category`, `placement`, `handle` (the released one).
    Refreshed,

    /// A refresh tick was dropped.
    ///
    /// Sets `category`, `placement`, `reason` ("hidden", "disabled", "not_ready").
    RefreshSkipped,

    /// Placement visibility changed.
    ///
    /// Sets `category`, `placement`, `reason` ("visible" / "hidden").
    VisibilityChanged,

    // === Presentation events ===
    /// Full-screen presentation started; entry is `Showing`.
    ///
    /// Sets `category`, `placement`, `handle`.
    ShowStarted,

    /// Presentation ended normally; handle released.
    ///
    /// Sets `category`, `placement`, `handle`, optional `reason` ("rewarded").
    Dismissed,

    /// Presentation failed; handle released.
    ///
    /// Sets `category`, `placement`, `handle`, `reason`.
    ShowFailed,

    // === Teardown events ===
    /// A late gateway result arrived for a disposed or superseded load and was discarded.
    ///
    /// Sets `category`, `placement`, optional `handle` (released immediately).
    ResultDiscarded,

    /// Entry disposed; handle (if any) released.
    ///
    /// Sets `category`, `placement`, optional `handle`.
    Disposed,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Category of the entry, if applicable.
    pub category: Option<Category>,
    /// Placement id of the entry, if applicable.
    pub placement: Option<Arc<str>>,
    /// Attempt / failure count.
    pub attempt: Option<u32>,
    /// Retry delay or refresh interval in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Provider handle id involved in the transition.
    pub handle: Option<u64>,
    /// Human-readable reason (errors, skip reasons, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            category: None,
            placement: None,
            attempt: None,
            delay_ms: None,
            handle: None,
            reason: None,
        }
    }

    /// Creates an event already tagged with category and placement.
    #[inline]
    pub fn entry(kind: EventKind, category: Category, placement: impl Into<Arc<str>>) -> Self {
        Event::new(kind)
            .with_category(category)
            .with_placement(placement)
    }

    /// Attaches a category.
    #[inline]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Attaches a placement id.
    #[inline]
    pub fn with_placement(mut self, placement: impl Into<Arc<str>>) -> Self {
        self.placement = Some(placement.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a provider handle id.
    #[inline]
    pub fn with_handle(mut self, id: u64) -> Self {
        self.handle = Some(id);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Returns `true` if this event concerns the given entry.
    #[inline]
    pub fn is_for(&self, category: Category, placement: &str) -> bool {
        self.category == Some(category) && self.placement.as_deref() == Some(placement)
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }
}
