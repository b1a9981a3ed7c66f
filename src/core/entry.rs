//! # Resource entry: one cached resource and its state.
//!
//! ```text
//!            begin_load            complete_load
//!   Empty ───────────────► Loading ─────────────► Ready ──begin_show──► Showing
//!     ▲                      │  ▲                   │                     │
//!     │                      │  │ begin_load        │ take_handle         │ end_show
//!     │          fail_load   ▼  │ (retry)           ▼                     ▼
//!     │                    Failed                 Empty                 Empty
//!     └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transition methods keep the entry invariants local:
//! - `Ready` ⇒ handle present and `loaded_at` set;
//! - `attempts` never exceeds the cap passed to [`ResourceEntry::fail_load`];
//! - every load or show carries a fresh `ticket`, so completions for an older
//!   ticket are recognisable as stale.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::policies::Category;
use crate::provider::AdHandle;

/// Observable state of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntryState {
    /// Nothing loaded, nothing in flight.
    #[default]
    Empty,
    /// A gateway load is in flight.
    Loading,
    /// A resource is cached and usable (subject to expiry).
    Ready,
    /// A full-screen resource is on screen.
    Showing,
    /// The last load failed (a retry may be scheduled).
    Failed,
}

impl EntryState {
    /// Returns the canonical snake_case label.
    pub const fn as_str(self) -> &'static str {
        match self {
            EntryState::Empty => "empty",
            EntryState::Loading => "loading",
            EntryState::Ready => "ready",
            EntryState::Showing => "showing",
            EntryState::Failed => "failed",
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached state of one placement within one category.
#[derive(Debug, Clone)]
pub struct ResourceEntry {
    placement: Arc<str>,
    category: Category,
    handle: Option<AdHandle>,
    state: EntryState,
    loaded_at: Option<Instant>,
    attempts: u32,
    refresh_override: Option<Duration>,
    visible: bool,
    ticket: u64,
}

impl ResourceEntry {
    /// Creates an `Empty`, visible entry.
    pub fn new(placement: impl Into<Arc<str>>, category: Category) -> Self {
        Self {
            placement: placement.into(),
            category,
            handle: None,
            state: EntryState::Empty,
            loaded_at: None,
            attempts: 0,
            refresh_override: None,
            visible: true,
            ticket: 0,
        }
    }

    pub fn placement(&self) -> &Arc<str> {
        &self.placement
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub fn handle(&self) -> Option<&AdHandle> {
        self.handle.as_ref()
    }

    pub fn loaded_at(&self) -> Option<Instant> {
        self.loaded_at
    }

    /// Consecutive failures since the last success or reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn refresh_override(&self) -> Option<Duration> {
        self.refresh_override
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Ticket of the most recent load or show.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub(crate) fn set_refresh_override(&mut self, interval: Option<Duration>) {
        self.refresh_override = interval;
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// `true` if the entry is `Ready` and younger than `expiry` at `now`.
    ///
    /// `expiry = None` means no ceiling.
    pub fn is_fresh(&self, now: Instant, expiry: Option<Duration>) -> bool {
        if self.state != EntryState::Ready {
            return false;
        }
        match (self.loaded_at, expiry) {
            (Some(_), None) => true,
            (Some(at), Some(ttl)) => now.saturating_duration_since(at) < ttl,
            (None, _) => false,
        }
    }

    /// Moves to `Loading` under `ticket`. Any held handle is returned for release.
    pub(crate) fn begin_load(&mut self, ticket: u64) -> Option<AdHandle> {
        self.state = EntryState::Loading;
        self.ticket = ticket;
        self.loaded_at = None;
        self.handle.take()
    }

    /// Stores a loaded handle and moves to `Ready`.
    pub(crate) fn complete_load(&mut self, handle: AdHandle, now: Instant) {
        self.handle = Some(handle);
        self.loaded_at = Some(now);
        self.attempts = 0;
        self.state = EntryState::Ready;
    }

    /// Records a failed load and moves to `Failed`. Returns the capped failure count.
    pub(crate) fn fail_load(&mut self, max_attempts: u32) -> u32 {
        self.attempts = (self.attempts + 1).min(max_attempts.max(1));
        self.state = EntryState::Failed;
        self.attempts
    }

    /// Clears the failure count (explicit external retry trigger).
    pub(crate) fn reset_attempts(&mut self) {
        self.attempts = 0;
    }

    /// Moves `Ready → Showing` under `ticket`. Returns the handle to present.
    pub(crate) fn begin_show(&mut self, ticket: u64) -> Option<AdHandle> {
        if self.state != EntryState::Ready {
            return None;
        }
        self.state = EntryState::Showing;
        self.ticket = ticket;
        self.handle.clone()
    }

    /// Ends a presentation: moves to `Empty` and yields the consumed handle.
    pub(crate) fn end_show(&mut self) -> Option<AdHandle> {
        self.take_handle()
    }

    /// Drops the cached resource and moves to `Empty`.
    pub(crate) fn take_handle(&mut self) -> Option<AdHandle> {
        self.state = EntryState::Empty;
        self.loaded_at = None;
        self.handle.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ResourceEntry {
        ResourceEntry::new("home", Category::Banner)
    }

    #[tokio::test(start_paused = true)]
    async fn ready_requires_handle_and_timestamp() {
        let mut e = entry();
        assert!(e.begin_load(1).is_none());
        assert_eq!(e.state(), EntryState::Loading);
        assert!(e.loaded_at().is_none());

        let now = Instant::now();
        e.complete_load(AdHandle::new(10), now);
        assert_eq!(e.state(), EntryState::Ready);
        assert_eq!(e.handle().map(AdHandle::id), Some(10));
        assert_eq!(e.loaded_at(), Some(now));
    }

    #[tokio::test(start_paused = true)]
    async fn freshness_respects_expiry() {
        let mut e = entry();
        e.begin_load(1);
        let t0 = Instant::now();
        e.complete_load(AdHandle::new(1), t0);

        let ttl = Some(Duration::from_secs(90));
        assert!(e.is_fresh(t0 + Duration::from_millis(89_999), ttl));
        assert!(!e.is_fresh(t0 + Duration::from_secs(90), ttl));
        assert!(e.is_fresh(t0 + Duration::from_secs(86_400), None));
    }

    #[test]
    fn failures_are_capped() {
        let mut e = entry();
        for _ in 0..5 {
            e.begin_load(1);
            e.fail_load(3);
        }
        assert_eq!(e.attempts(), 3);
        assert_eq!(e.state(), EntryState::Failed);

        e.reset_attempts();
        assert_eq!(e.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_failures() {
        let mut e = entry();
        e.begin_load(1);
        e.fail_load(3);
        e.begin_load(2);
        e.complete_load(AdHandle::new(4), Instant::now());
        assert_eq!(e.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn show_consumes_handle() {
        let mut e = ResourceEntry::new("level-end", Category::Interstitial);
        assert!(e.begin_show(9).is_none(), "cannot show before ready");

        e.begin_load(1);
        e.complete_load(AdHandle::new(3), Instant::now());
        assert_eq!(e.begin_show(2).map(|h| h.id()), Some(3));
        assert_eq!(e.state(), EntryState::Showing);
        assert_eq!(e.ticket(), 2);

        assert_eq!(e.end_show().map(|h| h.id()), Some(3));
        assert_eq!(e.state(), EntryState::Empty);
        assert!(e.handle().is_none());
        assert!(e.loaded_at().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reload_surrenders_previous_handle() {
        let mut e = entry();
        e.begin_load(1);
        e.complete_load(AdHandle::new(5), Instant::now());
        assert_eq!(e.begin_load(2).map(|h| h.id()), Some(5));
        assert!(e.handle().is_none());
    }
}
