//! # LifecycleController: per-category policy engine.
//!
//! Drives every [`ResourceEntry`] of one category through
//! `Empty → Loading → {Ready, Failed}`, `Ready → Showing → Empty`, refresh and
//! disposal, calling the [`ProviderGateway`](crate::ProviderGateway) as needed.
//!
//! ## Serialization
//! ```text
//! request_load ─┐
//! finish_load  ─┤                 ┌──────────────┐
//! retry_due    ─┼──► owner lock ─►│  registry    │  (one transition at a time)
//! refresh_tick ─┤                 └──────────────┘
//! show / dispose┘
//! ```
//! Gateway calls run on spawned tasks; their completion re-enters through the
//! owner lock. Each load/show carries a ticket: a completion whose ticket no longer
//! matches the entry (disposed, refreshed, reloaded) is discarded and its handle
//! released on arrival.
//!
//! ## Rules
//! - `request_load` is a no-op while `Loading`, `Showing` or `Ready` and fresh.
//! - A failed load retries after `RetryPolicy::delay_for(failures)` until the cap;
//!   at the cap the entry stays `Failed` until an explicit `request_load`, which
//!   resets the counter.
//! - Full-screen resources are single-use: dismissal or show-failure releases the
//!   handle and immediately starts the next load.
//! - Disposal cancels pending retry/refresh timers before removing the entry.
//! - A panicking gateway call counts as a failed load or a failed presentation.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::entry::{EntryState, ResourceEntry};
use super::registry::PlacementRegistry;
use super::schedule::TimerSlots;
use super::stage::{Stage, StageGuard};
use crate::error::{panic_message, LoadError, ScheduleError, ShowError};
use crate::events::{Bus, Event, EventKind};
use crate::policies::{Category, CategoryPolicy, RetryPolicy};
use crate::provider::{AdHandle, DismissReason, GatewayRef, LoadRequest};

/// Collaborators shared by every controller of one manager.
#[derive(Clone)]
pub(crate) struct Shared {
    pub gateway: GatewayRef,
    pub bus: Bus,
    pub stage: Arc<Stage>,
    pub auto_refresh: Arc<AtomicBool>,
    pub runtime_token: CancellationToken,
}

/// Category-specific parameters.
pub(crate) struct ControllerParams {
    pub policy: CategoryPolicy,
    pub retry: RetryPolicy,
    pub unit_id: Option<Arc<str>>,
}

/// Owner of one category's registry and timers.
pub(crate) struct LifecycleController {
    category: Category,
    params: ControllerParams,
    registry: PlacementRegistry,
    owner: Mutex<()>,
    retries: TimerSlots,
    refreshes: TimerSlots,
    shared: Shared,
    tickets: AtomicU64,
    me: Weak<Self>,
}

impl LifecycleController {
    pub(crate) fn new(params: ControllerParams, shared: Shared) -> Arc<Self> {
        let category = params.policy.category;
        Arc::new_cyclic(|me| Self {
            category,
            registry: PlacementRegistry::new(category),
            owner: Mutex::new(()),
            retries: TimerSlots::new(shared.runtime_token.clone()),
            refreshes: TimerSlots::new(shared.runtime_token.clone()),
            params,
            shared,
            tickets: AtomicU64::new(1),
            me: me.clone(),
        })
    }

    pub(crate) fn category(&self) -> Category {
        self.category
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.shared.bus
    }

    // ---------------------------
    // Queries (no owner lock)
    // ---------------------------

    /// `Ready` and not expired.
    pub(crate) async fn is_available(&self, placement: &str) -> bool {
        self.available_handle(placement).await.is_some()
    }

    /// Handle of a `Ready`, unexpired entry.
    pub(crate) async fn available_handle(&self, placement: &str) -> Option<AdHandle> {
        let entry = self.registry.get(placement).await?;
        if entry.is_fresh(Instant::now(), self.expiry(&entry)) {
            entry.handle().cloned()
        } else {
            None
        }
    }

    pub(crate) async fn status_of(&self, placement: &str) -> EntryState {
        self.registry
            .get(placement)
            .await
            .map(|e| e.state())
            .unwrap_or_default()
    }

    pub(crate) async fn entry(&self, placement: &str) -> Option<ResourceEntry> {
        self.registry.get(placement).await
    }

    pub(crate) async fn entries(&self) -> Vec<ResourceEntry> {
        self.registry.entries().await
    }

    pub(crate) fn has_pending_retry(&self, placement: &str) -> bool {
        self.retries.is_scheduled(placement)
    }

    // ---------------------------
    // Load path
    // ---------------------------

    /// Starts a load unless one is in flight or a fresh resource is cached.
    pub(crate) async fn request_load(&self, placement: &str) {
        let _owner = self.owner.lock().await;
        let mut entry = self
            .registry
            .get(placement)
            .await
            .unwrap_or_else(|| ResourceEntry::new(placement, self.category));

        match entry.state() {
            EntryState::Loading | EntryState::Showing => return,
            EntryState::Ready if entry.is_fresh(Instant::now(), self.expiry(&entry)) => return,
            EntryState::Ready => {
                let mut ev = self.event(EventKind::Expired, entry.placement());
                if let Some(handle) = entry.handle() {
                    ev = ev.with_handle(handle.id());
                }
                self.shared.bus.publish(ev);
            }
            EntryState::Failed if !self.params.retry.should_retry(entry.attempts()) => {
                entry.reset_attempts();
                self.shared
                    .bus
                    .publish(self.event(EventKind::RetriesReset, entry.placement()));
            }
            EntryState::Failed | EntryState::Empty => {}
        }

        self.retries.cancel(placement);
        self.start_load(entry).await;
    }

    /// Moves `entry` to `Loading` and spawns the gateway call. Owner lock must be held.
    async fn start_load(&self, mut entry: ResourceEntry) {
        let ticket = self.next_ticket();
        if let Some(previous) = entry.begin_load(ticket) {
            self.shared.gateway.release(&previous);
        }
        let attempt = entry.attempts() + 1;
        let placement = Arc::clone(entry.placement());
        self.registry.upsert(entry).await;

        self.shared.bus.publish(
            self.event(EventKind::LoadStarted, &placement)
                .with_attempt(attempt),
        );

        let Some(me) = self.me.upgrade() else {
            return;
        };
        let request = LoadRequest {
            category: self.category,
            placement: Arc::clone(&placement),
            unit_id: self.params.unit_id.clone(),
            attempt,
        };
        tokio::spawn(async move {
            let result = AssertUnwindSafe(me.shared.gateway.load(request))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(LoadError::Internal {
                        error: format!("provider panicked: {}", panic_message(&*panic)),
                    })
                });
            me.finish_load(&placement, ticket, result).await;
        });
    }

    /// Applies a gateway result, or discards it if the load was superseded.
    async fn finish_load(
        &self,
        placement: &Arc<str>,
        ticket: u64,
        result: Result<AdHandle, LoadError>,
    ) {
        let _owner = self.owner.lock().await;
        let current = self
            .registry
            .get(placement)
            .await
            .filter(|e| e.ticket() == ticket && e.state() == EntryState::Loading);

        let Some(mut entry) = current else {
            let mut ev = self.event(EventKind::ResultDiscarded, placement);
            if let Ok(handle) = &result {
                self.shared.gateway.release(handle);
                ev = ev.with_handle(handle.id());
            }
            self.shared.bus.publish(ev);
            return;
        };

        match result {
            Ok(handle) => {
                let id = handle.id();
                entry.complete_load(handle, Instant::now());
                self.registry.upsert(entry).await;
                self.shared
                    .bus
                    .publish(self.event(EventKind::Loaded, placement).with_handle(id));
            }
            Err(err) => {
                let failures = entry.fail_load(self.params.retry.max_attempts);
                self.registry.upsert(entry).await;
                self.shared.bus.publish(
                    self.event(EventKind::LoadFailed, placement)
                        .with_attempt(failures)
                        .with_reason(err.as_message()),
                );

                if self.params.retry.should_retry(failures) {
                    let delay = self.params.retry.delay_for(failures);
                    self.schedule_retry(placement, ticket, delay);
                    self.shared.bus.publish(
                        self.event(EventKind::RetryScheduled, placement)
                            .with_attempt(failures)
                            .with_delay(delay),
                    );
                } else {
                    self.shared.bus.publish(
                        self.event(EventKind::RetriesExhausted, placement)
                            .with_attempt(failures),
                    );
                }
            }
        }
    }

    fn schedule_retry(&self, placement: &Arc<str>, ticket: u64, delay: Duration) {
        let me = self.me.clone();
        let key = Arc::clone(placement);
        self.retries
            .schedule_once(Arc::clone(placement), delay, move || async move {
                if let Some(me) = me.upgrade() {
                    me.retry_due(&key, ticket).await;
                }
            });
    }

    /// Retry timer callback: reloads only if the failure it was armed for is still current.
    async fn retry_due(&self, placement: &str, ticket: u64) {
        let _owner = self.owner.lock().await;
        let Some(entry) = self.registry.get(placement).await else {
            return;
        };
        if entry.state() != EntryState::Failed || entry.ticket() != ticket {
            return;
        }
        self.start_load(entry).await;
    }

    // ---------------------------
    // Presentation path
    // ---------------------------

    /// Presents a full-screen resource and waits for it to end.
    ///
    /// The presentation runs on its own task, so dropping this future does not
    /// leave the entry stuck in `Showing`.
    pub(crate) async fn show(&self, placement: &str) -> Result<DismissReason, ShowError> {
        if !self.category.is_full_screen() {
            return Err(ShowError::Unsupported {
                category: self.category,
            });
        }
        let not_available = || ShowError::NotAvailable {
            placement: Arc::from(placement),
        };

        let (guard, handle, ticket, key) = {
            let _owner = self.owner.lock().await;
            let now = Instant::now();
            let Some(mut entry) = self
                .registry
                .get(placement)
                .await
                .filter(|e| e.is_fresh(now, self.expiry(e)))
            else {
                return Err(not_available());
            };

            let key = Arc::clone(entry.placement());
            let guard = self
                .shared
                .stage
                .try_claim(self.category, &key)
                .map_err(|(category, placement)| ShowError::AlreadyShowing {
                    category,
                    placement,
                })?;

            let ticket = self.next_ticket();
            let Some(handle) = entry.begin_show(ticket) else {
                return Err(not_available());
            };
            self.registry.upsert(entry).await;
            self.shared.bus.publish(
                self.event(EventKind::ShowStarted, &key)
                    .with_handle(handle.id()),
            );
            (guard, handle, ticket, key)
        };

        let Some(me) = self.me.upgrade() else {
            return Err(not_available());
        };
        let presentation = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(me.shared.gateway.present(&handle))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(ShowError::Presentation {
                        error: format!("provider panicked: {}", panic_message(&*panic)),
                    })
                });
            me.finish_show(&key, ticket, &handle, &outcome, guard).await;
            outcome
        });

        match presentation.await {
            Ok(outcome) => outcome,
            Err(join) => Err(ShowError::Presentation {
                error: format!("presentation task failed: {join}"),
            }),
        }
    }

    /// Ends a presentation: releases the consumed handle, frees the stage and
    /// starts loading the next resource.
    async fn finish_show(
        &self,
        placement: &Arc<str>,
        ticket: u64,
        handle: &AdHandle,
        outcome: &Result<DismissReason, ShowError>,
        guard: StageGuard,
    ) {
        let _owner = self.owner.lock().await;
        drop(guard);

        let mut ev = match outcome {
            Ok(DismissReason::Closed) => self.event(EventKind::Dismissed, placement),
            Ok(DismissReason::Rewarded(reward)) => self
                .event(EventKind::Dismissed, placement)
                .with_reason(format!("rewarded {} {}", reward.amount, reward.kind)),
            Err(err) => self
                .event(EventKind::ShowFailed, placement)
                .with_reason(err.as_message()),
        };
        ev = ev.with_handle(handle.id());

        let current = self
            .registry
            .get(placement)
            .await
            .filter(|e| e.ticket() == ticket && e.state() == EntryState::Showing);

        match current {
            Some(mut entry) => {
                if let Some(consumed) = entry.end_show() {
                    self.shared.gateway.release(&consumed);
                }
                self.shared.bus.publish(ev);
                self.start_load(entry).await;
            }
            // Disposed mid-presentation: disposal already released the handle.
            None => self.shared.bus.publish(ev),
        }
    }

    // ---------------------------
    // Refresh path
    // ---------------------------

    /// Arms a periodic refresh for a banner placement. Returns the effective interval.
    pub(crate) async fn schedule_refresh(
        &self,
        placement: &str,
        interval: Option<Duration>,
    ) -> Result<Duration, ScheduleError> {
        let Some(period) = self.params.policy.refresh_for(interval) else {
            return Err(ScheduleError::Unsupported {
                category: self.category,
            });
        };

        let _owner = self.owner.lock().await;
        let mut entry = self
            .registry
            .get(placement)
            .await
            .unwrap_or_else(|| ResourceEntry::new(placement, self.category));
        entry.set_refresh_override(interval.map(|_| period));
        let key = Arc::clone(entry.placement());
        self.registry.upsert(entry).await;

        let me = self.me.clone();
        let tick_key = Arc::clone(&key);
        self.refreshes
            .schedule_every(Arc::clone(&key), period, move || {
                let me = me.clone();
                let key = Arc::clone(&tick_key);
                async move {
                    if let Some(me) = me.upgrade() {
                        me.refresh_tick(&key).await;
                    }
                }
            });

        self.shared
            .bus
            .publish(self.event(EventKind::RefreshScheduled, &key).with_delay(period));
        Ok(period)
    }

    /// Stops the periodic refresh of `placement`. Returns `true` if one was armed.
    pub(crate) fn cancel_refresh(&self, placement: &str) -> bool {
        self.refreshes.cancel(placement)
    }

    /// Refresh timer callback: replaces a ready, visible resource.
    async fn refresh_tick(&self, placement: &str) {
        let _owner = self.owner.lock().await;
        let Some(mut entry) = self.registry.get(placement).await else {
            return;
        };

        let skip = if !self.shared.auto_refresh.load(Ordering::Acquire) {
            Some("disabled")
        } else if !entry.is_visible() {
            Some("hidden")
        } else if entry.state() != EntryState::Ready {
            Some("not_ready")
        } else {
            None
        };
        if let Some(reason) = skip {
            self.shared.bus.publish(
                self.event(EventKind::RefreshSkipped, entry.placement())
                    .with_reason(reason),
            );
            return;
        }

        let mut ev = self.event(EventKind::Refreshed, entry.placement());
        if let Some(stale) = entry.take_handle() {
            self.shared.gateway.release(&stale);
            ev = ev.with_handle(stale.id());
        }
        self.shared.bus.publish(ev);
        self.start_load(entry).await;
    }

    /// Marks a placement on- or off-screen; refresh ticks are dropped while hidden.
    pub(crate) async fn set_visible(&self, placement: &str, visible: bool) {
        let _owner = self.owner.lock().await;
        let existing = self.registry.get(placement).await;
        let created = existing.is_none();
        let mut entry = existing.unwrap_or_else(|| ResourceEntry::new(placement, self.category));
        if !created && entry.is_visible() == visible {
            return;
        }
        entry.set_visible(visible);
        let key = Arc::clone(entry.placement());
        self.registry.upsert(entry).await;

        self.shared.bus.publish(
            self.event(EventKind::VisibilityChanged, &key)
                .with_reason(if visible { "visible" } else { "hidden" }),
        );
    }

    // ---------------------------
    // Teardown
    // ---------------------------

    /// Releases the handle (if any) and evicts the entry. Idempotent.
    pub(crate) async fn dispose(&self, placement: &str) {
        let _owner = self.owner.lock().await;
        self.retries.cancel(placement);
        self.refreshes.cancel(placement);

        if let Some(entry) = self.registry.remove(placement).await {
            self.release_evicted(entry);
        }
    }

    /// Disposes every entry of this category.
    pub(crate) async fn dispose_all(&self) {
        let _owner = self.owner.lock().await;
        self.retries.cancel_all();
        self.refreshes.cancel_all();

        for entry in self.registry.drain().await {
            self.release_evicted(entry);
        }
    }

    fn release_evicted(&self, mut entry: ResourceEntry) {
        let mut ev = self.event(EventKind::Disposed, entry.placement());
        if let Some(handle) = entry.take_handle() {
            self.shared.gateway.release(&handle);
            ev = ev.with_handle(handle.id());
        }
        self.shared.bus.publish(ev);
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    fn expiry(&self, entry: &ResourceEntry) -> Option<Duration> {
        self.params.policy.expiry(entry.refresh_override())
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::Relaxed)
    }

    fn event(&self, kind: EventKind, placement: &Arc<str>) -> Event {
        Event::entry(kind, self.category, Arc::clone(placement))
    }
}
