//! # Keyed, cancellable deferred tasks.
//!
//! [`TimerSlots`] holds at most one pending timer per placement id. Scheduling
//! under a key cancels whatever was there; disposal cancels deterministically
//! instead of relying on the callback to notice.
//!
//! ```text
//! schedule_once(key, delay, f)   ─► sleep(delay) ─► f()            (slot freed before f runs)
//! schedule_every(key, period, f) ─► tick ─► f() ─► tick ─► f() ... (missed ticks skipped)
//! cancel(key) / cancel_all()     ─► CancellationToken::cancel()
//! ```
//!
//! Every slot token is a child of the manager runtime token, so shutdown stops
//! all timers at once.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

struct Slot {
    id: u64,
    token: CancellationToken,
}

type Slots = Arc<Mutex<HashMap<Arc<str>, Slot>>>;

/// Pending timers keyed by placement id.
pub(crate) struct TimerSlots {
    parent: CancellationToken,
    next_id: AtomicU64,
    slots: Slots,
}

impl TimerSlots {
    pub(crate) fn new(parent: CancellationToken) -> Self {
        Self {
            parent,
            next_id: AtomicU64::new(1),
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Runs `f` once after `delay`, unless cancelled or replaced first.
    pub(crate) fn schedule_once<F, Fut>(&self, key: Arc<str>, delay: Duration, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (id, token) = self.arm(&key);
        let slots = Arc::clone(&self.slots);

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = time::sleep(delay) => {}
            }
            free(&slots, &key, id);
            f().await;
        });
    }

    /// Runs `f` every `period` (first run after one period) until cancelled or replaced.
    ///
    /// Ticks missed while `f` is running are skipped, not queued.
    pub(crate) fn schedule_every<F, Fut>(&self, key: Arc<str>, period: Duration, mut f: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (_, token) = self.arm(&key);
        let period = period.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => f().await,
                }
            }
        });
    }

    /// Cancels the timer under `key`. Returns `true` if one was pending.
    pub(crate) fn cancel(&self, key: &str) -> bool {
        match self.lock().remove(key) {
            Some(slot) => {
                slot.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels every pending timer.
    pub(crate) fn cancel_all(&self) {
        for (_, slot) in self.lock().drain() {
            slot.token.cancel();
        }
    }

    /// Returns `true` if a timer is pending under `key`.
    pub(crate) fn is_scheduled(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn arm(&self, key: &Arc<str>) -> (u64, CancellationToken) {
        let token = self.parent.child_token();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let previous = self.lock().insert(
            Arc::clone(key),
            Slot {
                id,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.token.cancel();
        }
        (id, token)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Arc<str>, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Frees the slot of a fired one-shot timer, unless it was already replaced.
fn free(slots: &Slots, key: &str, id: u64) {
    let mut slots = slots.lock().unwrap_or_else(PoisonError::into_inner);
    if slots.get(key).is_some_and(|slot| slot.id == id) {
        slots.remove(key);
    }
}
