#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adkeeper::{
    AdHandle, AdManager, DismissReason, Event, EventKind, LoadError, LoadRequest, ManagerConfig,
    ProviderGateway, ShowError,
};
use async_trait::async_trait;
use tokio::sync::{broadcast, Notify};

/// Scripted provider: fills by default, fails when told to, records everything.
pub struct ScriptedGateway {
    next_id: AtomicU64,
    outcomes: Mutex<VecDeque<LoadError>>,
    load_latency: Mutex<Duration>,
    present_latency: Mutex<Duration>,
    present_outcome: Mutex<Result<DismissReason, ShowError>>,
    hold_presentations: AtomicBool,
    panic_next_load: AtomicBool,
    panic_next_present: AtomicBool,
    dismiss: Notify,
    requests: Mutex<Vec<LoadRequest>>,
    issued: Mutex<Vec<u64>>,
    released: Mutex<Vec<u64>>,
    presented: Mutex<Vec<u64>>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            outcomes: Mutex::new(VecDeque::new()),
            load_latency: Mutex::new(Duration::ZERO),
            present_latency: Mutex::new(Duration::ZERO),
            present_outcome: Mutex::new(Ok(DismissReason::Closed)),
            hold_presentations: AtomicBool::new(false),
            panic_next_load: AtomicBool::new(false),
            panic_next_present: AtomicBool::new(false),
            dismiss: Notify::new(),
            requests: Mutex::new(Vec::new()),
            issued: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
            presented: Mutex::new(Vec::new()),
        })
    }

    /// The next `n` loads fail with `err`.
    pub fn fail_next(&self, n: usize, err: LoadError) {
        let mut outcomes = self.outcomes.lock().unwrap();
        outcomes.extend(std::iter::repeat(err).take(n));
    }

    pub fn set_load_latency(&self, latency: Duration) {
        *self.load_latency.lock().unwrap() = latency;
    }

    pub fn set_present_latency(&self, latency: Duration) {
        *self.present_latency.lock().unwrap() = latency;
    }

    pub fn set_present_outcome(&self, outcome: Result<DismissReason, ShowError>) {
        *self.present_outcome.lock().unwrap() = outcome;
    }

    /// Presentations block until [`ScriptedGateway::dismiss`] is called.
    pub fn hold_presentations(&self) {
        self.hold_presentations.store(true, Ordering::SeqCst);
    }

    /// The next load panics instead of returning.
    pub fn panic_next_load(&self) {
        self.panic_next_load.store(true, Ordering::SeqCst);
    }

    /// The next presentation panics instead of returning.
    pub fn panic_next_present(&self) {
        self.panic_next_present.store(true, Ordering::SeqCst);
    }

    pub fn dismiss(&self) {
        self.dismiss.notify_one();
    }

    pub fn load_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<LoadRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn issued(&self) -> Vec<u64> {
        self.issued.lock().unwrap().clone()
    }

    pub fn released(&self) -> Vec<u64> {
        self.released.lock().unwrap().clone()
    }

    pub fn presented(&self) -> Vec<u64> {
        self.presented.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderGateway for ScriptedGateway {
    async fn load(&self, request: LoadRequest) -> Result<AdHandle, LoadError> {
        self.requests.lock().unwrap().push(request);
        let latency = *self.load_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.panic_next_load.swap(false, Ordering::SeqCst) {
            panic!("sdk crashed while loading");
        }

        let scripted = self.outcomes.lock().unwrap().pop_front();
        match scripted {
            Some(err) => Err(err),
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                self.issued.lock().unwrap().push(id);
                Ok(AdHandle::new(id))
            }
        }
    }

    async fn present(&self, handle: &AdHandle) -> Result<DismissReason, ShowError> {
        self.presented.lock().unwrap().push(handle.id());
        if self.hold_presentations.load(Ordering::SeqCst) {
            self.dismiss.notified().await;
        }
        let latency = *self.present_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.panic_next_present.swap(false, Ordering::SeqCst) {
            panic!("sdk crashed while presenting");
        }
        self.present_outcome.lock().unwrap().clone()
    }

    fn release(&self, handle: &AdHandle) {
        self.released.lock().unwrap().push(handle.id());
    }
}

/// Lets every spawned task run until it blocks on a timer or a lock.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

pub fn manager(gateway: &Arc<ScriptedGateway>) -> Arc<AdManager> {
    manager_with(gateway, ManagerConfig::default())
}

pub fn manager_with(gateway: &Arc<ScriptedGateway>, cfg: ManagerConfig) -> Arc<AdManager> {
    AdManager::builder(gateway.clone()).with_config(cfg).build()
}

/// Empties `rx` without waiting.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

pub fn kinds(events: &[Event]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}

/// Panics if any handle id was released more than once.
pub fn assert_released_once(released: &[u64]) {
    let unique: HashSet<u64> = released.iter().copied().collect();
    assert_eq!(unique.len(), released.len(), "double release in {released:?}");
}
