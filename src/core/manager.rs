//! # AdManager: context root of the lifecycle manager.
//!
//! The [`AdManager`] owns one `LifecycleController` per [`Category`], the
//! shared event bus, the full-screen stage and the subscriber fan-out. It is the
//! single entry point the host application talks to.
//!
//! ## High-level architecture
//! ```text
//!   UI code ──► AdManager::{resource_for, show, schedule_refresh, dispose, ...}
//!                   │
//!                   ├──► controllers[Banner]       ─┐
//!                   ├──► controllers[Native]        │  each: registry + owner lock
//!                   ├──► controllers[Interstitial]  ├─ + retry/refresh timers
//!                   ├──► controllers[Rewarded]      │
//!                   └──► controllers[AppOpen]      ─┘
//!                               │  ProviderGateway::{load, present, release}
//!                               │  Bus::publish(Event)
//!                               ▼
//!   Bus ──► subscriber listener ──► SubscriberSet::emit(&Event) ──► per-subscriber workers
//! ```
//!
//! ## Shutdown path
//! ```text
//! shutdown()
//!   └─► dispose_all()            → every handle released, Disposed events published
//!   └─► runtime_token.cancel()   → propagates to every retry/refresh timer
//!   └─► listener drains the bus, then SubscriberSet::shutdown() drains the workers
//! ```
//!
//! Dropping the manager without `shutdown()` still cancels `runtime_token`, so no
//! timer outlives it. Cached handles are only released by `shutdown()`/`dispose_all()`.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use adkeeper::{
//!     AdHandle, AdManager, Category, DismissReason, LoadError, LoadRequest,
//!     ProviderGateway, ShowError,
//! };
//!
//! struct Sdk;
//!
//! #[async_trait]
//! impl ProviderGateway for Sdk {
//!     async fn load(&self, request: LoadRequest) -> Result<AdHandle, LoadError> {
//!         Ok(AdHandle::new(u64::from(request.attempt)))
//!     }
//!     async fn present(&self, _handle: &AdHandle) -> Result<DismissReason, ShowError> {
//!         Ok(DismissReason::Closed)
//!     }
//!     fn release(&self, _handle: &AdHandle) {}
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = AdManager::builder(Arc::new(Sdk)).build();
//!
//!     // First call misses and starts a load; later calls get the handle.
//!     let _ = manager.resource_for("home_footer", Category::Banner).await;
//!     manager
//!         .schedule_refresh("home_footer", Category::Banner, None)
//!         .await
//!         .ok();
//!
//!     manager.request_load("level_end", Category::Interstitial).await;
//!     if manager.is_available("level_end", Category::Interstitial).await {
//!         let _ = manager.show("level_end", Category::Interstitial).await;
//!     }
//!
//!     manager.shutdown().await;
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::builder::AdManagerBuilder;
use super::config::ManagerConfig;
use super::controller::LifecycleController;
use super::entry::{EntryState, ResourceEntry};
use super::facade::Placements;
use super::stage::Stage;
use crate::error::{ScheduleError, ShowError};
use crate::events::{Bus, Event};
use crate::policies::Category;
use crate::provider::{AdHandle, DismissReason, GatewayRef};

/// Process-wide owner of every cached ad resource.
pub struct AdManager {
    cfg: ManagerConfig,
    bus: Bus,
    controllers: [Arc<LifecycleController>; 5],
    stage: Arc<Stage>,
    auto_refresh: Arc<AtomicBool>,
    runtime_token: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl AdManager {
    /// Starts building a manager around `gateway`.
    pub fn builder(gateway: GatewayRef) -> AdManagerBuilder {
        AdManagerBuilder::new(gateway)
    }

    pub(crate) fn new_internal(
        cfg: ManagerConfig,
        bus: Bus,
        controllers: [Arc<LifecycleController>; 5],
        stage: Arc<Stage>,
        auto_refresh: Arc<AtomicBool>,
        runtime_token: CancellationToken,
        listener: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            cfg,
            bus,
            controllers,
            stage,
            auto_refresh,
            runtime_token,
            listener: Mutex::new(listener),
        }
    }

    /// Configuration the manager was built with.
    pub fn config(&self) -> &ManagerConfig {
        &self.cfg
    }

    /// Read-through view of one category.
    pub fn placements(&self, category: Category) -> Placements {
        Placements::new(Arc::clone(self.controller(category)))
    }

    /// Returns the cached handle if ready, otherwise starts a load and returns `None`.
    pub async fn resource_for(&self, placement: &str, category: Category) -> Option<AdHandle> {
        self.placements(category).resource_for(placement).await
    }

    /// State of `placement` (`Empty` if unknown).
    pub async fn status_of(&self, placement: &str, category: Category) -> EntryState {
        self.controller(category).status_of(placement).await
    }

    /// Snapshot of the entry for `placement`.
    pub async fn entry(&self, placement: &str, category: Category) -> Option<ResourceEntry> {
        self.controller(category).entry(placement).await
    }

    /// Snapshot of every entry in `category`, sorted by placement id.
    pub async fn entries(&self, category: Category) -> Vec<ResourceEntry> {
        self.controller(category).entries().await
    }

    /// Starts a load unless one is in flight or a fresh resource is cached.
    ///
    /// On a `Failed` entry whose retries are exhausted this resets the counter.
    pub async fn request_load(&self, placement: &str, category: Category) {
        self.controller(category).request_load(placement).await;
    }

    /// `true` if `placement` holds a ready, unexpired resource.
    pub async fn is_available(&self, placement: &str, category: Category) -> bool {
        self.controller(category).is_available(placement).await
    }

    /// `true` if an automatic retry is pending for `placement`.
    pub fn has_pending_retry(&self, placement: &str, category: Category) -> bool {
        self.controller(category).has_pending_retry(placement)
    }

    /// Presents a full-screen resource and resolves when it is dismissed.
    ///
    /// Fails fast with [`ShowError::NotAvailable`] if nothing usable is cached,
    /// and with [`ShowError::AlreadyShowing`] if any full-screen resource is on
    /// screen. After the presentation ends, the next load starts immediately.
    pub async fn show(
        &self,
        placement: &str,
        category: Category,
    ) -> Result<DismissReason, ShowError> {
        self.controller(category).show(placement).await
    }

    /// Full-screen resource currently on screen, if any.
    pub fn showing(&self) -> Option<(Category, Arc<str>)> {
        self.stage.occupant()
    }

    /// Arms a periodic refresh; `interval` defaults to the configured cadence.
    ///
    /// Only banners refresh; other categories yield [`ScheduleError::Unsupported`].
    /// The interval is clamped into 60–120s. Returns the effective interval.
    pub async fn schedule_refresh(
        &self,
        placement: &str,
        category: Category,
        interval: Option<Duration>,
    ) -> Result<Duration, ScheduleError> {
        self.controller(category)
            .schedule_refresh(placement, interval)
            .await
    }

    /// Stops the periodic refresh of a placement. Returns `true` if one was armed.
    pub fn cancel_refresh(&self, placement: &str, category: Category) -> bool {
        self.controller(category).cancel_refresh(placement)
    }

    /// Marks a placement as on- or off-screen.
    pub async fn set_visible(&self, placement: &str, category: Category, visible: bool) {
        self.controller(category).set_visible(placement, visible).await;
    }

    /// Enables or disables auto-refresh at runtime. Armed schedules stay armed.
    pub fn set_auto_refresh(&self, enabled: bool) {
        self.auto_refresh.store(enabled, Ordering::Release);
    }

    pub fn auto_refresh_enabled(&self) -> bool {
        self.auto_refresh.load(Ordering::Acquire)
    }

    /// Releases the resource of `placement`, cancels its timers and evicts it.
    pub async fn dispose(&self, placement: &str, category: Category) {
        self.controller(category).dispose(placement).await;
    }

    /// Disposes every placement of every category.
    pub async fn dispose_all(&self) {
        for controller in &self.controllers {
            controller.dispose_all().await;
        }
    }

    /// Subscribes to the raw event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Disposes everything, stops all timers and drains subscribers.
    pub async fn shutdown(&self) {
        self.dispose_all().await;
        self.runtime_token.cancel();

        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
    }

    fn controller(&self, category: Category) -> &Arc<LifecycleController> {
        &self.controllers[category as usize]
    }
}

impl Drop for AdManager {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}
