//! # adkeeper
//!
//! **adkeeper** is a lifecycle manager for rented display resources (ads).
//!
//! It keeps at most one cached resource per placement, loads them through an
//! opaque [`ProviderGateway`], expires and refreshes them on category-specific
//! timers, retries failed loads a bounded number of times, and guarantees that
//! only one full-screen resource is ever on screen.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Placements  │   │  Placements  │   │   AdManager  │
//!     │   (banner)   │   │   (native)   │   │ show/dispose │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  AdManager (context root)                                         │
//! │  - Bus (broadcast events)                                         │
//! │  - Stage (global full-screen slot)                                │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! │  - one LifecycleController per Category                           │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │  Controller  │   │  Controller  │   │  Controller  │   │
//!     │  registry +  │   │  registry +  │   │  registry +  │   │
//!     │  timers      │   │  timers      │   │  timers      │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ Publishes:       │                  │                 │
//!      │ - LoadStarted    │ - Loaded         │ - ShowStarted   │
//!      │ - LoadFailed     │ - Expired        │ - Dismissed     │
//!      │ - RetryScheduled │ - Refreshed      │ - ...           │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: ManagerConfig::bus_capacity)              │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                          (per-sub queues)
//!                       ┌───────────┼───────────┐
//!                       ▼           ▼           ▼
//!                   LogWriter    custom1     customN
//! ```
//!
//! ### Lifecycle
//! ```text
//! resource_for(p) ──► hit: Ready & fresh ──► Some(handle)
//!                 └─► miss ──► request_load(p) ──► None
//!
//! request_load:
//!   Empty/Failed ──► Loading ──► gateway.load()
//!                                 ├─ Ok  ──► Ready   (Loaded)
//!                                 └─ Err ──► Failed  (LoadFailed)
//!                                             ├─ attempts < max ─► RetryScheduled, reload after delay
//!                                             └─ attempts = max ─► RetriesExhausted, wait for request_load
//!
//! show (full-screen only):
//!   Ready ──► Showing ──► gateway.present() ──► Empty ──► request_load (next use)
//!
//! refresh tick (banner):
//!   visible & Ready ──► release ──► Loading
//!   hidden / disabled / not ready ──► RefreshSkipped
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------|---------------------------------------------|
//! | **Manager**       | Cache, load, show, refresh and dispose resources.        | [`AdManager`], [`Placements`]               |
//! | **Provider seam** | Plug in the real ad network.                              | [`ProviderGateway`], [`AdHandle`]           |
//! | **Policies**      | Per-category expiry/refresh rules and retry pacing.       | [`CategoryPolicy`], [`RetryPolicy`]         |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom).    | [`Subscribe`], [`LogWriter`]                |
//! | **Errors**        | Typed load/show/schedule failures.                        | [`LoadError`], [`ShowError`]                |
//! | **Configuration** | Centralize manager settings, loadable from JSON.          | [`ManagerConfig`]                           |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use adkeeper::{AdManager, Category, LogWriter, ManagerConfig, Subscribe};
//! # use adkeeper::{AdHandle, DismissReason, LoadError, LoadRequest, ProviderGateway, ShowError};
//! # struct Sdk;
//! # #[async_trait::async_trait]
//! # impl ProviderGateway for Sdk {
//! #     async fn load(&self, _: LoadRequest) -> Result<AdHandle, LoadError> { Err(LoadError::NoFill) }
//! #     async fn present(&self, _: &AdHandle) -> Result<DismissReason, ShowError> { Ok(DismissReason::Closed) }
//! #     fn release(&self, _: &AdHandle) {}
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), serde_json::Error> {
//!     let cfg = ManagerConfig::from_json(r#"{ "refresh_interval": 75 }"#)?;
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!
//!     let manager = AdManager::builder(Arc::new(Sdk))
//!         .with_config(cfg)
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let banners = manager.placements(Category::Banner);
//!     if banners.resource_for("home_footer").await.is_none() {
//!         // render a placeholder; a load is in flight
//!     }
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod policies;
mod provider;
mod subscribers;

pub use crate::core::{
    AdManager, AdManagerBuilder, EntryState, ManagerConfig, PlacementWatch, Placements,
    ResourceEntry,
};
pub use error::{LoadError, ScheduleError, ShowError};
pub use events::{Bus, Event, EventKind};
pub use policies::{
    Category, CategoryPolicy, RetryPolicy, MAX_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL,
};
pub use provider::{AdHandle, DismissReason, GatewayRef, LoadRequest, ProviderGateway, Reward};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
