//! # Event subscribers.
//!
//! [`Subscribe`] is the extension point for reacting to lifecycle events;
//! [`SubscriberSet`] fans events out to many subscribers without blocking the
//! controllers; [`LogWriter`] is the built-in subscriber that emits `tracing` records.
//!
//! ## Architecture
//! ```text
//! LifecycleController ── publish(Event) ──► Bus ──► manager listener ──► SubscriberSet
//!                                                                   ┌──────┼──────┐
//!                                                                   ▼      ▼      ▼
//!                                                              LogWriter Metrics Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use adkeeper::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct FillRate;
//!
//! #[async_trait]
//! impl Subscribe for FillRate {
//!     async fn on_event(&self, event: &Event) {
//!         match event.kind {
//!             EventKind::Loaded => { /* count fill */ }
//!             EventKind::LoadFailed => { /* count miss */ }
//!             _ => {}
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "fill_rate" }
//! }
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
