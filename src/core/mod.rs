//! Runtime core: caching, state transitions and timers.
//!
//! The public API from this module is [`AdManager`] (built with
//! [`AdManagerBuilder`]), the [`Placements`] view, and the entry types it exposes.
//!
//! Internal modules:
//! - `controller`: per-category state machine, serialized by an owner lock;
//! - `registry`: placement id → entry map;
//! - `schedule`: keyed, cancellable retry/refresh timers;
//! - `stage`: global full-screen exclusivity;
//! - `manager`: context root wiring everything together.

mod builder;
mod config;
mod controller;
mod entry;
mod facade;
mod manager;
mod registry;
mod schedule;
mod stage;

pub use builder::AdManagerBuilder;
pub use config::ManagerConfig;
pub use entry::{EntryState, ResourceEntry};
pub use facade::{PlacementWatch, Placements};
pub use manager::AdManager;
