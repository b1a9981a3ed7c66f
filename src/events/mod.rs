//! Lifecycle events and the bus that carries them.
//!
//! - [`Event`] a single state-transition record (placement, category, attempt, ...)
//! - [`EventKind`] classification of transitions
//! - [`Bus`] broadcast channel shared by every controller

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
