//! # Placements: per-category read-through view.
//!
//! [`Placements`] is what UI code holds for one category. It answers "give me
//! something to render for this placement" without ever blocking on the
//! provider: a miss returns `None` and starts a load in the background.
//!
//! [`PlacementWatch`] narrows the event bus to a single placement so callers can
//! re-query when its state changes.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};

use super::controller::LifecycleController;
use super::entry::EntryState;
use crate::events::Event;
use crate::policies::Category;
use crate::provider::AdHandle;

/// Read-through access to one category's placements.
#[derive(Clone)]
pub struct Placements {
    controller: Arc<LifecycleController>,
}

impl Placements {
    pub(crate) fn new(controller: Arc<LifecycleController>) -> Self {
        Self { controller }
    }

    pub fn category(&self) -> Category {
        self.controller.category()
    }

    /// Returns the cached handle if `Ready` and unexpired.
    ///
    /// Otherwise triggers a load (no-op if one is in flight) and returns `None`.
    pub async fn resource_for(&self, placement: &str) -> Option<AdHandle> {
        if let Some(handle) = self.controller.available_handle(placement).await {
            return Some(handle);
        }
        self.controller.request_load(placement).await;
        None
    }

    /// Current state of `placement` (`Empty` if unknown).
    pub async fn status_of(&self, placement: &str) -> EntryState {
        self.controller.status_of(placement).await
    }

    /// Marks `placement` as on- or off-screen.
    pub async fn set_visible(&self, placement: &str, visible: bool) {
        self.controller.set_visible(placement, visible).await;
    }

    /// Subscribes to events concerning `placement` only.
    pub fn watch(&self, placement: &str) -> PlacementWatch {
        PlacementWatch {
            rx: self.controller.bus().subscribe(),
            category: self.controller.category(),
            placement: Arc::from(placement),
        }
    }
}

/// Change notifications for a single placement.
pub struct PlacementWatch {
    rx: broadcast::Receiver<Event>,
    category: Category,
    placement: Arc<str>,
}

impl PlacementWatch {
    pub fn placement(&self) -> &str {
        &self.placement
    }

    /// Waits for the next event about this placement.
    ///
    /// Returns `None` once the manager is gone. Events dropped because the
    /// receiver lagged are skipped.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(ev) if ev.is_for(self.category, &self.placement) => return Some(ev),
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
