//! # Full-screen stage: the single global presentation slot.
//!
//! At most one full-screen resource of any category may be `Showing`. A
//! controller claims the stage before presenting and holds a [`StageGuard`]
//! until the presentation ends; dropping the guard frees the stage.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::policies::Category;

type Occupant = (Category, Arc<str>);

/// Shared exclusivity slot for full-screen presentations.
#[derive(Default)]
pub(crate) struct Stage {
    occupant: Mutex<Option<Occupant>>,
}

impl Stage {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claims the stage for `(category, placement)`.
    ///
    /// Returns the current occupant if the stage is taken.
    pub(crate) fn try_claim(
        self: &Arc<Self>,
        category: Category,
        placement: &Arc<str>,
    ) -> Result<StageGuard, Occupant> {
        let mut occupant = self.lock();
        if let Some(current) = occupant.as_ref() {
            return Err(current.clone());
        }
        *occupant = Some((category, Arc::clone(placement)));
        Ok(StageGuard {
            stage: Arc::clone(self),
        })
    }

    /// Current occupant, if any.
    pub(crate) fn occupant(&self) -> Option<Occupant> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Occupant>> {
        self.occupant.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of stage ownership; frees the stage on drop.
pub(crate) struct StageGuard {
    stage: Arc<Stage>,
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        *self.stage.lock() = None;
    }
}
