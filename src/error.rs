//! Error types used by the ad lifecycle manager and provider gateways.
//!
//! This module defines three error enums:
//!
//! - [`LoadError`]: the provider declined or failed to supply a resource.
//! - [`ShowError`]: a full-screen presentation could not happen or failed.
//! - [`ScheduleError`]: a refresh schedule was requested where none applies.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! None of them is fatal to the host: every failure degrades to "no resource available".

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

use crate::policies::Category;

/// # Errors produced while fetching a resource from the provider.
///
/// Every variant is recoverable: the lifecycle controller absorbs it and
/// schedules a bounded retry. Display code never observes a `LoadError`
/// directly, only the resulting `Failed` state.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Provider had no resource to serve for this request.
    #[error("no fill")]
    NoFill,

    /// Transport-level failure while reaching the provider.
    #[error("network error: {error}")]
    Network {
        /// The underlying error message.
        error: String,
    },

    /// Provider rejected the request (bad unit id, misconfiguration).
    #[error("invalid request: {error}")]
    InvalidRequest {
        /// The underlying error message.
        error: String,
    },

    /// Provider-side internal failure.
    #[error("internal provider error: {error}")]
    Internal {
        /// The underlying error message.
        error: String,
    },
}

impl LoadError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use adkeeper::LoadError;
    ///
    /// assert_eq!(LoadError::NoFill.as_label(), "load_no_fill");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LoadError::NoFill => "load_no_fill",
            LoadError::Network { .. } => "load_network",
            LoadError::InvalidRequest { .. } => "load_invalid_request",
            LoadError::Internal { .. } => "load_internal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LoadError::NoFill => "provider had no fill".to_string(),
            LoadError::Network { error } => format!("network: {error}"),
            LoadError::InvalidRequest { error } => format!("invalid request: {error}"),
            LoadError::Internal { error } => format!("internal: {error}"),
        }
    }
}

/// # Errors surfaced by `show`.
///
/// These always reach the caller synchronously as a typed result.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShowError {
    /// No fresh `Ready` resource exists for the placement.
    ///
    /// The core does not retry this; the caller decides whether to request
    /// a load and wait.
    #[error("no resource available for placement {placement:?}")]
    NotAvailable {
        /// Placement that was asked to show.
        placement: Arc<str>,
    },

    /// Another full-screen resource is currently showing.
    #[error("full-screen resource already showing: {category}/{placement}")]
    AlreadyShowing {
        /// Category of the resource currently on screen.
        category: Category,
        /// Placement of the resource currently on screen.
        placement: Arc<str>,
    },

    /// The provider failed to present the resource.
    ///
    /// The handle is discarded and a fresh resource is loaded; a shown
    /// resource is never retried.
    #[error("presentation failed: {error}")]
    Presentation {
        /// The underlying error message.
        error: String,
    },

    /// The category is not a full-screen category.
    #[error("category {category} cannot be shown full-screen")]
    Unsupported {
        /// The offending category.
        category: Category,
    },
}

impl ShowError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use adkeeper::ShowError;
    ///
    /// let err = ShowError::NotAvailable { placement: "home".into() };
    /// assert_eq!(err.as_label(), "show_not_available");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ShowError::NotAvailable { .. } => "show_not_available",
            ShowError::AlreadyShowing { .. } => "show_already_showing",
            ShowError::Presentation { .. } => "show_presentation_failed",
            ShowError::Unsupported { .. } => "show_unsupported",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ShowError::NotAvailable { placement } => format!("not available: {placement}"),
            ShowError::AlreadyShowing {
                category,
                placement,
            } => format!("already showing: {category}/{placement}"),
            ShowError::Presentation { error } => format!("presentation: {error}"),
            ShowError::Unsupported { category } => format!("unsupported: {category}"),
        }
    }

    /// Indicates whether the error was raised before any state change.
    ///
    /// `NotAvailable`, `AlreadyShowing` and `Unsupported` leave the entry untouched;
    /// `Presentation` consumed the handle.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, ShowError::Presentation { .. })
    }
}

/// # Errors produced when scheduling periodic refresh.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Only banner placements refresh on a timer.
    #[error("category {category} does not support scheduled refresh")]
    Unsupported {
        /// The offending category.
        category: Category,
    },
}

impl ScheduleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ScheduleError::Unsupported { .. } => "schedule_unsupported",
        }
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
