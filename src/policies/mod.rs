//! Per-category lifecycle rules and retry pacing.
//!
//! This module groups the knobs that control **when** a cached resource stops
//! being usable and **how** failed loads are retried.
//!
//! ## Contents
//! - [`Category`] the kind of resource (banner / native / interstitial / rewarded / app-open)
//! - [`CategoryPolicy`] refresh cadence, expiry ceiling and one-shot rule of a category
//! - [`RetryPolicy`] attempt cap and delay between failed loads
//!
//! ## Quick wiring
//! ```text
//! ManagerConfig ──► policy_for(category) ──► CategoryPolicy
//!               └─► retry_policy()       ──► RetryPolicy
//!      └─► core::controller::LifecycleController uses:
//!           - policy.expiry(override) to decide freshness
//!           - retry.delay_for(attempts) to schedule the next load
//! ```
//!
//! ## Defaults
//! - Banner refreshes every 90s (pacing window 60–120s) and expires with its refresh interval.
//! - Native never auto-refreshes and never expires.
//! - Interstitial / rewarded never expire but are single-use.
//! - App-open is single-use and expires after 4h.
//! - `RetryPolicy::default()` → 3 attempts, fixed 5s delay.

mod category;
mod retry;

pub use category::{Category, CategoryPolicy, MAX_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL};
pub use retry::RetryPolicy;
