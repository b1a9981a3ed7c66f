//! # Manager configuration.
//!
//! Provides [`ManagerConfig`], the centralized settings for an [`AdManager`](crate::AdManager).
//!
//! Config is used in two ways:
//! 1. **Manager creation**: `AdManager::builder(gateway).with_config(cfg)`
//! 2. **Policy derivation**: [`ManagerConfig::policy_for`] and [`ManagerConfig::retry_policy`]
//!
//! It can be deserialized from JSON; durations are written as integer seconds and
//! every field is optional:
//! ```json
//! { "refresh_interval": 75, "max_attempts": 5, "unit_ids": { "banner": "ca-banner-1" } }
//! ```
//!
//! ## Clamping
//! - `refresh_interval` is clamped into the 60–120s pacing window when applied
//! - `max_attempts = 0` is treated as `1`
//! - `bus_capacity = 0` is treated as `1`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policies::{Category, CategoryPolicy, RetryPolicy};

/// Global configuration for the ad lifecycle manager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Default banner refresh cadence (and banner expiry).
    #[serde(with = "secs")]
    pub refresh_interval: Duration,

    /// Whether periodic refresh timers act on their ticks.
    ///
    /// When `false`, ticks are dropped; schedules stay armed and resume when re-enabled.
    pub enable_auto_refresh: bool,

    /// Cache ceiling for app-open resources.
    #[serde(with = "secs")]
    pub max_cache_duration: Duration,

    /// Consecutive load failures before automatic retries stop.
    pub max_attempts: u32,

    /// Fixed delay between a failed load and its retry.
    #[serde(with = "secs")]
    pub retry_delay: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Provider unit id per category, forwarded in every load request.
    pub unit_ids: HashMap<Category, String>,
}

impl ManagerConfig {
    /// Parses a configuration from JSON, filling missing fields with defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Returns the lifecycle rules of `category` under this configuration.
    pub fn policy_for(&self, category: Category) -> CategoryPolicy {
        CategoryPolicy::new(category, self.refresh_interval, self.max_cache_duration)
    }

    /// Returns the retry policy (fixed delay, clamped attempt cap).
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.max_attempts, self.retry_delay)
    }

    /// Returns the configured unit id of `category`, if any.
    pub fn unit_id(&self, category: Category) -> Option<Arc<str>> {
        self.unit_ids.get(&category).map(|id| Arc::from(id.as_str()))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for ManagerConfig {
    /// Default configuration:
    ///
    /// - `refresh_interval = 90s`
    /// - `enable_auto_refresh = true`
    /// - `max_cache_duration = 4h`
    /// - `max_attempts = 3`
    /// - `retry_delay = 5s`
    /// - `bus_capacity = 1024`
    /// - no unit ids
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(90),
            enable_auto_refresh: true,
            max_cache_duration: Duration::from_secs(4 * 60 * 60),
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
            bus_capacity: 1024,
            unit_ids: HashMap::new(),
        }
    }
}

/// Durations as whole seconds.
mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
