//! # Resource categories and their lifecycle rules.
//!
//! [`Category`] names the kind of resource; [`CategoryPolicy`] captures the
//! rules that differ between kinds:
//!
//! | Category       | Auto refresh | Expiry                   | Single use |
//! |----------------|--------------|--------------------------|------------|
//! | `Banner`       | opt-in, 90s  | its refresh interval     | no         |
//! | `Native`       | never        | none                     | no         |
//! | `Interstitial` | never        | none                     | yes        |
//! | `Rewarded`     | never        | none                     | yes        |
//! | `AppOpen`      | never        | `max_cache` (4h)         | yes        |

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lower bound of the provider pacing window for banner refresh.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Upper bound of the provider pacing window for banner refresh.
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(120);

/// Kind of rented resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Inline rectangle, refreshed on a timer.
    Banner,
    /// Inline content rendered by the host.
    Native,
    /// Full-screen, single-use, shown between screens.
    Interstitial,
    /// Full-screen, single-use, grants a reward on completion.
    Rewarded,
    /// Full-screen, single-use, shown on cold start; expires after a long ceiling.
    AppOpen,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 5] = [
        Category::Banner,
        Category::Native,
        Category::Interstitial,
        Category::Rewarded,
        Category::AppOpen,
    ];

    /// Returns the canonical snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Banner => "banner",
            Category::Native => "native",
            Category::Interstitial => "interstitial",
            Category::Rewarded => "rewarded",
            Category::AppOpen => "app_open",
        }
    }

    /// Full-screen categories are presented with `show` and are globally exclusive.
    #[must_use]
    pub const fn is_full_screen(self) -> bool {
        matches!(
            self,
            Category::Interstitial | Category::Rewarded | Category::AppOpen
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamps a banner refresh interval into the provider pacing window.
#[inline]
pub(crate) fn clamp_refresh(interval: Duration) -> Duration {
    interval.clamp(MIN_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL)
}

/// Lifecycle rules for one category.
///
/// Built by [`ManagerConfig::policy_for`](crate::ManagerConfig::policy_for).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryPolicy {
    /// Category this policy applies to.
    pub category: Category,
    /// Default refresh cadence (`None` = never refreshed on a timer).
    pub refresh_interval: Option<Duration>,
    /// Cache ceiling after which a ready resource is unusable (`None` = no ceiling).
    pub max_cache: Option<Duration>,
    /// Whether a shown resource must be discarded and reloaded.
    pub one_shot: bool,
}

impl CategoryPolicy {
    /// Builds the policy of `category` from the configured banner cadence and
    /// app-open ceiling.
    pub fn new(category: Category, refresh_interval: Duration, max_cache: Duration) -> Self {
        match category {
            Category::Banner => Self {
                category,
                refresh_interval: Some(clamp_refresh(refresh_interval)),
                max_cache: None,
                one_shot: false,
            },
            Category::Native => Self {
                category,
                refresh_interval: None,
                max_cache: None,
                one_shot: false,
            },
            Category::Interstitial | Category::Rewarded => Self {
                category,
                refresh_interval: None,
                max_cache: None,
                one_shot: true,
            },
            Category::AppOpen => Self {
                category,
                refresh_interval: None,
                max_cache: Some(max_cache),
                one_shot: true,
            },
        }
    }

    /// Whether this category accepts a periodic refresh schedule.
    #[inline]
    pub fn supports_refresh(&self) -> bool {
        self.refresh_interval.is_some()
    }

    /// Refresh cadence for a placement, honouring its override.
    ///
    /// Overrides are clamped into the pacing window. Returns `None` for
    /// categories that never refresh.
    pub fn refresh_for(&self, override_interval: Option<Duration>) -> Option<Duration> {
        let base = self.refresh_interval?;
        Some(override_interval.map(clamp_refresh).unwrap_or(base))
    }

    /// How long a ready resource stays usable (`None` = until consumed or disposed).
    ///
    /// Refreshing categories expire with their refresh interval; others use the
    /// cache ceiling, if any.
    pub fn expiry(&self, override_interval: Option<Duration>) -> Option<Duration> {
        self.refresh_for(override_interval).or(self.max_cache)
    }
}
