//! Per-category limit tiers.
//!
//! A [`LimitTier`] holds the *configured* rate and burst for a category;
//! the values actually enforced on a given request are an [`EffectiveLimit`],
//! produced by scaling the tier with the current [`GlobalParameters`]
//! snapshot so that auto-tuning moves every category proportionally.

use crate::domain::event::Category;
use crate::domain::params::GlobalParameters;
use std::collections::BTreeMap;

/// Configured limits for one category.
///
/// `capacity` is the pre-burst baseline: the enforced burst is
/// `capacity × burst_factor`, so a tier with `capacity == rate` yields the
/// classic "one second of traffic, times the burst factor" bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LimitTier {
    /// Replenishment rate in tokens per second.
    pub rate: f64,
    /// Baseline burst size, scaled by the global burst factor at decision time.
    pub capacity: f64,
}

impl LimitTier {
    /// Create a tier from rate and baseline capacity.
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self { rate, capacity }
    }

    /// A tier whose capacity equals one second of traffic at `rate`.
    pub fn per_second(rate: f64) -> Self {
        Self {
            rate,
            capacity: rate,
        }
    }
}

/// Mapping from category to tier, with fallback to a default tier.
///
/// Unmapped categories (including [`Category::Default`] itself) resolve to
/// the default tier, so a table with no overrides throttles every request
/// kind identically.
#[derive(Debug, Clone)]
pub struct TierTable {
    default: LimitTier,
    overrides: BTreeMap<Category, LimitTier>,
}

impl TierTable {
    /// Create a table with only a default tier.
    pub fn new(default: LimitTier) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    /// Add or replace a per-category override.
    pub fn set(&mut self, category: Category, tier: LimitTier) {
        self.overrides.insert(category, tier);
    }

    /// The configured tier for a category, falling back to the default.
    pub fn resolve(&self, category: Category) -> LimitTier {
        self.overrides.get(&category).copied().unwrap_or(self.default)
    }

    /// The default tier.
    pub fn default_tier(&self) -> LimitTier {
        self.default
    }

    /// Number of per-category overrides.
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    /// Iterate over the configured overrides.
    pub fn overrides(&self) -> impl Iterator<Item = (&Category, &LimitTier)> {
        self.overrides.iter()
    }

    /// The limits enforced for `category` under the given parameter snapshot.
    ///
    /// Rates scale with the tuned rate (`current_rate / base_rate`), so the
    /// default tier tracks `current_rate` exactly and overrides keep their
    /// configured ratio to it. Capacity scales with the burst factor.
    pub fn effective(&self, category: Category, params: &GlobalParameters) -> EffectiveLimit {
        let tier = self.resolve(category);
        EffectiveLimit {
            rate: tier.rate * params.rate_scale(),
            capacity: tier.capacity * params.burst_factor,
        }
    }
}

/// The limits actually enforced on one decision: a tier scaled by the
/// current parameter snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveLimit {
    /// Tokens replenished per second.
    pub rate: f64,
    /// Maximum tokens (token bucket) or maximum events per window (sliding
    /// window, floored).
    pub capacity: f64,
}

impl EffectiveLimit {
    /// The sliding-window admission cap: capacity floored to whole events.
    pub fn window_slots(&self) -> usize {
        if self.capacity <= 0.0 {
            0
        } else {
            self.capacity as usize
        }
    }
}
