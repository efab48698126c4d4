//! Engine configuration.
//!
//! Numeric policy knobs live here so the rest of the engine stays free of
//! hardcoded table constants. Hosts tune band thresholds to their scene
//! scale; the remaining windows have sensible defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::RangeBand;

/// Numeric thresholds for the five ordered distance bands.
///
/// A distance `d` is inside a band when `d <= threshold(band)`. Bands are
/// strictly ordered: melee < very close < close < far; `VeryFar` is
/// unbounded and has no threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeBandThresholds {
    pub melee: f64,
    pub very_close: f64,
    pub close: f64,
    pub far: f64,
}

impl Default for RangeBandThresholds {
    fn default() -> Self {
        // Scene distance units (feet on a default grid).
        Self {
            melee: 5.0,
            very_close: 15.0,
            close: 30.0,
            far: 60.0,
        }
    }
}

impl RangeBandThresholds {
    /// Upper distance bound for a band, `None` for the unbounded outermost band.
    #[must_use]
    pub fn threshold(&self, band: RangeBand) -> Option<f64> {
        match band {
            RangeBand::Melee => Some(self.melee),
            RangeBand::VeryClose => Some(self.very_close),
            RangeBand::Close => Some(self.close),
            RangeBand::Far => Some(self.far),
            RangeBand::VeryFar => None,
        }
    }

    /// Classify a distance into the closest band containing it.
    #[must_use]
    pub fn band_of(&self, distance: f64) -> RangeBand {
        if distance <= self.melee {
            RangeBand::Melee
        } else if distance <= self.very_close {
            RangeBand::VeryClose
        } else if distance <= self.close {
            RangeBand::Close
        } else if distance <= self.far {
            RangeBand::Far
        } else {
            RangeBand::VeryFar
        }
    }
}

/// Tunable engine policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Distance band thresholds for range conditions.
    pub bands: RangeBandThresholds,

    /// How long an attacker-inference cache entry stays eligible for
    /// matching. Entries older than this are discarded unmatched.
    pub attacker_window: Duration,

    /// Coalescing window for token-movement / targeting rescans.
    pub move_debounce: Duration,

    /// Maximum chain recursion depth. Depth equal to the limit is refused.
    pub max_chain_depth: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bands: RangeBandThresholds::default(),
            attacker_window: Duration::from_secs(10),
            move_debounce: Duration::from_millis(300),
            max_chain_depth: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_classification_is_ordered() {
        let bands = RangeBandThresholds::default();
        assert_eq!(bands.band_of(0.0), RangeBand::Melee);
        assert_eq!(bands.band_of(5.0), RangeBand::Melee);
        assert_eq!(bands.band_of(5.1), RangeBand::VeryClose);
        assert_eq!(bands.band_of(60.0), RangeBand::Far);
        assert_eq!(bands.band_of(1000.0), RangeBand::VeryFar);
    }
}
