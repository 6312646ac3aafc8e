//! Piecewise-linear score remapping
//!
//! Re-calibrates the classifier's raw P(bot) into the target decision bands so a
//! retrained classifier only needs new anchors, not new thresholds.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// One `(raw, target)` calibration point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub raw: f64,
    pub target: f64,
}

impl Anchor {
    pub const fn new(raw: f64, target: f64) -> Self {
        Self { raw, target }
    }
}

/// Reference calibration.
///
/// Clear humans (raw ~0.03-0.05) land at 0.07-0.15, the overlap region around 0.50
/// maps to itself, clear bots (raw ~0.95-0.98) land at 0.82-0.93.
pub const DEFAULT_ANCHORS: [Anchor; 11] = [
    Anchor::new(0.00, 0.03),
    Anchor::new(0.04, 0.10),
    Anchor::new(0.10, 0.20),
    Anchor::new(0.20, 0.25),
    Anchor::new(0.35, 0.30),
    Anchor::new(0.50, 0.50),
    Anchor::new(0.65, 0.70),
    Anchor::new(0.80, 0.75),
    Anchor::new(0.90, 0.80),
    Anchor::new(0.96, 0.87),
    Anchor::new(1.00, 0.97),
];

/// Piecewise-linear remapper with clamping outside the anchor range
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRemapper {
    anchors: Vec<Anchor>,
}

impl Default for ScoreRemapper {
    fn default() -> Self {
        Self {
            anchors: DEFAULT_ANCHORS.to_vec(),
        }
    }
}

impl ScoreRemapper {
    /// Build a remapper from anchors sorted by strictly increasing raw value.
    ///
    /// Anchors are validated here, never sorted on the caller's behalf.
    pub fn new(anchors: Vec<Anchor>) -> Result<Self, ConfigError> {
        if anchors.is_empty() {
            return Err(ConfigError::EmptyAnchors);
        }

        for (index, anchor) in anchors.iter().enumerate() {
            let in_range = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
            if !in_range(anchor.raw) || !in_range(anchor.target) {
                return Err(ConfigError::AnchorOutOfRange {
                    index,
                    raw: anchor.raw,
                    target: anchor.target,
                });
            }
        }

        for (index, pair) in anchors.windows(2).enumerate() {
            if pair[1].raw <= pair[0].raw {
                return Err(ConfigError::UnsortedAnchors {
                    index: index + 1,
                    previous: pair[0].raw,
                    current: pair[1].raw,
                });
            }
        }

        Ok(Self { anchors })
    }

    /// Map a raw probability onto the target band.
    ///
    /// NaN maps to the lowest target; the engine rejects non-finite
    /// probabilities before they get here.
    pub fn transform(&self, raw: f64) -> f64 {
        let first = self.anchors[0];
        let last = self.anchors[self.anchors.len() - 1];

        if raw.is_nan() || raw <= first.raw {
            return first.target;
        }
        if raw >= last.raw {
            return last.target;
        }

        // First anchor strictly above raw; raw sits in [lower.raw, upper.raw)
        let upper_index = self.anchors.partition_point(|a| a.raw <= raw);
        let lower = self.anchors[upper_index - 1];
        let upper = self.anchors[upper_index];

        if raw == lower.raw {
            return lower.target;
        }

        let t = (raw - lower.raw) / (upper.raw - lower.raw);
        lower.target + t * (upper.target - lower.target)
    }

    /// Map a batch of raw probabilities
    pub fn transform_all(&self, raws: &[f64]) -> Vec<f64> {
        raws.iter().map(|raw| self.transform(*raw)).collect()
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Whether targets never decrease, i.e. `transform` is monotonic
    pub fn is_monotonic(&self) -> bool {
        self.anchors.windows(2).all(|w| w[1].target >= w[0].target)
    }
}
