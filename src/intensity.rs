//! Global attack intensity tracking
//!
//! A leaky integrator over final risk scores: each update decays the stored
//! intensity and adds `score / divisor`, capped at 1.0. With no attack traffic it
//! falls geometrically toward zero (half-life ~14 requests at 0.95).

use crate::store::{StateStore, ATTACK_INTENSITY_KEY};
use tracing::warn;

/// Per-update decay multiplier
pub const DEFAULT_DECAY_RATE: f64 = 0.95;

/// Score divisor; a score of 100 adds ~0.667
pub const DEFAULT_SCORE_DIVISOR: f64 = 150.0;

/// Exponentially decayed estimate of ongoing attack pressure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackIntensityTracker {
    decay_rate: f64,
    score_divisor: f64,
}

impl Default for AttackIntensityTracker {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY_RATE, DEFAULT_SCORE_DIVISOR)
    }
}

impl AttackIntensityTracker {
    /// Parameters are validated by `EngineConfig::validate`
    pub fn new(decay_rate: f64, score_divisor: f64) -> Self {
        Self {
            decay_rate,
            score_divisor,
        }
    }

    /// One integrator step, pure
    pub fn step(&self, current: f64, latest_score: f64) -> f64 {
        (current * self.decay_rate + latest_score / self.score_divisor).clamp(0.0, 1.0)
    }

    /// Current intensity, 0 when unset or the store is unreachable
    pub fn current(&self, store: &dyn StateStore) -> f64 {
        match store.get_scalar(ATTACK_INTENSITY_KEY) {
            Ok(value) => value.unwrap_or(0.0).clamp(0.0, 1.0),
            Err(e) => {
                warn!(key = ATTACK_INTENSITY_KEY, error = %e, "attack intensity read failed, using 0");
                0.0
            }
        }
    }

    /// Fold a new score into the stored intensity and return the new value.
    ///
    /// If the store is down the step is computed from a neutral 0 and not persisted.
    pub fn update(&self, store: &dyn StateStore, latest_score: f64) -> f64 {
        let result = store.update_scalar(ATTACK_INTENSITY_KEY, &|current| {
            self.step(current.unwrap_or(0.0).clamp(0.0, 1.0), latest_score)
        });

        match result {
            Ok(intensity) => intensity,
            Err(e) => {
                warn!(key = ATTACK_INTENSITY_KEY, error = %e, "attack intensity update dropped");
                self.step(0.0, latest_score)
            }
        }
    }

    pub fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    pub fn score_divisor(&self) -> f64 {
        self.score_divisor
    }
}
