//! Dynamic decision thresholds
//!
//! Base cutoffs shift down linearly with attack intensity. ALLOW tightens twice
//! as fast as SOFT/HARD so confused-human scores (~48-55) stay inside the SOFT
//! band even at full intensity: `62 - 1.0 * 5 = 57 > 55`.

use crate::error::ConfigError;
use crate::types::{Decision, DynamicThresholds};
use serde::{Deserialize, Serialize};

/// Base cutoffs and per-unit-intensity slopes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdPolicy {
    pub base_allow: f64,
    pub base_soft: f64,
    pub base_hard: f64,
    pub allow_slope: f64,
    pub soft_slope: f64,
    pub hard_slope: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            base_allow: 25.0,
            base_soft: 62.0,
            base_hard: 80.0,
            allow_slope: 10.0,
            soft_slope: 5.0,
            hard_slope: 5.0,
        }
    }
}

impl ThresholdPolicy {
    /// Check `allow <= soft <= hard` for every intensity in [0, 1].
    ///
    /// Each gap is linear in intensity, so it is non-negative on the whole
    /// interval iff it is non-negative at both endpoints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            self.base_allow,
            self.base_soft,
            self.base_hard,
            self.allow_slope,
            self.soft_slope,
            self.hard_slope,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "thresholds",
                reason: "all thresholds and slopes must be finite".to_string(),
            });
        }

        for intensity in [0.0, 1.0] {
            let t = self.dynamic(intensity);
            if t.allow > t.soft || t.soft > t.hard {
                return Err(ConfigError::ThresholdOrdering {
                    intensity,
                    allow: t.allow,
                    soft: t.soft,
                    hard: t.hard,
                });
            }
        }
        Ok(())
    }

    /// Cutoffs at the given attack intensity
    pub fn dynamic(&self, intensity: f64) -> DynamicThresholds {
        DynamicThresholds {
            allow: self.base_allow - intensity * self.allow_slope,
            soft: self.base_soft - intensity * self.soft_slope,
            hard: self.base_hard - intensity * self.hard_slope,
        }
    }
}

/// Map a clamped score onto a decision band
pub fn decide(score: f64, thresholds: &DynamicThresholds) -> Decision {
    if score < thresholds.allow {
        Decision::Allow
    } else if score < thresholds.soft {
        Decision::SoftCaptcha
    } else if score < thresholds.hard {
        Decision::HardCaptcha
    } else {
        Decision::Block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_base_thresholds_at_zero_intensity() {
        let t = ThresholdPolicy::default().dynamic(0.0);
        assert_eq!(
            t,
            DynamicThresholds {
                allow: 25.0,
                soft: 62.0,
                hard: 80.0
            }
        );
    }

    #[test]
    fn test_full_intensity_keeps_confused_humans_soft() {
        let t = ThresholdPolicy::default().dynamic(1.0);
        assert_eq!(t.allow, 15.0);
        assert_eq!(t.soft, 57.0);
        assert_eq!(t.hard, 75.0);
        assert_eq!(decide(55.0, &t), Decision::SoftCaptcha);
    }

    #[test]
    fn test_band_ordering_over_intensity_range() {
        let policy = ThresholdPolicy::default();
        policy.validate().unwrap();

        for step in 0..=1_000 {
            let intensity = step as f64 / 1_000.0;
            let t = policy.dynamic(intensity);
            assert!(t.allow <= t.soft, "allow > soft at {intensity}");
            assert!(t.soft <= t.hard, "soft > hard at {intensity}");
        }
    }

    #[test]
    fn test_band_edges() {
        let t = ThresholdPolicy::default().dynamic(0.0);
        assert_eq!(decide(0.0, &t), Decision::Allow);
        assert_eq!(decide(24.99, &t), Decision::Allow);
        assert_eq!(decide(25.0, &t), Decision::SoftCaptcha);
        assert_eq!(decide(61.99, &t), Decision::SoftCaptcha);
        assert_eq!(decide(62.0, &t), Decision::HardCaptcha);
        assert_eq!(decide(79.99, &t), Decision::HardCaptcha);
        assert_eq!(decide(80.0, &t), Decision::Block);
        assert_eq!(decide(100.0, &t), Decision::Block);
    }

    #[test]
    fn test_rejects_overlapping_bands() {
        // Soft slope steep enough that soft drops below allow at full intensity
        let policy = ThresholdPolicy {
            base_allow: 25.0,
            base_soft: 30.0,
            allow_slope: 0.0,
            soft_slope: 10.0,
            ..ThresholdPolicy::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(ConfigError::ThresholdOrdering { intensity, .. }) if intensity == 1.0
        ));
    }

    #[test]
    fn test_rejects_non_finite() {
        let policy = ThresholdPolicy {
            base_hard: f64::INFINITY,
            ..ThresholdPolicy::default()
        };
        assert!(policy.validate().is_err());
    }
}
