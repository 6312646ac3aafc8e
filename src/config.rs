//! Engine configuration
//!
//! Loaded once at process start and immutable afterwards. `Default` reproduces
//! the reference calibration; a JSON file can override any subset of it.

use crate::error::ConfigError;
use crate::heuristics::DEFAULT_BOOST_CAP;
use crate::intensity::{DEFAULT_DECAY_RATE, DEFAULT_SCORE_DIVISOR};
use crate::remapper::{Anchor, ScoreRemapper, DEFAULT_ANCHORS};
use crate::thresholds::ThresholdPolicy;
use crate::trust::TrustPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Version label of the built-in configuration
pub const DEFAULT_CONFIG_VERSION: &str = "builtin-1";

/// Complete decision-engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub version: String,
    pub anchors: Vec<Anchor>,
    pub thresholds: ThresholdPolicy,
    pub decay_rate: f64,
    pub intensity_divisor: f64,
    pub trust: TrustPolicy,
    pub boost_cap: u8,
    /// Requests whose classifier call exceeds this fail without side effects.
    /// Checked after the call returns; a hung provider is not interrupted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_CONFIG_VERSION.to_string(),
            anchors: DEFAULT_ANCHORS.to_vec(),
            thresholds: ThresholdPolicy::default(),
            decay_rate: DEFAULT_DECAY_RATE,
            intensity_divisor: DEFAULT_SCORE_DIVISOR,
            trust: TrustPolicy::default(),
            boost_cap: DEFAULT_BOOST_CAP,
            classifier_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Build the remapper, validating anchors
    pub fn remapper(&self) -> Result<ScoreRemapper, ConfigError> {
        ScoreRemapper::new(self.anchors.clone())
    }

    /// Reject any configuration the engine could not run safely
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.remapper()?;
        self.thresholds.validate()?;

        if !(self.decay_rate > 0.0 && self.decay_rate <= 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "decay_rate",
                reason: format!("must be in (0, 1], got {}", self.decay_rate),
            });
        }
        if !(self.intensity_divisor.is_finite() && self.intensity_divisor > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "intensity_divisor",
                reason: format!("must be positive, got {}", self.intensity_divisor),
            });
        }

        let trust = &self.trust;
        if trust.min > 0 || trust.max < 0 {
            return Err(ConfigError::InvalidParameter {
                name: "trust",
                reason: format!("bounds [{}, {}] must contain 0", trust.min, trust.max),
            });
        }
        if trust.reward < 0 || trust.penalty < 0 || trust.honeypot_penalty < 0 {
            return Err(ConfigError::InvalidParameter {
                name: "trust",
                reason: "reward and penalties are magnitudes and must be non-negative"
                    .to_string(),
            });
        }
        if !(trust.score_weight.is_finite() && trust.reward_below <= trust.penalize_above) {
            return Err(ConfigError::InvalidParameter {
                name: "trust",
                reason: "score_weight must be finite and reward_below <= penalize_above"
                    .to_string(),
            });
        }

        Ok(())
    }
}
