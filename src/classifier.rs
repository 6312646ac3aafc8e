//! Classifier capability
//!
//! The engine treats the trained model as an opaque `predict(vector) -> P(bot)`
//! provider. Providers declare the feature order they were trained on so the
//! engine can refuse to start on schema drift.

use crate::error::{ClassifierError, ConfigError};
use crate::features::FEATURE_ORDER;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Probability-of-bot provider
pub trait Classifier: Send + Sync {
    /// P(bot) for one feature vector laid out in `feature_order()`
    fn predict(&self, features: &[f64]) -> Result<f64, ClassifierError>;

    /// Feature names in the order `predict` expects them
    fn feature_order(&self) -> Vec<String>;

    /// Model version reported in logs and diagnostics
    fn version(&self) -> String;
}

/// Standard scaler: `(x - mean) / scale` per column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    /// Identity scaler for `width` columns
    pub fn identity(width: usize) -> Self {
        Self {
            mean: vec![0.0; width],
            scale: vec![1.0; width],
        }
    }

    pub fn validate(&self, width: usize) -> Result<(), ConfigError> {
        if self.mean.len() != width {
            return Err(ConfigError::ArtifactLength {
                field: "scaler.mean",
                expected: width,
                actual: self.mean.len(),
            });
        }
        if self.scale.len() != width {
            return Err(ConfigError::ArtifactLength {
                field: "scaler.scale",
                expected: width,
                actual: self.scale.len(),
            });
        }
        if let Some(bad) = self.scale.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "scaler.scale",
                reason: format!("scales must be positive and finite, found {bad}"),
            });
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "scaler.mean",
                reason: "means must be finite".to_string(),
            });
        }
        Ok(())
    }

    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }
}

/// Serialized model: scaler plus logistic weights over a named feature order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: String,
    pub feature_order: Vec<String>,
    pub scaler: FeatureScaler,
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl ModelArtifact {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Zero-weight model over the engine's feature order; always predicts
    /// `sigmoid(bias)`
    pub fn constant(version: &str, bias: f64) -> Self {
        let width = FEATURE_ORDER.len();
        Self {
            version: version.to_string(),
            feature_order: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            scaler: FeatureScaler::identity(width),
            weights: vec![0.0; width],
            bias,
        }
    }
}

/// Logistic-regression provider loaded from a [`ModelArtifact`]
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    artifact: ModelArtifact,
}

impl LogisticClassifier {
    /// Validate artifact shape and build the classifier
    pub fn new(artifact: ModelArtifact) -> Result<Self, ConfigError> {
        let width = artifact.feature_order.len();
        artifact.scaler.validate(width)?;
        if artifact.weights.len() != width {
            return Err(ConfigError::ArtifactLength {
                field: "weights",
                expected: width,
                actual: artifact.weights.len(),
            });
        }
        if artifact.weights.iter().any(|w| !w.is_finite()) || !artifact.bias.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "weights",
                reason: "weights and bias must be finite".to_string(),
            });
        }
        Ok(Self { artifact })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::new(ModelArtifact::from_file(path)?)
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }
}

impl Classifier for LogisticClassifier {
    fn predict(&self, features: &[f64]) -> Result<f64, ClassifierError> {
        let expected = self.artifact.weights.len();
        if features.len() != expected {
            return Err(ClassifierError::DimensionMismatch {
                expected,
                actual: features.len(),
            });
        }

        let scaled = self.artifact.scaler.transform(features);
        let logit = scaled
            .iter()
            .zip(&self.artifact.weights)
            .fold(self.artifact.bias, |acc, (x, w)| acc + x * w);

        Ok(1.0 / (1.0 + (-logit).exp()))
    }

    fn feature_order(&self) -> Vec<String> {
        self.artifact.feature_order.clone()
    }

    fn version(&self) -> String {
        self.artifact.version.clone()
    }
}

/// Compare a provider's feature order against the engine schema
pub fn check_feature_order(classifier: &dyn Classifier) -> Result<(), ConfigError> {
    let provided = classifier.feature_order();
    let mismatch = |detail: String| ConfigError::FeatureSchemaMismatch {
        schema: crate::features::FEATURE_SCHEMA_VERSION.to_string(),
        detail,
    };

    if provided.len() != FEATURE_ORDER.len() {
        return Err(mismatch(format!(
            "expected {} features, classifier declares {}",
            FEATURE_ORDER.len(),
            provided.len()
        )));
    }

    for (index, (expected, actual)) in FEATURE_ORDER.iter().zip(&provided).enumerate() {
        if expected != actual {
            return Err(mismatch(format!(
                "column {index} is {actual}, expected {expected}"
            )));
        }
    }
    Ok(())
}
