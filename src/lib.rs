//! riskgate - Adaptive human/bot risk decisions from behavioral session telemetry
//!
//! riskgate turns a classifier's bot probability into a stable four-way action
//! (ALLOW / SOFT_CAPTCHA / HARD_CAPTCHA / BLOCK) through a deterministic pipeline:
//! feature derivation → honeypot short-circuit → classifier → score remapping →
//! heuristic boost → trust adjustment → attack-intensity update → dynamic
//! thresholds → decision.
//!
//! ## Modules
//!
//! - **Decision Engine**: orchestrates scoring over an injected classifier and state store
//! - **Score Remapper**: piecewise-linear recalibration of raw probabilities
//! - **Protection Heuristics**: rule table separating stealth bots from confused humans
//! - **Attack Intensity / Trust Memory**: the two pieces of cross-request state

pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod heuristics;
pub mod intensity;
pub mod pipeline;
pub mod remapper;
pub mod session;
pub mod store;
pub mod thresholds;
pub mod trust;
pub mod types;

// HTTP surface (actix-web)
#[cfg(feature = "server")]
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use classifier::{Classifier, LogisticClassifier, ModelArtifact};
pub use config::EngineConfig;
pub use engine::DecisionEngine;
pub use error::{ClassifierError, ConfigError, RiskError, StoreError};
pub use features::{FEATURE_ORDER, FEATURE_SCHEMA_VERSION};
pub use heuristics::ProtectionHeuristics;
pub use pipeline::RiskProcessor;
pub use remapper::{Anchor, ScoreRemapper};
pub use session::{parse_request, AssessRequest};
pub use store::{MemoryStore, StateStore};
pub use types::{Decision, Identity, RiskAssessment, SessionFeatures};

/// riskgate version embedded in diagnostics
pub const RISKGATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI and HTTP surface
pub const PRODUCER_NAME: &str = "riskgate";
