//! Adaptive decision engine
//!
//! Per request: derive features → honeypot short-circuit → classifier → remap →
//! heuristic boost → trust adjustment → clamp → attack-intensity update → trust
//! update → dynamic thresholds → decision.
//!
//! Trust is read once before scoring and written once after, through the store's
//! atomic delta. The classifier runs before any state is touched, so a failed or
//! late classifier call leaves intensity and trust exactly as they were.

use crate::classifier::{check_feature_order, Classifier};
use crate::config::EngineConfig;
use crate::error::{ClassifierError, ConfigError, RiskError};
use crate::features::FeatureDeriver;
use crate::heuristics::ProtectionHeuristics;
use crate::intensity::AttackIntensityTracker;
use crate::remapper::ScoreRemapper;
use crate::session::{validate_features, ValidatedRequest};
use crate::store::StateStore;
use crate::thresholds::decide;
use crate::trust::TrustMemory;
use crate::types::{Decision, Identity, RiskAssessment, SessionFeatures};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Score forced by a honeypot hit
pub const HONEYPOT_SCORE: f64 = 100.0;

/// Classifier output after validation and remapping
struct ScoredProbability {
    raw: f64,
    remapped: f64,
}

/// Stateless-per-request engine; all cross-request state lives in the store
pub struct DecisionEngine {
    config: EngineConfig,
    remapper: ScoreRemapper,
    heuristics: ProtectionHeuristics,
    intensity: AttackIntensityTracker,
    trust: TrustMemory,
    classifier: Arc<dyn Classifier>,
    store: Arc<dyn StateStore>,
}

impl DecisionEngine {
    /// Build an engine, failing fast on invalid config or feature-schema drift
    pub fn new(
        config: EngineConfig,
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn StateStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        check_feature_order(classifier.as_ref())?;

        let remapper = config.remapper()?;
        let heuristics = ProtectionHeuristics::with_cap(config.boost_cap);
        let intensity = AttackIntensityTracker::new(config.decay_rate, config.intensity_divisor);
        let trust = TrustMemory::new(config.trust);

        info!(
            config_version = %config.version,
            model_version = %classifier.version(),
            anchors = remapper.anchors().len(),
            "decision engine ready"
        );

        Ok(Self {
            config,
            remapper,
            heuristics,
            intensity,
            trust,
            classifier,
            store,
        })
    }

    /// Engine with the reference configuration
    pub fn with_defaults(
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn StateStore>,
    ) -> Result<Self, ConfigError> {
        Self::new(EngineConfig::default(), classifier, store)
    }

    /// Assess a request that already passed envelope validation
    pub fn assess_request(&self, request: &ValidatedRequest) -> Result<RiskAssessment, RiskError> {
        self.assess(&request.features, &request.identity)
    }

    /// Assess one session for one identity
    pub fn assess(
        &self,
        session: &SessionFeatures,
        identity: &Identity,
    ) -> Result<RiskAssessment, RiskError> {
        validate_features(session)?;

        if session.honeypot_triggered {
            return Ok(self.assess_honeypot(identity));
        }

        let derived = FeatureDeriver::derive(session);
        let vector = FeatureDeriver::to_vector(session, &derived);
        let probability = self.score_probability(&vector)?;

        // Nothing below can fail; state mutation starts here
        let breakdown = self.heuristics.evaluate(session);
        let trust_snapshot = self.trust.current(self.store.as_ref(), identity);

        let score = (probability.remapped * 100.0
            + f64::from(breakdown.boost)
            + self.trust.policy().score_adjustment(trust_snapshot))
        .clamp(0.0, 100.0);

        let attack_intensity = self.intensity.update(self.store.as_ref(), score);
        let user_trust = self
            .trust
            .adjust(self.store.as_ref(), identity, trust_snapshot, score);

        let thresholds = self.config.thresholds.dynamic(attack_intensity);
        let decision = decide(score, &thresholds);

        debug!(
            identity = %identity,
            raw = probability.raw,
            remapped = probability.remapped,
            boost = breakdown.boost,
            trust = trust_snapshot,
            score,
            attack_intensity,
            decision = %decision,
            "session assessed"
        );

        Ok(RiskAssessment {
            assessment_id: Uuid::new_v4().to_string(),
            assessed_at: Utc::now(),
            identity: identity.clone(),
            final_risk_score: score,
            raw_probability: Some(probability.raw),
            remapped_probability: Some(probability.remapped),
            boost: breakdown.boost,
            triggered_rules: breakdown.triggered(),
            attack_intensity,
            user_trust,
            thresholds,
            honeypot: false,
            decision,
        })
    }

    /// Deterministic BLOCK; the classifier is never consulted
    fn assess_honeypot(&self, identity: &Identity) -> RiskAssessment {
        let trust_snapshot = self.trust.current(self.store.as_ref(), identity);
        let attack_intensity = self.intensity.update(self.store.as_ref(), HONEYPOT_SCORE);
        let user_trust = self
            .trust
            .penalize_honeypot(self.store.as_ref(), identity, trust_snapshot);
        let thresholds = self.config.thresholds.dynamic(attack_intensity);

        warn!(identity = %identity, user_trust, attack_intensity, "honeypot triggered, blocking");

        RiskAssessment {
            assessment_id: Uuid::new_v4().to_string(),
            assessed_at: Utc::now(),
            identity: identity.clone(),
            final_risk_score: HONEYPOT_SCORE,
            raw_probability: None,
            remapped_probability: None,
            boost: 0,
            triggered_rules: Vec::new(),
            attack_intensity,
            user_trust,
            thresholds,
            honeypot: true,
            decision: Decision::Block,
        }
    }

    /// Call the classifier, enforce the deadline and output range, then remap.
    ///
    /// The deadline is checked once `predict` returns; a late answer is
    /// discarded, but a call that never returns is not interrupted.
    fn score_probability(&self, vector: &[f64]) -> Result<ScoredProbability, RiskError> {
        let started = Instant::now();
        let raw = self.classifier.predict(vector)?;
        let elapsed = started.elapsed();

        if let Some(limit_ms) = self.config.classifier_timeout_ms {
            if elapsed > Duration::from_millis(limit_ms) {
                return Err(RiskError::ClassifierTimeout {
                    limit_ms,
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }
        }

        if !raw.is_finite() || !(0.0..=1.0).contains(&raw) {
            return Err(ClassifierError::InvalidProbability(raw).into());
        }

        Ok(ScoredProbability {
            raw,
            remapped: self.remapper.transform(raw),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn remapper(&self) -> &ScoreRemapper {
        &self.remapper
    }

    pub fn heuristics(&self) -> &ProtectionHeuristics {
        &self.heuristics
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn classifier_version(&self) -> String {
        self.classifier.version()
    }

    /// Current global attack intensity
    pub fn attack_intensity(&self) -> f64 {
        self.intensity.current(self.store.as_ref())
    }

    /// Current trust for an identity
    pub fn user_trust(&self, identity: &Identity) -> i32 {
        self.trust.current(self.store.as_ref(), identity)
    }
}
