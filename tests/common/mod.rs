#![allow(dead_code)]

use riskgate::classifier::Classifier;
use riskgate::error::{ClassifierError, StoreError};
use riskgate::store::StateStore;
use riskgate::{DecisionEngine, Identity, MemoryStore, SessionFeatures, FEATURE_ORDER};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Deterministic classifier returning one probability
pub struct FixedClassifier {
    probability: f64,
    calls: AtomicUsize,
}

impl FixedClassifier {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for FixedClassifier {
    fn predict(&self, features: &[f64]) -> Result<f64, ClassifierError> {
        assert_eq!(features.len(), FEATURE_ORDER.len());
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.probability)
    }

    fn feature_order(&self) -> Vec<String> {
        FEATURE_ORDER.iter().map(|s| s.to_string()).collect()
    }

    fn version(&self) -> String {
        format!("fixed-{}", self.probability)
    }
}

pub struct BrokenClassifier;

impl Classifier for BrokenClassifier {
    fn predict(&self, _features: &[f64]) -> Result<f64, ClassifierError> {
        Err(ClassifierError::Unavailable("inference backend down".to_string()))
    }

    fn feature_order(&self) -> Vec<String> {
        FEATURE_ORDER.iter().map(|s| s.to_string()).collect()
    }

    fn version(&self) -> String {
        "broken".to_string()
    }
}

/// Store that is always unreachable
pub struct OfflineStore;

impl StateStore for OfflineStore {
    fn get_scalar(&self, _key: &str) -> Result<Option<f64>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn set_scalar(&self, _key: &str, _value: f64) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn update_scalar(
        &self,
        _key: &str,
        _update: &dyn Fn(Option<f64>) -> f64,
    ) -> Result<f64, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

pub fn engine(probability: f64) -> (DecisionEngine, Arc<MemoryStore>, Arc<FixedClassifier>) {
    let store = Arc::new(MemoryStore::new());
    let classifier = Arc::new(FixedClassifier::new(probability));
    let engine = DecisionEngine::with_defaults(classifier.clone(), store.clone())
        .expect("reference configuration is valid");
    (engine, store, classifier)
}

pub fn identity(name: &str) -> Identity {
    Identity::new(name).expect("non-blank identity")
}

/// Baseline session; no heuristic rule fires
pub fn baseline_session() -> SessionFeatures {
    SessionFeatures {
        session_duration: 180.0,
        avg_typing_speed: 5.8,
        typing_variance: 2.1,
        mouse_move_count: 350.0,
        click_interval_avg: 910.0,
        mouse_path_length: 15_200.0,
        backspace_count: 4.0,
        focus_changes: 2.0,
        idle_time_ratio: 0.3,
        key_hold_time_mean: 98.0,
        key_flight_time_variance: 52.0,
        correction_delay_mean: 380.0,
        paste_usage_count: 0.0,
        mouse_acceleration_mean: 1.2,
        mouse_direction_changes: 88.0,
        click_randomness_score: 0.7,
        requests_per_minute: 3.5,
        session_request_count: 14.0,
        burst_score: 0.1,
        honeypot_triggered: false,
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
