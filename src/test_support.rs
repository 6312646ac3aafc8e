//! Shared fixtures for unit tests

use crate::classifier::Classifier;
use crate::error::{ClassifierError, StoreError};
use crate::features::FEATURE_ORDER;
use crate::store::{MemoryStore, StateStore};
use crate::types::SessionFeatures;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

fn engine_feature_order() -> Vec<String> {
    FEATURE_ORDER.iter().map(|s| s.to_string()).collect()
}

/// Classifier that always returns the same probability and counts calls
pub struct StubClassifier {
    probability: f64,
    calls: AtomicUsize,
}

impl StubClassifier {
    pub fn fixed(probability: f64) -> Self {
        Self {
            probability,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for StubClassifier {
    fn predict(&self, _features: &[f64]) -> Result<f64, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.probability)
    }

    fn feature_order(&self) -> Vec<String> {
        engine_feature_order()
    }

    fn version(&self) -> String {
        "stub".to_string()
    }
}

pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn predict(&self, _features: &[f64]) -> Result<f64, ClassifierError> {
        Err(ClassifierError::Unavailable("model not loaded".to_string()))
    }

    fn feature_order(&self) -> Vec<String> {
        engine_feature_order()
    }

    fn version(&self) -> String {
        "failing".to_string()
    }
}

/// Classifier that answers 0.5 after a fixed delay
pub struct SlowClassifier {
    delay: Duration,
}

impl SlowClassifier {
    pub fn new(delay_ms: u64) -> Self {
        Self::from_duration(Duration::from_millis(delay_ms))
    }

    pub fn from_duration(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Classifier for SlowClassifier {
    fn predict(&self, _features: &[f64]) -> Result<f64, ClassifierError> {
        thread::sleep(self.delay);
        Ok(0.5)
    }

    fn feature_order(&self) -> Vec<String> {
        engine_feature_order()
    }

    fn version(&self) -> String {
        "slow".to_string()
    }
}

/// Store whose every call fails
pub struct FailingStore;

impl StateStore for FailingStore {
    fn get_scalar(&self, _key: &str) -> Result<Option<f64>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn set_scalar(&self, _key: &str, _value: f64) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn update_scalar(
        &self,
        _key: &str,
        _update: &dyn Fn(Option<f64>) -> f64,
    ) -> Result<f64, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Store that serves reads from a seeded map and rejects every write
pub struct ReadOnlyStore {
    inner: MemoryStore,
}

impl ReadOnlyStore {
    pub fn seeded(key: &str, value: f64) -> Self {
        let inner = MemoryStore::new();
        inner.set_scalar(key, value).unwrap();
        Self { inner }
    }
}

impl StateStore for ReadOnlyStore {
    fn get_scalar(&self, key: &str) -> Result<Option<f64>, StoreError> {
        self.inner.get_scalar(key)
    }

    fn set_scalar(&self, _key: &str, _value: f64) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("replica is read-only".to_string()))
    }

    fn update_scalar(
        &self,
        _key: &str,
        _update: &dyn Fn(Option<f64>) -> f64,
    ) -> Result<f64, StoreError> {
        Err(StoreError::Unavailable("replica is read-only".to_string()))
    }
}

/// Relaxed human: varied typing, random clicks, low request volume
pub fn human_session() -> SessionFeatures {
    SessionFeatures {
        session_duration: 240.0,
        avg_typing_speed: 6.5,
        typing_variance: 2.4,
        mouse_move_count: 420.0,
        click_interval_avg: 850.0,
        mouse_path_length: 18_500.0,
        backspace_count: 6.0,
        focus_changes: 3.0,
        idle_time_ratio: 0.22,
        key_hold_time_mean: 105.0,
        key_flight_time_variance: 48.0,
        correction_delay_mean: 420.0,
        paste_usage_count: 0.0,
        mouse_acceleration_mean: 1.4,
        mouse_direction_changes: 96.0,
        click_randomness_score: 0.72,
        requests_per_minute: 4.0,
        session_request_count: 18.0,
        burst_score: 0.12,
        honeypot_triggered: false,
    }
}

/// Hesitant human whose marginals overlap the stealth bot
pub fn confused_human_session() -> SessionFeatures {
    SessionFeatures {
        avg_typing_speed: 12.4,
        typing_variance: 1.8,
        click_randomness_score: 0.48,
        requests_per_minute: 11.2,
        session_request_count: 62.0,
        burst_score: 0.38,
        ..human_session()
    }
}

/// Automation tuned to look human; fires three heuristic rules
pub fn stealth_bot_session() -> SessionFeatures {
    SessionFeatures {
        avg_typing_speed: 15.1,
        typing_variance: 0.8,
        click_randomness_score: 0.35,
        requests_per_minute: 14.5,
        session_request_count: 88.0,
        burst_score: 0.52,
        ..human_session()
    }
}

/// Unsophisticated bot; fires every heuristic rule
pub fn clear_bot_session() -> SessionFeatures {
    SessionFeatures {
        avg_typing_speed: 22.0,
        typing_variance: 0.2,
        mouse_move_count: 4.0,
        mouse_path_length: 900.0,
        click_randomness_score: 0.08,
        requests_per_minute: 42.0,
        session_request_count: 260.0,
        burst_score: 0.81,
        ..human_session()
    }
}

/// Serialize a request envelope, optionally with a `user_id`
pub fn request_json(session: &SessionFeatures, user_id: Option<&str>) -> String {
    let mut value = serde_json::to_value(session).unwrap();
    if let Some(user_id) = user_id {
        value["user_id"] = serde_json::json!(user_id);
    }
    value.to_string()
}
