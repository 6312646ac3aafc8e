//! Shared scalar state
//!
//! The engine keeps exactly two kinds of cross-request state: the global attack
//! intensity and per-identity trust. Both live behind [`StateStore`], whose
//! `update_scalar` is the atomic read-modify-write every hot-key update goes
//! through, so concurrent deltas compose instead of clobbering each other.

use crate::error::StoreError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key holding the global attack intensity
pub const ATTACK_INTENSITY_KEY: &str = "attack_intensity";

/// Key prefix for per-identity trust
pub const USER_TRUST_PREFIX: &str = "user_trust:";

/// Store key for an identity's trust value
pub fn user_trust_key(identity: &str) -> String {
    format!("{USER_TRUST_PREFIX}{identity}")
}

/// Minimal key/value contract for decimal scalars
pub trait StateStore: Send + Sync {
    /// Read a value; `None` when the key has never been written
    fn get_scalar(&self, key: &str) -> Result<Option<f64>, StoreError>;

    /// Overwrite a value
    fn set_scalar(&self, key: &str, value: f64) -> Result<(), StoreError>;

    /// Atomically replace the value with `update(current)` and return the new value.
    ///
    /// No other write to `key` may interleave between the read and the write.
    fn update_scalar(
        &self,
        key: &str,
        update: &dyn Fn(Option<f64>) -> f64,
    ) -> Result<f64, StoreError>;

    /// Atomically add `delta` (missing keys start at 0) and clamp to `[min, max]`
    fn add_clamped(&self, key: &str, delta: f64, min: f64, max: f64) -> Result<f64, StoreError> {
        self.update_scalar(key, &|current| (current.unwrap_or(0.0) + delta).clamp(min, max))
    }
}

/// In-process store backed by a single mutex-guarded map
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, f64>>,
}

/// Serializable copy of a [`MemoryStore`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub values: BTreeMap<String, f64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            values: Mutex::new(snapshot.values),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            values: self.values.lock().clone(),
        }
    }

    /// Load store state from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let snapshot: StoreSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Serialize store state to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshot())
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    pub fn clear(&self) {
        self.values.lock().clear();
    }
}

impl StateStore for MemoryStore {
    fn get_scalar(&self, key: &str) -> Result<Option<f64>, StoreError> {
        Ok(self.values.lock().get(key).copied())
    }

    fn set_scalar(&self, key: &str, value: f64) -> Result<(), StoreError> {
        if !value.is_finite() {
            return Err(StoreError::Corrupt {
                key: key.to_string(),
                reason: format!("refusing to store non-finite value {value}"),
            });
        }
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn update_scalar(
        &self,
        key: &str,
        update: &dyn Fn(Option<f64>) -> f64,
    ) -> Result<f64, StoreError> {
        let mut values = self.values.lock();
        let next = update(values.get(key).copied());
        if !next.is_finite() {
            return Err(StoreError::Corrupt {
                key: key.to_string(),
                reason: format!("update produced non-finite value {next}"),
            });
        }
        values.insert(key.to_string(), next);
        Ok(next)
    }
}
