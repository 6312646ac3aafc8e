//! Per-identity trust memory
//!
//! Trust is a bounded integer reputation per identity. Low final scores earn
//! trust, high scores cost it, and a honeypot hit costs a fixed penalty outright.
//! All writes go through the store's atomic delta so concurrent requests for one
//! identity never lose updates.

use crate::store::{user_trust_key, StateStore};
use crate::types::Identity;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Score-to-trust policy and bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustPolicy {
    /// Scores strictly below this earn `reward`
    pub reward_below: f64,
    /// Scores strictly above this cost `penalty`
    pub penalize_above: f64,
    pub reward: i32,
    pub penalty: i32,
    /// Fixed penalty for a honeypot hit
    pub honeypot_penalty: i32,
    pub min: i32,
    pub max: i32,
    /// Score points removed per trust point
    pub score_weight: f64,
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self {
            reward_below: 25.0,
            penalize_above: 70.0,
            reward: 2,
            penalty: 2,
            honeypot_penalty: 5,
            min: -50,
            max: 50,
            score_weight: 0.5,
        }
    }
}

impl TrustPolicy {
    /// Trust delta earned by a final score; [25, 70] leaves trust unchanged
    pub fn delta_for(&self, final_score: f64) -> i32 {
        if final_score < self.reward_below {
            self.reward
        } else if final_score > self.penalize_above {
            -self.penalty
        } else {
            0
        }
    }

    pub fn clamp(&self, trust: i32) -> i32 {
        trust.clamp(self.min, self.max)
    }

    /// Score adjustment for a trust value; positive trust lowers the score
    pub fn score_adjustment(&self, trust: i32) -> f64 {
        -(trust as f64) * self.score_weight
    }
}

/// Trust reads and atomic updates against a state store
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrustMemory {
    policy: TrustPolicy,
}

impl TrustMemory {
    pub fn new(policy: TrustPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    /// Current trust, 0 for unseen identities or when the store is unreachable
    pub fn current(&self, store: &dyn StateStore, identity: &Identity) -> i32 {
        let key = user_trust_key(identity.as_str());
        match store.get_scalar(&key) {
            Ok(value) => self.policy.clamp(value.unwrap_or(0.0).round() as i32),
            Err(e) => {
                warn!(key = %key, error = %e, "trust read failed, using 0");
                0
            }
        }
    }

    /// Apply the score rule and return the new trust.
    ///
    /// `snapshot` is the trust read before scoring; if the write is dropped the
    /// reported value is `snapshot + delta`, clamped.
    pub fn adjust(
        &self,
        store: &dyn StateStore,
        identity: &Identity,
        snapshot: i32,
        final_score: f64,
    ) -> i32 {
        self.apply_delta(store, identity, snapshot, self.policy.delta_for(final_score))
    }

    /// Apply the honeypot penalty, bypassing the score rule
    pub fn penalize_honeypot(&self, store: &dyn StateStore, identity: &Identity, snapshot: i32) -> i32 {
        self.apply_delta(store, identity, snapshot, -self.policy.honeypot_penalty)
    }

    fn apply_delta(&self, store: &dyn StateStore, identity: &Identity, snapshot: i32, delta: i32) -> i32 {
        let key = user_trust_key(identity.as_str());
        let (min, max) = (self.policy.min as f64, self.policy.max as f64);

        match store.add_clamped(&key, delta as f64, min, max) {
            Ok(value) => value.round() as i32,
            Err(e) => {
                warn!(key = %key, delta, error = %e, "trust update dropped");
                self.policy.clamp(snapshot.saturating_add(delta))
            }
        }
    }
}
