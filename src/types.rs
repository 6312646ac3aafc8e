//! Core data types for riskgate
//!
//! This module defines the session telemetry that flows into the decision engine
//! and the assessment that flows out of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identity used when the caller does not know who the session belongs to
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Behavioral telemetry for one browsing session.
///
/// All numeric fields are non-negative. Field names on the wire are camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFeatures {
    /// Session length in seconds
    pub session_duration: f64,
    /// Mean typing speed (keys per second)
    pub avg_typing_speed: f64,
    /// Variance of typing speed
    pub typing_variance: f64,
    /// Number of mouse move events
    pub mouse_move_count: f64,
    /// Mean interval between clicks (ms)
    pub click_interval_avg: f64,
    /// Total mouse path length (px)
    pub mouse_path_length: f64,
    pub backspace_count: f64,
    pub focus_changes: f64,
    /// Fraction of the session spent idle
    pub idle_time_ratio: f64,
    /// Mean key hold time (ms)
    pub key_hold_time_mean: f64,
    /// Variance of key flight time (ms)
    pub key_flight_time_variance: f64,
    pub correction_delay_mean: f64,
    pub paste_usage_count: f64,
    pub mouse_acceleration_mean: f64,
    pub mouse_direction_changes: f64,
    /// Randomness of click placement and timing (0-1, higher = more human)
    pub click_randomness_score: f64,
    pub requests_per_minute: f64,
    pub session_request_count: f64,
    /// Burstiness of request timing (0-1)
    pub burst_score: f64,
    /// Set when the session interacted with a trap element
    #[serde(deserialize_with = "deserialize_flag", serialize_with = "serialize_flag")]
    pub honeypot_triggered: bool,
}

impl SessionFeatures {
    /// Raw numeric fields paired with their wire names, honeypot flag excluded
    pub fn numeric_fields(&self) -> [(&'static str, f64); 19] {
        [
            ("sessionDuration", self.session_duration),
            ("avgTypingSpeed", self.avg_typing_speed),
            ("typingVariance", self.typing_variance),
            ("mouseMoveCount", self.mouse_move_count),
            ("clickIntervalAvg", self.click_interval_avg),
            ("mousePathLength", self.mouse_path_length),
            ("backspaceCount", self.backspace_count),
            ("focusChanges", self.focus_changes),
            ("idleTimeRatio", self.idle_time_ratio),
            ("keyHoldTimeMean", self.key_hold_time_mean),
            ("keyFlightTimeVariance", self.key_flight_time_variance),
            ("correctionDelayMean", self.correction_delay_mean),
            ("pasteUsageCount", self.paste_usage_count),
            ("mouseAccelerationMean", self.mouse_acceleration_mean),
            ("mouseDirectionChanges", self.mouse_direction_changes),
            ("clickRandomnessScore", self.click_randomness_score),
            ("requestsPerMinute", self.requests_per_minute),
            ("sessionRequestCount", self.session_request_count),
            ("burstScore", self.burst_score),
        ]
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Number(f64),
}

/// Accepts `true`/`false` or the numeric `0`/`1` the browser tracker sends
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match FlagRepr::deserialize(deserializer)? {
        FlagRepr::Bool(flag) => Ok(flag),
        FlagRepr::Number(n) if n == 0.0 => Ok(false),
        FlagRepr::Number(n) if n == 1.0 => Ok(true),
        FlagRepr::Number(n) => Err(serde::de::Error::custom(format!(
            "honeypotTriggered must be 0 or 1, got {n}"
        ))),
    }
}

fn serialize_flag<S>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u8(u8::from(*flag))
}

/// Features computed deterministically from the raw session fields
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFeatures {
    /// `avgTypingSpeed / (typingVariance + ε)`
    pub typing_consistency: f64,
    /// `mousePathLength / (mouseMoveCount + ε)`
    pub movement_efficiency: f64,
    /// `mouseMoveCount + sessionRequestCount`
    pub interaction_intensity: f64,
    /// `requestsPerMinute * burstScore`
    pub traffic_pressure: f64,
}

/// Opaque identity a trust record is keyed by
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Build an identity, rejecting blank strings
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn anonymous() -> Self {
        Self(ANONYMOUS_IDENTITY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Four-way action taken for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Allow,
    SoftCaptcha,
    HardCaptcha,
    Block,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::SoftCaptcha => "SOFT_CAPTCHA",
            Decision::HardCaptcha => "HARD_CAPTCHA",
            Decision::Block => "BLOCK",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision band cutoffs after adjusting for attack intensity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicThresholds {
    pub allow: f64,
    pub soft: f64,
    pub hard: f64,
}

/// Outcome of assessing one session. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub assessment_id: String,
    pub assessed_at: DateTime<Utc>,
    pub identity: Identity,
    /// Final risk score in [0, 100]
    pub final_risk_score: f64,
    /// Classifier P(bot); absent when the honeypot bypassed the classifier
    #[serde(rename = "raw_bot_prob", skip_serializing_if = "Option::is_none")]
    pub raw_probability: Option<f64>,
    /// Remapped P(bot); absent when the honeypot bypassed the classifier
    #[serde(rename = "remapped_prob", skip_serializing_if = "Option::is_none")]
    pub remapped_probability: Option<f64>,
    /// Heuristic points added to the score
    pub boost: u8,
    /// Keys of the heuristic rules that fired
    #[serde(default)]
    pub triggered_rules: Vec<String>,
    /// Global attack intensity in [0, 1] after this request
    pub attack_intensity: f64,
    /// Identity trust in [-50, 50] after this request
    pub user_trust: i32,
    pub thresholds: DynamicThresholds,
    pub honeypot: bool,
    pub decision: Decision,
}
