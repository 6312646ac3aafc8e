//! Derived feature computation and classifier input layout
//!
//! Derived features are pure functions of the raw session fields. The classifier
//! consumes raw and derived features together in the fixed [`FEATURE_ORDER`].

use crate::types::{DerivedFeatures, SessionFeatures};

/// Guards the ratio features against division by zero
pub const EPSILON: f64 = 1e-6;

/// Version of the classifier input layout. Bump whenever [`FEATURE_ORDER`] changes.
pub const FEATURE_SCHEMA_VERSION: &str = "session.features.v1";

/// Column order of the classifier input vector (honeypot flag excluded)
pub const FEATURE_ORDER: [&str; 23] = [
    "sessionDuration",
    "avgTypingSpeed",
    "typingVariance",
    "mouseMoveCount",
    "clickIntervalAvg",
    "mousePathLength",
    "backspaceCount",
    "focusChanges",
    "idleTimeRatio",
    "keyHoldTimeMean",
    "keyFlightTimeVariance",
    "correctionDelayMean",
    "pasteUsageCount",
    "mouseAccelerationMean",
    "mouseDirectionChanges",
    "clickRandomnessScore",
    "requestsPerMinute",
    "sessionRequestCount",
    "burstScore",
    "typingConsistency",
    "movementEfficiency",
    "interactionIntensity",
    "trafficPressure",
];

/// Feature deriver for session telemetry
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Compute the four derived features
    pub fn derive(session: &SessionFeatures) -> DerivedFeatures {
        DerivedFeatures {
            typing_consistency: session.avg_typing_speed / (session.typing_variance + EPSILON),
            movement_efficiency: session.mouse_path_length / (session.mouse_move_count + EPSILON),
            interaction_intensity: session.mouse_move_count + session.session_request_count,
            traffic_pressure: session.requests_per_minute * session.burst_score,
        }
    }

    /// Lay out raw and derived features in [`FEATURE_ORDER`]
    pub fn to_vector(session: &SessionFeatures, derived: &DerivedFeatures) -> Vec<f64> {
        let mut vector: Vec<f64> = session
            .numeric_fields()
            .iter()
            .map(|(_, value)| *value)
            .collect();
        vector.extend_from_slice(&[
            derived.typing_consistency,
            derived.movement_efficiency,
            derived.interaction_intensity,
            derived.traffic_pressure,
        ]);
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::human_session;

    #[test]
    fn test_derived_formulas() {
        let mut session = human_session();
        session.avg_typing_speed = 12.0;
        session.typing_variance = 2.0;
        session.mouse_path_length = 3000.0;
        session.mouse_move_count = 150.0;
        session.session_request_count = 40.0;
        session.requests_per_minute = 8.0;
        session.burst_score = 0.25;

        let derived = FeatureDeriver::derive(&session);

        assert!((derived.typing_consistency - 6.0).abs() < 1e-4);
        assert!((derived.movement_efficiency - 20.0).abs() < 1e-4);
        assert_eq!(derived.interaction_intensity, 190.0);
        assert_eq!(derived.traffic_pressure, 2.0);
    }

    #[test]
    fn test_zero_denominators_stay_finite() {
        let mut session = human_session();
        session.typing_variance = 0.0;
        session.mouse_move_count = 0.0;

        let derived = FeatureDeriver::derive(&session);
        assert!(derived.typing_consistency.is_finite());
        assert!(derived.movement_efficiency.is_finite());
    }

    #[test]
    fn test_vector_follows_feature_order() {
        let session = human_session();
        let derived = FeatureDeriver::derive(&session);
        let vector = FeatureDeriver::to_vector(&session, &derived);

        assert_eq!(vector.len(), FEATURE_ORDER.len());

        let raw = session.numeric_fields();
        for (index, (name, value)) in raw.iter().enumerate() {
            assert_eq!(FEATURE_ORDER[index], *name);
            assert_eq!(vector[index], *value);
        }
        assert_eq!(vector[19], derived.typing_consistency);
        assert_eq!(vector[22], derived.traffic_pressure);
    }
}
