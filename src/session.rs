//! Session request parsing and validation
//!
//! Turns inbound JSON into validated [`SessionFeatures`] plus an [`Identity`].
//! Nothing here touches engine state: a request that fails validation leaves
//! no trace.

use crate::error::RiskError;
use crate::types::{Identity, SessionFeatures};
use serde::{Deserialize, Serialize};

/// Inbound request envelope: the session telemetry plus the identity it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessRequest {
    #[serde(flatten)]
    pub features: SessionFeatures,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub features: SessionFeatures,
    pub identity: Identity,
}

impl AssessRequest {
    /// Validate features and identity
    pub fn validate(self) -> Result<ValidatedRequest, RiskError> {
        validate_features(&self.features)?;

        let raw_identity = self
            .user_id
            .ok_or_else(|| RiskError::MissingField("user_id".to_string()))?;
        let identity = Identity::new(raw_identity)
            .ok_or_else(|| RiskError::InvalidIdentity("user_id must not be blank".to_string()))?;

        Ok(ValidatedRequest {
            features: self.features,
            identity,
        })
    }
}

/// Parse and validate a single request envelope
pub fn parse_request(json: &str) -> Result<ValidatedRequest, RiskError> {
    let request: AssessRequest = serde_json::from_str(json).map_err(classify_json_error)?;
    request.validate()
}

/// Check that every raw numeric field is finite and non-negative
pub fn validate_features(features: &SessionFeatures) -> Result<(), RiskError> {
    for (name, value) in features.numeric_fields() {
        if !value.is_finite() {
            return Err(RiskError::InvalidSession(format!(
                "{name} must be a finite number"
            )));
        }
        if value < 0.0 {
            return Err(RiskError::InvalidSession(format!(
                "{name} must be non-negative, got {value}"
            )));
        }
    }
    Ok(())
}

/// Surface serde's "missing field" as its own error kind
fn classify_json_error(e: serde_json::Error) -> RiskError {
    let message = e.to_string();
    if let Some(rest) = message.strip_prefix("missing field `") {
        if let Some(end) = rest.find('`') {
            return RiskError::MissingField(rest[..end].to_string());
        }
    }
    RiskError::JsonError(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{human_session, request_json};

    #[test]
    fn test_parse_valid_request() {
        let json = request_json(&human_session(), Some("user-42"));
        let validated = parse_request(&json).unwrap();

        assert_eq!(validated.identity.as_str(), "user-42");
        assert_eq!(validated.features, human_session());
    }

    #[test]
    fn test_missing_identity_rejected() {
        let json = request_json(&human_session(), None);
        let err = parse_request(&json).unwrap_err();
        assert_eq!(err.kind(), "missing_field");
    }

    #[test]
    fn test_blank_identity_rejected() {
        let json = request_json(&human_session(), Some("  "));
        let err = parse_request(&json).unwrap_err();
        assert_eq!(err.kind(), "invalid_identity");
    }

    #[test]
    fn test_missing_feature_reported_by_name() {
        let mut value: serde_json::Value =
            serde_json::from_str(&request_json(&human_session(), Some("u"))).unwrap();
        value.as_object_mut().unwrap().remove("typingVariance");

        let err = parse_request(&value.to_string()).unwrap_err();
        match err {
            RiskError::MissingField(field) => assert_eq!(field, "typingVariance"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_feature_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_str(&request_json(&human_session(), Some("u"))).unwrap();
        value["burstScore"] = serde_json::json!("high");

        let err = parse_request(&value.to_string()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_negative_feature_rejected() {
        let mut session = human_session();
        session.requests_per_minute = -1.0;

        let err = validate_features(&session).unwrap_err();
        assert_eq!(err.kind(), "invalid_session");
        assert!(err.to_string().contains("requestsPerMinute"));
    }

    #[test]
    fn test_non_finite_feature_rejected() {
        let mut session = human_session();
        session.typing_variance = f64::NAN;
        assert!(validate_features(&session).is_err());
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_request("not valid json").unwrap_err();
        assert_eq!(err.kind(), "invalid_json");
    }
}
