//! The sample model, config and sessions shipped under demos/ load and score

use riskgate::classifier::check_feature_order;
use riskgate::pipeline::BatchRecord;
use riskgate::{
    Classifier, Decision, DecisionEngine, EngineConfig, LogisticClassifier, MemoryStore,
    ModelArtifact, RiskProcessor,
};
use std::sync::Arc;

const MODEL: &str = include_str!("../demos/model.json");
const CONFIG: &str = include_str!("../demos/config.json");
const SESSIONS: &str = include_str!("../demos/sessions.ndjson");

fn demo_processor() -> RiskProcessor {
    let config = EngineConfig::from_json(CONFIG).unwrap();
    let classifier = LogisticClassifier::new(ModelArtifact::from_json(MODEL).unwrap()).unwrap();
    let engine =
        DecisionEngine::new(config, Arc::new(classifier), Arc::new(MemoryStore::new())).unwrap();
    RiskProcessor::new(Arc::new(engine))
}

#[test]
fn test_demo_model_matches_schema() {
    let classifier = LogisticClassifier::new(ModelArtifact::from_json(MODEL).unwrap()).unwrap();
    check_feature_order(&classifier).unwrap();
    assert_eq!(classifier.version(), "logreg-demo-1");
}

#[test]
fn test_demo_config_is_valid() {
    let config = EngineConfig::from_json(CONFIG).unwrap();
    assert_eq!(config.version, "demo-strict-1");
    assert_eq!(config.classifier_timeout_ms, Some(50));
}

#[test]
fn test_demo_sessions_score() {
    let records = demo_processor().assess_lines(SESSIONS.lines());
    assert_eq!(records.len(), 5);

    let assessments: Vec<_> = records
        .into_iter()
        .map(|record| match record {
            BatchRecord::Assessed(a) => a,
            BatchRecord::Failed(e) => panic!("demo session failed: {}", e.message),
        })
        .collect();

    for a in &assessments {
        assert!((0.0..=100.0).contains(&a.final_risk_score));
    }
    assert_eq!(assessments[3].boost, 20);
    assert!(assessments[4].honeypot);
    assert_eq!(assessments[4].decision, Decision::Block);
}
