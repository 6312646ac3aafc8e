//! JSON pipeline orchestration
//!
//! This module provides the JSON-in/JSON-out API used by the CLI and the HTTP
//! surface: request envelope → validation → decision engine → assessment JSON.

use crate::engine::DecisionEngine;
use crate::error::RiskError;
use crate::session::parse_request;
use crate::types::RiskAssessment;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Error record emitted in place of an assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
    pub message: String,
}

impl From<&RiskError> for ErrorRecord {
    fn from(e: &RiskError) -> Self {
        Self {
            error: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

/// Outcome of one line in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchRecord {
    Assessed(Box<RiskAssessment>),
    Failed(ErrorRecord),
}

/// Shared processor over a single decision engine
#[derive(Clone)]
pub struct RiskProcessor {
    engine: Arc<DecisionEngine>,
}

impl RiskProcessor {
    pub fn new(engine: Arc<DecisionEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<DecisionEngine> {
        &self.engine
    }

    /// Parse, validate and assess one request envelope
    pub fn assess(&self, request_json: &str) -> Result<RiskAssessment, RiskError> {
        let request = parse_request(request_json)?;
        self.engine.assess_request(&request)
    }

    /// Assess one request envelope and return the assessment as JSON
    pub fn assess_json(&self, request_json: &str) -> Result<String, RiskError> {
        let assessment = self.assess(request_json)?;
        Ok(serde_json::to_string(&assessment)?)
    }

    /// Assess each non-blank line independently.
    ///
    /// A failing line yields an [`ErrorRecord`] and the batch continues.
    pub fn assess_lines<'a, I>(&self, lines: I) -> Vec<BatchRecord>
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines
            .into_iter()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match self.assess(line) {
                Ok(assessment) => BatchRecord::Assessed(Box::new(assessment)),
                Err(e) => BatchRecord::Failed(ErrorRecord::from(&e)),
            })
            .collect()
    }

    /// Assess newline-delimited request envelopes, one output line per input line
    pub fn assess_ndjson(&self, input: &str) -> Result<String, RiskError> {
        let mut output = String::new();
        for record in self.assess_lines(input.lines()) {
            output.push_str(&serde_json::to_string(&record)?);
            output.push('\n');
        }
        Ok(output)
    }
}
