//! Protection heuristics
//!
//! The classifier outputs ~0.50 for both confused humans and stealth bots, whose
//! feature marginals are identical by construction. These rules threshold raw
//! features directly to recover the signal the learned combination cannot see.
//!
//! Each rule is a `(predicate, weight)` entry in an ordered table. Contributions
//! sum and the total is capped.

use crate::types::SessionFeatures;
use serde::Serialize;

/// Maximum total boost regardless of how many rules fire
pub const DEFAULT_BOOST_CAP: u8 = 20;

/// One heuristic rule
#[derive(Debug, Clone, Copy)]
pub struct HeuristicRule {
    /// Stable identifier reported in assessments
    pub key: &'static str,
    pub label: &'static str,
    pub weight: u8,
    pub predicate: fn(&SessionFeatures) -> bool,
}

/// Outcome of one rule for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    pub key: &'static str,
    pub label: &'static str,
    pub fired: bool,
    pub contribution: u8,
}

/// Per-rule breakdown plus the capped total
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoostBreakdown {
    pub boost: u8,
    pub outcomes: Vec<RuleOutcome>,
}

impl BoostBreakdown {
    /// Keys of the rules that fired, in table order
    pub fn triggered(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.fired)
            .map(|o| o.key.to_string())
            .collect()
    }
}

fn high_request_volume(s: &SessionFeatures) -> bool {
    s.session_request_count > 150.0
}

// Stealth: burst 0.52 / randomness 0.35 fires; confused human: 0.38 / 0.48 misses
fn bursty_low_randomness(s: &SessionFeatures) -> bool {
    s.burst_score > 0.45 && s.click_randomness_score < 0.45
}

fn mechanical_typing(s: &SessionFeatures) -> bool {
    s.typing_variance < 0.9 && s.avg_typing_speed > 13.0
}

fn automated_cadence(s: &SessionFeatures) -> bool {
    s.requests_per_minute > 12.0 && s.click_randomness_score < 0.45
}

/// Reference rule table
pub const DEFAULT_RULES: [HeuristicRule; 4] = [
    HeuristicRule {
        key: "high_request_volume",
        label: "Session request count above 150",
        weight: 10,
        predicate: high_request_volume,
    },
    HeuristicRule {
        key: "bursty_low_randomness",
        label: "Bursty traffic with low click randomness",
        weight: 12,
        predicate: bursty_low_randomness,
    },
    HeuristicRule {
        key: "mechanical_typing",
        label: "Fast typing with near-uniform rhythm",
        weight: 8,
        predicate: mechanical_typing,
    },
    HeuristicRule {
        key: "automated_cadence",
        label: "Sustained request rate with low click randomness",
        weight: 6,
        predicate: automated_cadence,
    },
];

/// Ordered rule table with a cap on the summed boost
#[derive(Debug, Clone)]
pub struct ProtectionHeuristics {
    rules: Vec<HeuristicRule>,
    cap: u8,
}

impl Default for ProtectionHeuristics {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.to_vec(), DEFAULT_BOOST_CAP)
    }
}

impl ProtectionHeuristics {
    pub fn new(rules: Vec<HeuristicRule>, cap: u8) -> Self {
        Self { rules, cap }
    }

    /// Default rules with a different cap
    pub fn with_cap(cap: u8) -> Self {
        Self::new(DEFAULT_RULES.to_vec(), cap)
    }

    /// Capped boost for a session
    pub fn boost(&self, session: &SessionFeatures) -> u8 {
        self.evaluate(session).boost
    }

    /// Evaluate every rule independently and report each outcome
    pub fn evaluate(&self, session: &SessionFeatures) -> BoostBreakdown {
        let mut total: u32 = 0;
        let mut outcomes = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let fired = (rule.predicate)(session);
            let contribution = if fired { rule.weight } else { 0 };
            total += u32::from(contribution);
            outcomes.push(RuleOutcome {
                key: rule.key,
                label: rule.label,
                fired,
                contribution,
            });
        }

        BoostBreakdown {
            boost: total.min(u32::from(self.cap)) as u8,
            outcomes,
        }
    }

    pub fn rules(&self) -> &[HeuristicRule] {
        &self.rules
    }

    pub fn cap(&self) -> u8 {
        self.cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{confused_human_session, human_session, stealth_bot_session};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clear_human_gets_no_boost() {
        let heuristics = ProtectionHeuristics::default();
        let breakdown = heuristics.evaluate(&human_session());

        assert_eq!(breakdown.boost, 0);
        assert!(breakdown.triggered().is_empty());
    }

    #[test]
    fn test_confused_human_misses_every_rule() {
        let heuristics = ProtectionHeuristics::default();
        assert_eq!(heuristics.boost(&confused_human_session()), 0);
    }

    #[test]
    fn test_stealth_bot_is_capped() {
        let heuristics = ProtectionHeuristics::default();
        let breakdown = heuristics.evaluate(&stealth_bot_session());

        // 12 + 8 + 6 = 26, capped at 20
        assert_eq!(breakdown.boost, 20);
        assert_eq!(
            breakdown.triggered(),
            vec![
                "bursty_low_randomness".to_string(),
                "mechanical_typing".to_string(),
                "automated_cadence".to_string(),
            ]
        );
    }

    #[test]
    fn test_rules_fire_independently() {
        let heuristics = ProtectionHeuristics::default();

        let mut session = human_session();
        session.session_request_count = 151.0;
        assert_eq!(heuristics.boost(&session), 10);

        let mut session = human_session();
        session.requests_per_minute = 13.0;
        session.click_randomness_score = 0.40;
        assert_eq!(heuristics.boost(&session), 6);

        // Thresholds are strict inequalities
        let mut session = human_session();
        session.session_request_count = 150.0;
        assert_eq!(heuristics.boost(&session), 0);
    }

    #[test]
    fn test_boost_bounded_over_feature_grid() {
        let heuristics = ProtectionHeuristics::default();
        let mut session = human_session();

        for requests in [0.0, 150.0, 151.0, 1_000.0] {
            for burst in [0.0, 0.45, 0.46, 1.0] {
                for randomness in [0.0, 0.44, 0.45, 1.0] {
                    for variance in [0.0, 0.89, 0.9, 5.0] {
                        for rpm in [0.0, 12.0, 12.1, 60.0] {
                            session.session_request_count = requests;
                            session.burst_score = burst;
                            session.click_randomness_score = randomness;
                            session.typing_variance = variance;
                            session.avg_typing_speed = 20.0;
                            session.requests_per_minute = rpm;

                            let boost = heuristics.boost(&session);
                            assert!(boost <= DEFAULT_BOOST_CAP);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_custom_cap() {
        let heuristics = ProtectionHeuristics::with_cap(12);
        assert_eq!(heuristics.cap(), 12);
        assert_eq!(heuristics.boost(&stealth_bot_session()), 12);
    }
}
