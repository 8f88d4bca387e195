//! # Step Response
//!
//! The single outcome produced for one request, tagged by `status` on the
//! wire.

use crate::Stage;
use serde::{Deserialize, Serialize};

/// Lowercase action label carried next to the status of successful outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    NextThought,
    ClarificationNeeded,
    Completed,
    Blocked,
}

/// Guidance for the next thinking step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextThought {
    pub action: Action,
    pub next_stage: Stage,
    /// The guidance text for `next_stage`.
    #[serde(rename = "prompt")]
    pub guidance: String,
    #[serde(rename = "thought_number")]
    pub sequence: u32,
    /// Always `thought_number + 1`; wider than `thought_number` so the
    /// successor of `u32::MAX` is representable.
    #[serde(rename = "next_thought_number")]
    pub next_sequence: u64,
}

/// The caller must ask the user before continuing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationNeeded {
    pub action: Action,
    #[serde(rename = "clarification_questions")]
    pub questions: Vec<String>,
    #[serde(rename = "thought_number")]
    pub sequence: u32,
}

/// The process finished in the implementation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completed {
    pub action: Action,
    #[serde(rename = "final_thought")]
    pub final_rationale: String,
    #[serde(rename = "thought_number")]
    pub sequence: u32,
}

/// The process stopped because the task is blocked or infeasible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocked {
    pub action: Action,
    #[serde(rename = "issue_description")]
    pub issue_summary: String,
    #[serde(rename = "final_thought")]
    pub final_rationale: String,
    #[serde(rename = "thought_number")]
    pub sequence: u32,
}

/// A precondition failure. Carries no sequence number since it can occur
/// before a valid one is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Exactly one outcome per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepResponse {
    NextThought(NextThought),
    ClarificationNeeded(ClarificationNeeded),
    Completed(Completed),
    Blocked(Blocked),
    Error(ErrorReport),
}

impl StepResponse {
    /// Guidance for the next step. The next thought number is `sequence + 1`.
    #[must_use]
    pub fn next_thought(next_stage: Stage, guidance: String, sequence: u32) -> Self {
        Self::NextThought(NextThought {
            action: Action::NextThought,
            next_stage,
            guidance,
            sequence,
            next_sequence: u64::from(sequence) + 1,
        })
    }

    #[must_use]
    pub fn clarification_needed(questions: Vec<String>, sequence: u32) -> Self {
        Self::ClarificationNeeded(ClarificationNeeded {
            action: Action::ClarificationNeeded,
            questions,
            sequence,
        })
    }

    #[must_use]
    pub fn completed(final_rationale: String, sequence: u32) -> Self {
        Self::Completed(Completed {
            action: Action::Completed,
            final_rationale,
            sequence,
        })
    }

    #[must_use]
    pub fn blocked(issue_summary: String, final_rationale: String, sequence: u32) -> Self {
        Self::Blocked(Blocked {
            action: Action::Blocked,
            issue_summary,
            final_rationale,
            sequence,
        })
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorReport {
            message: message.into(),
            details: None,
        })
    }

    /// An error with a diagnostic payload, such as a parse failure.
    #[must_use]
    pub fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Error(ErrorReport {
            message: message.into(),
            details: Some(details.into()),
        })
    }

    /// A payload that could not be read as a step request. `details` holds
    /// the parser's message.
    #[must_use]
    pub fn invalid_request(details: impl Into<String>) -> Self {
        Self::error_with_details("Invalid step request", details)
    }

    /// The wire tag of this response.
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::NextThought(_) => "NEXT_THOUGHT",
            Self::ClarificationNeeded(_) => "CLARIFICATION_NEEDED",
            Self::Completed(_) => "COMPLETED",
            Self::Blocked(_) => "BLOCKED",
            Self::Error(_) => "ERROR",
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The echoed thought number, absent for errors.
    #[must_use]
    pub fn sequence(&self) -> Option<u32> {
        match self {
            Self::NextThought(r) => Some(r.sequence),
            Self::ClarificationNeeded(r) => Some(r.sequence),
            Self::Completed(r) => Some(r.sequence),
            Self::Blocked(r) => Some(r.sequence),
            Self::Error(_) => None,
        }
    }

    /// The stage the caller should move to, if the process continues.
    #[must_use]
    pub fn next_stage(&self) -> Option<Stage> {
        match self {
            Self::NextThought(r) => Some(r.next_stage),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn next_thought_wire_shape() {
        let response = StepResponse::next_thought(
            Stage::OutcomeDefinition,
            "Define the outcome.".to_string(),
            1,
        );
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            value,
            json!({
                "status": "NEXT_THOUGHT",
                "action": "next_thought",
                "next_stage": "outcome_definition",
                "prompt": "Define the outcome.",
                "thought_number": 1,
                "next_thought_number": 2,
            })
        );
    }

    #[test]
    fn error_wire_shape_has_no_thought_number() {
        let value = serde_json::to_value(StepResponse::error("bad")).expect("serialize");
        assert_eq!(value, json!({"status": "ERROR", "message": "bad"}));

        let with_details = StepResponse::error_with_details("bad", "line 1");
        let value = serde_json::to_value(&with_details).expect("serialize");
        assert_eq!(value["details"], "line 1");
        assert_eq!(with_details.sequence(), None);
    }

    #[test]
    fn blocked_wire_shape() {
        let response = StepResponse::blocked("No API access".into(), "Tried X".into(), 4);
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["status"], "BLOCKED");
        assert_eq!(value["action"], "blocked");
        assert_eq!(value["issue_description"], "No API access");
        assert_eq!(value["final_thought"], "Tried X");
        assert_eq!(value["thought_number"], 4);
    }

    #[test]
    fn response_deserializes_from_its_own_json() {
        let response = StepResponse::clarification_needed(vec!["Which page?".into()], 3);
        let json = serde_json::to_string(&response).expect("serialize");
        let back: StepResponse = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, response);
        assert_eq!(back.status(), "CLARIFICATION_NEEDED");
    }

    #[test]
    fn invalid_request_carries_parse_details() {
        let value = serde_json::to_value(StepResponse::invalid_request(
            "unknown variant `daydreaming`",
        ))
        .expect("serialize");
        assert_eq!(
            value,
            json!({
                "status": "ERROR",
                "message": "Invalid step request",
                "details": "unknown variant `daydreaming`"
            })
        );
    }

    #[test]
    fn next_thought_number_follows_largest_thought_number() {
        let response = StepResponse::next_thought(Stage::Implementation, String::new(), u32::MAX);
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["next_thought_number"], serde_json::json!(4_294_967_296_u64));
        match response {
            StepResponse::NextThought(r) => {
                assert_eq!(r.next_sequence, u64::from(u32::MAX) + 1);
                assert_ne!(r.next_sequence, u64::from(r.sequence));
            }
            other => unreachable!("unexpected response: {other:?}"),
        }
    }
}
