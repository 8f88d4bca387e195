//! # Step Request
//!
//! The caller-supplied input for one decision. Field names on the wire follow
//! the `occams_razor_thinking` tool schema.

use crate::{
    LoopbackTarget, OccamError, Stage,
    primitives::{MAX_CLARIFICATION_QUESTIONS, MAX_TEXT_LENGTH},
};
use serde::{Deserialize, Serialize};

/// One step of the thinking process, as reported by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct StepRequest {
    /// Detailed thinking or analysis for the current stage. When requesting a
    /// loopback this is also the justification.
    #[serde(rename = "thought")]
    pub rationale: String,

    /// Sequential number of this thought, starting at 1.
    #[serde(rename = "thought_number")]
    pub sequence: u32,

    /// The stage this thought pertains to.
    #[serde(rename = "thinking_stage")]
    pub stage: Stage,

    /// `true` to receive guidance for another step, `false` to terminate.
    #[serde(rename = "next_thought_needed")]
    pub continue_thinking: bool,

    /// The original user request. Required on the first thought.
    #[serde(rename = "user_request", default, skip_serializing_if = "Option::is_none")]
    pub original_request: Option<String>,

    /// Set to `true` if user input is needed before proceeding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_clarification: Option<bool>,

    /// Questions for the user. Required and non-empty when
    /// `needs_clarification` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarification_questions: Option<Vec<String>>,

    /// The user's answer to a previous clarification request.
    #[serde(rename = "user_clarification", default, skip_serializing_if = "Option::is_none")]
    pub clarification_answer: Option<String>,

    /// Earlier stage to loop back to. The justification goes in `thought`.
    #[serde(
        rename = "requested_stage_override",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub loopback_target: Option<LoopbackTarget>,

    /// Summary of why the task is blocked. Used with `reporting_issue` when
    /// terminating.
    #[serde(rename = "issue_description", default, skip_serializing_if = "Option::is_none")]
    pub issue_summary: Option<String>,
}

impl StepRequest {
    /// Create a request with only the required fields set.
    #[must_use]
    pub fn new(
        stage: Stage,
        sequence: u32,
        rationale: impl Into<String>,
        continue_thinking: bool,
    ) -> Self {
        Self {
            rationale: rationale.into(),
            sequence,
            stage,
            continue_thinking,
            original_request: None,
            needs_clarification: None,
            clarification_questions: None,
            clarification_answer: None,
            loopback_target: None,
            issue_summary: None,
        }
    }

    /// Attach the original user request.
    #[must_use]
    pub fn with_original_request(mut self, request: impl Into<String>) -> Self {
        self.original_request = Some(request.into());
        self
    }

    /// Ask for clarification with the given questions.
    #[must_use]
    pub fn with_clarification_questions<I, S>(mut self, questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.needs_clarification = Some(true);
        self.clarification_questions = Some(questions.into_iter().map(Into::into).collect());
        self
    }

    /// Attach the user's answer to an earlier clarification request.
    #[must_use]
    pub fn with_clarification_answer(mut self, answer: impl Into<String>) -> Self {
        self.clarification_answer = Some(answer.into());
        self
    }

    /// Request a loopback to an earlier stage.
    #[must_use]
    pub fn with_loopback(mut self, target: LoopbackTarget) -> Self {
        self.loopback_target = Some(target);
        self
    }

    /// Attach an issue summary.
    #[must_use]
    pub fn with_issue_summary(mut self, summary: impl Into<String>) -> Self {
        self.issue_summary = Some(summary.into());
        self
    }

    /// Validate field-level constraints declared by the tool schema.
    ///
    /// Checks that the thought is non-empty, the thought number is positive,
    /// and no free-text field exceeds [`MAX_TEXT_LENGTH`]. Cross-field rules
    /// (first-thought request, clarification questions, termination shape)
    /// are decisions, not validation, and are left to the engine.
    pub fn validate(&self) -> Result<(), OccamError> {
        if self.rationale.is_empty() {
            return Err(OccamError::InvalidRequest(
                "'thought' cannot be empty".to_string(),
            ));
        }

        if self.sequence == 0 {
            return Err(OccamError::InvalidRequest(
                "'thought_number' must be a positive integer".to_string(),
            ));
        }

        check_length("thought", &self.rationale)?;
        for (field, value) in [
            ("user_request", &self.original_request),
            ("user_clarification", &self.clarification_answer),
            ("issue_description", &self.issue_summary),
        ] {
            if let Some(text) = value {
                check_length(field, text)?;
            }
        }

        if let Some(questions) = &self.clarification_questions {
            if questions.len() > MAX_CLARIFICATION_QUESTIONS {
                return Err(OccamError::InvalidRequest(format!(
                    "'clarification_questions' has {} entries, maximum is {}",
                    questions.len(),
                    MAX_CLARIFICATION_QUESTIONS
                )));
            }
            for question in questions {
                check_length("clarification_questions", question)?;
            }
        }

        Ok(())
    }
}

fn check_length(field: &str, text: &str) -> Result<(), OccamError> {
    if text.len() > MAX_TEXT_LENGTH {
        return Err(OccamError::InvalidRequest(format!(
            "'{}' exceeds maximum length of {} bytes",
            field, MAX_TEXT_LENGTH
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tool_wire_names() {
        let json = r#"{
            "thought": "Looked at the header component.",
            "thought_number": 1,
            "thinking_stage": "context_analysis",
            "next_thought_needed": true,
            "user_request": "Add a login button",
            "requested_stage_override": "solution_exploration"
        }"#;

        let request: StepRequest = serde_json::from_str(json).expect("deserialize");
        assert_eq!(request.stage, Stage::ContextAnalysis);
        assert_eq!(request.sequence, 1);
        assert!(request.continue_thinking);
        assert_eq!(request.original_request.as_deref(), Some("Add a login button"));
        assert_eq!(
            request.loopback_target,
            Some(LoopbackTarget::SolutionExploration)
        );
        assert_eq!(request.needs_clarification, None);
    }

    #[test]
    fn unknown_stage_fails_to_deserialize() {
        let json = r#"{"thought":"x","thought_number":2,"thinking_stage":"daydreaming","next_thought_needed":true}"#;
        assert!(serde_json::from_str::<StepRequest>(json).is_err());
    }

    #[test]
    fn validate_accepts_minimal_request() {
        let request = StepRequest::new(Stage::OutcomeDefinition, 2, "Outcome is clear.", true);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_thought() {
        let request = StepRequest::new(Stage::OutcomeDefinition, 2, "", true);
        assert!(matches!(
            request.validate(),
            Err(OccamError::InvalidRequest(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_thought_number() {
        let request = StepRequest::new(Stage::OutcomeDefinition, 0, "thinking", true);
        assert!(request.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_fields() {
        let long = "a".repeat(MAX_TEXT_LENGTH + 1);
        let request =
            StepRequest::new(Stage::ContextAnalysis, 1, "thinking", true).with_original_request(long);
        let err = request.validate().expect_err("too long");
        assert!(err.to_string().contains("user_request"));
    }

    #[test]
    fn validate_rejects_too_many_questions() {
        let questions: Vec<String> = (0..=MAX_CLARIFICATION_QUESTIONS)
            .map(|i| format!("Question {i}?"))
            .collect();
        let request = StepRequest::new(Stage::OutcomeDefinition, 3, "unclear", true)
            .with_clarification_questions(questions);
        assert!(request.validate().is_err());
    }

    #[test]
    fn optional_fields_are_omitted_when_serialized() {
        let request = StepRequest::new(Stage::Implementation, 7, "done", false);
        let value = serde_json::to_value(&request).expect("serialize");
        let object = value.as_object().expect("object");
        assert_eq!(object.len(), 4);
        assert_eq!(object["thinking_stage"], "implementation");
    }
}
