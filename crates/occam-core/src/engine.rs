//! # Stage Transition Engine
//!
//! Turns one [`StepRequest`] into exactly one [`StepResponse`].
//!
//! ## Decision Order
//!
//! The first matching rule wins:
//!
//! 1. First thought without the original user request → ERROR.
//! 2. `next_thought_needed = false` → BLOCKED, COMPLETED, or ERROR.
//! 3. `needs_clarification = true` → CLARIFICATION_NEEDED, or ERROR without
//!    questions.
//! 4. Loopback requested and accepted → next stage is the target. A rejected
//!    loopback falls through to rule 5 as if it had not been requested.
//! 5. Sequential advance along the default sequence.
//! 6. Guidance lookup, with the clarification note prepended if an answer
//!    was supplied.
//!
//! The engine holds only borrowed, read-only collaborators. Two calls with
//! the same request always produce the same response.

use crate::{
    GuidanceKey, LoopbackPolicy, PromptCatalog, Stage, StepRequest, StepResponse,
    primitives::FIRST_THOUGHT,
};

/// The next stage chosen for a continuing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Transition {
    next: Stage,
    /// Source stage of an accepted loopback.
    loopback_from: Option<Stage>,
}

/// Stateless stage-transition engine.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'a> {
    catalog: &'a PromptCatalog,
    policy: &'a LoopbackPolicy,
}

impl<'a> Engine<'a> {
    /// Create an engine over a prompt catalog and a loopback policy.
    #[must_use]
    pub fn new(catalog: &'a PromptCatalog, policy: &'a LoopbackPolicy) -> Self {
        Self { catalog, policy }
    }

    /// Validate the request's fields, then decide.
    ///
    /// This is the entry point transports use: a field violation becomes an
    /// ERROR response instead of reaching the decision rules.
    #[must_use]
    pub fn handle(&self, request: &StepRequest) -> StepResponse {
        match request.validate() {
            Ok(()) => self.decide(request),
            Err(e) => {
                tracing::debug!(event = "invalid_request", error = %e, "Request rejected");
                e.into()
            }
        }
    }

    /// Decide the outcome of one step.
    #[must_use]
    pub fn decide(&self, request: &StepRequest) -> StepResponse {
        if request.sequence == FIRST_THOUGHT
            && request.original_request.as_deref().is_none_or(str::is_empty)
        {
            return StepResponse::error(
                "Missing required parameter 'user_request' for the first thought (thought_number: 1).",
            );
        }

        if !request.continue_thinking {
            return self.terminate(request);
        }

        if request.needs_clarification == Some(true) {
            return self.clarify(request);
        }

        let transition = match self.transition(request) {
            Ok(transition) => transition,
            Err(response) => return response,
        };

        let refinement = request.stage == Stage::Implementation
            && transition.next == Stage::Implementation;
        let key = GuidanceKey::resolve(transition.next, refinement, transition.loopback_from);
        let guidance = self.guidance(key, request.clarification_answer.as_deref());

        StepResponse::next_thought(transition.next, guidance, request.sequence)
    }

    fn terminate(&self, request: &StepRequest) -> StepResponse {
        let issue = request.issue_summary.as_deref().filter(|s| !s.is_empty());

        match (request.stage, issue) {
            (Stage::ReportingIssue, Some(issue)) => StepResponse::blocked(
                issue.to_string(),
                request.rationale.clone(),
                request.sequence,
            ),
            (Stage::Implementation, _) => {
                StepResponse::completed(request.rationale.clone(), request.sequence)
            }
            (stage, _) => {
                tracing::warn!(
                    event = "invalid_termination",
                    stage = %stage,
                    sequence = request.sequence,
                    "Termination requested outside a terminal shape"
                );
                StepResponse::error(format!(
                    "Invalid termination state. 'next_thought_needed' is false, but stage is '{}' \
                     and no issue description provided for reporting_issue stage.",
                    stage
                ))
            }
        }
    }

    fn clarify(&self, request: &StepRequest) -> StepResponse {
        match request.clarification_questions.as_deref() {
            Some(questions) if !questions.is_empty() => {
                StepResponse::clarification_needed(questions.to_vec(), request.sequence)
            }
            _ => StepResponse::error(
                "'needs_clarification' is true, but 'clarification_questions' is missing or empty.",
            ),
        }
    }

    fn transition(&self, request: &StepRequest) -> Result<Transition, StepResponse> {
        let current = request.stage;

        if let Some(target) = request.loopback_target {
            match self.policy.evaluate(current, target, &request.rationale) {
                Ok(()) => {
                    tracing::info!(
                        event = "loopback_accepted",
                        from = %current,
                        to = %target,
                        sequence = request.sequence,
                        "Loopback accepted"
                    );
                    return Ok(Transition {
                        next: target.stage(),
                        loopback_from: Some(current),
                    });
                }
                Err(denial) => {
                    tracing::warn!(
                        event = "loopback_denied",
                        from = %current,
                        to = %target,
                        reason = denial.reason(),
                        sequence = request.sequence,
                        "Loopback denied ({}), advancing sequentially",
                        denial
                    );
                }
            }
        }

        match current.next() {
            Some(next) => Ok(Transition {
                next,
                loopback_from: None,
            }),
            None => {
                tracing::warn!(
                    event = "unexpected_state",
                    stage = %current,
                    sequence = request.sequence,
                    "Issue stage reached while continuing"
                );
                Err(StepResponse::error(
                    "Invalid state: Reached REPORTING_ISSUE stage while next_thought_needed is true.",
                ))
            }
        }
    }

    fn guidance(&self, key: GuidanceKey, clarification_answer: Option<&str>) -> String {
        let text = self
            .catalog
            .lookup(&key)
            .or_else(|| key.fallback().and_then(|k| self.catalog.lookup(&k)));

        let text = match text {
            Some(text) => text.to_string(),
            None => {
                tracing::warn!(event = "missing_prompt", key = %key, "No guidance text for key");
                format!("Error: No prompt defined for stage key: {}", key)
            }
        };

        match clarification_answer.filter(|a| !a.is_empty()) {
            Some(answer) => format!("{}{}", clarification_note(answer), text),
            None => text,
        }
    }
}

/// Acknowledgment prepended to guidance when the caller relays the user's
/// answer. Single quotes in the answer are escaped so the quoted answer stays
/// well-formed.
#[must_use]
pub fn clarification_note(answer: &str) -> String {
    format!(
        "Received user clarification: '{}'. Please incorporate this into your thinking for the following step.\n\n",
        answer.replace('\'', "\\'")
    )
}

// =============================================================================
// TESTS
// =============================================================================
