//! # Loopback Validator
//!
//! Decides whether a requested jump back to an earlier stage is permitted.
//!
//! A loopback is allowed only when both hold:
//! 1. The justification, trimmed, is at least [`MIN_JUSTIFICATION_CHARS`] long.
//! 2. The `(current, target)` pair is on the allow-list.
//!
//! ## Standard Allow-List
//!
//! | From | To |
//! |------|----|
//! | `simplicity_evaluation` | `solution_exploration` |
//! | `implementation` | `outcome_definition` |
//! | `implementation` | `simplicity_evaluation` |
//!
//! Forward jumps and self-loops are never on the list.

use crate::{LoopbackTarget, Stage, primitives::MIN_JUSTIFICATION_CHARS};
use std::collections::BTreeSet;

// =============================================================================
// DENIAL REASONS
// =============================================================================

/// Why a loopback was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopbackDenial {
    /// The trimmed justification has fewer characters than required.
    JustificationTooShort { chars: usize, required: usize },
    /// The transition is not on the allow-list.
    NotSanctioned,
}

impl LoopbackDenial {
    /// Short machine-friendly reason, used as a log field.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            LoopbackDenial::JustificationTooShort { .. } => "justification_too_short",
            LoopbackDenial::NotSanctioned => "transition_not_sanctioned",
        }
    }
}

impl std::fmt::Display for LoopbackDenial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopbackDenial::JustificationTooShort { chars, required } => write!(
                f,
                "justification has {} characters, at least {} required",
                chars, required
            ),
            LoopbackDenial::NotSanctioned => write!(f, "transition is not on the allow-list"),
        }
    }
}

// =============================================================================
// LOOPBACK POLICY
// =============================================================================

/// Allow-list of sanctioned backward transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackPolicy {
    allowed: BTreeSet<(Stage, LoopbackTarget)>,
    min_justification_chars: usize,
}

impl Default for LoopbackPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl LoopbackPolicy {
    /// The standard allow-list.
    #[must_use]
    pub fn standard() -> Self {
        Self::with_transitions([
            (Stage::SimplicityEvaluation, LoopbackTarget::SolutionExploration),
            (Stage::Implementation, LoopbackTarget::OutcomeDefinition),
            (Stage::Implementation, LoopbackTarget::SimplicityEvaluation),
        ])
    }

    /// A policy allowing exactly the given transitions.
    #[must_use]
    pub fn with_transitions<I>(transitions: I) -> Self
    where
        I: IntoIterator<Item = (Stage, LoopbackTarget)>,
    {
        Self {
            allowed: transitions.into_iter().collect(),
            min_justification_chars: MIN_JUSTIFICATION_CHARS,
        }
    }

    /// Sanctioned transitions in deterministic order.
    pub fn transitions(&self) -> impl Iterator<Item = (Stage, LoopbackTarget)> + '_ {
        self.allowed.iter().copied()
    }

    /// Check a loopback request, returning the denial reason on rejection.
    pub fn evaluate(
        &self,
        current: Stage,
        target: LoopbackTarget,
        justification: &str,
    ) -> Result<(), LoopbackDenial> {
        let chars = justification.trim().chars().count();
        if chars < self.min_justification_chars {
            return Err(LoopbackDenial::JustificationTooShort {
                chars,
                required: self.min_justification_chars,
            });
        }

        if !self.allowed.contains(&(current, target)) {
            return Err(LoopbackDenial::NotSanctioned);
        }

        Ok(())
    }

    /// Check a loopback request.
    pub fn is_allowed(&self, current: Stage, target: LoopbackTarget, justification: &str) -> bool {
        match self.evaluate(current, target, justification) {
            Ok(()) => {
                tracing::debug!(from = %current, to = %target, "Loopback permitted");
                true
            }
            Err(denial) => {
                tracing::debug!(
                    from = %current,
                    to = %target,
                    reason = denial.reason(),
                    "Loopback rejected: {}",
                    denial
                );
                false
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
