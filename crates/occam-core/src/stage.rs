//! # Stage Catalog
//!
//! The closed set of thinking stages and the subset that may be targeted by a
//! loopback.
//!
//! ## Default Sequence
//!
//! | Stage | Successor |
//! |-------|-----------|
//! | `context_analysis` | `outcome_definition` |
//! | `outcome_definition` | `solution_exploration` |
//! | `solution_exploration` | `simplicity_evaluation` |
//! | `simplicity_evaluation` | `implementation` |
//! | `implementation` | `implementation` (refinement) |
//! | `reporting_issue` | none (terminal only) |

use crate::OccamError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// STAGE ENUM
// =============================================================================

/// One phase of the fixed reasoning sequence.
///
/// Variants are declared in default-sequence order, so `Ord` follows the
/// sequence. `ReportingIssue` sorts last and is never reached by advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Understand the request and the surrounding project.
    ContextAnalysis,
    /// Define the minimal outcome and its success criteria.
    OutcomeDefinition,
    /// Generate candidate approaches.
    SolutionExploration,
    /// Pick the simplest effective approach.
    SimplicityEvaluation,
    /// Carry out the chosen approach.
    Implementation,
    /// Terminal: the task is blocked or infeasible.
    ReportingIssue,
}

impl Stage {
    /// Every stage, in default-sequence order.
    pub const ALL: [Stage; 6] = [
        Stage::ContextAnalysis,
        Stage::OutcomeDefinition,
        Stage::SolutionExploration,
        Stage::SimplicityEvaluation,
        Stage::Implementation,
        Stage::ReportingIssue,
    ];

    /// Wire name of the stage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Stage::ContextAnalysis => "context_analysis",
            Stage::OutcomeDefinition => "outcome_definition",
            Stage::SolutionExploration => "solution_exploration",
            Stage::SimplicityEvaluation => "simplicity_evaluation",
            Stage::Implementation => "implementation",
            Stage::ReportingIssue => "reporting_issue",
        }
    }

    /// Human-readable stage name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Stage::ContextAnalysis => "Context Analysis",
            Stage::OutcomeDefinition => "Outcome Definition",
            Stage::SolutionExploration => "Solution Exploration",
            Stage::SimplicityEvaluation => "Simplicity Evaluation",
            Stage::Implementation => "Implementation",
            Stage::ReportingIssue => "Reporting Issue",
        }
    }

    /// Successor in the default sequence.
    ///
    /// `Implementation` is its own successor (refinement). `ReportingIssue`
    /// has no outgoing sequential edge.
    #[must_use]
    pub const fn next(&self) -> Option<Stage> {
        match self {
            Stage::ContextAnalysis => Some(Stage::OutcomeDefinition),
            Stage::OutcomeDefinition => Some(Stage::SolutionExploration),
            Stage::SolutionExploration => Some(Stage::SimplicityEvaluation),
            Stage::SimplicityEvaluation => Some(Stage::Implementation),
            Stage::Implementation => Some(Stage::Implementation),
            Stage::ReportingIssue => None,
        }
    }

    /// Check if this stage is the issue-reporting terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Stage::ReportingIssue)
    }

    /// The loopback target naming this stage, if it can be one.
    #[must_use]
    pub const fn as_loopback_target(&self) -> Option<LoopbackTarget> {
        match self {
            Stage::ContextAnalysis => Some(LoopbackTarget::ContextAnalysis),
            Stage::OutcomeDefinition => Some(LoopbackTarget::OutcomeDefinition),
            Stage::SolutionExploration => Some(LoopbackTarget::SolutionExploration),
            Stage::SimplicityEvaluation => Some(LoopbackTarget::SimplicityEvaluation),
            Stage::Implementation => Some(LoopbackTarget::Implementation),
            Stage::ReportingIssue => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = OccamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| OccamError::UnknownStage(s.to_string()))
    }
}

// =============================================================================
// LOOPBACK TARGET ENUM
// =============================================================================

/// A stage that a loopback may return to.
///
/// Identical to [`Stage`] minus `ReportingIssue`: the issue terminal is
/// entered by terminating, never by looping back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum LoopbackTarget {
    ContextAnalysis,
    OutcomeDefinition,
    SolutionExploration,
    SimplicityEvaluation,
    Implementation,
}

impl LoopbackTarget {
    /// Every loopback target, in default-sequence order.
    pub const ALL: [LoopbackTarget; 5] = [
        LoopbackTarget::ContextAnalysis,
        LoopbackTarget::OutcomeDefinition,
        LoopbackTarget::SolutionExploration,
        LoopbackTarget::SimplicityEvaluation,
        LoopbackTarget::Implementation,
    ];

    /// The stage this target refers to.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            LoopbackTarget::ContextAnalysis => Stage::ContextAnalysis,
            LoopbackTarget::OutcomeDefinition => Stage::OutcomeDefinition,
            LoopbackTarget::SolutionExploration => Stage::SolutionExploration,
            LoopbackTarget::SimplicityEvaluation => Stage::SimplicityEvaluation,
            LoopbackTarget::Implementation => Stage::Implementation,
        }
    }

    /// Wire name of the target.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.stage().as_str()
    }
}

impl From<LoopbackTarget> for Stage {
    fn from(target: LoopbackTarget) -> Self {
        target.stage()
    }
}

impl std::fmt::Display for LoopbackTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LoopbackTarget {
    type Err = OccamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Stage>()?
            .as_loopback_target()
            .ok_or_else(|| OccamError::UnknownStage(s.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
