//! # occam-core
//!
//! The stateless stage-transition engine for Occam - THE ENGINE.
//!
//! Occam guides an external agent (an LLM) through a fixed sequence of
//! reasoning stages while keeping it on the simplest effective solution:
//!
//! ```text
//! context_analysis → outcome_definition → solution_exploration
//!     → simplicity_evaluation → implementation ⟲
//!
//! reporting_issue  (terminal, entered only by terminating)
//! ```
//!
//! ## Components
//!
//! - `stage` → the closed stage catalog and default sequence
//! - `prompts` → guidance keys and the immutable prompt catalog
//! - `loopback` → the loopback allow-list validator
//! - `engine` → the decision procedure, one request in, one response out
//! - `types` → request, response, and error types
//!
//! ## Architectural Constraints
//!
//! The engine:
//! - Holds no state between calls; continuity lives in the caller's request
//! - Borrows its catalog and policy read-only (built once at startup)
//! - Never panics on bad input; every problem becomes an ERROR response
//! - Has NO async, NO network dependencies (pure Rust)
//!
//! ## Example
//!
//! ```
//! use occam_core::{Engine, LoopbackPolicy, PromptCatalog, Stage, StepRequest};
//!
//! let catalog = PromptCatalog::standard();
//! let policy = LoopbackPolicy::standard();
//! let engine = Engine::new(&catalog, &policy);
//!
//! let request = StepRequest::new(Stage::ContextAnalysis, 1, "Uses React.", true)
//!     .with_original_request("add a button");
//! let response = engine.decide(&request);
//!
//! assert_eq!(response.next_stage(), Some(Stage::OutcomeDefinition));
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod engine;
pub mod loopback;
pub mod primitives;
pub mod prompts;
pub mod stage;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use engine::{Engine, clarification_note};
pub use loopback::{LoopbackDenial, LoopbackPolicy};
pub use prompts::{GuidanceKey, PromptCatalog};
pub use stage::{LoopbackTarget, Stage};
pub use types::{
    Action, Blocked, ClarificationNeeded, Completed, ErrorReport, NextThought, OccamError,
    StepRequest, StepResponse,
};
