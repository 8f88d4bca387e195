//! # API Request/Response Types
//!
//! JSON structures for the HTTP API. The step endpoint reuses
//! `StepRequest`/`StepResponse` from occam-core directly; the types here
//! describe the introspection endpoints.

use occam_core::{LoopbackPolicy, LoopbackTarget, PromptCatalog, Stage};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STAGES RESPONSE
// =============================================================================

/// One row of the stage table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageInfo {
    pub stage: Stage,
    pub name: String,
    /// Successor in the default sequence, if any.
    pub next: Option<Stage>,
    /// Whether a loopback may target this stage.
    pub loopback_target: bool,
}

/// One sanctioned loopback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopbackRule {
    pub from: Stage,
    pub to: LoopbackTarget,
}

/// Stage table and loopback allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagesResponse {
    pub stages: Vec<StageInfo>,
    pub loopbacks: Vec<LoopbackRule>,
}

impl StagesResponse {
    /// Describe the stage catalog under the given loopback policy.
    #[must_use]
    pub fn from_policy(policy: &LoopbackPolicy) -> Self {
        let stages = Stage::ALL
            .into_iter()
            .map(|stage| StageInfo {
                stage,
                name: stage.name().to_string(),
                next: stage.next(),
                loopback_target: stage.as_loopback_target().is_some(),
            })
            .collect();

        let loopbacks = policy
            .transitions()
            .map(|(from, to)| LoopbackRule { from, to })
            .collect();

        Self { stages, loopbacks }
    }
}

// =============================================================================
// PROMPTS RESPONSE
// =============================================================================

/// One catalog entry, keyed by its canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEntry {
    pub key: String,
    pub text: String,
}

/// Every guidance text in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptsResponse {
    pub prompts: Vec<PromptEntry>,
}

impl PromptsResponse {
    #[must_use]
    pub fn from_catalog(catalog: &PromptCatalog) -> Self {
        Self {
            prompts: catalog
                .iter()
                .map(|(key, text)| PromptEntry {
                    key: key.to_string(),
                    text: text.to_string(),
                })
                .collect(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
