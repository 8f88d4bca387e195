//! # Core Type Definitions
//!
//! This module contains the per-call wire types and the error type:
//! - Step request (`StepRequest`)
//! - Step response (`StepResponse` and its variant payloads)
//! - Error types (`OccamError`)
//!
//! ## Lifetime
//!
//! Every request and response is constructed fresh for one call and dropped
//! once the response is emitted. Nothing here is retained between calls.

mod request;
mod response;

pub use request::StepRequest;
pub use response::{
    Action, Blocked, ClarificationNeeded, Completed, ErrorReport, NextThought, StepResponse,
};

use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur at the boundaries of the Occam engine.
///
/// The decision procedure itself never fails: every problem with a request
/// becomes an ERROR response. These errors cover parsing, validation,
/// configuration, and file handling around it.
#[derive(Debug, Error)]
pub enum OccamError {
    /// A request field violates its wire-level constraint.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A stage name outside the closed enumeration.
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// A guidance key that does not name any catalog entry shape.
    #[error("Unknown guidance key: {0}")]
    UnknownGuidanceKey(String),

    /// A configuration file could not be parsed or applied.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<OccamError> for StepResponse {
    fn from(err: OccamError) -> Self {
        StepResponse::error(err.to_string())
    }
}
