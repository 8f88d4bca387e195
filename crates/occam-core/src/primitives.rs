//! # Engine Primitives
//!
//! Hardcoded runtime constants for the Occam engine.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! Transports use the input limits to reject oversized requests before they
//! reach the decision procedure.

/// Sequence number of the first thought in a conversation.
///
/// A request carrying this number must also carry the original user request.
pub const FIRST_THOUGHT: u32 = 1;

/// Minimum justification length (in characters, after trimming) for a
/// loopback request to be considered.
pub const MIN_JUSTIFICATION_CHARS: usize = 10;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length in bytes for any single free-text request field.
///
/// Applies to the thought, the user request, the clarification answer,
/// the issue description, and each clarification question.
pub const MAX_TEXT_LENGTH: usize = 65536;

/// Maximum number of clarification questions in a single request.
pub const MAX_CLARIFICATION_QUESTIONS: usize = 32;
