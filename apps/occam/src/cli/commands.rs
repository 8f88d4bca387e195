//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, AppState, PromptsResponse, StagesResponse};
use crate::config::Config;
use occam_core::{
    Engine, GuidanceKey, LoopbackPolicy, OccamError, StepRequest, StepResponse,
};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

// =============================================================================
// INPUT LIMITS
// =============================================================================

/// Maximum size of a step request file or stdin payload (4 MB).
const MAX_STEP_INPUT_SIZE: u64 = 4 * 1024 * 1024;

/// Validate file path: resolve symlinks and "..", require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, OccamError> {
    let canonical = path.canonicalize().map_err(|e| {
        OccamError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(OccamError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Read a step request payload from a file or stdin, bounded in size.
fn read_step_input(file: Option<&Path>) -> Result<String, OccamError> {
    let mut input = String::new();

    match file {
        Some(path) => {
            let canonical = validate_file_path(path)?;
            let metadata = std::fs::metadata(&canonical)
                .map_err(|e| OccamError::Io(format!("Cannot read file metadata: {}", e)))?;
            if metadata.len() > MAX_STEP_INPUT_SIZE {
                return Err(OccamError::Io(format!(
                    "File size {} bytes exceeds maximum allowed {} bytes",
                    metadata.len(),
                    MAX_STEP_INPUT_SIZE
                )));
            }
            std::fs::File::open(&canonical)
                .and_then(|f| f.take(MAX_STEP_INPUT_SIZE).read_to_string(&mut input))
                .map_err(|e| OccamError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
        }
        None => {
            std::io::stdin()
                .lock()
                .take(MAX_STEP_INPUT_SIZE)
                .read_to_string(&mut input)
                .map_err(|e| OccamError::Io(format!("Cannot read stdin: {}", e)))?;
        }
    }

    Ok(input)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), OccamError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| OccamError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &Config) -> Result<(), OccamError> {
    let catalog = config.catalog()?;

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        rate_limit = config.server.rate_limit,
        prompts = catalog.len(),
        prompt_overrides = config.prompts.len(),
        "Occam guidance server starting"
    );

    api::run_server(AppState::new(catalog), &config.server).await
}

// =============================================================================
// STEP COMMAND
// =============================================================================

/// Decide one step and print the response JSON.
///
/// Parse failures are reported as an ERROR response, like the HTTP API
/// does, so the command always prints a response when it can read input.
pub fn cmd_step(config: &Config, file: Option<&Path>) -> Result<(), OccamError> {
    let catalog = config.catalog()?;
    let policy = LoopbackPolicy::standard();
    let input = read_step_input(file)?;

    let response = decide_input(&Engine::new(&catalog, &policy), &input);
    print_json(&response)
}

/// Parse a JSON step request and decide it.
pub fn decide_input(engine: &Engine<'_>, input: &str) -> StepResponse {
    match serde_json::from_str::<StepRequest>(input) {
        Ok(request) => engine.handle(&request),
        Err(e) => {
            tracing::debug!(event = "malformed_step", error = %e, "Step input rejected");
            StepResponse::invalid_request(e.to_string())
        }
    }
}

// =============================================================================
// STAGES COMMAND
// =============================================================================

/// Show the stage table and loopback allow-list.
pub fn cmd_stages(json_mode: bool) -> Result<(), OccamError> {
    let response = StagesResponse::from_policy(&LoopbackPolicy::standard());

    if json_mode {
        return print_json(&response);
    }

    println!("Stages (default sequence):");
    for info in &response.stages {
        let next = info
            .next
            .map(|s| s.to_string())
            .unwrap_or_else(|| "(terminal)".to_string());
        println!("  {:<24} -> {:<24} {}", info.stage, next, info.name);
    }
    println!();
    println!("Sanctioned loopbacks:");
    for rule in &response.loopbacks {
        println!("  {:<24} -> {}", rule.from, rule.to);
    }

    Ok(())
}

// =============================================================================
// PROMPTS COMMAND
// =============================================================================

/// Show every guidance text, or the text for one key.
pub fn cmd_prompts(config: &Config, json_mode: bool, key: Option<&str>) -> Result<(), OccamError> {
    let catalog = config.catalog()?;

    if let Some(key) = key {
        let parsed: GuidanceKey = key.parse()?;
        let text = catalog
            .lookup(&parsed)
            .ok_or_else(|| OccamError::UnknownGuidanceKey(format!("{} (no text defined)", key)))?;

        if json_mode {
            return print_json(&serde_json::json!({ "key": parsed.to_string(), "text": text }));
        }
        println!("{}", text);
        return Ok(());
    }

    let response = PromptsResponse::from_catalog(&catalog);
    if json_mode {
        return print_json(&response);
    }

    for entry in &response.prompts {
        println!("[{}]", entry.key);
        println!("{}", entry.text);
        println!();
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use occam_core::{PromptCatalog, Stage};
    use std::io::Write;

    #[test]
    fn decide_input_handles_valid_json() {
        let catalog = PromptCatalog::standard();
        let policy = LoopbackPolicy::standard();
        let engine = Engine::new(&catalog, &policy);

        let input = r#"{"thought":"...","thought_number":1,"thinking_stage":"context_analysis","next_thought_needed":true,"user_request":"add a button"}"#;
        let response = decide_input(&engine, input);
        assert_eq!(response.next_stage(), Some(Stage::OutcomeDefinition));
    }

    #[test]
    fn decide_input_reports_unknown_stage_with_details() {
        let catalog = PromptCatalog::standard();
        let policy = LoopbackPolicy::standard();
        let engine = Engine::new(&catalog, &policy);

        let input = r#"{"thought":"...","thought_number":2,"thinking_stage":"meditation","next_thought_needed":true}"#;
        match decide_input(&engine, input) {
            StepResponse::Error(e) => {
                assert_eq!(e.message, "Invalid step request");
                assert!(e.details.expect("details").contains("meditation"));
            }
            other => unreachable!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn read_step_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{{\"thought\":\"x\"}}").expect("write");
        let input = read_step_input(Some(file.path())).expect("read");
        assert_eq!(input, "{\"thought\":\"x\"}");
    }

    #[test]
    fn read_step_input_rejects_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(read_step_input(Some(dir.path())).is_err());
    }
}
