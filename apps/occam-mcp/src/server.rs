//! # Occam MCP Server
//!
//! Implements `ServerHandler` with the single `occams_razor_thinking` tool.
//!
//! The advertised input schema is the [`StepRequest`] schema, but arguments
//! arrive as a raw JSON object and are parsed here. A payload the engine
//! cannot read (unknown stage, wrong type, missing field) is answered with
//! an ERROR response carrying the parse failure in `details`, not with a
//! protocol-level `invalid_params` error.

use occam_core::{Engine, LoopbackPolicy, PromptCatalog, StepRequest, StepResponse};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars::{self, JsonSchema},
    tool, tool_handler, tool_router,
};
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;

const INSTRUCTIONS: &str = "Occam's-razor thinking guide. Call 'occams_razor_thinking' once per \
thought, starting at thought_number 1 with the user's request in 'user_request'. Stages run \
context_analysis -> outcome_definition -> solution_exploration -> simplicity_evaluation -> \
implementation. Follow the returned 'prompt' and 'next_stage' in your next call. Set \
'needs_clarification' with questions to pause for the user, 'requested_stage_override' with a \
justification of at least 10 characters to loop back, and 'next_thought_needed' to false in \
implementation (done) or reporting_issue with 'issue_description' (blocked).";

// =============================================================================
// TOOL ARGUMENTS
// =============================================================================

/// Tool arguments as received. Deserializes from any JSON object and
/// advertises the [`StepRequest`] schema.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct StepArguments(pub serde_json::Map<String, serde_json::Value>);

impl JsonSchema for StepArguments {
    fn schema_name() -> Cow<'static, str> {
        StepRequest::schema_name()
    }

    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        StepRequest::json_schema(generator)
    }
}

// =============================================================================
// MCP SERVER
// =============================================================================

/// MCP server embedding the Occam engine.
#[derive(Clone)]
pub struct OccamMcp {
    catalog: Arc<PromptCatalog>,
    policy: Arc<LoopbackPolicy>,
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

// =============================================================================
// TOOL IMPLEMENTATIONS
// =============================================================================

#[tool_router]
impl OccamMcp {
    pub fn new(catalog: PromptCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            policy: Arc::new(LoopbackPolicy::standard()),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Guide one step of Occam's-razor problem solving: submit the current \
                       thought and stage, receive the next stage and what to think about next"
    )]
    async fn occams_razor_thinking(
        &self,
        params: Parameters<StepArguments>,
    ) -> Result<CallToolResult, McpError> {
        to_tool_result(&self.decide(params.0))
    }

    fn decide(&self, arguments: StepArguments) -> StepResponse {
        let request: StepRequest =
            match serde_json::from_value(serde_json::Value::Object(arguments.0)) {
                Ok(request) => request,
                Err(e) => {
                    tracing::debug!(event = "malformed_step", error = %e, "Tool arguments rejected");
                    return StepResponse::invalid_request(e.to_string());
                }
            };

        let response = Engine::new(&self.catalog, &self.policy).handle(&request);
        tracing::debug!(
            event = "step_decided",
            stage = %request.stage,
            sequence = request.sequence,
            status = response.status(),
            "Tool call decided"
        );
        response
    }
}

// =============================================================================
// SERVER HANDLER
// =============================================================================

#[tool_handler]
impl ServerHandler for OccamMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// =============================================================================
// RESPONSE FORMATTING
// =============================================================================

/// Render a step response as tool output. ERROR outcomes become tool errors
/// carrying the same JSON body.
fn to_tool_result(response: &StepResponse) -> Result<CallToolResult, McpError> {
    let body = serde_json::to_string_pretty(response)
        .map_err(|e| McpError::internal_error(format!("{e}"), None))?;
    let content = vec![Content::text(body)];

    if response.is_error() {
        Ok(CallToolResult::error(content))
    } else {
        Ok(CallToolResult::success(content))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use occam_core::Stage;
    use serde_json::{Value, json};

    fn server() -> OccamMcp {
        OccamMcp::new(PromptCatalog::standard())
    }

    fn arguments(value: Value) -> StepArguments {
        match value {
            Value::Object(map) => StepArguments(map),
            other => unreachable!("arguments must be an object: {other}"),
        }
    }

    fn first_thought() -> Value {
        json!({
            "thought": "Looking around.",
            "thought_number": 1,
            "thinking_stage": "context_analysis",
            "next_thought_needed": true,
            "user_request": "Add a logout button"
        })
    }

    /// The JSON body of the single text content item.
    fn body(result: &CallToolResult) -> Value {
        let result = serde_json::to_value(result).unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn tool_call_advances_first_thought() {
        let result = server()
            .occams_razor_thinking(Parameters(arguments(first_thought())))
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));
        assert_eq!(body(&result)["next_stage"], "outcome_definition");
    }

    #[tokio::test]
    async fn tool_call_error_is_flagged() {
        let mut request = first_thought();
        request.as_object_mut().unwrap().remove("user_request");

        let result = server()
            .occams_razor_thinking(Parameters(arguments(request)))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(body(&result)["status"], "ERROR");
    }

    #[tokio::test]
    async fn unknown_stage_is_an_error_response() {
        let mut request = first_thought();
        request["thinking_stage"] = json!("daydreaming");

        let result = server()
            .occams_razor_thinking(Parameters(arguments(request)))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));

        let body = body(&result);
        assert_eq!(body["status"], "ERROR");
        assert_eq!(body["message"], "Invalid step request");
        assert!(body["details"].as_str().unwrap().contains("daydreaming"));
    }

    #[test]
    fn wrong_types_and_missing_fields_are_error_responses() {
        let mut negative = first_thought();
        negative["thought_number"] = json!(-3);
        let mut missing = first_thought();
        missing.as_object_mut().unwrap().remove("next_thought_needed");

        for request in [negative, missing, json!({})] {
            match server().decide(arguments(request)) {
                StepResponse::Error(e) => assert!(e.details.is_some()),
                other => unreachable!("unexpected response: {other:?}"),
            }
        }
    }

    #[test]
    fn decide_honours_loopbacks() {
        let request = json!({
            "thought": "The outcome missed the mobile layout.",
            "thought_number": 7,
            "thinking_stage": "implementation",
            "next_thought_needed": true,
            "requested_stage_override": "outcome_definition"
        });

        let response = server().decide(arguments(request));
        assert_eq!(response.next_stage(), Some(Stage::OutcomeDefinition));
    }

    #[test]
    fn arguments_advertise_step_request_schema() {
        let schema = serde_json::to_value(schemars::schema_for!(StepArguments)).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        for field in ["thought", "thought_number", "thinking_stage", "next_thought_needed"] {
            assert!(properties.contains_key(field), "missing {field}");
        }
        assert_eq!(
            serde_json::to_value(schemars::schema_for!(StepRequest)).unwrap(),
            schema
        );
    }

    #[test]
    fn tool_result_body_is_response_json() {
        let response = StepResponse::completed("Done.".to_string(), 4);
        let result = to_tool_result(&response).unwrap();
        assert_ne!(result.is_error, Some(true));
        assert_eq!(body(&result)["final_thought"], "Done.");
    }

    #[test]
    fn server_info_enables_tools() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(
            info.instructions
                .unwrap()
                .contains("occams_razor_thinking")
        );
    }
}
