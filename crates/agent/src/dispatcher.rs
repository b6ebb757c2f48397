//! Concurrent tool dispatch — fan-out, bounded, fault-isolated.
//!
//! All requests in a batch execute in parallel (they are independent and
//! I/O-bound), bounded by a semaphore sized `min(cap, 2 × batch)`. Results
//! are collected by request id regardless of completion order; the caller
//! re-orders them back into request order when appending tool messages.
//!
//! Every failure mode — unparsable arguments, unknown tool name, tool
//! execution fault — degrades to an error-flavored result string for that
//! id alone, visible to the model for self-correction. A tool fault never
//! aborts its siblings or the round.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use wayfarer_core::message::ToolCallRequest;
use wayfarer_core::tool::{ToolCall, ToolKind, ToolRegistry};

/// Default hard cap on concurrent in-flight tool invocations.
pub const DEFAULT_MAX_CONCURRENT: usize = 32;

/// The outcome of one dispatched request.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// Result text — tool output or an error description.
    pub output: String,

    /// Semantic category of the requested tool, so the caller can report
    /// which capabilities were exercised without re-inspecting names.
    pub kind: ToolKind,
}

/// Executes batches of tool-call requests against a registry.
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    max_concurrent: usize,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Override the concurrency cap.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Execute all requests concurrently.
    ///
    /// The returned map contains every input id exactly once, whatever
    /// happened to the individual invocations.
    pub async fn dispatch(&self, requests: &[ToolCallRequest]) -> HashMap<String, ToolOutcome> {
        let mut results: HashMap<String, ToolOutcome> = HashMap::with_capacity(requests.len());
        if requests.is_empty() {
            return results;
        }

        let permits = self.max_concurrent.min(requests.len() * 2).max(1);
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut join_set = JoinSet::new();

        debug!(
            batch = requests.len(),
            permits, "Dispatching tool call batch"
        );

        for request in requests {
            let registry = self.registry.clone();
            let semaphore = semaphore.clone();
            let request = request.clone();

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = run_one(&registry, &request).await;
                (request.id, outcome)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((id, outcome)) => {
                    results.insert(id, outcome);
                }
                Err(e) => {
                    // Panic or cancellation in a tool task; the missing id
                    // is backfilled below.
                    warn!(error = %e, "Tool task failed to join");
                }
            }
        }

        // Guarantee every requested id is present exactly once.
        for request in requests {
            results.entry(request.id.clone()).or_insert_with(|| ToolOutcome {
                output: format!("Error: tool '{}' produced no result", request.name),
                kind: self
                    .registry
                    .kind_of(&request.name)
                    .unwrap_or(ToolKind::Other),
            });
        }

        results
    }
}

/// Run one request, degrading every fault to an error-flavored outcome.
async fn run_one(registry: &ToolRegistry, request: &ToolCallRequest) -> ToolOutcome {
    let kind = registry.kind_of(&request.name).unwrap_or(ToolKind::Other);

    let raw = if request.arguments.trim().is_empty() {
        "{}"
    } else {
        request.arguments.as_str()
    };

    let arguments: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(tool = %request.name, error = %e, "Malformed tool arguments");
            return ToolOutcome {
                output: format!("Error: invalid tool arguments: {e}"),
                kind,
            };
        }
    };

    let call = ToolCall {
        id: request.id.clone(),
        name: request.name.clone(),
        arguments,
    };

    match registry.execute(&call).await {
        Ok(result) => ToolOutcome {
            output: result.output,
            kind,
        },
        Err(e) => {
            warn!(tool = %request.name, error = %e, "Tool execution failed");
            ToolOutcome {
                output: format!("Error: {e}"),
                kind,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use wayfarer_core::error::ToolError;
    use wayfarer_core::tool::{Tool, ToolResult};

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }
        fn description(&self) -> &str {
            "Uppercases text"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(
            &self,
            arguments: serde_json::Value,
        ) -> std::result::Result<ToolResult, ToolError> {
            let text = arguments["text"].as_str().unwrap_or("").to_uppercase();
            Ok(ToolResult {
                call_id: String::new(),
                success: true,
                output: text,
                data: None,
            })
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "failing"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        fn kind(&self) -> ToolKind {
            ToolKind::Weather
        }
        async fn execute(
            &self,
            _arguments: serde_json::Value,
        ) -> std::result::Result<ToolResult, ToolError> {
            Err(ToolError::ExecutionFailed {
                tool_name: "failing".into(),
                reason: "upstream unavailable".into(),
            })
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(UpperTool));
        registry.register(Box::new(FailingTool));
        Arc::new(registry)
    }

    fn request(id: &str, index: u32, name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: id.into(),
            index,
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    #[tokio::test]
    async fn dispatches_batch_and_maps_by_id() {
        let dispatcher = ToolDispatcher::new(registry());
        let requests = vec![
            request("a", 0, "upper", r#"{"text":"one"}"#),
            request("b", 1, "upper", r#"{"text":"two"}"#),
        ];
        let results = dispatcher.dispatch(&requests).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results["a"].output, "ONE");
        assert_eq!(results["b"].output, "TWO");
    }

    #[tokio::test]
    async fn failure_is_isolated_to_its_id() {
        // Five requests where the middle one faults: all five ids map,
        // and the others are unaffected.
        let dispatcher = ToolDispatcher::new(registry());
        let requests = vec![
            request("A", 0, "upper", r#"{"text":"a"}"#),
            request("B", 1, "upper", r#"{"text":"b"}"#),
            request("C", 2, "failing", "{}"),
            request("D", 3, "upper", r#"{"text":"d"}"#),
            request("E", 4, "upper", r#"{"text":"e"}"#),
        ];
        let results = dispatcher.dispatch(&requests).await;
        assert_eq!(results.len(), 5);
        assert!(results["C"].output.starts_with("Error:"));
        assert!(results["C"].output.contains("upstream unavailable"));
        assert_eq!(results["D"].output, "D");
        assert_eq!(results["E"].output, "E");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_result() {
        let dispatcher = ToolDispatcher::new(registry());
        let results = dispatcher
            .dispatch(&[request("x", 0, "nonexistent", "{}")])
            .await;
        assert!(results["x"].output.contains("Tool not found"));
        assert_eq!(results["x"].kind, ToolKind::Other);
    }

    #[tokio::test]
    async fn malformed_arguments_become_error_result() {
        let dispatcher = ToolDispatcher::new(registry());
        let results = dispatcher
            .dispatch(&[request("x", 0, "upper", "{not json")])
            .await;
        assert!(results["x"].output.contains("invalid tool arguments"));
    }

    #[tokio::test]
    async fn empty_arguments_default_to_empty_object() {
        let dispatcher = ToolDispatcher::new(registry());
        let results = dispatcher.dispatch(&[request("x", 0, "upper", "")]).await;
        // No text argument → empty uppercase output, but no error
        assert_eq!(results["x"].output, "");
    }

    #[tokio::test]
    async fn outcome_carries_tool_kind() {
        let dispatcher = ToolDispatcher::new(registry());
        let results = dispatcher
            .dispatch(&[request("x", 0, "failing", "{}")])
            .await;
        // Category comes from the registry even when execution fails
        assert_eq!(results["x"].kind, ToolKind::Weather);
    }

    #[tokio::test]
    async fn empty_batch_returns_empty_map() {
        let dispatcher = ToolDispatcher::new(registry());
        assert!(dispatcher.dispatch(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn concurrency_cap_of_one_still_completes_batch() {
        let dispatcher = ToolDispatcher::new(registry()).with_max_concurrent(1);
        let requests: Vec<_> = (0..8)
            .map(|i| request(&format!("id{i}"), i, "upper", r#"{"text":"x"}"#))
            .collect();
        let results = dispatcher.dispatch(&requests).await;
        assert_eq!(results.len(), 8);
    }
}
