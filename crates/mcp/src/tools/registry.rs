// Tool registry: aggregates handler tool catalogs and routes calls by name

use crate::error::ToolError;
use crate::protocol::{CallToolResult, ToolDefinition};
use crate::tools::CapabilityHandler;
use adt_mcp_core::MetricsSnapshot;
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Static name -> handler table built once at startup
pub struct ToolRegistry {
    handlers: Vec<Arc<dyn CapabilityHandler>>,
    definitions: Vec<ToolDefinition>,
    routes: HashMap<String, Arc<dyn CapabilityHandler>>,
}

impl ToolRegistry {
    /// Build the registry; handler order is discovery order.
    ///
    /// Fails when two handlers declare the same tool name.
    pub fn new(handlers: Vec<Arc<dyn CapabilityHandler>>) -> Result<Self> {
        let mut definitions = Vec::new();
        let mut routes: HashMap<String, Arc<dyn CapabilityHandler>> = HashMap::new();

        for handler in &handlers {
            for definition in handler.tools() {
                if let Some(existing) = routes.get(&definition.name) {
                    bail!(
                        "Tool '{}' is declared by both the {} and {} handlers",
                        definition.name,
                        existing.name(),
                        handler.name()
                    );
                }
                routes.insert(definition.name.clone(), handler.clone());
                definitions.push(definition);
            }
        }

        Ok(Self {
            handlers,
            definitions,
            routes,
        })
    }

    /// All tool definitions in registration order
    pub fn list_tools(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Get the handler owning a tool
    pub fn get(&self, name: &str) -> Option<Arc<dyn CapabilityHandler>> {
        self.routes.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    pub fn handlers(&self) -> &[Arc<dyn CapabilityHandler>] {
        &self.handlers
    }

    /// Route a call to the owning handler.
    ///
    /// `caller` is the rate-limit key. Rejected calls never reach the handler.
    /// Handler errors are returned as they are.
    pub async fn dispatch(
        &self,
        caller: &str,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, ToolError> {
        let handler = self
            .routes
            .get(name)
            .ok_or_else(|| ToolError::MethodNotFound(format!("Unknown tool: {}", name)))?;

        if !handler.metrics().check_rate_limit(caller) {
            let policy = handler.metrics().policy();
            return Err(ToolError::InvalidRequest(format!(
                "Rate limit exceeded for {}: at most {} request(s) per {} ms",
                handler.name(),
                policy.max_requests,
                policy.window.as_millis()
            )));
        }

        debug!(tool = name, handler = handler.name(), caller, "Dispatching tool call");
        handler.handle(name, arguments).await
    }

    /// Metrics of every handler, in registration order
    pub fn metrics_report(&self) -> Vec<(&'static str, MetricsSnapshot)> {
        self.handlers
            .iter()
            .map(|handler| (handler.name(), handler.metrics().snapshot()))
            .collect()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_enum(values: &[&str], description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "enum": values,
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "minimum": 0,
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::mock::MockSession;
    use crate::tools::{default_handlers, HandlerContext};
    use adt_mcp_core::{RateLimitPolicy, RequestMetrics};
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use std::time::Duration;

    struct EchoHandler {
        name: &'static str,
        tools: Vec<&'static str>,
        ctx: HandlerContext,
    }

    impl EchoHandler {
        fn new(name: &'static str, tools: Vec<&'static str>, policy: RateLimitPolicy) -> Self {
            Self {
                name,
                tools,
                ctx: HandlerContext::new(name, MockSession::shared(), policy),
            }
        }
    }

    #[async_trait::async_trait]
    impl CapabilityHandler for EchoHandler {
        fn name(&self) -> &'static str {
            self.name
        }

        fn tools(&self) -> Vec<ToolDefinition> {
            self.tools
                .iter()
                .map(|tool| ToolDefinition::new(*tool, "echo", json_schema_object(json!({}), vec![])))
                .collect()
        }

        async fn handle(&self, tool: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
            let handler = self.name;
            self.ctx
                .execute(tool, async move { Ok(json!({"handler": handler, "args": arguments})) })
                .await
        }

        fn metrics(&self) -> &RequestMetrics {
            self.ctx.metrics()
        }
    }

    fn payload_of(result: &CallToolResult) -> Value {
        serde_json::from_str(result.first_text().unwrap()).unwrap()
    }

    #[test]
    fn test_duplicate_tool_names_are_rejected() {
        let first: Arc<dyn CapabilityHandler> =
            Arc::new(EchoHandler::new("first", vec!["lock"], RateLimitPolicy::disabled()));
        let second: Arc<dyn CapabilityHandler> =
            Arc::new(EchoHandler::new("second", vec!["lock"], RateLimitPolicy::disabled()));

        let error = ToolRegistry::new(vec![first, second]).err().unwrap();
        let message = error.to_string();
        assert!(message.contains("lock"));
        assert!(message.contains("first"));
        assert!(message.contains("second"));
    }

    #[test]
    fn test_list_tools_follows_registration_order() {
        let first: Arc<dyn CapabilityHandler> =
            Arc::new(EchoHandler::new("first", vec!["b", "a"], RateLimitPolicy::disabled()));
        let second: Arc<dyn CapabilityHandler> =
            Arc::new(EchoHandler::new("second", vec!["c"], RateLimitPolicy::disabled()));
        let registry = ToolRegistry::new(vec![first, second]).unwrap();

        let names: Vec<&str> = registry.list_tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        // Stable across calls
        assert_eq!(registry.list_tools(), registry.list_tools());
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_owning_handler() {
        let first: Arc<dyn CapabilityHandler> =
            Arc::new(EchoHandler::new("first", vec!["a"], RateLimitPolicy::disabled()));
        let second: Arc<dyn CapabilityHandler> =
            Arc::new(EchoHandler::new("second", vec!["b"], RateLimitPolicy::disabled()));
        let registry = ToolRegistry::new(vec![first, second]).unwrap();

        let result = registry.dispatch("test", "b", json!({"x": 1})).await.unwrap();
        let payload = payload_of(&result);
        assert_eq!(payload["handler"], "second");
        assert_eq!(payload["args"]["x"], 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_method_not_found_without_delegation() {
        let session = MockSession::new();
        let handlers = default_handlers(session.clone(), RateLimitPolicy::disabled());
        let registry = ToolRegistry::new(handlers).unwrap();

        let error = registry
            .dispatch("test", "compileEverything", json!({}))
            .await
            .unwrap_err();

        assert!(matches!(error, ToolError::MethodNotFound(_)));
        assert_eq!(session.call_count(), 0);
    }

    #[test]
    fn test_default_catalog_is_unique_and_routed() {
        let handlers = default_handlers(MockSession::shared(), RateLimitPolicy::disabled());
        let registry = ToolRegistry::new(handlers).unwrap();

        let mut seen = HashSet::new();
        for definition in registry.list_tools() {
            assert!(seen.insert(definition.name.clone()));
            let owner = registry.get(&definition.name).unwrap();
            let owned = owner.tools();
            assert_eq!(
                owned.iter().filter(|t| t.name == definition.name).count(),
                1
            );
            assert_eq!(definition.input_schema["type"], "object");
        }
        assert_eq!(registry.list_tools().len(), 20);
        assert_eq!(registry.list_tools()[0].name, "login");
    }

    #[test]
    fn test_count_arguments_are_advertised_as_integers() {
        let handlers = default_handlers(MockSession::shared(), RateLimitPolicy::disabled());
        let registry = ToolRegistry::new(handlers).unwrap();

        let property = |tool: &str, name: &str| -> Value {
            let definition = registry
                .list_tools()
                .iter()
                .find(|definition| definition.name == tool)
                .unwrap();
            definition.input_schema["properties"][name].clone()
        };

        for (tool, name) in [
            ("searchObject", "max"),
            ("tableContents", "rowNumber"),
            ("runQuery", "rowNumber"),
        ] {
            assert_eq!(property(tool, name)["type"], "integer", "{}.{}", tool, name);
        }

        for definition in registry.list_tools() {
            let properties = definition.input_schema["properties"].as_object().cloned().unwrap_or_default();
            for (name, schema) in properties {
                assert_ne!(schema["type"], "number", "{}.{}", definition.name, name);
            }
        }
    }

    #[tokio::test]
    async fn test_rate_limit_rejection_is_counted_separately() {
        let policy = RateLimitPolicy {
            enabled: true,
            max_requests: 1,
            window: Duration::from_secs(60),
        };
        let handler = Arc::new(EchoHandler::new("limited", vec!["a"], policy));
        let registry = ToolRegistry::new(vec![handler.clone() as Arc<dyn CapabilityHandler>]).unwrap();

        registry.dispatch("client-a", "a", json!({})).await.unwrap();
        let error = registry.dispatch("client-a", "a", json!({})).await.unwrap_err();
        assert!(matches!(error, ToolError::InvalidRequest(_)));
        assert!(error.message().contains("Rate limit exceeded"));

        // Other callers have their own window
        registry.dispatch("client-b", "a", json!({})).await.unwrap();

        let snapshot = handler.metrics().snapshot();
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.success_count, 2);
        assert_eq!(snapshot.error_count, 0);
        assert_eq!(snapshot.rejected_count, 1);
    }

    #[tokio::test]
    async fn test_metrics_report_lists_every_handler() {
        let handlers = default_handlers(MockSession::shared(), RateLimitPolicy::disabled());
        let registry = ToolRegistry::new(handlers).unwrap();

        registry.dispatch("test", "login", json!({})).await.unwrap();

        let report = registry.metrics_report();
        assert_eq!(report.len(), 9);
        assert_eq!(report[0].0, "auth");
        assert_eq!(report[0].1.total_requests, 1);
        assert!(report[1..].iter().all(|(_, m)| m.total_requests == 0));
    }
}
