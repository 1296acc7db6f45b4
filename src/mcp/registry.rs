//! Static tool catalog.
//!
//! The registry is built once at startup from a fixed list of
//! descriptors, grouped by feature area for readability; grouping has
//! no behavioral effect. `tools/list` returns the catalog in
//! registration order, and `tools/call` consults the registry before
//! dispatch so unknown tool names are rejected as tool-level errors
//! rather than protocol errors.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Immutable description of one tool, as exposed by `tools/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Name → descriptor catalog with stable iteration order.
pub struct ToolRegistry {
    descriptors: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            descriptors: Vec::new(),
            index: HashMap::new(),
        };
        registry.register_database_tools();
        registry.register_code_analysis_tools();
        registry.register_configuration_tools();
        registry.register_search_tools();
        registry.register_interactive_tools();
        registry.register_ui_tools();
        registry
    }

    /// All descriptors in registration order.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    fn add(&mut self, name: &str, description: &str, input_schema: Value) {
        debug_assert!(
            !self.index.contains_key(name),
            "duplicate tool name: {}",
            name
        );
        self.index.insert(name.to_string(), self.descriptors.len());
        self.descriptors.push(ToolDescriptor {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        });
    }

    fn register_database_tools(&mut self) {
        self.add(
            "get_database_schema",
            "Get the database schema including tables, columns, and indexes",
            no_params_schema(),
        );
        self.add(
            "get_database_stats",
            "Get database performance statistics and metrics",
            no_params_schema(),
        );
        self.add(
            "get_backend_openapi_schema",
            "Get OpenAPI schema including specifications and route definitions",
            no_params_schema(),
        );
    }

    fn register_code_analysis_tools(&mut self) {
        self.add(
            "get_backend_data_models",
            "Get all backend data models and their structures",
            no_params_schema(),
        );
        self.add(
            "get_backend_api_routes",
            "Get all API routes and endpoints",
            no_params_schema(),
        );
        self.add(
            "get_backend_request_handlers",
            "Get all backend request handlers",
            no_params_schema(),
        );
        self.add(
            "get_backend_services",
            "Get all backend service definitions and interfaces",
            no_params_schema(),
        );
        self.add(
            "get_interfaces",
            "Get all interfaces and their methods",
            no_params_schema(),
        );
        self.add(
            "find_implementations",
            "Find implementations of interfaces",
            string_param_schema("interface", "Interface name to find implementations for", true),
        );
        self.add(
            "get_call_graph",
            "Get call graph analysis of functions",
            string_param_schema("function", "Function name to analyze (optional, defaults to 'main')", false),
        );
    }

    fn register_configuration_tools(&mut self) {
        self.add(
            "get_config",
            "Get application configuration structure",
            no_params_schema(),
        );
        self.add(
            "get_middleware",
            "Get middleware configuration and usage",
            no_params_schema(),
        );
        self.add(
            "get_env_vars",
            "Get environment variables used in the application",
            no_params_schema(),
        );
    }

    fn register_search_tools(&mut self) {
        self.add(
            "search_code",
            "Search for code patterns and implementations",
            string_param_schema("query", "Search query for code", true),
        );
        self.add(
            "get_package_structure",
            "Get the package and module structure",
            no_params_schema(),
        );
        self.add(
            "get_dependencies",
            "Get project dependencies and their relationships",
            no_params_schema(),
        );
        self.add(
            "get_dependency_graph",
            "Get project package dependency graph",
            no_params_schema(),
        );
    }

    fn register_interactive_tools(&mut self) {
        self.add(
            "run_terminal_command",
            "Execute terminal commands in the project context",
            json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "Command to execute"
                    },
                    "workingDir": {
                        "type": "string",
                        "description": "Working directory for command execution (optional)"
                    },
                    "timeoutSecs": {
                        "type": "integer",
                        "description": "Timeout in seconds (optional, defaults to 30)",
                        "minimum": 1
                    }
                },
                "required": ["command"]
            }),
        );
    }

    fn register_ui_tools(&mut self) {
        self.add(
            "browse_with_playwright",
            "Fetch a URL in a headless browser and capture a snapshot",
            url_param_schema(),
        );
        self.add(
            "browse_with_playwright_incremental",
            "Browse with incremental UI state streaming for optimized token usage",
            json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "URL to visit"
                    },
                    "sessionId": {
                        "type": "string",
                        "description": "Session ID for incremental state tracking (optional)"
                    },
                    "streamingMode": {
                        "type": "string",
                        "description": "Streaming mode: 'full', 'incremental', or 'adaptive'",
                        "enum": ["full", "incremental", "adaptive"]
                    }
                },
                "required": ["url"]
            }),
        );
        self.add(
            "process_ui_action_incremental",
            "Process UI action with incremental state updates",
            json!({
                "type": "object",
                "properties": {
                    "sessionId": {
                        "type": "string",
                        "description": "Session ID for incremental state tracking"
                    },
                    "action": {
                        "type": "string",
                        "description": "Type of action to perform",
                        "enum": ["click", "type", "hover", "scroll", "navigate", "wait",
                                 "moveto", "clickat", "doubleclickat", "rightclickat",
                                 "dragfrom", "hoverat", "scrollat"]
                    },
                    "selector": {
                        "type": "string",
                        "description": "CSS selector for the target element"
                    },
                    "text": {
                        "type": "string",
                        "description": "Text to type (for type action)"
                    },
                    "url": {
                        "type": "string",
                        "description": "URL to navigate to (for navigate action)"
                    },
                    "timeout": {
                        "type": "integer",
                        "description": "Timeout in milliseconds",
                        "minimum": 0
                    },
                    "x": { "type": "number", "description": "X coordinate for action" },
                    "y": { "type": "number", "description": "Y coordinate for action" }
                },
                "required": ["sessionId", "action"]
            }),
        );
        self.add(
            "get_incremental_ui_state",
            "Get current incremental UI state for a session",
            json!({
                "type": "object",
                "properties": {
                    "sessionId": {
                        "type": "string",
                        "description": "Session ID for incremental state tracking"
                    }
                },
                "required": ["sessionId"]
            }),
        );
        self.add(
            "set_streaming_mode",
            "Set streaming mode for incremental UI updates",
            json!({
                "type": "object",
                "properties": {
                    "sessionId": {
                        "type": "string",
                        "description": "Session ID for incremental state tracking"
                    },
                    "mode": {
                        "type": "string",
                        "description": "Streaming mode to set",
                        "enum": ["full", "incremental", "adaptive"]
                    }
                },
                "required": ["sessionId", "mode"]
            }),
        );
        self.add(
            "get_stream_stats",
            "Get streaming statistics and performance metrics",
            json!({
                "type": "object",
                "properties": {
                    "sessionId": {
                        "type": "string",
                        "description": "Session ID for incremental state tracking (optional)"
                    }
                }
            }),
        );
        self.add(
            "cleanup_incremental_session",
            "Clean up incremental session and free resources",
            json!({
                "type": "object",
                "properties": {
                    "sessionId": {
                        "type": "string",
                        "description": "Session ID to clean up"
                    }
                },
                "required": ["sessionId"]
            }),
        );
        self.add(
            "get_incremental_debug_info",
            "Get debug information for incremental streaming session",
            json!({
                "type": "object",
                "properties": {
                    "sessionId": {
                        "type": "string",
                        "description": "Session ID for debug information"
                    }
                },
                "required": ["sessionId"]
            }),
        );
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Schema helpers for common shapes.

fn no_params_schema() -> Value {
    json!({
        "type": "object",
        "properties": {}
    })
}

fn string_param_schema(name: &str, description: &str, required: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            name: {
                "type": "string",
                "description": description
            }
        }
    });
    if required {
        schema["required"] = json!([name]);
    }
    schema
}

fn url_param_schema() -> Value {
    string_param_schema("url", "URL to visit", true)
}
