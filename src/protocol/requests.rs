//! Typed requests and notifications, each bound to its wire method name.
//!
//! These deserialize from the *full* JSON-RPC envelope (unknown fields such
//! as `jsonrpc` and `id` are ignored), which is exactly what the router hands
//! a handler: a fresh instance per dispatch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::jsonrpc::Request;

use super::capability::ClientCapabilities;
use super::results::Role;
use super::Implementation;

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct InitializeRequest {
    pub params: InitializeParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,

    #[serde(default)]
    pub capabilities: ClientCapabilities,

    pub client_info: Implementation,
}

impl Request for InitializeRequest {
    const METHOD: &'static str = "initialize";
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PingRequest {
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request for PingRequest {
    const METHOD: &'static str = "ping";
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitializedNotification {
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request for InitializedNotification {
    const METHOD: &'static str = "notifications/initialized";
}

// ─────────────────────────────────────────────────────────────────────────────
// Resources
// ─────────────────────────────────────────────────────────────────────────────

/// Cursor-only pagination parameters shared by the list requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginatedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListResourcesRequest {
    #[serde(default)]
    pub params: Option<PaginatedParams>,
}

impl Request for ListResourcesRequest {
    const METHOD: &'static str = "resources/list";
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadResourceRequest {
    pub params: ReadResourceParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadResourceParams {
    pub uri: String,
}

impl Request for ReadResourceRequest {
    const METHOD: &'static str = "resources/read";
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListResourceTemplatesRequest {
    #[serde(default)]
    pub params: Option<PaginatedParams>,
}

impl Request for ListResourceTemplatesRequest {
    const METHOD: &'static str = "resources/templates/list";
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub params: ReadResourceParams,
}

impl Request for SubscribeRequest {
    const METHOD: &'static str = "resources/subscribe";
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsubscribeRequest {
    pub params: ReadResourceParams,
}

impl Request for UnsubscribeRequest {
    const METHOD: &'static str = "resources/unsubscribe";
}

// ─────────────────────────────────────────────────────────────────────────────
// Prompts
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPromptsRequest {
    #[serde(default)]
    pub params: Option<PaginatedParams>,
}

impl Request for ListPromptsRequest {
    const METHOD: &'static str = "prompts/list";
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetPromptRequest {
    pub params: GetPromptParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPromptParams {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
}

impl Request for GetPromptRequest {
    const METHOD: &'static str = "prompts/get";
}

// ─────────────────────────────────────────────────────────────────────────────
// Tools
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListToolsRequest {
    #[serde(default)]
    pub params: Option<PaginatedParams>,
}

impl Request for ListToolsRequest {
    const METHOD: &'static str = "tools/list";
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallToolRequest {
    pub params: CallToolParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
}

impl Request for CallToolRequest {
    const METHOD: &'static str = "tools/call";
}

// ─────────────────────────────────────────────────────────────────────────────
// Completion
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteRequest {
    pub params: CompleteParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteParams {
    /// What is being completed: a prompt argument or a resource URI.
    #[serde(rename = "ref")]
    pub reference: CompletionReference,

    pub argument: CompletionArgument,
}

/// Discriminated completion target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CompletionReference {
    #[serde(rename = "ref/prompt")]
    Prompt { name: String },

    #[serde(rename = "ref/resource")]
    Resource { uri: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionArgument {
    pub name: String,
    pub value: String,
}

impl Request for CompleteRequest {
    const METHOD: &'static str = "completion/complete";
}

// ─────────────────────────────────────────────────────────────────────────────
// Sampling / logging / roots
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessageRequest {
    pub params: CreateMessageParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageParams {
    pub messages: Vec<SamplingMessage>,
    pub max_tokens: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingMessage {
    pub role: Role,
    pub content: Value,
}

impl Request for CreateMessageRequest {
    const METHOD: &'static str = "sampling/createMessage";
}

/// Severity levels for `logging/setLevel` and `notifications/message`,
/// ordered least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetLevelRequest {
    pub params: SetLevelParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetLevelParams {
    pub level: LoggingLevel,
}

impl Request for SetLevelRequest {
    const METHOD: &'static str = "logging/setLevel";
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRootsRequest {
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request for ListRootsRequest {
    const METHOD: &'static str = "roots/list";
}

// ─────────────────────────────────────────────────────────────────────────────
// Notifications
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressNotification {
    pub params: ProgressParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressParams {
    /// Token from the request this progress belongs to.
    pub progress_token: Value,

    pub progress: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

impl Request for ProgressNotification {
    const METHOD: &'static str = "notifications/progress";
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceUpdatedNotification {
    pub params: ReadResourceParams,
}

impl Request for ResourceUpdatedNotification {
    const METHOD: &'static str = "notifications/resources/updated";
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptListChangedNotification {
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request for PromptListChangedNotification {
    const METHOD: &'static str = "notifications/prompts/list_changed";
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolListChangedNotification {
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request for ToolListChangedNotification {
    const METHOD: &'static str = "notifications/tools/list_changed";
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootsListChangedNotification {
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request for RootsListChangedNotification {
    const METHOD: &'static str = "notifications/roots/list_changed";
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelledNotification {
    pub params: CancelledParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledParams {
    /// Id of the request being cancelled.
    pub request_id: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Request for CancelledNotification {
    const METHOD: &'static str = "notifications/cancelled";
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingMessageNotification {
    pub params: LoggingMessageParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingMessageParams {
    pub level: LoggingLevel,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,

    pub data: Value,
}

impl Request for LoggingMessageNotification {
    const METHOD: &'static str = "notifications/message";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initialize_decodes_from_full_envelope() {
        let envelope = json!({
            "id": 0,
            "jsonrpc": "2.0",
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": {"name": "X", "version": "0"}
            }
        });
        let request: InitializeRequest = serde_json::from_value(envelope).unwrap();
        assert_eq!(request.params.protocol_version, "2025-03-26");
        assert_eq!(request.params.client_info.name, "X");
    }

    #[test]
    fn test_ping_decodes_with_and_without_params() {
        let with: PingRequest =
            serde_json::from_value(json!({"method": "ping", "params": {}, "id": 0})).unwrap();
        assert!(with.params.is_some());

        let without: PingRequest =
            serde_json::from_value(json!({"method": "ping", "id": 0})).unwrap();
        assert!(without.params.is_none());
    }

    #[test]
    fn test_call_tool_decodes_arguments() {
        let envelope = json!({
            "jsonrpc": "2.0", "id": 2, "method": "tools/call",
            "params": {"name": "list-files", "arguments": {"path": "/tmp"}}
        });
        let request: CallToolRequest = serde_json::from_value(envelope).unwrap();
        assert_eq!(request.params.name, "list-files");
        let arguments = request.params.arguments.unwrap();
        assert_eq!(arguments.get("path").unwrap(), "/tmp");
    }

    #[test]
    fn test_complete_reference_dispatch() {
        let prompt: CompleteRequest = serde_json::from_value(json!({
            "method": "completion/complete",
            "params": {
                "ref": {"type": "ref/prompt", "name": "greet"},
                "argument": {"name": "tone", "value": "fr"}
            },
            "id": 1
        }))
        .unwrap();
        assert_eq!(
            prompt.params.reference,
            CompletionReference::Prompt {
                name: "greet".into()
            }
        );

        let resource: CompleteRequest = serde_json::from_value(json!({
            "method": "completion/complete",
            "params": {
                "ref": {"type": "ref/resource", "uri": "file:///{path}"},
                "argument": {"name": "path", "value": "src"}
            },
            "id": 2
        }))
        .unwrap();
        assert!(matches!(
            resource.params.reference,
            CompletionReference::Resource { .. }
        ));
    }

    #[test]
    fn test_unknown_completion_reference_rejected() {
        let result: Result<CompleteParams, _> = serde_json::from_value(json!({
            "ref": {"type": "ref/unknown", "name": "x"},
            "argument": {"name": "a", "value": "b"}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_logging_level_order_and_names() {
        assert!(LoggingLevel::Debug < LoggingLevel::Error);
        assert_eq!(
            serde_json::to_value(LoggingLevel::Warning).unwrap(),
            json!("warning")
        );
        let level: LoggingLevel = serde_json::from_value(json!("emergency")).unwrap();
        assert_eq!(level, LoggingLevel::Emergency);
    }

    #[test]
    fn test_cancelled_notification_preserves_request_id_type() {
        let notification: CancelledNotification = serde_json::from_value(json!({
            "method": "notifications/cancelled",
            "params": {"requestId": "abc", "reason": "user aborted"}
        }))
        .unwrap();
        assert_eq!(notification.params.request_id, json!("abc"));
    }

    #[test]
    fn test_method_bindings() {
        assert_eq!(InitializeRequest::METHOD, "initialize");
        assert_eq!(PingRequest::METHOD, "ping");
        assert_eq!(ListResourcesRequest::METHOD, "resources/list");
        assert_eq!(ReadResourceRequest::METHOD, "resources/read");
        assert_eq!(
            ListResourceTemplatesRequest::METHOD,
            "resources/templates/list"
        );
        assert_eq!(SubscribeRequest::METHOD, "resources/subscribe");
        assert_eq!(UnsubscribeRequest::METHOD, "resources/unsubscribe");
        assert_eq!(ListPromptsRequest::METHOD, "prompts/list");
        assert_eq!(GetPromptRequest::METHOD, "prompts/get");
        assert_eq!(ListToolsRequest::METHOD, "tools/list");
        assert_eq!(CallToolRequest::METHOD, "tools/call");
        assert_eq!(CompleteRequest::METHOD, "completion/complete");
        assert_eq!(CreateMessageRequest::METHOD, "sampling/createMessage");
        assert_eq!(SetLevelRequest::METHOD, "logging/setLevel");
        assert_eq!(ListRootsRequest::METHOD, "roots/list");
        assert_eq!(
            InitializedNotification::METHOD,
            "notifications/initialized"
        );
        assert_eq!(ProgressNotification::METHOD, "notifications/progress");
        assert_eq!(
            ResourceUpdatedNotification::METHOD,
            "notifications/resources/updated"
        );
        assert_eq!(
            PromptListChangedNotification::METHOD,
            "notifications/prompts/list_changed"
        );
        assert_eq!(
            ToolListChangedNotification::METHOD,
            "notifications/tools/list_changed"
        );
        assert_eq!(
            RootsListChangedNotification::METHOD,
            "notifications/roots/list_changed"
        );
        assert_eq!(CancelledNotification::METHOD, "notifications/cancelled");
        assert_eq!(LoggingMessageNotification::METHOD, "notifications/message");
    }
}
