//! End-to-end lifecycle over stdio: a built server with a tool, a prompt,
//! and a resource, exercised line-by-line through duplex pipes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

use mcp_runtime::protocol::capability::{
    PromptsCapability, ResourcesCapability, ToolsCapability,
};
use mcp_runtime::protocol::requests::GetPromptRequest;
use mcp_runtime::protocol::results::{
    CallToolResult, Content, GetPromptResult, Prompt, PromptArgument, PromptMessage,
    ReadResourceResult, Resource, ResourceContents, Role, TextResourceContents, Tool,
    ToolInputSchema,
};
use mcp_runtime::registry::RegistryError;
use mcp_runtime::session::RequestContext;
use mcp_runtime::transport::stdio::StdioTransport;
use mcp_runtime::{ServerBuilder, ServerCapabilities, Transport};

struct GreatTool;

#[async_trait]
impl mcp_runtime::registry::Tool for GreatTool {
    fn definition(&self) -> Tool {
        Tool {
            name: "my-great-tool".to_string(),
            description: Some("The great tool".to_string()),
            input_schema: ToolInputSchema::default(),
        }
    }

    async fn call(
        &self,
        _ctx: &RequestContext,
        _arguments: Option<Map<String, Value>>,
    ) -> CallToolResult {
        CallToolResult::text("great success")
    }
}

struct SimplePrompt;

#[async_trait]
impl mcp_runtime::registry::Prompt for SimplePrompt {
    fn definition(&self) -> Prompt {
        Prompt {
            name: "simple".to_string(),
            description: None,
            arguments: Some(vec![PromptArgument {
                name: "subject".to_string(),
                description: None,
                required: Some(false),
            }]),
        }
    }

    async fn get(
        &self,
        _ctx: &RequestContext,
        request: &GetPromptRequest,
    ) -> Result<GetPromptResult, RegistryError> {
        let subject = request
            .params
            .arguments
            .as_ref()
            .and_then(|args| args.get("subject"))
            .and_then(Value::as_str)
            .unwrap_or("something");
        Ok(GetPromptResult {
            description: None,
            messages: vec![PromptMessage {
                role: Role::User,
                content: Content::Text {
                    text: format!("Tell me about {subject}."),
                },
            }],
        })
    }
}

struct HelloResource;

#[async_trait]
impl mcp_runtime::registry::ResourceReader for HelloResource {
    fn definition(&self) -> Resource {
        Resource {
            uri: "hello://world".to_string(),
            name: "hello-world".to_string(),
            description: None,
            mime_type: Some("text/plain".to_string()),
        }
    }

    async fn read(
        &self,
        _ctx: &RequestContext,
        uri: &str,
    ) -> Result<ReadResourceResult, RegistryError> {
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::Text(TextResourceContents {
                uri: uri.to_string(),
                mime_type: Some("text/plain".to_string()),
                text: "Hello, World!".to_string(),
            })],
        })
    }
}

struct TestClient {
    writer: DuplexStream,
    lines: tokio::io::Lines<BufReader<DuplexStream>>,
}

impl TestClient {
    async fn call(&mut self, frame: &str) -> Value {
        self.notify(frame).await;
        let line = tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("response within bounded time")
            .unwrap()
            .expect("a response line");
        serde_json::from_str(&line).unwrap()
    }

    async fn notify(&mut self, frame: &str) {
        self.writer.write_all(frame.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }
}

#[tokio::test]
async fn test_full_lifecycle_over_stdio() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();

    let (client_writer, server_input) = tokio::io::duplex(16 * 1024);
    let (server_output, client_reader) = tokio::io::duplex(16 * 1024);

    let transport = Arc::new(StdioTransport::with_io(server_input, server_output));
    let runner = {
        let transport = transport.clone();
        tokio::spawn(async move {
            ServerBuilder::new()
                .with_name("TestServer")
                .with_version("0.0.0")
                .with_capabilities(ServerCapabilities {
                    tools: Some(ToolsCapability { list_changed: None }),
                    prompts: Some(PromptsCapability { list_changed: None }),
                    resources: Some(ResourcesCapability {
                        subscribe: None,
                        list_changed: None,
                    }),
                    ..Default::default()
                })
                .with_tool(GreatTool)
                .with_prompt(SimplePrompt)
                .with_resource(HelloResource)
                .with_transport(transport)
                .run()
                .await
        })
    };
    let mut client = TestClient {
        writer: client_writer,
        lines: BufReader::new(client_reader).lines(),
    };

    // initialize negotiates the requested version.
    let response = client
        .call(
            r#"{"id":0,"jsonrpc":"2.0","method":"initialize","params":{"protocolVersion":"2025-03-26","capabilities":{},"clientInfo":{"name":"TestClient","version":"0.0.0"}}}"#,
        )
        .await;
    assert_eq!(response["id"], 0);
    assert_eq!(response["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(response["result"]["serverInfo"]["name"], "TestServer");
    assert_eq!(
        response["result"]["capabilities"],
        json!({"prompts": {}, "resources": {}, "tools": {}})
    );

    client
        .notify(r#"{"method":"notifications/initialized","params":{},"jsonrpc":"2.0"}"#)
        .await;

    // tools
    let response = client
        .call(r#"{"method":"tools/list","params":{},"id":1,"jsonrpc":"2.0"}"#)
        .await;
    assert_eq!(
        response["result"]["tools"],
        json!([{
            "description": "The great tool",
            "inputSchema": {"type": "object"},
            "name": "my-great-tool"
        }])
    );

    let response = client
        .call(
            r#"{"method":"tools/call","params":{"name":"my-great-tool","arguments":{}},"id":2,"jsonrpc":"2.0"}"#,
        )
        .await;
    assert_eq!(
        response["result"]["content"],
        json!([{"type": "text", "text": "great success"}])
    );

    // prompts
    let response = client
        .call(r#"{"method":"prompts/list","params":{},"id":3,"jsonrpc":"2.0"}"#)
        .await;
    assert_eq!(response["result"]["prompts"][0]["name"], "simple");

    let response = client
        .call(
            r#"{"method":"prompts/get","params":{"name":"simple","arguments":{"subject":"foxes"}},"id":4,"jsonrpc":"2.0"}"#,
        )
        .await;
    assert_eq!(
        response["result"]["messages"][0]["content"]["text"],
        "Tell me about foxes."
    );

    // resources
    let response = client
        .call(r#"{"method":"resources/list","params":{},"id":5,"jsonrpc":"2.0"}"#)
        .await;
    assert_eq!(response["result"]["resources"][0]["uri"], "hello://world");

    let response = client
        .call(
            r#"{"method":"resources/read","params":{"uri":"hello://world"},"id":6,"jsonrpc":"2.0"}"#,
        )
        .await;
    assert_eq!(
        response["result"]["contents"][0]["text"],
        "Hello, World!"
    );

    // completion for a declared prompt argument defaults to empty.
    let response = client
        .call(
            r#"{"method":"completion/complete","params":{"ref":{"type":"ref/prompt","name":"simple"},"argument":{"name":"subject","value":"f"}},"id":7,"jsonrpc":"2.0"}"#,
        )
        .await;
    assert_eq!(
        response["result"]["completion"],
        json!({"values": [], "total": 0, "hasMore": false})
    );

    // unknown tool surfaces as a server error with the id preserved.
    let response = client
        .call(
            r#"{"method":"tools/call","params":{"name":"no-such-tool","arguments":{}},"id":8,"jsonrpc":"2.0"}"#,
        )
        .await;
    assert_eq!(response["id"], 8);
    assert_eq!(response["error"]["code"], -32000);

    // Shutdown through the transport handle stops the run loop.
    tokio::time::timeout(Duration::from_secs(5), transport.shutdown())
        .await
        .expect("shutdown within bounded time")
        .unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("runner stops")
        .unwrap();
    assert!(result.is_ok());
}
