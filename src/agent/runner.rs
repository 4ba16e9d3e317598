//! Agent runner with tool calling loop.
//!
//! Unlike a fixed toolbox, the tools here are whatever the remote MCP server
//! advertises: they are discovered at connect time and handed to the model
//! verbatim.

use crate::config::{Instructions, Settings};
use crate::error::{FjernError, Result};
use crate::mcp::{Tool, ToolServerClient};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionObject,
};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Agent bound to a model, an instruction prompt and a remote tool server.
pub struct Agent {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    tools: ToolServerClient,
    tool_defs: Vec<ChatCompletionTool>,
    max_iterations: usize,
    system_prompt: String,
}

impl Agent {
    /// Connect to the configured tool server, discover its tools and build
    /// the agent.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let instructions = Instructions::load(
            settings.agent.custom_instructions_dir.as_deref(),
            None,
        )?;

        let tools = ToolServerClient::connect(
            &settings.tool_server.url,
            Duration::from_secs(settings.tool_server.request_timeout_seconds),
        )
        .await?;

        let discovered = tools.list_tools().await?;
        if discovered.is_empty() {
            return Err(FjernError::ToolServer(
                "The tool server exposes no tools".to_string(),
            ));
        }
        info!(
            "Discovered {} tools from {}",
            discovered.len(),
            tools.endpoint_url()
        );

        Ok(Self {
            client: create_client(),
            model: settings.agent.model.clone(),
            tool_defs: to_chat_tools(&discovered),
            tools,
            max_iterations: settings.agent.max_iterations,
            system_prompt: instructions.system_prompt(),
        })
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Model identifier the agent was configured with.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The instruction prompt in effect.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Names of the discovered tools.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tool_defs
            .iter()
            .map(|t| t.function.name.as_str())
            .collect()
    }

    /// The connected tool server session.
    pub fn tool_server(&self) -> &ToolServerClient {
        &self.tools
    }

    /// Run the agent with a user request.
    pub async fn run(&self, request: &str) -> Result<AgentResponse> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()
                .map_err(|e| FjernError::Agent(e.to_string()))?
                .into(),
        ];

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(request)
                .build()
                .map_err(|e| FjernError::Agent(e.to_string()))?
                .into(),
        );

        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(FjernError::Agent(format!(
                    "Agent exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Agent iteration {}", iterations);

            let request = CreateChatCompletionRequestArgs::default()
                .model(&self.model)
                .messages(messages.clone())
                .tools(self.tool_defs.clone())
                .build()
                .map_err(|e| FjernError::Agent(e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| FjernError::OpenAI(format!("Agent API error: {}", e)))?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| FjernError::Agent("No response from model".to_string()))?;

            if let Some(ref tool_calls) = choice.message.tool_calls {
                if tool_calls.is_empty() {
                    return build_response(&choice.message.content, tool_calls_made, iterations);
                }

                let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                    .tool_calls(tool_calls.clone())
                    .build()
                    .map_err(|e| FjernError::Agent(e.to_string()))?;
                messages.push(assistant_msg.into());

                for tool_call in tool_calls {
                    let record = self.execute_tool_call(tool_call).await;

                    let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(&tool_call.id)
                        .content(record.result.clone())
                        .build()
                        .map_err(|e| FjernError::Agent(e.to_string()))?;
                    messages.push(tool_msg.into());

                    tool_calls_made.push(record);
                }
            } else {
                return build_response(&choice.message.content, tool_calls_made, iterations);
            }
        }
    }

    /// Execute a single tool call against the tool server.
    async fn execute_tool_call(&self, tool_call: &ChatCompletionMessageToolCall) -> ToolCallRecord {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Agent calling tool: {} with args: {}", name, arguments);

        let result = match parse_arguments(arguments) {
            Ok(args) => match self.tools.call_tool(name, args).await {
                Ok(output) => output,
                Err(e) => format!("Tool error: {}", e),
            },
            Err(e) => format!("Failed to parse tool arguments: {}", e),
        };

        ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
        }
    }
}

/// Parse the model's argument string; an empty string means no arguments.
pub fn parse_arguments(arguments: &str) -> Result<Value> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(arguments)
        .map_err(|e| FjernError::Agent(format!("Invalid tool arguments: {}", e)))
}

/// Convert discovered MCP tool descriptors into chat-completion tools.
pub fn to_chat_tools(tools: &[Tool]) -> Vec<ChatCompletionTool> {
    tools
        .iter()
        .map(|tool| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.input_schema.clone()),
                strict: None,
            },
        })
        .collect()
}

fn build_response(
    content: &Option<String>,
    tool_calls: Vec<ToolCallRecord>,
    iterations: usize,
) -> Result<AgentResponse> {
    Ok(AgentResponse {
        content: content.clone().unwrap_or_default(),
        tool_calls,
        iterations,
    })
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "setPowerStatus".to_string(),
            arguments: r#"{"status": "on"}"#.to_string(),
            result: "Turned the TV on.".to_string(),
        };
        assert_eq!(format!("{}", record), r#"setPowerStatus({"status": "on"})"#);
    }

    #[test]
    fn test_to_chat_tools_keeps_schema_verbatim() {
        let discovered = vec![Tool {
            name: "setPlayContent".to_string(),
            description: "Play the content behind a URI.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": { "uri": { "type": "string" } },
                "required": ["uri"]
            }),
        }];

        let chat_tools = to_chat_tools(&discovered);
        assert_eq!(chat_tools.len(), 1);
        assert_eq!(chat_tools[0].function.name, "setPlayContent");
        assert_eq!(
            chat_tools[0].function.parameters.as_ref().unwrap()["required"][0],
            "uri"
        );
    }

    #[test]
    fn test_parse_arguments_empty_is_object() {
        assert_eq!(parse_arguments("").unwrap(), json!({}));
        assert_eq!(
            parse_arguments(r#"{"status":"off"}"#).unwrap()["status"],
            "off"
        );
        assert!(parse_arguments("{oops").is_err());
    }
}
