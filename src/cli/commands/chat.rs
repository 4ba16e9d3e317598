//! Interactive chat command with tool calling support.

use crate::agent::{parse_arguments, to_chat_tools, ToolCallRecord};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Instructions, Settings};
use crate::error::{FjernError, Result};
use crate::mcp::ToolServerClient;
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool, CreateChatCompletionRequestArgs,
};
use console::style;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Agent, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'fjern doctor' for detailed diagnostics.");
        return Err(e);
    }

    if let Some(model) = model {
        settings.agent.model = model;
    }

    let mut chat = ChatSession::connect(&settings).await?;

    println!("\n{}", style("Fjern Chat").bold().cyan());
    println!(
        "{}\n",
        style("Tell the TV what to do, or 'exit' to quit. Use 'clear' to reset the conversation.")
            .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        stdin.lock().read_line(&mut input)?;

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            chat.clear_history();
            Output::info("Conversation history cleared.");
            continue;
        }

        match chat.send_message(input).await {
            Ok(response) => {
                println!("\n{} {}\n", style("Fjern:").cyan().bold(), response);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}

/// Interactive chat session with tool calling support.
struct ChatSession {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    tools: ToolServerClient,
    tool_defs: Vec<ChatCompletionTool>,
    messages: Vec<ChatCompletionRequestMessage>,
    max_tool_iterations: usize,
}

impl ChatSession {
    /// Connect to the tool server and start a session.
    async fn connect(settings: &Settings) -> Result<Self> {
        let instructions =
            Instructions::load(settings.agent.custom_instructions_dir.as_deref(), None)?;

        let tools = ToolServerClient::connect(
            &settings.tool_server.url,
            Duration::from_secs(settings.tool_server.request_timeout_seconds),
        )
        .await?;
        let discovered = tools.list_tools().await?;
        info!("Chat session with {} tools", discovered.len());

        let system_message = ChatCompletionRequestSystemMessageArgs::default()
            .content(instructions.system_prompt())
            .build()
            .map_err(|e| FjernError::Agent(e.to_string()))?;

        Ok(Self {
            client: create_client(),
            model: settings.agent.model.clone(),
            tool_defs: to_chat_tools(&discovered),
            tools,
            messages: vec![system_message.into()],
            max_tool_iterations: settings.agent.max_iterations,
        })
    }

    /// Clear conversation history (keeps system prompt).
    fn clear_history(&mut self) {
        self.messages.truncate(1); // Keep system message
    }

    /// Send a message and get a response, handling tool calls.
    async fn send_message(&mut self, user_input: &str) -> Result<String> {
        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(user_input)
            .build()
            .map_err(|e| FjernError::Agent(e.to_string()))?;
        self.messages.push(user_message.into());

        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > self.max_tool_iterations {
                return Err(FjernError::Agent("Too many tool iterations".to_string()));
            }

            debug!(
                "Chat iteration {}, {} messages",
                iterations,
                self.messages.len()
            );

            let request = CreateChatCompletionRequestArgs::default()
                .model(&self.model)
                .messages(self.messages.clone())
                .tools(self.tool_defs.clone())
                .build()
                .map_err(|e| FjernError::Agent(e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| FjernError::OpenAI(format!("Chat API error: {}", e)))?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| FjernError::Agent("No response from model".to_string()))?;

            if let Some(ref tool_calls) = choice.message.tool_calls {
                if tool_calls.is_empty() {
                    let content = choice.message.content.clone().unwrap_or_default();
                    self.add_assistant_message(&content)?;
                    return Ok(content);
                }

                let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                    .tool_calls(tool_calls.clone())
                    .build()
                    .map_err(|e| FjernError::Agent(e.to_string()))?;
                self.messages.push(assistant_msg.into());

                for tool_call in tool_calls {
                    let name = &tool_call.function.name;
                    let arguments = &tool_call.function.arguments;

                    info!("Chat calling tool: {} with args: {}", name, arguments);
                    print!("{}", style(format!("  [{}] ", name)).dim());
                    io::stdout().flush().ok();

                    let record = self.execute_tool(name, arguments).await;

                    let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(&tool_call.id)
                        .content(record.result)
                        .build()
                        .map_err(|e| FjernError::Agent(e.to_string()))?;
                    self.messages.push(tool_msg.into());
                }
            } else {
                let content = choice.message.content.clone().unwrap_or_default();
                self.add_assistant_message(&content)?;

                // Trim history if too long (keep system + recent exchanges)
                trim_history(&mut self.messages, 30);

                return Ok(content);
            }
        }
    }

    /// Execute one tool call, printing a pass/fail marker.
    async fn execute_tool(&self, name: &str, arguments: &str) -> ToolCallRecord {
        let result = match parse_arguments(arguments) {
            Ok(args) => match self.tools.call_tool(name, args).await {
                Ok(output) => {
                    println!("{}", style("✓").green());
                    output
                }
                Err(e) => {
                    println!("{}", style("✗").red());
                    format!("Tool error: {}", e)
                }
            },
            Err(e) => {
                println!("{}", style("✗").red());
                format!("Failed to parse tool call: {}", e)
            }
        };

        ToolCallRecord {
            name: name.to_string(),
            arguments: arguments.to_string(),
            result,
        }
    }

    /// Add an assistant text message to history.
    fn add_assistant_message(&mut self, content: &str) -> Result<()> {
        let msg = ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| FjernError::Agent(e.to_string()))?;
        self.messages.push(msg.into());
        Ok(())
    }

}

/// Trim conversation history to keep it manageable.
///
/// Cuts on an exchange boundary (the kept window starts at a user message),
/// so an assistant tool-call message is never separated from its tool
/// results. A single oversized exchange is kept whole from its user message.
fn trim_history(messages: &mut Vec<ChatCompletionRequestMessage>, max_messages: usize) {
    if messages.len() <= max_messages {
        return;
    }

    let earliest = messages.len() - (max_messages - 1);
    let start = (earliest..messages.len())
        .find(|&i| is_user_message(&messages[i]))
        .or_else(|| (1..messages.len()).rev().find(|&i| is_user_message(&messages[i])));

    let Some(start) = start else {
        return;
    };

    // Keep the system message (index 0) and everything from `start` on.
    let mut trimmed = vec![messages[0].clone()];
    trimmed.extend(messages[start..].iter().cloned());
    *messages = trimmed;
}

fn is_user_message(message: &ChatCompletionRequestMessage) -> bool {
    matches!(message, ChatCompletionRequestMessage::User(_))
}
