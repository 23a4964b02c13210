use crate::llm::client::{CompletionRequest, LLMClient, LLMResponse, TokenUsage};
use crate::types::{AppError, ConversationMessage, MessageRole, Result, ToolCall};
use crate::utils::config::LlmConfig;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAIClient {
    http_client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: Option<f32>,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, model: String) -> Result<Self> {
        Self::with_timeout(api_key, api_base, model, Duration::from_secs(180))
    }

    pub fn with_timeout(
        api_key: String,
        api_base: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            temperature: None,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let mut client = Self::with_timeout(
            config.api_key(),
            config.base_url.clone(),
            config.model.clone(),
            config.timeout(),
        )?;
        client.temperature = config.temperature;
        Ok(client)
    }

    fn build_body(&self, request: &CompletionRequest<'_>) -> Value {
        let messages: Vec<Value> = request.messages.iter().map(message_to_json).collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });

        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters
                        }
                    })
                })
                .collect();
            body["tools"] = json!(tools);
            body["tool_choice"] = json!("auto");
        }

        if request.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        body
    }
}

fn message_to_json(msg: &ConversationMessage) -> Value {
    match msg.role {
        MessageRole::Assistant if !msg.tool_calls.is_empty() => {
            let tool_calls: Vec<Value> = msg
                .tool_calls
                .iter()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.arguments
                        }
                    })
                })
                .collect();
            json!({
                "role": "assistant",
                "content": msg.content,
                "tool_calls": tool_calls
            })
        }
        MessageRole::Tool => json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id,
            "name": msg.name,
            "content": msg.content
        }),
        role => json!({
            "role": role.as_str(),
            "content": msg.content
        }),
    }
}

/// Parse an OpenAI chat-completions response body.
fn parse_response(json: &Value) -> Result<LLMResponse> {
    let choice = json
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| AppError::LLM("No choices in response".to_string()))?;

    let message = choice
        .get("message")
        .ok_or_else(|| AppError::LLM("No message in response".to_string()))?;

    let content = message
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let mut tool_calls = Vec::new();
    if let Some(tc_array) = message.get("tool_calls").and_then(|v| v.as_array()) {
        for tc in tc_array {
            let Some(func) = tc.get("function") else {
                continue;
            };
            let name = func
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            // Some compatible servers send arguments as an object instead of a string.
            let arguments = match func.get("arguments") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            let id = tc
                .get("id")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            tool_calls.push(ToolCall {
                id,
                name,
                arguments,
            });
        }
    }

    let finish_reason = choice
        .get("finish_reason")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| {
            if tool_calls.is_empty() {
                "stop".to_string()
            } else {
                "tool_calls".to_string()
            }
        });

    let usage = json.get("usage").map(|u| {
        let field = |name: &str| u.get(name).and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        TokenUsage::new(field("prompt_tokens"), field("completion_tokens"))
    });

    Ok(LLMResponse {
        content,
        tool_calls,
        finish_reason,
        usage,
    })
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<LLMResponse> {
        let body = self.build_body(&request);
        let url = format!("{}/chat/completions", self.api_base);

        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            json_mode = request.json_mode,
            "Sending chat completion request"
        );

        let mut http_request = self.http_client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            http_request = http_request.bearer_auth(&self.api_key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLM(format!(
                "Chat completion failed ({}): {}",
                status, text
            )));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| AppError::LLM(format!("Failed to parse response: {}", e)))?;

        parse_response(&response_json)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
