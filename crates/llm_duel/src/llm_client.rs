//! LLM API client for Groq, OpenAI and Anthropic.
//!
//! Groq and OpenAI both speak the chat-completions API and go through
//! `async-openai` with a per-provider base URL; Anthropic uses its messages
//! API over `reqwest`. Every call carries its own timeout.

use async_openai::{
    Client as OpenAIClient,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// LLM provider selection.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LlmProvider {
    /// Groq (OpenAI-compatible endpoint).
    Groq,
    /// OpenAI (GPT models).
    OpenAI,
    /// Anthropic (Claude models).
    Anthropic,
}

impl LlmProvider {
    /// Environment variable holding this provider's API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            LlmProvider::Groq => "GROQ_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Base URL of this provider's API.
    pub fn api_base(self) -> &'static str {
        match self {
            LlmProvider::Groq => "https://api.groq.com/openai/v1",
            LlmProvider::OpenAI => "https://api.openai.com/v1",
            LlmProvider::Anthropic => "https://api.anthropic.com/v1",
        }
    }
}

/// Configuration for LLM client.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    provider: LlmProvider,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl LlmConfig {
    /// Creates a new LLM configuration.
    #[instrument(skip(api_key), fields(provider = ?provider, model = %model))]
    pub fn new(provider: LlmProvider, api_key: String, model: String, max_tokens: u32) -> Self {
        debug!("Creating LLM config");
        Self {
            provider,
            api_key,
            model,
            max_tokens,
        }
    }

    /// Gets the model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// LLM client that abstracts over the supported providers.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl LlmClient {
    /// Creates a new LLM client.
    #[instrument(skip(config), fields(provider = ?config.provider, model = %config.model))]
    pub fn new(config: LlmConfig) -> Self {
        info!("Creating LLM client");
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Returns the client's configuration.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Generates a completion from a system prompt and user message.
    #[instrument(skip(self, system_prompt, user_message), fields(provider = ?self.config.provider, model = %self.config.model))]
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        debug!("Generating completion");
        match self.config.provider {
            LlmProvider::Groq | LlmProvider::OpenAI => {
                self.generate_chat(system_prompt, user_message, timeout).await
            }
            LlmProvider::Anthropic => {
                self.generate_anthropic(system_prompt, user_message, timeout)
                    .await
            }
        }
    }

    /// Generates a completion through an OpenAI-compatible chat endpoint.
    #[instrument(skip(self, system_prompt, user_message))]
    async fn generate_chat(
        &self,
        system_prompt: &str,
        user_message: &str,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        debug!(api_base = self.config.provider.api_base(), "Creating chat client");
        let client = OpenAIClient::with_config(
            OpenAIConfig::new()
                .with_api_key(self.config.api_key.clone())
                .with_api_base(self.config.provider.api_base()),
        );

        let request = chat_request(&self.config, system_prompt, user_message)?;

        debug!("Sending chat request");
        let response = tokio::time::timeout(timeout, client.chat().create(request))
            .await
            .map_err(|_| {
                error!(timeout = ?timeout, "Chat request timed out");
                LlmError::timed_out(format!("Chat request timed out after {:?}", timeout))
            })?
            .map_err(|e| {
                error!(error = ?e, "Chat API error");
                LlmError::new(format!("Chat API error: {}", e))
            })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                error!("No content in chat response");
                LlmError::new("No content in chat response".to_string())
            })?;

        info!(content_length = content.len(), "Generated completion");
        Ok(content)
    }

    /// Generates a completion using Anthropic Claude.
    #[instrument(skip(self, system_prompt, user_message))]
    async fn generate_anthropic(
        &self,
        system_prompt: &str,
        user_message: &str,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let body = anthropic_request_body(&self.config, system_prompt, user_message);

        debug!("Sending request to Anthropic");
        let request = self
            .http
            .post(format!("{}/messages", self.config.provider.api_base()))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .timeout(timeout)
            .json(&body);

        let response_json = send(request).await?;
        let content = extract_anthropic_content(&response_json).ok_or_else(|| {
            error!(response = %response_json, "No text content in Anthropic response");
            LlmError::new("No text content in Anthropic response".to_string())
        })?;

        info!(content_length = content.len(), "Generated completion");
        Ok(content)
    }
}

/// Sends a request and decodes a successful JSON body.
async fn send(request: reqwest::RequestBuilder) -> Result<serde_json::Value, LlmError> {
    let response = request.send().await.map_err(|e| {
        error!(error = ?e, "LLM API request failed");
        if e.is_timeout() {
            LlmError::timed_out(format!("LLM API request timed out: {}", e))
        } else {
            LlmError::new(format!("LLM API request failed: {}", e))
        }
    })?;

    let status = response.status();
    let response_text = response.text().await.map_err(|e| {
        error!(error = ?e, "Failed to read LLM response");
        if e.is_timeout() {
            LlmError::timed_out(format!("Timed out reading response: {}", e))
        } else {
            LlmError::new(format!("Failed to read response: {}", e))
        }
    })?;

    if !status.is_success() {
        error!(status = %status, response = %response_text, "LLM API error");
        return Err(LlmError::new(format!(
            "LLM API error {}: {}",
            status, response_text
        )));
    }

    debug!(response_length = response_text.len(), "Parsing LLM response");
    serde_json::from_str(&response_text).map_err(|e| {
        error!(error = ?e, response = %response_text, "Failed to parse LLM response");
        LlmError::new(format!("Failed to parse response: {}", e))
    })
}

/// Builds a chat-completions request with a system and a user message.
fn chat_request(
    config: &LlmConfig,
    system_prompt: &str,
    user_message: &str,
) -> Result<CreateChatCompletionRequest, LlmError> {
    let messages = vec![
        ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| {
                    error!(error = ?e, "Failed to build system message");
                    LlmError::new(format!("Failed to build system message: {}", e))
                })?,
        ),
        ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
                .map_err(|e| {
                    error!(error = ?e, "Failed to build user message");
                    LlmError::new(format!("Failed to build user message: {}", e))
                })?,
        ),
    ];

    CreateChatCompletionRequestArgs::default()
        .model(&config.model)
        .messages(messages)
        .max_tokens(config.max_tokens)
        .build()
        .map_err(|e| {
            error!(error = ?e, "Failed to build request");
            LlmError::new(format!("Failed to build request: {}", e))
        })
}

fn anthropic_request_body(
    config: &LlmConfig,
    system_prompt: &str,
    user_message: &str,
) -> serde_json::Value {
    serde_json::json!({
        "model": config.model,
        "max_tokens": config.max_tokens,
        "system": system_prompt,
        "messages": [
            { "role": "user", "content": user_message }
        ]
    })
}

/// Pulls `content[0].text` out of an Anthropic messages body.
fn extract_anthropic_content(response: &serde_json::Value) -> Option<String> {
    response["content"][0]["text"].as_str().map(str::to_string)
}

/// LLM client error.
#[derive(Debug, Clone, Display, Error)]
#[display("LLM error: {} at {}:{}", message, file, line)]
pub struct LlmError {
    /// Error message.
    pub message: String,
    /// Whether the request ran past its timeout.
    pub timed_out: bool,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl LlmError {
    /// Creates a new LLM error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        error!(error_message = %message, "LLM error created");
        Self {
            message,
            timed_out: false,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Creates an error for a request that exceeded its timeout.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn timed_out(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            timed_out: true,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
