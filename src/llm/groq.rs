//! Groq code-generation client.
//!
//! Implements the CodeGenerator trait against Groq's OpenAI-compatible
//! chat-completions API. Any endpoint speaking the same wire format can be
//! targeted by overriding the base URL.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{Result, TabsightError};
use crate::exec::TABLE_BINDING;
use crate::llm::parser::extract_code;
use crate::llm::prompt::build_messages;
use crate::llm::types::{GeneratedCode, Message};
use crate::llm::CodeGenerator;
use crate::table::TableStructure;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Groq chat-completions endpoint.
const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Maximum number of retry attempts for transient errors.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Low temperature for consistent code generation.
const CODEGEN_TEMPERATURE: f32 = 0.1;

/// Groq client configuration.
#[derive(Debug, Clone)]
pub struct GroqConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "llama-3.3-70b-versatile").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Endpoint URL (override for OpenAI-compatible services).
    pub base_url: String,
}

impl GroqConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: GROQ_API_URL.to_string(),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Overrides the endpoint URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Groq code-generation client.
#[derive(Debug, Clone)]
pub struct GroqClient {
    config: GroqConfig,
    client: Client,
}

impl GroqClient {
    /// Creates a new Groq client with the given configuration.
    pub fn new(config: GroqConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TabsightError::generation(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Converts internal messages to the wire format.
    fn convert_messages(messages: &[Message]) -> Vec<GroqMessage> {
        messages
            .iter()
            .map(|m| GroqMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Parses an API error response and returns (error, is_retryable).
    fn parse_error(status: reqwest::StatusCode, body: &str) -> (TabsightError, bool) {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return (
                TabsightError::generation("Authentication failed. Check your GROQ_API_KEY."),
                false,
            );
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return (
                TabsightError::generation("Rate limited. Please wait and try again."),
                true, // Rate limits are retryable
            );
        }

        // 5xx errors are generally retryable
        let is_retryable = status.is_server_error();

        // Try to parse error message from response
        if let Ok(error_response) = serde_json::from_str::<GroqErrorResponse>(body) {
            return (
                TabsightError::generation(format!("Groq API error: {}", error_response.error.message)),
                is_retryable,
            );
        }

        (
            TabsightError::generation(format!("Groq API error ({}): {}", status, body)),
            is_retryable,
        )
    }

    /// Determines if a request error is retryable.
    fn is_retryable_request_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect()
    }

    /// Sends one chat-completions request with retry on transient failures.
    async fn complete(&self, messages: &[Message]) -> Result<GroqCompletion> {
        let request = GroqRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            temperature: CODEGEN_TEMPERATURE,
        };

        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!("Groq API request attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

            let result = self
                .client
                .post(&self.config.base_url)
                .header("Authorization", format!("Bearer {}", self.config.api_key))
                .header("Content-Type", "application/json")
                .json(&request)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.map_err(|e| {
                        TabsightError::generation(format!("Failed to read response: {}", e))
                    })?;

                    if status.is_success() {
                        let response: GroqResponse = serde_json::from_str(&body).map_err(|e| {
                            TabsightError::generation(format!("Failed to parse response: {}", e))
                        })?;

                        let usage = response.usage.unwrap_or_default();
                        return response
                            .choices
                            .into_iter()
                            .next()
                            .map(|c| GroqCompletion {
                                content: c.message.content,
                                prompt_tokens: usage.prompt_tokens,
                                completion_tokens: usage.completion_tokens,
                            })
                            .ok_or_else(|| TabsightError::generation("No response from Groq"));
                    }

                    let (error, is_retryable) = Self::parse_error(status, &body);
                    last_error = Some(error);

                    if !is_retryable || attempt >= MAX_RETRY_ATTEMPTS {
                        break;
                    }

                    warn!(
                        "Groq API request failed (attempt {}), retrying in {:?}: {}",
                        attempt, delay, status
                    );
                }
                Err(e) => {
                    let is_retryable = Self::is_retryable_request_error(&e);
                    let error = if e.is_timeout() {
                        TabsightError::generation("Request timed out. Try again.")
                    } else if e.is_connect() {
                        TabsightError::generation("Failed to connect to Groq API. Check your network.")
                    } else {
                        TabsightError::generation(format!("Request failed: {}", e))
                    };
                    last_error = Some(error);

                    if !is_retryable || attempt >= MAX_RETRY_ATTEMPTS {
                        break;
                    }

                    warn!(
                        "Groq API request failed (attempt {}), retrying in {:?}",
                        attempt, delay
                    );
                }
            }

            tokio::time::sleep(delay).await;
            delay *= 2; // Exponential backoff
        }

        Err(last_error.expect("at least one attempt was made"))
    }
}

#[async_trait]
impl CodeGenerator for GroqClient {
    async fn generate(
        &self,
        instruction: &str,
        structure: &TableStructure,
    ) -> Result<GeneratedCode> {
        let messages = build_messages(instruction, structure, TABLE_BINDING);

        let start = Instant::now();
        let completion = self.complete(&messages).await?;
        let latency = start.elapsed();

        Ok(GeneratedCode {
            code: extract_code(&completion.content),
            model: self.config.model.clone(),
            latency,
            prompt_tokens: completion.prompt_tokens,
            completion_tokens: completion.completion_tokens,
        })
    }
}

/// One successful completion with its token usage.
struct GroqCompletion {
    content: String,
    prompt_tokens: u32,
    completion_tokens: u32,
}

// Groq API types (OpenAI-compatible wire format)

#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroqMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    usage: Option<GroqUsage>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqMessage,
}

#[derive(Debug, Default, Deserialize)]
struct GroqUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GroqErrorResponse {
    error: GroqError,
}

#[derive(Debug, Deserialize)]
struct GroqError {
    message: String,
}
