//! LLM integration for Tabsight.
//!
//! Provides the code-generation boundary: a trait for turning a
//! natural-language instruction plus a table structure into an executable
//! analysis script, with clients for the hosted Groq API and a
//! deterministic mock for tests and offline use.

pub mod groq;
pub mod mock;
pub mod parser;
pub mod prompt;
pub mod types;

pub use groq::{GroqClient, GroqConfig};
pub use mock::MockCodeGenerator;
pub use parser::extract_code;
pub use prompt::{build_messages, build_system_prompt};
pub use types::{GeneratedCode, Message, Role};

use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{Result, TabsightError};
use crate::table::TableStructure;

/// Trait for clients that can generate analysis code.
///
/// Implementations must be thread-safe (Send + Sync) to support async
/// operations.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Generates an analysis script for the given instruction.
    ///
    /// Returns the script together with latency and token-usage metadata.
    async fn generate(
        &self,
        instruction: &str,
        structure: &TableStructure,
    ) -> Result<GeneratedCode>;
}

/// Code-generation provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Hosted Groq API (OpenAI-compatible chat completions).
    #[default]
    Groq,
    /// Mock generator for testing (no API key required).
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Creates a code generator from the LLM configuration.
///
/// This is the central factory for generation clients. The Groq provider
/// reads its API key from the `GROQ_API_KEY` environment variable (a `.env`
/// file is honored by the binary at startup).
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn CodeGenerator>> {
    let provider = config
        .provider
        .parse::<LlmProvider>()
        .map_err(TabsightError::config)?;

    match provider {
        LlmProvider::Groq => {
            let api_key = std::env::var("GROQ_API_KEY")
                .map_err(|_| TabsightError::config("GROQ_API_KEY environment variable not set"))?;
            let groq_config = GroqConfig::new(api_key, config.resolve_model())
                .with_timeout(config.timeout_secs);
            Ok(Arc::new(GroqClient::new(groq_config)?))
        }
        LlmProvider::Mock => Ok(Arc::new(MockCodeGenerator::new())),
    }
}
