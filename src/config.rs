//! Configuration management for Tabsight.
//!
//! Handles loading configuration from a TOML file. The config is loaded
//! once at process start and passed explicitly to the components that need
//! it; the Groq API key stays out of the file and comes from the
//! environment (`GROQ_API_KEY`, with `.env` honored at startup).

use crate::error::{Result, TabsightError};
use crate::exec::ExecutorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for Tabsight.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Code-generation provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Script-execution limits.
    #[serde(default)]
    pub executor: ExecutorSettings,

    /// Output locations.
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Code-generation provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "groq" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name, or one of the aliases "small" / "large".
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "groq".to_string()
}

fn default_model() -> String {
    "large".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Resolves the model alias to a concrete model id.
    ///
    /// "small" and "large" map to the Groq models used by default; anything
    /// else is taken verbatim.
    pub fn resolve_model(&self) -> String {
        match self.model.as_str() {
            "small" => "llama-3.1-8b-instant".to_string(),
            "large" => "llama-3.3-70b-versatile".to_string(),
            other => other.to_string(),
        }
    }
}

/// Script-execution limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSettings {
    /// Wall-clock budget per script, in seconds.
    #[serde(default = "default_time_budget_secs")]
    pub time_budget_secs: u64,

    /// Cap on engine operations per script (0 = unlimited).
    #[serde(default = "default_max_operations")]
    pub max_operations: u64,
}

fn default_time_budget_secs() -> u64 {
    5
}

fn default_max_operations() -> u64 {
    5_000_000
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            time_budget_secs: default_time_budget_secs(),
            max_operations: default_max_operations(),
        }
    }
}

impl ExecutorSettings {
    /// Builds the executor configuration from these settings.
    pub fn to_executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            time_budget: Duration::from_secs(self.time_budget_secs),
            max_operations: self.max_operations,
            ..ExecutorConfig::default()
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory converted Parquet files are written to.
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            processed_dir: default_processed_dir(),
        }
    }
}

impl PathsConfig {
    /// Derives the Parquet output path for a source spreadsheet.
    ///
    /// Uses the source file stem under the processed directory.
    pub fn processed_path_for(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "table".to_string());
        self.processed_dir.join(format!("{stem}.parquet"))
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tabsight")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| TabsightError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            TabsightError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
[llm]
provider = "groq"
model = "small"
timeout_secs = 60

[executor]
time_budget_secs = 10
max_operations = 1000000

[paths]
processed_dir = "out/processed"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.llm.model, "small");
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.executor.time_budget_secs, 10);
        assert_eq!(config.executor.max_operations, 1_000_000);
        assert_eq!(config.paths.processed_dir, PathBuf::from("out/processed"));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.llm.model, "large");
        assert_eq!(config.executor.time_budget_secs, 5);
        assert_eq!(config.paths.processed_dir, PathBuf::from("data/processed"));
    }

    #[test]
    fn test_model_alias_resolution() {
        let mut llm = LlmConfig::default();
        assert_eq!(llm.resolve_model(), "llama-3.3-70b-versatile");

        llm.model = "small".to_string();
        assert_eq!(llm.resolve_model(), "llama-3.1-8b-instant");

        llm.model = "mixtral-8x7b-32768".to_string();
        assert_eq!(llm.resolve_model(), "mixtral-8x7b-32768");
    }

    #[test]
    fn test_executor_settings_to_config() {
        let settings = ExecutorSettings {
            time_budget_secs: 2,
            max_operations: 100,
        };
        let config = settings.to_executor_config();

        assert_eq!(config.time_budget, Duration::from_secs(2));
        assert_eq!(config.max_operations, 100);
        assert_eq!(config.binding_name, "table");
    }

    #[test]
    fn test_processed_path_for() {
        let paths = PathsConfig::default();
        assert_eq!(
            paths.processed_path_for(Path::new("data/raw/payroll.xlsx")),
            PathBuf::from("data/processed/payroll.parquet")
        );
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let config = Config::load_from_file(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.llm.provider, "groq");
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "llm = \"not a table\"").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert_eq!(err.category(), "Configuration Error");
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = Config::default_path();
        assert!(path.ends_with("tabsight/config.toml"));
    }
}
