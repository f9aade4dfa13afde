use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_CONFIG_PATH: &str = "ASSESSMENT_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Environment variable overriding the judge model
const ENV_JUDGE_MODEL: &str = "JUDGE_MODEL";

/// Default judge model
pub const DEFAULT_JUDGE_MODEL: &str = rig::providers::openai::GPT_4O_MINI;

/// External judge call settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub model: String,
    /// Upper bound for a single outbound call
    pub timeout_secs: u64,
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled on every further retry
    pub initial_retry_delay_ms: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_JUDGE_MODEL.to_string(),
            timeout_secs: 60,
            max_retries: 2,
            initial_retry_delay_ms: 500,
        }
    }
}

impl JudgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub judge: JudgeConfig,
    /// Directory with `<assessment_type>.yaml` files replacing the embedded rubrics
    #[serde(default)]
    pub rubrics_dir: Option<PathBuf>,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub judge: JudgeConfig,
    pub rubrics_dir: Option<PathBuf>,
    pub port: u16,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            judge: JudgeConfig::default(),
            rubrics_dir: None,
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let config_path = std::env::var(ENV_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let file = Self::load_config_file(&config_path).unwrap_or_default();

        let mut judge = file.judge;
        if let Ok(model) = std::env::var(ENV_JUDGE_MODEL)
            && !model.trim().is_empty()
        {
            judge.model = model;
        }

        Self {
            judge,
            rubrics_dir: file.rubrics_dir,
            port,
            host,
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse_config(path, &contents),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    fn parse_config(path: &Path, contents: &str) -> Option<ConfigFile> {
        let contents = contents.trim();
        if contents.is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Some(ConfigFile::default());
        }

        match serde_yaml::from_str(contents) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded configuration from file");
                Some(config)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                None
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
