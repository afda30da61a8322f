//! TOML-based configuration for scriptdoc.
//!
//! Supports a config file (scriptdoc.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [llm]
//! endpoint = "https://api.openai.com/v1"
//! model = "o3-2025-04-16"
//! api_key_env = "OPENAI_API_KEY"
//! timeout_seconds = 600
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8501
//! open_browser = false
//! max_upload_bytes = 10485760
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Model the documentation prompt was written against.
pub const DEFAULT_MODEL: &str = "o3-2025-04-16";

/// Default OpenAI-compatible API base.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Environment variable holding the upstream credential.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("{0} environment variable not found.")]
    MissingApiKey(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Completion service configuration.
    pub llm: LlmSettings,

    /// Web server configuration.
    pub server: ServerSettings,
}

/// Completion service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmSettings {
    /// API base URL (supports ${ENV_VAR} expansion). `/chat/completions` is appended.
    pub endpoint: String,

    /// Model identifier sent with every request.
    pub model: String,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,

    /// Whole-request timeout. Reasoning models can take minutes on large files.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_seconds: 600,
        }
    }
}

impl LlmSettings {
    /// Get the endpoint with environment variables expanded and any trailing slash removed.
    pub fn resolved_endpoint(&self) -> Result<String, SettingsError> {
        let endpoint = expand_env_vars(&self.endpoint)?;
        Ok(endpoint.trim_end_matches('/').to_string())
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Web server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Open the UI in a browser after binding.
    pub open_browser: bool,

    /// Largest accepted upload body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            open_browser: false,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SCRIPTDOC_CONFIG`
    /// 2. `./scriptdoc.toml`
    /// 3. `~/.config/scriptdoc/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SCRIPTDOC_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("scriptdoc.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("scriptdoc").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.llm.model.trim().is_empty() {
            return Err(SettingsError::InvalidConfig("llm.model is empty".to_string()));
        }
        if self.llm.api_key_env.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "llm.api_key_env is empty".to_string(),
            ));
        }
        if self.llm.timeout_seconds == 0 {
            return Err(SettingsError::InvalidConfig(
                "llm.timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Read the upstream credential from the process environment.
    ///
    /// An unset or blank variable is an error; the binary refuses to start without it.
    pub fn api_key(&self) -> Result<String, SettingsError> {
        match env::var(&self.llm.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(SettingsError::MissingApiKey(self.llm.api_key_env.clone())),
        }
    }

    /// Socket address string for the web server.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        if chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
            let value =
                env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
            result.push_str(&value);
        } else {
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
            } else {
                let value = env::var(&var_name)
                    .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            }
        }
    }

    Ok(result)
}
