//! Configuration module for scriptdoc.
//!
//! Handles the TOML settings file, environment variables, and the upstream credential.

mod settings;

pub use settings::{
    expand_env_vars, LlmSettings, ServerSettings, Settings, SettingsError, DEFAULT_API_KEY_ENV,
    DEFAULT_ENDPOINT, DEFAULT_MODEL,
};
