//! Defines the configuration settings for the resume-contacts application.

use crate::error::{AppError, Result};
use anyhow::Context;
use clap::Args;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_MAX_INPUT_CHARS: usize = 8000;

/// Settings flags shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct SettingsArgs {
    /// Path to configuration file (TOML format)
    #[arg(long = "config", global = true, env = "RESUME_CONTACTS_CONFIG")]
    pub config_file: Option<String>,

    /// API key for the language model provider; AI extraction is skipped without one
    #[arg(
        long,
        global = true,
        env = "RESUME_CONTACTS_API_KEY",
        hide_env_values = true
    )]
    pub api_key: Option<String>,

    /// Endpoint of the messages API
    #[arg(long, global = true, env = "RESUME_CONTACTS_API_URL")]
    pub api_url: Option<String>,

    /// Model name sent with each extraction request
    #[arg(long, global = true, env = "RESUME_CONTACTS_MODEL")]
    pub model: Option<String>,

    /// Model request timeout in seconds
    #[arg(long, global = true, env = "RESUME_CONTACTS_AI_TIMEOUT")]
    pub ai_timeout: Option<u64>,

    /// Maximum number of document characters sent to the model
    #[arg(long, global = true, env = "RESUME_CONTACTS_MAX_INPUT_CHARS")]
    pub max_input_chars: Option<usize>,

    /// Maximum number of documents processed concurrently
    #[arg(short, long, global = true, env = "RESUME_CONTACTS_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Disable the language model stage even when a key is configured
    #[arg(long, global = true, default_value = "false", env = "RESUME_CONTACTS_NO_AI")]
    pub no_ai: bool,
}

/// TOML Configuration file structure
#[derive(Deserialize, Debug, Default)]
struct ConfigFile {
    ai: Option<AiConfig>,
    processing: Option<ProcessingConfig>,
    server: Option<ServerConfig>,
}

#[derive(Deserialize, Debug, Default)]
struct AiConfig {
    enabled: Option<bool>,
    api_key: Option<String>,
    api_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    request_timeout: Option<u64>,
    max_input_chars: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
struct ProcessingConfig {
    max_concurrency: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
struct ServerConfig {
    port: Option<u16>,
}

/// Application configuration settings.
#[derive(Clone)]
pub(crate) struct Config {
    /// Whether the language model stage may run at all.
    pub ai_enabled: bool,
    /// Provider credential. Its absence silently disables the AI stage.
    pub api_key: Option<String>,
    /// Messages endpoint.
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Upper bound on a single model call; there are no retries.
    pub request_timeout: Duration,
    /// Documents are cut to this many characters before being sent.
    pub max_input_chars: usize,
    /// Maximum number of documents processed at once in batch and server mode.
    pub max_concurrency: usize,
    /// Port for the HTTP server.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ai_enabled: true,
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: Duration::from_secs(60),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            max_concurrency: 5,
            port: 8080,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("ai_enabled", &self.ai_enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .field("max_input_chars", &self.max_input_chars)
            .field("max_concurrency", &self.max_concurrency)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// True when the language model stage should be called.
    pub(crate) fn ai_active(&self) -> bool {
        self.ai_enabled
            && self
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty())
    }
}

/// Load configuration from a TOML file
fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() {
        tracing::warn!("Configuration file {} not found, using defaults", file_path);
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::info!("Loaded configuration from {}", file_path);
    Ok(config)
}

fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    if let Some(ai) = &file_config.ai {
        if let Some(enabled) = ai.enabled {
            config.ai_enabled = enabled;
        }
        if let Some(key) = &ai.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(url) = &ai.api_url {
            config.api_url = url.clone();
        }
        if let Some(model) = &ai.model {
            config.model = model.clone();
        }
        if let Some(max_tokens) = ai.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(timeout) = ai.request_timeout {
            config.request_timeout = Duration::from_secs(timeout);
        }
        if let Some(max_chars) = ai.max_input_chars {
            config.max_input_chars = max_chars;
        }
    }

    if let Some(processing) = &file_config.processing {
        if let Some(concurrency) = processing.max_concurrency {
            config.max_concurrency = concurrency;
        }
    }

    if let Some(server) = &file_config.server {
        if let Some(port) = server.port {
            config.port = port;
        }
    }
}

/// Apply command line arguments to the Config instance
fn apply_cli_args(config: &mut Config, args: &SettingsArgs) {
    if let Some(ref key) = args.api_key {
        config.api_key = Some(key.clone());
    }

    if let Some(ref url) = args.api_url {
        config.api_url = url.clone();
    }

    if let Some(ref model) = args.model {
        config.model = model.clone();
    }

    if let Some(timeout) = args.ai_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }

    if let Some(max_chars) = args.max_input_chars {
        config.max_input_chars = max_chars;
    }

    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }

    if args.no_ai {
        config.ai_enabled = false;
    }
}

fn validate_config(config: &mut Config) -> Result<()> {
    let url = Url::parse(&config.api_url)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Config(format!(
            "Model API URL must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.max_input_chars == 0 {
        config.max_input_chars = DEFAULT_MAX_INPUT_CHARS;
        tracing::warn!(
            "Max input chars was set to 0. Setting to {}.",
            DEFAULT_MAX_INPUT_CHARS
        );
    }

    if config.max_tokens == 0 {
        config.max_tokens = DEFAULT_MAX_TOKENS;
        tracing::warn!("Max tokens was set to 0. Setting to {}.", DEFAULT_MAX_TOKENS);
    }

    if config.request_timeout.is_zero() {
        config.request_timeout = Duration::from_secs(60);
        tracing::warn!("Model request timeout was set to 0. Setting to 60s.");
    }

    if config.max_concurrency == 0 {
        config.max_concurrency = 1;
        tracing::warn!("Concurrency was set to 0. Setting to 1.");
    }

    if config.ai_enabled && !config.ai_active() {
        tracing::info!("No model API key configured; AI extraction will be skipped.");
    }

    Ok(())
}

/// Builds the configuration: defaults, then the TOML file, then CLI/env flags.
pub(crate) fn build_config(args: &SettingsArgs) -> anyhow::Result<Config> {
    let mut config = Config::default();

    if let Some(ref file_path) = args.config_file {
        match load_config_file(file_path) {
            Ok(file_config) => apply_file_config(&mut config, &file_config),
            Err(e) => {
                tracing::error!("Failed to load configuration file: {}", e);
            }
        }
    } else {
        for path in ["./resume-contacts.toml", "./config.toml"].iter() {
            if Path::new(path).exists() {
                match load_config_file(path) {
                    Ok(file_config) => {
                        apply_file_config(&mut config, &file_config);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load configuration from {}: {}", path, e);
                    }
                }
            }
        }
    }

    apply_cli_args(&mut config, args);

    validate_config(&mut config).context("Invalid configuration")?;

    tracing::debug!("Final configuration: {:?}", config);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_disable_ai_without_key() {
        let config = Config::default();
        assert!(config.ai_enabled);
        assert!(!config.ai_active());
        assert_eq!(config.max_input_chars, 8000);
    }

    #[test]
    fn test_file_config_applied() {
        let file: ConfigFile = toml::from_str(
            r#"
            [ai]
            api_key = "sk-test"
            model = "custom-model"
            request_timeout = 15
            max_input_chars = 4000

            [processing]
            max_concurrency = 9

            [server]
            port = 9090
            "#,
        )
        .unwrap();
        let mut config = Config::default();
        apply_file_config(&mut config, &file);
        assert!(config.ai_active());
        assert_eq!(config.model, "custom-model");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.max_input_chars, 4000);
        assert_eq!(config.max_concurrency, 9);
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = Config::default();
        config.api_key = Some("from-file".to_string());
        let args = SettingsArgs {
            api_key: Some("from-cli".to_string()),
            concurrency: Some(2),
            no_ai: true,
            ..SettingsArgs::default()
        };
        apply_cli_args(&mut config, &args);
        assert_eq!(config.api_key.as_deref(), Some("from-cli"));
        assert_eq!(config.max_concurrency, 2);
        assert!(!config.ai_active());
    }

    #[test]
    fn test_blank_key_is_absent() {
        let config = Config {
            api_key: Some("   ".to_string()),
            ..Config::default()
        };
        assert!(!config.ai_active());
    }

    #[test]
    fn test_validate_clamps_zeroes() {
        let mut config = Config {
            max_input_chars: 0,
            max_concurrency: 0,
            max_tokens: 0,
            request_timeout: Duration::ZERO,
            ..Config::default()
        };
        validate_config(&mut config).unwrap();
        assert_eq!(config.max_input_chars, 8000);
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config {
            api_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            validate_config(&mut config),
            Err(AppError::UrlParse(_))
        ));

        let mut config = Config {
            api_url: "ftp://example.com/v1".to_string(),
            ..Config::default()
        };
        assert!(matches!(validate_config(&mut config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config {
            api_key: Some("sk-secret".to_string()),
            ..Config::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
