//! Application configuration loaded once at startup.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use cuotiben_core::batch::BatchPolicy;
use cuotiben_core::composer::DEFAULT_UTC_OFFSET_MINUTES;

/// AI provider behind the analysis gateway.
///
/// All three expose an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    DeepSeek,
    Qwen,
}

impl Provider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(Self::Gemini),
            "deepseek" => Some(Self::DeepSeek),
            "qwen" | "dashscope" => Some(Self::Qwen),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::DeepSeek => "deepseek",
            Self::Qwen => "qwen",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::Qwen => "https://dashscope.aliyuncs.com/compatible-mode/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::DeepSeek => "deepseek-chat",
            Self::Qwen => "qwen-plus",
        }
    }

    /// Model used for image input, if the provider has one.
    pub fn vision_model(&self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("gemini-2.0-flash"),
            Self::DeepSeek => None,
            Self::Qwen => Some("qwen-vl-plus"),
        }
    }

    /// Provider-specific variable consulted when `AI_API_KEY` is unset.
    pub fn key_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
            Self::Qwen => "DASHSCOPE_API_KEY",
        }
    }
}

/// Settings for the AI analysis gateway.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: Provider,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub ai: AiConfig,
    pub batch: BatchPolicy,
    pub exam_utc_offset_minutes: i32,
}

impl Config {
    /// Load from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let provider = match var("AI_PROVIDER") {
            Some(name) => match Provider::parse(&name) {
                Some(p) => p,
                None => bail!("AI_PROVIDER '{name}' is not one of gemini, deepseek, qwen"),
            },
            None => Provider::DeepSeek,
        };

        let api_key = var("AI_API_KEY")
            .or_else(|| var(provider.key_var()))
            .unwrap_or_default();

        let ai = AiConfig {
            provider,
            api_key,
            base_url: var("AI_BASE_URL")
                .unwrap_or_else(|| provider.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
            model: var("AI_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            timeout: Duration::from_secs(parse_or(&var, "AI_TIMEOUT_SECS", 60)?),
        };

        let defaults = BatchPolicy::default();
        let batch = BatchPolicy {
            chunk_size: parse_or(&var, "BATCH_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_delay: Duration::from_millis(parse_or(
                &var,
                "BATCH_CHUNK_DELAY_MS",
                defaults.chunk_delay.as_millis() as u64,
            )?),
        };

        Ok(Self {
            database_url,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "PORT", 3000)?,
            ai,
            batch,
            exam_utc_offset_minutes: parse_or(
                &var,
                "EXAM_UTC_OFFSET_MINUTES",
                DEFAULT_UTC_OFFSET_MINUTES,
            )?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{v}'")),
        None => Ok(default),
    }
}
