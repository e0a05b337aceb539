use std::env;
use std::str::FromStr;

use std::fmt;

use crate::constants::{CORRECT_THRESHOLD, DEFAULT_GENERATION_TIMEOUT_MS, DEFAULT_RECENT_WINDOW};

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    /// JSON topic catalog; the built-in catalog is used when unset.
    pub catalog_path: Option<String>,
    pub adaptive: AdaptiveEnvConfig,
    pub llm: LLMConfig,
}

#[derive(Debug, Clone)]
pub struct AdaptiveEnvConfig {
    pub recent_window: usize,
    pub correct_threshold: f64,
    pub generation_timeout_ms: u64,
}

#[derive(Clone)]
pub struct LLMConfig {
    pub enabled: bool,
    pub mock: bool,
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl fmt::Debug for LLMConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LLMConfig")
            .field("enabled", &self.enabled)
            .field("mock", &self.mock)
            .field("api_url", &self.api_url)
            .field("api_key", &"***REDACTED***")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/assessment.sled"),
            catalog_path: env::var("CATALOG_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            adaptive: AdaptiveEnvConfig {
                recent_window: env_or_parse("ADAPTIVE_RECENT_WINDOW", DEFAULT_RECENT_WINDOW),
                correct_threshold: env_or_parse("ADAPTIVE_CORRECT_THRESHOLD", CORRECT_THRESHOLD),
                generation_timeout_ms: env_or_parse(
                    "ADAPTIVE_GENERATION_TIMEOUT_MS",
                    DEFAULT_GENERATION_TIMEOUT_MS,
                ),
            },
            llm: LLMConfig {
                enabled: env_or_bool("LLM_ENABLED", false),
                mock: env_or_bool("LLM_MOCK", true),
                api_url: env_or("LLM_API_URL", ""),
                api_key: env_or("LLM_API_KEY", ""),
                model: env_or("LLM_MODEL", "llama3"),
                temperature: env_or_parse("LLM_TEMPERATURE", 0.7_f64),
                max_tokens: env_or_parse("LLM_MAX_TOKENS", 512_u32),
                timeout_secs: env_or_parse("LLM_TIMEOUT_SECS", 30_u64),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
