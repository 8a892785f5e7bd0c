//! Configuration (explicit values > environment > `.env` file).
//!
//! A [`BotConfig`] is built once at startup and handed by reference to the
//! backend constructors. Core graph code never reads the environment.

use std::collections::HashMap;
use std::fmt;

use crate::error::{BotError, Result};
use crate::types::GenerationSettings;

/// Model used when `GRAPHBOT_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "groq:gemma2-9b-it";
/// Hop ceiling used when `GRAPHBOT_MAX_HOPS` is not set.
pub const DEFAULT_MAX_HOPS: usize = 25;
/// Search results requested per query when not configured.
pub const DEFAULT_SEARCH_MAX_RESULTS: u32 = 2;

const API_KEY_ENV: [(&str, &str); 3] = [
    ("GROQ_API_KEY", "groq"),
    ("OPENAI_API_KEY", "openai"),
    ("TAVILY_API_KEY", "tavily"),
];

const BASE_URL_ENV: [(&str, &str); 3] = [
    ("GROQ_BASE_URL", "groq"),
    ("OPENAI_BASE_URL", "openai"),
    ("TAVILY_BASE_URL", "tavily"),
];

/// Process-wide settings for building a [`crate::bot::ChatBot`].
#[derive(Clone)]
pub struct BotConfig {
    api_keys: HashMap<String, String>,
    base_urls: HashMap<String, String>,
    /// Model in `provider:model` form.
    pub model: String,
    pub max_hops: usize,
    pub search_max_results: u32,
    pub settings: GenerationSettings,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked: HashMap<&str, String> = self
            .api_keys
            .iter()
            .map(|(provider, key)| (provider.as_str(), mask_secret(key)))
            .collect();
        f.debug_struct("BotConfig")
            .field("api_keys", &masked)
            .field("base_urls", &self.base_urls)
            .field("model", &self.model)
            .field("max_hops", &self.max_hops)
            .field("search_max_results", &self.search_max_results)
            .field("settings", &self.settings)
            .finish()
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BotConfig {
    /// Create an empty config with default model and limits.
    pub fn new() -> Self {
        Self {
            api_keys: HashMap::new(),
            base_urls: HashMap::new(),
            model: DEFAULT_MODEL.to_string(),
            max_hops: DEFAULT_MAX_HOPS,
            search_max_results: DEFAULT_SEARCH_MAX_RESULTS,
            settings: GenerationSettings::default(),
        }
    }

    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        for (env_var, provider) in &API_KEY_ENV {
            if let Some(key) = lookup(env_var) {
                config.set_api_key(provider, key);
            }
        }
        for (env_var, provider) in &BASE_URL_ENV {
            if let Some(url) = lookup(env_var).filter(|url| !url.trim().is_empty()) {
                config.set_base_url(provider, url);
            }
        }

        if let Some(model) = lookup("GRAPHBOT_MODEL").filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(raw) = lookup("GRAPHBOT_MAX_HOPS") {
            config.max_hops = parse_positive(&raw, "GRAPHBOT_MAX_HOPS")?;
        }
        if let Some(raw) = lookup("GRAPHBOT_SEARCH_MAX_RESULTS") {
            config.search_max_results = parse_positive(&raw, "GRAPHBOT_SEARCH_MAX_RESULTS")?;
        }

        Ok(config)
    }

    pub fn set_api_key(&mut self, provider: &str, key: String) {
        self.api_keys.insert(provider.to_string(), key);
    }

    pub fn get_api_key(&self, provider: &str) -> Option<&str> {
        self.api_keys.get(provider).map(String::as_str)
    }

    /// Resolve a credential, rejecting missing or blank values.
    pub fn require_api_key(&self, provider: &str) -> Result<String> {
        match self.get_api_key(provider).map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(BotError::Configuration(format!(
                "Missing {}",
                api_key_env_name(provider)
            ))),
        }
    }

    pub fn set_base_url(&mut self, provider: &str, url: String) {
        self.base_urls.insert(provider.to_string(), url);
    }

    pub fn get_base_url(&self, provider: &str) -> Option<&str> {
        self.base_urls.get(provider).map(String::as_str)
    }

    pub fn has_credentials(&self, provider: &str) -> bool {
        self.require_api_key(provider).is_ok()
    }

    /// One line per known credential, masked to its first 8 characters.
    pub fn credential_report(&self) -> Vec<String> {
        API_KEY_ENV
            .iter()
            .map(|(env_var, provider)| {
                let shown = match self.get_api_key(provider).filter(|k| !k.trim().is_empty()) {
                    Some(key) => mask_secret(key),
                    None => "MISSING".to_string(),
                };
                format!("{env_var}: {shown}")
            })
            .collect()
    }
}

/// Environment variable that carries the credential for `provider`.
pub fn api_key_env_name(provider: &str) -> String {
    API_KEY_ENV
        .iter()
        .find(|(_, p)| *p == provider)
        .map(|(env_var, _)| (*env_var).to_string())
        .unwrap_or_else(|| format!("{}_API_KEY", provider.to_uppercase().replace('-', "_")))
}

fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(8).collect();
    format!("{prefix}...")
}

fn parse_positive<T>(raw: &str, name: &str) -> Result<T>
where
    T: std::str::FromStr + PartialEq + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(BotError::Configuration(format!(
            "{name} must be a positive integer, got '{raw}'"
        ))),
    }
}
