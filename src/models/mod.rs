//! Model selection.

#[cfg(feature = "groq")]
pub mod groq;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BotError;

/// Which provider and model a [`crate::bot::ChatBot`] talks to.
///
/// Parsed from `provider:model`, e.g. `groq:gemma2-9b-it` or `openai:gpt-4o-mini`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "provider", content = "model")]
pub enum LanguageModel {
    #[cfg(feature = "groq")]
    Groq(groq::GroqModel),
    #[cfg(feature = "openai")]
    OpenAi(String),
    /// Provider without a built-in backend.
    Custom { provider: String, model_id: String },
}

impl LanguageModel {
    pub fn model_id(&self) -> &str {
        match self {
            #[cfg(feature = "groq")]
            Self::Groq(m) => m.as_str(),
            #[cfg(feature = "openai")]
            Self::OpenAi(m) => m,
            Self::Custom { model_id, .. } => model_id,
        }
    }

    pub fn provider_name(&self) -> &str {
        match self {
            #[cfg(feature = "groq")]
            Self::Groq(_) => "groq",
            #[cfg(feature = "openai")]
            Self::OpenAi(_) => "openai",
            Self::Custom { provider, .. } => provider,
        }
    }
}

impl fmt::Display for LanguageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider_name(), self.model_id())
    }
}

impl FromStr for LanguageModel {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, model_id) = s
            .trim()
            .split_once(':')
            .filter(|(p, m)| !p.is_empty() && !m.is_empty())
            .ok_or_else(|| {
                BotError::Configuration(format!(
                    "Invalid model '{s}'. Use provider:model (e.g. groq:gemma2-9b-it)"
                ))
            })?;

        let provider = provider.to_ascii_lowercase();
        match provider.as_str() {
            #[cfg(feature = "groq")]
            "groq" => Ok(Self::Groq(
                model_id.parse().unwrap_or_else(|_| groq::GroqModel::Custom(model_id.to_string())),
            )),
            #[cfg(feature = "openai")]
            "openai" => Ok(Self::OpenAi(model_id.to_string())),
            _ => Ok(Self::Custom {
                provider,
                model_id: model_id.to_string(),
            }),
        }
    }
}
