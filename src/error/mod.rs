//! Error types for graphbot.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all graphbot operations.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model backend error ({provider}): {source}")]
    ModelBackend {
        provider: String,
        #[source]
        source: BackendError,
    },

    #[error("Tool backend error: {tool_name}: {message}")]
    ToolBackend { tool_name: String, message: String },

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Graph execution exceeded {max_hops} hops")]
    GraphExecutionLimitExceeded { max_hops: usize },

    #[error("Message history is empty")]
    EmptyHistory,

    #[error("Run canceled before step '{before}'")]
    Canceled { before: String },

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BotError {
    /// Wrap a transport failure of the named model provider.
    pub fn model_backend(provider: impl Into<String>, source: BackendError) -> Self {
        Self::ModelBackend {
            provider: provider.into(),
            source,
        }
    }

    pub fn tool_backend(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolBackend {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ModelBackend { source, .. } => source.category(),
            Self::ToolBackend { .. } => ErrorCategory::ToolExecution,
            Self::PreconditionViolation(_) | Self::EmptyHistory | Self::InvalidGraph(_) => {
                ErrorCategory::Internal
            }
            Self::GraphExecutionLimitExceeded { .. } => ErrorCategory::Limit,
            Self::Canceled { .. } => ErrorCategory::Canceled,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::InvalidArgument(_) => ErrorCategory::InvalidInput,
        }
    }

    /// Internal invariant broken; indicates a bug in routing or graph wiring.
    pub fn is_fatal(&self) -> bool {
        matches!(self.category(), ErrorCategory::Internal)
    }

    /// Whether the caller can reasonably try again (possibly with other input).
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::RateLimit
            | ErrorCategory::Network
            | ErrorCategory::Timeout
            | ErrorCategory::Server => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Limit => RecoverySuggestion::RaiseHopLimit,
            ErrorCategory::ToolExecution => RecoverySuggestion::CheckToolImplementation,
            ErrorCategory::Internal => RecoverySuggestion::ReportBug,
            _ => RecoverySuggestion::None,
        }
    }
}

/// Transport-level failure talking to a model or tool HTTP API.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::InvalidResponse(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, BotError>;
