use crate::error_code::OutcomeCode;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "hybrid.vector_weight")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected range, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "vector_index", "circuit_breaker")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the retrieval core.
///
/// Low-level failures from collaborators are folded into a handful of
/// categories; [`Error::outcome_code`] maps each one onto the bounded public set.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Circuit breaker open (retry after {retry_after_ms} ms)")]
    CircuitOpen { retry_after_ms: u64 },

    #[error("Retrieval error: {message}{}", format_context(.context))]
    Retrieval {
        message: String,
        context: ErrorContext,
    },

    #[error("Embedding error: {message}{}", format_context(.context))]
    Embedding {
        message: String,
        context: ErrorContext,
    },

    #[error("Rerank error: {message}{}", format_context(.context))]
    Rerank {
        message: String,
        context: ErrorContext,
    },

    #[error("Network error: {message}{}", format_context(.context))]
    Network {
        message: String,
        context: ErrorContext,
    },

    #[error("Remote API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::validation_with_context(msg, ErrorContext::new())
    }

    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::retrieval_with_context(msg, ErrorContext::new())
    }

    pub fn retrieval_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Retrieval {
            message: msg.into(),
            context,
        }
    }

    pub fn embedding_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Embedding {
            message: msg.into(),
            context,
        }
    }

    pub fn rerank_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Rerank {
            message: msg.into(),
            context,
        }
    }

    pub fn network_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Network {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Validation { context, .. }
            | Error::Retrieval { context, .. }
            | Error::Embedding { context, .. }
            | Error::Rerank { context, .. }
            | Error::Network { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Short, stable name of the error variant (used as a metrics label).
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration { .. } => "configuration",
            Error::Validation { .. } => "validation",
            Error::CircuitOpen { .. } => "circuit_open",
            Error::Retrieval { .. } => "retrieval",
            Error::Embedding { .. } => "embedding",
            Error::Rerank { .. } => "rerank",
            Error::Network { .. } => "network",
            Error::Api { .. } => "api",
            Error::Io(_) => "io",
            Error::Serialization(_) => "serialization",
            Error::Yaml(_) => "yaml",
        }
    }

    /// Map this error onto the bounded set of public outcomes.
    pub fn outcome_code(&self) -> OutcomeCode {
        match self {
            Error::Validation { .. } => OutcomeCode::InvalidRequest,
            Error::CircuitOpen { .. }
            | Error::Retrieval { .. }
            | Error::Embedding { .. }
            | Error::Network { .. }
            | Error::Api { .. }
            | Error::Io(_) => OutcomeCode::Unavailable,
            Error::Rerank { .. } => OutcomeCode::DegradedRanking,
            Error::Configuration { .. } | Error::Serialization(_) | Error::Yaml(_) => {
                OutcomeCode::Internal
            }
        }
    }

    /// Suggested wait before retrying, if the failure is a fast-fail.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Error::CircuitOpen { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }

    /// A message safe to show to end users: never includes internal details.
    pub fn public_message(&self) -> String {
        match self {
            Error::CircuitOpen { retry_after_ms } => format!(
                "Search is temporarily unavailable; retry in {} seconds",
                retry_after_ms.div_ceil(1000).max(1)
            ),
            Error::Validation { message, .. } => format!("Invalid request: {}", message),
            _ => self.outcome_code().description().to_string(),
        }
    }
}
