use crate::transport::TransportError;
use serde_json::Value;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "config.origin", "env.FETCHR_TIMEOUT_MS")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "fetcher_builder", "config_loader")
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

/// Status code used for errors produced locally, before any network interaction.
pub const PRECONDITION_STATUS: u16 = 400;

/// Unified error type delivered to every caller.
///
/// It is `Clone` because a failed wire call that was shared by a group of
/// requests delivers the same error to every member.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Produced locally; the request never reached the transport.
    #[error("Client precondition failed: HTTP {status}: {message}")]
    Precondition { status: u16, message: String },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    /// The `err` object the server attached to one request of a multiplexed call.
    #[error("Remote error{}: {payload}", format_status(.status))]
    Remote { status: Option<u16>, payload: Value },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(s) => format!(" (HTTP {})", s),
        None => String::new(),
    }
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

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// The crumb gate rejected the call.
    pub fn missing_crumb() -> Self {
        Error::Precondition {
            status: PRECONDITION_STATUS,
            message: "missing crumb".to_string(),
        }
    }

    /// Wrap a per-request `err` payload from a multiplexed response.
    pub fn remote(payload: Value) -> Self {
        let status = payload
            .get("statusCode")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok());
        Error::Remote { status, payload }
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::Runtime {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new runtime error with structured context
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// HTTP-like status code, when one is known.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Precondition { status, .. } => Some(*status),
            Error::Transport(e) => Some(e.status_code()).filter(|s| *s != 0),
            Error::Remote { status, .. } => *status,
            _ => None,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }
}
