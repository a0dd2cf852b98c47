use thiserror::Error;

/// Main error type for the planner
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model output could not be coerced into a JSON itinerary after every repair stage.
    #[error("Format error: {message} (response starts with: {snippet:?})")]
    Format { message: String, snippet: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Upstream returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    /// Build a format error, keeping at most `max_chars` characters of the raw response.
    pub fn format(message: impl Into<String>, raw: &str, max_chars: usize) -> Self {
        PlannerError::Format {
            message: message.into(),
            snippet: truncate_chars(raw, max_chars),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            PlannerError::Http(_) => true,
            PlannerError::Upstream { status, .. } => *status >= 500,
            PlannerError::RateLimit { .. } => true,
            PlannerError::Timeout(_) => true,
            _ => false,
        }
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            PlannerError::Config(_) => "CONFIG_ERROR",
            PlannerError::Format { .. } => "FORMAT_ERROR",
            PlannerError::Serialization(_) => "SERIALIZATION_ERROR",
            PlannerError::Validation(_) => "VALIDATION_ERROR",
            PlannerError::Http(_) => "HTTP_ERROR",
            PlannerError::Upstream { .. } => "UPSTREAM_ERROR",
            PlannerError::Timeout(_) => "TIMEOUT_ERROR",
            PlannerError::RateLimit { .. } => "RATE_LIMIT_ERROR",
            PlannerError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Message suitable for showing to the traveller.
    pub fn user_message(&self) -> &'static str {
        match self {
            PlannerError::Format { .. } => {
                "The assistant returned an itinerary we could not read. Please retry or simplify your request."
            }
            PlannerError::Timeout(_) => {
                "The assistant took too long to answer. Please try again in a moment."
            }
            PlannerError::RateLimit { .. } => {
                "Too many requests right now. Please wait a little and try again."
            }
            PlannerError::Config(_) => "The planner is not configured correctly.",
            PlannerError::Validation(_) => "Some of the trip details could not be understood.",
            _ => "Something went wrong while planning your trip. Please try again.",
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "retryable": self.is_retryable()
            }
        })
    }
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
