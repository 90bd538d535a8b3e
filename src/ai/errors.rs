use thiserror::Error;

/// Errors that can occur when talking to the generative model
#[derive(Debug, Error)]
pub enum AiError {
    #[error("GEMINI_API_KEY not set")]
    NotConfigured,

    #[error("{0}")]
    InvalidInput(String),

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Gemini API error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("{0}")]
    RateLimited(String),

    #[error("No content in Gemini response")]
    EmptyResponse,
}

pub type AiResult<T> = Result<T, AiError>;
