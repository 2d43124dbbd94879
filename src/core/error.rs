use thiserror::Error;

#[derive(Error, Debug)]
pub enum CmsError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Token expired. Please login again.")]
    TokenExpired,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Payload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, CmsError>;

impl CmsError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Stable machine-readable code sent next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::TokenExpired => "token_expired",
            Self::Forbidden(_) => "invalid_token",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::Store(_) => "store_error",
        }
    }
}

impl From<std::io::Error> for CmsError {
    fn from(err: std::io::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<serde_json::Error> for CmsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Store(format!("serialization failed: {err}"))
    }
}

impl From<bcrypt::BcryptError> for CmsError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::Store(format!("password hashing failed: {err}"))
    }
}

impl From<tokio::task::JoinError> for CmsError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Store(format!("background task failed: {err}"))
    }
}
