use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use crate::models::ErrorResponse;

/// Failure reported by an image engine or model-level operation.
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = ImagineError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ImagineError {
    /// Malformed operation spec in untrusted input.
    #[error("Malformed operation spec: {0}")]
    Parse(String),

    /// Name or value collides with a separator, or an argument is out of range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unsupported image operation `{0}`")]
    UnsupportedOperation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Error raised by a capability provider, passed through untouched.
    #[error(transparent)]
    Engine(EngineError),
}

impl ImagineError {
    pub fn kind(&self) -> &'static str {
        match self {
            ImagineError::Parse(_) => "parse_error",
            ImagineError::InvalidInput(_) => "invalid_input",
            ImagineError::MissingToken => "missing_token",
            ImagineError::InvalidToken => "invalid_token",
            ImagineError::UnsupportedOperation(_) => "unsupported_operation",
            ImagineError::Config(_) => "config_error",
            ImagineError::Engine(_) => "engine_error",
        }
    }

    /// Token failures deny access; they are never served as a success.
    pub fn is_denial(&self) -> bool {
        matches!(self, ImagineError::MissingToken | ImagineError::InvalidToken)
    }
}

impl ResponseError for ImagineError {
    fn status_code(&self) -> StatusCode {
        match self {
            ImagineError::Parse(_) => StatusCode::BAD_REQUEST,
            ImagineError::MissingToken => StatusCode::BAD_REQUEST,
            ImagineError::InvalidToken => StatusCode::NOT_FOUND,
            ImagineError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ImagineError::UnsupportedOperation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ImagineError::Config(_) | ImagineError::Engine(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ImagineError::Config(_) | ImagineError::Engine(_) => {
                tracing::error!("Image pipeline failure: {}", self);
                ErrorResponse::new("Internal error")
            }
            ImagineError::MissingToken | ImagineError::InvalidToken => {
                ErrorResponse::new("Image not found")
            }
            other => ErrorResponse::with_details("Invalid request", other.to_string()),
        };

        HttpResponse::build(self.status_code()).json(body.kind(self.kind()))
    }
}
