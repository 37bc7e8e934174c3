use crate::core::types::ApiErrorEntry;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BitcoindeError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    #[error("Method {0} not defined")]
    UnsupportedMethod(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Error in server response: HTTP {status} - {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("bitcoin.de API returned error: {message}")]
    ApiError {
        message: String,
        errors: Vec<ApiErrorEntry>,
    },
}

/// Coarse failure category of a [`BitcoindeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    UnsupportedMethod,
    InvalidInput,
    Transport,
    Decode,
    Api,
}

impl BitcoindeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigError(_) | Self::AuthError(_) => ErrorKind::Configuration,
            Self::UnsupportedMethod(_) => ErrorKind::UnsupportedMethod,
            Self::InvalidParameters(_) | Self::SerializationError(_) => ErrorKind::InvalidInput,
            Self::NetworkError(_) | Self::HttpStatus { .. } => ErrorKind::Transport,
            Self::DeserializationError(_) => ErrorKind::Decode,
            Self::ApiError { .. } => ErrorKind::Api,
        }
    }

    /// The first message reported by the exchange, if this is an API error
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::ApiError { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BitcoindeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::NetworkError(format!("Request timed out: {}", err))
        } else {
            Self::NetworkError(format!("Request failed: {}", err))
        }
    }
}
