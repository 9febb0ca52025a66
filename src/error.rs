//! Error types and handling for the region weather collector

use thiserror::Error;

/// Main error type for the region weather collector
#[derive(Error, Debug)]
pub enum CollectorError {
    /// Missing or invalid configuration, e.g. no API key
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Malformed coordinates or inverted bounds
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// A single HTTP exchange failed (transport error or non-2xx status)
    #[error("Request error: {message}")]
    Request {
        message: String,
        status: Option<u16>,
    },

    /// The service answered with a payload we could not interpret
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Not a single request reached the service
    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl CollectorError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new request error without an HTTP status
    pub fn request<S: Into<String>>(message: S) -> Self {
        Self::Request {
            message: message.into(),
            status: None,
        }
    }

    /// Create a new request error for a non-2xx HTTP status
    pub fn status<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Request {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Create a new malformed response error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a new service unavailable error
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CollectorError::Config { message } => {
                format!(
                    "Configuration error: {message}. Please check your API key and config file."
                )
            }
            CollectorError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            CollectorError::Request { status: Some(401), .. } => {
                "The weather service rejected the API key. Please check OPENWEATHER_API_KEY."
                    .to_string()
            }
            CollectorError::Request { .. } | CollectorError::ServiceUnavailable { .. } => {
                "Unable to connect to the weather service. Please check your internet connection."
                    .to_string()
            }
            CollectorError::MalformedResponse { .. } => {
                "The weather service returned unexpected data.".to_string()
            }
            CollectorError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            CollectorError::Serialization { .. } => {
                "Unable to serialize the collected weather data.".to_string()
            }
        }
    }
}
