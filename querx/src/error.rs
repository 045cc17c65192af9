//! Error types for Querx client operations

use thiserror::Error;

/// Result type alias for Querx client operations
pub type Result<T> = std::result::Result<T, QuerxError>;

/// Errors that can occur while talking to a Querx device
#[derive(Error, Debug)]
pub enum QuerxError {
    /// HTTP request failed (connection refused, timeout, TLS failure)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Device URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Current values document is malformed or does not match the schema
    #[error("Failed to decode current values document: {0}")]
    Decode(#[from] quick_xml::de::DeError),

    /// No sensor at the requested catalog position
    #[error("Can not find sensor with index {0}")]
    SensorNotFound(usize),

    /// No sensor with the requested identifier
    #[error("Can not find sensor with id {0:?}")]
    UnknownSensor(String),

    /// Current values document has an empty record set
    #[error("Current values document contains no records")]
    NoRecords,

    /// Rejected client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Login answered with a non-success status (strict login only)
    #[error("Login rejected by device with status {status}")]
    LoginRejected { status: u16 },
}

impl QuerxError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
