//! Error types for generating, hosting and resolving QR codes

use thiserror::Error;

/// Result type alias for qrshare operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the user as a notification
#[derive(Error, Debug)]
pub enum Error {
    /// Content or color input rejected before any side effect
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Image host or metadata store failure
    #[error("Upstream service failed: {0}")]
    Upstream(String),

    /// No record stored under the id
    #[error("QR code not found: {0}")]
    NotFound(String),

    /// Missing or blank record id
    #[error("Invalid QR code ID")]
    InvalidId,

    /// QR encoding or rasterization failed
    #[error("Rendering failed: {0}")]
    Render(String),

    /// A generate call is already in flight
    #[error("A QR code is already being generated")]
    Busy,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed settings
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Upstream(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Render(err.to_string())
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Render(err.to_string())
    }
}

impl From<qrcode::types::QrError> for Error {
    fn from(err: qrcode::types::QrError) -> Self {
        Error::Render(err.to_string())
    }
}
