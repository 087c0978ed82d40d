//! Error types for bionic operations.

use thiserror::Error;

/// Errors that can occur while configuring or driving the engine.
///
/// None of these reach the host document: the page boundary logs them and
/// degrades to "transformation not applied".
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown intensity level: {0}")]
    InvalidLevel(String),

    #[error("Unknown processing mode: {0}")]
    InvalidMode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Recipient not ready")]
    NotReady,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "settings.json");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("settings.json"));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::InvalidLevel("Skim".to_string()).to_string(),
            "Unknown intensity level: Skim"
        );
        assert_eq!(Error::NotReady.to_string(), "Recipient not ready");
    }
}
