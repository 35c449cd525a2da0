//! Error types for Fertilikey
//!
//! Directory loading has its own small taxonomy ([`FetchError`]); everything
//! else surfaces through [`FertilikeyError`].

use thiserror::Error;

/// Why the one-shot directory load failed.
///
/// All three variants are terminal: the store never retries and the
/// directory stays empty for the rest of the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server responded with status: {0}")]
    HttpStatus(u16),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Main error type for Fertilikey operations
#[derive(Error, Debug)]
pub enum FertilikeyError {
    #[error("Failed to load institutions: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("No institution matches '{0}'")]
    NotFound(String),

    #[error("Ambiguous query '{query}': {count} institutions match")]
    Ambiguous { query: String, count: usize },

    #[error("Failed to write JSON output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Result type alias for Fertilikey operations
pub type Result<T> = std::result::Result<T, FertilikeyError>;

impl FetchError {
    /// Message shown on the error screen, mirroring what a browser user saw.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Network(_) => "Unable to reach the institution directory.".to_string(),
            FetchError::HttpStatus(code) => format!("Server responded with status: {}", code),
            FetchError::MalformedResponse(_) => {
                "Unable to parse server response as JSON. The server might be returning an error page instead of JSON data."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_are_output_errors() {
        let err: FertilikeyError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(matches!(err, FertilikeyError::Output(_)));
        assert!(err.to_string().starts_with("Failed to write JSON output"));
    }

    #[test]
    fn user_message_hides_transport_detail() {
        let msg = FetchError::Network("tcp connect refused".into()).user_message();
        assert!(!msg.contains("refused"));
        assert_eq!(
            FetchError::HttpStatus(503).user_message(),
            "Server responded with status: 503"
        );
    }
}
