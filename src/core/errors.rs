//! Custom error types for translation operations

use serde::Deserialize;
use thiserror::Error;

/// Message used when a failed document job carries no detail from the server
pub const UNKNOWN_DOCUMENT_ERROR: &str = "unknown error during document translation";

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// 400: the request was rejected, usually because of a bad parameter
    #[error("Bad request. {message}")]
    InvalidParameters {
        message: String,
    },

    /// 403: the auth key was missing or not accepted
    #[error("Authorization failed. Please supply a valid auth_key parameter.")]
    AuthorizationFailed,

    /// 404
    #[error("The requested resource could not be found.")]
    ResourceNotFound,

    /// 413
    #[error("The request size exceeds the limit.")]
    PayloadTooLarge,

    /// 414
    #[error("The request URL is too long. You can avoid this error by using a POST request instead of a GET request.")]
    UrlTooLong,

    /// 429 and 529
    #[error("Too many requests. Please wait and resend your request.")]
    RateLimited,

    /// 456: the character limit of the account has been reached
    #[error("Quota exceeded. The character limit has been reached.")]
    QuotaExceeded,

    /// 503
    #[error("Resource currently unavailable. Try again later.")]
    ServiceUnavailable,

    /// 500
    #[error("Internal error.")]
    InternalServerError,

    /// Any status code without a dedicated kind
    #[error("Unknown error (HTTP status {status}).")]
    UnknownError {
        status: u16,
    },

    /// The server reported the document job as failed
    #[error("Document {document_id} could not be translated: {message}")]
    DocumentTranslationFailed {
        document_id: String,
        message: String,
    },

    /// A caller-supplied argument was rejected before any request was sent
    #[error("Invalid argument `{name}`: {message}")]
    InvalidArgument {
        name: String,
        message: String,
    },

    /// A required value was absent
    #[error("Missing required argument `{name}`")]
    NullArgument {
        name: String,
    },

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// The request never got an HTTP response
    #[error("Network error: {message}")]
    NetworkError {
        message: String,
    },

    /// File operation error
    #[error("File error: {path} - {message}")]
    FileError {
        path: String,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// The server answered with a body we could not interpret
    #[error("Invalid response: {message}")]
    InvalidResponseError {
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Body the service sends along with a 400
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl TranslationError {
    /// Map a non-success HTTP status (and its body) onto an error kind.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            400 => {
                let detail = serde_json::from_str::<ErrorBody>(body)
                    .ok()
                    .and_then(|b| b.message)
                    .filter(|m| !m.trim().is_empty());
                let message = match detail {
                    Some(detail) => format!("Reason: {}", detail),
                    None => "Please check the error message and your parameters.".to_string(),
                };
                TranslationError::InvalidParameters { message }
            }
            403 => TranslationError::AuthorizationFailed,
            404 => TranslationError::ResourceNotFound,
            413 => TranslationError::PayloadTooLarge,
            414 => TranslationError::UrlTooLong,
            429 | 529 => TranslationError::RateLimited,
            456 => TranslationError::QuotaExceeded,
            500 => TranslationError::InternalServerError,
            503 => TranslationError::ServiceUnavailable,
            status => TranslationError::UnknownError { status },
        }
    }

    /// Shorthand for a rejected argument
    pub fn invalid_argument(name: &str, message: impl Into<String>) -> Self {
        TranslationError::InvalidArgument {
            name: name.to_string(),
            message: message.into(),
        }
    }

    /// True when the operation stopped because its token fired
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TranslationError::Cancelled)
    }

    /// True for errors that originate from the remote service's status code
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            TranslationError::InvalidParameters { .. }
                | TranslationError::AuthorizationFailed
                | TranslationError::ResourceNotFound
                | TranslationError::PayloadTooLarge
                | TranslationError::UrlTooLong
                | TranslationError::RateLimited
                | TranslationError::QuotaExceeded
                | TranslationError::ServiceUnavailable
                | TranslationError::InternalServerError
                | TranslationError::UnknownError { .. }
        )
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            TranslationError::from_status(400, ""),
            TranslationError::InvalidParameters { .. }
        ));
        assert!(matches!(
            TranslationError::from_status(403, ""),
            TranslationError::AuthorizationFailed
        ));
        assert!(matches!(
            TranslationError::from_status(404, ""),
            TranslationError::ResourceNotFound
        ));
        assert!(matches!(
            TranslationError::from_status(413, ""),
            TranslationError::PayloadTooLarge
        ));
        assert!(matches!(
            TranslationError::from_status(414, ""),
            TranslationError::UrlTooLong
        ));
        assert!(matches!(
            TranslationError::from_status(429, ""),
            TranslationError::RateLimited
        ));
        assert!(matches!(
            TranslationError::from_status(456, ""),
            TranslationError::QuotaExceeded
        ));
        assert!(matches!(
            TranslationError::from_status(500, ""),
            TranslationError::InternalServerError
        ));
        assert!(matches!(
            TranslationError::from_status(503, ""),
            TranslationError::ServiceUnavailable
        ));
        assert!(matches!(
            TranslationError::from_status(529, ""),
            TranslationError::RateLimited
        ));
        assert!(matches!(
            TranslationError::from_status(418, ""),
            TranslationError::UnknownError { status: 418 }
        ));
    }

    #[test]
    fn test_bad_request_uses_server_message() {
        let err = TranslationError::from_status(400, r#"{"message":"Value for 'target_lang' not supported."}"#);
        assert_eq!(
            err.to_string(),
            "Bad request. Reason: Value for 'target_lang' not supported."
        );
    }

    #[test]
    fn test_bad_request_falls_back_to_generic_message() {
        for body in ["", "not json", r#"{"detail":"x"}"#, r#"{"message":"  "}"#] {
            let err = TranslationError::from_status(400, body);
            assert_eq!(
                err.to_string(),
                "Bad request. Please check the error message and your parameters."
            );
        }
    }

    #[test]
    fn test_cancelled_is_not_remote() {
        assert!(TranslationError::Cancelled.is_cancelled());
        assert!(!TranslationError::Cancelled.is_remote());
        assert!(TranslationError::from_status(456, "").is_remote());
        assert!(!TranslationError::from_status(456, "").is_cancelled());
    }
}
