use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Retrieval backend errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Backend rejected request: {message}")]
    Rejected { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Cannot upload {path}: {message}")]
    Upload { path: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BackendError {
    /// Text surfaced to the user for a failed call.
    ///
    /// Non-2xx responses show the body the backend sent back.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Api { status, message } if message.trim().is_empty() => {
                format!("HTTP {}", status)
            }
            BackendError::Api { message, .. } => message.clone(),
            BackendError::Rejected { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Why a query submission was not sent.
///
/// None of these are failures: the submission is simply a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejection {
    #[error("Connect and ingest before querying")]
    NotReady,

    #[error("Query is empty")]
    EmptyQuery,

    #[error("A query is already in flight")]
    Busy,
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for backend calls
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "bad profile".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: bad profile");
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Api {
            status: 500,
            message: "neo4j unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - neo4j unavailable");

        let err = BackendError::Rejected {
            message: "Parsing failed".to_string(),
        };
        assert_eq!(err.to_string(), "Backend rejected request: Parsing failed");

        let err = BackendError::Timeout { timeout_ms: 5000 };
        assert_eq!(err.to_string(), "Request timeout after 5000ms");

        let err = BackendError::Upload {
            path: "notes.txt".to_string(),
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot upload notes.txt: not found");
    }

    #[test]
    fn test_user_message_surfaces_body_text() {
        let err = BackendError::Api {
            status: 404,
            message: "Entity not found".to_string(),
        };
        assert_eq!(err.user_message(), "Entity not found");

        let err = BackendError::Api {
            status: 502,
            message: "  ".to_string(),
        };
        assert_eq!(err.user_message(), "HTTP 502");

        let err = BackendError::InvalidResponse {
            message: "missing field `answer`".to_string(),
        };
        assert_eq!(err.user_message(), "Invalid response: missing field `answer`");
    }

    #[test]
    fn test_submit_rejection_display() {
        assert_eq!(
            SubmitRejection::NotReady.to_string(),
            "Connect and ingest before querying"
        );
        assert_eq!(SubmitRejection::EmptyQuery.to_string(), "Query is empty");
        assert_eq!(
            SubmitRejection::Busy.to_string(),
            "A query is already in flight"
        );
    }

    #[test]
    fn test_backend_error_conversion_to_app_error() {
        let err = BackendError::Timeout { timeout_ms: 1000 };
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Backend(_)));
    }

    #[test]
    fn test_io_error_conversion_to_app_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed");
        let app_err: AppError = io.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("stdout closed"));
    }
}
