use lambda_http::http::StatusCode;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("path {0:?} has no alphanumeric characters")]
    InvalidPath(String),

    #[error("{0:?} is not a valid response code")]
    InvalidStatusCode(String, #[source] lambda_http::http::status::InvalidStatusCode),

    #[error("failed to serialize response body")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to build response")]
    Http(#[from] lambda_http::http::Error),

    #[error("storage {operation} failed")]
    Storage {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
}

impl Error {
    pub fn storage(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Storage {
            operation,
            source: source.into(),
        }
    }

    /// Status the caller sees for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidPath(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}
