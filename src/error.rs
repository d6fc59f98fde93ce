// Error types for release-redirect.
// Covers GitHub API failures, request resolution failures, and configuration errors.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedirectError {
    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit of {limit} requests exceeded, resets at {reset_at}")]
    RateLimited { limit: u64, reset_at: String },

    #[error("Missing GITHUB_TOKEN environment variable")]
    MissingToken,

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid path {0:?}: expected /owner/repo/query")]
    InvalidPath(String),

    #[error("No asset in latest release of {repo} matches {query:?}")]
    NoMatchingAsset { repo: String, query: String },

    #[error("Invalid download URL {0:?}")]
    InvalidDownloadUrl(String),

    #[error("Invalid value for {var}: {reason}")]
    InvalidConfig { var: &'static str, reason: String },

    #[error("{0}")]
    Other(String),
}

impl RedirectError {
    /// HTTP status reported to the caller for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RedirectError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            RedirectError::NoMatchingAsset { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, RedirectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            RedirectError::InvalidPath("/a".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RedirectError::NoMatchingAsset {
                repo: "o/r".into(),
                query: "x".into()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        // Upstream causes are not distinguished in the response.
        for err in [
            RedirectError::Unauthorized,
            RedirectError::NotFound("https://api.github.com/repos/o/r".into()),
            RedirectError::RateLimited {
                limit: 5000,
                reset_at: "12:00:00".into(),
            },
            RedirectError::InvalidDownloadUrl("::".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
