//! Departure API error types

use thiserror::Error;

/// Errors that can occur while talking to a departures backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Response status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Connection or transport failure
    #[error("Network error for {url}: {message}")]
    Network {
        /// Requested URL
        url: String,
        /// Underlying error
        message: String,
    },

    /// The request did not complete in time
    #[error("Request to {url} timed out after {timeout_ms} ms")]
    Timeout {
        /// Requested URL
        url: String,
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// The response body was not the expected JSON document
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The request could not be built (bad command or parameters)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Client configuration is invalid
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Returns true if repeating the request may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus { .. } | Self::Network { .. } | Self::Timeout { .. }
        )
    }

    /// HTTP status code, if the server answered at all
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map a reqwest failure for `url`
    pub(crate) fn from_reqwest(err: &reqwest::Error, url: &str, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                timeout_ms,
            }
        } else if let Some(status) = err.status() {
            Self::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(
            ApiError::HttpStatus {
                status: 503,
                url: "http://x".into()
            }
            .is_retryable()
        );
        assert!(
            ApiError::Network {
                url: "http://x".into(),
                message: "reset".into()
            }
            .is_retryable()
        );
        assert!(
            ApiError::Timeout {
                url: "http://x".into(),
                timeout_ms: 10_000
            }
            .is_retryable()
        );
    }

    #[test]
    fn non_retryable_errors() {
        assert!(!ApiError::MalformedResponse("eof".into()).is_retryable());
        assert!(!ApiError::InvalidRequest("empty command".into()).is_retryable());
        assert!(!ApiError::Configuration("bad url".into()).is_retryable());
    }

    #[test]
    fn status_accessor() {
        let err = ApiError::HttpStatus {
            status: 404,
            url: "http://x/v5/stoptimes".into(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(ApiError::MalformedResponse(String::new()).status(), None);
    }

    #[test]
    fn display_mentions_url() {
        let err = ApiError::Timeout {
            url: "http://test.api/v5/stoptimes".into(),
            timeout_ms: 10_000,
        };
        let text = err.to_string();
        assert!(text.contains("v5/stoptimes"));
        assert!(text.contains("10000"));
    }
}
