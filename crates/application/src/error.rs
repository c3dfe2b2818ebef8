//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// External service error (HTTP status, network, timeout)
    #[error("External service error: {0}")]
    ExternalService(String),

    /// The backend answered with something we cannot interpret
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A poll cycle failed; previously published data is kept
    #[error("Update failed: {0}")]
    UpdateFailed(String),

    /// A stop search returned nothing
    #[error("No stop found for '{0}'")]
    NoStopFound(String),

    /// A hub with this name already exists
    #[error("Hub '{0}' is already configured")]
    AlreadyConfigured(String),

    /// A line update neither added nor removed anything
    #[error("No changes to apply")]
    NoChanges,

    /// Persisted state could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalService(_) | Self::UpdateFailed(_))
    }

    /// Check if this error reports a missing entity
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Domain(DomainError::NotFound { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(ApplicationError::ExternalService("503".into()).is_retryable());
        assert!(ApplicationError::UpdateFailed("timeout".into()).is_retryable());
        assert!(!ApplicationError::NoChanges.is_retryable());
        assert!(!ApplicationError::MalformedResponse("eof".into()).is_retryable());
    }

    #[test]
    fn domain_errors_convert() {
        let err: ApplicationError = DomainError::not_found("hub", "Plärrer").into();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Plärrer"));
    }

    #[test]
    fn display() {
        assert_eq!(
            ApplicationError::AlreadyConfigured("Plärrer".into()).to_string(),
            "Hub 'Plärrer' is already configured"
        );
        assert_eq!(
            ApplicationError::NoStopFound("xyz".into()).to_string(),
            "No stop found for 'xyz'"
        );
    }
}
