//! Unified error type for permission compilation
//!
//! Configuration errors are fatal for the principal being compiled: the
//! engine returns the error instead of a partially populated index, so a
//! malformed grant can only ever under-grant.

use crate::action::Action;
use crate::kind::ResourceKind;
use thiserror::Error;

/// Result alias used across Rampart crates
pub type Result<T> = std::result::Result<T, AuthorizationError>;

/// Errors raised while compiling or querying permissions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    /// A filter carried a discriminant or tag the engine does not know
    #[error("invalid {context} filter: unrecognized discriminant `{discriminant}`")]
    InvalidFilter {
        /// Which filter family was being decoded
        context: String,
        /// The offending discriminant
        discriminant: String,
    },

    /// A grant's resource filter does not fit its resource kind
    #[error("{kind} grant cannot carry a {filter} filter")]
    FilterMismatch {
        /// Kind named by the grant
        kind: ResourceKind,
        /// Variant of the filter it carried
        filter: &'static str,
    },

    /// A group document could not be decoded
    #[error("invalid group document: {message}")]
    InvalidGroup {
        /// Decoder message
        message: String,
    },

    /// A check the authorization index cannot answer
    #[error("unsupported check: {action} on {kind}")]
    UnsupportedCheck {
        /// Kind being checked
        kind: ResourceKind,
        /// Action being checked
        action: Action,
    },

    /// The resource loader answered with the wrong projection kind
    #[error("resource loader returned a {found} projection for a {expected} request")]
    ProjectionMismatch {
        /// Kind that was requested
        expected: ResourceKind,
        /// Kind that came back
        found: ResourceKind,
    },

    /// Group source or resource loader failure
    #[error("collaborator failure: {message}")]
    Collaborator {
        /// Failure description
        message: String,
    },

    /// Invalid engine configuration
    #[error("invalid configuration: {message}")]
    Config {
        /// Failure description
        message: String,
    },
}

impl AuthorizationError {
    /// Create an unrecognized-discriminant error
    pub fn invalid_filter(context: impl Into<String>, discriminant: impl Into<String>) -> Self {
        Self::InvalidFilter {
            context: context.into(),
            discriminant: discriminant.into(),
        }
    }

    /// Create a filter/kind mismatch error
    pub fn filter_mismatch(kind: ResourceKind, filter: &'static str) -> Self {
        Self::FilterMismatch { kind, filter }
    }

    /// Create a group decoding error
    pub fn invalid_group(message: impl Into<String>) -> Self {
        Self::InvalidGroup {
            message: message.into(),
        }
    }

    /// Create an unsupported check error
    pub fn unsupported_check(kind: ResourceKind, action: Action) -> Self {
        Self::UnsupportedCheck { kind, action }
    }

    /// Create a collaborator failure
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error stems from malformed group configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidFilter { .. } | Self::FilterMismatch { .. } | Self::InvalidGroup { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthorizationError::invalid_filter("application", "SOME");
        assert!(err.to_string().contains("application"));
        assert!(err.to_string().contains("SOME"));

        let err = AuthorizationError::filter_mismatch(ResourceKind::Service, "ENVIRONMENT");
        assert_eq!(
            err.to_string(),
            "SERVICE grant cannot carry a ENVIRONMENT filter"
        );

        let err = AuthorizationError::unsupported_check(ResourceKind::Deployment, Action::Create);
        assert!(err.to_string().contains("CREATE on DEPLOYMENT"));
    }

    #[test]
    fn test_configuration_classification() {
        assert!(AuthorizationError::invalid_filter("workflow", "X").is_configuration());
        assert!(
            AuthorizationError::filter_mismatch(ResourceKind::Workflow, "SET").is_configuration()
        );
        assert!(AuthorizationError::invalid_group("eof").is_configuration());
        assert!(!AuthorizationError::collaborator("timeout").is_configuration());
        assert!(!AuthorizationError::config("zero capacity").is_configuration());
    }
}
