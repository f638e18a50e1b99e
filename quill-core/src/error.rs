//! Error types for the audit library
//!
//! One error enum for the whole chain, with a coarse [`AuditErrorKind`]
//! classifier so callers can branch on the failure class without matching
//! every variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed cause carried by wrapped business-rule failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Audit library error
///
/// Argument validation failures (`InvalidArgument`, `FieldNotFound`) are
/// raised immediately and never wrap a cause. Business-rule failures carry
/// the originating error as `source`.
#[derive(Debug, Error)]
pub enum AuditError {
    /// A required argument was blank or otherwise unusable
    #[error("invalid argument `{param}`: {reason}")]
    InvalidArgument {
        param: &'static str,
        reason: String,
    },

    /// Lookup of a field that is not present on the event
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// Audit or processor setup failed
    #[error("initialization failed: {message}")]
    Initialization {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Missing or invalid configuration
    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The event is unusable for auditing
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// Runtime failure while handling an event
    #[error("processing failed: {message}")]
    Processing {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Fallback for failures outside the taxonomy
    #[error("unknown audit error: {message}")]
    Unknown {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// Failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditErrorKind {
    /// Argument validation (not part of the wrapped taxonomy)
    InvalidArgument,
    /// Field lookup miss (not part of the wrapped taxonomy)
    NotFound,
    Initialization,
    Configuration,
    InvalidEvent,
    Processing,
    Unknown,
}

impl AuditError {
    /// Classify this error
    pub fn kind(&self) -> AuditErrorKind {
        match self {
            Self::InvalidArgument { .. } => AuditErrorKind::InvalidArgument,
            Self::FieldNotFound(_) => AuditErrorKind::NotFound,
            Self::Initialization { .. } => AuditErrorKind::Initialization,
            Self::Configuration { .. } => AuditErrorKind::Configuration,
            Self::InvalidEvent(_) => AuditErrorKind::InvalidEvent,
            Self::Processing { .. } => AuditErrorKind::Processing,
            Self::Unknown { .. } => AuditErrorKind::Unknown,
        }
    }

    // ==================== Convenience constructors ====================

    /// Create an invalid-argument error for a named parameter
    pub fn invalid_argument(param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            param,
            reason: reason.into(),
        }
    }

    /// Create an initialization error without a cause
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization {
            message: message.into(),
            source: None,
        }
    }

    /// Create an initialization error wrapping a cause
    pub fn initialization_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Initialization {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a configuration error without a cause
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error wrapping a cause
    pub fn configuration_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a processing error without a cause
    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing {
            message: message.into(),
            source: None,
        }
    }

    /// Create a processing error wrapping a cause
    pub fn processing_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Processing {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create an unknown error wrapping a cause
    pub fn unknown_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Unknown {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            AuditError::invalid_argument("name", "must not be blank").kind(),
            AuditErrorKind::InvalidArgument
        );
        assert_eq!(
            AuditError::FieldNotFound("actor".into()).kind(),
            AuditErrorKind::NotFound
        );
        assert_eq!(
            AuditError::initialization("boom").kind(),
            AuditErrorKind::Initialization
        );
        assert_eq!(
            AuditError::configuration("no stream").kind(),
            AuditErrorKind::Configuration
        );
        assert_eq!(
            AuditError::InvalidEvent("empty".into()).kind(),
            AuditErrorKind::InvalidEvent
        );
        assert_eq!(
            AuditError::processing("sql failed").kind(),
            AuditErrorKind::Processing
        );
    }

    #[test]
    fn test_source_is_carried() {
        let cause = std::io::Error::other("disk on fire");
        let err = AuditError::processing_with("insert failed", cause);
        assert!(err.source().is_some());
        assert!(err.source().unwrap().to_string().contains("disk on fire"));
    }

    #[test]
    fn test_argument_errors_carry_no_cause() {
        let err = AuditError::invalid_argument("auditStream", "must not be blank");
        assert!(err.source().is_none());
        assert_eq!(
            err.to_string(),
            "invalid argument `auditStream`: must not be blank"
        );
    }
}
