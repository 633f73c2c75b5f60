//! Uniform outcome envelope returned by every orchestration and provisioning
//! operation.
//!
//! No fault crosses the service boundary uncaught; callers branch on the
//! envelope instead of inspecting errors.

use http::StatusCode;

/// Failure classification; maps 1:1 onto HTTP-style categories but the
/// envelope itself is protocol-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Duplicate email or client id; caller error, nothing was mutated
    ValidationConflict,
    /// The target account does not exist
    NotFound,
    /// The store rejected the entity, with its reported field errors
    CreationFailed,
    /// The compensating delete itself failed after a claim-issuance fault
    RollbackFailure,
    /// Unexpected fault, e.g. store unreachable
    SystemError,
}

impl FailureKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FailureKind::ValidationConflict => StatusCode::CONFLICT,
            FailureKind::NotFound => StatusCode::NOT_FOUND,
            FailureKind::CreationFailed => StatusCode::BAD_REQUEST,
            FailureKind::RollbackFailure => StatusCode::INTERNAL_SERVER_ERROR,
            FailureKind::SystemError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Discriminated outcome of an orchestration or provisioning call
#[derive(Debug, Clone)]
pub enum OperationResult<T> {
    Success(T),
    Failure {
        kind: FailureKind,
        title: String,
        message: String,
    },
}

impl<T> OperationResult<T> {
    pub fn success(payload: T) -> Self {
        OperationResult::Success(payload)
    }

    pub fn failure(
        kind: FailureKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        OperationResult::Failure {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Normalize an unexpected fault into a `SystemError` failure
    pub fn system_error(message: impl Into<String>) -> Self {
        Self::failure(FailureKind::SystemError, "SYSTEM ERROR", message)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            OperationResult::Success(_) => None,
            OperationResult::Failure { kind, .. } => Some(*kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification_mapping() {
        assert_eq!(
            FailureKind::ValidationConflict.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(FailureKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            FailureKind::CreationFailed.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FailureKind::RollbackFailure.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            FailureKind::SystemError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_envelope_accessors() {
        let success: OperationResult<u32> = OperationResult::success(7);
        assert!(success.is_success());
        assert!(success.failure_kind().is_none());

        let failure: OperationResult<u32> = OperationResult::system_error("store unreachable");
        assert!(!failure.is_success());
        assert_eq!(failure.failure_kind(), Some(FailureKind::SystemError));
    }
}
