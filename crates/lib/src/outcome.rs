//! Terminal result of one wrapper run.

use crate::error::{WrapperError, EXIT_SUCCESS};

/// How the process ends. Every path, including success, is reported through
/// [`crate::report::Reporter::terminate`].
#[derive(Debug)]
pub enum ExitOutcome {
    /// The dispatcher completed the handoff.
    Success,
    Failure(WrapperError),
}

impl ExitOutcome {
    pub fn status_code(&self) -> i32 {
        match self {
            ExitOutcome::Success => EXIT_SUCCESS,
            ExitOutcome::Failure(e) => e.exit_code(),
        }
    }

    /// Human-readable diagnostic; `None` on success.
    pub fn message(&self) -> Option<String> {
        match self {
            ExitOutcome::Success => None,
            ExitOutcome::Failure(e) => Some(e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Success)
    }

    pub fn error(&self) -> Option<&WrapperError> {
        match self {
            ExitOutcome::Success => None,
            ExitOutcome::Failure(e) => Some(e),
        }
    }
}

impl From<Result<(), WrapperError>> for ExitOutcome {
    fn from(result: Result<(), WrapperError>) -> Self {
        match result {
            Ok(()) => ExitOutcome::Success,
            Err(e) => ExitOutcome::Failure(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::USAGE_ERROR;

    #[test]
    fn success_has_no_message() {
        let outcome = ExitOutcome::from(Ok(()));
        assert!(outcome.is_success());
        assert_eq!(outcome.status_code(), 0);
        assert_eq!(outcome.message(), None);
    }

    #[test]
    fn failure_carries_code_and_message() {
        let outcome = ExitOutcome::from(Err(WrapperError::Usage {
            program: "w".to_string(),
        }));
        assert_eq!(outcome.status_code(), USAGE_ERROR);
        assert_eq!(
            outcome.message().as_deref(),
            Some("Usage: w program [args...]")
        );
        assert!(outcome.error().is_some());
    }
}
