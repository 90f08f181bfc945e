//! Saga error types.

use thiserror::Error;

use crate::order_fulfillment::SagaStep;

/// A downstream call that did not produce a usable answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The remote system could not be reached or the connection broke.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote system answered with an error.
    #[error("remote fault: {0}")]
    Remote(String),

    /// The remote system answered with something we could not interpret.
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl AdapterError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        AdapterError::Transport(err.to_string())
    }

    pub fn protocol(err: impl std::fmt::Display) -> Self {
        AdapterError::Protocol(err.to_string())
    }
}

/// Errors that end a saga early.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A step whose failure aborts the remaining workflow failed.
    #[error("Saga step '{step}' failed: {source}")]
    StepFailed {
        step: SagaStep,
        #[source]
        source: AdapterError,
    },
}

impl SagaError {
    /// Returns the step that failed.
    pub fn step(&self) -> SagaStep {
        match self {
            SagaError::StepFailed { step, .. } => *step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_failed_message_names_step_and_cause() {
        let err = SagaError::StepFailed {
            step: SagaStep::OptimizeRoute,
            source: AdapterError::Remote("no vehicles".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Saga step 'optimize_route' failed: remote fault: no vehicles"
        );
        assert_eq!(err.step(), SagaStep::OptimizeRoute);
    }

    #[test]
    fn adapter_error_constructors() {
        assert_eq!(
            AdapterError::transport("refused"),
            AdapterError::Transport("refused".to_string())
        );
        assert_eq!(
            AdapterError::protocol("bad frame").to_string(),
            "protocol violation: bad frame"
        );
    }
}
