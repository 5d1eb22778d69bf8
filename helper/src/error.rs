use bastion_exec::ExecError;
use bastion_exec::ExecOutcome;
use bastion_exec::OutcomeKind;
use bastion_helper_protocol::BastionResult;
use bastion_helper_protocol::ProtocolError;
use thiserror::Error;

/// Why a helper run produced no usable result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelperError {
    /// The helper could not be started, exited non-zero or was killed.
    #[error("helper failed: {message}")]
    HelperFailed { message: String },
    /// The helper succeeded but printed no complete result frame.
    #[error("helper did not return a result")]
    ReturnEmpty,
    #[error("helper returned an invalid result: {0}")]
    ReturnInvalid(String),
}

impl HelperError {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            HelperError::HelperFailed { .. } => OutcomeKind::ErrHelperFailed,
            HelperError::ReturnEmpty => OutcomeKind::ErrHelperReturnEmpty,
            HelperError::ReturnInvalid(_) => OutcomeKind::ErrHelperReturnInvalid,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// The error as a result document, for callers that report failures the
    /// same way as successes.
    pub fn into_result(self) -> BastionResult {
        BastionResult::err(self.code(), self.to_string())
    }
}

impl From<ProtocolError> for HelperError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Empty => HelperError::ReturnEmpty,
            ProtocolError::Invalid(reason) => HelperError::ReturnInvalid(reason),
        }
    }
}

impl From<ExecError> for HelperError {
    fn from(err: ExecError) -> Self {
        HelperError::HelperFailed {
            message: err.to_string(),
        }
    }
}

impl From<ExecOutcome> for HelperError {
    fn from(outcome: ExecOutcome) -> Self {
        HelperError::HelperFailed {
            message: outcome.message,
        }
    }
}
