use std::io;

use thiserror::Error;

use crate::outcome::OutcomeKind;

/// The child could not be run at all. Nothing about the command's own
/// behavior ends up here; that is reported through `ExecOutcome`.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("execution task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ExecError {
    pub(crate) fn spawn(program: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        OutcomeKind::ErrExecFailed
    }
}
