use std::fmt;

use crate::exit_status::ExitStatusInfo;
use crate::exit_status::decode_wait_status;

/// How an execution concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// Exited 0 (or, in simple spawn mode, was started).
    Ok,
    OkNonZeroExit,
    ErrNonZeroExit,
    ErrExecFailed,
    ErrHelperFailed,
    ErrHelperReturnEmpty,
    ErrHelperReturnInvalid,
}

impl OutcomeKind {
    /// Stable code used in result documents.
    pub fn code(self) -> &'static str {
        match self {
            OutcomeKind::Ok => "OK",
            OutcomeKind::OkNonZeroExit => "OK_NON_ZERO_EXIT",
            OutcomeKind::ErrNonZeroExit => "ERR_NON_ZERO_EXIT",
            OutcomeKind::ErrExecFailed => "ERR_EXEC_FAILED",
            OutcomeKind::ErrHelperFailed => "ERR_HELPER_FAILED",
            OutcomeKind::ErrHelperReturnEmpty => "ERR_HELPER_RETURN_EMPTY",
            OutcomeKind::ErrHelperReturnInvalid => "ERR_HELPER_RETURN_INVALID",
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, OutcomeKind::Ok | OutcomeKind::OkNonZeroExit)
    }

    pub fn is_err(self) -> bool {
        !self.is_ok()
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// What was kept of one of the child's output streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedOutput {
    /// Complete lines, terminators stripped, in the order they were produced.
    Lines(Vec<String>),
    /// Unframed bytes (simple mode, stdout and stderr merged).
    Raw(Vec<u8>),
    /// Nothing was kept.
    Discarded,
}

impl CapturedOutput {
    /// Captured lines; empty unless this is [`CapturedOutput::Lines`].
    pub fn lines(&self) -> &[String] {
        match self {
            CapturedOutput::Lines(lines) => lines,
            CapturedOutput::Raw(_) | CapturedOutput::Discarded => &[],
        }
    }
}

/// Streams and counters gathered while a child was running.
#[derive(Debug)]
pub(crate) struct Captured {
    pub(crate) stdout: CapturedOutput,
    pub(crate) stderr: CapturedOutput,
    pub(crate) stdout_bytes: u64,
    pub(crate) stderr_bytes: u64,
    pub(crate) stdout_capped: bool,
}

impl Captured {
    pub(crate) fn discarded() -> Self {
        Self {
            stdout: CapturedOutput::Discarded,
            stderr: CapturedOutput::Discarded,
            stdout_bytes: 0,
            stderr_bytes: 0,
            stdout_capped: false,
        }
    }
}

/// Result of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    pub kind: OutcomeKind,
    /// Raw wait status, `-1` if it could not be collected.
    pub raw_status: i32,
    pub status: Option<i32>,
    pub signal: Option<String>,
    pub coredump: bool,
    pub message: String,
    pub stdout: CapturedOutput,
    pub stderr: CapturedOutput,
    pub stdout_bytes: u64,
    pub stderr_bytes: u64,
    /// The stdout byte cap fired and the pipes were closed early.
    pub stdout_capped: bool,
}

impl ExecOutcome {
    pub(crate) fn new(raw_status: i32, kind: OutcomeKind, captured: Captured) -> Self {
        let ExitStatusInfo {
            status,
            signal,
            coredump,
            message,
        } = decode_wait_status(raw_status);
        Self {
            kind,
            raw_status,
            status,
            signal,
            coredump,
            message,
            stdout: captured.stdout,
            stderr: captured.stderr,
            stdout_bytes: captured.stdout_bytes,
            stderr_bytes: captured.stderr_bytes,
            stdout_capped: captured.stdout_capped,
        }
    }

    /// Classify `raw_status` by exit code.
    pub(crate) fn from_status(raw_status: i32, must_succeed: bool, captured: Captured) -> Self {
        let kind = classify(raw_status, must_succeed);
        Self::new(raw_status, kind, captured)
    }

    pub fn is_ok(&self) -> bool {
        self.kind.is_ok()
    }
}

fn classify(raw_status: i32, must_succeed: bool) -> OutcomeKind {
    // A failed wait is reported through the message only.
    if raw_status == 0 || raw_status == -1 {
        OutcomeKind::Ok
    } else if must_succeed {
        OutcomeKind::ErrNonZeroExit
    } else {
        OutcomeKind::OkNonZeroExit
    }
}
