use std::os::unix::process::ExitStatusExt;
use std::process::Stdio;

use tokio::process::Child;
use tokio::process::Command;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::command::CommandVector;
use crate::error::ExecError;
use crate::mux::CallerStreams;
use crate::mux::ChildPipes;
use crate::mux::pump;
use crate::options::ExecOptions;
use crate::outcome::Captured;
use crate::outcome::ExecOutcome;
use crate::outcome::OutcomeKind;

/// Run `command` with its streams multiplexed against this process's own
/// stdin, stdout and stderr.
pub async fn execute(command: CommandVector, options: &ExecOptions) -> Result<ExecOutcome, ExecError> {
    execute_with_streams(command, options, CallerStreams::inherit()).await
}

/// Like [`execute`], with the caller's side of the streams supplied
/// explicitly. In simple spawn mode the child inherits this process's stdio
/// and `caller` is unused.
pub async fn execute_with_streams(
    command: CommandVector,
    options: &ExecOptions,
    caller: CallerStreams,
) -> Result<ExecOutcome, ExecError> {
    let options = options.resolve();
    if options.use_simple_spawn_mode {
        return run_direct(&command, &options).await;
    }

    debug!("executing {command}");
    let mut child = Command::new(command.program())
        .args(command.arguments())
        .stdin(if options.needs_stdin_pipe() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ExecError::spawn(command.program().as_str(), source))?;

    let pipes = ChildPipes {
        stdin: child.stdin.take(),
        stdout: child.stdout.take(),
        stderr: child.stderr.take(),
    };
    let captured = pump(pipes, caller, &options).await;
    let raw_status = wait_for(&mut child).await;
    trace!("{command} finished with raw status {raw_status}");

    Ok(ExecOutcome::from_status(
        raw_status,
        options.must_succeed,
        captured,
    ))
}

/// Fire and forget: no capture, the child shares our stdio.
async fn run_direct(command: &CommandVector, options: &ExecOptions) -> Result<ExecOutcome, ExecError> {
    debug!("executing {command} with inherited stdio");
    let mut child = Command::new(command.program())
        .args(command.arguments())
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| ExecError::spawn(command.program().as_str(), source))?;
    let raw_status = wait_for(&mut child).await;
    trace!("{command} finished with raw status {raw_status}");

    let kind = if options.must_succeed && raw_status != 0 && raw_status != -1 {
        OutcomeKind::ErrNonZeroExit
    } else {
        OutcomeKind::Ok
    };
    Ok(ExecOutcome::new(raw_status, kind, Captured::discarded()))
}

async fn wait_for(child: &mut Child) -> i32 {
    match child.wait().await {
        Ok(status) => status.into_raw(),
        Err(err) => {
            warn!("failed to wait for child process: {err}");
            -1
        }
    }
}
