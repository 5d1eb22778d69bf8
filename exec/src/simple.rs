use std::io;
use std::io::ErrorKind;
use std::io::Read;
use std::os::unix::process::ExitStatusExt;
use std::process::Command;
use std::process::Stdio;

use tracing::debug;
use tracing::warn;

use crate::command::CommandVector;
use crate::error::ExecError;
use crate::options::ExecOptions;
use crate::outcome::Captured;
use crate::outcome::CapturedOutput;
use crate::outcome::ExecOutcome;

const SIMPLE_READ_SIZE: usize = 65_536;

/// Run a non-interactive command: no stdin, stdout and stderr merged into one
/// pipe read to EOF. Cheaper than [`crate::execute`] when the caller only
/// needs the whole output at the end.
///
/// Of `options`, only `must_succeed` applies.
pub async fn execute_simple(
    command: CommandVector,
    options: &ExecOptions,
) -> Result<ExecOutcome, ExecError> {
    let must_succeed = options.must_succeed;
    let (raw_status, output) = tokio::task::spawn_blocking(move || run_merged(&command)).await??;
    let output_bytes = output.len() as u64;
    let captured = Captured {
        stdout: CapturedOutput::Raw(output),
        stderr: CapturedOutput::Discarded,
        stdout_bytes: output_bytes,
        stderr_bytes: 0,
        stdout_capped: false,
    };
    Ok(ExecOutcome::from_status(raw_status, must_succeed, captured))
}

fn run_merged(command: &CommandVector) -> Result<(i32, Vec<u8>), ExecError> {
    let spawn_error = |source: io::Error| ExecError::spawn(command.program().as_str(), source);

    let (reader, writer) = io::pipe().map_err(spawn_error)?;
    let stderr_writer = writer.try_clone().map_err(spawn_error)?;

    debug!("executing {command} (simple mode)");
    let mut cmd = Command::new(command.program());
    cmd.args(command.arguments())
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr_writer);
    let mut child = cmd.spawn().map_err(spawn_error)?;
    // The command still holds the write ends; EOF only arrives once they are gone.
    drop(cmd);

    // Consumes the read end: a child still writing after a read error gets
    // EPIPE rather than blocking forever.
    let output = drain(reader, command);

    let raw_status = match child.wait() {
        Ok(status) => status.into_raw(),
        Err(err) => {
            warn!("failed to wait for {command}: {err}");
            -1
        }
    };
    Ok((raw_status, output))
}

/// Read `reader` to EOF and close it. A read error ends the output early.
fn drain(mut reader: impl Read, command: &CommandVector) -> Vec<u8> {
    let mut output = Vec::new();
    let mut buf = vec![0u8; SIMPLE_READ_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => output.extend_from_slice(&buf[..n]),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!("failed to read output of {command}: {err}");
                break;
            }
        }
    }
    output
}
