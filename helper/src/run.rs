use bastion_exec::CallerStreams;
use bastion_exec::CommandVector;
use bastion_exec::ExecOptions;
use bastion_exec::execute_with_streams;
use bastion_helper_protocol::BastionResult;
use bastion_helper_protocol::decode_result;
use tracing::debug;
use tracing::warn;

use crate::error::HelperError;

/// Caller-controlled knobs of a helper run. Everything else (echoing, frame
/// hiding, failing on non-zero exit) is fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelperOptions {
    /// Forward this process's stdin to the helper.
    pub expects_stdin: bool,
    /// Bytes written to the helper's stdin before it is closed.
    pub stdin_payload: Option<Vec<u8>>,
    pub max_stdout_bytes: Option<u64>,
}

impl HelperOptions {
    fn into_exec_options(self) -> ExecOptions {
        ExecOptions {
            expects_stdin: self.expects_stdin,
            noisy_stdout: true,
            noisy_stderr: true,
            is_helper_protocol: true,
            stdin_payload: self.stdin_payload,
            must_succeed: true,
            max_stdout_bytes: self.max_stdout_bytes,
            ..Default::default()
        }
    }
}

/// Run a helper against this process's own stdio and return the result it
/// reported.
pub async fn run_helper(
    command: CommandVector,
    options: HelperOptions,
) -> Result<BastionResult, HelperError> {
    run_helper_with_streams(command, options, CallerStreams::inherit()).await
}

pub async fn run_helper_with_streams(
    command: CommandVector,
    options: HelperOptions,
    caller: CallerStreams,
) -> Result<BastionResult, HelperError> {
    let description = command.to_string();
    let outcome = execute_with_streams(command, &options.into_exec_options(), caller).await?;
    if outcome.kind.is_err() {
        debug!("helper {description} failed: {}", outcome.message);
        return Err(outcome.into());
    }
    if outcome.stdout_capped {
        warn!(
            "output of helper {description} was cut off after {} bytes",
            outcome.stdout_bytes
        );
    }

    let result = decode_result(outcome.stdout.lines())?;
    debug!("helper {description} returned {}", result.code);
    Ok(result)
}
