use anyhow::Result;
use bastion_exec::CallerStreams;
use bastion_exec::CapturedOutput;
use bastion_exec::ExecOptions;
use bastion_exec::OutcomeKind;
use bastion_exec::PLUGIN_DEBUG_ENV_VAR;
use bastion_exec::execute_with_streams;
use pretty_assertions::assert_eq;
use serial_test::serial;

use super::support::BrokenPipe;
use super::support::EnvGuard;
use super::support::SharedBuffer;
use super::support::lines;
use super::support::recording_streams;
use super::support::sh;

const HELPER_SCRIPT: &str = r#"
echo "checking account"
echo "warning: slow disk" >&2
echo JSON_START
echo '{"error_code":"OK","value":null,"error_message":null}'
echo JSON_END
echo "done"
"#;

#[tokio::test]
// The debug toggle is process-wide.
#[serial(debug_toggle)]
async fn quiet_by_default() -> Result<()> {
    let _guard = EnvGuard::remove(PLUGIN_DEBUG_ENV_VAR);
    let (streams, stdout, stderr) = recording_streams(b"");
    execute_with_streams(sh("echo out; echo err >&2")?, &ExecOptions::default(), streams).await?;

    assert_eq!(stdout.contents(), "");
    assert_eq!(stderr.contents(), "");
    Ok(())
}

#[tokio::test]
#[serial(debug_toggle)]
async fn debug_toggle_forces_echo() -> Result<()> {
    let _guard = EnvGuard::set(PLUGIN_DEBUG_ENV_VAR, "Yes");
    let (streams, stdout, stderr) = recording_streams(b"");
    let outcome =
        execute_with_streams(sh("echo out; echo err >&2")?, &ExecOptions::default(), streams).await?;

    assert_eq!(stdout.contents(), "out\n");
    assert_eq!(stderr.contents(), "err\n");
    assert_eq!(outcome.stdout, CapturedOutput::Lines(lines(&["out"])));
    Ok(())
}

#[tokio::test]
#[serial(debug_toggle)]
async fn debug_toggle_ignores_false_values() -> Result<()> {
    let _guard = EnvGuard::set(PLUGIN_DEBUG_ENV_VAR, "off");
    let (streams, stdout, _) = recording_streams(b"");
    execute_with_streams(sh("echo out")?, &ExecOptions::default(), streams).await?;

    assert_eq!(stdout.contents(), "");
    Ok(())
}

#[tokio::test]
async fn noisy_streams_are_echoed_and_captured() -> Result<()> {
    let (streams, stdout, stderr) = recording_streams(b"");
    let options = ExecOptions {
        noisy_stdout: true,
        noisy_stderr: true,
        ..Default::default()
    };
    let outcome =
        execute_with_streams(sh("echo out; echo err >&2; printf tail")?, &options, streams).await?;

    assert_eq!(stdout.contents(), "out\ntail");
    assert_eq!(stderr.contents(), "err\n");
    assert_eq!(outcome.stdout, CapturedOutput::Lines(lines(&["out", "tail"])));
    Ok(())
}

#[tokio::test]
async fn helper_protocol_hides_the_frame() -> Result<()> {
    let (streams, stdout, stderr) = recording_streams(b"");
    let options = ExecOptions {
        noisy_stdout: true,
        noisy_stderr: true,
        is_helper_protocol: true,
        ..Default::default()
    };
    let outcome = execute_with_streams(sh(HELPER_SCRIPT)?, &options, streams).await?;

    assert_eq!(stdout.contents(), "checking account\ndone\n");
    assert_eq!(stderr.contents(), "warning: slow disk\n");
    assert_eq!(
        outcome.stdout,
        CapturedOutput::Lines(lines(&[
            "checking account",
            "JSON_START",
            r#"{"error_code":"OK","value":null,"error_message":null}"#,
            "JSON_END",
            "done",
        ]))
    );
    Ok(())
}

#[tokio::test]
async fn broken_caller_stream_disables_echo_only() -> Result<()> {
    let stderr = SharedBuffer::default();
    let streams = CallerStreams::new(
        Box::new(tokio::io::empty()),
        Box::new(BrokenPipe),
        Box::new(stderr.clone()),
    );
    let options = ExecOptions {
        noisy_stdout: true,
        noisy_stderr: true,
        ..Default::default()
    };
    let outcome = execute_with_streams(
        sh("for i in 1 2 3 4 5 6; do echo line$i; done; echo err >&2")?,
        &options,
        streams,
    )
    .await?;

    assert_eq!(outcome.kind, OutcomeKind::Ok);
    assert_eq!(
        outcome.stdout,
        CapturedOutput::Lines(lines(&["line1", "line2", "line3", "line4", "line5", "line6"]))
    );
    assert_eq!(stderr.contents(), "err\n");
    Ok(())
}
