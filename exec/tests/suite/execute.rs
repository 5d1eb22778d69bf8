use anyhow::Result;
use bastion_exec::CapturedOutput;
use bastion_exec::CommandVector;
use bastion_exec::ExecError;
use bastion_exec::ExecOptions;
use bastion_exec::OutcomeKind;
use bastion_exec::TrustedArg;
use bastion_exec::execute_with_streams;
use pretty_assertions::assert_eq;

use super::support::lines;
use super::support::recording_streams;
use super::support::sh;

#[tokio::test]
async fn captures_stdout_and_stderr_separately() -> Result<()> {
    let (streams, _, _) = recording_streams(b"");
    let outcome = execute_with_streams(
        sh("echo one; echo err1 >&2; echo two; printf partial")?,
        &ExecOptions::default(),
        streams,
    )
    .await?;

    assert_eq!(outcome.kind, OutcomeKind::Ok);
    assert_eq!(outcome.status, Some(0));
    assert_eq!(outcome.stdout, CapturedOutput::Lines(lines(&["one", "two", "partial"])));
    assert_eq!(outcome.stderr, CapturedOutput::Lines(lines(&["err1"])));
    assert_eq!(outcome.stdout_bytes, 15);
    assert_eq!(outcome.stderr_bytes, 5);
    assert!(!outcome.stdout_capped);
    Ok(())
}

#[tokio::test]
async fn exit_codes_map_to_kinds() -> Result<()> {
    for code in [0, 1, 2, 42, 127, 255] {
        for must_succeed in [false, true] {
            let (streams, _, _) = recording_streams(b"");
            let options = ExecOptions {
                must_succeed,
                ..Default::default()
            };
            let outcome = execute_with_streams(sh(&format!("exit {code}"))?, &options, streams).await?;

            let expected = match (code, must_succeed) {
                (0, _) => OutcomeKind::Ok,
                (_, false) => OutcomeKind::OkNonZeroExit,
                (_, true) => OutcomeKind::ErrNonZeroExit,
            };
            assert_eq!(outcome.kind, expected, "exit {code}, must_succeed={must_succeed}");
            assert_eq!(outcome.status, Some(code));
            assert_eq!(outcome.signal, None);
            assert!(!outcome.coredump);
        }
    }
    Ok(())
}

#[tokio::test]
async fn signals_are_reported_by_name() -> Result<()> {
    for (signal, name) in [("TERM", "SIGTERM"), ("KILL", "SIGKILL"), ("USR1", "SIGUSR1")] {
        let (streams, _, _) = recording_streams(b"");
        let outcome = execute_with_streams(
            sh(&format!("kill -{signal} $$"))?,
            &ExecOptions::default(),
            streams,
        )
        .await?;

        assert_eq!(outcome.signal.as_deref(), Some(name));
        assert_eq!(outcome.status, None);
        assert!(!outcome.coredump);
        assert_eq!(outcome.kind, OutcomeKind::OkNonZeroExit);
    }
    Ok(())
}

#[tokio::test]
async fn missing_executable_fails_to_spawn() -> Result<()> {
    let (streams, _, _) = recording_streams(b"");
    let command = CommandVector::new(TrustedArg::from_static("/nonexistent/bastion-helper"))?;
    let result = execute_with_streams(command, &ExecOptions::default(), streams).await;

    match result {
        Err(err @ ExecError::Spawn { .. }) => {
            assert_eq!(err.kind(), OutcomeKind::ErrExecFailed);
            assert!(
                err.to_string().contains("/nonexistent/bastion-helper"),
                "{err}"
            );
        }
        other => panic!("expected a spawn failure, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn binary_mode_only_counts_bytes() -> Result<()> {
    let (streams, stdout, _) = recording_streams(b"");
    let options = ExecOptions {
        is_binary: true,
        noisy_stdout: true,
        ..Default::default()
    };
    let outcome = execute_with_streams(sh("head -c 200000 /dev/zero")?, &options, streams).await?;

    assert_eq!(outcome.kind, OutcomeKind::Ok);
    assert_eq!(outcome.stdout, CapturedOutput::Discarded);
    assert_eq!(outcome.stderr, CapturedOutput::Discarded);
    assert_eq!(outcome.stdout_bytes, 200_000);
    assert_eq!(stdout.contents(), "");
    Ok(())
}

#[tokio::test]
async fn simple_spawn_mode_reports_status_only() -> Result<()> {
    let (streams, stdout, _) = recording_streams(b"");
    let options = ExecOptions {
        use_simple_spawn_mode: true,
        ..Default::default()
    };
    let outcome = execute_with_streams(sh("exit 3")?, &options, streams).await?;

    assert_eq!(outcome.kind, OutcomeKind::Ok);
    assert_eq!(outcome.status, Some(3));
    assert_eq!(outcome.stdout, CapturedOutput::Discarded);
    assert_eq!(stdout.contents(), "");

    let (streams, _, _) = recording_streams(b"");
    let options = ExecOptions {
        use_simple_spawn_mode: true,
        must_succeed: true,
        ..Default::default()
    };
    let outcome = execute_with_streams(sh("exit 3")?, &options, streams).await?;
    assert_eq!(outcome.kind, OutcomeKind::ErrNonZeroExit);
    Ok(())
}
