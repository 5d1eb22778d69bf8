use std::io::Cursor;
use std::time::Duration;

use anyhow::Result;
use bastion_exec::CallerStreams;
use bastion_exec::CapturedOutput;
use bastion_exec::ExecOptions;
use bastion_exec::OutcomeKind;
use bastion_exec::execute_with_streams;
use pretty_assertions::assert_eq;

use super::support::SharedBuffer;
use super::support::lines;
use super::support::recording_streams;
use super::support::sh;

#[tokio::test]
async fn forwards_caller_stdin_until_eof() -> Result<()> {
    let (streams, _, _) = recording_streams(b"first line\nsecond line\nno newline");
    let options = ExecOptions {
        expects_stdin: true,
        ..Default::default()
    };
    // `cat` only exits once it sees EOF on its stdin.
    let outcome = execute_with_streams(sh("cat; echo eof-seen")?, &options, streams).await?;

    assert_eq!(outcome.kind, OutcomeKind::Ok);
    assert_eq!(
        outcome.stdout,
        CapturedOutput::Lines(lines(&["first line", "second line", "no newlineeof-seen"]))
    );
    Ok(())
}

#[tokio::test]
async fn stdin_is_not_forwarded_unless_requested() -> Result<()> {
    let (streams, _, _) = recording_streams(b"should not arrive\n");
    let outcome = execute_with_streams(sh("cat")?, &ExecOptions::default(), streams).await?;

    assert_eq!(outcome.stdout, CapturedOutput::Lines(Vec::new()));
    Ok(())
}

#[tokio::test]
async fn payload_is_written_then_stdin_closed() -> Result<()> {
    let (streams, _, _) = recording_streams(b"ignored caller input\n");
    let options = ExecOptions {
        expects_stdin: true,
        stdin_payload: Some(b"s3cr3t\n".to_vec()),
        ..Default::default()
    };
    let outcome = execute_with_streams(sh("read -r secret; echo \"got $secret\"; cat")?, &options, streams).await?;

    assert_eq!(outcome.stdout, CapturedOutput::Lines(lines(&["got s3cr3t"])));
    Ok(())
}

#[tokio::test]
async fn large_payload_does_not_deadlock_against_output() -> Result<()> {
    let (streams, _, _) = recording_streams(b"");
    let payload: Vec<u8> = (0..20_000).flat_map(|i| format!("{i}\n").into_bytes()).collect();
    let payload_len = payload.len() as u64;
    let options = ExecOptions {
        stdin_payload: Some(payload),
        ..Default::default()
    };
    let outcome = execute_with_streams(sh("cat")?, &options, streams).await?;

    assert_eq!(outcome.stdout_bytes, payload_len);
    assert_eq!(outcome.stdout.lines().len(), 20_000);
    assert_eq!(outcome.stdout.lines().last().map(String::as_str), Some("19999"));
    Ok(())
}

#[tokio::test]
async fn forwarded_stdin_waits_while_child_is_busy_writing() -> Result<()> {
    const OUTPUT_LEN: u64 = 2_000_000;
    let input = vec![b'x'; 4 * 1024 * 1024];
    let streams = CallerStreams::new(
        Box::new(Cursor::new(input)),
        Box::new(SharedBuffer::default()),
        Box::new(SharedBuffer::default()),
    );
    let options = ExecOptions {
        expects_stdin: true,
        ..Default::default()
    };
    // The child only starts reading its stdin after all of its output went out.
    let script = format!("head -c {OUTPUT_LEN} /dev/zero | tr '\\0' y; wc -c");
    let outcome = tokio::time::timeout(
        Duration::from_secs(60),
        execute_with_streams(sh(&script)?, &options, streams),
    )
    .await??;

    assert_eq!(outcome.kind, OutcomeKind::Ok);
    let captured = outcome.stdout.lines();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].matches('y').count() as u64, OUTPUT_LEN);
    // `wc` saw every forwarded byte.
    assert_eq!(captured[0].trim_start_matches('y').trim(), (4 * 1024 * 1024).to_string());
    Ok(())
}
