//! Moves bytes between a running child and the caller.
//!
//! A single task waits on whichever of the child's stdout, the child's stderr
//! and (when forwarding) the caller's stdin is ready, so a chatty stream can
//! never block the others. Writes to the child's stdin go through a separate
//! writer task fed by a channel, which keeps a child that is slow to read its
//! input from stalling the draining of its output. When that channel is full,
//! at most one chunk of caller stdin is held back and reading caller stdin
//! pauses until the chunk fits; the child's output keeps being drained.
//!
//! In line mode every byte is looked at individually: a `\n` completes the
//! pending line of that stream. This keeps live echo, the stdout byte cap and
//! frame detection exact at line granularity.

use std::io;

use bastion_helper_protocol::FrameScanner;
use bastion_helper_protocol::LineClass;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStderr;
use tokio::process::ChildStdin;
use tokio::process::ChildStdout;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::warn;

use crate::options::ExecOptions;
use crate::outcome::Captured;
use crate::outcome::CapturedOutput;

const LINE_READ_SIZE: usize = 4_096;
const BINARY_READ_SIZE: usize = 65_536;
const STDIN_CHANNEL_CAPACITY: usize = 128;
/// Per execution, further I/O errors are dropped.
const MAX_LOGGED_ERRORS: usize = 3;

pub type CallerReader = Box<dyn AsyncRead + Send + Unpin>;
pub type CallerWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// The invoking side of the standard streams.
pub struct CallerStreams {
    pub stdin: CallerReader,
    pub stdout: CallerWriter,
    pub stderr: CallerWriter,
}

impl CallerStreams {
    pub fn new(stdin: CallerReader, stdout: CallerWriter, stderr: CallerWriter) -> Self {
        Self {
            stdin,
            stdout,
            stderr,
        }
    }

    /// This process's own stdin, stdout and stderr.
    pub fn inherit() -> Self {
        Self::new(
            Box::new(tokio::io::stdin()),
            Box::new(tokio::io::stdout()),
            Box::new(tokio::io::stderr()),
        )
    }
}

/// Pipes taken from a freshly spawned child.
pub(crate) struct ChildPipes {
    pub(crate) stdin: Option<ChildStdin>,
    pub(crate) stdout: Option<ChildStdout>,
    pub(crate) stderr: Option<ChildStderr>,
}

/// Rate limit for error logs within one execution.
struct ErrorBudget {
    remaining: usize,
}

impl ErrorBudget {
    fn new() -> Self {
        Self {
            remaining: MAX_LOGGED_ERRORS,
        }
    }

    fn report(&mut self, what: &str, err: &io::Error) {
        match self.remaining {
            0 => {}
            1 => {
                self.remaining = 0;
                warn!("{what}: {err} (further errors for this command are not logged)");
            }
            _ => {
                self.remaining -= 1;
                warn!("{what}: {err}");
            }
        }
    }
}

/// Live copy of a child stream to one of the caller's streams.
struct Echo {
    writer: CallerWriter,
    enabled: bool,
    name: &'static str,
}

impl Echo {
    async fn write(&mut self, bytes: &[u8], budget: &mut ErrorBudget) {
        if !self.enabled || bytes.is_empty() {
            return;
        }
        if let Err(err) = write_and_flush(&mut self.writer, bytes).await {
            // The caller's side went away; keep capturing, stop echoing.
            self.enabled = false;
            budget.report(&format!("failed to echo child output to {}", self.name), &err);
        }
    }
}

async fn write_and_flush(writer: &mut CallerWriter, bytes: &[u8]) -> io::Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await
}

/// Capture state of one child output stream.
struct OutputStream {
    echo: Echo,
    binary: bool,
    /// Present in helper protocol mode: echo whole lines, skipping frames.
    frames: Option<FrameScanner>,
    lines: Vec<String>,
    pending: Vec<u8>,
    bytes: u64,
}

impl OutputStream {
    fn new(echo: Echo, binary: bool, frames: Option<FrameScanner>) -> Self {
        Self {
            echo,
            binary,
            frames,
            lines: Vec::new(),
            pending: Vec::new(),
            bytes: 0,
        }
    }

    /// Record a chunk read from the child. Returns true once `limit` is
    /// reached; bytes past the limit are dropped.
    async fn ingest(&mut self, chunk: &[u8], limit: Option<u64>, budget: &mut ErrorBudget) -> bool {
        let accepted = match limit {
            Some(limit) => {
                let room = usize::try_from(limit.saturating_sub(self.bytes)).unwrap_or(usize::MAX);
                &chunk[..chunk.len().min(room)]
            }
            None => chunk,
        };
        self.bytes += accepted.len() as u64;
        let capped = limit.is_some_and(|limit| self.bytes >= limit);

        if self.binary {
            return capped;
        }

        if self.frames.is_none() {
            self.echo.write(accepted, budget).await;
        }
        for &byte in accepted {
            if byte == b'\n' {
                let line = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                self.complete_line(line, true, budget).await;
            } else {
                self.pending.push(byte);
            }
        }
        capped
    }

    async fn complete_line(&mut self, line: String, terminated: bool, budget: &mut ErrorBudget) {
        if let Some(frames) = self.frames.as_mut()
            && frames.push_line(&line) == LineClass::Passthrough
        {
            let mut echoed = line.clone().into_bytes();
            if terminated {
                echoed.push(b'\n');
            }
            self.echo.write(&echoed, budget).await;
        }
        self.lines.push(line);
    }

    /// Keep a trailing line that never got its terminator.
    async fn flush_partial(&mut self, budget: &mut ErrorBudget) {
        if self.binary || self.pending.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        self.complete_line(line, false, budget).await;
    }

    fn into_output(self) -> CapturedOutput {
        if self.binary {
            CapturedOutput::Discarded
        } else {
            CapturedOutput::Lines(self.lines)
        }
    }
}

fn spawn_stdin_writer(mut stdin: ChildStdin) -> (mpsc::Sender<Vec<u8>>, JoinHandle<()>) {
    let (writer_tx, mut writer_rx) = mpsc::channel::<Vec<u8>>(STDIN_CHANNEL_CAPACITY);
    let handle = tokio::spawn(async move {
        while let Some(bytes) = writer_rx.recv().await {
            if let Err(err) = stdin.write_all(&bytes).await {
                debug!("child stdin closed: {err}");
                break;
            }
        }
        // Dropping `stdin` here is what lets the child see EOF.
    });
    (writer_tx, handle)
}

/// Wait for room in the stdin channel, then queue the held back chunk.
/// Returns false once the writer is gone.
async fn send_pending(tx: &Option<mpsc::Sender<Vec<u8>>>, pending: &mut Option<Vec<u8>>) -> bool {
    let Some(tx) = tx else {
        return false;
    };
    match tx.reserve().await {
        Ok(permit) => {
            if let Some(chunk) = pending.take() {
                permit.send(chunk);
            }
            true
        }
        Err(_) => false,
    }
}

async fn read_from<R>(reader: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Run the I/O loop until the child closed both output streams or the stdout
/// cap fired. The child itself is left for the caller to wait on.
pub(crate) async fn pump(pipes: ChildPipes, caller: CallerStreams, options: &ExecOptions) -> Captured {
    let CallerStreams {
        stdin: caller_stdin,
        stdout: caller_stdout,
        stderr: caller_stderr,
    } = caller;
    let binary = options.is_binary;
    let mut budget = ErrorBudget::new();

    let mut stdout_capture = OutputStream::new(
        Echo {
            writer: caller_stdout,
            enabled: options.noisy_stdout && !binary,
            name: "stdout",
        },
        binary,
        (options.is_helper_protocol && !binary).then(FrameScanner::new),
    );
    let mut stderr_capture = OutputStream::new(
        Echo {
            writer: caller_stderr,
            enabled: options.noisy_stderr && !binary,
            name: "stderr",
        },
        binary,
        None,
    );

    let (mut stdin_tx, writer_handle) = match pipes.stdin {
        Some(stdin) => {
            let (tx, handle) = spawn_stdin_writer(stdin);
            (Some(tx), Some(handle))
        }
        None => (None, None),
    };
    if let Some(payload) = options.stdin_payload.as_ref()
        && let Some(tx) = stdin_tx.take()
        && tx.send(payload.clone()).await.is_err()
    {
        debug!("child stdin closed before the payload was written");
    }
    let mut caller_stdin = options.forwards_stdin().then_some(caller_stdin);
    let mut stdin_pending: Option<Vec<u8>> = None;

    let read_size = if binary { BINARY_READ_SIZE } else { LINE_READ_SIZE };
    let mut out_buf = vec![0u8; read_size];
    let mut err_buf = vec![0u8; read_size];
    let mut in_buf = vec![0u8; LINE_READ_SIZE];
    let mut child_stdout = pipes.stdout;
    let mut child_stderr = pipes.stderr;
    let mut capped = false;

    while child_stdout.is_some() || child_stderr.is_some() {
        tokio::select! {
            read = read_from(&mut child_stdout, &mut out_buf) => match read {
                Ok(0) => child_stdout = None,
                Ok(n) => {
                    if stdout_capture.ingest(&out_buf[..n], options.max_stdout_bytes, &mut budget).await {
                        capped = true;
                        break;
                    }
                }
                Err(e) => {
                    budget.report("failed to read child stdout", &e);
                    child_stdout = None;
                }
            },
            read = read_from(&mut child_stderr, &mut err_buf) => match read {
                Ok(0) => child_stderr = None,
                Ok(n) => {
                    stderr_capture.ingest(&err_buf[..n], None, &mut budget).await;
                }
                Err(e) => {
                    budget.report("failed to read child stderr", &e);
                    child_stderr = None;
                }
            },
            sent = send_pending(&stdin_tx, &mut stdin_pending), if stdin_pending.is_some() => {
                if !sent {
                    debug!("child stdin closed, no longer forwarding caller stdin");
                    stdin_pending = None;
                    caller_stdin = None;
                    stdin_tx = None;
                }
            },
            read = read_from(&mut caller_stdin, &mut in_buf), if stdin_pending.is_none() => match read {
                Ok(0) => {
                    // Caller EOF: the child gets EOF once queued bytes are written.
                    caller_stdin = None;
                    stdin_tx = None;
                }
                Ok(n) => {
                    let chunk = in_buf[..n].to_vec();
                    let sent = match stdin_tx.as_ref() {
                        Some(tx) => tx.try_send(chunk),
                        None => Err(TrySendError::Closed(chunk)),
                    };
                    match sent {
                        Ok(()) => {}
                        // Parked until the writer catches up; caller stdin is not
                        // read meanwhile, child output still is.
                        Err(TrySendError::Full(chunk)) => stdin_pending = Some(chunk),
                        Err(TrySendError::Closed(_)) => {
                            debug!("child stdin closed, no longer forwarding caller stdin");
                            caller_stdin = None;
                            stdin_tx = None;
                        }
                    }
                }
                Err(e) => {
                    budget.report("failed to read caller stdin", &e);
                    caller_stdin = None;
                    stdin_tx = None;
                }
            },
        }
    }

    if capped {
        debug!(
            "stdout reached {} bytes, closing all pipes",
            options.max_stdout_bytes.unwrap_or_default()
        );
        drop(child_stdout);
        drop(child_stderr);
        drop(caller_stdin);
        drop(stdin_pending);
        drop(stdin_tx);
        if let Some(handle) = writer_handle.as_ref() {
            handle.abort();
        }
    }

    stdout_capture.flush_partial(&mut budget).await;
    stderr_capture.flush_partial(&mut budget).await;

    let stdout_bytes = stdout_capture.bytes;
    let stderr_bytes = stderr_capture.bytes;
    Captured {
        stdout: stdout_capture.into_output(),
        stderr: stderr_capture.into_output(),
        stdout_bytes,
        stderr_bytes,
        stdout_capped: capped,
    }
}
