//! Decoding of raw `wait(2)` status values.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Signals known to this platform, by number. Built on first use and never
/// modified afterwards.
static SIGNAL_NAMES: LazyLock<HashMap<i32, &'static str>> = LazyLock::new(|| {
    let mut names: HashMap<i32, &'static str> = PORTABLE_SIGNALS.iter().copied().collect();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        names.insert(libc::SIGSTKFLT, "SIGSTKFLT");
        names.insert(libc::SIGPWR, "SIGPWR");
    }
    #[cfg(any(target_os = "macos", target_os = "freebsd"))]
    {
        names.insert(libc::SIGEMT, "SIGEMT");
        names.insert(libc::SIGINFO, "SIGINFO");
    }
    names
});

const PORTABLE_SIGNALS: &[(libc::c_int, &str)] = &[
    (libc::SIGHUP, "SIGHUP"),
    (libc::SIGINT, "SIGINT"),
    (libc::SIGQUIT, "SIGQUIT"),
    (libc::SIGILL, "SIGILL"),
    (libc::SIGTRAP, "SIGTRAP"),
    (libc::SIGABRT, "SIGABRT"),
    (libc::SIGBUS, "SIGBUS"),
    (libc::SIGFPE, "SIGFPE"),
    (libc::SIGKILL, "SIGKILL"),
    (libc::SIGUSR1, "SIGUSR1"),
    (libc::SIGSEGV, "SIGSEGV"),
    (libc::SIGUSR2, "SIGUSR2"),
    (libc::SIGPIPE, "SIGPIPE"),
    (libc::SIGALRM, "SIGALRM"),
    (libc::SIGTERM, "SIGTERM"),
    (libc::SIGCHLD, "SIGCHLD"),
    (libc::SIGCONT, "SIGCONT"),
    (libc::SIGSTOP, "SIGSTOP"),
    (libc::SIGTSTP, "SIGTSTP"),
    (libc::SIGTTIN, "SIGTTIN"),
    (libc::SIGTTOU, "SIGTTOU"),
    (libc::SIGURG, "SIGURG"),
    (libc::SIGXCPU, "SIGXCPU"),
    (libc::SIGXFSZ, "SIGXFSZ"),
    (libc::SIGVTALRM, "SIGVTALRM"),
    (libc::SIGPROF, "SIGPROF"),
    (libc::SIGWINCH, "SIGWINCH"),
    (libc::SIGIO, "SIGIO"),
    (libc::SIGSYS, "SIGSYS"),
];

/// Everything a raw wait status tells about how a child ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitStatusInfo {
    /// Exit code, when the child exited normally.
    pub status: Option<i32>,
    /// Symbolic signal name, when the child was killed by a signal.
    pub signal: Option<String>,
    pub coredump: bool,
    pub message: String,
}

/// Symbolic name for `number`, or the number itself when unknown.
pub fn signal_name(number: i32) -> String {
    SIGNAL_NAMES
        .get(&number)
        .map_or_else(|| number.to_string(), |name| (*name).to_string())
}

/// Decode a raw wait status.
///
/// `-1` means waiting for the child failed; the result then carries only a
/// message.
pub fn decode_wait_status(raw: i32) -> ExitStatusInfo {
    if raw == -1 {
        return ExitStatusInfo {
            status: None,
            signal: None,
            coredump: false,
            message: "could not wait for the child process, its status is unknown".to_string(),
        };
    }

    let signal_number = raw & 0x7f;
    if signal_number != 0 {
        let coredump = raw & 0x80 != 0;
        let signal = signal_name(signal_number);
        let message = if coredump {
            format!("killed by signal {signal} ({signal_number}), core dumped")
        } else {
            format!("killed by signal {signal} ({signal_number})")
        };
        return ExitStatusInfo {
            status: None,
            signal: Some(signal),
            coredump,
            message,
        };
    }

    let status = (raw >> 8) & 0xff;
    ExitStatusInfo {
        status: Some(status),
        signal: None,
        coredump: false,
        message: format!("exited with status {status}"),
    }
}
