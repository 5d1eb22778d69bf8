/// When set to a true-ish value (`1`, `true`, `yes`, `on`), every execution
/// echoes the child's stdout and stderr, whatever the caller asked for.
pub const PLUGIN_DEBUG_ENV_VAR: &str = "BASTION_PLUGIN_DEBUG";

/// How a child process is run and how its streams are handled.
///
/// All flags default to off. They combine freely, except that
/// `stdin_payload` wins over `expects_stdin`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Forward the caller's stdin to the child until the caller hits EOF.
    pub expects_stdin: bool,
    /// Echo the child's stdout to the caller's stdout while capturing it.
    pub noisy_stdout: bool,
    /// Echo the child's stderr to the caller's stderr while capturing it.
    pub noisy_stderr: bool,
    /// The child speaks the helper protocol: never echo its framed result.
    pub is_helper_protocol: bool,
    /// Raw copy mode: large reads, no line framing, no echo, output dropped.
    pub is_binary: bool,
    /// Bytes written to the child's stdin, which is then closed.
    pub stdin_payload: Option<Vec<u8>>,
    /// Report a non-zero exit as an error outcome.
    pub must_succeed: bool,
    /// Stop reading and close every pipe once stdout produced this many bytes.
    pub max_stdout_bytes: Option<u64>,
    /// Run the child with the caller's stdio inherited and only report its
    /// status.
    pub use_simple_spawn_mode: bool,
}

impl ExecOptions {
    /// Options with the debug environment toggle applied.
    pub(crate) fn resolve(&self) -> Self {
        let debug = std::env::var(PLUGIN_DEBUG_ENV_VAR).ok();
        self.clone().with_debug_override(debug.as_deref())
    }

    fn with_debug_override(mut self, debug: Option<&str>) -> Self {
        if debug.is_some_and(is_truthy) {
            self.noisy_stdout = true;
            self.noisy_stderr = true;
        }
        self
    }

    pub(crate) fn forwards_stdin(&self) -> bool {
        self.expects_stdin && self.stdin_payload.is_none()
    }

    pub(crate) fn needs_stdin_pipe(&self) -> bool {
        self.expects_stdin || self.stdin_payload.is_some()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
