//! Privileged subprocess execution for bastion plugins.
//!
//! Plugins never touch privileged state themselves: they run a helper as a
//! child process (usually through `sudo`) and read back its output. This crate
//! owns that child process. [`execute`] spawns it with separate pipes and
//! multiplexes the child's stdout/stderr with the caller's own streams,
//! capturing lines while optionally echoing them live; [`execute_simple`] is
//! the cheap variant for non-interactive commands. Either way the wait status
//! is decoded into an [`ExecOutcome`].
//!
//! Only a [`CommandVector`] built from [`TrustedArg`]s can be executed, so an
//! argument that skipped validation cannot reach a child process.

#[cfg(not(unix))]
compile_error!("bastion-exec only supports Unix platforms");

mod command;
mod error;
pub mod exit_status;
mod mux;
mod options;
mod outcome;
mod simple;
mod spawn;

pub use command::CommandVector;
pub use command::TrustedArg;
pub use command::UntrustedArgument;
pub use error::ExecError;
pub use exit_status::ExitStatusInfo;
pub use exit_status::decode_wait_status;
pub use mux::CallerStreams;
pub use options::ExecOptions;
pub use options::PLUGIN_DEBUG_ENV_VAR;
pub use outcome::CapturedOutput;
pub use outcome::ExecOutcome;
pub use outcome::OutcomeKind;
pub use simple::execute_simple;
pub use spawn::execute;
pub use spawn::execute_with_streams;
