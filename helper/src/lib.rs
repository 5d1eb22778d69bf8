//! Running privileged helpers from a plugin.
//!
//! [`run_helper`] executes a helper command in full mode, lets its chatter
//! through to the caller and decodes the framed result it prints into a
//! [`BastionResult`]. [`HelperInvocation`] builds the `sudo` command line for a
//! named helper from a [`HelperConfig`].

mod cli;
mod config;
mod error;
mod invocation;
mod run;

pub use bastion_helper_protocol::BastionResult;
pub use cli::main_run_helper;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::DEFAULT_CONFIG_PATH;
pub use config::HelperConfig;
pub use error::HelperError;
pub use invocation::HelperInvocation;
pub use invocation::ROOT_ACCOUNT;
pub use run::HelperOptions;
pub use run::run_helper;
pub use run::run_helper_with_streams;
