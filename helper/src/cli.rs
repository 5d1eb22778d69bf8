use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::HelperConfig;
use crate::error::HelperError;
use crate::invocation::HelperInvocation;
use crate::run::HelperOptions;
use crate::run::run_helper;

/// Run a privileged helper and print the result it reports as JSON.
#[derive(Debug, Parser)]
#[clap(version)]
struct RunHelperCli {
    /// Config file. Defaults to $BASTION_HELPER_CONFIG, then
    /// /etc/bastion/helper.toml when it exists.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Account the helper runs as.
    #[arg(long = "as", value_name = "ACCOUNT")]
    run_as: Option<String>,

    /// Forward this process's stdin to the helper.
    #[arg(long)]
    stdin: bool,

    /// Close the helper's pipes once its stdout reached this many bytes.
    #[arg(long, value_name = "N")]
    max_stdout_bytes: Option<u64>,

    /// Helper name, relative to the configured helpers directory.
    helper: String,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
pub async fn main_run_helper() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = RunHelperCli::parse();
    let exit_code = run(cli).await?;
    // Exit right away: a forwarded stdin may still be parked in a blocking
    // read that would hold up runtime shutdown.
    std::process::exit(exit_code);
}

async fn run(cli: RunHelperCli) -> anyhow::Result<i32> {
    let config = HelperConfig::discover(cli.config.as_deref()).context("failed to load helper config")?;

    let mut invocation = HelperInvocation::new(cli.helper).args(cli.args);
    if let Some(account) = cli.run_as {
        invocation = invocation.run_as(account);
    }
    let command = invocation
        .build_command(&config)
        .context("refusing to build helper command")?;

    let options = HelperOptions {
        expects_stdin: cli.stdin,
        stdin_payload: None,
        max_stdout_bytes: cli.max_stdout_bytes.or(config.max_stdout_bytes),
    };
    let result = run_helper(command, options)
        .await
        .unwrap_or_else(HelperError::into_result);

    println!("{}", serde_json::to_string_pretty(&result.to_payload())?);
    Ok(if result.is_ok() { 0 } else { 1 })
}
