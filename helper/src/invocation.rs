use std::sync::LazyLock;

use bastion_exec::CommandVector;
use bastion_exec::TrustedArg;
use bastion_exec::UntrustedArgument;
use regex_lite::Regex;

use crate::config::HelperConfig;

/// Account a helper runs as unless told otherwise. `sudo` needs no `-u` for it.
pub const ROOT_ACCOUNT: &str = "root";

static ACCOUNT_REGEX: LazyLock<Regex> = LazyLock::new(|| compile_regex(r"^[A-Za-z0-9._-]{1,32}$"));
static HELPER_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"^[A-Za-z0-9][A-Za-z0-9_-]*$"));

fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        // Patterns are literals covered by the tests below.
        Err(err) => panic!("invalid regex pattern `{pattern}`: {err}"),
    }
}

/// A named helper to run through `sudo`, with untrusted arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperInvocation {
    pub run_as: String,
    pub helper: String,
    pub args: Vec<String>,
}

impl HelperInvocation {
    pub fn new(helper: impl Into<String>) -> Self {
        Self {
            run_as: ROOT_ACCOUNT.to_string(),
            helper: helper.into(),
            args: Vec::new(),
        }
    }

    pub fn run_as(mut self, account: impl Into<String>) -> Self {
        self.run_as = account.into();
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `<sudo> -n [-u <account>] -- <helpers_dir>/<helper> <args...>`
    pub fn build_command(&self, config: &HelperConfig) -> Result<CommandVector, UntrustedArgument> {
        let helper = TrustedArg::sanitize_with(self.helper.as_str(), check_helper_name)?;
        let helper_path = config.helpers_dir.join(helper.as_str());

        let mut command = CommandVector::new(TrustedArg::sanitize(
            config.sudo_path.to_string_lossy().into_owned(),
        )?)?
        .arg(TrustedArg::from_static("-n"));
        if self.run_as != ROOT_ACCOUNT {
            command = command
                .arg(TrustedArg::from_static("-u"))
                .arg(TrustedArg::sanitize_with(self.run_as.as_str(), check_account)?);
        }
        let args = self
            .args
            .iter()
            .map(|arg| TrustedArg::sanitize(arg.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(command
            .arg(TrustedArg::from_static("--"))
            .arg(TrustedArg::sanitize(
                helper_path.to_string_lossy().into_owned(),
            )?)
            .args(args))
    }
}

fn check_account(account: &str) -> Result<(), String> {
    if account.starts_with('-') || !ACCOUNT_REGEX.is_match(account) {
        return Err("invalid account name".to_string());
    }
    Ok(())
}

fn check_helper_name(helper: &str) -> Result<(), String> {
    if !HELPER_NAME_REGEX.is_match(helper) {
        return Err("invalid helper name".to_string());
    }
    Ok(())
}
