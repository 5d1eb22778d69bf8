use std::ffi::OsStr;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UntrustedArgument {
    #[error("argument contains a NUL byte: {0:?}")]
    NulByte(String),
    #[error("program must not be empty")]
    EmptyProgram,
    #[error("{reason}: {value:?}")]
    Rejected { value: String, reason: String },
}

/// A command-line token that went through validation.
///
/// There is no `From<String>`: the only ways to get one are
/// [`TrustedArg::sanitize`], [`TrustedArg::sanitize_with`] and
/// [`TrustedArg::from_static`] for literals written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrustedArg(String);

impl TrustedArg {
    /// Accepts any string without interior NUL bytes, which `execve(2)` would
    /// silently truncate.
    pub fn sanitize(value: impl Into<String>) -> Result<Self, UntrustedArgument> {
        let value = value.into();
        if value.contains('\0') {
            return Err(UntrustedArgument::NulByte(value));
        }
        Ok(Self(value))
    }

    /// Like [`TrustedArg::sanitize`], with an extra caller-supplied check that
    /// returns the rejection reason.
    pub fn sanitize_with<F>(value: impl Into<String>, check: F) -> Result<Self, UntrustedArgument>
    where
        F: FnOnce(&str) -> Result<(), String>,
    {
        let arg = Self::sanitize(value)?;
        match check(&arg.0) {
            Ok(()) => Ok(arg),
            Err(reason) => Err(UntrustedArgument::Rejected { value: arg.0, reason }),
        }
    }

    /// Literals are part of the program, not input.
    ///
    /// Panics if the literal contains a NUL byte.
    pub fn from_static(value: &'static str) -> Self {
        assert!(
            !value.contains('\0'),
            "static command argument contains a NUL byte: {value:?}"
        );
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TrustedArg {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<OsStr> for TrustedArg {
    fn as_ref(&self) -> &OsStr {
        OsStr::new(&self.0)
    }
}

impl fmt::Display for TrustedArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Program plus arguments, ready to be handed to the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandVector {
    program: TrustedArg,
    args: Vec<TrustedArg>,
}

impl CommandVector {
    pub fn new(program: TrustedArg) -> Result<Self, UntrustedArgument> {
        if program.as_str().is_empty() {
            return Err(UntrustedArgument::EmptyProgram);
        }
        Ok(Self {
            program,
            args: Vec::new(),
        })
    }

    /// Build from raw strings, sanitizing each one.
    pub fn from_argv<I, S>(argv: I) -> Result<Self, UntrustedArgument>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter();
        let program = argv.next().ok_or(UntrustedArgument::EmptyProgram)?;
        let mut command = Self::new(TrustedArg::sanitize(program)?)?;
        for arg in argv {
            command.args.push(TrustedArg::sanitize(arg)?);
        }
        Ok(command)
    }

    pub fn arg(mut self, arg: TrustedArg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = TrustedArg>,
    {
        self.args.extend(args);
        self
    }

    pub fn program(&self) -> &TrustedArg {
        &self.program
    }

    pub fn arguments(&self) -> &[TrustedArg] {
        &self.args
    }
}

impl fmt::Display for CommandVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
