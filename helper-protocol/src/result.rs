use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Code of a plain successful result.
pub const OK: &str = "OK";

/// The document carried inside a protocol frame.
///
/// Field names follow what helpers emit (`error_code`, `value`,
/// `error_message`); the short forms `code` and `msg` are accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredPayload {
    #[serde(alias = "code")]
    pub error_code: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, alias = "msg")]
    pub error_message: Option<String>,
}

/// Uniform result contract shared by helpers and plugins.
///
/// Codes beginning with `OK` are successes (`OK`, `OK_NO_CHANGE`, ...), codes
/// beginning with `ERR` are failures.
#[derive(Debug, Clone, PartialEq)]
pub struct BastionResult {
    pub code: String,
    pub value: Value,
    pub message: Option<String>,
}

impl BastionResult {
    pub fn new(code: impl Into<String>, value: Value, message: Option<String>) -> Self {
        Self {
            code: code.into(),
            value,
            message,
        }
    }

    pub fn ok(value: Value) -> Self {
        Self::new(OK, value, None)
    }

    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Value::Null, Some(message.into()))
    }

    pub fn is_ok(&self) -> bool {
        self.code.starts_with("OK")
    }

    pub fn is_err(&self) -> bool {
        self.code.starts_with("ERR")
    }

    /// Message to show a human, falling back to the code.
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.code)
    }

    pub fn to_payload(&self) -> StructuredPayload {
        StructuredPayload {
            error_code: self.code.clone(),
            value: self.value.clone(),
            error_message: self.message.clone(),
        }
    }
}

impl fmt::Display for BastionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.code),
            None => f.write_str(&self.code),
        }
    }
}

impl From<BastionResult> for StructuredPayload {
    fn from(result: BastionResult) -> Self {
        StructuredPayload {
            error_code: result.code,
            value: result.value,
            error_message: result.message,
        }
    }
}

/// Turns a decoded frame into the in-process result. Never fails.
pub fn unwrap_payload(payload: StructuredPayload) -> BastionResult {
    let StructuredPayload {
        error_code,
        value,
        error_message,
    } = payload;
    BastionResult {
        code: error_code,
        value,
        message: error_message,
    }
}
