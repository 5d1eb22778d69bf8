//! Line-based frame scanning for helper stdout.
//!
//! A frame starts with a line that is exactly [`FRAME_START`] and ends with a
//! line that is exactly [`FRAME_END`]. Lines are compared verbatim: there is no
//! escaping, so a helper printing a sentinel as debug output will confuse the
//! scanner. Helpers ship with the bastion and are expected not to do that.

use thiserror::Error;

use crate::result::BastionResult;
use crate::result::StructuredPayload;
use crate::result::unwrap_payload;

pub const FRAME_START: &str = "JSON_START";
pub const FRAME_END: &str = "JSON_END";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("helper returned no structured result")]
    Empty,
    #[error("helper returned an invalid structured result: {0}")]
    Invalid(String),
}

/// Where a scanned line belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Free-form output around frames.
    Passthrough,
    /// A sentinel or a line inside a frame.
    Frame,
}

/// Stateful scanner that splits helper output into free-form lines and
/// frame bodies.
///
/// How it works:
/// - A start sentinel always (re)opens a frame: any body collected so far is
///   dropped, and so is an earlier completed frame. The most recently started
///   frame is the only one that can produce a payload.
/// - An end sentinel inside a frame closes it and records its body.
/// - An end sentinel outside a frame is ordinary output.
#[derive(Debug, Default)]
pub struct FrameScanner {
    inside: bool,
    body: Vec<String>,
    completed: Option<String>,
}

impl FrameScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its terminator).
    pub fn push_line(&mut self, line: &str) -> LineClass {
        if line == FRAME_START {
            self.inside = true;
            self.body.clear();
            self.completed = None;
            return LineClass::Frame;
        }

        if !self.inside {
            return LineClass::Passthrough;
        }

        if line == FRAME_END {
            self.inside = false;
            self.completed = Some(std::mem::take(&mut self.body).join("\n"));
        } else {
            self.body.push(line.to_string());
        }
        LineClass::Frame
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// Body of the current frame, if it was closed.
    pub fn finish(self) -> Option<String> {
        self.completed
    }
}

/// Scan captured stdout lines and parse the current frame.
///
/// A caller holding a single string passes it as a one-element sequence.
pub fn decode_frame<I, S>(lines: I) -> Result<StructuredPayload, ProtocolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scanner = FrameScanner::new();
    for line in lines {
        scanner.push_line(line.as_ref());
    }
    let body = scanner.finish().ok_or(ProtocolError::Empty)?;
    serde_json::from_str(&body).map_err(|err| ProtocolError::Invalid(err.to_string()))
}

/// [`decode_frame`] followed by [`unwrap_payload`].
pub fn decode_result<I, S>(lines: I) -> Result<BastionResult, ProtocolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    decode_frame(lines).map(unwrap_payload)
}
