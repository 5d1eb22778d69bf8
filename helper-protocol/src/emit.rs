use std::io;
use std::io::Write;

use crate::frame::FRAME_END;
use crate::frame::FRAME_START;
use crate::result::BastionResult;

/// Helper side of the protocol: print `result` as a frame on `writer`.
///
/// The document is written on a single line so it can never be mistaken for
/// a sentinel.
pub fn write_frame<W: Write>(writer: &mut W, result: &BastionResult) -> io::Result<()> {
    let document = serde_json::to_string(&result.to_payload())?;
    writeln!(writer, "{FRAME_START}")?;
    writeln!(writer, "{document}")?;
    writeln!(writer, "{FRAME_END}")?;
    writer.flush()
}
