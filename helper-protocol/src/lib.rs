//! Wire protocol spoken by privileged helpers.
//!
//! A helper writes free-form lines to stdout and, somewhere among them, a
//! single structured result wrapped in sentinel lines:
//!
//! ```text
//! some debug output
//! JSON_START
//! {"error_code":"OK","value":{"account":"alice"},"error_message":null}
//! JSON_END
//! ```
//!
//! The caller side scans the captured lines with [`FrameScanner`] and turns the
//! last completed frame into a [`BastionResult`], the same type plugins use to
//! pass results around in process.

mod emit;
mod frame;
mod result;

pub use emit::write_frame;
pub use frame::FRAME_END;
pub use frame::FRAME_START;
pub use frame::FrameScanner;
pub use frame::LineClass;
pub use frame::ProtocolError;
pub use frame::decode_frame;
pub use frame::decode_result;
pub use result::BastionResult;
pub use result::OK;
pub use result::StructuredPayload;
pub use result::unwrap_payload;
