//! JPEG 2000 codestream syntax (Part 1, ISO/IEC 15444-1), header side only.
//!
//! - `marker_code`: marker code table.
//! - `parser`: main-header walk (SIZ, COD, CAP).
//! - `jp2`: JP2 container unwrapping.

pub mod jp2;
pub mod marker_code;
pub mod parser;

use crate::error::{PerfError, Result};
use jp2::Jp2Reader;

/// Returns the raw codestream inside `data`, unwrapping a JP2 container when
/// present.
pub fn locate_codestream(data: &[u8]) -> Result<&[u8]> {
    if data.starts_with(&[0xFF, 0x4F]) {
        return Ok(data);
    }
    if Jp2Reader::is_jp2(data) {
        return Jp2Reader::new(data)
            .find_codestream()?
            .ok_or(PerfError::MalformedCodestream("JP2 file has no jp2c box"));
    }
    Err(PerfError::NotACodestream)
}
