//! JP2 box structure (ISO/IEC 15444-1 Annex I), just enough to reach the
//! contiguous codestream box.

use crate::error::{PerfError, Result};

const JP2_SIGNATURE: &[u8; 12] = b"\x00\x00\x00\x0CjP  \r\n\x87\n";

pub struct Jp2Box {
    pub box_type: [u8; 4],
    pub data_range: std::ops::Range<usize>,
}

pub struct Jp2Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Jp2Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn is_jp2(data: &[u8]) -> bool {
        data.len() >= JP2_SIGNATURE.len() && &data[..JP2_SIGNATURE.len()] == JP2_SIGNATURE
    }

    /// Returns the payload of the first `jp2c` box, or `None` when the data
    /// is not a JP2 file or carries no codestream box.
    pub fn find_codestream(&mut self) -> Result<Option<&'a [u8]>> {
        if !Self::is_jp2(self.data) {
            return Ok(None);
        }
        self.position = 0;
        while let Some(b) = self.read_box()? {
            if b.box_type == *b"jp2c" {
                return Ok(Some(&self.data[b.data_range]));
            }
        }
        Ok(None)
    }

    pub fn read_box(&mut self) -> Result<Option<Jp2Box>> {
        if self.position + 8 > self.data.len() {
            return Ok(None);
        }

        let start_pos = self.position;
        let header = &self.data[start_pos..start_pos + 8];
        let mut length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let box_type = [header[4], header[5], header[6], header[7]];
        let mut header_size = 8usize;

        if length == 1 {
            let xl = self
                .data
                .get(start_pos + 8..start_pos + 16)
                .ok_or(PerfError::MalformedCodestream("truncated JP2 box length"))?;
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(xl);
            length = u64::from_be_bytes(bytes);
            header_size += 8;
        } else if length == 0 {
            length = (self.data.len() - start_pos) as u64;
        }

        if length < header_size as u64 {
            return Err(PerfError::MalformedCodestream("JP2 box shorter than its header"));
        }
        let data_end = usize::try_from(length)
            .ok()
            .and_then(|len| start_pos.checked_add(len))
            .filter(|&end| end <= self.data.len())
            .ok_or(PerfError::MalformedCodestream("JP2 box runs past end of file"))?;

        self.position = data_end;

        Ok(Some(Jp2Box {
            box_type,
            data_range: start_pos + header_size..data_end,
        }))
    }
}
