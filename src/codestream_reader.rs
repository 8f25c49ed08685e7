use crate::error::{PerfError, Result};

/// Big-endian cursor over an in-memory codestream.
pub struct CodestreamReader<'a> {
    source: &'a [u8],
    position: usize,
}

impl<'a> CodestreamReader<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    pub fn remaining_data(&self) -> &'a [u8] {
        &self.source[self.position.min(self.source.len())..]
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let val = *self
            .source
            .get(self.position)
            .ok_or(PerfError::TruncatedCodestream(self.position))?;
        self.position += 1;
        Ok(val)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b1 = self.read_u8()? as u16;
        let b2 = self.read_u8()? as u16;
        Ok((b1 << 8) | b2)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b1 = self.read_u8()? as u32;
        let b2 = self.read_u8()? as u32;
        let b3 = self.read_u8()? as u32;
        let b4 = self.read_u8()? as u32;
        Ok((b1 << 24) | (b2 << 16) | (b3 << 8) | b4)
    }

    /// Skips `count` bytes; fails if that would run past the end.
    pub fn advance(&mut self, count: usize) -> Result<()> {
        let target = self.position + count;
        if target > self.source.len() {
            return Err(PerfError::TruncatedCodestream(self.source.len()));
        }
        self.position = target;
        Ok(())
    }
}
