//! Little-endian field encoding shared by headers and doc infos.

use crate::error::{StoreError, StoreResult};

/// Sequential reader over a block payload.
///
/// Every read is bounds-checked; running off the end is reported as
/// corruption of the block at `offset`.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    offset: u64,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8], offset: u64) -> Self {
        Self {
            data,
            pos: 0,
            offset,
        }
    }

    pub(crate) fn bytes(&mut self, len: usize) -> StoreResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                StoreError::corrupted(
                    self.offset,
                    format!(
                        "field of {len} bytes at payload position {} overruns {} byte payload",
                        self.pos,
                        self.data.len()
                    ),
                )
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> StoreResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> StoreResult<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> StoreResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub(crate) fn u32(&mut self) -> StoreResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn u64(&mut self) -> StoreResult<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Fails unless the whole payload was consumed.
    pub(crate) fn finish(self) -> StoreResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(StoreError::corrupted(
                self.offset,
                format!("{} trailing bytes in payload", self.data.len() - self.pos),
            ))
        }
    }
}

pub(crate) fn put_u16_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
    buf.extend_from_slice(bytes);
}

pub(crate) fn put_u32_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}
