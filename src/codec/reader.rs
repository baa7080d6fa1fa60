use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use super::types::Vector3;

/// Little-endian reader over a borrowed prefab image
///
/// Record decoders jump around with `seek` and then read fields in order.
/// Every read is bounds-checked against the whole image.
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Move to an absolute offset. Negative offsets come from corrupt headers.
    pub fn seek(&mut self, offset: i64) -> Result<()> {
        self.pos = usize::try_from(offset)
            .map_err(|_| Error::InvalidPrefab(format!("negative offset {offset}")))?;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let need = self.pos.checked_add(n).ok_or(Error::BufferOverflow {
            need: usize::MAX,
            have: self.data.len(),
        })?;
        if need > self.data.len() {
            return Err(Error::BufferOverflow { need, have: self.data.len() });
        }
        let slice = &self.data[self.pos..need];
        self.pos = need;
        Ok(slice)
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_f32_le(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }

    pub fn read_vector3(&mut self) -> Result<Vector3> {
        let mut bytes = [0u8; Vector3::SIZE];
        bytes.copy_from_slice(self.read_bytes(Vector3::SIZE)?);
        Ok(Vector3::from_le_bytes(bytes))
    }

    /// Read `N` consecutive i32 values
    pub fn read_i32_array<const N: usize>(&mut self) -> Result<[i32; N]> {
        let bytes = self.read_bytes(N * 4)?;
        let mut out = [0i32; N];
        LittleEndian::read_i32_into(bytes, &mut out);
        Ok(out)
    }
}
