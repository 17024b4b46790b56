//! Bounds checked little-endian decoding over a file already read into memory.
//!
//! Every read names the field it serves, so a failure can say which offset or count
//! in the file was bad and which byte range it pointed at.

mod array;
mod strings;
#[cfg(test)]
pub(crate) mod writer;

use std::{cell::Cell, ops::Range};

use glam::{Quat, Vec2, Vec3, Vec4};

use crate::error::{Result, StudioError};

pub use array::{read_array, BinArray, BinOffset};

/// How many times over a file's bytes may be decoded through offset arrays.
pub const READ_BUDGET_FACTOR: usize = 4;

/// Bytes left to decode through offset arrays.
///
/// Sibling records may point at the same child range. Without a cap, such a file
/// decodes a tree that grows with the product of the counts at each level.
#[derive(Debug)]
pub struct ReadBudget {
    left: Cell<usize>,
}

impl ReadBudget {
    pub fn new(bytes: usize) -> Self {
        Self {
            left: Cell::new(bytes),
        }
    }

    /// Budget for decoding a file of `len` bytes.
    pub fn for_len(len: usize) -> Self {
        Self::new(len.saturating_mul(READ_BUDGET_FACTOR))
    }

    pub fn remaining(&self) -> usize {
        self.left.get()
    }
}

/// Immutable view of one file's bytes.
#[derive(Copy, Clone, Debug)]
pub struct ByteSource<'a> {
    data: &'a [u8],
    budget: Option<&'a ReadBudget>,
}

impl<'a> ByteSource<'a> {
    /// A view with no cap on array reads.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, budget: None }
    }

    /// A view whose array reads draw from `budget`.
    pub fn with_budget(data: &'a [u8], budget: &'a ReadBudget) -> Self {
        Self {
            data,
            budget: Some(budget),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Validates the absolute range `start..end` against the buffer.
    pub fn check_range(&self, start: i64, end: i64, field: &'static str) -> Result<Range<usize>> {
        if start < 0 || end < start || end > self.data.len() as i64 {
            return Err(StudioError::corrupt(field, start..end, self.data.len()));
        }
        Ok(start as usize..end as usize)
    }

    /// Charges the already checked `range` to the read budget, if there is one.
    pub(crate) fn claim(&self, range: Range<i64>, field: &'static str) -> Result<()> {
        let Some(budget) = self.budget else {
            return Ok(());
        };
        let cost = (range.end - range.start) as usize;
        match budget.left.get().checked_sub(cost) {
            Some(left) => {
                budget.left.set(left);
                Ok(())
            }
            None => {
                log::error!("Read budget exhausted at `{field}` ({cost} more bytes)");
                Err(StudioError::corrupt(field, range, self.data.len()))
            }
        }
    }

    pub fn bytes(&self, offset: i64, len: usize, field: &'static str) -> Result<&'a [u8]> {
        let range = self.check_range(offset, offset.saturating_add(len as i64), field)?;
        Ok(&self.data[range])
    }

    /// Starts decoding a `size` byte record at `offset`, after checking the whole record fits.
    pub fn reader(&self, offset: i64, size: usize, field: &'static str) -> Result<RecordReader<'a>> {
        let data = self.bytes(offset, size, field)?;
        Ok(RecordReader {
            src: *self,
            data,
            start: offset,
            pos: 0,
            field,
        })
    }

    pub fn record<T: BinaryData>(&self, offset: i64, field: &'static str) -> Result<T> {
        T::read(&mut self.reader(offset, T::SIZE, field)?)
    }

    pub fn read_i32(&self, offset: i64, field: &'static str) -> Result<i32> {
        self.reader(offset, 4, field)?.i32()
    }
}

/// Field by field cursor over one fixed-size record.
///
/// Reads never leave the record the reader was created for.
pub struct RecordReader<'a> {
    src: ByteSource<'a>,
    data: &'a [u8],
    start: i64,
    pos: usize,
    field: &'static str,
}

impl<'a> RecordReader<'a> {
    /// Buffer the record lives in, for resolving offsets stored in it.
    pub fn src(&self) -> &ByteSource<'a> {
        &self.src
    }

    /// Absolute offset of the record's first byte.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos + n;
        let Some(bytes) = self.data.get(self.pos..end) else {
            return Err(StudioError::corrupt(
                self.field,
                self.start + self.pos as i64..self.start + end as i64,
                self.src.len(),
            ));
        };
        self.pos = end;
        Ok(bytes)
    }

    pub fn bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes::<1>()?[0])
    }

    pub fn i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.bytes()?))
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.bytes()?))
    }

    pub fn i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.bytes()?))
    }

    pub fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.bytes()?))
    }

    pub fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.bytes()?))
    }

    pub fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.bytes()?))
    }

    pub fn i32_array<const N: usize>(&mut self) -> Result<[i32; N]> {
        let mut out = [0; N];
        for v in &mut out {
            *v = self.i32()?;
        }
        Ok(out)
    }

    pub fn vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.f32()?, self.f32()?))
    }

    pub fn vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.f32()?, self.f32()?, self.f32()?))
    }

    pub fn vec4(&mut self) -> Result<Vec4> {
        Ok(Vec4::new(self.f32()?, self.f32()?, self.f32()?, self.f32()?))
    }

    /// Stored as x, y, z, w.
    pub fn quat(&mut self) -> Result<Quat> {
        Ok(Quat::from_xyzw(
            self.f32()?,
            self.f32()?,
            self.f32()?,
            self.f32()?,
        ))
    }

    /// Inline null-padded text of `N` bytes.
    pub fn fixed_str<const N: usize>(&mut self) -> Result<String> {
        let bytes = self.bytes::<N>()?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(N);
        Ok(strings::decode(&bytes[..end]))
    }

    /// String stored at `index` bytes past the start of this record.
    pub fn record_str(&self, index: BinOffset, field: &'static str) -> Result<String> {
        index.read_str(&self.src, self.start, field)
    }
}

/// A fixed-size record decoded one field at a time.
pub trait BinaryData: Sized {
    /// Size of the record in the file.
    const SIZE: usize;

    fn read(reader: &mut RecordReader<'_>) -> Result<Self>;
}

impl BinaryData for u16 {
    const SIZE: usize = 2;

    fn read(reader: &mut RecordReader<'_>) -> Result<Self> {
        reader.u16()
    }
}

impl BinaryData for i32 {
    const SIZE: usize = 4;

    fn read(reader: &mut RecordReader<'_>) -> Result<Self> {
        reader.i32()
    }
}

impl BinaryData for Vec4 {
    const SIZE: usize = 16;

    fn read(reader: &mut RecordReader<'_>) -> Result<Self> {
        reader.vec4()
    }
}
