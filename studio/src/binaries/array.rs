use std::{fmt, marker::PhantomData, ops::Range};

use super::{BinaryData, ByteSource, RecordReader};
use crate::error::{Result, StudioError};

/// Decodes `count` items of `stride` bytes starting at the absolute offset `base`.
///
/// `decode` receives the absolute offset of each item. The whole range is checked
/// against the buffer before anything is allocated.
pub fn read_array<'a, T>(
    src: &ByteSource<'a>,
    base: i64,
    count: i32,
    stride: usize,
    field: &'static str,
    mut decode: impl FnMut(&ByteSource<'a>, i64) -> Result<T>,
) -> Result<Vec<T>> {
    let end = base.saturating_add(i64::from(count).saturating_mul(stride as i64));
    if count < 0 {
        return Err(StudioError::corrupt(field, base..end, src.len()));
    }
    src.check_range(base, end, field)?;
    src.claim(base..end, field)?;

    let mut items = Vec::with_capacity(count as usize);
    for i in 0..i64::from(count) {
        items.push(decode(src, base + i * stride as i64)?);
    }
    Ok(items)
}

/// Offset of a string or record, relative to a base chosen by whoever holds it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BinOffset {
    pub index: i32,
}

impl BinOffset {
    pub fn new(index: i32) -> Self {
        Self { index }
    }

    pub fn resolve(&self, base: i64) -> i64 {
        base + i64::from(self.index)
    }

    pub fn read_str(&self, src: &ByteSource, base: i64, field: &'static str) -> Result<String> {
        src.read_cstr(self.resolve(base), field)
    }

    /// Like [`read_str`](Self::read_str), but an index of zero means no string.
    pub fn read_opt_str(
        &self,
        src: &ByteSource,
        base: i64,
        field: &'static str,
    ) -> Result<Option<String>> {
        if self.index == 0 {
            return Ok(None);
        }
        self.read_str(src, base, field).map(Some)
    }
}

impl BinaryData for BinOffset {
    const SIZE: usize = 4;

    fn read(reader: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self::new(reader.i32()?))
    }
}

/// Struct of (count, offset) for reading an array of items, with the offset relative
/// to a base the caller supplies.
pub struct BinArray<T> {
    pub count: i32,
    pub offset: i32,
    _p: PhantomData<T>,
}

impl<T> BinArray<T> {
    pub fn new(count: i32, offset: i32) -> Self {
        Self {
            count,
            offset,
            _p: PhantomData,
        }
    }

    /// Count first, then offset.
    pub fn read_count_offset(reader: &mut RecordReader<'_>) -> Result<Self> {
        let count = reader.i32()?;
        let offset = reader.i32()?;
        Ok(Self::new(count, offset))
    }

    /// Offset first, then count.
    pub fn read_offset_count(reader: &mut RecordReader<'_>) -> Result<Self> {
        let offset = reader.i32()?;
        let count = reader.i32()?;
        Ok(Self::new(count, offset))
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Absolute offset of the first item.
    pub fn start(&self, base: i64) -> i64 {
        base + i64::from(self.offset)
    }

    /// Absolute byte range covered by the items.
    pub fn span(&self, base: i64, stride: usize) -> Range<i64> {
        let start = self.start(base);
        start..start.saturating_add(i64::from(self.count).saturating_mul(stride as i64))
    }

    pub fn resolve<'a, U>(
        &self,
        src: &ByteSource<'a>,
        base: i64,
        stride: usize,
        field: &'static str,
        decode: impl FnMut(&ByteSource<'a>, i64) -> Result<U>,
    ) -> Result<Vec<U>> {
        read_array(src, self.start(base), self.count, stride, field, decode)
    }
}

impl<T: BinaryData> BinArray<T> {
    pub fn read_records(&self, src: &ByteSource, base: i64, field: &'static str) -> Result<Vec<T>> {
        self.resolve(src, base, T::SIZE, field, |src, at| src.record(at, field))
    }
}

// Manual impls so `T` does not need to be `Copy` or `Debug` itself.
impl<T> Clone for BinArray<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BinArray<T> {}

impl<T> Default for BinArray<T> {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl<T> PartialEq for BinArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.offset == other.offset
    }
}

impl<T> Eq for BinArray<T> {}

impl<T> fmt::Debug for BinArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinArray")
            .field("count", &self.count)
            .field("offset", &self.offset)
            .finish()
    }
}
