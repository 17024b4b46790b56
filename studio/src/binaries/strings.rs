use super::ByteSource;
use crate::error::{Result, StudioError};

/// Single-byte text: each byte is one code point.
pub(crate) fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

impl<'a> ByteSource<'a> {
    /// Null-terminated string starting at `offset`.
    pub fn read_cstr(&self, offset: i64, field: &'static str) -> Result<String> {
        let range = self.check_range(offset, offset, field)?;
        let tail = &self.as_bytes()[range.start..];

        let Some(end) = tail.iter().position(|&b| b == 0) else {
            return Err(StudioError::Truncated {
                field,
                offset: range.start,
            });
        };
        Ok(decode(&tail[..end]))
    }

    /// Reads an `i32` at `table_offset`, then the string that many bytes past `anchor`.
    ///
    /// Pass an anchor of zero when the stored offset is absolute.
    pub fn read_indirect_str(
        &self,
        table_offset: i64,
        anchor: i64,
        field: &'static str,
    ) -> Result<String> {
        let target = self.read_i32(table_offset, field)?;
        self.read_cstr(anchor + i64::from(target), field)
    }
}
