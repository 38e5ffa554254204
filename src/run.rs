use crate::{bitpack, varint, BitWidth, BIT_PACKED_HEADER, GROUP_SIZE};
use std::fmt;
use std::fmt::Debug;

/// One segment of an encoded stream.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum Run {
    /// `count` copies of `value`
    Rle { value: u8, count: u32 },
    /// one group of 8 values, zero padded at the end of the input
    BitPacked { values: [u8; GROUP_SIZE] },
}

impl Run {
    #[inline(always)]
    pub fn header(&self) -> u64 {
        match self {
            Run::Rle { count, .. } => (*count as u64) << 1,
            Run::BitPacked { .. } => BIT_PACKED_HEADER,
        }
    }

    /// Number of values the run decodes to, padding included.
    #[inline(always)]
    pub fn len(&self) -> usize {
        match self {
            Run::Rle { count, .. } => *count as usize,
            Run::BitPacked { .. } => GROUP_SIZE,
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes the header and the payload of the run.
    #[inline(always)]
    pub fn write_to(&self, bit_width: BitWidth, out: &mut Vec<u8>) {
        varint::encode_varint(self.header(), out);
        match self {
            Run::Rle { value, .. } => out.push(*value),
            Run::BitPacked { values } => bitpack::pack(values, bit_width, out),
        }
    }

    /// Appends the decoded values to `out`, at most `limit` of them.
    #[inline(always)]
    pub fn expand_into(&self, out: &mut Vec<u8>, limit: usize) {
        let take = self.len().min(limit);
        match self {
            Run::Rle { value, .. } => out.resize(out.len() + take, *value),
            Run::BitPacked { values } => out.extend_from_slice(&values[..take]),
        }
    }
}

impl Debug for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Run::Rle { value, count } => f
                .debug_struct("Rle")
                .field("value", &value)
                .field("count", &count)
                .finish(),
            Run::BitPacked { values } => f
                .debug_struct("BitPacked")
                .field("values", &hex::encode(values))
                .finish(),
        }
    }
}
