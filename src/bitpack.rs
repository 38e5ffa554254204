//! Packing of one group of 8 values, LSB first.
//!
//! Value 0 occupies the lowest bits of the first byte; a value crossing a byte
//! boundary continues in the low bits of the next byte. Unused high bits of the
//! last byte are zero.

use crate::{BitWidth, Error, Result, GROUP_SIZE};

/// Packs `values` into `bit_width.packed_len()` bytes appended to `out`.
///
/// Values are not checked against `bit_width`, bits above the width are masked off.
#[inline(always)]
pub fn pack(values: &[u8; GROUP_SIZE], bit_width: BitWidth, out: &mut Vec<u8>) {
    let bits = bit_width.get() as u32;
    let mask = bit_width.max_value() as u32;
    let mut acc = 0u32;
    let mut acc_len = 0u32;
    for &value in values {
        acc |= (value as u32 & mask) << acc_len;
        acc_len += bits;
        while acc_len >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            acc_len -= 8;
        }
    }
    if acc_len > 0 {
        out.push(acc as u8);
    }
}

/// Inverse of [`pack`], reads exactly `bit_width.packed_len()` bytes from the front of `buf`.
#[inline(always)]
pub fn unpack(buf: &[u8], bit_width: BitWidth) -> Result<[u8; GROUP_SIZE]> {
    let needed = bit_width.packed_len();
    if buf.len() < needed {
        return Err(Error::TruncatedBuffer {
            needed,
            available: buf.len(),
        });
    }
    let bits = bit_width.get() as u32;
    let mask = bit_width.max_value() as u32;
    let mut bytes = buf[..needed].iter();
    let mut acc = 0u32;
    let mut acc_len = 0u32;
    let mut values = [0u8; GROUP_SIZE];
    for value in values.iter_mut() {
        while acc_len < bits {
            // needed bytes hold exactly 8 * bits bits
            let byte = bytes.next().copied().unwrap_or_default();
            acc |= (byte as u32) << acc_len;
            acc_len += 8;
        }
        *value = (acc & mask) as u8;
        acc >>= bits;
        acc_len -= bits;
    }
    Ok(values)
}
