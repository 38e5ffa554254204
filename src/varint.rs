use crate::{Error, Result, MAX_VARINT_LEN};

/// Appends `value` as an unsigned LEB128 varint, returns the number of bytes written.
#[inline(always)]
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
    out.len() - start
}

/// Reads a varint from the front of `buf`, returns the value and the bytes consumed.
#[inline(always)]
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for (i, &byte) in buf.iter().take(MAX_VARINT_LEN).enumerate() {
        let shift = 7 * i as u32;
        // the 10th byte only has room for the top bit of a u64, it can't continue either
        if shift == 63 && byte > 1 {
            return Err(Error::MalformedHeader("varint overflows u64"));
        }
        value |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::MalformedHeader("unexpected end of varint"))
}
