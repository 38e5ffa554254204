//! # Hybrid RLE / Bit-Packing Encoding Scheme
//!
//! A stream is a sequence of runs written back to back. Every run starts with
//! an unsigned LEB128 varint header whose lowest bit tells the two kinds apart.
//!
//! ```text
//!         varint header        payload
//!       ┌───────────────┬──────────────┐
//!       │ count << 1 | 0│  value (1B)  │   RLE run
//!       └───────────────┴──────────────┘
//!       ┌───────────────┬──────────────┐
//!       │ 1 << 1 | 1 = 3│ bit_width B  │   bit-packed run (one group of 8)
//!       └───────────────┴──────────────┘
//! ```
//!
//! An RLE run repeats one value `count` times, `8 <= count <= 0x3FFF`.
//! The value is stored in a single byte, so a bit width above 8 is not
//! representable.
//!
//! A bit-packed run stores exactly 8 values, `bit_width` bits each, LSB first:
//!
//! ```text
//!  bit_width = 3, values v0..v7
//!
//!        byte 0              byte 1              byte 2
//!   MSB          LSB   MSB          LSB   MSB          LSB
//!    │            │     │            │     │            │
//!    ▼            ▼     ▼            ▼     ▼            ▼
//!   v2 v2 v1 v1 v1 v0 v0 v0   v5 v4 v4 v4 v3 v3 v3 v2   v7 v7 v7 v6 v6 v6 v5 v5
//! ```
//!
//! The stream does not include the number of values.
//! The decoder MUST know it since the encoder pads zeros on the last group.
//!
//! # Container
//!
//! [`ColumnFile`] frames one stream the way the columnar file layer does:
//! `PAR1`, bit width, value count, payload size, payload, metadata,
//! metadata size, `PAR1`.

#[macro_use]
extern crate log;

mod bitpack;
mod container;
mod derle;
mod error;
mod rle;
mod run;
mod varint;

pub use bitpack::{pack, unpack};
pub use container::{ColumnFile, ColumnMetadata, MAGIC};
pub use derle::{decode, RunReader};
pub use error::{Error, Result};
pub use rle::{encode, Rle};
pub use run::Run;
pub use varint::{decode_varint, encode_varint};

/// values in a bit-packed group
pub const GROUP_SIZE: usize = 8;
/// shortest repetition worth an RLE run, same as the group size
pub const MIN_RLE_RUN: u32 = GROUP_SIZE as u32;
/// longest RLE run, 14 bits
pub const MAX_RLE_RUN: u32 = 0x3FFF;
/// header of a single-group bit-packed run: `(1 << 1) | 1`
pub const BIT_PACKED_HEADER: u64 = (1 << 1) | 1;
/// a u64 never takes more than 10 varint bytes
pub const MAX_VARINT_LEN: usize = 10;

/// Number of bits every value of a stream occupies, `1..=8`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BitWidth(u8);

impl BitWidth {
    pub fn new(bits: u8) -> Result<Self> {
        if (1..=8).contains(&bits) {
            Ok(BitWidth(bits))
        } else {
            Err(Error::InvalidBitWidth(bits))
        }
    }

    #[inline(always)]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Largest value representable in this width.
    #[inline(always)]
    pub fn max_value(self) -> u8 {
        ((1u16 << self.0) - 1) as u8
    }

    /// Bytes taken by one packed group: `ceil(8 * bit_width / 8)`.
    #[inline(always)]
    pub fn packed_len(self) -> usize {
        (GROUP_SIZE * self.0 as usize + 7) / 8
    }

    #[inline(always)]
    pub fn check(self, value: u8) -> Result<u8> {
        if value > self.max_value() {
            return Err(Error::ValueOutOfRange {
                value,
                bit_width: self.0,
            });
        }
        Ok(value)
    }
}

impl TryFrom<u8> for BitWidth {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self> {
        BitWidth::new(bits)
    }
}

#[cfg(test)]
static INIT: std::sync::Once = std::sync::Once::new();

/// Setup function that is only run once, even if called multiple times.
#[cfg(test)]
fn setup() {
    INIT.call_once(|| {
        pretty_env_logger::init();
    });
}
