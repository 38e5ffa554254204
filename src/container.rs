//! # Container Layout
//!
//! ```text
//! offset   size  field
//! 0        4     "PAR1"
//! 4        1     bit width
//! 5        4     value count, u32 LE
//! 9        4     payload size N, u32 LE
//! 13       N     encoded stream
//! 13+N     M     metadata, UTF-8
//! 13+N+M   4     metadata size M, u32 LE
//! 17+N+M   4     "PAR1"
//! ```

use crate::{decode, encode, BitWidth, Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub const MAGIC: &[u8; 4] = b"PAR1";
const HEADER_LEN: usize = 13;
const FOOTER_LEN: usize = 8;

/// One encoded column framed with its header, metadata and trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFile {
    pub bit_width: BitWidth,
    pub num_values: u32,
    pub payload: Vec<u8>,
    /// opaque to the codec, usually a [`ColumnMetadata`] document
    pub metadata: String,
}

/// Metadata document written next to a sample column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub rows: u32,
    pub encoding: String,
    pub bit_width: u8,
}

impl ColumnMetadata {
    pub fn new(rows: u32, bit_width: BitWidth) -> Self {
        ColumnMetadata {
            rows,
            encoding: "RLE_BITPACK_HYBRID".to_string(),
            bit_width: bit_width.get(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn u32_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::TooLarge(len))
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

impl ColumnFile {
    pub fn encode(values: &[u8], bit_width: u8, metadata: impl Into<String>) -> Result<Self> {
        let num_values = u32_len(values.len())?;
        let payload = encode(values, bit_width)?;
        Ok(ColumnFile {
            bit_width: BitWidth::new(bit_width)?,
            num_values,
            payload,
            metadata: metadata.into(),
        })
    }

    /// Decodes the column.
    pub fn values(&self) -> Result<Vec<u8>> {
        decode(&self.payload, self.bit_width.get(), self.num_values)
    }

    pub fn column_metadata(&self) -> Result<ColumnMetadata> {
        Ok(serde_json::from_str(&self.metadata)?)
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len() + self.metadata.len() + FOOTER_LEN
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let payload_len = u32_len(self.payload.len())?;
        let metadata_len = u32_len(self.metadata.len())?;
        writer.write_all(MAGIC)?;
        writer.write_all(&[self.bit_width.get()])?;
        writer.write_all(&self.num_values.to_le_bytes())?;
        writer.write_all(&payload_len.to_le_bytes())?;
        writer.write_all(&self.payload)?;
        writer.write_all(self.metadata.as_bytes())?;
        writer.write_all(&metadata_len.to_le_bytes())?;
        writer.write_all(MAGIC)?;
        writer.flush()?;
        debug!(
            "wrote column of {} values, {} payload bytes, {} metadata bytes",
            self.num_values, payload_len, metadata_len
        );
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN + FOOTER_LEN {
            return Err(Error::FileTooSmall(data.len()));
        }
        if &data[..4] != MAGIC || &data[data.len() - 4..] != MAGIC {
            return Err(Error::BadMagic);
        }
        let metadata_len = read_u32(data, data.len() - FOOTER_LEN) as usize;
        let metadata_end = data.len() - FOOTER_LEN;
        if metadata_len > metadata_end - HEADER_LEN {
            return Err(Error::InvalidMetadataLength(metadata_len));
        }
        let metadata_start = metadata_end - metadata_len;

        let bit_width = BitWidth::new(data[4])?;
        let num_values = read_u32(data, 5);
        let payload_len = read_u32(data, 9) as usize;
        if payload_len > metadata_start - HEADER_LEN {
            return Err(Error::InvalidEncodedSection(payload_len));
        }
        let payload = data[HEADER_LEN..HEADER_LEN + payload_len].to_vec();
        let metadata = String::from_utf8(data[metadata_start..metadata_end].to_vec())
            .map_err(Error::InvalidMetadata)?;
        debug!(
            "parsed column: bit width {}, {} values, {} payload bytes, {} metadata bytes",
            bit_width.get(),
            num_values,
            payload_len,
            metadata_len
        );
        Ok(ColumnFile {
            bit_width,
            num_values,
            payload,
            metadata,
        })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        ColumnFile::parse(&data)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = fs::File::create(path)?;
        self.write_to(io::BufWriter::new(file))
    }
}
