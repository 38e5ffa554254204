use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the codec and the container layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value does not fit the stream's bit width.
    #[error("value {value} does not fit in {bit_width} bits")]
    ValueOutOfRange { value: u8, bit_width: u8 },
    /// A run header is unterminated, too long or describes an unsupported run.
    #[error("malformed run header: {0}")]
    MalformedHeader(&'static str),
    /// A run declares more payload than the buffer holds.
    #[error("truncated buffer: need {needed} bytes, {available} available")]
    TruncatedBuffer { needed: usize, available: usize },
    /// The stream ended before the expected number of values was decoded.
    #[error("stream exhausted after {decoded} of {expected} values")]
    Overrun { decoded: usize, expected: usize },
    #[error("bit width must be within 1..=8, got {0}")]
    InvalidBitWidth(u8),
    #[error("file too small: {0} bytes")]
    FileTooSmall(usize),
    #[error("invalid magic, expected PAR1")]
    BadMagic,
    #[error("invalid metadata length {0}")]
    InvalidMetadataLength(usize),
    #[error("invalid encoded section of {0} bytes")]
    InvalidEncodedSection(usize),
    #[error("metadata is not UTF-8: {0}")]
    InvalidMetadata(#[source] std::string::FromUtf8Error),
    #[error("the container cannot hold {0} bytes")]
    TooLarge(usize),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        match e {
            Error::Io(e) => e,
            e @ Error::ValueOutOfRange { .. } => io::Error::new(io::ErrorKind::InvalidInput, e),
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}
