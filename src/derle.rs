use crate::{bitpack, varint, BitWidth, Error, Result, Run, BIT_PACKED_HEADER, GROUP_SIZE};

/// Reads the runs of a stream one by one.
///
/// The iterator stops at the end of the buffer, or after the first error.
pub struct RunReader<'a> {
    buf: &'a [u8],
    pos: usize,
    bit_width: BitWidth,
}

impl<'a> RunReader<'a> {
    pub fn new(buf: &'a [u8], bit_width: BitWidth) -> RunReader<'a> {
        RunReader {
            buf,
            pos: 0,
            bit_width,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    fn read_run(&mut self) -> Result<Run> {
        let (header, len) = varint::decode_varint(&self.buf[self.pos..])?;
        self.pos += len;
        let rest = &self.buf[self.pos..];
        if header & 1 == 0 {
            let count = u32::try_from(header >> 1)
                .map_err(|_| Error::MalformedHeader("RLE run length overflows u32"))?;
            let value = *rest.first().ok_or(Error::TruncatedBuffer {
                needed: 1,
                available: 0,
            })?;
            let value = self.bit_width.check(value)?;
            self.pos += 1;
            Ok(Run::Rle { value, count })
        } else {
            if header != BIT_PACKED_HEADER {
                return Err(Error::MalformedHeader(
                    "bit-packed run must hold exactly one group",
                ));
            }
            let values = bitpack::unpack(rest, self.bit_width)?;
            self.pos += self.bit_width.packed_len();
            Ok(Run::BitPacked { values })
        }
    }
}

impl<'a> Iterator for RunReader<'a> {
    type Item = Result<Run>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buf.len() {
            return None;
        }
        let run = self.read_run();
        match &run {
            Ok(run) => trace!("read {:?}, position {}", run, self.pos),
            Err(e) => {
                trace!("malformed run at {}: {e}", self.pos);
                self.pos = self.buf.len();
            }
        }
        Some(run)
    }
}

/// Values to reserve up front. The count comes from an untrusted header, so the
/// reservation is bounded by what the stream can hold without RLE runs; longer
/// runs grow the vector as they are expanded.
#[inline(always)]
fn capacity_hint(stream_len: usize, expected: usize) -> usize {
    expected.min(stream_len.saturating_mul(GROUP_SIZE))
}

/// Decodes exactly `total_values` values from `stream`.
///
/// Bytes after the run that completes the count are ignored, as is the zero
/// padding of the last group.
pub fn decode(stream: &[u8], bit_width: u8, total_values: u32) -> Result<Vec<u8>> {
    let bit_width = BitWidth::new(bit_width)?;
    let expected = total_values as usize;
    let mut values = Vec::with_capacity(capacity_hint(stream.len(), expected));
    let mut reader = RunReader::new(stream, bit_width);
    while values.len() < expected {
        let run = reader.next().ok_or(Error::Overrun {
            decoded: values.len(),
            expected,
        })??;
        let remaining = expected - values.len();
        run.expand_into(&mut values, remaining);
    }
    debug!(
        "decoded {} values from {} of {} bytes",
        expected,
        reader.position(),
        stream.len()
    );
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::{capacity_hint, decode, RunReader};
    use crate::{encode, setup, BitWidth, Error, Run, MAX_RLE_RUN};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const TEST_VECTOR: [(u8, &[u8], &str); 7] = [
        (3, &[], ""),
        (3, &[1, 2, 3, 4, 5], "03d15800"),
        (3, &[5, 5, 5, 5, 5, 5, 5], "036ddb16"),
        (3, &[5, 5, 5, 5, 5, 5, 5, 5], "1005"),
        (2, &[1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2], "0395aa03aa00"),
        (4, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 9, 9, 9, 9, 9, 9, 9, 9], "03214365871209"),
        (
            8,
            &[0xAB, 0xAB, 0xAB, 0xAB, 0xAB, 0xAB, 0xAB, 0xAB, 0xAB, 0xCD],
            "12ab03cd00000000000000",
        ),
    ];

    fn runs(stream: &[u8], bits: u8) -> Vec<Run> {
        RunReader::new(stream, BitWidth::new(bits).unwrap())
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_derle_decode() {
        setup();
        for (bits, expected, input) in TEST_VECTOR.into_iter() {
            let input = hex::decode(input).unwrap();
            let out = decode(&input, bits, expected.len() as u32).unwrap();
            assert_eq!(expected, out);
        }
    }

    #[test]
    fn test_derle_rle_then_group() {
        setup();
        let mut input = vec![7; 20];
        input.extend([3; 8]);
        let stream = encode(&input, 6).unwrap();
        assert_eq!(
            runs(&stream, 6),
            [
                Run::Rle { value: 7, count: 20 },
                Run::Rle { value: 3, count: 8 }
            ]
        );
        assert_eq!(decode(&stream, 6, 28).unwrap(), input);

        // the same values written as a bit-packed group decode identically
        let stream = hex::decode("280703c3300cc3300c").unwrap();
        assert_eq!(
            runs(&stream, 6),
            [
                Run::Rle { value: 7, count: 20 },
                Run::BitPacked { values: [3; 8] }
            ]
        );
        assert_eq!(decode(&stream, 6, 28).unwrap(), input);
    }

    #[test]
    fn test_derle_padding_discarded() {
        setup();
        let stream = encode(&[1, 2, 3, 4, 5], 3).unwrap();
        assert_eq!(
            runs(&stream, 3),
            [Run::BitPacked {
                values: [1, 2, 3, 4, 5, 0, 0, 0]
            }]
        );
        assert_eq!(decode(&stream, 3, 5).unwrap(), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_derle_threshold_runs() {
        setup();
        let seven = encode(&[2; 7], 2).unwrap();
        assert!(matches!(runs(&seven, 2)[..], [Run::BitPacked { .. }]));
        let eight = encode(&[2; 8], 2).unwrap();
        assert_eq!(runs(&eight, 2), [Run::Rle { value: 2, count: 8 }]);

        let full = encode(&vec![0; MAX_RLE_RUN as usize], 5).unwrap();
        assert_eq!(runs(&full, 5).len(), 1);
        let over = encode(&vec![0; MAX_RLE_RUN as usize + 1], 5).unwrap();
        assert_eq!(runs(&over, 5).len(), 2);
        assert_eq!(
            decode(&over, 5, MAX_RLE_RUN + 1).unwrap(),
            vec![0; MAX_RLE_RUN as usize + 1]
        );
    }

    #[test]
    fn test_derle_truncated() {
        setup();
        let mut stream = encode(&[1, 2, 3, 4, 5, 6, 7, 8, 9], 4).unwrap();
        // header, 4 packed bytes, header, 4 packed bytes
        assert_eq!(stream.len(), 10);
        stream.pop();
        assert!(matches!(
            decode(&stream, 4, 9),
            Err(Error::TruncatedBuffer {
                needed: 4,
                available: 3
            })
        ));

        let stream = hex::decode("10").unwrap();
        assert!(matches!(
            decode(&stream, 4, 8),
            Err(Error::TruncatedBuffer { .. })
        ));
    }

    #[test]
    fn test_derle_overrun() {
        setup();
        let stream = encode(&[1; 10], 1).unwrap();
        match decode(&stream, 1, 11) {
            Err(Error::Overrun { decoded, expected }) => {
                assert_eq!(decoded, 10);
                assert_eq!(expected, 11);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            decode(&[], 1, 1),
            Err(Error::Overrun {
                decoded: 0,
                expected: 1
            })
        ));
    }

    #[test]
    fn test_derle_untrusted_count() {
        setup();
        assert_eq!(capacity_hint(0, u32::MAX as usize), 0);
        assert_eq!(capacity_hint(4, u32::MAX as usize), 32);
        assert_eq!(capacity_hint(1000, 5), 5);
        assert!(matches!(
            decode(&[], 1, u32::MAX),
            Err(Error::Overrun { decoded: 0, .. })
        ));
        // a two byte run may expand far beyond the reservation
        let stream = hex::decode("feff0101").unwrap();
        assert_eq!(capacity_hint(stream.len(), MAX_RLE_RUN as usize), 32);
        let values = decode(&stream, 1, MAX_RLE_RUN).unwrap();
        assert_eq!(values, vec![1; MAX_RLE_RUN as usize]);
        assert!(matches!(
            decode(&stream, 1, u32::MAX),
            Err(Error::Overrun { decoded, .. }) if decoded == MAX_RLE_RUN as usize
        ));
    }

    #[test]
    fn test_derle_malformed_header() {
        setup();
        // unterminated varint
        assert!(matches!(
            decode(&[0x80, 0x80], 3, 1),
            Err(Error::MalformedHeader(_))
        ));
        // two bit-packed groups in one run
        assert!(matches!(
            decode(&[0x05, 0, 0, 0, 0, 0, 0], 3, 16),
            Err(Error::MalformedHeader(_))
        ));
        // RLE length beyond u32
        let mut stream = vec![];
        crate::encode_varint((u32::MAX as u64 + 1) << 1, &mut stream);
        stream.push(1);
        assert!(matches!(
            decode(&stream, 3, 1),
            Err(Error::MalformedHeader(_))
        ));
        // the reader stops after an error
        let mut reader = RunReader::new(&[0x80], BitWidth::new(3).unwrap());
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_derle_rle_value_out_of_range() {
        setup();
        assert!(matches!(
            decode(&[0x10, 0x08], 3, 8),
            Err(Error::ValueOutOfRange {
                value: 8,
                bit_width: 3
            })
        ));
    }

    #[test]
    fn test_derle_clips_to_total() {
        setup();
        // trailing bytes after the last needed run are ignored
        let stream = hex::decode("fe ff 01 04 ff ff".replace(' ', "")).unwrap();
        assert_eq!(decode(&stream, 3, 3).unwrap(), [4, 4, 4]);
        assert_eq!(decode(&stream, 3, 0).unwrap(), Vec::<u8>::new());
        assert!(matches!(
            decode(&stream, 0, 3),
            Err(Error::InvalidBitWidth(0))
        ));
    }

    #[test]
    fn test_derle_roundtrip() {
        setup();
        let mut rng = StdRng::seed_from_u64(0x5EED);
        for bits in 1..=8u8 {
            let max = BitWidth::new(bits).unwrap().max_value();
            for _ in 0..50 {
                let mut values = vec![];
                let len = rng.gen_range(0..600);
                while values.len() < len {
                    let value = rng.gen_range(0..=max);
                    if rng.gen_bool(0.3) {
                        let repeat = rng.gen_range(1..40);
                        values.extend(std::iter::repeat(value).take(repeat));
                    } else {
                        values.push(value);
                    }
                }
                let stream = encode(&values, bits).unwrap();
                let out = decode(&stream, bits, values.len() as u32).unwrap();
                assert_eq!(values, out, "bit width {bits}");
            }
        }
    }
}
