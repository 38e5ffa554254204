use crate::{BitWidth, Result, Run, GROUP_SIZE, MAX_RLE_RUN, MIN_RLE_RUN};
use std::fmt::Debug;
use std::{fmt, io};

/// Streaming encoder, values go in one at a time and runs are written out as
/// soon as they are decided.
///
/// The output is the greedy segmentation: at each position measure the run of
/// equal values (capped at `MAX_RLE_RUN`), emit it as RLE when it is at least
/// `MIN_RLE_RUN` long, otherwise bit-pack the next 8 values.
pub struct Rle<W> {
    status: RleStatus,
    bit_width: BitWidth,
    scratch: Vec<u8>,
    writer: W,
}

#[derive(Copy, Clone)]
enum RleStatus {
    RLE { value: u8, counter: u32 },
    MayRLE { value: u8, counter: u32 },
    Packing { group: [u8; GROUP_SIZE], len: u8 },
    Wait,
}

impl<W: io::Write> Rle<W> {
    pub fn new(writer: W, bit_width: BitWidth) -> Self {
        Rle {
            status: RleStatus::Wait,
            bit_width,
            scratch: Vec::with_capacity(16),
            writer,
        }
    }

    #[inline(always)]
    pub fn update(&mut self, value: u8) -> Result<()> {
        let value = self.bit_width.check(value)?;
        trace!("update value {value}");
        trace!("current status {:?}", self.status);
        match self.status {
            RleStatus::Wait => {
                self.status = RleStatus::MayRLE { value, counter: 1 };
                trace!("transit to {:?}", self.status);
            }
            RleStatus::MayRLE { value: run, counter } => {
                if value == run {
                    let counter = counter + 1;
                    self.status = if counter >= MIN_RLE_RUN {
                        RleStatus::RLE { value, counter }
                    } else {
                        RleStatus::MayRLE { value, counter }
                    };
                    trace!("transit to {:?}", self.status);
                } else {
                    trace!("cannot RLE, convert to bit-packed");
                    debug_assert!(counter < MIN_RLE_RUN);
                    self.status = self.status.finalize();
                    trace!("transit to {:?}, refeed", self.status);
                    self.update(value)?;
                }
            }
            RleStatus::RLE { value: run, counter } => {
                if value == run && counter < MAX_RLE_RUN {
                    self.status = RleStatus::RLE {
                        value,
                        counter: counter + 1,
                    };
                } else {
                    // ends here, either a different value or the run is full
                    self.emit()?;
                    self.status = RleStatus::Wait;
                    trace!("transit to {:?}, refeed", self.status);
                    self.update(value)?;
                }
            }
            RleStatus::Packing { mut group, len } => {
                group[len as usize] = value;
                let len = len + 1;
                self.status = RleStatus::Packing { group, len };
                if len as usize == GROUP_SIZE {
                    self.emit()?;
                    self.status = RleStatus::Wait;
                    trace!("transit to {:?}", self.status);
                }
            }
        }
        Ok(())
    }

    #[inline(always)]
    fn emit(&mut self) -> Result<()> {
        if let Some(run) = self.status.try_run() {
            self.scratch.clear();
            run.write_to(self.bit_width, &mut self.scratch);
            trace!("emit {:?} as {}", run, hex::encode(&self.scratch));
            self.writer.write_all(&self.scratch)?;
        }
        Ok(())
    }

    /// Writes the pending run, zero padding an incomplete group, and returns the writer.
    pub fn finalize(mut self) -> Result<W> {
        self.status = self.status.finalize();
        trace!("last block: {:?}", self.status);
        self.emit()?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl RleStatus {
    #[inline(always)]
    fn try_run(self) -> Option<Run> {
        match self {
            RleStatus::Wait => None,
            RleStatus::MayRLE { .. } => None,
            RleStatus::Packing { group, .. } => Some(Run::BitPacked { values: group }),
            RleStatus::RLE { value, counter } => {
                debug_assert!(counter >= MIN_RLE_RUN);
                debug_assert!(counter <= MAX_RLE_RUN);
                Some(Run::Rle {
                    value,
                    count: counter,
                })
            }
        }
    }

    // converting MayRLE to Packing
    #[inline(always)]
    fn finalize(self) -> Self {
        match self {
            RleStatus::MayRLE { value, counter } => {
                debug_assert!(counter < MIN_RLE_RUN);
                let mut group = [0; GROUP_SIZE];
                group[..counter as usize].fill(value);
                let new = RleStatus::Packing {
                    group,
                    len: counter as u8,
                };
                trace!("convert {:?} to {:?}", self, new);
                new
            }
            _ => self,
        }
    }
}

impl Debug for RleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RleStatus::RLE { value, counter } => f
                .debug_struct("RLE")
                .field("value", &value)
                .field("counter", &counter)
                .finish(),
            RleStatus::MayRLE { value, counter } => f
                .debug_struct("MayRLE")
                .field("value", &value)
                .field("counter", &counter)
                .finish(),
            RleStatus::Packing { group, len } => f
                .debug_struct("Packing")
                .field("group", &hex::encode(&group[..*len as usize]))
                .field("len", &len)
                .finish(),
            RleStatus::Wait => f.write_str("Wait"),
        }
    }
}

/// Every byte written is one value.
impl<W: io::Write> io::Write for Rle<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for value in buf.iter() {
            self.update(*value)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Encodes `values` into a new stream.
///
/// Every value is checked before anything is encoded, a failure never leaves a
/// partial stream behind.
pub fn encode(values: &[u8], bit_width: u8) -> Result<Vec<u8>> {
    let bit_width = BitWidth::new(bit_width)?;
    for value in values {
        bit_width.check(*value)?;
    }
    let mut rle = Rle::new(Vec::with_capacity(values.len() / 2 + 2), bit_width);
    for value in values {
        rle.update(*value)?;
    }
    let out = rle.finalize()?;
    debug!(
        "encoded {} values at {} bits into {} bytes",
        values.len(),
        bit_width.get(),
        out.len()
    );
    Ok(out)
}
