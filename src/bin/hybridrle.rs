use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use hybridrle::{BitWidth, ColumnFile, ColumnMetadata, Error};

/// Hybrid RLE / bit-packing column tool.
///
/// Writes sample columns in the PAR1 container and measures how fast they
/// decode.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a sample column: runs of 7 mixed with a cycling sequence.
    Generate {
        output: PathBuf,

        #[arg(long, default_value_t = 200_000)]
        rows: u32,

        #[arg(long, default_value_t = 6)]
        bit_width: u8,
    },
    /// Decode a column file repeatedly and print throughput statistics.
    Read {
        #[arg(default_value = "/data/sample.parquet")]
        input: PathBuf,

        #[arg(default_value_t = 40, value_parser = clap::value_parser!(u32).range(1..))]
        repeats: u32,
    },
}

struct Stats {
    total_processed: u64,
    processing: Duration,
}

impl Stats {
    fn avg_latency_ms(&self) -> f64 {
        if self.total_processed == 0 {
            return 0.0;
        }
        self.processing.as_secs_f64() * 1_000.0 / self.total_processed as f64
    }

    fn throughput(&self) -> f64 {
        if self.processing.is_zero() {
            return 0.0;
        }
        self.total_processed as f64 / self.processing.as_secs_f64()
    }

    fn print(&self) {
        println!("--- Statistics ---");
        println!("Total processed: {}", self.total_processed);
        println!("Processing time: {:.3}s", self.processing.as_secs_f64());
        println!("Average latency: {:.6}ms", self.avg_latency_ms());
        println!("Throughput: {:.2} items/sec", self.throughput());
    }
}

/// Value `i` is 7 for the first 20 of every 50 rows, `i * 13` otherwise, wrapped to the bit width.
fn sample_values(rows: u32, bit_width: BitWidth) -> Vec<u8> {
    let modulo = bit_width.max_value() as u64 + 1;
    (0..rows as u64)
        .map(|i| {
            let value = if i % 50 < 20 { 7 } else { i * 13 };
            (value % modulo) as u8
        })
        .collect()
}

fn generate(output: PathBuf, rows: u32, bit_width: u8) -> Result<(), Error> {
    let width = BitWidth::new(bit_width)?;
    let values = sample_values(rows, width);
    let metadata = ColumnMetadata::new(rows, width).to_json()?;
    let file = ColumnFile::encode(&values, bit_width, metadata)?;
    file.save(&output)?;
    println!("Generated {}", output.display());
    println!("Rows: {rows}");
    println!("Encoded size: {} bytes", file.payload.len());
    println!(
        "File size: {:.2} MB",
        file.encoded_len() as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}

fn read(input: PathBuf, repeats: u32) -> Result<Stats, Error> {
    let start = Instant::now();
    let mut num_values = 0u64;
    for round in 0..repeats {
        let file = ColumnFile::open(&input)?;
        let values = file.values()?;
        num_values = values.len() as u64;
        log::debug!("round {round}: decoded {num_values} values");
    }
    Ok(Stats {
        total_processed: num_values * repeats as u64,
        processing: start.elapsed(),
    })
}

fn main() {
    pretty_env_logger::init();
    let args = Args::parse();

    let result = match args.command {
        Command::Generate {
            output,
            rows,
            bit_width,
        } => generate(output, rows, bit_width),
        Command::Read { input, repeats } => read(input, repeats).map(|stats| stats.print()),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
