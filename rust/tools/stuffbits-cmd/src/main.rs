use std::io::Write;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

mod commands;

use commands::CodeKind;

#[derive(Parser)]
#[command(name = "stuffbits-cmd")]
#[command(about = "Command-line utility for stuffed bit stream dumps")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode integers with a universal code and dump the stream to a file
    Encode {
        /// Code used for every value
        #[arg(short, long, value_enum)]
        code: CodeKind,

        /// Bit width for the binary code
        #[arg(short, long, default_value_t = 64)]
        width: u32,

        /// Capacity of each stream block, in bits
        #[arg(long)]
        block_bits: Option<u64>,

        /// Output file; must not exist
        #[arg(short, long)]
        output: String,

        /// Values to encode
        #[arg(required = true)]
        values: Vec<u64>,
    },

    /// Decode integers from a dumped stream, one per line
    Decode {
        /// Code the values were written with
        #[arg(short, long, value_enum)]
        code: CodeKind,

        /// Bit width for the binary code
        #[arg(short, long, default_value_t = 64)]
        width: u32,

        /// Number of values to decode (defaults to the whole stream)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Stream dump to read
        path: String,
    },

    /// Display the block layout of a dumped stream as JSON
    Inspect {
        /// Stream dump to inspect
        path: String,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.parse_default_env();
    builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
    let _ = builder.try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Encode {
            code,
            width,
            block_bits,
            output,
            values,
        } => commands::encode::run(code, width, block_bits, output, values),
        Commands::Decode {
            code,
            width,
            count,
            path,
        } => commands::decode::run(code, width, count, path),
        Commands::Inspect { path } => commands::inspect::run(cli.verbose, path),
    }
}
