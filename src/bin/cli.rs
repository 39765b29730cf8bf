//! itstore CLI
//!
//! Command-line interface for inspecting and editing a directory-backed record store.

use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use itstore::{Config, CreateFlags, Engine, ItsError, Uid};
use tracing_subscriber::{fmt, EnvFilter};

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "info,itstore=debug";

/// itstore CLI
#[derive(Parser, Debug)]
#[command(name = "its-cli")]
#[command(about = "CLI for the itstore internal trusted storage")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./itstore_data")]
    data_dir: PathBuf,

    /// File name prefix for record files
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// Skip fsync of written records
    #[arg(long)]
    no_sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show size and flags of a record
    Info {
        /// Record uid (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_uid)]
        uid: Uid,
    },

    /// Read a record's payload
    Get {
        /// Record uid (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_uid)]
        uid: Uid,

        /// Byte offset into the payload
        #[arg(short, long, default_value = "0")]
        offset: u32,

        /// Number of bytes to read (defaults to the rest of the payload)
        #[arg(short, long)]
        length: Option<u32>,

        /// Print as hex instead of raw bytes
        #[arg(long)]
        hex: bool,
    },

    /// Create or replace a record
    Set {
        /// Record uid (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_uid)]
        uid: Uid,

        /// Payload as a string (ignored when --file is given)
        #[arg(required_unless_present = "file")]
        value: Option<String>,

        /// Read the payload from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Creation flags (decimal or 0x-prefixed hex)
        #[arg(long, default_value = "0", value_parser = parse_flags)]
        flags: u32,
    },

    /// Delete a record
    Remove {
        /// Record uid (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_uid)]
        uid: Uid,
    },
}

fn main() {
    // Initialize tracing/logging (stderr, so payloads on stdout stay clean)
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .prefix(args.prefix.clone())
        .sync_writes(!args.no_sync)
        .build();

    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&engine, args.command) {
        eprintln!("error: {} (status {})", e, e.status_code());
        process::exit(1);
    }
}

fn run(engine: &Engine<itstore::fs::DirFs>, command: Commands) -> Result<(), ItsError> {
    match command {
        Commands::Info { uid } => {
            let info = engine.get_info(uid)?;
            println!("uid:   {:#018x}", uid);
            println!("size:  {}", info.size);
            println!("flags: {}", info.flags);
        }
        Commands::Get {
            uid,
            offset,
            length,
            hex,
        } => {
            let length = match length {
                Some(length) => length,
                None => engine.get_info(uid)?.size.saturating_sub(offset),
            };
            let data = engine.get(uid, offset, length)?;
            let mut stdout = std::io::stdout().lock();
            let written = if hex {
                writeln!(stdout, "{}", to_hex(&data))
            } else {
                stdout.write_all(&data).and_then(|()| stdout.flush())
            };
            if let Err(e) = written {
                tracing::warn!("Failed to write payload to stdout: {}", e);
            }
        }
        Commands::Set {
            uid,
            value,
            file,
            flags,
        } => {
            let data = match (file, value) {
                (Some(path), _) => std::fs::read(&path).map_err(|e| {
                    ItsError::InvalidArgument(format!("cannot read {}: {}", path.display(), e))
                })?,
                (None, Some(value)) => value.into_bytes(),
                (None, None) => Vec::new(),
            };
            engine.set(uid, &data, CreateFlags::from_bits(flags))?;
            println!("stored {} bytes under {:#018x}", data.len(), uid);
        }
        Commands::Remove { uid } => {
            engine.remove(uid)?;
            println!("removed {:#018x}", uid);
        }
    }
    Ok(())
}

/// Parse a decimal or 0x-prefixed hex u64
fn parse_uid(s: &str) -> Result<Uid, String> {
    parse_number(s).and_then(|n| u64::try_from(n).map_err(|e| e.to_string()))
}

/// Parse a decimal or 0x-prefixed hex u32
fn parse_flags(s: &str) -> Result<u32, String> {
    parse_number(s).and_then(|n| u32::try_from(n).map_err(|e| e.to_string()))
}

fn parse_number(s: &str) -> Result<u128, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u128::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number {:?}: {}", s, e))
}

fn to_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}
