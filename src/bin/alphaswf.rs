//! alphaswf CLI - constrained SWF recompressor.
//!
//! Reads an uncompressed (`FWS`) SWF and writes a zlib-compressed `CWS`
//! file made entirely of alphanumeric bytes.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use alphaswf::Charset;

/// Recompress an uncompressed SWF into alphanumeric-only output.
#[derive(Parser, Debug)]
#[command(name = "alphaswf")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Uncompressed SWF input file
    #[arg(short, long, value_name = "INPUT")]
    input: PathBuf,

    /// Output file path
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let data =
        fs::read(&args.input).map_err(|e| format!("{}: {e}", args.input.display()))?;
    let charset = Charset::alphanumeric();

    let start = Instant::now();
    let (swf, stats) = alphaswf::encode_with_stats(&data, &charset)?;
    let encode_time = start.elapsed();

    let output_path = args.output.unwrap_or_else(|| {
        let mut name = args.input.clone().into_os_string();
        name.push("-ascii.swf");
        PathBuf::from(name)
    });
    fs::write(&output_path, &swf).map_err(|e| format!("{}: {e}", output_path.display()))?;

    if args.verbose {
        eprintln!("Input: {:?}", args.input);
        eprintln!("  Payload: {} bytes", stats.payload_len);
        eprintln!(
            "  Adler-32: {:08x} ({} bytes appended)",
            stats.checksum, stats.appended
        );
        eprintln!("  Encode time: {:.2?}", encode_time);
    }
    println!(
        "{} -> {} ({} B -> {} B)",
        args.input.display(),
        output_path.display(),
        data.len(),
        swf.len()
    );

    Ok(())
}
