mod exit;
mod logging;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::debug;

use framesieve_frame::{Demux, DemuxConfig, FilterId, Forward, DEFAULT_MAX_PAYLOAD};

use crate::exit::{demux_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "framesieve",
    version,
    about = "Filter a stream of length-prefixed binary frames by id"
)]
struct Cli {
    /// Frame id to forward: 4 raw bytes (e.g. GPS1) or 0x-prefixed hex
    /// (e.g. 0x47505301) for ids that are not typeable.
    id: String,

    /// Forward complete frames (header + payload) instead of payload only.
    #[arg(long)]
    frame: bool,

    /// Maximum accepted payload size in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_PAYLOAD)]
    max_payload: usize,

    /// Read frames from a file instead of stdin.
    #[arg(long, short = 'i', value_name = "FILE")]
    input: Option<PathBuf>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

fn run(cli: &Cli) -> CliResult<i32> {
    let filter = resolve_filter_id(&cli.id)?;
    let demux = Demux::with_config(
        filter,
        DemuxConfig {
            max_payload_size: cli.max_payload,
            forward: if cli.frame {
                Forward::Frame
            } else {
                Forward::Payload
            },
        },
    );

    let output = BufWriter::new(io::stdout().lock());
    let stats = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            run_demux(&demux, BufReader::new(file), output)?
        }
        None => run_demux(&demux, io::stdin().lock(), output)?,
    };

    debug!(
        filter = %filter,
        frames = stats.frames,
        matched = stats.matched,
        bytes_out = stats.bytes_out,
        "done"
    );
    Ok(SUCCESS)
}

fn run_demux<R: Read, W: Write>(
    demux: &Demux,
    input: R,
    output: W,
) -> CliResult<framesieve_frame::DemuxStats> {
    demux
        .run(input, output)
        .map_err(|err| demux_error("demux failed", err))
}

/// Resolve the id argument to exactly 4 filter bytes.
///
/// Short or long arguments are usage errors; a silent prefix match would
/// forward frames the caller never asked for.
fn resolve_filter_id(arg: &str) -> CliResult<FilterId> {
    if let Some(hex) = arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        let bytes = parse_hex_id(hex)
            .ok_or_else(|| CliError::new(USAGE, format!("invalid hex id {arg:?}: expected exactly 8 hex digits")))?;
        return Ok(FilterId::from(bytes));
    }

    FilterId::from_slice(arg.as_bytes()).ok_or_else(|| {
        CliError::new(
            USAGE,
            format!(
                "filter id must be exactly 4 bytes, got {} in {arg:?}",
                arg.len()
            ),
        )
    })
}

fn parse_hex_id(hex: &str) -> Option<[u8; 4]> {
    if hex.len() != 8 {
        return None;
    }
    let mut id = [0u8; 4];
    for (i, chunk) in hex.as_bytes().chunks_exact(2).enumerate() {
        let pair = std::str::from_utf8(chunk).ok()?;
        id[i] = u8::from_str_radix(pair, 16).ok()?;
    }
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_invocation() {
        let cli = Cli::try_parse_from(["framesieve", "GPS1"]).expect("id arg should parse");
        assert_eq!(cli.id, "GPS1");
        assert!(!cli.frame);
        assert_eq!(cli.max_payload, DEFAULT_MAX_PAYLOAD);
        assert!(cli.input.is_none());
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "framesieve",
            "ADIS",
            "--frame",
            "--max-payload",
            "4096",
            "--input",
            "flight.bin",
        ])
        .expect("flags should parse");

        assert!(cli.frame);
        assert_eq!(cli.max_payload, 4096);
        assert_eq!(cli.input, Some(PathBuf::from("flight.bin")));
    }

    #[test]
    fn rejects_missing_id() {
        let err = Cli::try_parse_from(["framesieve"]).expect_err("missing id should fail");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn resolves_ascii_id() {
        let filter = resolve_filter_id("GPS1").unwrap();
        assert_eq!(filter.as_bytes(), b"GPS1");
    }

    #[test]
    fn resolves_hex_id() {
        let filter = resolve_filter_id("0x47505301").unwrap();
        assert_eq!(filter.as_bytes(), &[0x47, 0x50, 0x53, 0x01]);
    }

    #[test]
    fn rejects_wrong_length_id() {
        let err = resolve_filter_id("GPS").unwrap_err();
        assert_eq!(err.code, USAGE);

        let err = resolve_filter_id("GPS12").unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn rejects_malformed_hex_id() {
        assert_eq!(resolve_filter_id("0x4750").unwrap_err().code, USAGE);
        assert_eq!(resolve_filter_id("0xZZZZZZZZ").unwrap_err().code, USAGE);
    }

    #[test]
    fn multibyte_utf8_id_is_rejected_by_byte_length() {
        // "héllo" style ids measure in bytes, not chars.
        let err = resolve_filter_id("ééé").unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
