use std::fmt;
use std::io::{Read, Write};

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::codec::{encode_header, FrameConfig, DEFAULT_MAX_PAYLOAD};
use crate::error::{DemuxError, Result};
use crate::reader::FrameReader;

/// The 4-byte identifier that frames must carry to be forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterId([u8; 4]);

impl FilterId {
    /// Build a filter id from a slice; `None` unless it is exactly 4 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let id: [u8; 4] = bytes.try_into().ok()?;
        Some(Self(id))
    }

    /// The raw filter bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Byte-for-byte comparison against a frame id. No case folding, no
    /// prefix matching.
    pub fn matches(&self, id: &[u8; 4]) -> bool {
        self.0 == *id
    }
}

impl From<[u8; 4]> for FilterId {
    fn from(id: [u8; 4]) -> Self {
        Self(id)
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

/// What a matching frame contributes to the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Forward {
    /// Payload bytes only; the header is dropped.
    #[default]
    Payload,
    /// The complete frame, header included, for downstream re-framing.
    Frame,
}

/// Configuration for a demultiplexer run.
#[derive(Debug, Clone)]
pub struct DemuxConfig {
    /// Maximum accepted payload size in bytes. Default: 1 KiB.
    pub max_payload_size: usize,
    /// Forwarding mode for matching frames.
    pub forward: Forward,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            forward: Forward::default(),
        }
    }
}

/// Counters from a completed demultiplexer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemuxStats {
    /// Frames decoded from the input, matching or not.
    pub frames: u64,
    /// Frames whose id matched the filter.
    pub matched: u64,
    /// Bytes written to the output stream.
    pub bytes_out: u64,
}

/// Separates a mixed frame stream into the frames carrying one id.
///
/// The one subtle correctness property lives here: a discarded frame's
/// payload bytes are still consumed from the input (the reader does this),
/// so the next header is decoded at the right offset. Skipping fewer or
/// more bytes would misparse every following frame.
#[derive(Debug, Clone)]
pub struct Demux {
    filter: FilterId,
    config: DemuxConfig,
}

impl Demux {
    /// Create a demultiplexer with default configuration.
    pub fn new(filter: FilterId) -> Self {
        Self::with_config(filter, DemuxConfig::default())
    }

    /// Create a demultiplexer with explicit configuration.
    pub fn with_config(filter: FilterId, config: DemuxConfig) -> Self {
        Self { filter, config }
    }

    /// The configured filter id.
    pub fn filter(&self) -> FilterId {
        self.filter
    }

    /// Decode frames from `input` until it is exhausted, forwarding
    /// matching frames to `output` in input order.
    ///
    /// Returns counters on success. Any malformed-frame condition or I/O
    /// failure ends the run immediately; the format has no marker to
    /// resynchronize on, so no recovery is attempted.
    pub fn run<R: Read, W: Write>(&self, input: R, mut output: W) -> Result<DemuxStats> {
        let mut reader = FrameReader::with_config(
            input,
            FrameConfig {
                max_payload_size: self.config.max_payload_size,
            },
        );

        let mut stats = DemuxStats::default();
        let mut scratch = BytesMut::new();

        while let Some(frame) = reader.read_frame()? {
            stats.frames += 1;

            if !self.filter.matches(&frame.header.id) {
                trace!(
                    id = %FilterId::from(frame.header.id),
                    len = frame.header.data_length,
                    "discarded frame"
                );
                continue;
            }

            match self.config.forward {
                Forward::Payload => {
                    output.write_all(&frame.payload)?;
                    stats.bytes_out += frame.payload.len() as u64;
                }
                Forward::Frame => {
                    scratch.clear();
                    encode_header(&frame.header, &mut scratch);
                    output.write_all(&scratch)?;
                    output.write_all(&frame.payload)?;
                    stats.bytes_out += frame.wire_size() as u64;
                }
            }
            stats.matched += 1;
            trace!(len = frame.header.data_length, "forwarded frame");
        }

        output.flush().map_err(DemuxError::Io)?;
        debug!(
            filter = %self.filter,
            frames = stats.frames,
            matched = stats.matched,
            bytes_out = stats.bytes_out,
            "input stream drained"
        );
        Ok(stats)
    }
}
