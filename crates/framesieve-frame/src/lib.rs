//! Length-prefixed binary frame decoding and id-based demultiplexing.
//!
//! Every frame on the wire is:
//! - A 4-byte opaque id, compared verbatim when filtering
//! - A 6-byte opaque timestamp, carried through unexamined
//! - A 2-byte big-endian payload length
//! - That many payload bytes, packed back-to-back with the next frame
//!
//! [`Demux`] reduces such a mixed stream to the frames carrying a single
//! id. Short reads, oversized length claims, and mid-frame EOF are all
//! reported as distinct errors rather than silently misparsed.

pub mod codec;
pub mod demux;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_header, encode_frame, encode_header, Frame, FrameConfig, Header, DEFAULT_MAX_PAYLOAD,
    HEADER_SIZE,
};
pub use demux::{Demux, DemuxConfig, DemuxStats, FilterId, Forward};
pub use error::{DemuxError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
