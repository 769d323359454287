use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{DemuxError, Result};

/// Frame header: id (4) + timestamp (6) + data length (2) = 12 bytes.
pub const HEADER_SIZE: usize = 12;

/// Default maximum payload size: 1 KiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024;

/// The fixed-layout header that starts every frame on the wire.
///
/// `id` and `timestamp` are opaque byte arrays carried through unmodified;
/// only `data_length` is interpreted, and it is big-endian on the wire
/// regardless of host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// 4-byte frame identifier, compared verbatim.
    pub id: [u8; 4],
    /// 6-byte opaque timestamp, never interpreted.
    pub timestamp: [u8; 6],
    /// Number of payload bytes following the header.
    pub data_length: u16,
}

/// A decoded frame: header plus `data_length` payload bytes.
#[derive(Debug, Clone)]
pub struct Frame {
    pub header: Header,
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame, deriving `data_length` from the payload.
    ///
    /// Panics in debug builds if the payload does not fit in a `u16`;
    /// use [`encode_frame`] for a checked encode path.
    pub fn new(id: [u8; 4], timestamp: [u8; 6], payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        debug_assert!(payload.len() <= u16::MAX as usize);
        Self {
            header: Header {
                id,
                timestamp,
                data_length: payload.len() as u16,
            },
            payload,
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Decode a header from exactly [`HEADER_SIZE`] bytes.
///
/// Wire format:
/// ```text
/// ┌────────────┬─────────────────┬──────────────┬─────────────────┐
/// │ Id (4B)    │ Timestamp (6B)  │ Length       │ Payload          │
/// │ opaque     │ opaque          │ (2B BE)      │ (Length bytes)   │
/// └────────────┴─────────────────┴──────────────┴─────────────────┘
/// ```
pub fn decode_header(bytes: &[u8; HEADER_SIZE]) -> Header {
    let mut id = [0u8; 4];
    id.copy_from_slice(&bytes[0..4]);
    let mut timestamp = [0u8; 6];
    timestamp.copy_from_slice(&bytes[4..10]);
    Header {
        id,
        timestamp,
        data_length: u16::from_be_bytes([bytes[10], bytes[11]]),
    }
}

/// Encode a header into the wire format.
pub fn encode_header(header: &Header, dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE);
    dst.put_slice(&header.id);
    dst.put_slice(&header.timestamp);
    dst.put_u16(header.data_length);
}

/// Encode a complete frame into the wire format.
///
/// Fails with [`DemuxError::PayloadTooLarge`] if the payload cannot be
/// represented by the 16-bit length field.
pub fn encode_frame(
    id: [u8; 4],
    timestamp: [u8; 6],
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    if payload.len() > u16::MAX as usize {
        return Err(DemuxError::PayloadTooLarge {
            size: payload.len(),
            max: u16::MAX as usize,
        });
    }
    let header = Header {
        id,
        timestamp,
        data_length: payload.len() as u16,
    };
    dst.reserve(HEADER_SIZE + payload.len());
    encode_header(&header, dst);
    dst.put_slice(payload);
    Ok(())
}

/// Configuration for frame decoding.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum accepted payload size in bytes. Default: 1 KiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
