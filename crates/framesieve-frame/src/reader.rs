use std::io::{ErrorKind, Read};

use bytes::Bytes;

use crate::codec::{decode_header, Frame, FrameConfig, HEADER_SIZE};
use crate::error::{DemuxError, Result};

/// Reads complete frames from any `Read` stream.
///
/// Every stream read is an exact-length read: short reads are classified
/// against the expected length instead of being passed through as data.
pub struct FrameReader<T> {
    inner: T,
    payload_buf: Vec<u8>,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            payload_buf: Vec::new(),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Ok(None)` on a clean end of stream, i.e. EOF landing
    /// exactly on a header boundary. EOF anywhere else is an error:
    /// [`DemuxError::TruncatedHeader`] inside the header,
    /// [`DemuxError::TruncatedPayload`] inside the payload.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut header_bytes = [0u8; HEADER_SIZE];
        match read_full(&mut self.inner, &mut header_bytes)? {
            0 => return Ok(None),
            HEADER_SIZE => {}
            got => return Err(DemuxError::TruncatedHeader { got }),
        }

        let header = decode_header(&header_bytes);
        let expected = header.data_length as usize;

        // Bound check before any payload byte is read or buffered.
        if expected > self.config.max_payload_size {
            return Err(DemuxError::PayloadTooLarge {
                size: expected,
                max: self.config.max_payload_size,
            });
        }

        self.payload_buf.resize(expected, 0);
        let got = read_full(&mut self.inner, &mut self.payload_buf)?;
        if got != expected {
            return Err(DemuxError::TruncatedPayload { expected, got });
        }

        Ok(Some(Frame {
            header,
            payload: Bytes::copy_from_slice(&self.payload_buf),
        }))
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame decoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

/// Fill `buf` from `reader`, retrying interrupted reads.
///
/// Returns the number of bytes actually obtained, which is less than
/// `buf.len()` only when the stream ended first.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
