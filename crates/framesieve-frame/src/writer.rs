use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, Frame, FrameConfig};
use crate::error::{DemuxError, Result};

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.header.id, frame.header.timestamp, frame.payload.as_ref())
    }

    /// Encode and write one frame.
    pub fn send(&mut self, id: [u8; 4], timestamp: [u8; 6], payload: &[u8]) -> Result<()> {
        if payload.len() > self.config.max_payload_size {
            return Err(DemuxError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_frame(id, timestamp, payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => {
                    return Err(DemuxError::Io(std::io::Error::from(ErrorKind::WriteZero)))
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(DemuxError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(DemuxError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame encoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::Bytes;

    use super::*;
    use crate::reader::FrameReader;

    #[test]
    fn written_frames_decode() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = FrameWriter::new(cursor);

        writer.send(*b"AAAA", [1, 2, 3, 4, 5, 6], b"hello").unwrap();
        writer.send(*b"BBBB", [0; 6], b"world").unwrap();

        let wire = writer.into_inner().into_inner();
        let mut reader = FrameReader::new(Cursor::new(wire));

        let f1 = reader.read_frame().unwrap().unwrap();
        let f2 = reader.read_frame().unwrap().unwrap();

        assert_eq!(f1.header.id, *b"AAAA");
        assert_eq!(f1.header.timestamp, [1, 2, 3, 4, 5, 6]);
        assert_eq!(f1.payload.as_ref(), b"hello");
        assert_eq!(f2.header.id, *b"BBBB");
        assert_eq!(f2.payload.as_ref(), b"world");
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn roundtrip_preserves_tuples() {
        let frames = [
            (*b"GPS\x01", [0u8, 0, 0, 0, 0, 1], b"fix".to_vec()),
            (*b"ADIS", [0u8, 0, 0, 0, 0, 2], vec![0xFFu8; 1024]),
            (*b"ROLL", [9u8; 6], Vec::new()),
        ];

        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        for (id, ts, payload) in &frames {
            writer.send(*id, *ts, payload).unwrap();
        }

        let wire = writer.into_inner().into_inner();
        let mut reader = FrameReader::new(Cursor::new(wire));
        for (id, ts, payload) in &frames {
            let frame = reader.read_frame().unwrap().unwrap();
            assert_eq!(frame.header.id, *id);
            assert_eq!(frame.header.timestamp, *ts);
            assert_eq!(frame.payload.as_ref(), payload.as_slice());
        }
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn payload_too_large_rejected() {
        let cfg = FrameConfig {
            max_payload_size: 4,
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.send(*b"OVER", [0; 6], b"oversized").unwrap_err();
        assert!(matches!(err, DemuxError::PayloadTooLarge { .. }));
    }

    #[test]
    fn write_frame_method() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let frame = Frame::new(*b"FRME", [7; 6], Bytes::from_static(b"abc"));

        writer.write_frame(&frame).unwrap();

        let wire = writer.into_inner().into_inner();
        let mut reader = FrameReader::new(Cursor::new(wire));
        let decoded = reader.read_frame().unwrap().unwrap();
        assert_eq!(decoded.header.id, *b"FRME");
        assert_eq!(decoded.payload.as_ref(), b"abc");
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        struct InterruptedWriteThenFlush {
            wrote_once: bool,
            flush_interrupted: bool,
            data: Vec<u8>,
        }

        impl Write for InterruptedWriteThenFlush {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                if !self.wrote_once {
                    self.wrote_once = true;
                    return Err(std::io::Error::from(ErrorKind::Interrupted));
                }
                self.data.extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                if !self.flush_interrupted {
                    self.flush_interrupted = true;
                    return Err(std::io::Error::from(ErrorKind::Interrupted));
                }
                Ok(())
            }
        }

        let mut writer = FrameWriter::new(InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        });
        writer.send(*b"RTRY", [0; 6], b"retry").unwrap();

        let inner = writer.into_inner();
        assert!(!inner.data.is_empty());
    }

    #[test]
    fn zero_length_write_is_an_error() {
        struct ZeroWriter;

        impl Write for ZeroWriter {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(*b"DEAD", [0; 6], b"x").unwrap_err();
        assert!(matches!(err, DemuxError::Io(e) if e.kind() == ErrorKind::WriteZero));
    }
}
