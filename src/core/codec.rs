//! # Frame Codec
//!
//! Tokio codec for newline-delimited frames over byte streams.
//!
//! One frame is one wire message: the bytes up to (and not including) a
//! single `\n` delimiter. The codec hands complete frames to the session
//! handler as UTF-8 strings and appends the delimiter on the way out; it
//! knows nothing about the JSON inside a frame.
//!
//! ## Security
//! - Maximum frame size: 16MB (prevents memory exhaustion from a peer
//!   that never sends the delimiter)

use crate::config::MAX_FRAME_SIZE;
use crate::error::ProtocolError;
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Newline-delimited frame codec used by every session stream.
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        let Some(delimiter) = src.iter().position(|&b| b == b'\n') else {
            if src.len() > MAX_FRAME_SIZE {
                return Err(ProtocolError::OversizedFrame(src.len()));
            }
            return Ok(None);
        };

        let line = src.split_to(delimiter + 1);
        let frame = &line[..line.len() - 1];
        match std::str::from_utf8(frame) {
            Ok(text) => Ok(Some(text.to_owned())),
            Err(_) => Err(ProtocolError::MalformedFrame),
        }
    }
}

impl Encoder<String> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        dst.reserve(item.len() + 1);
        dst.put_slice(item.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn decodes_one_frame_and_strips_delimiter() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::from(&b"{\"version\":1}\n"[..]);
        let frame = codec.decode(&mut buf).expect("decode").expect("frame");
        assert_eq!(frame, "{\"version\":1}");
        assert!(buf.is_empty());
    }

    #[test]
    fn waits_for_delimiter() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::from(&b"{\"version\":1"[..]);
        assert!(codec.decode(&mut buf).expect("decode").is_none());

        buf.extend_from_slice(b"}\n");
        let frame = codec.decode(&mut buf).expect("decode").expect("frame");
        assert_eq!(frame, "{\"version\":1}");
    }

    #[test]
    fn decodes_back_to_back_frames_one_at_a_time() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::from(&b"first\nsecond\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "first");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "second");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn empty_frame_is_allowed() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::from(&b"\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "");
    }

    #[test]
    fn rejects_invalid_utf8() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::from(&[0xFFu8, 0xFE, b'\n'][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::MalformedFrame)
        ));
    }

    #[test]
    fn rejects_oversized_buffer_without_delimiter() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::from(vec![b'a'; MAX_FRAME_SIZE + 1].as_slice());
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::OversizedFrame(_))
        ));
    }

    #[test]
    fn encode_appends_delimiter() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        codec
            .encode("{\"version\":1}".to_string(), &mut buf)
            .expect("encode");
        assert_eq!(&buf[..], b"{\"version\":1}\n");
    }
}
