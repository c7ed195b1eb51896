use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio_util::codec::Decoder;
use tracing::debug;

use crate::frame::{self, Frame};
use crate::Error;

pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

/// Decodes the command frames clients send to the server.
///
/// Bytes that cannot start a command (anything but `*`) are dropped one at a time until an array
/// marker shows up.
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> FrameCodec {
        FrameCodec { max_frame_size }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Check if the frame size exceeds a certain limit to prevent DoS attacks
        if src.len() > self.max_frame_size {
            return Err("frame size exceeds limit".into());
        }

        while let Some(&byte) = src.first() {
            if byte == b'*' {
                break;
            }
            debug!("Skipping unrecognized frame type: {:?}", byte as char);
            src.advance(1);
        }

        decode_with(src, Frame::parse_command)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                if !src.is_empty() {
                    debug!("Discarding {} bytes of incomplete frame", src.len());
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

/// Decodes the replies the server sends back to a client.
#[derive(Default)]
pub struct ReplyCodec;

impl Decoder for ReplyCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_with(src, Frame::parse_reply)
    }
}

fn decode_with<F>(src: &mut BytesMut, parse: F) -> Result<Option<Frame>, Error>
where
    F: FnOnce(&mut Cursor<&[u8]>) -> Result<Frame, frame::Error>,
{
    let mut cursor = Cursor::new(&src[..]);
    let frame = match parse(&mut cursor) {
        Ok(frame) => frame,
        Err(frame::Error::Incomplete) => return Ok(None), // Not enough data to parse a frame.
        Err(err) => return Err(err.into()),
    };

    let position: usize = cursor.position().try_into()?;

    // Remove the parsed frame from the buffer.
    src.advance(position);

    Ok(Some(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn decode_command() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"*1\r\n$4\r\nPING\r\n"[..]);

        let frame = codec.decode(&mut buf).unwrap();

        assert_eq!(frame, Some(Frame::command(["PING"])));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_command_in_pieces() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"*2\r\n$3\r\nGET\r\n$3\r\nfo"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        // Nothing is consumed until the whole frame is there.
        assert_eq!(buf.len(), 19);

        buf.extend_from_slice(b"o\r\n");

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::command(["GET", "foo"]))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_skips_unrecognized_leading_bytes() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"PING\r\n*1\r\n$4\r\nPING\r\n"[..]);

        let frame = codec.decode(&mut buf).unwrap();

        assert_eq!(frame, Some(Frame::command(["PING"])));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_only_garbage() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"hello\r\n"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_consecutive_commands() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"*1\r\n$4\r\nPING\r\n*2\r\n$3\r\nGET\r\n$1\r\nk\r\n"[..]);

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::command(["PING"]))
        );
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::command(["GET", "k"]))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn decode_frame_too_large() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::from(&b"*1\r\n$5\r\nhello\r\n"[..]);

        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn decode_eof_discards_partial_frame() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"*2\r\n$3\r\nSET\r\n"[..]);

        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_reply() {
        let mut codec = ReplyCodec;
        let mut buf = BytesMut::from(&b"$3\r\nbar\r\n+OK\r\n"[..]);

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Bulk(Bytes::from("bar")))
        );
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Simple("OK".to_string()))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn decode_reply_unknown_type() {
        let mut codec = ReplyCodec;
        let mut buf = BytesMut::from(&b"#t\r\n"[..]);

        assert!(codec.decode(&mut buf).is_err());
    }
}
