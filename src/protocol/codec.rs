use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use super::{error::ProtocolError, strip_board_prefix, telemetry::Telemetry};

/// Datagram codec for one board: inbound datagrams not carrying this board's
/// prefix are dropped, outbound telemetry is prefixed.
///
/// Each call to `decode` sees exactly one datagram.
#[derive(Debug, Clone)]
pub struct BoardCodec {
    board_id: u8,
    max_packet_length: usize,
}

impl BoardCodec {
    pub fn new(board_id: u8, max_packet_length: usize) -> Self {
        Self {
            board_id,
            max_packet_length,
        }
    }
}

impl Decoder for BoardCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        if src.is_empty() {
            return Ok(None);
        }

        let datagram = src.split_to(src.len());
        let len = datagram.len().min(self.max_packet_length);
        let text = String::from_utf8_lossy(&datagram[..len]);

        match strip_board_prefix(self.board_id, &text) {
            Some(command) => Ok(Some(command.to_string())),
            None => {
                trace!("Dropping datagram for another board: {}", text);
                Ok(None)
            }
        }
    }
}

impl Encoder<Telemetry> for BoardCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Telemetry, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let text = item.encode(self.board_id);
        dst.reserve(text.len());
        dst.put_slice(text.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_strips_matching_prefix() {
        let mut codec = BoardCodec::new(1, 100);
        let mut buf = BytesMut::from(&b"BOARD:1;CMD:Mode AUTO"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("CMD:Mode AUTO".to_string())
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_drops_other_board() {
        let mut codec = BoardCodec::new(1, 100);
        let mut buf = BytesMut::from(&b"BOARD:2;CMD:Mode AUTO"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_truncates_long_datagram() {
        let mut codec = BoardCodec::new(1, 16);
        let mut buf = BytesMut::from(&b"BOARD:1;CMD:REQUEST_VALUES"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("CMD:REQU".to_string()));
    }

    #[test]
    fn test_encode_prefixes_board() {
        let mut codec = BoardCodec::new(2, 100);
        let mut buf = BytesMut::new();
        codec.encode(Telemetry::StateEngine(3), &mut buf).unwrap();
        assert_eq!(&buf[..], b"BOARD:2;STATE_ENGINE:3");
    }
}
