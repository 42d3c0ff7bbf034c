use std::sync::Arc;

use aerolink_schema::MessageSet;
use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::codec::{FRAME_CHECKSUM_LEN, FRAME_SIGNATURE_LEN};
use crate::crc::frame_crc;
use crate::header::{Header, ProtocolVersion};
use crate::message::Message;

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// One decoded item from the stream.
#[derive(Debug)]
pub enum DecoderEvent {
    /// A checksum-verified message known to the message set.
    Message(Message),
    /// A structurally complete frame whose id the message set does not
    /// know. The header length is trusted, so the stream position has
    /// already advanced past it.
    UnknownMessage { id: u32, len: usize },
}

/// Running decode counters, for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecoderStats {
    /// Checksum-verified messages produced.
    pub messages: u64,
    /// Structurally valid frames with an unregistered message id.
    pub unknown_messages: u64,
    /// Candidate frames dropped on checksum mismatch.
    pub checksum_failures: u64,
    /// Bytes discarded while scanning for a magic byte.
    pub skipped_bytes: u64,
}

/// Incremental frame decoder over a raw byte stream.
///
/// Bytes go in through [`push`](StreamDecoder::push) in whatever chunks
/// the transport produces; complete, verified messages come out of
/// [`next_event`](StreamDecoder::next_event). The decoder buffers partial
/// frames across pushes and is self-resynchronizing: garbage bytes and
/// frames that fail their checksum are skipped one byte at a time until
/// the next magic byte lines up.
pub struct StreamDecoder {
    set: Arc<MessageSet>,
    buf: BytesMut,
    stats: DecoderStats,
}

impl StreamDecoder {
    /// Decoder resolving message ids against the given set.
    pub fn new(set: Arc<MessageSet>) -> Self {
        Self {
            set,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            stats: DecoderStats::default(),
        }
    }

    /// Append raw stream bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes currently buffered (partial frame awaiting more data).
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Decode counters so far.
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Pull the next event out of the buffered stream.
    ///
    /// Returns `None` when the buffer holds no complete frame; push more
    /// bytes and try again.
    pub fn next_event(&mut self) -> Option<DecoderEvent> {
        loop {
            // Resynchronize: the frame must start on a magic byte.
            while let Some(&byte) = self.buf.first() {
                if ProtocolVersion::from_magic(byte).is_some() {
                    break;
                }
                self.buf.advance(1);
                self.stats.skipped_bytes += 1;
            }

            let version = ProtocolVersion::from_magic(*self.buf.first()?)?;
            let header_len = version.header_len();
            if self.buf.len() < header_len {
                return None;
            }

            let header = Header::new(&self.buf[..header_len]);
            let payload_len = usize::from(header.len());
            let msg_id = header.message_id();
            let signed = header.is_signed();
            let total = header_len
                + payload_len
                + FRAME_CHECKSUM_LEN
                + if signed { FRAME_SIGNATURE_LEN } else { 0 };
            if self.buf.len() < total {
                return None;
            }

            let definition = match self.set.definition(msg_id) {
                Ok(definition) => definition,
                Err(_) => {
                    // No crc-extra to verify against; trust the header
                    // length and skip the frame as a unit.
                    self.buf.advance(total);
                    self.stats.unknown_messages += 1;
                    trace!(id = msg_id, len = payload_len, "unknown message id");
                    return Some(DecoderEvent::UnknownMessage {
                        id: msg_id,
                        len: payload_len,
                    });
                }
            };

            let crc_end = header_len + payload_len;
            let found =
                u16::from_le_bytes([self.buf[crc_end], self.buf[crc_end + 1]]);
            let computed = frame_crc(&self.buf[1..crc_end], definition.crc_extra());
            if payload_len > definition.max_payload_size() || computed != found {
                debug!(
                    id = msg_id,
                    expected = computed,
                    found,
                    "rejecting frame on checksum mismatch"
                );
                self.buf.advance(1);
                self.stats.checksum_failures += 1;
                continue;
            }

            let message = Message::from_wire(
                definition,
                &self.buf[..header_len],
                &self.buf[header_len..crc_end],
            );
            self.buf.advance(total);
            self.stats.messages += 1;
            return Some(DecoderEvent::Message(message));
        }
    }
}

#[cfg(test)]
mod tests {
    use aerolink_schema::{MessageDefinitionBuilder, WireType};

    use super::*;
    use crate::codec::encode;
    use crate::header::{Identifier, INCOMPAT_FLAG_SIGNED};
    use crate::message::MessageSetExt;

    fn test_set() -> Arc<MessageSet> {
        let mut builder = MessageSet::builder();
        builder
            .add(
                MessageDefinitionBuilder::new(0, "HEARTBEAT")
                    .crc_extra(50)
                    .field("type", WireType::U8)
                    .field("autopilot", WireType::U8)
                    .field("base_mode", WireType::U8)
                    .field("custom_mode", WireType::U32)
                    .field("system_status", WireType::U8)
                    .field("mavlink_version", WireType::U8)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        builder
            .add(
                MessageDefinitionBuilder::new(30, "ATTITUDE")
                    .crc_extra(39)
                    .field("time_boot_ms", WireType::U32)
                    .field("roll", WireType::F32)
                    .field("pitch", WireType::F32)
                    .field("yaw", WireType::F32)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        Arc::new(builder.build())
    }

    fn heartbeat_frame(set: &MessageSet, type_value: u8, seq: u8) -> bytes::Bytes {
        let mut msg = set.create_by_name("HEARTBEAT").unwrap();
        msg.set("type", type_value).unwrap();
        encode(&msg, Identifier::new(1, 1), seq).unwrap()
    }

    #[test]
    fn round_trip_through_the_decoder() {
        let set = test_set();
        let frame = heartbeat_frame(&set, 6, 3);

        let mut decoder = StreamDecoder::new(Arc::clone(&set));
        decoder.push(&frame);

        let event = decoder.next_event().unwrap();
        let msg = match event {
            DecoderEvent::Message(msg) => msg,
            other => panic!("expected message, got {other:?}"),
        };
        assert_eq!(msg.id(), 0);
        assert_eq!(msg.name(), "HEARTBEAT");
        assert_eq!(msg.get::<u8>("type").unwrap(), 6);
        assert_eq!(msg.header().seq(), 3);
        assert_eq!(msg.header().sender(), Identifier::new(1, 1));
        assert!(decoder.next_event().is_none());
        assert_eq!(decoder.stats().messages, 1);
    }

    #[test]
    fn trimmed_payload_zero_extends() {
        let set = test_set();
        // All-zero payload trims to a single byte on the wire.
        let frame = heartbeat_frame(&set, 0, 0);
        assert_eq!(frame[1], 1);

        let mut decoder = StreamDecoder::new(Arc::clone(&set));
        decoder.push(&frame);
        let DecoderEvent::Message(msg) = decoder.next_event().unwrap() else {
            panic!("expected message");
        };
        assert_eq!(msg.get::<u8>("mavlink_version").unwrap(), 0);
        assert_eq!(msg.payload().len(), 9);
    }

    #[test]
    fn partial_frames_need_more_data() {
        let set = test_set();
        let frame = heartbeat_frame(&set, 6, 0);

        let mut decoder = StreamDecoder::new(Arc::clone(&set));
        for chunk in frame.chunks(3) {
            assert!(decoder.next_event().is_none());
            decoder.push(chunk);
        }
        assert!(matches!(
            decoder.next_event(),
            Some(DecoderEvent::Message(_))
        ));
    }

    #[test]
    fn leading_garbage_is_skipped() {
        let set = test_set();
        let frame = heartbeat_frame(&set, 6, 0);

        let mut decoder = StreamDecoder::new(Arc::clone(&set));
        decoder.push(&[0x00, 0x55, 0xAA]);
        decoder.push(&frame);

        assert!(matches!(
            decoder.next_event(),
            Some(DecoderEvent::Message(_))
        ));
        assert_eq!(decoder.stats().skipped_bytes, 3);
    }

    #[test]
    fn corrupted_frame_resynchronizes_to_the_next_valid_one() {
        let set = test_set();
        let mut corrupted = heartbeat_frame(&set, 6, 0).to_vec();
        let last = corrupted.len() - 3;
        corrupted[last] ^= 0xFF; // flip a payload byte
        let valid = heartbeat_frame(&set, 9, 1);

        let mut decoder = StreamDecoder::new(Arc::clone(&set));
        decoder.push(&corrupted);
        decoder.push(&valid);

        let DecoderEvent::Message(msg) = decoder.next_event().unwrap() else {
            panic!("expected message");
        };
        assert_eq!(msg.get::<u8>("type").unwrap(), 9);
        assert!(decoder.next_event().is_none());
        assert_eq!(decoder.stats().messages, 1);
        assert!(decoder.stats().checksum_failures >= 1);
    }

    #[test]
    fn any_single_payload_flip_rejects_the_frame() {
        let set = test_set();
        let frame = heartbeat_frame(&set, 6, 0);
        let header_len = 10;
        let payload_len = usize::from(frame[1]);

        for i in header_len..header_len + payload_len {
            let mut bytes = frame.to_vec();
            bytes[i] ^= 0x01;

            let mut decoder = StreamDecoder::new(Arc::clone(&set));
            decoder.push(&bytes);
            while let Some(event) = decoder.next_event() {
                assert!(
                    !matches!(event, DecoderEvent::Message(_)),
                    "flip at {i} still decoded"
                );
            }
            assert_eq!(decoder.stats().messages, 0);
        }
    }

    #[test]
    fn unknown_id_is_reported_and_stream_advances() {
        let set = test_set();

        // Encode against a definition the receiving set does not know.
        let mut foreign = MessageSet::builder();
        foreign
            .add(
                MessageDefinitionBuilder::new(4242, "VENDOR_STATUS")
                    .crc_extra(77)
                    .field("state", WireType::U8)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let foreign = foreign.build();
        let mut msg = foreign.create(4242).unwrap();
        msg.set("state", 1u8).unwrap();
        let unknown = encode(&msg, Identifier::default(), 0).unwrap();

        let mut decoder = StreamDecoder::new(Arc::clone(&set));
        decoder.push(&unknown);
        decoder.push(&heartbeat_frame(&set, 6, 1));

        assert!(matches!(
            decoder.next_event(),
            Some(DecoderEvent::UnknownMessage { id: 4242, len: 1 })
        ));
        assert!(matches!(
            decoder.next_event(),
            Some(DecoderEvent::Message(_))
        ));
        assert_eq!(decoder.stats().unknown_messages, 1);
        assert_eq!(decoder.stats().checksum_failures, 0);
    }

    #[test]
    fn legacy_frames_decode_from_the_same_stream() {
        let set = test_set();
        let mut msg = set.create_by_name("HEARTBEAT").unwrap();
        msg.set("type", 2u8).unwrap();
        msg.set_protocol_version(ProtocolVersion::V1);
        let v1 = encode(&msg, Identifier::new(5, 5), 0).unwrap();
        let v2 = heartbeat_frame(&set, 3, 1);

        let mut decoder = StreamDecoder::new(Arc::clone(&set));
        decoder.push(&v1);
        decoder.push(&v2);

        let DecoderEvent::Message(first) = decoder.next_event().unwrap() else {
            panic!("expected message");
        };
        assert_eq!(first.protocol_version(), ProtocolVersion::V1);
        assert_eq!(first.get::<u8>("type").unwrap(), 2);

        let DecoderEvent::Message(second) = decoder.next_event().unwrap() else {
            panic!("expected message");
        };
        assert_eq!(second.protocol_version(), ProtocolVersion::V2);
        assert_eq!(second.get::<u8>("type").unwrap(), 3);
    }

    #[test]
    fn signed_frames_consume_the_signature() {
        let set = test_set();
        let frame = heartbeat_frame(&set, 6, 0);

        // Re-sign by hand: set the incompat bit, fix the checksum, append
        // a signature block.
        let mut bytes = frame.to_vec();
        bytes[2] |= INCOMPAT_FLAG_SIGNED;
        let crc_end = bytes.len() - 2;
        let def = set.definition(0).unwrap();
        let crc = crate::crc::frame_crc(&bytes[1..crc_end], def.crc_extra());
        bytes[crc_end..].copy_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 13]);

        let mut decoder = StreamDecoder::new(Arc::clone(&set));
        decoder.push(&bytes);
        decoder.push(&heartbeat_frame(&set, 7, 1));

        let DecoderEvent::Message(first) = decoder.next_event().unwrap() else {
            panic!("expected message");
        };
        assert!(first.header().is_signed());

        // The 13 signature bytes were consumed, not mistaken for a frame.
        let DecoderEvent::Message(second) = decoder.next_event().unwrap() else {
            panic!("expected message");
        };
        assert_eq!(second.get::<u8>("type").unwrap(), 7);
    }

    #[test]
    fn oversized_length_for_known_id_is_rejected() {
        let set = test_set();
        // Hand-build a frame claiming a 200-byte payload for HEARTBEAT.
        let mut bytes = vec![0xFD, 200, 0, 0, 0, 1, 1, 0, 0, 0];
        bytes.extend_from_slice(&[0u8; 202]);

        let mut decoder = StreamDecoder::new(Arc::clone(&set));
        decoder.push(&bytes);
        while decoder.next_event().is_some() {}
        assert_eq!(decoder.stats().messages, 0);
    }
}
