use aerolink_schema::definition::{CHECKSUM_LEN, SIGNATURE_LEN};
use bytes::{BufMut, Bytes, BytesMut};

use crate::crc::frame_crc;
use crate::error::{Result, WireError};
use crate::header::{Identifier, ProtocolVersion, INCOMPAT_FLAG_SIGNED};
use crate::message::Message;

/// Magic byte opening an extended frame.
pub const MAGIC_V2: u8 = 0xFD;
/// Magic byte opening a legacy frame.
pub const MAGIC_V1: u8 = 0xFE;

pub(crate) const FRAME_CHECKSUM_LEN: usize = CHECKSUM_LEN;
pub(crate) const FRAME_SIGNATURE_LEN: usize = SIGNATURE_LEN;

/// Encode a message into a caller-owned wire frame.
///
/// The header is stamped with `sender` and `seq`; the message's own header
/// bytes supply the protocol version and flag bytes. Extended frames drop
/// trailing zero payload bytes (to a minimum of one); legacy frames carry
/// the full payload. The signing incompat bit is never emitted; producing
/// signatures is outside the codec.
pub fn encode(message: &Message, sender: Identifier, seq: u8) -> Result<Bytes> {
    let definition = message.definition();
    let payload = message.payload();
    let version = message.protocol_version();

    let payload_len = match version {
        ProtocolVersion::V1 => {
            if definition.id() > u32::from(u8::MAX) {
                return Err(WireError::IdOutOfRange {
                    id: definition.id(),
                });
            }
            payload.len()
        }
        ProtocolVersion::V2 => trimmed_len(payload),
    };

    let header_len = version.header_len();
    let mut out = BytesMut::with_capacity(header_len + payload_len + FRAME_CHECKSUM_LEN);
    out.put_u8(version.magic());
    out.put_u8(payload_len as u8);
    if version == ProtocolVersion::V2 {
        out.put_u8(message.header().incompat_flags() & !INCOMPAT_FLAG_SIGNED);
        out.put_u8(message.header().compat_flags());
    }
    out.put_u8(seq);
    out.put_u8(sender.system_id);
    out.put_u8(sender.component_id);
    match version {
        ProtocolVersion::V1 => out.put_u8(definition.id() as u8),
        ProtocolVersion::V2 => {
            let id = definition.id();
            out.put_u8(id as u8);
            out.put_u8((id >> 8) as u8);
            out.put_u8((id >> 16) as u8);
        }
    }
    out.put_slice(&payload[..payload_len]);

    let crc = frame_crc(&out[1..], definition.crc_extra());
    out.put_u16_le(crc);

    Ok(out.freeze())
}

/// Payload length with trailing zero bytes dropped, at least one byte for
/// non-empty payloads.
fn trimmed_len(payload: &[u8]) -> usize {
    if payload.is_empty() {
        return 0;
    }
    let mut len = payload.len();
    while len > 1 && payload[len - 1] == 0 {
        len -= 1;
    }
    len
}
