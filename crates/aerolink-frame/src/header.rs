use std::fmt;

use crate::codec::{MAGIC_V1, MAGIC_V2};

/// Incompat-flag bit marking a signed frame (13 trailing signature bytes).
pub const INCOMPAT_FLAG_SIGNED: u8 = 0x01;

/// Protocol identity of an endpoint: system id plus component id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub system_id: u8,
    pub component_id: u8,
}

impl Identifier {
    pub fn new(system_id: u8, component_id: u8) -> Self {
        Self {
            system_id,
            component_id,
        }
    }
}

impl Default for Identifier {
    /// The reference default identity, `97/97`.
    fn default() -> Self {
        Self::new(97, 97)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.system_id, self.component_id)
    }
}

/// Wire protocol version, determined by the frame's magic byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// Legacy form: 6-byte header, single-byte message id.
    V1,
    /// Extended form: 10-byte header, flag bytes, 3-byte message id,
    /// optional signature.
    V2,
}

impl ProtocolVersion {
    /// The magic byte opening a frame of this version.
    pub fn magic(self) -> u8 {
        match self {
            ProtocolVersion::V1 => MAGIC_V1,
            ProtocolVersion::V2 => MAGIC_V2,
        }
    }

    /// Header length in bytes.
    pub fn header_len(self) -> usize {
        match self {
            ProtocolVersion::V1 => 6,
            ProtocolVersion::V2 => 10,
        }
    }

    /// Version for a magic byte, if recognized.
    pub fn from_magic(magic: u8) -> Option<Self> {
        match magic {
            MAGIC_V1 => Some(ProtocolVersion::V1),
            MAGIC_V2 => Some(ProtocolVersion::V2),
            _ => None,
        }
    }
}

/// Read-only overlay on the leading bytes of a frame buffer.
///
/// The header has no storage of its own: every accessor reads the
/// underlying frame bytes directly. The buffer must hold at least the
/// header for its version; [`Message`](crate::Message) buffers always do.
#[derive(Clone, Copy)]
pub struct Header<'a> {
    buf: &'a [u8],
}

impl<'a> Header<'a> {
    /// Overlay a buffer that starts with a frame header. The buffer must
    /// hold at least the header for its version.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Protocol version derived from the magic byte.
    pub fn version(&self) -> ProtocolVersion {
        // Message buffers are stamped with a valid magic at creation.
        ProtocolVersion::from_magic(self.buf[0]).unwrap_or(ProtocolVersion::V2)
    }

    /// Frame start marker.
    pub fn magic(&self) -> u8 {
        self.buf[0]
    }

    /// Payload length in bytes.
    pub fn len(&self) -> u8 {
        self.buf[1]
    }

    /// Incompatibility flags. Always zero on legacy frames.
    pub fn incompat_flags(&self) -> u8 {
        match self.version() {
            ProtocolVersion::V1 => 0,
            ProtocolVersion::V2 => self.buf[2],
        }
    }

    /// Compatibility flags. Always zero on legacy frames.
    pub fn compat_flags(&self) -> u8 {
        match self.version() {
            ProtocolVersion::V1 => 0,
            ProtocolVersion::V2 => self.buf[3],
        }
    }

    /// Packet sequence number.
    pub fn seq(&self) -> u8 {
        match self.version() {
            ProtocolVersion::V1 => self.buf[2],
            ProtocolVersion::V2 => self.buf[4],
        }
    }

    /// Sender system id.
    pub fn system_id(&self) -> u8 {
        match self.version() {
            ProtocolVersion::V1 => self.buf[3],
            ProtocolVersion::V2 => self.buf[5],
        }
    }

    /// Sender component id.
    pub fn component_id(&self) -> u8 {
        match self.version() {
            ProtocolVersion::V1 => self.buf[4],
            ProtocolVersion::V2 => self.buf[6],
        }
    }

    /// Message id. One byte on legacy frames, three on extended ones.
    pub fn message_id(&self) -> u32 {
        match self.version() {
            ProtocolVersion::V1 => u32::from(self.buf[5]),
            ProtocolVersion::V2 => {
                u32::from(self.buf[7])
                    | u32::from(self.buf[8]) << 8
                    | u32::from(self.buf[9]) << 16
            }
        }
    }

    /// Sender identity as one value.
    pub fn sender(&self) -> Identifier {
        Identifier::new(self.system_id(), self.component_id())
    }

    /// Whether the signed-frame incompat bit is set.
    pub fn is_signed(&self) -> bool {
        self.incompat_flags() & INCOMPAT_FLAG_SIGNED != 0
    }
}

impl fmt::Debug for Header<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("version", &self.version())
            .field("len", &self.len())
            .field("seq", &self.seq())
            .field("system_id", &self.system_id())
            .field("component_id", &self.component_id())
            .field("message_id", &self.message_id())
            .finish()
    }
}

/// Mutable overlay on the leading bytes of a frame buffer.
///
/// Setters write the underlying frame bytes in place.
pub struct HeaderMut<'a> {
    buf: &'a mut [u8],
}

impl<'a> HeaderMut<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf }
    }

    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::from_magic(self.buf[0]).unwrap_or(ProtocolVersion::V2)
    }

    /// Read view over the same bytes.
    pub fn as_header(&self) -> Header<'_> {
        Header::new(self.buf)
    }

    /// Set the payload length byte.
    pub fn set_len(&mut self, len: u8) -> &mut Self {
        self.buf[1] = len;
        self
    }

    /// Set the incompatibility flags. Ignored on legacy frames.
    pub fn set_incompat_flags(&mut self, flags: u8) -> &mut Self {
        if self.version() == ProtocolVersion::V2 {
            self.buf[2] = flags;
        }
        self
    }

    /// Set the compatibility flags. Ignored on legacy frames.
    pub fn set_compat_flags(&mut self, flags: u8) -> &mut Self {
        if self.version() == ProtocolVersion::V2 {
            self.buf[3] = flags;
        }
        self
    }

    /// Set the packet sequence number.
    pub fn set_seq(&mut self, seq: u8) -> &mut Self {
        match self.version() {
            ProtocolVersion::V1 => self.buf[2] = seq,
            ProtocolVersion::V2 => self.buf[4] = seq,
        }
        self
    }

    /// Set the sender system id.
    pub fn set_system_id(&mut self, id: u8) -> &mut Self {
        match self.version() {
            ProtocolVersion::V1 => self.buf[3] = id,
            ProtocolVersion::V2 => self.buf[5] = id,
        }
        self
    }

    /// Set the sender component id.
    pub fn set_component_id(&mut self, id: u8) -> &mut Self {
        match self.version() {
            ProtocolVersion::V1 => self.buf[4] = id,
            ProtocolVersion::V2 => self.buf[6] = id,
        }
        self
    }

    /// Set the message id in the version's id width.
    pub fn set_message_id(&mut self, id: u32) -> &mut Self {
        match self.version() {
            ProtocolVersion::V1 => self.buf[5] = id as u8,
            ProtocolVersion::V2 => {
                self.buf[7] = id as u8;
                self.buf[8] = (id >> 8) as u8;
                self.buf[9] = (id >> 16) as u8;
            }
        }
        self
    }

    /// Stamp the sender identity.
    pub fn set_sender(&mut self, sender: Identifier) -> &mut Self {
        self.set_system_id(sender.system_id)
            .set_component_id(sender.component_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v2_layout_round_trips_through_the_overlay() {
        let mut buf = [0u8; 10];
        buf[0] = MAGIC_V2;
        {
            let mut header = HeaderMut::new(&mut buf);
            header
                .set_len(9)
                .set_incompat_flags(0)
                .set_compat_flags(0)
                .set_seq(42)
                .set_sender(Identifier::new(1, 200))
                .set_message_id(0x00C2_3B07);
        }

        let header = Header::new(&buf);
        assert_eq!(header.version(), ProtocolVersion::V2);
        assert_eq!(header.len(), 9);
        assert_eq!(header.seq(), 42);
        assert_eq!(header.system_id(), 1);
        assert_eq!(header.component_id(), 200);
        assert_eq!(header.message_id(), 0x00C2_3B07);
        // Id bytes landed little-endian in the raw frame.
        assert_eq!(&buf[7..10], &[0x07, 0x3B, 0xC2]);
    }

    #[test]
    fn v1_layout_uses_the_short_header() {
        let mut buf = [0u8; 6];
        buf[0] = MAGIC_V1;
        {
            let mut header = HeaderMut::new(&mut buf);
            header
                .set_len(3)
                .set_seq(7)
                .set_sender(Identifier::new(9, 8))
                .set_message_id(77);
        }

        let header = Header::new(&buf);
        assert_eq!(header.version(), ProtocolVersion::V1);
        assert_eq!(header.len(), 3);
        assert_eq!(header.seq(), 7);
        assert_eq!(header.sender(), Identifier::new(9, 8));
        assert_eq!(header.message_id(), 77);
        assert_eq!(header.incompat_flags(), 0);
        assert!(!header.is_signed());
    }

    #[test]
    fn mutating_the_overlay_mutates_the_frame_bytes() {
        let mut buf = [0u8; 10];
        buf[0] = MAGIC_V2;
        HeaderMut::new(&mut buf).set_seq(0xAB);
        assert_eq!(buf[4], 0xAB);
    }

    #[test]
    fn signed_flag_detected() {
        let mut buf = [0u8; 10];
        buf[0] = MAGIC_V2;
        HeaderMut::new(&mut buf).set_incompat_flags(INCOMPAT_FLAG_SIGNED);
        assert!(Header::new(&buf).is_signed());
    }

    #[test]
    fn default_identity_is_97_97() {
        assert_eq!(Identifier::default(), Identifier::new(97, 97));
    }
}
