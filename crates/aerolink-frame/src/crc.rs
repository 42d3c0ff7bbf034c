//! Incremental checksum accumulator.
//!
//! The wire checksum is CRC-16/MCRF4XX (the X.25 variant used by
//! MAVLink-family protocols), seeded per message type by accumulating the
//! definition's crc-extra byte after the covered frame bytes.

static CRC16: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_MCRF4XX);

/// Incremental 16-bit checksum accumulator.
pub struct Crc {
    digest: crc::Digest<'static, u16>,
}

impl Crc {
    /// Fresh accumulator.
    pub fn new() -> Self {
        Self {
            digest: CRC16.digest(),
        }
    }

    /// Fold a slice of bytes into the running checksum.
    pub fn accumulate(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    /// Fold a single byte (used for the crc-extra seed).
    pub fn accumulate_byte(&mut self, byte: u8) {
        self.digest.update(&[byte]);
    }

    /// Finish and return the 16-bit checksum.
    pub fn crc16(self) -> u16 {
        self.digest.finalize()
    }

    /// Finish and return the folded 8-bit checksum (low byte XOR high
    /// byte).
    pub fn crc8(self) -> u8 {
        let crc = self.digest.finalize();
        (crc & 0xFF) as u8 ^ (crc >> 8) as u8
    }
}

impl Default for Crc {
    fn default() -> Self {
        Self::new()
    }
}

/// Checksum of the covered frame region plus the message's crc-extra.
pub fn frame_crc(covered: &[u8], crc_extra: u8) -> u16 {
    let mut crc = Crc::new();
    crc.accumulate(covered);
    crc.accumulate_byte(crc_extra);
    crc.crc16()
}
