// CRC-32 (IEEE 802.3, reflected polynomial 0xEDB88320) fed field by field.
//
// On-disk checksums here are defined over a logical field sequence, not over
// a serialized buffer: the GPT header CRC counts its own slot and the
// reserved bytes as zero whatever the sector actually contains. The typed
// update methods keep call sites in the same order as the on-disk layout.

use crc32fast::Hasher;

/// Incremental CRC-32 engine. Multi-byte values are folded in
/// least-significant byte first.
pub struct Crc32 {
    hasher: Hasher,
}

impl Crc32 {
    pub fn new() -> Crc32 {
        Crc32 {
            hasher: Hasher::new(),
        }
    }

    pub fn update_u8(&mut self, v: u8) {
        self.hasher.update(&[v]);
    }

    pub fn update_u16(&mut self, v: u16) {
        self.hasher.update(&v.to_le_bytes());
    }

    pub fn update_u32(&mut self, v: u32) {
        self.hasher.update(&v.to_le_bytes());
    }

    pub fn update_u64(&mut self, v: u64) {
        self.hasher.update(&v.to_le_bytes());
    }

    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Crc32 {
        Crc32::new()
    }
}
