// GUID handling for GPT structures.
//
// In-memory representation wraps `uuid::Uuid`, which keeps the canonical
// field order. The on-disk layout is the mixed-endian one mandated for GPT:
// the three leading fields little-endian, the remaining eight bytes as-is.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::crc32::Crc32;
use crate::error::ParteditError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Guid(Uuid);

impl Guid {
    /// All-zero GUID, marking an unused GPT entry.
    pub const ZERO: Guid = Guid(Uuid::nil());

    /// Linux filesystem data, the default type for new GPT partitions.
    pub const LINUX_FS: Guid = Guid(Uuid::from_u128(0x0FC63DAF_8483_4772_8E79_3D69D8477DE4));

    /// Random version-4 GUID with the variant bits used by the registry
    /// format (top bits of clock-seq-hi set to 110).
    pub fn generate() -> Guid {
        let mut bytes: [u8; 16] = rand::random();
        bytes[6] = (bytes[6] & 0x0F) | 0x40;
        bytes[8] = (bytes[8] & 0x1F) | 0xC0;
        Guid(Uuid::from_bytes(bytes))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_nil()
    }

    /// Mixed-endian bytes as stored in GPT headers and entries.
    pub fn to_disk_bytes(&self) -> [u8; 16] {
        self.0.to_bytes_le()
    }

    pub fn from_disk_bytes(bytes: [u8; 16]) -> Guid {
        Guid(Uuid::from_bytes_le(bytes))
    }

    /// Fold this GUID into a running CRC, in on-disk byte order.
    pub fn crc_update(&self, crc: &mut Crc32) {
        crc.update_bytes(&self.to_disk_bytes());
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Uuid::encode_buffer();
        f.write_str(self.0.hyphenated().encode_upper(&mut buf))
    }
}

impl FromStr for Guid {
    type Err = ParteditError;

    /// Parses the 36-character registry form only.
    fn from_str(s: &str) -> Result<Guid, ParteditError> {
        if s.len() != 36 {
            return Err(ParteditError::InvalidGuid(s.to_string()));
        }
        Uuid::try_parse(s)
            .map(Guid)
            .map_err(|_| ParteditError::InvalidGuid(s.to_string()))
    }
}
