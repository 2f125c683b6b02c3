// Master Boot Record codec: the 512-byte record at LBA 0.
//
// Bootstrap code and the two reserved bytes are opaque; they round-trip
// verbatim through load and save, and a record built from scratch carries
// zeros there.

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use static_assertions::const_assert_eq;

use crate::error::ParteditError;
use crate::image::ImageContext;
use crate::store::SectorStore;

/// MBR size, in sectors.
pub const MBR_SECTORS: u64 = 1;
/// MBR size, in bytes.
pub const MBR_SIZE: usize = 512;
/// Primary partition slots in the record.
pub const MBR_PART_COUNT: usize = 4;

/// GPT protective partition type.
pub const MBR_TYPE_PROTECTIVE: u8 = 0xEE;
/// Linux native, the default type for new MBR partitions.
pub const MBR_TYPE_LINUX: u8 = 0x83;

const BOOTSTRAP_SIZE: usize = 440;
const DISK_SIG_OFFSET: usize = 440;
const RESERVED_OFFSET: usize = 444;
const PART_TABLE_OFFSET: usize = 446;
const PART_ENTRY_SIZE: usize = 16;
const BOOT_SIG_OFFSET: usize = 510;

const_assert_eq!(
    PART_TABLE_OFFSET + MBR_PART_COUNT * PART_ENTRY_SIZE + 2,
    MBR_SIZE
);

/// One 16-byte partition entry in codec-native form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MbrPartition {
    pub boot_ind: u8,
    pub start_chs: [u8; 3],
    pub ptype: u8,
    pub end_chs: [u8; 3],
    pub start_lba: u32,
    pub size_lba: u32,
}

impl MbrPartition {
    pub fn is_used(&self) -> bool {
        self.ptype != 0
    }

    fn encode(&self, buf: &mut [u8]) {
        buf[0] = self.boot_ind;
        buf[1..4].copy_from_slice(&self.start_chs);
        buf[4] = self.ptype;
        buf[5..8].copy_from_slice(&self.end_chs);
        LittleEndian::write_u32(&mut buf[8..12], self.start_lba);
        LittleEndian::write_u32(&mut buf[12..16], self.size_lba);
    }

    fn decode(buf: &[u8]) -> MbrPartition {
        MbrPartition {
            boot_ind: buf[0],
            start_chs: [buf[1], buf[2], buf[3]],
            ptype: buf[4],
            end_chs: [buf[5], buf[6], buf[7]],
            start_lba: LittleEndian::read_u32(&buf[8..12]),
            size_lba: LittleEndian::read_u32(&buf[12..16]),
        }
    }
}

/// In-memory Master Boot Record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mbr {
    pub bootstrap: [u8; BOOTSTRAP_SIZE],
    pub disk_sig: u32,
    pub reserved: [u8; 2],
    pub partitions: [MbrPartition; MBR_PART_COUNT],
}

impl Default for Mbr {
    fn default() -> Mbr {
        Mbr {
            bootstrap: [0; BOOTSTRAP_SIZE],
            disk_sig: 0,
            reserved: [0; 2],
            partitions: [MbrPartition::default(); MBR_PART_COUNT],
        }
    }
}

impl Mbr {
    /// Serializes the record into the first 512 bytes of `buf`.
    pub fn encode(&self, buf: &mut [u8]) {
        buf[..BOOTSTRAP_SIZE].copy_from_slice(&self.bootstrap);
        LittleEndian::write_u32(&mut buf[DISK_SIG_OFFSET..DISK_SIG_OFFSET + 4], self.disk_sig);
        buf[RESERVED_OFFSET..RESERVED_OFFSET + 2].copy_from_slice(&self.reserved);
        for (i, part) in self.partitions.iter().enumerate() {
            let off = PART_TABLE_OFFSET + i * PART_ENTRY_SIZE;
            part.encode(&mut buf[off..off + PART_ENTRY_SIZE]);
        }
        buf[BOOT_SIG_OFFSET] = 0x55;
        buf[BOOT_SIG_OFFSET + 1] = 0xAA;
    }

    pub fn decode(buf: &[u8]) -> Mbr {
        let mut mbr = Mbr::default();
        mbr.bootstrap.copy_from_slice(&buf[..BOOTSTRAP_SIZE]);
        mbr.disk_sig = LittleEndian::read_u32(&buf[DISK_SIG_OFFSET..DISK_SIG_OFFSET + 4]);
        mbr.reserved = [buf[RESERVED_OFFSET], buf[RESERVED_OFFSET + 1]];
        for (i, part) in mbr.partitions.iter_mut().enumerate() {
            let off = PART_TABLE_OFFSET + i * PART_ENTRY_SIZE;
            *part = MbrPartition::decode(&buf[off..off + PART_ENTRY_SIZE]);
        }
        mbr
    }

    /// Boot-signature test on a raw sector.
    pub fn is_present(buf: &[u8]) -> bool {
        buf.len() >= MBR_SIZE && buf[BOOT_SIG_OFFSET] == 0x55 && buf[BOOT_SIG_OFFSET + 1] == 0xAA
    }

    /// Resets the record to a protective MBR covering the whole image.
    pub fn init_protective(&mut self, img: &ImageContext) {
        *self = Mbr::default();
        let size_lba = (img.total_sectors() - 1).min(u32::MAX as u64) as u32;
        let part = &mut self.partitions[0];
        part.ptype = MBR_TYPE_PROTECTIVE;
        part.start_lba = 1;
        part.size_lba = size_lba;
        part.start_chs = img.lba_to_chs(1, true).pack();
        // Last covered LBA is start + size - 1 = size_lba.
        part.end_chs = img.lba_to_chs(size_lba as u64, true).pack();
    }

    /// Reads sector 0 and decodes the record if the boot signature is there.
    pub fn load(store: &mut dyn SectorStore) -> Result<Option<Mbr>, ParteditError> {
        let buf = store.read_sectors(0, MBR_SECTORS)?;
        if !Mbr::is_present(&buf) {
            debug!("no MBR boot signature at sector 0");
            return Ok(None);
        }
        Ok(Some(Mbr::decode(&buf)))
    }

    pub fn save(&self, store: &mut dyn SectorStore, img: &ImageContext) -> Result<(), ParteditError> {
        let mut buf = vec![0u8; img.sector_size() as usize];
        self.encode(&mut buf[..MBR_SIZE]);
        store.write_sectors(0, MBR_SECTORS, &buf)
    }
}
