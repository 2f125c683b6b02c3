// GUID Partition Table codec: header pair, entry array, CRC discipline and
// the dual-header load/save protocol.
//
// Save order is secondary copy first. If the process dies between the two
// writes, the fresher metadata sits at the secondary and the next load will
// repair the primary from it; the reverse order could leave a stale
// secondary that silently wins a later recovery.

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};
use static_assertions::const_assert_eq;

use crate::crc32::Crc32;
use crate::error::ParteditError;
use crate::guid::Guid;
use crate::image::ImageContext;
use crate::store::SectorStore;

pub const GPT_SIGNATURE: &[u8; 8] = b"EFI PART";
pub const GPT_REVISION: u32 = 0x0001_0000;
/// Header size, in bytes. The rest of the header sector is zero.
pub const GPT_HEADER_SIZE: u32 = 92;
/// Entries in a standard table.
pub const GPT_MAX_PART_COUNT: u32 = 128;
/// Size of one table entry, in bytes.
pub const GPT_ENTRY_SIZE: u32 = 128;
/// LBA of the primary header.
pub const GPT_PRIMARY_LBA: u64 = 1;
/// UCS-2 code units in an entry name.
pub const GPT_NAME_UNITS: usize = 36;

const_assert_eq!(GPT_ENTRY_SIZE as usize, 16 + 16 + 8 + 8 + 8 + 2 * GPT_NAME_UNITS);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GptHeader {
    pub revision: u32,
    pub header_size: u32,
    pub header_crc32: u32,
    pub my_lba: u64,
    pub alt_lba: u64,
    pub first_usable_lba: u64,
    pub last_usable_lba: u64,
    pub disk_guid: Guid,
    pub part_table_lba: u64,
    pub part_count: u32,
    pub part_entry_size: u32,
    pub part_table_crc32: u32,
}

impl GptHeader {
    /// Serializes the header into the first 92 bytes of `buf`; the caller
    /// provides a zeroed sector so the reserved remainder stays zero.
    pub fn encode(&self, buf: &mut [u8]) {
        buf[..8].copy_from_slice(GPT_SIGNATURE);
        LittleEndian::write_u32(&mut buf[8..12], self.revision);
        LittleEndian::write_u32(&mut buf[12..16], self.header_size);
        LittleEndian::write_u32(&mut buf[16..20], self.header_crc32);
        LittleEndian::write_u32(&mut buf[20..24], 0);
        LittleEndian::write_u64(&mut buf[24..32], self.my_lba);
        LittleEndian::write_u64(&mut buf[32..40], self.alt_lba);
        LittleEndian::write_u64(&mut buf[40..48], self.first_usable_lba);
        LittleEndian::write_u64(&mut buf[48..56], self.last_usable_lba);
        buf[56..72].copy_from_slice(&self.disk_guid.to_disk_bytes());
        LittleEndian::write_u64(&mut buf[72..80], self.part_table_lba);
        LittleEndian::write_u32(&mut buf[80..84], self.part_count);
        LittleEndian::write_u32(&mut buf[84..88], self.part_entry_size);
        LittleEndian::write_u32(&mut buf[88..92], self.part_table_crc32);
    }

    pub fn decode(buf: &[u8]) -> GptHeader {
        let mut guid_bytes = [0u8; 16];
        guid_bytes.copy_from_slice(&buf[56..72]);
        GptHeader {
            revision: LittleEndian::read_u32(&buf[8..12]),
            header_size: LittleEndian::read_u32(&buf[12..16]),
            header_crc32: LittleEndian::read_u32(&buf[16..20]),
            my_lba: LittleEndian::read_u64(&buf[24..32]),
            alt_lba: LittleEndian::read_u64(&buf[32..40]),
            first_usable_lba: LittleEndian::read_u64(&buf[40..48]),
            last_usable_lba: LittleEndian::read_u64(&buf[48..56]),
            disk_guid: Guid::from_disk_bytes(guid_bytes),
            part_table_lba: LittleEndian::read_u64(&buf[72..80]),
            part_count: LittleEndian::read_u32(&buf[80..84]),
            part_entry_size: LittleEndian::read_u32(&buf[84..88]),
            part_table_crc32: LittleEndian::read_u32(&buf[88..92]),
        }
    }

    /// Signature test on a raw header sector.
    pub fn is_present(buf: &[u8]) -> bool {
        buf.len() >= GPT_HEADER_SIZE as usize && &buf[..8] == GPT_SIGNATURE
    }

    /// Header CRC over the logical field sequence. The CRC slot and the
    /// reserved word count as zero.
    pub fn compute_crc(&self) -> u32 {
        let mut crc = Crc32::new();
        crc.update_bytes(GPT_SIGNATURE);
        crc.update_u32(self.revision);
        crc.update_u32(self.header_size);
        crc.update_u32(0);
        crc.update_u32(0);
        crc.update_u64(self.my_lba);
        crc.update_u64(self.alt_lba);
        crc.update_u64(self.first_usable_lba);
        crc.update_u64(self.last_usable_lba);
        self.disk_guid.crc_update(&mut crc);
        crc.update_u64(self.part_table_lba);
        crc.update_u32(self.part_count);
        crc.update_u32(self.part_entry_size);
        crc.update_u32(self.part_table_crc32);
        crc.finalize()
    }
}

/// One 128-byte entry in codec-native form. `end_lba` is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GptEntry {
    pub type_guid: Guid,
    pub unique_guid: Guid,
    pub start_lba: u64,
    pub end_lba: u64,
    pub attributes: u64,
    pub name: [u16; GPT_NAME_UNITS],
}

impl Default for GptEntry {
    fn default() -> GptEntry {
        GptEntry {
            type_guid: Guid::ZERO,
            unique_guid: Guid::ZERO,
            start_lba: 0,
            end_lba: 0,
            attributes: 0,
            name: [0; GPT_NAME_UNITS],
        }
    }
}

impl GptEntry {
    pub fn is_used(&self) -> bool {
        !self.type_guid.is_zero()
    }

    pub fn encode(&self, buf: &mut [u8]) {
        buf[..16].copy_from_slice(&self.type_guid.to_disk_bytes());
        buf[16..32].copy_from_slice(&self.unique_guid.to_disk_bytes());
        LittleEndian::write_u64(&mut buf[32..40], self.start_lba);
        LittleEndian::write_u64(&mut buf[40..48], self.end_lba);
        LittleEndian::write_u64(&mut buf[48..56], self.attributes);
        for (i, unit) in self.name.iter().enumerate() {
            LittleEndian::write_u16(&mut buf[56 + i * 2..58 + i * 2], *unit);
        }
    }

    pub fn decode(buf: &[u8]) -> GptEntry {
        let mut type_bytes = [0u8; 16];
        type_bytes.copy_from_slice(&buf[..16]);
        let mut unique_bytes = [0u8; 16];
        unique_bytes.copy_from_slice(&buf[16..32]);
        let mut name = [0u16; GPT_NAME_UNITS];
        for (i, unit) in name.iter_mut().enumerate() {
            *unit = LittleEndian::read_u16(&buf[56 + i * 2..58 + i * 2]);
        }
        GptEntry {
            type_guid: Guid::from_disk_bytes(type_bytes),
            unique_guid: Guid::from_disk_bytes(unique_bytes),
            start_lba: LittleEndian::read_u64(&buf[32..40]),
            end_lba: LittleEndian::read_u64(&buf[40..48]),
            attributes: LittleEndian::read_u64(&buf[48..56]),
            name,
        }
    }

    /// Folds the full entry into a running CRC, name included: the table
    /// checksum covers all 128 bytes of every entry.
    fn crc_update(&self, crc: &mut Crc32) {
        self.type_guid.crc_update(crc);
        self.unique_guid.crc_update(crc);
        crc.update_u64(self.start_lba);
        crc.update_u64(self.end_lba);
        crc.update_u64(self.attributes);
        for unit in &self.name {
            crc.update_u16(*unit);
        }
    }
}

/// A GPT header pair plus the shared partition-entry array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gpt {
    pub primary: GptHeader,
    pub secondary: GptHeader,
    pub entries: Vec<GptEntry>,
}

impl Gpt {
    /// Builds a fresh pair for the given geometry: standard 128-entry table,
    /// new disk GUID, both headers sealed.
    pub fn new(img: &ImageContext) -> Gpt {
        let secondary_lba = img.total_sectors() - 1;
        let table_sectors = table_sectors(img, GPT_MAX_PART_COUNT);
        let secondary_table_lba = secondary_lba - table_sectors;
        let primary = GptHeader {
            revision: GPT_REVISION,
            header_size: GPT_HEADER_SIZE,
            header_crc32: 0,
            my_lba: GPT_PRIMARY_LBA,
            alt_lba: secondary_lba,
            first_usable_lba: GPT_PRIMARY_LBA + 1 + table_sectors,
            last_usable_lba: secondary_table_lba - 1,
            disk_guid: Guid::generate(),
            part_table_lba: GPT_PRIMARY_LBA + 1,
            part_count: GPT_MAX_PART_COUNT,
            part_entry_size: GPT_ENTRY_SIZE,
            part_table_crc32: 0,
        };
        let secondary = GptHeader {
            my_lba: secondary_lba,
            alt_lba: GPT_PRIMARY_LBA,
            part_table_lba: secondary_table_lba,
            ..primary
        };
        let mut gpt = Gpt {
            primary,
            secondary,
            entries: vec![GptEntry::default(); GPT_MAX_PART_COUNT as usize],
        };
        gpt.refresh_crcs();
        gpt
    }

    fn table_crc(&self) -> u32 {
        let mut crc = Crc32::new();
        for entry in &self.entries {
            entry.crc_update(&mut crc);
        }
        crc.finalize()
    }

    /// Recomputes the table CRC, mirrors it into both headers, then seals
    /// the header CRCs.
    pub fn refresh_crcs(&mut self) {
        let table_crc = self.table_crc();
        self.primary.part_table_crc32 = table_crc;
        self.secondary.part_table_crc32 = table_crc;
        self.primary.header_crc32 = self.primary.compute_crc();
        self.secondary.header_crc32 = self.secondary.compute_crc();
    }

    /// Reads one header-and-table copy. `Ok(None)` covers every way the
    /// copy can be individually bad: missing signature, header CRC or
    /// placement mismatch, unsupported table shape, table CRC mismatch.
    fn load_copy(
        store: &mut dyn SectorStore,
        img: &ImageContext,
        hdr_lba: u64,
    ) -> Result<Option<(GptHeader, Vec<GptEntry>)>, ParteditError> {
        let buf = store.read_sectors(hdr_lba, 1)?;
        if !GptHeader::is_present(&buf) {
            debug!("no GPT signature at LBA {hdr_lba}");
            return Ok(None);
        }
        let hdr = GptHeader::decode(&buf);
        if hdr.header_crc32 != hdr.compute_crc() {
            warn!("GPT header at LBA {hdr_lba}: header CRC mismatch");
            return Ok(None);
        }
        if hdr.my_lba != hdr_lba {
            warn!(
                "GPT header at LBA {hdr_lba}: my_lba field says {}",
                hdr.my_lba
            );
            return Ok(None);
        }
        if hdr.part_entry_size != GPT_ENTRY_SIZE
            || hdr.part_count == 0
            || hdr.part_count > GPT_MAX_PART_COUNT
        {
            warn!(
                "GPT header at LBA {hdr_lba}: unsupported table shape ({} entries of {} bytes)",
                hdr.part_count, hdr.part_entry_size
            );
            return Ok(None);
        }
        let sectors = table_sectors(img, hdr.part_count);
        let table_end = hdr.part_table_lba.checked_add(sectors);
        if table_end.is_none() || table_end.unwrap() > img.total_sectors() {
            warn!(
                "GPT header at LBA {hdr_lba}: table at LBA {} does not fit the image",
                hdr.part_table_lba
            );
            return Ok(None);
        }
        let tbuf = store.read_sectors(hdr.part_table_lba, sectors)?;
        let mut entries = Vec::with_capacity(hdr.part_count as usize);
        for i in 0..hdr.part_count as usize {
            let off = i * GPT_ENTRY_SIZE as usize;
            entries.push(GptEntry::decode(&tbuf[off..off + GPT_ENTRY_SIZE as usize]));
        }
        let mut crc = Crc32::new();
        for entry in &entries {
            entry.crc_update(&mut crc);
        }
        if crc.finalize() != hdr.part_table_crc32 {
            warn!("GPT header at LBA {hdr_lba}: partition table CRC mismatch");
            return Ok(None);
        }
        Ok(Some((hdr, entries)))
    }

    /// Dual-header load. Returns `Ok(None)` when neither copy is valid.
    /// When exactly one copy is valid, the other is rebuilt from it in
    /// memory; the disk itself is repaired by the next save.
    pub fn load(store: &mut dyn SectorStore, img: &ImageContext) -> Result<Option<Gpt>, ParteditError> {
        let last_lba = img.total_sectors() - 1;

        let primary = Gpt::load_copy(store, img, GPT_PRIMARY_LBA)?;
        let secondary_lba = match &primary {
            Some((hdr, _)) if hdr.alt_lba > GPT_PRIMARY_LBA && hdr.alt_lba <= last_lba => {
                hdr.alt_lba
            }
            Some((hdr, _)) => {
                warn!(
                    "primary GPT points its alternate at LBA {}, looking at the last LBA instead",
                    hdr.alt_lba
                );
                last_lba
            }
            None => last_lba,
        };
        let secondary = Gpt::load_copy(store, img, secondary_lba)?;

        match (primary, secondary) {
            (Some((prim, entries)), Some((sec, _))) => {
                debug!("both GPT copies are valid, using the primary");
                Ok(Some(Gpt {
                    primary: prim,
                    secondary: sec,
                    entries,
                }))
            }
            (Some((prim, entries)), None) => {
                warn!("secondary GPT is corrupted and will be restored on the next write");
                let mut prim = prim;
                prim.alt_lba = secondary_lba;
                let mut sec = prim;
                sec.my_lba = secondary_lba;
                sec.alt_lba = prim.my_lba;
                sec.part_table_lba = sec.my_lba - table_sectors(img, prim.part_count);
                let mut gpt = Gpt {
                    primary: prim,
                    secondary: sec,
                    entries,
                };
                gpt.refresh_crcs();
                Ok(Some(gpt))
            }
            (None, Some((sec, entries))) => {
                warn!("primary GPT is corrupted and will be restored on the next write");
                let mut prim = sec;
                prim.my_lba = GPT_PRIMARY_LBA;
                prim.alt_lba = sec.my_lba;
                prim.part_table_lba = GPT_PRIMARY_LBA + 1;
                let mut gpt = Gpt {
                    primary: prim,
                    secondary: sec,
                    entries,
                };
                gpt.refresh_crcs();
                Ok(Some(gpt))
            }
            (None, None) => Ok(None),
        }
    }

    /// Writes both copies, secondary first. CRCs must already be sealed;
    /// callers go through [`Gpt::refresh_crcs`] or build via [`Gpt::new`].
    pub fn save(&self, store: &mut dyn SectorStore, img: &ImageContext) -> Result<(), ParteditError> {
        let sectors = table_sectors(img, self.entries.len() as u32);
        let mut table_buf = vec![0u8; (sectors * img.sector_size()) as usize];
        for (i, entry) in self.entries.iter().enumerate() {
            let off = i * GPT_ENTRY_SIZE as usize;
            entry.encode(&mut table_buf[off..off + GPT_ENTRY_SIZE as usize]);
        }

        let mut hdr_buf = vec![0u8; img.sector_size() as usize];
        self.secondary.encode(&mut hdr_buf);
        store.write_sectors(self.secondary.part_table_lba, sectors, &table_buf)?;
        store.write_sectors(self.secondary.my_lba, 1, &hdr_buf)?;

        self.primary.encode(&mut hdr_buf);
        store.write_sectors(self.primary.part_table_lba, sectors, &table_buf)?;
        store.write_sectors(self.primary.my_lba, 1, &hdr_buf)?;
        Ok(())
    }
}

/// Sectors occupied by a table of `count` entries.
fn table_sectors(img: &ImageContext, count: u32) -> u64 {
    img.byte_to_lba(count as u64 * GPT_ENTRY_SIZE as u64, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemSectorStore, SectorStore};

    const IMG_BYTES: u64 = 64 * 1024 * 1024;

    fn ctx() -> ImageContext {
        ImageContext::new(IMG_BYTES, 512).unwrap()
    }

    fn sample_entry() -> GptEntry {
        let mut name = [0u16; GPT_NAME_UNITS];
        for (unit, ch) in name.iter_mut().zip("data".encode_utf16()) {
            *unit = ch;
        }
        GptEntry {
            type_guid: Guid::LINUX_FS,
            unique_guid: Guid::generate(),
            start_lba: 2048,
            end_lba: 8191,
            attributes: 0x4,
            name,
        }
    }

    #[test]
    fn fresh_pair_geometry() {
        let img = ctx();
        let gpt = Gpt::new(&img);
        let total = img.total_sectors();

        assert_eq!(gpt.primary.my_lba, 1);
        assert_eq!(gpt.primary.alt_lba, total - 1);
        assert_eq!(gpt.primary.part_table_lba, 2);
        assert_eq!(gpt.primary.first_usable_lba, 34);
        assert_eq!(gpt.primary.last_usable_lba, total - 34);
        assert_eq!(gpt.secondary.my_lba, total - 1);
        assert_eq!(gpt.secondary.alt_lba, 1);
        assert_eq!(gpt.secondary.part_table_lba, total - 33);
        assert_eq!(gpt.entries.len(), 128);
        assert!(!gpt.primary.disk_guid.is_zero());
        assert_eq!(gpt.primary.disk_guid, gpt.secondary.disk_guid);
    }

    #[test]
    fn header_crc_matches_serialized_buffer() {
        let gpt = Gpt::new(&ctx());
        let mut buf = [0u8; 512];
        gpt.primary.encode(&mut buf);
        // Zero the CRC slot and hash the first 92 bytes: must agree with the
        // field-by-field computation.
        buf[16..20].fill(0);
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&buf[..92]);
        assert_eq!(hasher.finalize(), gpt.primary.compute_crc());
        assert_eq!(gpt.primary.header_crc32, gpt.primary.compute_crc());
    }

    #[test]
    fn entry_crc_covers_the_name() {
        let a = sample_entry();
        let b = {
            let mut e = a;
            e.name[0] ^= 0xFFFF;
            e
        };
        let mut crc_a = Crc32::new();
        a.crc_update(&mut crc_a);
        let mut crc_b = Crc32::new();
        b.crc_update(&mut crc_b);
        assert_ne!(crc_a.finalize(), crc_b.finalize());

        // And the field feed equals hashing the serialized entry.
        let mut buf = [0u8; 128];
        a.encode(&mut buf);
        let mut from_buf = crc32fast::Hasher::new();
        from_buf.update(&buf);
        let mut from_fields = Crc32::new();
        a.crc_update(&mut from_fields);
        assert_eq!(from_buf.finalize(), from_fields.finalize());
    }

    #[test]
    fn entry_encode_decode_round_trip() {
        let entry = sample_entry();
        let mut buf = [0u8; 128];
        entry.encode(&mut buf);
        assert_eq!(GptEntry::decode(&buf), entry);
    }

    #[test]
    fn header_encode_decode_round_trip() {
        let gpt = Gpt::new(&ctx());
        let mut buf = [0u8; 512];
        gpt.primary.encode(&mut buf);
        assert!(GptHeader::is_present(&buf));
        assert_eq!(GptHeader::decode(&buf), gpt.primary);
    }

    #[test]
    fn save_load_round_trip() {
        let img = ctx();
        let mut store = MemSectorStore::with_size(IMG_BYTES, 512);

        assert!(Gpt::load(&mut store, &img).unwrap().is_none());

        let mut gpt = Gpt::new(&img);
        gpt.entries[0] = sample_entry();
        gpt.entries[127] = sample_entry();
        gpt.refresh_crcs();
        gpt.save(&mut store, &img).unwrap();

        let loaded = Gpt::load(&mut store, &img).unwrap().unwrap();
        assert_eq!(loaded, gpt);
    }

    #[test]
    fn primary_recovery_from_secondary() {
        let img = ctx();
        let total = img.total_sectors();
        let mut store = MemSectorStore::with_size(IMG_BYTES, 512);

        let mut gpt = Gpt::new(&img);
        gpt.entries[3] = sample_entry();
        gpt.refresh_crcs();
        gpt.save(&mut store, &img).unwrap();

        // Wipe the primary header sector.
        store.write_sectors(1, 1, &vec![0u8; 512]).unwrap();

        let loaded = Gpt::load(&mut store, &img).unwrap().unwrap();
        assert_eq!(loaded.primary.my_lba, 1);
        assert_eq!(loaded.primary.alt_lba, total - 1);
        assert_eq!(loaded.primary.part_table_lba, 2);
        assert_eq!(loaded.primary.first_usable_lba, gpt.primary.first_usable_lba);
        assert_eq!(loaded.primary.last_usable_lba, gpt.primary.last_usable_lba);
        assert_eq!(loaded.primary.disk_guid, gpt.primary.disk_guid);
        assert_eq!(loaded.entries, gpt.entries);
        assert_eq!(loaded.primary.header_crc32, loaded.primary.compute_crc());

        // The next save heals the disk.
        loaded.save(&mut store, &img).unwrap();
        let healed = Gpt::load(&mut store, &img).unwrap().unwrap();
        assert_eq!(healed, loaded);
    }

    #[test]
    fn secondary_recovery_from_primary() {
        let img = ctx();
        let total = img.total_sectors();
        let mut store = MemSectorStore::with_size(IMG_BYTES, 512);

        let mut gpt = Gpt::new(&img);
        gpt.entries[0] = sample_entry();
        gpt.refresh_crcs();
        gpt.save(&mut store, &img).unwrap();

        // Corrupt one byte of the secondary header.
        let mut buf = store.read_sectors(total - 1, 1).unwrap();
        buf[40] ^= 0xFF;
        store.write_sectors(total - 1, 1, &buf).unwrap();

        let loaded = Gpt::load(&mut store, &img).unwrap().unwrap();
        assert_eq!(loaded.secondary.my_lba, total - 1);
        assert_eq!(loaded.secondary.alt_lba, 1);
        assert_eq!(loaded.secondary.part_table_lba, total - 33);
        assert_eq!(loaded.entries, gpt.entries);
    }

    #[test]
    fn corrupt_table_invalidates_the_copy() {
        let img = ctx();
        let mut store = MemSectorStore::with_size(IMG_BYTES, 512);

        let mut gpt = Gpt::new(&img);
        gpt.entries[0] = sample_entry();
        gpt.refresh_crcs();
        gpt.save(&mut store, &img).unwrap();

        // Flip a byte in the primary table: primary must lose, secondary win.
        let mut buf = store.read_sectors(2, 1).unwrap();
        buf[0] ^= 0x01;
        store.write_sectors(2, 1, &buf).unwrap();

        let loaded = Gpt::load(&mut store, &img).unwrap().unwrap();
        assert_eq!(loaded.entries, gpt.entries);
    }

    #[test]
    fn both_copies_bad_is_not_found() {
        let img = ctx();
        let total = img.total_sectors();
        let mut store = MemSectorStore::with_size(IMG_BYTES, 512);

        let gpt = Gpt::new(&img);
        gpt.save(&mut store, &img).unwrap();
        store.write_sectors(1, 1, &vec![0u8; 512]).unwrap();
        store.write_sectors(total - 1, 1, &vec![0u8; 512]).unwrap();

        assert!(Gpt::load(&mut store, &img).unwrap().is_none());
    }

    /// Store wrapper recording the LBA of every write.
    struct TracingStore {
        inner: MemSectorStore,
        writes: Vec<u64>,
    }

    impl SectorStore for TracingStore {
        fn total_sectors(&self) -> u64 {
            self.inner.total_sectors()
        }
        fn read_sectors(&mut self, lba: u64, count: u64) -> Result<Vec<u8>, ParteditError> {
            self.inner.read_sectors(lba, count)
        }
        fn write_sectors(&mut self, lba: u64, count: u64, data: &[u8]) -> Result<(), ParteditError> {
            self.writes.push(lba);
            self.inner.write_sectors(lba, count, data)
        }
        fn flush(&mut self) -> Result<(), ParteditError> {
            self.inner.flush()
        }
    }

    #[test]
    fn save_writes_secondary_before_primary() {
        let img = ctx();
        let total = img.total_sectors();
        let mut store = TracingStore {
            inner: MemSectorStore::with_size(IMG_BYTES, 512),
            writes: Vec::new(),
        };

        Gpt::new(&img).save(&mut store, &img).unwrap();
        assert_eq!(store.writes, vec![total - 33, total - 1, 2, 1]);
    }
}
