// Unified partitioning scheme: one in-memory model over both codecs.
//
// Editing happens on `SchemePart` records; the codec-native structures are
// rebuilt on every save and the records rebuilt on every load, so nothing
// downstream needs to know which codec owns a partition.

use log::debug;

use crate::error::ParteditError;
use crate::gpt::{Gpt, GptEntry, GptHeader, GPT_NAME_UNITS};
use crate::guid::Guid;
use crate::image::ImageContext;
use crate::mbr::{Mbr, MbrPartition, MBR_PART_COUNT, MBR_TYPE_LINUX, MBR_TYPE_PROTECTIVE};
use crate::store::SectorStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    Mbr,
    Gpt,
}

/// Partition type: a one-byte identifier under MBR, a GUID under GPT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartType {
    Mbr(u8),
    Gpt(Guid),
}

/// Unified partition record. GPT-only and MBR-only fields stay at their
/// zero values under the other codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemePart {
    pub ptype: PartType,
    /// GPT: per-partition GUID.
    pub unique_guid: Guid,
    /// First sector of the partition.
    pub start_lba: u64,
    /// Last sector of the partition, inclusive.
    pub end_lba: u64,
    /// GPT: attribute bits.
    pub attributes: u64,
    /// GPT: UCS-2 partition name.
    pub name: [u16; GPT_NAME_UNITS],
    /// MBR: boot indicator.
    pub boot_ind: u8,
}

impl SchemePart {
    pub fn empty_mbr() -> SchemePart {
        SchemePart {
            ptype: PartType::Mbr(0),
            unique_guid: Guid::ZERO,
            start_lba: 0,
            end_lba: 0,
            attributes: 0,
            name: [0; GPT_NAME_UNITS],
            boot_ind: 0,
        }
    }

    pub fn empty_gpt() -> SchemePart {
        SchemePart {
            ptype: PartType::Gpt(Guid::ZERO),
            ..SchemePart::empty_mbr()
        }
    }

    pub fn is_used(&self) -> bool {
        match self.ptype {
            PartType::Mbr(t) => t != 0,
            PartType::Gpt(g) => !g.is_zero(),
        }
    }

    /// Zeroes the record, keeping its codec kind.
    pub fn clear(&mut self) {
        *self = match self.ptype {
            PartType::Mbr(_) => SchemePart::empty_mbr(),
            PartType::Gpt(_) => SchemePart::empty_gpt(),
        };
    }

    /// Inclusive sector count. Written to tolerate the degenerate
    /// `end = start - 1` shape a zero-size on-disk entry decodes to.
    pub fn sectors(&self) -> u64 {
        self.end_lba + 1 - self.start_lba
    }
}

/// MBR flavour of the unified scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MbrScheme {
    pub disk_sig: u32,
    pub bootstrap: [u8; 440],
    pub reserved: [u8; 2],
    pub first_usable_lba: u64,
    pub last_usable_lba: u64,
    pub parts: [SchemePart; MBR_PART_COUNT],
}

impl MbrScheme {
    /// Fresh empty record with a random disk signature. Sector 0 holds the
    /// record itself, so the usable range starts at 1 and runs to the end
    /// of the image.
    pub fn new(img: &ImageContext) -> MbrScheme {
        MbrScheme {
            disk_sig: rand::random(),
            bootstrap: [0; 440],
            reserved: [0; 2],
            first_usable_lba: 1,
            last_usable_lba: img.total_sectors() - 1,
            parts: [SchemePart::empty_mbr(); MBR_PART_COUNT],
        }
    }

    /// Fresh protective MBR: one entry of type 0xEE covering the image,
    /// saturated at the 32-bit sector limit.
    pub fn protective(img: &ImageContext) -> MbrScheme {
        let mut scheme = MbrScheme::new(img);
        let size_lba = (img.total_sectors() - 1).min(u32::MAX as u64);
        scheme.parts[0] = SchemePart {
            ptype: PartType::Mbr(MBR_TYPE_PROTECTIVE),
            start_lba: 1,
            end_lba: size_lba,
            ..SchemePart::empty_mbr()
        };
        scheme
    }

    /// True when partition 0 is the protective entry and nothing else is
    /// in use.
    pub fn is_protective(&self) -> bool {
        self.parts[0].ptype == PartType::Mbr(MBR_TYPE_PROTECTIVE)
            && self.parts[0].start_lba == 1
            && self.parts[1..].iter().all(|p| !p.is_used())
    }

    pub fn from_mbr(mbr: &Mbr, img: &ImageContext) -> MbrScheme {
        let mut scheme = MbrScheme::new(img);
        scheme.disk_sig = mbr.disk_sig;
        scheme.bootstrap = mbr.bootstrap;
        scheme.reserved = mbr.reserved;
        for (slot, part) in scheme.parts.iter_mut().zip(&mbr.partitions) {
            *slot = SchemePart {
                ptype: PartType::Mbr(part.ptype),
                start_lba: part.start_lba as u64,
                end_lba: (part.start_lba as u64 + part.size_lba as u64).saturating_sub(1),
                boot_ind: part.boot_ind,
                ..SchemePart::empty_mbr()
            };
        }
        scheme
    }

    /// Codec-native form. Size and both CHS triples are recomputed from the
    /// sector range; the protective entry keeps its legacy clamp.
    pub fn to_mbr(&self, img: &ImageContext) -> Mbr {
        let mut mbr = Mbr {
            bootstrap: self.bootstrap,
            disk_sig: self.disk_sig,
            reserved: self.reserved,
            ..Mbr::default()
        };
        for (out, part) in mbr.partitions.iter_mut().zip(&self.parts) {
            if !part.is_used() {
                continue;
            }
            let ptype = match part.ptype {
                PartType::Mbr(t) => t,
                PartType::Gpt(_) => unreachable!("GUID-typed entry in an MBR table"),
            };
            let protective = ptype == MBR_TYPE_PROTECTIVE;
            *out = MbrPartition {
                boot_ind: part.boot_ind,
                start_chs: img.lba_to_chs(part.start_lba, protective).pack(),
                ptype,
                end_chs: img.lba_to_chs(part.end_lba, protective).pack(),
                start_lba: part.start_lba as u32,
                size_lba: part.sectors() as u32,
            };
        }
        mbr
    }

    pub fn load(
        store: &mut dyn SectorStore,
        img: &ImageContext,
    ) -> Result<Option<MbrScheme>, ParteditError> {
        Ok(Mbr::load(store)?.map(|mbr| MbrScheme::from_mbr(&mbr, img)))
    }

    pub fn save(&self, store: &mut dyn SectorStore, img: &ImageContext) -> Result<(), ParteditError> {
        self.to_mbr(img).save(store, img)
    }
}

/// GPT flavour of the unified scheme. The header pair is kept as loaded (or
/// as initialized) so that save/load round-trips are exact; only the CRCs
/// and the entry array are recomputed on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GptScheme {
    pub primary: GptHeader,
    pub secondary: GptHeader,
    pub parts: Vec<SchemePart>,
}

impl GptScheme {
    pub fn new(img: &ImageContext) -> GptScheme {
        GptScheme::from_gpt(&Gpt::new(img))
    }

    pub fn disk_guid(&self) -> Guid {
        self.primary.disk_guid
    }

    pub fn from_gpt(gpt: &Gpt) -> GptScheme {
        let parts = gpt
            .entries
            .iter()
            .map(|entry| SchemePart {
                ptype: PartType::Gpt(entry.type_guid),
                unique_guid: entry.unique_guid,
                start_lba: entry.start_lba,
                end_lba: entry.end_lba,
                attributes: entry.attributes,
                name: entry.name,
                boot_ind: 0,
            })
            .collect();
        GptScheme {
            primary: gpt.primary,
            secondary: gpt.secondary,
            parts,
        }
    }

    pub fn to_gpt(&self) -> Gpt {
        let entries = self
            .parts
            .iter()
            .map(|part| {
                let type_guid = match part.ptype {
                    PartType::Gpt(g) => g,
                    PartType::Mbr(_) => unreachable!("byte-typed entry in a GPT table"),
                };
                GptEntry {
                    type_guid,
                    unique_guid: part.unique_guid,
                    start_lba: part.start_lba,
                    end_lba: part.end_lba,
                    attributes: part.attributes,
                    name: part.name,
                }
            })
            .collect();
        let mut gpt = Gpt {
            primary: self.primary,
            secondary: self.secondary,
            entries,
        };
        gpt.refresh_crcs();
        gpt
    }

    pub fn load(
        store: &mut dyn SectorStore,
        img: &ImageContext,
    ) -> Result<Option<GptScheme>, ParteditError> {
        Ok(Gpt::load(store, img)?.map(|gpt| GptScheme::from_gpt(&gpt)))
    }

    pub fn save(&self, store: &mut dyn SectorStore, img: &ImageContext) -> Result<(), ParteditError> {
        self.to_gpt().save(store, img)
    }
}

/// The unified scheme. The two codecs are a closed set, so dispatch is a
/// plain tagged variant rather than anything dynamic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheme {
    Mbr(MbrScheme),
    Gpt(GptScheme),
}

impl Scheme {
    pub fn new_mbr(img: &ImageContext) -> Scheme {
        debug!("initializing a new MBR scheme");
        Scheme::Mbr(MbrScheme::new(img))
    }

    pub fn new_gpt(img: &ImageContext) -> Scheme {
        debug!("initializing a new GPT scheme");
        Scheme::Gpt(GptScheme::new(img))
    }

    pub fn kind(&self) -> SchemeKind {
        match self {
            Scheme::Mbr(_) => SchemeKind::Mbr,
            Scheme::Gpt(_) => SchemeKind::Gpt,
        }
    }

    pub fn parts(&self) -> &[SchemePart] {
        match self {
            Scheme::Mbr(s) => &s.parts,
            Scheme::Gpt(s) => &s.parts,
        }
    }

    pub fn parts_mut(&mut self) -> &mut [SchemePart] {
        match self {
            Scheme::Mbr(s) => &mut s.parts,
            Scheme::Gpt(s) => &mut s.parts,
        }
    }

    pub fn part_count(&self) -> usize {
        self.parts().len()
    }

    pub fn part_is_used(&self, index: usize) -> bool {
        self.parts()[index].is_used()
    }

    /// Seeds entry `index` with codec defaults: Linux type, and for GPT a
    /// fresh unique GUID.
    pub fn part_init(&mut self, index: usize) {
        match self {
            Scheme::Mbr(s) => {
                s.parts[index] = SchemePart {
                    ptype: PartType::Mbr(MBR_TYPE_LINUX),
                    ..SchemePart::empty_mbr()
                };
            }
            Scheme::Gpt(s) => {
                s.parts[index] = SchemePart {
                    ptype: PartType::Gpt(Guid::LINUX_FS),
                    unique_guid: Guid::generate(),
                    ..SchemePart::empty_gpt()
                };
            }
        }
    }

    pub fn first_usable_lba(&self) -> u64 {
        match self {
            Scheme::Mbr(s) => s.first_usable_lba,
            Scheme::Gpt(s) => s.primary.first_usable_lba,
        }
    }

    pub fn last_usable_lba(&self) -> u64 {
        match self {
            Scheme::Mbr(s) => s.last_usable_lba,
            Scheme::Gpt(s) => s.primary.last_usable_lba,
        }
    }

    pub fn save(&self, store: &mut dyn SectorStore, img: &ImageContext) -> Result<(), ParteditError> {
        match self {
            Scheme::Mbr(s) => s.save(store, img),
            Scheme::Gpt(s) => s.save(store, img),
        }
    }
}
