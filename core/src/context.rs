// Scheme context: detection, load, protective-MBR reconciliation and save.
//
// A GPT image carries two records: the table itself and the protective MBR
// in sector 0. The context owns both and keeps their relationship honest on
// every load.

use log::{debug, info, warn};

use crate::error::ParteditError;
use crate::image::ImageContext;
use crate::scheme::{GptScheme, MbrScheme, Scheme, SchemeKind};
use crate::store::SectorStore;

/// Zero, one or two schemes describing the image. With both present, the
/// GPT is the active scheme and the MBR is its protective partner.
#[derive(Debug, Default)]
pub struct SchemeContext {
    mbr: Option<Scheme>,
    gpt: Option<Scheme>,
}

impl SchemeContext {
    pub fn new() -> SchemeContext {
        SchemeContext::default()
    }

    /// Drops every scheme.
    pub fn reset(&mut self) {
        self.mbr = None;
        self.gpt = None;
    }

    /// Replaces the current schemes with a fresh one of the given kind. A
    /// new GPT brings its protective MBR along.
    pub fn create(&mut self, img: &ImageContext, kind: SchemeKind) {
        self.reset();
        match kind {
            SchemeKind::Mbr => {
                self.mbr = Some(Scheme::new_mbr(img));
            }
            SchemeKind::Gpt => {
                self.gpt = Some(Scheme::new_gpt(img));
                self.mbr = Some(Scheme::Mbr(MbrScheme::protective(img)));
            }
        }
    }

    /// Detects and loads whatever the image holds. A codec not finding its
    /// record is a legitimate outcome; only I/O failures abort.
    pub fn load(
        &mut self,
        store: &mut dyn SectorStore,
        img: &ImageContext,
    ) -> Result<(), ParteditError> {
        debug!("scheme detection and loading started");
        self.reset();

        if let Some(scheme) = MbrScheme::load(store, img)? {
            debug!("MBR scheme loaded");
            self.mbr = Some(Scheme::Mbr(scheme));
        }
        if let Some(scheme) = GptScheme::load(store, img)? {
            debug!("GPT scheme loaded");
            self.gpt = Some(Scheme::Gpt(scheme));
        }

        if self.gpt.is_none() {
            return Ok(());
        }

        // A GPT must travel with a protective MBR.
        match &mut self.mbr {
            None => {
                info!("protective MBR not found; a new one will be created on the next write");
                self.mbr = Some(Scheme::Mbr(MbrScheme::protective(img)));
            }
            Some(Scheme::Mbr(scheme)) if !scheme.is_protective() => {
                warn!("MBR is not recognized as protective; it will be replaced on the next write");
                *scheme = MbrScheme::protective(img);
            }
            _ => {
                debug!("protective MBR detected and loaded");
            }
        }
        Ok(())
    }

    /// Writes every present scheme. The MBR and GPT extents are disjoint,
    /// so their relative order is free; within the GPT the codec writes the
    /// secondary copy first.
    pub fn save(
        &self,
        store: &mut dyn SectorStore,
        img: &ImageContext,
    ) -> Result<(), ParteditError> {
        if let Some(scheme) = &self.mbr {
            scheme.save(store, img)?;
        }
        if let Some(scheme) = &self.gpt {
            scheme.save(store, img)?;
        }
        store.flush()
    }

    /// The scheme edits apply to: the GPT when present, else the MBR.
    pub fn active(&self) -> Option<&Scheme> {
        self.gpt.as_ref().or(self.mbr.as_ref())
    }

    pub fn active_mut(&mut self) -> Option<&mut Scheme> {
        self.gpt.as_mut().or(self.mbr.as_mut())
    }

    pub fn active_kind(&self) -> Option<SchemeKind> {
        self.active().map(Scheme::kind)
    }

    pub fn mbr(&self) -> Option<&Scheme> {
        self.mbr.as_ref()
    }

    pub fn gpt(&self) -> Option<&Scheme> {
        self.gpt.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mbr::MBR_TYPE_PROTECTIVE;
    use crate::scheme::PartType;
    use crate::store::MemSectorStore;

    const IMG_BYTES: u64 = 64 * 1024 * 1024;

    fn ctx() -> ImageContext {
        ImageContext::new(IMG_BYTES, 512).unwrap()
    }

    fn protective_part(context: &SchemeContext) -> crate::scheme::SchemePart {
        match context.mbr().unwrap() {
            Scheme::Mbr(m) => m.parts[0],
            Scheme::Gpt(_) => panic!("MBR slot holds a GPT"),
        }
    }

    #[test]
    fn empty_image_loads_nothing() {
        let img = ctx();
        let mut store = MemSectorStore::with_size(IMG_BYTES, 512);
        let mut context = SchemeContext::new();
        context.load(&mut store, &img).unwrap();
        assert!(context.active().is_none());
        assert!(context.mbr().is_none());
        assert!(context.gpt().is_none());
    }

    #[test]
    fn new_gpt_brings_protective_partner() {
        let img = ctx();
        let mut context = SchemeContext::new();
        context.create(&img, SchemeKind::Gpt);

        assert_eq!(context.active_kind(), Some(SchemeKind::Gpt));
        let part = protective_part(&context);
        assert_eq!(part.ptype, PartType::Mbr(MBR_TYPE_PROTECTIVE));
        assert_eq!(part.start_lba, 1);
    }

    #[test]
    fn new_mbr_drops_gpt_partner() {
        let img = ctx();
        let mut context = SchemeContext::new();
        context.create(&img, SchemeKind::Gpt);
        context.create(&img, SchemeKind::Mbr);
        assert!(context.gpt().is_none());
        assert_eq!(context.active_kind(), Some(SchemeKind::Mbr));
    }

    #[test]
    fn save_load_round_trip_gpt_with_partner() {
        let img = ctx();
        let mut store = MemSectorStore::with_size(IMG_BYTES, 512);
        let mut context = SchemeContext::new();
        context.create(&img, SchemeKind::Gpt);
        context
            .active_mut()
            .unwrap()
            .add_partition(0, 2048, 8191)
            .unwrap();
        context.save(&mut store, &img).unwrap();

        let mut reloaded = SchemeContext::new();
        reloaded.load(&mut store, &img).unwrap();
        assert_eq!(reloaded.active_kind(), Some(SchemeKind::Gpt));
        let part = reloaded.active().unwrap().parts()[0];
        assert_eq!(part.start_lba, 2048);
        assert_eq!(part.end_lba, 8191);
        assert!(matches!(reloaded.mbr(), Some(Scheme::Mbr(m)) if m.is_protective()));
    }

    #[test]
    fn gpt_without_mbr_synthesizes_protective() {
        let img = ctx();
        let mut store = MemSectorStore::with_size(IMG_BYTES, 512);

        // Save a GPT, then wipe the MBR sector.
        let mut context = SchemeContext::new();
        context.create(&img, SchemeKind::Gpt);
        context.save(&mut store, &img).unwrap();
        store.write_sectors(0, 1, &vec![0u8; 512]).unwrap();

        let mut reloaded = SchemeContext::new();
        reloaded.load(&mut store, &img).unwrap();
        let part = protective_part(&reloaded);
        assert_eq!(part.ptype, PartType::Mbr(MBR_TYPE_PROTECTIVE));
        assert_eq!(part.start_lba, 1);
        assert_eq!(part.end_lba, img.total_sectors() - 1);
    }

    #[test]
    fn non_protective_mbr_is_replaced_next_to_gpt() {
        let img = ctx();
        let mut store = MemSectorStore::with_size(IMG_BYTES, 512);

        let mut context = SchemeContext::new();
        context.create(&img, SchemeKind::Gpt);
        context.save(&mut store, &img).unwrap();

        // Overwrite sector 0 with a plain MBR carrying a data partition.
        let mut plain = SchemeContext::new();
        plain.create(&img, SchemeKind::Mbr);
        plain
            .active_mut()
            .unwrap()
            .add_partition(0, 2048, 4095)
            .unwrap();
        match plain.mbr().unwrap() {
            Scheme::Mbr(m) => m.save(&mut store, &img).unwrap(),
            Scheme::Gpt(_) => unreachable!(),
        }

        let mut reloaded = SchemeContext::new();
        reloaded.load(&mut store, &img).unwrap();
        assert!(matches!(reloaded.mbr(), Some(Scheme::Mbr(m)) if m.is_protective()));
    }

    #[test]
    fn mbr_only_image() {
        let img = ctx();
        let mut store = MemSectorStore::with_size(IMG_BYTES, 512);

        let mut context = SchemeContext::new();
        context.create(&img, SchemeKind::Mbr);
        context
            .active_mut()
            .unwrap()
            .add_partition(0, 2048, 4095)
            .unwrap();
        context.save(&mut store, &img).unwrap();

        let mut reloaded = SchemeContext::new();
        reloaded.load(&mut store, &img).unwrap();
        assert_eq!(reloaded.active_kind(), Some(SchemeKind::Mbr));
        assert!(reloaded.gpt().is_none());
        assert_eq!(reloaded.active().unwrap().parts()[0].end_lba, 4095);
    }
}
