// Shared test support: a sparse sector store for geometries far too large
// to materialize in memory. Only written sectors are kept; everything else
// reads back as zeros, like a fresh sparse image file.

use std::collections::HashMap;

use partedit_core::{ParteditError, SectorStore};

pub struct SparseStore {
    sectors: HashMap<u64, Vec<u8>>,
    sector_size: u64,
    total_sectors: u64,
}

impl SparseStore {
    pub fn new(image_size: u64, sector_size: u64) -> SparseStore {
        SparseStore {
            sectors: HashMap::new(),
            sector_size,
            total_sectors: image_size / sector_size,
        }
    }

    fn check_extent(&self, lba: u64, count: u64) -> Result<(), ParteditError> {
        let end = lba.checked_add(count);
        if count == 0 || end.is_none() || end.unwrap() > self.total_sectors {
            return Err(ParteditError::OutOfRange {
                lba,
                count,
                total: self.total_sectors,
            });
        }
        Ok(())
    }

    /// Zeroes one sector, dropping whatever was stored there.
    pub fn wipe_sector(&mut self, lba: u64) {
        self.sectors.remove(&lba);
    }
}

impl SectorStore for SparseStore {
    fn total_sectors(&self) -> u64 {
        self.total_sectors
    }

    fn read_sectors(&mut self, lba: u64, count: u64) -> Result<Vec<u8>, ParteditError> {
        self.check_extent(lba, count)?;
        let mut buf = vec![0u8; (count * self.sector_size) as usize];
        for i in 0..count {
            if let Some(sector) = self.sectors.get(&(lba + i)) {
                let off = (i * self.sector_size) as usize;
                buf[off..off + self.sector_size as usize].copy_from_slice(sector);
            }
        }
        Ok(buf)
    }

    fn write_sectors(&mut self, lba: u64, count: u64, data: &[u8]) -> Result<(), ParteditError> {
        self.check_extent(lba, count)?;
        for i in 0..count {
            let off = (i * self.sector_size) as usize;
            self.sectors
                .insert(lba + i, data[off..off + self.sector_size as usize].to_vec());
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ParteditError> {
        Ok(())
    }
}
