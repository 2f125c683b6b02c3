// Whole-sector access to the image under edit.
//
// The codecs never touch byte offsets directly; they ask a store for an
// extent of sectors at an LBA. The store validates the extent against the
// image bounds before any I/O happens.

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use crate::error::ParteditError;

pub trait SectorStore {
    /// Number of whole sectors in the store.
    fn total_sectors(&self) -> u64;

    /// Reads `count` sectors starting at `lba`.
    fn read_sectors(&mut self, lba: u64, count: u64) -> Result<Vec<u8>, ParteditError>;

    /// Writes whole sectors starting at `lba`. `data` must hold exactly
    /// `count` sectors.
    fn write_sectors(&mut self, lba: u64, count: u64, data: &[u8]) -> Result<(), ParteditError>;

    fn flush(&mut self) -> Result<(), ParteditError>;
}

/// Sector store over any seekable byte stream: files, in-memory cursors.
pub struct IoSectorStore<T> {
    inner: T,
    sector_size: u64,
    total_sectors: u64,
}

impl<T: Read + Write + Seek> IoSectorStore<T> {
    pub fn new(inner: T, image_size: u64, sector_size: u64) -> IoSectorStore<T> {
        IoSectorStore {
            inner,
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
}

impl<T: Read + Write + Seek> SectorStore for IoSectorStore<T> {
    fn total_sectors(&self) -> u64 {
        self.total_sectors
    }

    fn read_sectors(&mut self, lba: u64, count: u64) -> Result<Vec<u8>, ParteditError> {
        self.check_extent(lba, count)?;
        let mut buf = vec![0u8; (count * self.sector_size) as usize];
        self.inner.seek(SeekFrom::Start(lba * self.sector_size))?;
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn write_sectors(&mut self, lba: u64, count: u64, data: &[u8]) -> Result<(), ParteditError> {
        self.check_extent(lba, count)?;
        debug_assert_eq!(data.len() as u64, count * self.sector_size);
        self.inner.seek(SeekFrom::Start(lba * self.sector_size))?;
        self.inner.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ParteditError> {
        self.inner.flush()?;
        Ok(())
    }
}

/// File-backed store used by the CLI.
pub type FileSectorStore = IoSectorStore<File>;

/// In-memory store over a zero-filled buffer.
pub type MemSectorStore = IoSectorStore<Cursor<Vec<u8>>>;

impl MemSectorStore {
    pub fn with_size(image_size: u64, sector_size: u64) -> MemSectorStore {
        IoSectorStore::new(
            Cursor::new(vec![0u8; image_size as usize]),
            image_size,
            sector_size,
        )
    }

    /// The backing buffer, for byte-level assertions.
    pub fn bytes(&self) -> &[u8] {
        self.inner.get_ref()
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.inner.get_mut()
    }
}
