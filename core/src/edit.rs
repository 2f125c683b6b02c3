// Editing operations on a unified scheme: the validated mutations the
// command loop binds to. Every check runs before anything is written, so a
// rejected edit leaves the scheme exactly as it was.

use crate::error::ParteditError;
use crate::placement::find_overlap;
use crate::scheme::{PartType, Scheme, SchemeKind};

impl Scheme {
    fn check_index(&self, index: usize) -> Result<(), ParteditError> {
        if index >= self.part_count() {
            return Err(ParteditError::IndexOutOfRange(index));
        }
        Ok(())
    }

    /// Validates a sector range against the usable window, the MBR 32-bit
    /// limits and the other used partitions.
    fn check_range(
        &self,
        start_lba: u64,
        end_lba: u64,
        ignore: Option<usize>,
    ) -> Result<(), ParteditError> {
        if start_lba > end_lba {
            return Err(ParteditError::InvertedRange(start_lba, end_lba));
        }
        let first = self.first_usable_lba();
        let last = self.last_usable_lba();
        if start_lba < first || end_lba > last {
            return Err(ParteditError::OutsideUsable {
                start: start_lba,
                end: end_lba,
                first,
                last,
            });
        }
        if self.kind() == SchemeKind::Mbr {
            let size = end_lba - start_lba + 1;
            if start_lba > u32::MAX as u64 || size > u32::MAX as u64 {
                return Err(ParteditError::MbrLimits(start_lba, end_lba));
            }
        }
        if let Some(index) = find_overlap(self, start_lba, end_lba, ignore) {
            return Err(ParteditError::Overlap {
                start: start_lba,
                end: end_lba,
                index,
            });
        }
        Ok(())
    }

    /// Creates partition `index` over `[start_lba, end_lba]` with codec
    /// defaults for everything else.
    pub fn add_partition(
        &mut self,
        index: usize,
        start_lba: u64,
        end_lba: u64,
    ) -> Result<(), ParteditError> {
        self.check_index(index)?;
        if self.part_is_used(index) {
            return Err(ParteditError::PartitionInUse(index));
        }
        self.check_range(start_lba, end_lba, Some(index))?;
        self.part_init(index);
        let part = &mut self.parts_mut()[index];
        part.start_lba = start_lba;
        part.end_lba = end_lba;
        Ok(())
    }

    /// Moves or resizes partition `index`, keeping its type and identity.
    pub fn resize_partition(
        &mut self,
        index: usize,
        start_lba: u64,
        end_lba: u64,
    ) -> Result<(), ParteditError> {
        self.check_index(index)?;
        if !self.part_is_used(index) {
            return Err(ParteditError::PartitionNotInUse(index));
        }
        self.check_range(start_lba, end_lba, Some(index))?;
        let part = &mut self.parts_mut()[index];
        part.start_lba = start_lba;
        part.end_lba = end_lba;
        Ok(())
    }

    /// Changes the type of partition `index`. The type must belong to this
    /// scheme's codec, and zero types are rejected because they would mark
    /// the entry unused.
    pub fn set_type(&mut self, index: usize, ptype: PartType) -> Result<(), ParteditError> {
        self.check_index(index)?;
        if !self.part_is_used(index) {
            return Err(ParteditError::PartitionNotInUse(index));
        }
        match (self.kind(), ptype) {
            (SchemeKind::Mbr, PartType::Mbr(0)) => return Err(ParteditError::ZeroType),
            (SchemeKind::Gpt, PartType::Gpt(g)) if g.is_zero() => {
                return Err(ParteditError::ZeroType)
            }
            (SchemeKind::Mbr, PartType::Mbr(_)) | (SchemeKind::Gpt, PartType::Gpt(_)) => {}
            _ => return Err(ParteditError::TypeKindMismatch),
        }
        self.parts_mut()[index].ptype = ptype;
        Ok(())
    }

    /// Flips the 0x80 boot-indicator bit of an MBR partition.
    pub fn toggle_bootable(&mut self, index: usize) -> Result<(), ParteditError> {
        if self.kind() != SchemeKind::Mbr {
            return Err(ParteditError::NotMbr);
        }
        self.check_index(index)?;
        if !self.part_is_used(index) {
            return Err(ParteditError::PartitionNotInUse(index));
        }
        self.parts_mut()[index].boot_ind ^= 0x80;
        Ok(())
    }

    /// Zeroes partition `index`.
    pub fn delete_partition(&mut self, index: usize) -> Result<(), ParteditError> {
        self.check_index(index)?;
        if !self.part_is_used(index) {
            return Err(ParteditError::PartitionNotInUse(index));
        }
        self.parts_mut()[index].clear();
        Ok(())
    }
}
