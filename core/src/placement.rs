// Placement engine: overlap detection and free-space search over a scheme.
//
// Every search takes an optional ignore index so that editing an existing
// partition does not collide with itself.

use crate::image::ImageContext;
use crate::scheme::Scheme;

/// Index of the first used partition overlapping the inclusive range
/// `[start_lba, end_lba]`, skipping `ignore`.
pub fn find_overlap(
    scheme: &Scheme,
    start_lba: u64,
    end_lba: u64,
    ignore: Option<usize>,
) -> Option<usize> {
    scheme.parts().iter().enumerate().position(|(i, part)| {
        ignore != Some(i)
            && part.is_used()
            && start_lba <= part.end_lba
            && part.start_lba <= end_lba
    })
}

/// First free sector a new partition could start at, preferring aligned
/// candidates. Falls back to un-aligned positions when alignment would run
/// past the usable range.
pub fn find_start_sector(scheme: &Scheme, img: &ImageContext, ignore: Option<usize>) -> Option<u64> {
    let first = scheme.first_usable_lba();
    let last = scheme.last_usable_lba();

    let mut candidate = img.lba_align(first, true);
    if candidate > last {
        candidate = first;
    }

    loop {
        let hit = scheme
            .parts()
            .iter()
            .enumerate()
            .find(|&(i, part)| {
                ignore != Some(i)
                    && part.is_used()
                    && part.start_lba <= candidate
                    && candidate <= part.end_lba
            })
            .map(|(_, part)| part);

        let Some(part) = hit else {
            return Some(candidate);
        };

        let next = part.end_lba + 1;
        if next > last {
            return None;
        }
        let aligned = img.lba_align(next, true);
        candidate = if aligned > last { next } else { aligned };
    }
}

/// Last sector a partition starting at `first_lba` could end at: the usable
/// end, backed off below the next used partition, aligned down when an
/// aligned end still leaves a valid, non-overlapping range.
pub fn find_last_sector(
    scheme: &Scheme,
    img: &ImageContext,
    ignore: Option<usize>,
    first_lba: u64,
) -> Option<u64> {
    let mut bound = scheme.last_usable_lba();
    for (i, part) in scheme.parts().iter().enumerate() {
        if ignore == Some(i) || !part.is_used() {
            continue;
        }
        if part.start_lba > first_lba && part.start_lba - 1 < bound {
            bound = part.start_lba - 1;
        }
    }
    if bound < first_lba {
        return None;
    }

    let aligned_boundary = img.lba_align(bound + 1, false);
    if aligned_boundary > 0 {
        let aligned_end = aligned_boundary - 1;
        if aligned_end >= first_lba && find_overlap(scheme, first_lba, aligned_end, ignore).is_none()
        {
            return Some(aligned_end);
        }
    }
    Some(bound)
}

/// Lowest index whose used-state matches `used`.
pub fn find_part_index(scheme: &Scheme, used: bool) -> Option<usize> {
    scheme.parts().iter().position(|part| part.is_used() == used)
}
