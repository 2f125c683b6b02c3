use thiserror::Error;

/// Errors surfaced by the partitioning engine.
///
/// Validation variants leave the in-memory scheme untouched; `Io` is fatal
/// and aborts the load or save that raised it.
#[derive(Debug, Error)]
pub enum ParteditError {
    #[error("image too small: {0} bytes (minimum 524288)")]
    ImageTooSmall(u64),

    #[error("unsupported sector size: {0} (expected 512, 1024, 2048 or 4096)")]
    UnsupportedSectorSize(u64),

    #[error("invalid alignment: {0} (expected a power of two)")]
    InvalidAlignment(u64),

    #[error("invalid CHS geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid GUID: {0:?}")]
    InvalidGuid(String),

    #[error("partition index {0} out of range")]
    IndexOutOfRange(usize),

    #[error("partition {0} is already in use")]
    PartitionInUse(usize),

    #[error("partition {0} is not in use")]
    PartitionNotInUse(usize),

    #[error("start sector {0} is after end sector {1}")]
    InvertedRange(u64, u64),

    #[error("sectors {start}..={end} fall outside the usable range {first}..={last}")]
    OutsideUsable {
        start: u64,
        end: u64,
        first: u64,
        last: u64,
    },

    #[error("sectors {start}..={end} overlap partition {index}")]
    Overlap { start: u64, end: u64, index: usize },

    #[error("range exceeds MBR addressing limits (start {0}, end {1})")]
    MbrLimits(u64, u64),

    #[error("a zero type would mark the partition unused; delete it instead")]
    ZeroType,

    #[error("the bootable flag only applies to MBR partition tables")]
    NotMbr,

    #[error("partition type does not match the partition table kind")]
    TypeKindMismatch,

    #[error("sector extent {lba}+{count} exceeds image of {total} sectors")]
    OutOfRange { lba: u64, count: u64, total: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
