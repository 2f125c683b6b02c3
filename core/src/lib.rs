// Partitioning engine: MBR and GPT codecs, the unified scheme model over
// them, placement search and the detection/load/save protocol.

pub mod context;
pub mod crc32;
pub mod edit;
pub mod error;
pub mod gpt;
pub mod guid;
pub mod image;
pub mod mbr;
pub mod placement;
pub mod scheme;
pub mod store;

pub use context::SchemeContext;
pub use error::ParteditError;
pub use guid::Guid;
pub use image::{Chs, ImageContext, MIN_IMAGE_BYTES};
pub use placement::{find_last_sector, find_overlap, find_part_index, find_start_sector};
pub use scheme::{GptScheme, MbrScheme, PartType, Scheme, SchemeKind, SchemePart};
pub use store::{FileSectorStore, IoSectorStore, MemSectorStore, SectorStore};
