mod file_finder;
mod index;

pub use file_finder::{
    AssetFile, ContainerCounts, ContainerFile, ContainerKind, FileFinder, FoundFile, Inventory,
};
pub use index::{fuzzy_key, IndexEntry, ProjectIndex};
