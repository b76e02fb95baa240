//! Date-accurate, spatially cropped network extracts from an OSM history
//! archive, cached on disk

mod cache;
mod tool;

pub use crate::geometry::extent::ExtentId;
pub use cache::{ArchiveId, ExtractCache, ExtractKey};
pub use tool::{ExtractionTool, Osmium, ToolOutput};
