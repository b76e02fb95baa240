//! Preparation of inputs for point-to-point travel time matrices.
//!
//! The crate derives date-accurate, spatially cropped street network extracts
//! from an OSM history archive, snaps origins and destinations to a routable
//! network, and folds the resulting walking access times back into raw travel
//! times produced by an external routing engine.

pub mod computer;
pub mod correct;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod model;
pub mod network;
pub mod prelude;
pub mod snapping;

pub use computer::{
    SnapParameters, TravelTimeMatrixComputer, TravelTimeMatrixComputerBuilder, UnsnappedPolicy,
};
pub use correct::{add_access_times, clean_same_same_od_pairs, correct_travel_times};
pub use error::Error;
pub use extract::{ArchiveId, ExtentId, ExtractCache, ExtractKey, ExtractionTool, Osmium, ToolOutput};
pub use geometry::{Extent, Frame, UtmZone, normalize_places};
pub use model::{NormalizedPlace, Place, SnapOutcome, SnappedPlace, TravelTimeRecord};
pub use network::{
    NetworkLoader, OsmStreetLoader, RoutableNetwork, StreetNetwork, TravelTimeEngine,
    TravelTimeRequest,
};
pub use snapping::{AccessTimes, max_snap_distance, snap_places};

/// Caller supplied identifier of an origin or destination
pub type PlaceId = String;
/// Minutes
pub type Minutes = u32;

/// Distance, in metres, by which input points are buffered when no extent is given
pub const EXTENT_BUFFER: f64 = 2000.0;
/// Edge length of one cell of the routing engine's spatial grid, in metres
pub const GRID_CELL_SIZE: f64 = 250.0;
/// Walking speed used for access times, km/h
pub const WALKING_SPEED_KMH: f64 = 3.6;
