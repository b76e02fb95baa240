pub use crate::{EXTENT_BUFFER, GRID_CELL_SIZE, WALKING_SPEED_KMH};

// Run orchestration
pub use crate::computer::{
    SnapParameters, TravelTimeMatrixComputer, TravelTimeMatrixComputerBuilder, UnsnappedPolicy,
};
pub use crate::extract::{ExtractCache, ExtractionTool, Osmium};

// Geometry and places
pub use crate::geometry::{Extent, Frame, UtmZone};
pub use crate::model::{Place, SnapOutcome, SnappedPlace, TravelTimeRecord};

// Collaborators
pub use crate::network::{
    NetworkLoader, OsmStreetLoader, RoutableNetwork, StreetNetwork, TravelTimeEngine,
    TravelTimeRequest,
};

// Post-processing
pub use crate::correct::correct_travel_times;
pub use crate::snapping::AccessTimes;

pub use crate::Error;
pub use crate::Minutes;
pub use crate::PlaceId;
