//! Origins, destinations and the travel time records produced for them

pub mod place;
pub mod record;

pub use place::{NormalizedPlace, Place, SnapOutcome, SnappedPlace};
pub use record::TravelTimeRecord;
