//! Reference frames, the computation extent and place normalisation

pub mod extent;
pub mod frame;
pub mod normalize;

pub use extent::Extent;
pub use frame::{Frame, UtmZone};
pub use normalize::normalize_places;
pub(crate) use normalize::representative_points;
