//! Snapping places to the network and the walking penalty it incurs

mod access;
mod snapper;

pub use access::{AccessTimes, access_time, metres_per_minute};
pub use snapper::{max_snap_distance, snap_places};
