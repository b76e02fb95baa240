use serde::Deserialize;

use crate::snapping::max_snap_distance;
use crate::{EXTENT_BUFFER, GRID_CELL_SIZE, WALKING_SPEED_KMH};

/// Tunables of extent derivation, snapping and access times
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapParameters {
    /// Metres
    pub grid_cell_size: f64,
    /// km/h
    pub walking_speed_kmh: f64,
    /// Metres
    pub extent_buffer: f64,
}

impl SnapParameters {
    /// Metres
    pub fn search_radius(&self) -> f64 {
        max_snap_distance(self.grid_cell_size)
    }
}

impl Default for SnapParameters {
    fn default() -> Self {
        Self {
            grid_cell_size: GRID_CELL_SIZE,
            walking_speed_kmh: WALKING_SPEED_KMH,
            extent_buffer: EXTENT_BUFFER,
        }
    }
}

/// What happens to a place with no network point within the search radius
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnsnappedPolicy {
    /// Keep the place, routed from where it is, with no access walk
    #[default]
    ZeroPenalty,
    /// Leave the place out of the computation
    Exclude,
}
