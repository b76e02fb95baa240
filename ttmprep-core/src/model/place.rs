use geo::{Geometry, Point};

use crate::PlaceId;

/// Origin or destination as supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub id: PlaceId,
    /// Any geometry, in the caller's reference frame
    pub geometry: Geometry<f64>,
}

impl Place {
    pub fn new(id: impl Into<PlaceId>, geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            id: id.into(),
            geometry: geometry.into(),
        }
    }
}

/// Place reduced to a single representative point in the working frame
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPlace {
    pub id: PlaceId,
    /// Representative point (WGS84)
    pub geometry: Point<f64>,
    /// Input geometry reprojected to WGS84, kept for joining output back
    pub original: Geometry<f64>,
}

/// Result of looking for a network point near a place
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapOutcome {
    Snapped {
        /// Nearest network point (WGS84)
        point: Point<f64>,
        /// Metres between the place and `point`
        distance: f64,
    },
    /// Nothing routable within the search radius
    Unsnapped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnappedPlace {
    pub id: PlaceId,
    pub geometry: Point<f64>,
    pub snap: SnapOutcome,
}

impl SnappedPlace {
    pub fn snapped_point(&self) -> Option<Point<f64>> {
        match self.snap {
            SnapOutcome::Snapped { point, .. } => Some(point),
            SnapOutcome::Unsnapped => None,
        }
    }

    pub fn snap_distance(&self) -> Option<f64> {
        match self.snap {
            SnapOutcome::Snapped { distance, .. } => Some(distance),
            SnapOutcome::Unsnapped => None,
        }
    }

    /// Point handed to the routing engine: the snapped point when there is one,
    /// the representative point otherwise.
    pub fn routing_point(&self) -> Point<f64> {
        self.snapped_point().unwrap_or(self.geometry)
    }
}
