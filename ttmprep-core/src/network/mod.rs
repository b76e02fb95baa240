//! Interfaces of the routing engine, and a street network that can snap
//! points on its own.

mod osm;
mod street;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, TimeDelta};
use geo::Point;

use crate::{Error, SnappedPlace, TravelTimeRecord};

pub use osm::OsmStreetLoader;
pub use street::StreetNetwork;

/// Network that can map arbitrary points onto its routable parts
pub trait RoutableNetwork {
    /// For every WGS84 point, the nearest routable point no further than
    /// `radius` metres away, if there is one. Output order follows input order.
    fn snap_to_network(
        &self,
        points: &[Point<f64>],
        radius: f64,
    ) -> Result<Vec<Option<Point<f64>>>, Error>;
}

/// Builds a routable network from an extract and transit schedules
pub trait NetworkLoader {
    type Network: RoutableNetwork;

    fn load(&self, extract: &Path, gtfs_data_sets: &[PathBuf]) -> Result<Self::Network, Error>;
}

/// Parameters of one travel time computation
#[derive(Debug, Clone)]
pub struct TravelTimeRequest<'a> {
    pub network_extract: &'a Path,
    pub gtfs_data_sets: &'a [PathBuf],
    pub departure: NaiveDateTime,
    pub max_time: TimeDelta,
    /// km/h per way class, passed through untouched
    pub cycling_speeds: Option<&'a BTreeMap<String, f64>>,
}

/// Routing engine computing raw door-to-door times between snapped points
pub trait TravelTimeEngine {
    /// One record per origin/destination pair the engine reports on. Times
    /// are minutes between the routing points of the places.
    fn travel_times(
        &self,
        request: &TravelTimeRequest<'_>,
        origins: &[SnappedPlace],
        destinations: &[SnappedPlace],
    ) -> Result<Vec<TravelTimeRecord>, Error>;
}
