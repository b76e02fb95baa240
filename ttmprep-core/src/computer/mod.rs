//! One travel time matrix computation: its inputs, derived once and then
//! read-only

mod builder;
mod parameters;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use log::info;

use crate::{
    AccessTimes, Error, Extent, NormalizedPlace, SnappedPlace, TravelTimeEngine, TravelTimeRecord,
    TravelTimeRequest, correct_travel_times,
};

pub use builder::TravelTimeMatrixComputerBuilder;
pub use parameters::{SnapParameters, UnsnappedPolicy};

/// Departure hour on the analysis date
pub const DEPARTURE_HOUR: i64 = 12;
/// Longest trip the routing engine is asked to search for, hours
pub const MAX_TIME_HOURS: i64 = 24;

/// Fully prepared inputs of a travel time matrix computation
#[derive(Debug, Clone)]
pub struct TravelTimeMatrixComputer {
    date: NaiveDate,
    extent: Extent,
    osm_extract_file: PathBuf,
    gtfs_data_sets: Vec<PathBuf>,
    cycling_speeds: Option<BTreeMap<String, f64>>,
    normalized: Vec<NormalizedPlace>,
    places: Vec<SnappedPlace>,
    access_times: AccessTimes,
}

impl TravelTimeMatrixComputer {
    pub fn builder(
        osm_history_file: impl Into<PathBuf>,
        date: NaiveDate,
        places: Vec<crate::Place>,
    ) -> TravelTimeMatrixComputerBuilder {
        TravelTimeMatrixComputerBuilder::new(osm_history_file, date, places)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn osm_extract_file(&self) -> &Path {
        &self.osm_extract_file
    }

    pub fn gtfs_data_sets(&self) -> &[PathBuf] {
        &self.gtfs_data_sets
    }

    /// Snapped origins and destinations, in input order
    pub fn places(&self) -> &[SnappedPlace] {
        &self.places
    }

    /// Places with their original geometry, for joining output back
    pub fn normalized_places(&self) -> &[NormalizedPlace] {
        &self.normalized
    }

    pub fn access_times(&self) -> &AccessTimes {
        &self.access_times
    }

    pub fn request(&self) -> TravelTimeRequest<'_> {
        TravelTimeRequest {
            network_extract: &self.osm_extract_file,
            gtfs_data_sets: &self.gtfs_data_sets,
            departure: self.date.and_time(NaiveTime::MIN) + TimeDelta::hours(DEPARTURE_HOUR),
            max_time: TimeDelta::hours(MAX_TIME_HOURS),
            cycling_speeds: self.cycling_speeds.as_ref(),
        }
    }

    /// Raw travel times of the engine corrected for access walks and
    /// identical origin/destination pairs
    pub fn correct(&self, records: Vec<TravelTimeRecord>) -> Vec<TravelTimeRecord> {
        correct_travel_times(records, &self.access_times)
    }

    /// Travel times between all places, every place being both origin and
    /// destination
    ///
    /// # Errors
    ///
    /// Propagates failures of the routing engine.
    pub fn compute<E>(&self, engine: &E) -> Result<Vec<TravelTimeRecord>, Error>
    where
        E: TravelTimeEngine + ?Sized,
    {
        info!(
            "Computing travel times between {} origins/destinations",
            self.places.len()
        );
        let raw = engine.travel_times(&self.request(), &self.places, &self.places)?;
        Ok(self.correct(raw))
    }
}
