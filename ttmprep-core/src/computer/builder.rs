use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use log::{info, warn};

use super::{SnapParameters, TravelTimeMatrixComputer, UnsnappedPolicy};
use crate::geometry::representative_points;
use crate::{
    AccessTimes, Error, Extent, ExtractCache, ExtractionTool, Frame, NetworkLoader, Place,
    SnapOutcome, normalize_places, snap_places,
};

/// Collects the inputs of a computation; [`build`](Self::build) derives
/// everything else.
#[derive(Debug, Clone)]
pub struct TravelTimeMatrixComputerBuilder {
    osm_history_file: PathBuf,
    date: NaiveDate,
    places: Vec<Place>,
    input_frame: Frame,
    gtfs_data_sets: Vec<PathBuf>,
    extent: Option<Extent>,
    cycling_speeds: Option<BTreeMap<String, f64>>,
    parameters: SnapParameters,
    unsnapped_policy: UnsnappedPolicy,
}

impl TravelTimeMatrixComputerBuilder {
    pub fn new(osm_history_file: impl Into<PathBuf>, date: NaiveDate, places: Vec<Place>) -> Self {
        Self {
            osm_history_file: osm_history_file.into(),
            date,
            places,
            input_frame: Frame::Wgs84,
            gtfs_data_sets: Vec::new(),
            extent: None,
            cycling_speeds: None,
            parameters: SnapParameters::default(),
            unsnapped_policy: UnsnappedPolicy::default(),
        }
    }

    /// Reference frame of the place geometries, WGS84 by default
    #[must_use]
    pub fn input_frame(mut self, frame: Frame) -> Self {
        self.input_frame = frame;
        self
    }

    #[must_use]
    pub fn gtfs_data_sets(mut self, gtfs_data_sets: Vec<PathBuf>) -> Self {
        self.gtfs_data_sets = gtfs_data_sets;
        self
    }

    /// Without an extent, one is derived around the places
    #[must_use]
    pub fn extent(mut self, extent: Option<Extent>) -> Self {
        self.extent = extent;
        self
    }

    #[must_use]
    pub fn cycling_speeds(mut self, cycling_speeds: Option<BTreeMap<String, f64>>) -> Self {
        self.cycling_speeds = cycling_speeds;
        self
    }

    #[must_use]
    pub fn parameters(mut self, parameters: SnapParameters) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn unsnapped_policy(mut self, policy: UnsnappedPolicy) -> Self {
        self.unsnapped_policy = policy;
        self
    }

    /// Derives extent, network extract, snapped places and access times.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, if extraction fails, if the
    /// network cannot be loaded, or if no place lies within the extent.
    pub fn build<T, L>(
        self,
        cache: &ExtractCache<T>,
        loader: &L,
    ) -> Result<TravelTimeMatrixComputer, Error>
    where
        T: ExtractionTool,
        L: NetworkLoader,
    {
        self.validate()?;

        let extent = self.resolve_extent()?;
        let normalized = normalize_places(self.places, self.input_frame, &extent)?;

        let osm_extract_file = cache.network_extract(&self.osm_history_file, self.date, &extent)?;
        let network = loader.load(&osm_extract_file, &self.gtfs_data_sets)?;

        let mut places = snap_places(
            &normalized,
            &network,
            extent.metric_frame(),
            self.parameters.search_radius(),
        )?;

        if self.unsnapped_policy == UnsnappedPolicy::Exclude {
            let before = places.len();
            places.retain(|place| place.snap != SnapOutcome::Unsnapped);
            if places.len() < before {
                info!("Excluded {} places without a nearby network point", before - places.len());
            }
            if places.is_empty() {
                return Err(Error::NoPlacesWithinExtent);
            }
        }

        let access_times = AccessTimes::from_snapped(&places, self.parameters.walking_speed_kmh);

        Ok(TravelTimeMatrixComputer {
            date: self.date,
            extent,
            osm_extract_file,
            gtfs_data_sets: self.gtfs_data_sets,
            cycling_speeds: self.cycling_speeds,
            normalized,
            places,
            access_times,
        })
    }

    /// The configured extent, or the buffered union of the places if there
    /// is none
    pub fn resolve_extent(&self) -> Result<Extent, Error> {
        match &self.extent {
            Some(extent) => Ok(extent.clone()),
            None => {
                warn!("No extent specified, using the extent of the origins and destinations");
                Extent::around_points(
                    &representative_points(&self.places, self.input_frame),
                    self.parameters.extent_buffer,
                )
            }
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if self.places.is_empty() {
            return Err(Error::InvalidData(
                "No origins or destinations provided".to_string(),
            ));
        }

        for dir in &self.gtfs_data_sets {
            if !dir.exists() {
                return Err(Error::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("GTFS data set not found: {}", dir.display()),
                )));
            }
        }

        let parameters = &self.parameters;
        if !(parameters.grid_cell_size > 0.0 && parameters.walking_speed_kmh > 0.0) {
            return Err(Error::InvalidData(format!(
                "Grid cell size and walking speed must be positive, got {parameters:?}"
            )));
        }

        Ok(())
    }
}
