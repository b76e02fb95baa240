use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use geo::Geometry;
use serde::Deserialize;
use ttmprep_core::prelude::*;
use wkt::TryFromWkt;

/// Settings of one preparation run, read from a TOML file.
///
/// Relative paths are resolved against the directory of the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrepConfig {
    pub osm_history_file: PathBuf,
    pub date: NaiveDate,
    /// `GeoJSON` feature collection with an `id` property per feature
    pub origins_destinations: PathBuf,
    #[serde(default = "default_input_frame")]
    pub input_frame: Frame,
    #[serde(default)]
    pub gtfs_data_sets: Vec<PathBuf>,
    /// WKT polygon or multipolygon, WGS84
    #[serde(default)]
    pub extent: Option<String>,
    /// Where extracts are kept; next to the history file if unset
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_osmium")]
    pub osmium: PathBuf,
    #[serde(default)]
    pub unsnapped_policy: UnsnappedPolicy,
    #[serde(default)]
    pub snapping: SnapParameters,
    #[serde(default)]
    pub cycling_speeds: Option<BTreeMap<String, f64>>,
}

fn default_input_frame() -> Frame {
    Frame::Wgs84
}

fn default_osmium() -> PathBuf {
    PathBuf::from("osmium")
}

impl PrepConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Self = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.osm_history_file);
        resolve(&mut self.origins_destinations);
        self.gtfs_data_sets.iter_mut().for_each(resolve);
        if let Some(cache_dir) = self.cache_dir.as_mut() {
            resolve(cache_dir);
        }
        // bare program names are looked up on PATH
        if self.osmium.components().count() > 1 {
            resolve(&mut self.osmium);
        }
    }

    pub fn extent(&self) -> anyhow::Result<Option<Extent>> {
        self.extent
            .as_deref()
            .map(|text| {
                let geometry = Geometry::<f64>::try_from_wkt_str(text)
                    .map_err(|e| anyhow!("Invalid extent WKT: {e}"))?;
                Extent::try_from(geometry).context("Invalid extent")
            })
            .transpose()
    }

    pub fn extract_cache(&self) -> anyhow::Result<ExtractCache<Osmium>> {
        let cache = ExtractCache::new(Osmium::new(&self.osmium))?;
        Ok(match &self.cache_dir {
            Some(dir) => cache.with_cache_dir(dir),
            None => cache,
        })
    }

    /// Builder for a computation over the given places
    pub fn computer_builder(
        &self,
        places: Vec<Place>,
    ) -> anyhow::Result<TravelTimeMatrixComputerBuilder> {
        Ok(
            TravelTimeMatrixComputer::builder(&self.osm_history_file, self.date, places)
                .input_frame(self.input_frame)
                .gtfs_data_sets(self.gtfs_data_sets.clone())
                .extent(self.extent()?)
                .cycling_speeds(self.cycling_speeds.clone())
                .parameters(self.snapping)
                .unsnapped_policy(self.unsnapped_policy),
        )
    }
}
