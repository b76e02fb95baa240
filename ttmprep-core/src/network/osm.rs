use std::path::{Path, PathBuf};

use geo::LineString;
use log::{debug, info};

use super::{NetworkLoader, StreetNetwork};
use crate::Error;

/// Loads the walkable street network of an OSM extract.
///
/// Only streets are read; transit schedules are left to the routing engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsmStreetLoader;

impl NetworkLoader for OsmStreetLoader {
    type Network = StreetNetwork;

    fn load(&self, extract: &Path, gtfs_data_sets: &[PathBuf]) -> Result<StreetNetwork, Error> {
        if !extract.exists() {
            return Err(Error::MissingArtifact(extract.to_path_buf()));
        }
        if !gtfs_data_sets.is_empty() {
            debug!(
                "Ignoring {} GTFS data sets while loading streets for snapping",
                gtfs_data_sets.len()
            );
        }

        info!("Processing street data (OSM): {}", extract.display());
        let path = extract
            .to_str()
            .ok_or_else(|| Error::InvalidData(format!("Non UTF-8 path: {}", extract.display())))?;
        let (_nodes, edges) =
            osm4routing::read(path).map_err(|e| Error::NetworkError(e.to_string()))?;

        let streets: Vec<LineString<f64>> = edges
            .into_iter()
            .filter(|edge| matches!(edge.properties.foot, osm4routing::FootAccessibility::Allowed))
            .map(|edge| {
                edge.geometry
                    .iter()
                    .map(|coord| (coord.lon, coord.lat))
                    .collect::<LineString<f64>>()
            })
            .collect();
        info!("Read {} walkable streets", streets.len());

        let network = StreetNetwork::new(streets)?;

        info!("Indexed {} street segments", network.segment_count());

        // Parsing protobuf blocks leaves large freed allocations on the heap;
        // hand them back to the system before routing starts.
        //
        // # Safety
        //
        // `malloc_trim` only releases free memory held by glibc's allocator,
        // which the cfg attribute guarantees is the one in use.
        #[cfg(all(target_os = "linux", target_env = "gnu"))]
        unsafe {
            if libc::malloc_trim(0) == 0 {
                debug!("No heap memory could be returned to the system");
            } else {
                debug!("Trimmed unused heap memory");
            }
        }

        Ok(network)
    }
}
