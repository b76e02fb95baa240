use geo::{BoundingRect, Coord, LineString, MultiLineString, Point};
use log::debug;
use rayon::prelude::*;
use rstar::{PointDistance, RTree, primitives::Line};

use crate::{Error, Frame, network::RoutableNetwork};

/// Walkable street segments indexed for nearest-point queries
#[derive(Clone)]
pub struct StreetNetwork {
    /// Metric frame the index is built in
    frame: Frame,
    rtree: RTree<Line<[f64; 2]>>,
}

impl StreetNetwork {
    /// Builds the index from WGS84 street geometries
    ///
    /// # Errors
    ///
    /// Returns an error if the geometries contain no segment of non-zero length
    pub fn new(streets: Vec<LineString<f64>>) -> Result<Self, Error> {
        let streets = MultiLineString::new(streets);
        let frame = Frame::best_metric(streets.bounding_rect());

        let segments: Vec<Line<[f64; 2]>> = streets
            .iter()
            .flat_map(|street| street.lines())
            .filter(|line| line.start != line.end)
            .map(|line| {
                Line::new(
                    to_array(frame.from_wgs84(line.start)),
                    to_array(frame.from_wgs84(line.end)),
                )
            })
            .collect();

        if segments.is_empty() {
            return Err(Error::NetworkError(
                "street network contains no walkable segments".to_string(),
            ));
        }
        debug!("Indexing {} street segments in {frame}", segments.len());

        Ok(Self {
            frame,
            rtree: RTree::bulk_load(segments),
        })
    }

    pub fn segment_count(&self) -> usize {
        self.rtree.size()
    }

    fn nearest_point(&self, point: Point<f64>, radius: f64) -> Option<Point<f64>> {
        let query = to_array(self.frame.from_wgs84(point.0));
        let segment = self.rtree.nearest_neighbor(&query)?;
        if segment.distance_2(&query) > radius * radius {
            return None;
        }
        let [x, y] = segment.nearest_point(&query);
        Some(Point::from(self.frame.to_wgs84(Coord { x, y })))
    }
}

impl RoutableNetwork for StreetNetwork {
    fn snap_to_network(
        &self,
        points: &[Point<f64>],
        radius: f64,
    ) -> Result<Vec<Option<Point<f64>>>, Error> {
        Ok(points
            .par_iter()
            .map(|point| self.nearest_point(*point, radius))
            .collect())
    }
}

fn to_array(coord: Coord<f64>) -> [f64; 2] {
    [coord.x, coord.y]
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Distance, Haversine};

    fn network() -> StreetNetwork {
        // east-west street along the equator, north-south street at 0.02°E
        StreetNetwork::new(vec![
            LineString::from(vec![(-0.01, 0.0), (0.01, 0.0)]),
            LineString::from(vec![(0.02, -0.01), (0.02, 0.01)]),
        ])
        .unwrap()
    }

    #[test]
    fn snaps_onto_segment_interior() {
        let snapped = network()
            .snap_to_network(&[Point::new(0.0, 0.001)], 177.0)
            .unwrap();
        let point = snapped[0].unwrap();
        assert!(point.x().abs() < 1e-7);
        assert!(point.y().abs() < 1e-7);
    }

    #[test]
    fn respects_radius() {
        // ~111 m and ~556 m from the nearest street
        let points = [Point::new(0.0, 0.001), Point::new(0.0, 0.005)];
        let snapped = network().snap_to_network(&points, 177.0).unwrap();
        assert!(snapped[0].is_some());
        assert!(snapped[1].is_none());

        let distance = Haversine.distance(points[0], snapped[0].unwrap());
        assert!(distance <= 177.0);
    }

    #[test]
    fn picks_closest_street() {
        let snapped = network()
            .snap_to_network(&[Point::new(0.0195, 0.005)], 177.0)
            .unwrap();
        let point = snapped[0].unwrap();
        assert!((point.x() - 0.02).abs() < 1e-7);
        assert!((point.y() - 0.005).abs() < 1e-6);
    }

    #[test]
    fn degenerate_segments_are_skipped() {
        let network = StreetNetwork::new(vec![
            LineString::from(vec![(0.0, 0.0), (0.0, 0.0), (0.01, 0.0), (0.02, 0.0)]),
        ])
        .unwrap();
        assert_eq!(network.segment_count(), 2);
    }

    #[test]
    fn empty_network_is_an_error() {
        assert!(StreetNetwork::new(vec![]).is_err());
        assert!(StreetNetwork::new(vec![LineString::from(vec![(1.0, 1.0), (1.0, 1.0)])]).is_err());
    }
}
