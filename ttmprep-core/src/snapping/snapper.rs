use std::f64::consts::SQRT_2;

use geo::{Distance, Euclidean};
use log::{info, warn};

use crate::{Error, Frame, NormalizedPlace, RoutableNetwork, SnapOutcome, SnappedPlace};

/// Search radius for snapping: half the diagonal of one grid cell, rounded up.
///
/// Any point of a cell reaches the network node representing that cell
/// without searching into neighbouring cells.
pub fn max_snap_distance(grid_cell_size: f64) -> f64 {
    (grid_cell_size * SQRT_2 / 2.0).ceil()
}

/// Snaps every place to the nearest network point within `radius` metres.
///
/// Snap distances are measured in `metric_frame`, not in the geographic
/// working frame.
///
/// # Errors
///
/// Propagates failures of the network and rejects answers that do not match
/// the places one to one.
pub fn snap_places<N>(
    places: &[NormalizedPlace],
    network: &N,
    metric_frame: Frame,
    radius: f64,
) -> Result<Vec<SnappedPlace>, Error>
where
    N: RoutableNetwork + ?Sized,
{
    let points: Vec<_> = places.iter().map(|place| place.geometry).collect();
    let snapped = network.snap_to_network(&points, radius)?;
    if snapped.len() != places.len() {
        return Err(Error::NetworkError(format!(
            "snapping {} points returned {} results",
            places.len(),
            snapped.len()
        )));
    }

    let result: Vec<SnappedPlace> = places
        .iter()
        .zip(snapped)
        .map(|(place, snapped_point)| {
            let snap = match snapped_point {
                Some(point) => SnapOutcome::Snapped {
                    point,
                    distance: Euclidean.distance(
                        metric_frame.project(&place.geometry),
                        metric_frame.project(&point),
                    ),
                },
                None => SnapOutcome::Unsnapped,
            };
            SnappedPlace {
                id: place.id.clone(),
                geometry: place.geometry,
                snap,
            }
        })
        .collect();

    let unsnapped = result
        .iter()
        .filter(|place| place.snap == SnapOutcome::Unsnapped)
        .count();
    if unsnapped > 0 {
        warn!("{unsnapped} places have no network point within {radius} m");
    }
    info!("Snapped {} places to the network", result.len() - unsnapped);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, Point};

    /// Moves every point a fixed offset north, or refuses beyond a latitude
    struct ShiftNetwork {
        offset: f64,
        max_lat: f64,
    }

    impl RoutableNetwork for ShiftNetwork {
        fn snap_to_network(
            &self,
            points: &[Point<f64>],
            _radius: f64,
        ) -> Result<Vec<Option<Point<f64>>>, Error> {
            Ok(points
                .iter()
                .map(|p| (p.y() < self.max_lat).then(|| Point::new(p.x(), p.y() + self.offset)))
                .collect())
        }
    }

    fn place(id: &str, x: f64, y: f64) -> NormalizedPlace {
        NormalizedPlace {
            id: id.to_string(),
            geometry: Point::new(x, y),
            original: Geometry::Point(Point::new(x, y)),
        }
    }

    #[test]
    fn radius_is_half_the_cell_diagonal() {
        assert_eq!(max_snap_distance(250.0), 177.0);
        assert_eq!(max_snap_distance(100.0), 71.0);
    }

    #[test]
    fn measures_distance_in_metres() {
        let network = ShiftNetwork {
            offset: 0.001,
            max_lat: 1.0,
        };
        let frame = Frame::best_metric(Some(geo::Rect::new((0.0, 0.0), (0.1, 0.1))));
        let snapped = snap_places(&[place("a", 0.05, 0.05)], &network, frame, 177.0).unwrap();
        let distance = snapped[0].snap_distance().unwrap();
        // 0.001° of latitude is about 110.6 m at the equator
        assert!((distance - 110.6).abs() < 0.5, "{distance}");
        assert_eq!(snapped[0].snapped_point(), Some(Point::new(0.05, 0.05 + 0.001)));
    }

    #[test]
    fn keeps_unsnapped_places() {
        let network = ShiftNetwork {
            offset: 0.0,
            max_lat: 0.5,
        };
        let places = [place("a", 0.0, 0.0), place("b", 0.0, 0.6)];
        let snapped = snap_places(&places, &network, Frame::WebMercator, 177.0).unwrap();
        assert_eq!(snapped.len(), 2);
        assert_eq!(snapped[0].snap_distance(), Some(0.0));
        assert_eq!(snapped[1].snap, SnapOutcome::Unsnapped);
        assert_eq!(snapped[1].routing_point(), Point::new(0.0, 0.6));
    }

    #[test]
    fn rejects_mismatched_answers() {
        struct Broken;
        impl RoutableNetwork for Broken {
            fn snap_to_network(
                &self,
                _points: &[Point<f64>],
                _radius: f64,
            ) -> Result<Vec<Option<Point<f64>>>, Error> {
                Ok(vec![])
            }
        }
        assert!(snap_places(&[place("a", 0.0, 0.0)], &Broken, Frame::WebMercator, 1.0).is_err());
    }
}
