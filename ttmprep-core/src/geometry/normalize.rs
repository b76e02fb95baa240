use geo::{BoundingRect, Centroid, Geometry, GeometryCollection, Point};
use hashbrown::HashSet;
use log::{debug, info, warn};

use super::{Extent, Frame};
use crate::{Error, NormalizedPlace, Place};

/// Reduces places to representative points inside the extent.
///
/// Geometries are brought from `input_frame` to WGS84. Non-point geometries
/// are replaced by their centroid, computed in the extent's metric frame so
/// that the reprojection does not distort it. Places whose representative
/// point falls outside the extent, places without a usable geometry and
/// repeated ids are dropped.
///
/// # Errors
///
/// Returns [`Error::NoPlacesWithinExtent`] if nothing survives the filtering.
pub fn normalize_places(
    places: Vec<Place>,
    input_frame: Frame,
    extent: &Extent,
) -> Result<Vec<NormalizedPlace>, Error> {
    let metric_frame = extent.metric_frame();
    let total = places.len();
    let mut seen = HashSet::with_capacity(total);

    let normalized: Vec<NormalizedPlace> = places
        .into_iter()
        .filter_map(|place| {
            let original = input_frame.unproject(&place.geometry);
            let Some(point) = representative_point(&original, metric_frame) else {
                debug!("Dropping place '{}': no usable geometry", place.id);
                return None;
            };
            if !extent.contains(&point) {
                debug!("Dropping place '{}': outside the extent", place.id);
                return None;
            }
            if !seen.insert(place.id.clone()) {
                warn!("Dropping repeated place id '{}'", place.id);
                return None;
            }
            Some(NormalizedPlace {
                id: place.id,
                geometry: point,
                original,
            })
        })
        .collect();

    info!(
        "{} of {total} origins/destinations lie within the extent",
        normalized.len()
    );

    if normalized.is_empty() {
        return Err(Error::NoPlacesWithinExtent);
    }
    Ok(normalized)
}

/// Representative points of places, WGS84, for deriving an extent. Centroids
/// are taken in the metric frame best fitting all the places.
pub(crate) fn representative_points(places: &[Place], input_frame: Frame) -> Vec<Point<f64>> {
    let geometries: Vec<Geometry<f64>> = places
        .iter()
        .map(|place| input_frame.unproject(&place.geometry))
        .collect();
    let bounds = GeometryCollection::new_from(geometries.clone()).bounding_rect();
    let metric_frame = Frame::best_metric(bounds);
    geometries
        .iter()
        .filter_map(|geometry| representative_point(geometry, metric_frame))
        .collect()
}

fn representative_point(geometry: &Geometry<f64>, metric_frame: Frame) -> Option<Point<f64>> {
    let point = match geometry {
        Geometry::Point(point) => *point,
        other => {
            let centroid = metric_frame.project(other).centroid()?;
            metric_frame.unproject(&centroid)
        }
    };
    (point.x().is_finite() && point.y().is_finite()).then_some(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, MultiPolygon, polygon};

    fn extent() -> Extent {
        Extent::try_from(polygon![
            (x: 10.0, y: 50.0),
            (x: 11.0, y: 50.0),
            (x: 11.0, y: 51.0),
            (x: 10.0, y: 51.0),
            (x: 10.0, y: 50.0),
        ])
        .unwrap()
    }

    #[test]
    fn drops_places_outside_extent() {
        let places = vec![
            Place::new("in", Point::new(10.5, 50.5)),
            Place::new("out", Point::new(12.0, 50.5)),
        ];
        let normalized = normalize_places(places, Frame::Wgs84, &extent()).unwrap();
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].id, "in");
        assert!(normalized.iter().all(|p| extent().contains(&p.geometry)));
    }

    #[test]
    fn polygons_become_centroids() {
        let cell = polygon![
            (x: 10.4, y: 50.4),
            (x: 10.6, y: 50.4),
            (x: 10.6, y: 50.6),
            (x: 10.4, y: 50.6),
            (x: 10.4, y: 50.4),
        ];
        let normalized =
            normalize_places(vec![Place::new("cell", cell.clone())], Frame::Wgs84, &extent())
                .unwrap();
        let point = normalized[0].geometry;
        assert!((point.x() - 10.5).abs() < 1e-3);
        assert!((point.y() - 50.5).abs() < 1e-3);
        assert_eq!(normalized[0].original, Geometry::Polygon(cell));
    }

    #[test]
    fn reprojects_input_frame() {
        let frame = Frame::WebMercator;
        let projected = frame.project(&Point::new(10.5, 50.5));
        let normalized =
            normalize_places(vec![Place::new("a", projected)], frame, &extent()).unwrap();
        assert!((normalized[0].geometry.x() - 10.5).abs() < 1e-9);
        assert!((normalized[0].geometry.y() - 50.5).abs() < 1e-9);
    }

    #[test]
    fn empty_geometries_and_repeated_ids_are_dropped() {
        let places = vec![
            Place::new("empty", MultiPolygon::<f64>::new(vec![])),
            Place::new("a", Point::new(10.5, 50.5)),
            Place::new("a", Point::new(10.6, 50.5)),
            Place::new("line", LineString::from(vec![(10.2, 50.2), (10.3, 50.3)])),
        ];
        let normalized = normalize_places(places, Frame::Wgs84, &extent()).unwrap();
        let ids: Vec<_> = normalized.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["a", "line"]);
        assert!((normalized[0].geometry.x() - 10.5).abs() < 1e-12);
    }

    #[test]
    fn nothing_inside_is_reported() {
        let places = vec![Place::new("out", Point::new(0.0, 0.0))];
        assert!(matches!(
            normalize_places(places, Frame::Wgs84, &extent()),
            Err(Error::NoPlacesWithinExtent)
        ));
    }
}
