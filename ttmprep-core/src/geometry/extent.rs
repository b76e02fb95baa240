use std::fmt;
use std::hash::Hasher;

use geo::{BoundingRect, Buffer, Contains, Geometry, MultiPoint, MultiPolygon, Point, Polygon, Rect};
use geojson::{Feature, FeatureCollection, Geometry as GeoJsonGeometry, Value as GeoJsonValue};
use serde_json::json;
use siphasher::sip128::{Hasher128, SipHasher13};

use super::Frame;
use crate::Error;

/// Geographic boundary of a computation run, WGS84.
///
/// Immutable once built; every input and the network extract are restricted
/// to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extent {
    area: MultiPolygon<f64>,
}

impl Extent {
    pub fn new(area: MultiPolygon<f64>) -> Result<Self, Error> {
        if area.0.is_empty() {
            return Err(Error::InvalidGeometry("extent has no polygons".to_string()));
        }
        Ok(Self { area })
    }

    /// Union of `buffer` metre discs around every point, buffered in the
    /// metric frame of their bounds
    pub fn around_points(points: &[Point<f64>], buffer: f64) -> Result<Self, Error> {
        if points.is_empty() {
            return Err(Error::InvalidGeometry(
                "cannot derive an extent from zero points".to_string(),
            ));
        }
        if !(buffer > 0.0) {
            return Err(Error::InvalidData(format!("extent buffer must be positive, got {buffer}")));
        }

        let points = MultiPoint::from(points.to_vec());
        let frame = Frame::best_metric(points.bounding_rect());
        let area = frame.project(&points).buffer(buffer);

        Self::new(frame.unproject(&area))
    }

    pub fn area(&self) -> &MultiPolygon<f64> {
        &self.area
    }

    pub fn contains(&self, point: &Point<f64>) -> bool {
        self.area.contains(point)
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.area.bounding_rect()
    }

    /// Metric frame that measures distances accurately within this extent
    pub fn metric_frame(&self) -> Frame {
        Frame::best_metric(self.bounding_rect())
    }

    /// Content hash of the geometry, stable across runs and processes
    pub fn id(&self) -> ExtentId {
        let mut hasher = SipHasher13::new();
        hasher.write(&(self.area.0.len() as u64).to_le_bytes());
        for polygon in &self.area {
            hasher.write(&(polygon.interiors().len() as u64).to_le_bytes());
            for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                hasher.write(&(ring.0.len() as u64).to_le_bytes());
                for coord in ring.coords() {
                    hasher.write(&canonical_bits(coord.x).to_le_bytes());
                    hasher.write(&canonical_bits(coord.y).to_le_bytes());
                }
            }
        }
        ExtentId(hasher.finish128().as_u128())
    }

    /// The extent as a single-feature `GeoJSON` document, the boundary polygon
    /// format understood by the extraction tool
    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        let geometry = GeoJsonGeometry::new(GeoJsonValue::from(&self.area));
        let feature = serde_json::from_value::<Feature>(json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": {},
        }))
        .map_err(|e| Error::InvalidGeometry(e.to_string()))?;

        Ok(FeatureCollection {
            features: vec![feature],
            bbox: None,
            foreign_members: None,
        })
    }
}

impl TryFrom<Geometry<f64>> for Extent {
    type Error = Error;

    fn try_from(geometry: Geometry<f64>) -> Result<Self, Self::Error> {
        match geometry {
            Geometry::Polygon(polygon) => Self::new(MultiPolygon::new(vec![polygon])),
            Geometry::MultiPolygon(area) => Self::new(area),
            Geometry::Rect(rect) => Self::new(MultiPolygon::new(vec![rect.to_polygon()])),
            other => Err(Error::InvalidGeometry(format!(
                "extent must be a polygon or multipolygon, got {other:?}"
            ))),
        }
    }
}

impl TryFrom<Polygon<f64>> for Extent {
    type Error = Error;

    fn try_from(polygon: Polygon<f64>) -> Result<Self, Self::Error> {
        Self::new(MultiPolygon::new(vec![polygon]))
    }
}

/// Stable identity of an [`Extent`], used in cache file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtentId(u128);

impl fmt::Display for ExtentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

fn canonical_bits(value: f64) -> u64 {
    // -0.0 and 0.0 describe the same position
    if value == 0.0 { 0 } else { value.to_bits() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Distance, Haversine, polygon};

    fn square() -> Polygon<f64> {
        polygon![
            (x: 24.0, y: 60.0),
            (x: 25.0, y: 60.0),
            (x: 25.0, y: 61.0),
            (x: 24.0, y: 61.0),
            (x: 24.0, y: 60.0),
        ]
    }

    #[test]
    fn identical_geometries_share_an_id() {
        let a = Extent::try_from(square()).unwrap();
        let b = Extent::try_from(Geometry::Polygon(square())).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().to_string(), b.id().to_string());
        assert_eq!(a.id().to_string().len(), 32);
    }

    #[test]
    fn different_geometries_differ() {
        let a = Extent::try_from(square()).unwrap();
        let mut moved = square();
        moved.exterior_mut(|ring| ring.0[2].x = 25.5);
        let b = Extent::try_from(moved).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn id_ignores_sign_of_zero() {
        let a = Extent::try_from(polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)]).unwrap();
        let b = Extent::try_from(polygon![(x: -0.0, y: 0.0), (x: 1.0, y: -0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)]).unwrap();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn derived_extent_covers_buffered_points() {
        let points = [Point::new(0.0, 0.0), Point::new(0.0, 0.01)];
        let extent = Extent::around_points(&points, 2000.0).unwrap();

        // close points merge into a single area
        assert_eq!(extent.area().0.len(), 1);
        assert!(extent.contains(&points[0]));
        assert!(extent.contains(&points[1]));

        let near = Point::new(0.015, 0.0);
        let far = Point::new(0.03, 0.0);
        assert!(Haversine.distance(points[0], near) < 1900.0);
        assert!(Haversine.distance(points[0], far) > 2100.0);
        assert!(extent.contains(&near));
        assert!(!extent.contains(&far));
    }

    #[test]
    fn distant_points_keep_separate_areas() {
        let points = [Point::new(0.0, 0.0), Point::new(0.1, 0.0)];
        let extent = Extent::around_points(&points, 2000.0).unwrap();
        assert_eq!(extent.area().0.len(), 2);
        assert!(!extent.contains(&Point::new(0.05, 0.0)));
    }

    #[test]
    fn rejects_non_areal_geometry() {
        assert!(Extent::try_from(Geometry::Point(Point::new(1.0, 1.0))).is_err());
        assert!(Extent::around_points(&[], 2000.0).is_err());
    }

    #[test]
    fn geojson_has_one_feature() {
        let extent = Extent::try_from(square()).unwrap();
        let collection = extent.to_geojson().unwrap();
        assert_eq!(collection.features.len(), 1);
        assert!(collection.features[0].geometry.is_some());
    }
}
