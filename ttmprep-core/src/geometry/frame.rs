//! Conversions between WGS84 and the metric frames used for distances,
//! buffers and centroids.
//!
//! UTM uses the Krüger series (third order in the third flattening), which is
//! accurate to well below a millimetre inside a zone.

use std::f64::consts::{FRAC_PI_4, PI};
use std::fmt;
use std::str::FromStr;

use geo::{Coord, MapCoords, Rect};
use serde::Deserialize;

use crate::Error;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;
const UTM_MIN_LAT: f64 = -80.0;
const UTM_MAX_LAT: f64 = 84.0;
const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtmZone {
    /// 1..=60
    pub number: u8,
    pub north: bool,
}

impl UtmZone {
    pub fn new(number: u8, north: bool) -> Result<Self, Error> {
        if (1..=60).contains(&number) {
            Ok(Self { number, north })
        } else {
            Err(Error::InvalidData(format!("UTM zone {number} out of range 1..=60")))
        }
    }

    /// Zone containing the given WGS84 position, `None` outside UTM coverage
    pub fn containing(lon: f64, lat: f64) -> Option<Self> {
        if !lon.is_finite() || !(UTM_MIN_LAT..=UTM_MAX_LAT).contains(&lat) {
            return None;
        }
        let lon = (lon + 180.0).rem_euclid(360.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let number = ((lon / 6.0).floor() as u8 + 1).min(60);
        Some(Self {
            number,
            north: lat >= 0.0,
        })
    }

    fn central_meridian(self) -> f64 {
        (f64::from(self.number) * 6.0 - 183.0).to_radians()
    }

    fn false_northing(self) -> f64 {
        if self.north {
            0.0
        } else {
            UTM_FALSE_NORTHING_SOUTH
        }
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, if self.north { 'N' } else { 'S' })
    }
}

/// Coordinate reference frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Frame {
    /// Geographic lon/lat degrees; the working frame
    Wgs84,
    /// Spherical web mercator, metres; global fallback for distances
    WebMercator,
    Utm(UtmZone),
}

impl Frame {
    /// Best-fitting metric frame for a region given in WGS84.
    ///
    /// Picks the UTM zone of the centre of `bounds`; neighbouring zones would
    /// do just as well for the short distances measured here. Without bounds,
    /// or outside UTM coverage, web mercator has to do.
    pub fn best_metric(bounds: Option<Rect<f64>>) -> Self {
        bounds
            .and_then(|rect| {
                let centre = rect.center();
                UtmZone::containing(centre.x, centre.y)
            })
            .map_or(Frame::WebMercator, Frame::Utm)
    }

    /// Converts a WGS84 coordinate into this frame
    pub fn from_wgs84(self, coord: Coord<f64>) -> Coord<f64> {
        match self {
            Frame::Wgs84 => coord,
            Frame::WebMercator => mercator_forward(coord),
            Frame::Utm(zone) => utm_forward(zone, coord),
        }
    }

    /// Converts a coordinate of this frame into WGS84
    pub fn to_wgs84(self, coord: Coord<f64>) -> Coord<f64> {
        match self {
            Frame::Wgs84 => coord,
            Frame::WebMercator => mercator_inverse(coord),
            Frame::Utm(zone) => utm_inverse(zone, coord),
        }
    }

    /// Projects a WGS84 geometry into this frame
    pub fn project<G>(self, geometry: &G) -> G
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geometry.map_coords(move |c| self.from_wgs84(c))
    }

    /// Brings a geometry of this frame back to WGS84
    pub fn unproject<G>(self, geometry: &G) -> G
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geometry.map_coords(move |c| self.to_wgs84(c))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Wgs84 => f.write_str("wgs84"),
            Frame::WebMercator => f.write_str("web-mercator"),
            Frame::Utm(zone) => write!(f, "utm:{zone}"),
        }
    }
}

impl FromStr for Frame {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "wgs84" | "epsg:4326" => Ok(Frame::Wgs84),
            "web-mercator" | "epsg:3857" => Ok(Frame::WebMercator),
            other => {
                let zone = other
                    .strip_prefix("utm:")
                    .ok_or_else(|| Error::InvalidData(format!("Unknown reference frame '{s}'")))?;
                let (number, hemisphere) = zone.split_at(zone.len().saturating_sub(1));
                let north = match hemisphere {
                    "n" => true,
                    "s" => false,
                    _ => {
                        return Err(Error::InvalidData(format!(
                            "UTM zone '{zone}' lacks a hemisphere (N or S)"
                        )));
                    }
                };
                let number = number
                    .parse::<u8>()
                    .map_err(|e| Error::InvalidData(format!("Invalid UTM zone '{zone}': {e}")))?;
                Ok(Frame::Utm(UtmZone::new(number, north)?))
            }
        }
    }
}

impl TryFrom<String> for Frame {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

fn mercator_forward(coord: Coord<f64>) -> Coord<f64> {
    let lat = coord.y.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    Coord {
        x: WGS84_A * coord.x.to_radians(),
        y: WGS84_A * (FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

fn mercator_inverse(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (coord.x / WGS84_A).to_degrees(),
        y: (2.0 * (coord.y / WGS84_A).exp().atan() - PI / 2.0).to_degrees(),
    }
}

/// Series coefficients of the transverse mercator projection
struct Kruger {
    /// Rectifying radius
    a: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
    /// 2√n / (1 + n)
    e_term: f64,
}

impl Kruger {
    fn wgs84() -> Self {
        let n = WGS84_F / (2.0 - WGS84_F);
        let (n2, n3) = (n * n, n * n * n);
        Self {
            a: WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
                61.0 * n3 / 240.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
                n2 / 48.0 + n3 / 15.0,
                17.0 * n3 / 480.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
                56.0 * n3 / 15.0,
            ],
            e_term: 2.0 * n.sqrt() / (1.0 + n),
        }
    }
}

fn utm_forward(zone: UtmZone, coord: Coord<f64>) -> Coord<f64> {
    let k = Kruger::wgs84();
    let phi = coord.y.to_radians();
    let dlambda = coord.x.to_radians() - zone.central_meridian();

    let t = (phi.sin().atanh() - k.e_term * (k.e_term * phi.sin()).atanh()).sinh();
    let xi_p = t.atan2(dlambda.cos());
    let eta_p = (dlambda.sin() / (1.0 + t * t).sqrt()).atanh();

    let (mut xi, mut eta) = (xi_p, eta_p);
    for (j, alpha) in k.alpha.iter().enumerate() {
        let m = 2.0 * (j as f64 + 1.0);
        xi += alpha * (m * xi_p).sin() * (m * eta_p).cosh();
        eta += alpha * (m * xi_p).cos() * (m * eta_p).sinh();
    }

    Coord {
        x: UTM_FALSE_EASTING + UTM_K0 * k.a * eta,
        y: zone.false_northing() + UTM_K0 * k.a * xi,
    }
}

fn utm_inverse(zone: UtmZone, coord: Coord<f64>) -> Coord<f64> {
    let k = Kruger::wgs84();
    let xi = (coord.y - zone.false_northing()) / (UTM_K0 * k.a);
    let eta = (coord.x - UTM_FALSE_EASTING) / (UTM_K0 * k.a);

    let (mut xi_p, mut eta_p) = (xi, eta);
    for (j, beta) in k.beta.iter().enumerate() {
        let m = 2.0 * (j as f64 + 1.0);
        xi_p -= beta * (m * xi).sin() * (m * eta).cosh();
        eta_p -= beta * (m * xi).cos() * (m * eta).sinh();
    }

    let chi = (xi_p.sin() / eta_p.cosh()).asin();
    let mut phi = chi;
    for (j, delta) in k.delta.iter().enumerate() {
        let m = 2.0 * (j as f64 + 1.0);
        phi += delta * (m * chi).sin();
    }
    let lambda = zone.central_meridian() + eta_p.sinh().atan2(xi_p.cos());

    Coord {
        x: lambda.to_degrees(),
        y: phi.to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn assert_close(a: Coord<f64>, b: Coord<f64>, tolerance: f64) {
        assert!(
            (a.x - b.x).abs() < tolerance && (a.y - b.y).abs() < tolerance,
            "{a:?} differs from {b:?} by more than {tolerance}"
        );
    }

    #[test]
    fn zone_lookup() {
        assert_eq!(UtmZone::containing(24.94, 60.17), UtmZone::new(35, true).ok());
        assert_eq!(UtmZone::containing(-74.0, -33.0), UtmZone::new(18, false).ok());
        assert_eq!(UtmZone::containing(180.0, 0.0), UtmZone::new(1, true).ok());
        assert_eq!(UtmZone::containing(10.0, 85.0), None);
    }

    #[test]
    fn utm_matches_reference_values() {
        // On the central meridian the northing is the scaled meridian arc
        let zone = UtmZone::new(18, true).unwrap();
        let projected = utm_forward(zone, coord! { x: -75.0, y: 40.0 });
        assert_close(projected, coord! { x: 500_000.0, y: 4_427_757.219 }, 0.01);

        let zone = UtmZone::new(31, true).unwrap();
        let projected = utm_forward(zone, coord! { x: 3.0, y: 0.0 });
        assert_close(projected, coord! { x: 500_000.0, y: 0.0 }, 1e-6);
    }

    #[test]
    fn utm_round_trips_in_both_hemispheres() {
        for (lon, lat) in [(13.4, 52.5), (-58.38, -34.6), (0.0, 0.0), (151.2, -33.87)] {
            let frame = Frame::best_metric(Some(Rect::new(
                coord! { x: lon, y: lat },
                coord! { x: lon, y: lat },
            )));
            assert!(matches!(frame, Frame::Utm(_)));
            let back = frame.to_wgs84(frame.from_wgs84(coord! { x: lon, y: lat }));
            assert_close(back, coord! { x: lon, y: lat }, 1e-7);
        }
    }

    #[test]
    fn mercator_round_trip() {
        let c = coord! { x: -122.4, y: 37.8 };
        let back = Frame::WebMercator.to_wgs84(Frame::WebMercator.from_wgs84(c));
        assert_close(back, c, 1e-9);
    }

    #[test]
    fn falls_back_to_web_mercator() {
        assert_eq!(Frame::best_metric(None), Frame::WebMercator);
        let polar = Rect::new(coord! { x: 0.0, y: 86.0 }, coord! { x: 1.0, y: 87.0 });
        assert_eq!(Frame::best_metric(Some(polar)), Frame::WebMercator);
    }

    #[test]
    fn parses_frame_names() {
        assert_eq!("WGS84".parse::<Frame>().unwrap(), Frame::Wgs84);
        assert_eq!("epsg:3857".parse::<Frame>().unwrap(), Frame::WebMercator);
        assert_eq!(
            "utm:33N".parse::<Frame>().unwrap(),
            Frame::Utm(UtmZone::new(33, true).unwrap())
        );
        assert!("utm:61N".parse::<Frame>().is_err());
        assert!("utm:33".parse::<Frame>().is_err());
        assert!("mars".parse::<Frame>().is_err());
    }
}
