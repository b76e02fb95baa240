//! Reading places and travel times, writing prepared outputs

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, anyhow, bail};
use csv::StringRecord;
use geo::Geometry;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry as GeoJsonGeometry, Value as GeoJsonValue, feature::Id};
use serde_json::{Value as JsonValue, json};
use ttmprep_core::prelude::*;

/// Places from a `GeoJSON` feature collection.
///
/// The id is the `id` property, or the feature id if there is none.
pub fn read_places(path: &Path) -> anyhow::Result<Vec<Place>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read places from {}", path.display()))?;
    let collection = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection,
        other => bail!("Expected a feature collection in {}, got {}", path.display(), other),
    };
    places_from_features(collection)
}

fn places_from_features(collection: FeatureCollection) -> anyhow::Result<Vec<Place>> {
    collection
        .features
        .into_iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let id = feature_id(&feature);
            let geometry = feature.geometry?;
            Some((index, id, geometry))
        })
        .map(|(index, id, geometry)| {
            let id = id.ok_or_else(|| anyhow!("Feature {index} has no id"))?;
            let geometry = Geometry::<f64>::try_from(geometry)
                .with_context(|| format!("Unsupported geometry of feature '{id}'"))?;
            Ok(Place::new(id, geometry))
        })
        .collect()
}

fn feature_id(feature: &Feature) -> Option<String> {
    match feature.property("id") {
        Some(JsonValue::String(id)) => return Some(id.clone()),
        Some(JsonValue::Number(id)) => return Some(id.to_string()),
        _ => {}
    }
    match &feature.id {
        Some(Id::String(id)) => Some(id.clone()),
        Some(Id::Number(id)) => Some(id.to_string()),
        None => None,
    }
}

/// Snapped places as `GeoJSON` points, with snap distance (metres) and access
/// time (minutes) as properties
pub fn snapped_places_geojson(computer: &TravelTimeMatrixComputer) -> anyhow::Result<FeatureCollection> {
    let features = computer
        .places()
        .iter()
        .map(|place| {
            let geometry = GeoJsonGeometry::new(GeoJsonValue::from(&place.routing_point()));
            let value = json!({
                "type": "Feature",
                "geometry": geometry,
                "properties": {
                    "id": place.id,
                    "snapped": place.snapped_point().is_some(),
                    "snap_distance": place.snap_distance(),
                    "walking_time": computer.access_times().get(&place.id),
                }
            });
            serde_json::from_value::<Feature>(value).map_err(|e| anyhow!("Invalid feature: {e}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

/// Travel time records together with the layout of the file they came from
#[derive(Debug, Clone)]
pub struct TravelTimeTable {
    headers: StringRecord,
    from_column: usize,
    to_column: usize,
    time_column: usize,
    pub records: Vec<TravelTimeRecord>,
}

impl TravelTimeTable {
    /// Reads a CSV file with at least `from_id`, `to_id` and `travel_time`
    /// columns. Empty or non-numeric travel times count as unreachable;
    /// fractional ones are rounded.
    pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| anyhow!("Travel times lack a '{name}' column"))
        };
        let (from_column, to_column, time_column) =
            (column("from_id")?, column("to_id")?, column("travel_time")?);

        let records = reader
            .records()
            .map(|row| {
                let row = row?;
                let field = |index: usize| row.get(index).unwrap_or_default();
                Ok(TravelTimeRecord {
                    from_id: field(from_column).to_string(),
                    to_id: field(to_column).to_string(),
                    travel_time: parse_travel_time(field(time_column)),
                    extra: row
                        .iter()
                        .enumerate()
                        .filter(|(index, _)| ![from_column, to_column, time_column].contains(index))
                        .map(|(_, value)| value.to_string())
                        .collect(),
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            headers,
            from_column,
            to_column,
            time_column,
            records,
        })
    }

    /// Writes the records back in the column layout they were read with
    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for record in &self.records {
            let mut extra = record.extra.iter();
            let travel_time = record.travel_time.map(|t| t.to_string()).unwrap_or_default();
            let row: Vec<&str> = (0..self.headers.len())
                .map(|index| match index {
                    i if i == self.from_column => record.from_id.as_str(),
                    i if i == self.to_column => record.to_id.as_str(),
                    i if i == self.time_column => travel_time.as_str(),
                    _ => extra.next().map_or("", String::as_str),
                })
                .collect();
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_travel_time(value: &str) -> Option<i64> {
    let value = value.trim();
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|minutes| minutes.is_finite())
            .map(|minutes| minutes.round() as i64)
    })
}
