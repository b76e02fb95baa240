use std::io::{Read, Write};

use hashbrown::HashMap;
use itertools::Itertools;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::{Error, Minutes, PlaceId, SnappedPlace};

/// Converts km/h into metres per minute
pub fn metres_per_minute(kmh: f64) -> f64 {
    kmh * 1000.0 / 60.0
}

/// Minutes needed to walk `distance` metres, rounded up
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn access_time(distance: f64, metres_per_minute: f64) -> Minutes {
    let minutes = (distance / metres_per_minute).ceil();
    if minutes.is_finite() && minutes > 0.0 {
        minutes.min(f64::from(Minutes::MAX)) as Minutes
    } else {
        0
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessTimeRow {
    id: PlaceId,
    walking_time: Minutes,
}

/// Walking time between each place and its snapped network point.
///
/// Built once per run and read-only afterwards. Places without a snapped
/// point walk zero minutes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessTimes {
    times: HashMap<PlaceId, Minutes>,
}

impl AccessTimes {
    pub fn from_snapped(places: &[SnappedPlace], walking_speed_kmh: f64) -> Self {
        let speed = metres_per_minute(walking_speed_kmh);
        places
            .iter()
            .map(|place| {
                let minutes = place
                    .snap_distance()
                    .map_or(0, |distance| access_time(distance, speed));
                (place.id.clone(), minutes)
            })
            .collect()
    }

    /// Access time of a place; unknown ids walk zero minutes
    pub fn get(&self, id: &str) -> Minutes {
        self.times.get(id).copied().unwrap_or_else(|| {
            trace!("No access time for '{id}', assuming 0");
            0
        })
    }

    pub fn lookup(&self, id: &str) -> Option<Minutes> {
        self.times.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Entries ordered by id
    pub fn iter(&self) -> impl Iterator<Item = (&str, Minutes)> {
        self.times
            .iter()
            .map(|(id, minutes)| (id.as_str(), *minutes))
            .sorted_unstable_by_key(|(id, _)| *id)
    }

    /// Writes `id,walking_time` rows
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut writer = csv::Writer::from_writer(writer);
        for (id, walking_time) in self.iter() {
            writer.serialize(AccessTimeRow {
                id: id.to_string(),
                walking_time,
            })?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads rows written by [`AccessTimes::write_csv`]
    pub fn read_csv<R: Read>(reader: R) -> Result<Self, Error> {
        csv::Reader::from_reader(reader)
            .deserialize::<AccessTimeRow>()
            .map(|row| row.map(|row| (row.id, row.walking_time)).map_err(Error::from))
            .collect()
    }
}

impl FromIterator<(PlaceId, Minutes)> for AccessTimes {
    fn from_iter<I: IntoIterator<Item = (PlaceId, Minutes)>>(iter: I) -> Self {
        Self {
            times: iter.into_iter().collect(),
        }
    }
}
