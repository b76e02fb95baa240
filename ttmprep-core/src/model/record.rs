use serde::{Deserialize, Serialize};

use crate::PlaceId;

/// One row of a travel time matrix.
///
/// Travel times are minutes; `None` marks a destination the routing engine
/// could not reach. Columns other than the three known ones travel in `extra`
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelTimeRecord {
    pub from_id: PlaceId,
    pub to_id: PlaceId,
    pub travel_time: Option<i64>,
    #[serde(skip)]
    pub extra: Vec<String>,
}

impl TravelTimeRecord {
    pub fn new(from_id: impl Into<PlaceId>, to_id: impl Into<PlaceId>, travel_time: Option<i64>) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            travel_time,
            extra: Vec::new(),
        }
    }

    pub fn is_same_place(&self) -> bool {
        self.from_id == self.to_id
    }
}
