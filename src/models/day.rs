use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::place::Place};

/// Where the day happened. A stay day has one place; a travel day has the
/// city left and the city reached. The two shapes never coexist on a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayLocation {
    Stay(Place),
    Travel { leaving: Place, arriving: Place },
}

impl Default for DayLocation {
    fn default() -> Self {
        DayLocation::Stay(Place::default())
    }
}

impl DayLocation {
    pub fn is_travel(&self) -> bool {
        matches!(self, DayLocation::Travel { .. })
    }

    pub fn places(&self) -> Vec<&Place> {
        match self {
            DayLocation::Stay(place) => vec![place],
            DayLocation::Travel { leaving, arriving } => vec![leaving, arriving],
        }
    }

    /// The place the day is counted under: the stay location, or the
    /// arrival city of a travel day.
    pub fn destination(&self) -> &Place {
        match self {
            DayLocation::Stay(place) => place,
            DayLocation::Travel { arriving, .. } => arriving,
        }
    }
}

/// Everything a single save writes for a day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayFields {
    pub location: DayLocation,
    pub highlight: Option<String>,
    pub journal_entry: Option<String>,
    /// Free text carrying `#hashtags`; tags are derived with
    /// [`crate::journal::hashtags::extract`].
    pub notable_things: Option<String>,
}

impl DayFields {
    pub fn validate(&self) -> Result<(), AppError> {
        for place in self.location.places() {
            let label = place.name.as_deref().unwrap_or("the location");
            match (place.lat, place.lng) {
                (Some(_), None) | (None, Some(_)) => {
                    return Err(AppError::validation(format!(
                        "Coordinates for {label} need both a latitude and a longitude."
                    )));
                }
                _ => {}
            }
            if let Some(coordinates) = place.coordinates() {
                if !coordinates.is_valid() {
                    return Err(AppError::validation(format!(
                        "Coordinates for {label} are out of range."
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    pub trip_id: String,
    pub day_number: u32,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub fields: DayFields,
}

impl Day {
    pub fn is_travel_day(&self) -> bool {
        self.fields.location.is_travel()
    }
}
