use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    journal::calendar::{self, TripDay},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub trip_type: Vec<String>,
    pub final_reflection: Option<String>,
    pub what_to_do_next_time: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn new(details: TripDetails) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: details.name,
            start_date: details.start_date,
            end_date: details.end_date,
            trip_type: details.trip_type,
            final_reflection: None,
            what_to_do_next_time: None,
            photo_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn total_days(&self) -> u32 {
        calendar::span_len(self.start_date, self.end_date)
    }

    pub fn calendar(&self) -> Vec<TripDay> {
        calendar::expand(self.start_date, self.end_date)
    }

    pub fn date_for_day(&self, day_number: u32) -> Result<NaiveDate, AppError> {
        calendar::resolve(self.start_date, self.end_date, day_number)
    }

    pub fn date_range_text(&self) -> String {
        if self.start_date == self.end_date {
            self.start_date.format("%b %-d, %Y").to_string()
        } else {
            format!(
                "{} – {}",
                self.start_date.format("%b %-d, %Y"),
                self.end_date.format("%b %-d, %Y")
            )
        }
    }

    pub fn details(&self) -> TripDetails {
        TripDetails {
            name: self.name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            trip_type: self.trip_type.clone(),
        }
    }
}

/// The user-editable core of a trip, shared by the create, edit and
/// reflection forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDetails {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub trip_type: Vec<String>,
}

impl TripDetails {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Please give the trip a name."));
        }
        if self.start_date > self.end_date {
            return Err(AppError::validation(
                "The trip can't end before it starts.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    pub final_reflection: Option<String>,
    pub what_to_do_next_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: &str, start: &str, end: &str) -> TripDetails {
        TripDetails {
            name: name.into(),
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            trip_type: Vec::new(),
        }
    }

    #[test]
    fn rejects_blank_names_and_reversed_ranges() {
        assert!(matches!(
            details("  ", "2024-03-01", "2024-03-03").validate(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            details("Peru", "2024-03-04", "2024-03-03").validate(),
            Err(AppError::Validation(_))
        ));
        assert!(details("Peru", "2024-03-03", "2024-03-03").validate().is_ok());
    }

    #[test]
    fn trip_knows_its_span() {
        let trip = Trip::new(details("Peru", "2024-03-01", "2024-03-03"));
        assert_eq!(trip.total_days(), 3);
        assert_eq!(
            trip.date_for_day(2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
        assert_eq!(trip.date_range_text(), "Mar 1, 2024 – Mar 3, 2024");
    }
}
